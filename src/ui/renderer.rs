/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. The session draws into `front` through `TerminalCanvas`, which
///      scales the 720×480 world onto terminal cells
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::animation::{FrameRef, FrameSource};
use crate::domain::gauge::GaugeKind;
use crate::domain::physics::Rect;
use crate::sim::render::Canvas;
use crate::sim::session::Session;
use super::sprites::{mirror_glyph, SpriteSheet};

/// World size the level is authored in.
pub const WORLD_W: f32 = 720.0;
pub const WORLD_H: f32 = 480.0;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gaps between rows match the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            self.set(cx, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// Rows under the map: help line.
const FOOTER_ROWS: usize = 1;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

// ══════════════════════════════════════════════════════════════
// TerminalCanvas: world draw calls → cells
// ══════════════════════════════════════════════════════════════

struct TerminalCanvas<'a> {
    buf: &'a mut FrameBuffer,
    sheet: &'a SpriteSheet,
    top: usize,
    cols: usize,
    rows: usize,
    sx: f32,
    sy: f32,
    dx: f32,
    mirror: Option<(f32, f32)>,
}

impl<'a> TerminalCanvas<'a> {
    fn new(buf: &'a mut FrameBuffer, sheet: &'a SpriteSheet, top: usize, rows: usize) -> Self {
        let cols = buf.width;
        TerminalCanvas {
            buf,
            sheet,
            top,
            cols,
            rows,
            sx: cols as f32 / WORLD_W,
            sy: rows as f32 / WORLD_H,
            dx: 0.0,
            mirror: None,
        }
    }

    /// Visible terminal cells covering world rect `[x, x+w) × [y, y+h)`.
    fn span(&self, x: f32, y: f32, w: f32, h: f32) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let to_cols = |a: f32, b: f32| {
            let lo = ((a + self.dx) * self.sx).floor().max(0.0) as usize;
            let hi = ((b + self.dx) * self.sx).ceil().max(0.0) as usize;
            lo.min(self.cols)..hi.min(self.cols)
        };
        let lo = (y * self.sy).floor().max(0.0) as usize;
        let hi = ((y + h) * self.sy).ceil().max(0.0) as usize;
        (to_cols(x, x + w), lo.min(self.rows)..hi.min(self.rows))
    }
}

impl Canvas for TerminalCanvas<'_> {
    fn clear(&mut self) {
        for r in 0..self.rows {
            for c in 0..self.cols {
                self.buf.set(c, self.top + r, Cell::BLANK);
            }
        }
    }

    fn translate(&mut self, dx: f32) {
        self.dx += dx;
    }

    fn begin_mirror(&mut self, x: f32, width: f32) {
        self.mirror = Some((x, width));
    }

    fn end_mirror(&mut self) {
        self.mirror = None;
    }

    fn draw(&mut self, frame: FrameRef, x: f32, y: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let sheet = self.sheet;
        let Some(sprite) = sheet.frame(frame) else {
            log::trace!("no sprite for {frame:?}");
            return;
        };
        let (cols, rows) = self.span(x, y, width, height);

        for r in rows {
            let wy = (r as f32 + 0.5) / self.sy;
            let v = (wy - y) / height;
            for c in cols.clone() {
                let mut wx = (c as f32 + 0.5) / self.sx - self.dx;
                if let Some((mx, mw)) = self.mirror {
                    wx = 2.0 * mx + mw - wx;
                }
                let u = (wx - x) / width;
                let Some(mut ch) = sprite.sample(u, v) else { continue };
                if self.mirror.is_some() {
                    ch = mirror_glyph(ch);
                }
                let row = self.top + r;
                let bg = sprite.fill.unwrap_or(self.buf.get(c, row).bg);
                self.buf.set(c, row, Cell::new(ch, sprite.fg, bg));
            }
        }
    }

    fn draw_outline(&mut self, rect: Rect) {
        let (cols, rows) = self.span(rect.left, rect.top, rect.width(), rect.height());
        if cols.is_empty() || rows.is_empty() {
            return;
        }
        let (c0, c1, r0, r1) = (cols.start, cols.end - 1, rows.start, rows.end - 1);
        for r in rows {
            for c in cols.clone() {
                if r == r0 || r == r1 || c == c0 || c == c1 {
                    let row = self.top + r;
                    let bg = self.buf.get(c, row).bg;
                    self.buf.set(c, row, Cell::new('·', Color::Yellow, bg));
                }
            }
        }
    }

    fn draw_gauge(&mut self, kind: GaugeKind, tier: usize) {
        let (row, label, color) = match kind {
            GaugeKind::Health => (HUD_ROW, " HP   ", Color::Rgb { r: 230, g: 60, b: 70 }),
            GaugeKind::FireCharge => (HUD_ROW + 1, " FIRE ", Color::Rgb { r: 255, g: 150, b: 30 }),
        };
        self.buf.put_str(0, row, label, Color::White, HUD_BG);
        let slots = kind.tier_count() - 1;
        for i in 0..slots {
            let (ch, fg) = if i < tier { ('█', color) } else { ('░', Color::DarkGrey) };
            self.buf.set(label.len() + i, row, Cell::new(ch, fg, HUD_BG));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Renderer
// ══════════════════════════════════════════════════════════════

/// What the front end is showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Title,
    Playing,
    Won,
    Lost,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    sheet: SpriteSheet,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            sheet: SpriteSheet::builtin(),
            term_w: 0,
            term_h: 0,
            last_screen: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, screen: Screen, session: &Session) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect screen change → clear for clean transition
        if self.last_screen != Some(screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(screen);
        }

        self.front.clear();
        match screen {
            Screen::Title => self.compose_title(session),
            Screen::Playing => self.compose_game(session),
            Screen::Won | Screen::Lost => {
                self.compose_game(session);
                self.compose_result(screen == Screen::Won);
            }
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn map_rows(&self) -> usize {
        self.front.height.saturating_sub(MAP_ROW + FOOTER_ROWS)
    }

    fn compose_game(&mut self, session: &Session) {
        let rows = self.map_rows();

        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.fill_row(HUD_ROW + 1, HUD_BG);
        {
            let mut canvas = TerminalCanvas::new(&mut self.front, &self.sheet, MAP_ROW, rows);
            session.render(&mut canvas);
        }

        let world = session.world();
        let status = format!(
            "{}  boss {:>2}  {}",
            world.level.name,
            world.boss.lives,
            if session.is_muted() { "♪ off" } else { "♪ on " },
        );
        let sx = self.front.width.saturating_sub(status.chars().count() + 1);
        self.front.put_str(sx, HUD_ROW, &status, Color::White, HUD_BG);

        let help_row = MAP_ROW + rows;
        let help = " ←→/AD move  Space/↑ jump  F throw  M mute  Q quit";
        self.front.put_str(0, help_row, help, Color::DarkGrey, Cell::BASE_BG);
    }

    fn compose_title(&mut self, session: &Session) {
        let title = [
            r"   ___       _                __      _ _ ",
            r"  / __| ___ | | ___  _ __    / _| __ | | |",
            r" | (_ |/ _ \| |/ -_)| '  \  |  _|/ _`| | |",
            r"  \___|\___/|_|\___||_|_|_| |_|  \__,|_|_|",
        ];
        let gold = Color::Rgb { r: 255, g: 200, b: 50 };
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, gold, Cell::BASE_BG);
        }

        let level = format!("◈  {}  ◈", session.world().level.name);
        let lx = 2 + title[1].len().saturating_sub(level.chars().count()) / 2;
        self.front.put_str(lx, 7, &level, Color::Rgb { r: 80, g: 255, b: 80 }, Cell::BASE_BG);

        let hi = Color::Rgb { r: 80, g: 255, b: 80 };
        self.front.put_str(8, 10, "ENTER   Start", hi, Cell::BASE_BG);
        self.front.put_str(8, 11, "  Q     Quit", Color::White, Cell::BASE_BG);

        let help = [
            "Controls",
            "  ←→ / A D     Move",
            "  Space / ↑ W  Jump",
            "  F            Throw fire (needs charge)",
            "  M            Mute",
            "  Pad: A jump  X/B/R1 throw  Start confirm  Select mute",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { gold } else { Color::White };
            self.front.put_str(8, 14 + i, line, color, Cell::BASE_BG);
        }
    }

    fn compose_result(&mut self, won: bool) {
        let (art, color) = if won {
            ([
                "╔══════════════════════════════╗",
                "║   ★  THE GOLEM KING FALLS ★  ║",
                "╚══════════════════════════════╝",
            ], Color::Rgb { r: 255, g: 220, b: 50 })
        } else {
            ([
                "╔══════════════════════════════╗",
                "║      ✕   GAME  OVER   ✕      ║",
                "╚══════════════════════════════╝",
            ], Color::Rgb { r: 255, g: 60, b: 60 })
        };
        let box_w = art[0].chars().count();
        let bx = self.front.width.saturating_sub(box_w) / 2;
        let by = MAP_ROW + self.map_rows().saturating_sub(5) / 2;
        for (i, line) in art.iter().enumerate() {
            self.front.put_str(bx, by + i, line, color, Cell::BASE_BG);
        }
        self.front.put_str(bx + 2, by + 4, "▸ R / Start: play again   Q: quit", Color::White, Cell::BASE_BG);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animation::ClipKey;

    fn canvas_test(cols: usize, rows: usize, f: impl FnOnce(&mut TerminalCanvas<'_>)) -> FrameBuffer {
        let sheet = SpriteSheet::builtin();
        let mut buf = FrameBuffer::new(cols, rows);
        {
            let mut canvas = TerminalCanvas::new(&mut buf, &sheet, 0, rows);
            f(&mut canvas);
        }
        buf
    }

    fn row_text(buf: &FrameBuffer, y: usize) -> String {
        (0..buf.width).map(|x| buf.get(x, y).ch).collect()
    }

    #[test]
    fn world_scales_onto_cells() {
        // 72×48 cells: one cell per 10×10 world units.
        let buf = canvas_test(72, 48, |c| {
            c.draw(FrameRef::first(ClipKey::FireItem), 100.0, 100.0, 30.0, 20.0);
        });
        assert_eq!(buf.get(11, 10).ch, '(');
        assert_eq!(buf.get(10, 11).ch, '(');
        assert_eq!(buf.get(11, 11).ch, '*');
        assert_eq!(buf.get(9, 11).ch, ' ');
        assert_eq!(buf.get(11, 12).ch, ' ');
    }

    #[test]
    fn translate_shifts_world_draws() {
        let buf = canvas_test(72, 48, |c| {
            c.translate(-100.0);
            c.draw(FrameRef::first(ClipKey::FireItem), 100.0, 100.0, 30.0, 20.0);
        });
        assert_eq!(buf.get(1, 10).ch, '(');
        assert_eq!(buf.get(11, 10).ch, ' ');
    }

    #[test]
    fn mirrored_draw_flips_inside_body() {
        let flame = FrameRef::first(ClipKey::Flame);
        let plain = canvas_test(72, 48, |c| c.draw(flame, 0.0, 0.0, 60.0, 30.0));
        let flipped = canvas_test(72, 48, |c| {
            c.begin_mirror(0.0, 60.0);
            c.draw(flame, 0.0, 0.0, 60.0, 30.0);
            c.end_mirror();
        });
        assert!(row_text(&plain, 1).starts_with(" ~**>"));
        assert!(row_text(&flipped, 1).starts_with(" <**~"));
    }

    #[test]
    fn off_screen_draws_are_clipped() {
        let buf = canvas_test(10, 10, |c| {
            c.draw(FrameRef::first(ClipKey::FireItem), -5000.0, 0.0, 30.0, 20.0);
            c.draw(FrameRef::first(ClipKey::FireItem), 5000.0, 0.0, 30.0, 20.0);
        });
        assert!(buf.cells.iter().all(|cell| *cell == Cell::BLANK));
    }

    #[test]
    fn gauges_fill_by_tier() {
        let buf = canvas_test(40, 4, |c| {
            c.draw_gauge(GaugeKind::Health, 3);
            c.draw_gauge(GaugeKind::FireCharge, 12);
        });
        let hp = row_text(&buf, HUD_ROW);
        assert_eq!(hp.matches('█').count(), 3);
        assert_eq!(hp.matches('░').count(), 2);
        let fire = row_text(&buf, HUD_ROW + 1);
        assert_eq!(fire.matches('█').count(), 12);
    }
}
