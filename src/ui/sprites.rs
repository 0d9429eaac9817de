/// Glyph sprites: the terminal's stand-in for the image assets.
///
/// Every clip gets exactly `frame_count()` frames. A sprite is a small
/// block of text stretched over the body's rectangle; spaces are
/// transparent unless the sprite has a fill color.

use std::collections::HashMap;

use crossterm::style::Color;

use crate::domain::animation::{ClipKey, FrameRef, FrameSource};

#[derive(Clone, Debug)]
pub struct Sprite {
    rows: Vec<Vec<char>>,
    pub fg: Color,
    pub fill: Option<Color>,
}

impl Sprite {
    fn new(rows: &[&str], fg: Color) -> Self {
        Sprite {
            rows: rows.iter().map(|r| r.chars().collect()).collect(),
            fg,
            fill: None,
        }
    }

    fn filled(mut self, bg: Color) -> Self {
        self.fill = Some(bg);
        self
    }

    /// Glyph at normalized coordinates `u, v` in `[0, 1)`.
    /// `None` means transparent.
    pub fn sample(&self, u: f32, v: f32) -> Option<char> {
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) || self.rows.is_empty() {
            return None;
        }
        let row = &self.rows[(v * self.rows.len() as f32) as usize];
        let ch = row
            .get((u * row.len() as f32) as usize)
            .copied()
            .unwrap_or(' ');
        match (ch, self.fill) {
            (' ', None) => None,
            (c, _) => Some(c),
        }
    }
}

/// Swap direction-bearing glyphs when a sprite is drawn mirrored.
pub fn mirror_glyph(ch: char) -> char {
    match ch {
        '/' => '\\',
        '\\' => '/',
        '<' => '>',
        '>' => '<',
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        other => other,
    }
}

pub struct SpriteSheet {
    clips: HashMap<ClipKey, Vec<Sprite>>,
}

impl FrameSource for SpriteSheet {
    type Frame = Sprite;

    fn frame(&self, frame: FrameRef) -> Option<&Sprite> {
        self.clips.get(&frame.clip)?.get(frame.index)
    }
}

// ── palette ──

const HERO: Color = Color::Rgb { r: 90, g: 200, b: 255 };
const HERO_HURT: Color = Color::Rgb { r: 255, g: 120, b: 120 };
const STONE: Color = Color::Rgb { r: 170, g: 140, b: 105 };
const BOSS: Color = Color::Rgb { r: 200, g: 70, b: 60 };
const FLAME_HOT: Color = Color::Rgb { r: 255, g: 220, b: 60 };
const FLAME_COOL: Color = Color::Rgb { r: 255, g: 120, b: 30 };
const DEAD: Color = Color::DarkGrey;
const SKY: Color = Color::Rgb { r: 28, g: 36, b: 72 };

// ── poses ──

const HERO_STEP_A: [&str; 4] = ["  o  ", " /|> ", "  |  ", " / \\ "];
const HERO_STEP_B: [&str; 4] = ["  o  ", " <|\\ ", "  |  ", "  |\\ "];
const HERO_JUMP: [&str; 4] = [" \\o/ ", "  |  ", " / > ", "     "];
const HERO_HURT_POSE: [&str; 4] = ["  o  ", " \\|/ ", "  |  ", " / \\ "];
const HERO_DOWN: [&str; 4] = ["     ", "     ", "     ", "o_/\\_"];

const GOLEM_A: [&str; 4] = [" [oo] ", "/####\\", " #### ", " /  \\ "];
const GOLEM_B: [&str; 4] = [" [oo] ", "/####\\", " #### ", "  ||  "];
const GOLEM_HURT: [&str; 4] = [" [xx] ", "\\####/", " #### ", " /  \\ "];
const GOLEM_RUBBLE: [&str; 4] = ["      ", "      ", "      ", " .##:."];

const BOSS_A: [&str; 5] = ["  {@@}  ", " /####\\ ", "<######>", " ###### ", " /|  |\\ "];
const BOSS_B: [&str; 5] = ["  {@@}  ", " /####\\ ", "<######>", " ###### ", "  |\\/|  "];
const BOSS_SWING: [&str; 5] = ["  {@@}  ", "<######\\_", " ######  ", " ###### ", " /|  |\\ "];
const BOSS_HURT: [&str; 5] = ["  {xx}  ", " \\####/ ", " ###### ", " ###### ", " /|  |\\ "];
const BOSS_RUBBLE: [&str; 5] = ["        ", "        ", "        ", "   ..   ", ".:####:."];

const FLAME_A: [&str; 3] = ["  ~*  ", " ~**> ", "  ~*  "];
const FLAME_B: [&str; 3] = ["   *  ", " ~*@> ", "   *  "];

const FIRE_ITEM: [&str; 2] = [" ( ", "(*)"];

const CLOUD_A: [&str; 3] = ["  .--.   ", ".(    ). ", "(___.__)_"];
const CLOUD_B: [&str; 3] = ["   .-.   ", " .(   ).-", "(__.___._)"];

const BG_FAR: [&str; 8] = [
    "                        ",
    "                        ",
    "      /\\          /\\    ",
    "   /\\/  \\    /\\  /  \\   ",
    "  /      \\/\\/  \\/    \\  ",
    "                        ",
    "                        ",
    "                        ",
];
const BG_NEAR: [&str; 8] = [
    "                        ",
    "                        ",
    "                        ",
    "                        ",
    "    __          __      ",
    " __/  \\___  ___/  \\__   ",
    "/         \\/         \\_ ",
    "                        ",
];
const BG_GROUND: [&str; 14] = [
    "                        ",
    "                        ",
    "                        ",
    "                        ",
    "                        ",
    "                        ",
    "                        ",
    "                        ",
    "                        ",
    "                        ",
    "\"\"\"\"\"\"\"\"\"\"\"\"\"\"\"\"\"\"\"\"\"\"\"\"",
    "::::::::::::::::::::::::",
    "........................",
    "........................",
];

/// Spread `poses` evenly over `count` frames.
fn cycle(count: usize, poses: &[Sprite]) -> Vec<Sprite> {
    (0..count)
        .map(|i| poses[i * poses.len() / count].clone())
        .collect()
}

impl SpriteSheet {
    pub fn builtin() -> Self {
        let mut clips = HashMap::new();

        let step_a = Sprite::new(&HERO_STEP_A, HERO);
        let step_b = Sprite::new(&HERO_STEP_B, HERO);
        clips.insert(ClipKey::CharacterWalking, cycle(12, &[step_a.clone(), step_b, step_a.clone(), step_a]));
        clips.insert(ClipKey::CharacterJumping, cycle(12, &[Sprite::new(&HERO_JUMP, HERO)]));
        clips.insert(
            ClipKey::CharacterHurt,
            cycle(12, &[Sprite::new(&HERO_HURT_POSE, HERO_HURT), Sprite::new(&HERO_HURT_POSE, HERO)]),
        );
        clips.insert(ClipKey::CharacterDead, vec![Sprite::new(&HERO_DOWN, DEAD)]);

        clips.insert(
            ClipKey::GolemWalking,
            cycle(11, &[Sprite::new(&GOLEM_A, STONE), Sprite::new(&GOLEM_B, STONE)]),
        );
        clips.insert(
            ClipKey::GolemHurt,
            cycle(12, &[Sprite::new(&GOLEM_HURT, HERO_HURT), Sprite::new(&GOLEM_HURT, STONE)]),
        );
        clips.insert(ClipKey::GolemDead, vec![Sprite::new(&GOLEM_RUBBLE, DEAD)]);

        clips.insert(
            ClipKey::BossWalking,
            cycle(17, &[Sprite::new(&BOSS_A, BOSS), Sprite::new(&BOSS_B, BOSS)]),
        );
        clips.insert(
            ClipKey::BossAttacking,
            cycle(12, &[Sprite::new(&BOSS_A, BOSS), Sprite::new(&BOSS_SWING, BOSS)]),
        );
        clips.insert(
            ClipKey::BossHurt,
            cycle(12, &[Sprite::new(&BOSS_HURT, Color::White), Sprite::new(&BOSS_HURT, BOSS)]),
        );
        clips.insert(ClipKey::BossDead, vec![Sprite::new(&BOSS_RUBBLE, DEAD)]);

        clips.insert(
            ClipKey::Flame,
            cycle(29, &[Sprite::new(&FLAME_A, FLAME_HOT), Sprite::new(&FLAME_B, FLAME_COOL)]),
        );
        clips.insert(ClipKey::FireItem, vec![Sprite::new(&FIRE_ITEM, FLAME_COOL)]);
        clips.insert(
            ClipKey::Cloud,
            vec![Sprite::new(&CLOUD_A, Color::Grey), Sprite::new(&CLOUD_B, Color::White)],
        );

        // One frame per parallax layer, back to front.
        clips.insert(
            ClipKey::Background,
            vec![
                Sprite::new(&[" "], SKY).filled(SKY),
                Sprite::new(&BG_FAR, Color::Rgb { r: 80, g: 80, b: 130 }),
                Sprite::new(&BG_NEAR, Color::Rgb { r: 60, g: 120, b: 70 }),
                Sprite::new(&BG_GROUND, Color::Rgb { r: 120, g: 170, b: 70 }),
            ],
        );

        SpriteSheet { clips }
    }
}
