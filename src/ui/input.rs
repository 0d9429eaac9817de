/// Keyboard tracker.
///
/// Turns crossterm key events into the held-key snapshot the simulation
/// reads (`InputState`) plus edge-triggered meta keys (mute, restart,
/// quit, confirm).
///
/// Key layout:
///   ← / A, → / D         move
///   Space, ↑ / W         jump
///   F                    throw
///   M                    mute
///   R                    restart (end screens)
///   Enter                start / confirm
///   Q, Esc, Ctrl-C       quit
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::InputState;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const UP_KEYS: [KeyCode; 3] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const JUMP_KEYS: [KeyCode; 1] = [KeyCode::Char(' ')];
const THROW_KEYS: [KeyCode; 2] = [KeyCode::Char('f'), KeyCode::Char('F')];

/// Edge-triggered meta commands handled outside the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Confirm,
    Mute,
    Restart,
    Quit,
}

impl Command {
    fn from_key(key: &KeyEvent) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Some(Command::Quit);
        }
        match key.code {
            KeyCode::Enter => Some(Command::Confirm),
            KeyCode::Char('m') | KeyCode::Char('M') => Some(Command::Mute),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Restart),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Build the simulation snapshot from a "is this key held" query.
pub fn snapshot_from(held: impl Fn(KeyCode) -> bool) -> InputState {
    let any = |keys: &[KeyCode]| keys.iter().any(|k| held(*k));
    InputState {
        left: any(&LEFT_KEYS),
        right: any(&RIGHT_KEYS),
        up: any(&UP_KEYS),
        space: any(&JUMP_KEYS),
        action: any(&THROW_KEYS),
    }
}

pub struct KeyTracker {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Meta commands pressed during the most recent drain_events() call.
    commands: Vec<Command>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl KeyTracker {
    pub fn new() -> Self {
        KeyTracker {
            last_active: HashMap::with_capacity(16),
            commands: Vec::with_capacity(4),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before advancing the session.
    pub fn drain_events(&mut self) {
        self.commands.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn handle_key(&mut self, key: KeyEvent, at: Instant) {
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Rely on timeout-based expiry instead
            }
            _ => {
                let was_held = self.is_held_at(key.code, at);
                self.last_active.insert(key.code, at);
                if !was_held {
                    if let Some(cmd) = Command::from_key(&key) {
                        self.commands.push(cmd);
                    }
                }
            }
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_at(code, Instant::now())
    }

    fn is_held_at(&self, code: KeyCode, at: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| at.saturating_duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Current held-key snapshot for the simulation.
    pub fn snapshot(&self) -> InputState {
        snapshot_from(|k| self.is_held(k))
    }

    /// Was this command freshly pressed this frame?
    pub fn pressed(&self, cmd: Command) -> bool {
        self.commands.contains(&cmd)
    }
}
