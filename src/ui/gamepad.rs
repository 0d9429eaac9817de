/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move (up also jumps)
///   A                     →  Jump
///   X / B / R1            →  Throw
///   Start                 →  Confirm / Restart
///   Select                →  Mute

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::InputState;

const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    jump: Vec<Btn>,
    throw: Vec<Btn>,
    confirm: Vec<Btn>,
    mute: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump:    vec![Btn::A],
            throw:   vec![Btn::X, Btn::B, Btn::R1],
            confirm: vec![Btn::Start],
            mute:    vec![Btn::Select],
        }
    }
}

impl ActionMap {
    /// Unknown names are skipped; an action with no valid name keeps
    /// its default buttons.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if parsed.is_empty() { fallback } else { parsed }
        }
        let d = ActionMap::default();
        ActionMap {
            jump: parse_list(&cfg.jump, d.jump),
            throw: parse_list(&cfg.throw, d.throw),
            confirm: parse_list(&cfg.confirm, d.confirm),
            mute: parse_list(&cfg.mute, d.mute),
        }
    }
}

/// Directions the pad can hold (D-pad or stick).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Dir {
    Left,
    Right,
    Up,
}

impl Dir {
    #[cfg(feature = "gamepad")]
    fn from_dpad(btn: Button) -> Option<Dir> {
        match btn {
            Button::DPadLeft => Some(Dir::Left),
            Button::DPadRight => Some(Dir::Right),
            Button::DPadUp => Some(Dir::Up),
            _ => None,
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Face/shoulder buttons, indexed by `Btn as usize`.
    buttons: [BtnState; 10],
    /// D-pad held flags, indexed by `Dir as usize`.
    dpad: [bool; 3],
    /// Left stick position.
    stick: (f32, f32),

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let any = g.gamepads().next().is_some();
                (Some(g), any)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: [BtnState::default(); 10],
            dpad: [false; 3],
            stick: (0.0, 0.0),
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Replace the action mapping with the `[gamepad]` config section.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map = ActionMap::from_config(cfg);
    }

    /// Call once per frame: clears edges, then drains pad events.
    pub fn update(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else { return };
        let events: Vec<EventType> = std::iter::from_fn(|| gilrs.next_event())
            .map(|ev| ev.event)
            .collect();

        for event in events {
            match event {
                EventType::ButtonPressed(btn, _) => self.on_button(btn, true),
                EventType::ButtonReleased(btn, _) => self.on_button(btn, false),
                EventType::AxisChanged(Axis::LeftStickX, v, _) => self.stick.0 = v,
                EventType::AxisChanged(Axis::LeftStickY, v, _) => self.stick.1 = v,
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.buttons = [BtnState::default(); 10];
                    self.dpad = [false; 3];
                    self.stick = (0.0, 0.0);
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn on_button(&mut self, btn: Button, held: bool) {
        self.connected = true;
        if let Some(dir) = Dir::from_dpad(btn) {
            self.dpad[dir as usize] = held;
        } else if let Some(b) = Btn::from_gilrs(btn) {
            let state = &mut self.buttons[b as usize];
            state.just_pressed |= held && !state.held;
            state.held = held;
        }
    }

    // ── Queries ──

    fn dir_held(&self, dir: Dir) -> bool {
        let (x, y) = self.stick;
        let stick = match dir {
            Dir::Left => x < -STICK_DEADZONE,
            Dir::Right => x > STICK_DEADZONE,
            Dir::Up => y > STICK_DEADZONE,
        };
        stick || self.dpad[dir as usize]
    }

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].held)
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }

    pub fn mute_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.mute)
    }

    /// OR the pad's held state into a keyboard snapshot.
    pub fn merge_into(&self, input: &mut InputState) {
        input.left |= self.dir_held(Dir::Left);
        input.right |= self.dir_held(Dir::Right);
        input.up |= self.dir_held(Dir::Up);
        input.space |= self.any_held(&self.action_map.jump);
        input.action |= self.any_held(&self.action_map.throw);
    }
}
