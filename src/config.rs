/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// A missing file or missing keys fall back to defaults; a file that
/// exists but does not parse, or values that make no sense, are fatal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::SetupError;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub physics: PhysicsConfig,
    pub combat: CombatConfig,
    pub boss: BossConfig,
    pub camera: CameraConfig,
    pub gamepad: GamepadConfig,
    pub level_file: Option<PathBuf>,
    pub seed: Option<u64>,
    pub log_file: PathBuf,
    pub log_level: String,
    pub debug_outlines: bool,
    pub start_muted: bool,
}

/// Cadences of every periodic task, in milliseconds unless noted.
#[derive(Deserialize, Clone, Debug)]
pub struct TimingConfig {
    #[serde(default = "default_physics_ms")]
    pub physics_ms: u64,
    #[serde(default = "default_movement_ms")]
    pub movement_ms: u64,
    #[serde(default = "default_character_anim_ms")]
    pub character_anim_ms: u64,
    /// Ticks per second; 1000/60 ms is not a whole number.
    #[serde(default = "default_enemy_move_hz")]
    pub enemy_move_hz: u32,
    #[serde(default = "default_enemy_anim_ms")]
    pub enemy_anim_ms: u64,
    #[serde(default = "default_world_ms")]
    pub world_ms: u64,
    #[serde(default = "default_proximity_ms")]
    pub proximity_ms: u64,
    #[serde(default = "default_fire_regen_ms")]
    pub fire_regen_ms: u64,
    #[serde(default = "default_health_regen_ms")]
    pub health_regen_ms: u64,
    #[serde(default = "default_projectile_ms")]
    pub projectile_ms: u64,
    /// Render pacing for the terminal front end.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PhysicsConfig {
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_jump_impulse")]
    pub jump_impulse: f32,
    #[serde(default = "default_ground_y")]
    pub ground_y: f32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CombatConfig {
    #[serde(default = "default_hit_damage")]
    pub hit_damage: u32,
    #[serde(default = "default_hurt_window_ms")]
    pub hurt_window_ms: u64,
    #[serde(default = "default_enemy_hurt_ms")]
    pub enemy_hurt_ms: u64,
    #[serde(default = "default_lose_delay_ms")]
    pub lose_delay_ms: u64,
    #[serde(default = "default_win_delay_ms")]
    pub win_delay_ms: u64,
    #[serde(default = "default_projectile_ttl_ms")]
    pub projectile_ttl_ms: u64,
    #[serde(default = "default_throw_cost")]
    pub throw_cost: f32,
    #[serde(default = "default_pickup_amount")]
    pub pickup_amount: f32,
    #[serde(default = "default_fire_regen_amount")]
    pub fire_regen_amount: f32,
    #[serde(default = "default_health_regen_amount")]
    pub health_regen_amount: u32,
    #[serde(default = "default_fire_cap")]
    pub fire_cap: f32,
    #[serde(default = "default_health_cap")]
    pub health_cap: u32,
    #[serde(default = "default_boss_speedup")]
    pub boss_speedup: f32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BossConfig {
    /// Character x past which the boss aggroes (with its cue).
    #[serde(default = "default_aggro_x")]
    pub aggro_x: f32,
    /// Character x past which the slow world check latches proximity.
    #[serde(default = "default_proximity_x")]
    pub proximity_x: f32,
    #[serde(default = "default_attack_range")]
    pub attack_range: f32,
    /// The boss never tracks past this x.
    #[serde(default = "default_boss_min_x")]
    pub min_x: f32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CameraConfig {
    /// Screen x the character is pinned to.
    #[serde(default = "default_anchor_x")]
    pub anchor_x: f32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct GamepadConfig {
    #[serde(default = "default_pad_jump")]
    pub jump: Vec<String>,
    #[serde(default = "default_pad_throw")]
    pub throw: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    pub confirm: Vec<String>,
    #[serde(default = "default_pad_mute")]
    pub mute: Vec<String>,
}

impl TimingConfig {
    pub fn physics(&self) -> Duration { Duration::from_millis(self.physics_ms) }
    pub fn movement(&self) -> Duration { Duration::from_millis(self.movement_ms) }
    pub fn character_anim(&self) -> Duration { Duration::from_millis(self.character_anim_ms) }
    pub fn enemy_move(&self) -> Duration { Duration::from_secs(1) / self.enemy_move_hz }
    pub fn enemy_anim(&self) -> Duration { Duration::from_millis(self.enemy_anim_ms) }
    pub fn world(&self) -> Duration { Duration::from_millis(self.world_ms) }
    pub fn proximity(&self) -> Duration { Duration::from_millis(self.proximity_ms) }
    pub fn fire_regen(&self) -> Duration { Duration::from_millis(self.fire_regen_ms) }
    pub fn health_regen(&self) -> Duration { Duration::from_millis(self.health_regen_ms) }
    pub fn projectile(&self) -> Duration { Duration::from_millis(self.projectile_ms) }
    pub fn frame(&self) -> Duration { Duration::from_millis(self.frame_ms) }
}

impl CombatConfig {
    pub fn hurt_window(&self) -> Duration { Duration::from_millis(self.hurt_window_ms) }
    pub fn enemy_hurt(&self) -> Duration { Duration::from_millis(self.enemy_hurt_ms) }
    pub fn lose_delay(&self) -> Duration { Duration::from_millis(self.lose_delay_ms) }
    pub fn win_delay(&self) -> Duration { Duration::from_millis(self.win_delay_ms) }
    pub fn projectile_ttl(&self) -> Duration { Duration::from_millis(self.projectile_ttl_ms) }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TimingConfig,
    #[serde(default)]
    physics: PhysicsConfig,
    #[serde(default)]
    combat: CombatConfig,
    #[serde(default)]
    boss: BossConfig,
    #[serde(default)]
    camera: CameraConfig,
    #[serde(default)]
    gamepad: GamepadConfig,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    level_file: Option<String>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    debug_outlines: bool,
    #[serde(default)]
    start_muted: bool,
}

// ── Defaults ──

fn default_physics_ms() -> u64 { 40 }          // 25 Hz
fn default_movement_ms() -> u64 { 50 }         // 20 Hz
fn default_character_anim_ms() -> u64 { 50 }
fn default_enemy_move_hz() -> u32 { 60 }
fn default_enemy_anim_ms() -> u64 { 100 }
fn default_world_ms() -> u64 { 200 }
fn default_proximity_ms() -> u64 { 3000 }
fn default_fire_regen_ms() -> u64 { 3000 }
fn default_health_regen_ms() -> u64 { 1000 }
fn default_projectile_ms() -> u64 { 50 }
fn default_frame_ms() -> u64 { 16 }

fn default_gravity() -> f32 { 2.5 }
fn default_jump_impulse() -> f32 { 30.0 }
fn default_ground_y() -> f32 { 250.0 }

fn default_hit_damage() -> u32 { 5 }
fn default_hurt_window_ms() -> u64 { 500 }
fn default_enemy_hurt_ms() -> u64 { 1000 }
fn default_lose_delay_ms() -> u64 { 500 }
fn default_win_delay_ms() -> u64 { 700 }
fn default_projectile_ttl_ms() -> u64 { 1500 }
fn default_throw_cost() -> f32 { 10.0 }
fn default_pickup_amount() -> f32 { 10.0 }
fn default_fire_regen_amount() -> f32 { 10.0 }
fn default_health_regen_amount() -> u32 { 5 }
fn default_fire_cap() -> f32 { 120.0 }
fn default_health_cap() -> u32 { 100 }
fn default_boss_speedup() -> f32 { 0.04 }

fn default_aggro_x() -> f32 { 1400.0 }
fn default_proximity_x() -> f32 { 1000.0 }
fn default_attack_range() -> f32 { 130.0 }
fn default_boss_min_x() -> f32 { 300.0 }

fn default_anchor_x() -> f32 { 100.0 }

fn default_pad_jump() -> Vec<String> { vec!["A".into()] }
fn default_pad_throw() -> Vec<String> { vec!["X".into(), "B".into(), "R1".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_pad_mute() -> Vec<String> { vec!["Select".into()] }

fn default_log_file() -> String { "golemfall.log".into() }
fn default_log_level() -> String { "warn".into() }

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            physics_ms: default_physics_ms(),
            movement_ms: default_movement_ms(),
            character_anim_ms: default_character_anim_ms(),
            enemy_move_hz: default_enemy_move_hz(),
            enemy_anim_ms: default_enemy_anim_ms(),
            world_ms: default_world_ms(),
            proximity_ms: default_proximity_ms(),
            fire_regen_ms: default_fire_regen_ms(),
            health_regen_ms: default_health_regen_ms(),
            projectile_ms: default_projectile_ms(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            gravity: default_gravity(),
            jump_impulse: default_jump_impulse(),
            ground_y: default_ground_y(),
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        CombatConfig {
            hit_damage: default_hit_damage(),
            hurt_window_ms: default_hurt_window_ms(),
            enemy_hurt_ms: default_enemy_hurt_ms(),
            lose_delay_ms: default_lose_delay_ms(),
            win_delay_ms: default_win_delay_ms(),
            projectile_ttl_ms: default_projectile_ttl_ms(),
            throw_cost: default_throw_cost(),
            pickup_amount: default_pickup_amount(),
            fire_regen_amount: default_fire_regen_amount(),
            health_regen_amount: default_health_regen_amount(),
            fire_cap: default_fire_cap(),
            health_cap: default_health_cap(),
            boss_speedup: default_boss_speedup(),
        }
    }
}

impl Default for BossConfig {
    fn default() -> Self {
        BossConfig {
            aggro_x: default_aggro_x(),
            proximity_x: default_proximity_x(),
            attack_range: default_attack_range(),
            min_x: default_boss_min_x(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig { anchor_x: default_anchor_x() }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            jump: default_pad_jump(),
            throw: default_pad_throw(),
            confirm: default_pad_confirm(),
            mute: default_pad_mute(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            level_file: None,
            seed: None,
            log_file: default_log_file(),
            log_level: default_log_level(),
            debug_outlines: false,
            start_muted: false,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Result<Self, SetupError> {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs)?;
        let config = GameConfig::from_toml(toml_cfg, &search_dirs);
        config.validate()?;
        Ok(config)
    }

    /// Parse a config document directly (no file search).
    pub fn parse(text: &str) -> Result<Self, SetupError> {
        let toml_cfg = toml::from_str::<TomlConfig>(text).map_err(|e| SetupError::ConfigParse {
            path: PathBuf::from("<inline>"),
            details: e.to_string(),
        })?;
        let config = GameConfig::from_toml(toml_cfg, &[]);
        config.validate()?;
        Ok(config)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let general = toml_cfg.general;
        let level_file = general.level_file.map(|f| resolve_path(&f, search_dirs));

        GameConfig {
            timing: toml_cfg.timing,
            physics: toml_cfg.physics,
            combat: toml_cfg.combat,
            boss: toml_cfg.boss,
            camera: toml_cfg.camera,
            gamepad: toml_cfg.gamepad,
            level_file,
            seed: general.seed,
            log_file: PathBuf::from(general.log_file),
            log_level: general.log_level,
            debug_outlines: general.debug_outlines,
            start_muted: general.start_muted,
        }
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), SetupError> {
        let t = &self.timing;
        let cadences = [
            ("timing.physics_ms", t.physics_ms),
            ("timing.movement_ms", t.movement_ms),
            ("timing.character_anim_ms", t.character_anim_ms),
            ("timing.enemy_move_hz", u64::from(t.enemy_move_hz)),
            ("timing.enemy_anim_ms", t.enemy_anim_ms),
            ("timing.world_ms", t.world_ms),
            ("timing.proximity_ms", t.proximity_ms),
            ("timing.fire_regen_ms", t.fire_regen_ms),
            ("timing.health_regen_ms", t.health_regen_ms),
            ("timing.projectile_ms", t.projectile_ms),
            ("timing.frame_ms", t.frame_ms),
        ];
        for (field, value) in cadences {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }

        let positive = [
            ("physics.gravity", self.physics.gravity),
            ("physics.ground_y", self.physics.ground_y),
            ("combat.fire_cap", self.combat.fire_cap),
            ("combat.throw_cost", self.combat.throw_cost),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, "must be a positive number"));
            }
        }
        if self.combat.health_cap == 0 {
            return Err(invalid("combat.health_cap", "must be greater than zero"));
        }
        if self.combat.projectile_ttl_ms == 0 {
            return Err(invalid("combat.projectile_ttl_ms", "must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> SetupError {
    SetupError::InvalidConfig { field, reason: reason.to_string() }
}

fn resolve_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(raw))
        .find(|p| p.exists())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// First `config.toml` found wins. None found → defaults.
fn load_toml(search_dirs: &[PathBuf]) -> Result<TomlConfig, SetupError> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            return read_toml(&path);
        }
    }
    log::debug!("no config.toml found, using defaults");
    Ok(TomlConfig::default())
}

fn read_toml(path: &Path) -> Result<TomlConfig, SetupError> {
    let text = std::fs::read_to_string(path).map_err(|source| SetupError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<TomlConfig>(&text).map_err(|e| SetupError::ConfigParse {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}
