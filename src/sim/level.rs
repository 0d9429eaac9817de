/// Level data and spawning.
///
/// ## Sources (priority order):
///   1. `general.level_file` from config.toml
///   2. The built-in level embedded below
///
/// ## Level format (TOML):
///   ```toml
///   name = "Level 1"
///   end_boundary_x = 2200     # right edge the character may walk to
///   character_x = 120
///   boss_x = 2100
///   golems = [{}, { x = 900.0, speed = 0.3 }]
///   items  = [{}, { x = 450.0 }]
///   clouds = [{ variant = 1 }]
///
///   [background]
///   first_x = -719            # x of the first tile
///   step = 719                # spacing between tiles
///   tiles = 5
///   layers = 4                # parallax layers drawn per tile
///   ```
///
/// Any position or speed left out is rolled from the spawn RNG, using
/// the default ranges (golem x in [700, 3400), golem speed in
/// [0.15, 0.65), item x in [100, 2100), cloud x in [0, 2700)).

use std::path::Path;

use rand::Rng;
use serde::Deserialize;

use crate::config::GameConfig;
use crate::domain::animation::{ClipKey, FrameRef};
use crate::domain::character::Character;
use crate::domain::enemy::{BossEnemy, MinorEnemy};
use crate::domain::entity::{Body, EntityKind, Insets, PickupItem};
use crate::error::SetupError;

// ══════════════════════════════════════════════════════════════
// Built-in level
// ══════════════════════════════════════════════════════════════

const BUILTIN_LEVEL: &str = r#"
name = "Golem Valley"
end_boundary_x = 2200
character_x = 120
boss_x = 2100

golems = [{}, {}, {}, {}, {}]
items = [{}, {}, {}, {}, {}, {}, {}, {}, {}, {}]
clouds = [
    { variant = 0 },
    { variant = 1 },
    { variant = 0 },
    { variant = 1 },
    { variant = 0 },
]

[background]
first_x = -719
step = 719
tiles = 5
layers = 4
"#;

const GOLEM_X: std::ops::Range<f32> = 700.0..3400.0;
const GOLEM_SPEED: std::ops::Range<f32> = 0.15..0.65;
const ITEM_X: std::ops::Range<f32> = 100.0..2100.0;
const CLOUD_X: std::ops::Range<f32> = 0.0..2700.0;
const CLOUD_WIDTH: std::ops::Range<f32> = 300.0..310.0;
const CLOUD_HEIGHT: std::ops::Range<f32> = 100.0..110.0;
const CLOUD_Y: f32 = 20.0;
const CLOUD_SPEED: f32 = 0.15;
const BACKGROUND_WIDTH: f32 = 720.0;
const BACKGROUND_HEIGHT: f32 = 480.0;
const MAX_BACKGROUND_TILES: usize = 64;

// ══════════════════════════════════════════════════════════════
// Level definition (as parsed)
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct LevelDef {
    pub name: String,
    pub end_boundary_x: f32,
    pub character_x: f32,
    pub boss_x: f32,
    pub golems: Vec<GolemSpawn>,
    pub items: Vec<ItemSpawn>,
    pub clouds: Vec<CloudSpawn>,
    pub background: BackgroundDef,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct GolemSpawn {
    pub x: Option<f32>,
    pub speed: Option<f32>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct ItemSpawn {
    pub x: Option<f32>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct CloudSpawn {
    pub x: Option<f32>,
    pub variant: usize,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct BackgroundDef {
    pub first_x: f32,
    pub step: f32,
    pub tiles: usize,
    pub layers: usize,
}

impl Default for LevelDef {
    fn default() -> Self {
        LevelDef {
            name: "Untitled".into(),
            end_boundary_x: 2200.0,
            character_x: 120.0,
            boss_x: 2100.0,
            golems: vec![],
            items: vec![],
            clouds: vec![],
            background: BackgroundDef::default(),
        }
    }
}

impl Default for BackgroundDef {
    fn default() -> Self {
        BackgroundDef { first_x: -719.0, step: 719.0, tiles: 5, layers: 4 }
    }
}

impl LevelDef {
    pub fn builtin() -> Result<Self, SetupError> {
        Self::parse(BUILTIN_LEVEL)
    }

    pub fn parse(text: &str) -> Result<Self, SetupError> {
        let def: LevelDef = toml::from_str(text).map_err(|e| SetupError::LevelParse(e.to_string()))?;
        def.validate()?;
        Ok(def)
    }

    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let text = std::fs::read_to_string(path).map_err(|source| SetupError::LevelRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// The configured level file, or the built-in level.
    pub fn from_config(config: &GameConfig) -> Result<Self, SetupError> {
        match &config.level_file {
            Some(path) => {
                log::info!("loading level from {}", path.display());
                Self::load(path)
            }
            None => Self::builtin(),
        }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        let fail = |msg: String| Err(SetupError::InvalidLevel(msg));

        if !(self.end_boundary_x.is_finite() && self.end_boundary_x > 0.0) {
            return fail(format!("end_boundary_x {} must be positive", self.end_boundary_x));
        }
        if !(self.character_x.is_finite() && (0.0..=self.end_boundary_x).contains(&self.character_x)) {
            return fail(format!(
                "character_x {} must lie within 0..={}", self.character_x, self.end_boundary_x
            ));
        }
        if !self.boss_x.is_finite() {
            return fail(format!("boss_x {} is not finite", self.boss_x));
        }
        for (i, g) in self.golems.iter().enumerate() {
            if g.x.is_some_and(|x| !x.is_finite()) {
                return fail(format!("golem {i}: x is not finite"));
            }
            if g.speed.is_some_and(|s| !(s.is_finite() && s >= 0.0)) {
                return fail(format!("golem {i}: speed must be non-negative"));
            }
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.x.is_some_and(|x| !x.is_finite()) {
                return fail(format!("item {i}: x is not finite"));
            }
        }
        for (i, c) in self.clouds.iter().enumerate() {
            if c.x.is_some_and(|x| !x.is_finite()) {
                return fail(format!("cloud {i}: x is not finite"));
            }
            if c.variant >= ClipKey::Cloud.frame_count() {
                return fail(format!("cloud {i}: unknown variant {}", c.variant));
            }
        }

        let bg = &self.background;
        if !(bg.step.is_finite() && bg.step > 0.0) || !bg.first_x.is_finite() {
            return fail("background first_x/step must be finite, step positive".into());
        }
        if bg.tiles > MAX_BACKGROUND_TILES {
            return fail(format!("background has {} tiles (max {MAX_BACKGROUND_TILES})", bg.tiles));
        }
        if bg.layers == 0 || bg.layers > ClipKey::Background.frame_count() {
            return fail(format!(
                "background layers must be 1..={}", ClipKey::Background.frame_count()
            ));
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Spawned level
// ══════════════════════════════════════════════════════════════

/// A purely visual body: background layers and drifting clouds.
#[derive(Clone, Debug)]
pub struct Decoration {
    pub body: Body,
    pub frame: FrameRef,
}

impl Decoration {
    fn new(x: f32, y: f32, w: f32, h: f32, frame: FrameRef) -> Result<Self, SetupError> {
        let body = Body::new(EntityKind::Decoration, x, y, w, h, Insets::NONE)?;
        Ok(Decoration { body, frame })
    }

    /// Clouds creep left; backgrounds have zero speed.
    pub fn drift(&mut self) {
        self.body.move_left();
    }
}

/// The static part of a running level. Enemies move out into the World.
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub end_boundary_x: f32,
    pub items: Vec<PickupItem>,
    pub clouds: Vec<Decoration>,
    pub backgrounds: Vec<Decoration>,
}

pub struct Spawned {
    pub level: Level,
    pub character: Character,
    pub golems: Vec<MinorEnemy>,
    pub boss: BossEnemy,
}

/// Build every entity of a level. Unspecified positions come from `rng`.
pub fn spawn(def: &LevelDef, rng: &mut impl Rng) -> Result<Spawned, SetupError> {
    def.validate()?;

    let golems = def.golems.iter()
        .map(|g| {
            let x = g.x.unwrap_or_else(|| rng.gen_range(GOLEM_X));
            let speed = g.speed.unwrap_or_else(|| rng.gen_range(GOLEM_SPEED));
            MinorEnemy::new(x, speed)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let items = def.items.iter()
        .map(|i| PickupItem::new(i.x.unwrap_or_else(|| rng.gen_range(ITEM_X))))
        .collect::<Result<Vec<_>, _>>()?;

    let clouds = def.clouds.iter()
        .map(|c| {
            let x = c.x.unwrap_or_else(|| rng.gen_range(CLOUD_X));
            let w = rng.gen_range(CLOUD_WIDTH);
            let h = rng.gen_range(CLOUD_HEIGHT);
            let frame = FrameRef { clip: ClipKey::Cloud, index: c.variant };
            Decoration::new(x, CLOUD_Y, w, h, frame).map(|mut d| {
                d.body.speed = CLOUD_SPEED;
                d
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let bg = &def.background;
    let mut backgrounds = Vec::with_capacity(bg.tiles * bg.layers);
    for tile in 0..bg.tiles {
        let x = bg.first_x + bg.step * tile as f32;
        for layer in 0..bg.layers {
            let frame = FrameRef { clip: ClipKey::Background, index: layer };
            backgrounds.push(Decoration::new(x, 0.0, BACKGROUND_WIDTH, BACKGROUND_HEIGHT, frame)?);
        }
    }

    log::debug!(
        "spawned level '{}': {} golems, {} items, {} clouds, {} background sprites",
        def.name, golems.len(), items.len(), clouds.len(), backgrounds.len()
    );

    Ok(Spawned {
        level: Level {
            name: def.name.clone(),
            end_boundary_x: def.end_boundary_x,
            items,
            clouds,
            backgrounds,
        },
        character: Character::new(def.character_x)?,
        golems,
        boss: BossEnemy::new(def.boss_x)?,
    })
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn builtin_level_is_valid() {
        let def = LevelDef::builtin().unwrap();
        assert_eq!(def.end_boundary_x, 2200.0);
        assert_eq!(def.golems.len(), 5);
        assert_eq!(def.items.len(), 10);
        assert_eq!(def.clouds.len(), 5);
    }

    #[test]
    fn random_spawns_stay_in_range() {
        let def = LevelDef::builtin().unwrap();
        let s = spawn(&def, &mut rng()).unwrap();
        for g in &s.golems {
            assert!(GOLEM_X.contains(&g.body.x));
            assert!(GOLEM_SPEED.contains(&g.body.speed));
        }
        for i in &s.level.items {
            assert!(ITEM_X.contains(&i.body.x));
            assert_eq!(i.body.y, PickupItem::Y);
        }
        for c in &s.level.clouds {
            assert!(CLOUD_X.contains(&c.body.x));
            assert_eq!(c.body.speed, CLOUD_SPEED);
        }
        assert_eq!(s.character.body.x, 120.0);
        assert_eq!(s.boss.body.x, 2100.0);
    }

    #[test]
    fn same_seed_same_level() {
        let def = LevelDef::builtin().unwrap();
        let a = spawn(&def, &mut rng()).unwrap();
        let b = spawn(&def, &mut rng()).unwrap();
        let xs = |s: &Spawned| s.golems.iter().map(|g| g.body.x).collect::<Vec<_>>();
        assert_eq!(xs(&a), xs(&b));
    }

    #[test]
    fn explicit_positions_override_rng() {
        let def = LevelDef::parse(r#"
            golems = [{ x = 900.0, speed = 0.3 }]
            items = [{ x = 450.0 }]
        "#).unwrap();
        let s = spawn(&def, &mut rng()).unwrap();
        assert_eq!(s.golems[0].body.x, 900.0);
        assert_eq!(s.golems[0].body.speed, 0.3);
        assert_eq!(s.level.items[0].body.x, 450.0);
    }

    #[test]
    fn background_tiles_every_step() {
        let def = LevelDef::parse("[background]\ntiles = 3\nlayers = 2\n").unwrap();
        let s = spawn(&def, &mut rng()).unwrap();
        let xs: Vec<f32> = s.level.backgrounds.iter().map(|d| d.body.x).collect();
        assert_eq!(xs, vec![-719.0, -719.0, 0.0, 0.0, 719.0, 719.0]);
        assert_eq!(s.level.backgrounds[1].frame.index, 1);
    }

    #[test]
    fn rejects_bad_data() {
        assert!(matches!(LevelDef::parse("golems = [{ speed = -1.0 }]"), Err(SetupError::InvalidLevel(_))));
        assert!(matches!(LevelDef::parse("end_boundary_x = 0"), Err(SetupError::InvalidLevel(_))));
        assert!(matches!(LevelDef::parse("[background]\nstep = 0"), Err(SetupError::InvalidLevel(_))));
        assert!(matches!(LevelDef::parse("[background]\nlayers = 9"), Err(SetupError::InvalidLevel(_))));
        assert!(matches!(LevelDef::parse("clouds = [{ variant = 5 }]"), Err(SetupError::InvalidLevel(_))));
        assert!(matches!(LevelDef::parse("golems = ["), Err(SetupError::LevelParse(_))));
    }
}
