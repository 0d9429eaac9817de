/// World: the complete state of a running game.
///
/// ## Ownership
///
/// The world owns exactly one character, the static level (items and
/// decorations), the golems and the boss spawned from it, every live
/// projectile, both gauges and the camera. Nothing in here knows about
/// time; the session's scheduler decides when each part is ticked.
///
/// ## Camera
///
/// World coordinates are horizontal-scroll only:
///   - `camera.offset_x = anchor_x - character.x`
///   - Renderer maps: `screen_x = world_x + camera.offset_x`
///   - No clamping; walking left of the anchor reveals negative x.

use rand::Rng;

use crate::config::GameConfig;
use crate::domain::character::Character;
use crate::domain::enemy::{BossEnemy, MinorEnemy};
use crate::domain::entity::{Body, InputState};
use crate::domain::gauge::{GaugeKind, ResourceGauge};
use crate::domain::projectile::{Projectile, ProjectileId};
use crate::error::{SetupError, TickError};
use super::level::{self, Level, LevelDef};

/// Addresses one enemy across the golem list and the boss slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum EnemyRef {
    Golem(usize),
    Boss,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Camera {
    pub offset_x: f32,
}

impl Camera {
    /// Pin `target_x` to screen x `anchor_x`.
    pub fn follow(&mut self, target_x: f32, anchor_x: f32) {
        self.offset_x = anchor_x - target_x;
    }
}

pub struct World {
    // ── Entities ──
    pub character: Character,
    pub level: Level,
    pub golems: Vec<MinorEnemy>,
    pub boss: BossEnemy,
    pub projectiles: Vec<Projectile>,

    // ── HUD ──
    pub health: ResourceGauge,
    pub fire: ResourceGauge,

    pub camera: Camera,
    pub input: InputState,

    next_projectile_id: u64,
}

// ── Construction ──

impl World {
    pub fn new(def: &LevelDef, config: &GameConfig, rng: &mut impl Rng) -> Result<Self, SetupError> {
        let spawned = level::spawn(def, rng)?;
        let combat = &config.combat;

        let mut character = spawned.character;
        character.body.max_energy = combat.health_cap;
        character.body.energy = character.body.energy.min(combat.health_cap);

        let health = ResourceGauge::new(
            GaugeKind::Health,
            character.body.energy as f32,
            combat.health_cap as f32,
        );
        let fire = ResourceGauge::new(GaugeKind::FireCharge, 0.0, combat.fire_cap);

        let mut camera = Camera::default();
        camera.follow(character.body.x, config.camera.anchor_x);

        Ok(World {
            character,
            level: spawned.level,
            golems: spawned.golems,
            boss: spawned.boss,
            projectiles: vec![],
            health,
            fire,
            camera,
            input: InputState::default(),
            next_projectile_id: 0,
        })
    }
}

// ── Queries / mutation ──

impl World {
    /// Health gauge mirrors character energy.
    pub fn sync_health(&mut self) {
        self.health.set(self.character.body.energy as f32);
    }

    /// Every enemy that can still hurt the character.
    pub fn living_enemies(&self) -> impl Iterator<Item = (EnemyRef, &Body)> {
        let golems = self.golems.iter().enumerate()
            .filter(|(_, g)| !g.is_dead())
            .map(|(i, g)| (EnemyRef::Golem(i), &g.body));
        let boss = (!self.boss.is_dead()).then_some((EnemyRef::Boss, &self.boss.body));
        golems.chain(boss)
    }

    /// Every enemy, dead or alive, as a projectile target.
    pub fn all_enemies(&self) -> impl Iterator<Item = (EnemyRef, &Body)> {
        self.golems.iter().enumerate()
            .map(|(i, g)| (EnemyRef::Golem(i), &g.body))
            .chain(std::iter::once((EnemyRef::Boss, &self.boss.body)))
    }

    pub fn golem_mut(&mut self, index: usize) -> Result<&mut MinorEnemy, TickError> {
        self.golems.get_mut(index).ok_or(TickError::UnknownEnemy(EnemyRef::Golem(index)))
    }

    /// Launch a projectile from the character.
    pub fn spawn_projectile(&mut self, impulse: f32) -> Result<ProjectileId, TickError> {
        let id = ProjectileId(self.next_projectile_id);
        let projectile = Projectile::launch(id, &self.character.body, impulse)
            .map_err(|e| TickError::InvalidSpawn(e.to_string()))?;
        self.next_projectile_id += 1;
        self.projectiles.push(projectile);
        Ok(id)
    }

    pub fn projectile_mut(&mut self, id: ProjectileId) -> Result<&mut Projectile, TickError> {
        self.projectiles.iter_mut()
            .find(|p| p.id == id)
            .ok_or(TickError::UnknownProjectile(id))
    }

    pub fn remove_projectile(&mut self, id: ProjectileId) -> Result<(), TickError> {
        let idx = self.projectiles.iter()
            .position(|p| p.id == id)
            .ok_or(TickError::UnknownProjectile(id))?;
        self.projectiles.remove(idx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world(def: &str) -> World {
        let def = LevelDef::parse(def).unwrap();
        World::new(&def, &GameConfig::default(), &mut StdRng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn starts_full_health_empty_fire() {
        let w = world("");
        assert_eq!(w.health.value(), 100.0);
        assert_eq!(w.fire.value(), 0.0);
        assert_eq!(w.camera.offset_x, 100.0 - 120.0);
    }

    #[test]
    fn camera_pins_character() {
        let mut c = Camera::default();
        c.follow(1500.0, 100.0);
        assert_eq!(c.offset_x, -1400.0);
        assert_eq!(1500.0 + c.offset_x, 100.0);
    }

    #[test]
    fn living_enemies_skip_the_dead() {
        let mut w = world("golems = [{ x = 800.0 }, { x = 900.0 }]");
        w.golems[0].lives = 0;
        let refs: Vec<EnemyRef> = w.living_enemies().map(|(r, _)| r).collect();
        assert_eq!(refs, vec![EnemyRef::Golem(1), EnemyRef::Boss]);
        assert_eq!(w.all_enemies().count(), 3);
    }

    #[test]
    fn projectile_ids_are_unique() {
        let mut w = world("");
        let a = w.spawn_projectile(30.0).unwrap();
        let b = w.spawn_projectile(30.0).unwrap();
        assert_ne!(a, b);
        w.remove_projectile(a).unwrap();
        assert_eq!(w.remove_projectile(a), Err(TickError::UnknownProjectile(a)));
        assert!(w.projectile_mut(b).is_ok());
    }

    #[test]
    fn unknown_golem_is_an_error() {
        let mut w = world("");
        assert!(matches!(w.golem_mut(3), Err(TickError::UnknownEnemy(EnemyRef::Golem(3)))));
    }
}
