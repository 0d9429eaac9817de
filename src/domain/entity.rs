/// Entities: the shared `Body` every simulated thing is built on,
/// the closed set of entity kinds, and the input snapshot.
///
/// Kind-specific behaviour lives next door (character.rs, enemy.rs,
/// projectile.rs). A `Body` itself only knows geometry, vertical
/// velocity, energy and hit timing.

use std::time::Duration;

use crate::error::SetupError;
use super::animation::{ClipKey, FrameRef};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Facing {
    /// Sprite drawn as authored.
    #[default]
    Forward,
    /// Sprite drawn mirrored about its own width.
    Reversed,
}

impl Facing {
    pub fn is_reversed(self) -> bool {
        self == Facing::Reversed
    }
}

/// Closed set of entity kinds. Capabilities are queried via methods,
/// so per-kind special cases stay centralized here.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum EntityKind {
    Character,
    MinorEnemy,
    BossEnemy,
    Projectile,
    Item,
    Decoration,
}

impl EntityKind {
    /// Ballistic bodies ignore the ground line entirely.
    pub fn always_airborne(self) -> bool {
        matches!(self, EntityKind::Projectile)
    }

    /// Gets a bounding outline when debug outlines are enabled.
    pub fn debug_outline_eligible(self) -> bool {
        matches!(self, EntityKind::Character | EntityKind::BossEnemy)
    }
}

/// Collision insets, measured inward from the sprite rectangle.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Insets {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Insets {
    pub const NONE: Insets = Insets::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(top: f32, left: f32, right: f32, bottom: f32) -> Self {
        Insets { top, left, right, bottom }
    }
}

/// Read-only input snapshot, filled in by the input collaborator.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub space: bool,
    pub action: bool,
}

impl InputState {
    /// Touch layouts report jump as `up`, keyboards as `space`.
    pub fn jump_requested(&self) -> bool {
        self.space || self.up
    }

    pub fn horizontal_held(&self) -> bool {
        self.left || self.right
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub kind: EntityKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub velocity_y: f32,
    pub energy: u32,
    pub max_energy: u32,
    pub facing: Facing,
    pub insets: Insets,
    pub last_hit: Option<Duration>,
}

impl Body {
    pub const DEFAULT_ENERGY: u32 = 100;

    /// Build a body, rejecting geometry that would give a degenerate
    /// collision box.
    pub fn new(
        kind: EntityKind,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        insets: Insets,
    ) -> Result<Self, SetupError> {
        let invalid = |reason: String| SetupError::InvalidGeometry { kind, reason };

        if !x.is_finite() || !y.is_finite() {
            return Err(invalid(format!("position ({x}, {y}) is not finite")));
        }
        if !(width > 0.0 && width.is_finite()) || !(height > 0.0 && height.is_finite()) {
            return Err(invalid(format!("size {width}x{height} must be positive")));
        }
        let parts = [insets.top, insets.left, insets.right, insets.bottom];
        if parts.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid(format!("insets {insets:?} must be non-negative")));
        }
        if insets.right >= width || insets.bottom >= height {
            return Err(invalid(format!(
                "insets {insets:?} leave no collision area inside {width}x{height}"
            )));
        }

        Ok(Body {
            kind,
            x,
            y,
            width,
            height,
            speed: 0.0,
            velocity_y: 0.0,
            energy: Self::DEFAULT_ENERGY,
            max_energy: Self::DEFAULT_ENERGY,
            facing: Facing::Forward,
            insets,
            last_hit: None,
        })
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn move_left(&mut self) {
        self.x -= self.speed;
    }

    pub fn move_right(&mut self) {
        self.x += self.speed;
    }

    /// Vertical impulse; gravity integration takes it from here.
    pub fn jump(&mut self, impulse: f32) {
        self.velocity_y = impulse;
    }

    /// Take one hit. Energy floors at zero; the hurt timestamp only
    /// moves while the body survives the hit.
    pub fn hit(&mut self, damage: u32, now: Duration) {
        self.energy = self.energy.saturating_sub(damage);
        if self.energy > 0 {
            self.last_hit = Some(now);
        }
    }

    /// Inside the hurt window after the last hit. Purely cosmetic:
    /// it does not grant invulnerability.
    pub fn is_hurt(&self, now: Duration, window: Duration) -> bool {
        match self.last_hit {
            Some(at) => now.saturating_sub(at) < window,
            None => false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.energy == 0
    }

    /// Restore energy, capped at `max_energy`.
    pub fn heal(&mut self, amount: u32) {
        self.energy = (self.energy + amount).min(self.max_energy);
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// Static collectible that refills the fire-charge gauge on contact.
#[derive(Clone, Debug)]
pub struct PickupItem {
    pub body: Body,
}

impl PickupItem {
    pub const Y: f32 = 295.0;
    pub const SIZE: f32 = 40.0;

    pub fn new(x: f32) -> Result<Self, SetupError> {
        let body = Body::new(EntityKind::Item, x, Self::Y, Self::SIZE, Self::SIZE, Insets::NONE)?;
        Ok(PickupItem { body })
    }

    pub fn frame(&self) -> FrameRef {
        FrameRef::first(ClipKey::FireItem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Body {
        Body::new(EntityKind::Character, 0.0, 0.0, 100.0, 100.0, Insets::NONE).unwrap()
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn rejects_zero_size() {
        let err = Body::new(EntityKind::Item, 0.0, 0.0, 0.0, 10.0, Insets::NONE);
        assert!(matches!(err, Err(SetupError::InvalidGeometry { kind: EntityKind::Item, .. })));
    }

    #[test]
    fn rejects_negative_inset() {
        let insets = Insets::new(-1.0, 0.0, 0.0, 0.0);
        assert!(Body::new(EntityKind::Item, 0.0, 0.0, 10.0, 10.0, insets).is_err());
    }

    #[test]
    fn rejects_degenerate_collision_box() {
        let insets = Insets::new(0.0, 0.0, 10.0, 0.0);
        assert!(Body::new(EntityKind::MinorEnemy, 0.0, 0.0, 10.0, 10.0, insets).is_err());
    }

    #[test]
    fn hit_floors_energy_at_zero() {
        let mut b = body();
        for i in 0..30 {
            b.hit(5, ms(i * 10));
            assert!(b.energy <= b.max_energy);
        }
        assert_eq!(b.energy, 0);
        assert!(b.is_dead());
    }

    #[test]
    fn dead_iff_zero_energy() {
        let mut b = body();
        b.energy = 5;
        assert!(!b.is_dead());
        b.hit(5, ms(0));
        assert!(b.is_dead());
    }

    #[test]
    fn killing_blow_does_not_refresh_hurt_timer() {
        let mut b = body();
        b.energy = 10;
        b.hit(5, ms(100));
        assert_eq!(b.last_hit, Some(ms(100)));
        b.hit(5, ms(300));
        assert_eq!(b.last_hit, Some(ms(100)));
    }

    #[test]
    fn hurt_window() {
        let mut b = body();
        let window = ms(500);
        assert!(!b.is_hurt(ms(0), window));
        b.hit(5, ms(1000));
        assert!(b.is_hurt(ms(1000), window));
        assert!(b.is_hurt(ms(1499), window));
        assert!(!b.is_hurt(ms(1500), window));
    }

    #[test]
    fn hurt_body_can_be_hit_again() {
        let mut b = body();
        b.hit(5, ms(0));
        b.hit(5, ms(100));
        assert_eq!(b.energy, 90);
    }

    #[test]
    fn heal_caps_at_max() {
        let mut b = body();
        b.energy = 97;
        b.heal(5);
        assert_eq!(b.energy, 100);
    }

    #[test]
    fn capabilities() {
        assert!(EntityKind::Projectile.always_airborne());
        assert!(!EntityKind::Character.always_airborne());
        assert!(EntityKind::Character.debug_outline_eligible());
        assert!(EntityKind::BossEnemy.debug_outline_eligible());
        assert!(!EntityKind::Decoration.debug_outline_eligible());
    }

    #[test]
    fn jump_sources() {
        let mut input = InputState::default();
        assert!(!input.jump_requested());
        input.up = true;
        assert!(input.jump_requested());
    }
}
