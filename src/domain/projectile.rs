/// Thrown flames.
///
/// A projectile launches from the thrower's position with a vertical
/// impulse and flies in the thrower's facing direction. It is always
/// airborne, so gravity never stops pulling it down; the session expires
/// it after a fixed lifetime.

use std::fmt;

use crate::error::SetupError;
use super::animation::{Animator, ClipKey, FrameRef};
use super::entity::{Body, EntityKind, Insets};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ProjectileId(pub u64);

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub id: ProjectileId,
    pub body: Body,
    pub anim: Animator,
}

impl Projectile {
    pub const WIDTH: f32 = 150.0;
    pub const HEIGHT: f32 = 100.0;
    /// Spawn x relative to the thrower.
    pub const OFFSET_X: f32 = -26.0;
    pub const STEP_FORWARD: f32 = 15.0;
    pub const STEP_REVERSED: f32 = 10.0;

    pub fn launch(id: ProjectileId, thrower: &Body, impulse: f32) -> Result<Self, SetupError> {
        let mut body = Body::new(
            EntityKind::Projectile,
            thrower.x + Self::OFFSET_X,
            thrower.y,
            Self::WIDTH,
            Self::HEIGHT,
            Insets::NONE,
        )?;
        body.facing = thrower.facing;
        body.jump(impulse);
        Ok(Projectile { id, body, anim: Animator::new(ClipKey::Flame) })
    }

    /// One horizontal flight step. Reversed flames fly slower.
    pub fn fly(&mut self) {
        if self.body.facing.is_reversed() {
            self.body.x -= Self::STEP_REVERSED;
        } else {
            self.body.x += Self::STEP_FORWARD;
        }
    }

    pub fn animate(&mut self) -> FrameRef {
        self.anim.play(ClipKey::Flame)
    }

    pub fn frame(&self) -> FrameRef {
        self.anim.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Facing;

    fn thrower(facing: Facing) -> Body {
        let mut b = Body::new(EntityKind::Character, 0.0, 250.0, 100.0, 100.0, Insets::NONE).unwrap();
        b.facing = facing;
        b
    }

    #[test]
    fn launches_from_thrower() {
        let p = Projectile::launch(ProjectileId(1), &thrower(Facing::Forward), 30.0).unwrap();
        assert_eq!(p.body.x, -26.0);
        assert_eq!(p.body.y, 250.0);
        assert_eq!(p.body.velocity_y, 30.0);
        assert_eq!(p.body.kind, EntityKind::Projectile);
    }

    #[test]
    fn flies_in_facing_direction() {
        let mut fwd = Projectile::launch(ProjectileId(1), &thrower(Facing::Forward), 30.0).unwrap();
        fwd.fly();
        assert_eq!(fwd.body.x, -11.0);

        let mut rev = Projectile::launch(ProjectileId(2), &thrower(Facing::Reversed), 30.0).unwrap();
        assert_eq!(rev.body.facing, Facing::Reversed);
        rev.fly();
        assert_eq!(rev.body.x, -36.0);
    }

    #[test]
    fn flame_clip_loops() {
        let mut p = Projectile::launch(ProjectileId(1), &thrower(Facing::Forward), 30.0).unwrap();
        let last = (0..30).map(|_| p.animate()).last().unwrap();
        assert_eq!(last, FrameRef::first(ClipKey::Flame));
    }

    #[test]
    fn id_display() {
        assert_eq!(ProjectileId(7).to_string(), "#7");
    }
}
