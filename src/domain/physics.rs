/// Physics queries and integration for bodies.
///
/// Gravity:
///   A body is airborne when it is above the ground line, or always for
///   kinds with `always_airborne`. Each physics tick, an airborne or
///   rising body integrates `y -= velocity_y; velocity_y -= gravity`.
///   There is no explicit floor clamp: a body that lands keeps its
///   negative velocity and simply stops integrating.
///
/// Collision:
///   Each body has one collision rectangle, the sprite rectangle shifted
///   by the (left, top) insets and shrunk by the (right, bottom) insets.
///   Two bodies collide when their rectangles strictly overlap.

use crate::config::PhysicsConfig;
use super::entity::Body;

// ══════════════════════════════════════════════════════════════
// Gravity
// ══════════════════════════════════════════════════════════════

pub fn is_airborne(body: &Body, ground_y: f32) -> bool {
    body.kind.always_airborne() || body.y < ground_y
}

/// One physics tick of vertical integration.
pub fn apply_gravity(body: &mut Body, physics: &PhysicsConfig) {
    if is_airborne(body, physics.ground_y) || body.velocity_y > 0.0 {
        body.y -= body.velocity_y;
        body.velocity_y -= physics.gravity;
    }
}

// ══════════════════════════════════════════════════════════════
// Collision
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// The inset-adjusted rectangle used for every collision test.
pub fn collision_box(body: &Body) -> Rect {
    let left = body.x + body.insets.left;
    let top = body.y + body.insets.top;
    Rect {
        left,
        top,
        right: left + (body.width - body.insets.right),
        bottom: top + (body.height - body.insets.bottom),
    }
}

/// Symmetric: `is_colliding(a, b) == is_colliding(b, a)`.
pub fn is_colliding(a: &Body, b: &Body) -> bool {
    collision_box(a).intersects(&collision_box(b))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{EntityKind, Insets};

    fn physics() -> PhysicsConfig {
        PhysicsConfig { gravity: 2.5, jump_impulse: 30.0, ground_y: 250.0 }
    }

    fn body_at(kind: EntityKind, x: f32, y: f32) -> Body {
        Body::new(kind, x, y, 100.0, 100.0, Insets::NONE).unwrap()
    }

    // ── gravity ──

    #[test]
    fn grounded_body_does_not_move() {
        let mut b = body_at(EntityKind::Character, 0.0, 250.0);
        apply_gravity(&mut b, &physics());
        assert_eq!(b.y, 250.0);
        assert_eq!(b.velocity_y, 0.0);
    }

    #[test]
    fn jump_arc_lands_on_ground() {
        let mut b = body_at(EntityKind::Character, 0.0, 250.0);
        b.jump(30.0);
        let mut ticks = 0;
        loop {
            apply_gravity(&mut b, &physics());
            ticks += 1;
            if !is_airborne(&b, 250.0) && b.velocity_y <= 0.0 { break; }
            assert!(ticks < 100);
        }
        assert_eq!(ticks, 25);
        assert_eq!(b.y, 250.0);
        // No floor clamp: the landing velocity is kept.
        assert!(b.velocity_y < 0.0);
    }

    #[test]
    fn apex_is_reached_mid_arc() {
        let mut b = body_at(EntityKind::Character, 0.0, 250.0);
        b.jump(30.0);
        let mut min_y = b.y;
        for _ in 0..25 {
            apply_gravity(&mut b, &physics());
            min_y = min_y.min(b.y);
        }
        assert!(min_y < 100.0);
    }

    #[test]
    fn projectile_falls_through_ground() {
        let mut b = body_at(EntityKind::Projectile, 0.0, 250.0);
        for _ in 0..10 {
            apply_gravity(&mut b, &physics());
        }
        assert!(b.y > 250.0);
        assert!(is_airborne(&b, 250.0));
    }

    // ── collision ──

    #[test]
    fn collision_box_applies_insets() {
        let b = Body::new(
            EntityKind::Character, 120.0, 250.0, 100.0, 100.0,
            Insets::new(80.0, 50.0, 50.0, 85.0),
        ).unwrap();
        let r = collision_box(&b);
        assert_eq!(r.left, 170.0);
        assert_eq!(r.right, 220.0);
        assert_eq!(r.top, 330.0);
        assert_eq!(r.bottom, 345.0);
        assert!(r.width() > 0.0 && r.height() > 0.0);
    }

    #[test]
    fn overlapping_bodies_collide() {
        let a = body_at(EntityKind::Character, 0.0, 0.0);
        let b = body_at(EntityKind::MinorEnemy, 50.0, 50.0);
        assert!(is_colliding(&a, &b));
        assert!(is_colliding(&b, &a));
    }

    #[test]
    fn touching_edges_do_not_collide() {
        let a = body_at(EntityKind::Character, 0.0, 0.0);
        let b = body_at(EntityKind::MinorEnemy, 100.0, 0.0);
        assert!(!is_colliding(&a, &b));
        assert!(!is_colliding(&b, &a));
    }

    #[test]
    fn insets_can_prevent_collision() {
        let a = Body::new(
            EntityKind::Character, 0.0, 0.0, 100.0, 100.0,
            Insets::new(0.0, 0.0, 60.0, 0.0),
        ).unwrap();
        let b = body_at(EntityKind::MinorEnemy, 50.0, 0.0);
        assert!(!is_colliding(&a, &b));
        assert!(!is_colliding(&b, &a));
    }

    #[test]
    fn collision_is_symmetric_over_a_grid() {
        let insets = [
            Insets::NONE,
            Insets::new(80.0, 50.0, 50.0, 85.0),
            Insets::new(80.0, 30.0, 50.0, 85.0),
        ];
        for (i, ia) in insets.iter().enumerate() {
            for ib in &insets[i..] {
                for dx in (-200..=200).step_by(25) {
                    for dy in (-120..=120).step_by(20) {
                        let a = Body::new(EntityKind::Character, 0.0, 0.0, 100.0, 100.0, *ia).unwrap();
                        let b = Body::new(EntityKind::MinorEnemy, dx as f32, dy as f32, 100.0, 100.0, *ib).unwrap();
                        assert_eq!(is_colliding(&a, &b), is_colliding(&b, &a), "dx={dx} dy={dy}");
                    }
                }
            }
        }
    }
}
