/// Draw-call contract between the simulation and whatever rasterizes it.
///
/// One frame, in order:
///   clear → translate(camera) → backgrounds → items → character →
///   clouds → golems → boss → projectiles → translate(-camera) → gauges
///
/// A reversed body is drawn between `begin_mirror` / `end_mirror`,
/// mirrored about its own sprite rectangle. The pairing is held by a
/// guard, so body coordinates are never negated and nothing can leak
/// past the single draw call.

use std::ops::{Deref, DerefMut};

use crate::domain::animation::FrameRef;
use crate::domain::entity::Body;
use crate::domain::gauge::GaugeKind;
use crate::domain::physics::{self, Rect};
use super::world::World;

pub trait Canvas {
    fn clear(&mut self);

    /// Shift every following world-space draw by `dx`.
    fn translate(&mut self, dx: f32);

    /// Mirror following draws horizontally inside `[x, x + width]`.
    fn begin_mirror(&mut self, x: f32, width: f32);
    fn end_mirror(&mut self);

    fn draw(&mut self, frame: FrameRef, x: f32, y: f32, width: f32, height: f32);

    fn draw_outline(&mut self, _rect: Rect) {}

    /// Fixed-position HUD gauge at display tier `tier`.
    fn draw_gauge(&mut self, kind: GaugeKind, tier: usize);
}

/// Scoped mirror: `end_mirror` runs when the guard drops.
pub struct Mirrored<'c, C: Canvas> {
    canvas: &'c mut C,
}

impl<'c, C: Canvas> Mirrored<'c, C> {
    pub fn begin(canvas: &'c mut C, x: f32, width: f32) -> Self {
        canvas.begin_mirror(x, width);
        Mirrored { canvas }
    }
}

impl<C: Canvas> Deref for Mirrored<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.canvas
    }
}

impl<C: Canvas> DerefMut for Mirrored<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.canvas
    }
}

impl<C: Canvas> Drop for Mirrored<'_, C> {
    fn drop(&mut self) {
        self.canvas.end_mirror();
    }
}

fn draw_body<C: Canvas>(canvas: &mut C, body: &Body, frame: FrameRef, outlines: bool) {
    if body.facing.is_reversed() {
        let mut mirrored = Mirrored::begin(canvas, body.x, body.width);
        mirrored.draw(frame, body.x, body.y, body.width, body.height);
    } else {
        canvas.draw(frame, body.x, body.y, body.width, body.height);
    }
    if outlines && body.kind.debug_outline_eligible() {
        canvas.draw_outline(physics::collision_box(body));
    }
}

pub fn draw_world<C: Canvas>(world: &World, canvas: &mut C, outlines: bool) {
    canvas.clear();
    canvas.translate(world.camera.offset_x);

    for bg in &world.level.backgrounds {
        draw_body(canvas, &bg.body, bg.frame, outlines);
    }
    for item in &world.level.items {
        draw_body(canvas, &item.body, item.frame(), outlines);
    }
    draw_body(canvas, &world.character.body, world.character.frame(), outlines);
    for cloud in &world.level.clouds {
        draw_body(canvas, &cloud.body, cloud.frame, outlines);
    }
    for golem in &world.golems {
        draw_body(canvas, &golem.body, golem.frame(), outlines);
    }
    draw_body(canvas, &world.boss.body, world.boss.frame(), outlines);
    for p in &world.projectiles {
        draw_body(canvas, &p.body, p.frame(), outlines);
    }

    canvas.translate(-world.camera.offset_x);

    canvas.draw_gauge(GaugeKind::Health, world.health.tier());
    canvas.draw_gauge(GaugeKind::FireCharge, world.fire.tier());
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::animation::ClipKey;
    use crate::domain::entity::Facing;
    use crate::sim::level::LevelDef;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Clone, Debug, PartialEq)]
    enum Op {
        Clear,
        Translate(f32),
        BeginMirror(f32),
        EndMirror,
        Draw(ClipKey, f32),
        Outline,
        Gauge(GaugeKind, usize),
    }

    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
    }

    impl Canvas for Recorder {
        fn clear(&mut self) { self.ops.push(Op::Clear); }
        fn translate(&mut self, dx: f32) { self.ops.push(Op::Translate(dx)); }
        fn begin_mirror(&mut self, x: f32, _width: f32) { self.ops.push(Op::BeginMirror(x)); }
        fn end_mirror(&mut self) { self.ops.push(Op::EndMirror); }
        fn draw(&mut self, frame: FrameRef, x: f32, _y: f32, _w: f32, _h: f32) {
            self.ops.push(Op::Draw(frame.clip, x));
        }
        fn draw_outline(&mut self, _rect: Rect) { self.ops.push(Op::Outline); }
        fn draw_gauge(&mut self, kind: GaugeKind, tier: usize) { self.ops.push(Op::Gauge(kind, tier)); }
    }

    fn world(def: &str) -> World {
        let def = LevelDef::parse(def).unwrap();
        World::new(&def, &GameConfig::default(), &mut StdRng::seed_from_u64(5)).unwrap()
    }

    #[test]
    fn draw_order() {
        let mut w = world(r#"
            golems = [{ x = 800.0 }]
            items = [{ x = 300.0 }]
            clouds = [{ x = 50.0 }]
            [background]
            tiles = 1
            layers = 1
        "#);
        w.spawn_projectile(30.0).unwrap();
        let mut rec = Recorder::default();
        draw_world(&w, &mut rec, false);

        let clips: Vec<ClipKey> = rec.ops.iter()
            .filter_map(|op| match op { Op::Draw(c, _) => Some(*c), _ => None })
            .collect();
        assert_eq!(clips, vec![
            ClipKey::Background,
            ClipKey::FireItem,
            ClipKey::CharacterWalking,
            ClipKey::Cloud,
            ClipKey::GolemWalking,
            ClipKey::BossWalking,
            ClipKey::Flame,
        ]);

        assert_eq!(rec.ops[0], Op::Clear);
        assert_eq!(rec.ops[1], Op::Translate(-20.0));
        let n = rec.ops.len();
        assert_eq!(rec.ops[n - 3], Op::Translate(20.0));
        assert_eq!(rec.ops[n - 2], Op::Gauge(GaugeKind::Health, 5));
        assert_eq!(rec.ops[n - 1], Op::Gauge(GaugeKind::FireCharge, 0));
    }

    #[test]
    fn mirror_is_scoped_to_one_draw() {
        let mut w = world("");
        w.character.body.facing = Facing::Reversed;
        let x = w.character.body.x;
        let mut rec = Recorder::default();
        draw_world(&w, &mut rec, false);

        let at = rec.ops.iter().position(|op| *op == Op::BeginMirror(x)).unwrap();
        assert_eq!(rec.ops[at + 1], Op::Draw(ClipKey::CharacterWalking, x));
        assert_eq!(rec.ops[at + 2], Op::EndMirror);
        assert_eq!(rec.ops.iter().filter(|op| **op == Op::EndMirror).count(), 1);
        assert_eq!(w.character.body.x, x);
    }

    #[test]
    fn outlines_only_for_eligible_kinds() {
        let w = world("golems = [{}]\nitems = [{}]");
        let mut rec = Recorder::default();
        draw_world(&w, &mut rec, true);
        assert_eq!(rec.ops.iter().filter(|op| **op == Op::Outline).count(), 2);

        let mut rec = Recorder::default();
        draw_world(&w, &mut rec, false);
        assert!(!rec.ops.contains(&Op::Outline));
    }
}
