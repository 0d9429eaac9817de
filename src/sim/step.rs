/// Tick handlers: one function per scheduled task.
///
/// Every periodic behaviour of a session is a `Task`. The session pops
/// due tasks off its scheduler and hands each one to `run`, together with
/// a `TickCtx` that collects what the handler wants to happen next:
/// events for the presentation layer, and follow-ups for the scheduler
/// (delayed one-shots, projectile registration, stop). Handlers never
/// touch the scheduler directly.
///
/// World logic order (every world tick):
///   1. Character / enemy contact damage
///   2. Throw
///   3. Projectile / enemy hits
///   4. Item pickup
/// The boss proximity latch runs as its own slower task.

use std::time::Duration;

use crate::config::GameConfig;
use crate::domain::animation::AnimationState;
use crate::domain::physics;
use crate::domain::projectile::ProjectileId;
use crate::error::TickError;
use super::event::GameEvent;
use super::world::{EnemyRef, World};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Task {
    // ── character ──
    CharacterGravity,
    CharacterMovement,
    CharacterAnimation,

    // ── enemies / scenery ──
    GolemMovement,
    GolemAnimation,
    BossTracking,
    BossAnimation,
    CloudDrift,

    // ── per projectile ──
    ProjectileGravity(ProjectileId),
    ProjectileFlight(ProjectileId),
    ProjectileAnimation(ProjectileId),
    ProjectileExpire(ProjectileId),

    // ── world ──
    WorldLogic,
    BossProximity,
    FireRegen,
    HealthRegen,

    // ── one-shots ──
    ClearHurt(EnemyRef),
    Lose,
    Win,
}

impl Task {
    /// The projectile this task belongs to, if any.
    pub fn projectile(self) -> Option<ProjectileId> {
        match self {
            Task::ProjectileGravity(id)
            | Task::ProjectileFlight(id)
            | Task::ProjectileAnimation(id)
            | Task::ProjectileExpire(id) => Some(id),
            _ => None,
        }
    }
}

/// What a handler asks the session to do after it returns.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FollowUp {
    Once { delay: Duration, task: Task },
    Spawned(ProjectileId),
    Expired(ProjectileId),
    Stop,
}

pub struct TickCtx<'a> {
    pub now: Duration,
    pub config: &'a GameConfig,
    pub events: Vec<GameEvent>,
    pub follow_ups: Vec<FollowUp>,
}

impl<'a> TickCtx<'a> {
    pub fn new(now: Duration, config: &'a GameConfig) -> Self {
        TickCtx { now, config, events: vec![], follow_ups: vec![] }
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    fn after(&mut self, delay: Duration, task: Task) {
        self.follow_ups.push(FollowUp::Once { delay, task });
    }
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn run(world: &mut World, task: Task, ctx: &mut TickCtx) -> Result<(), TickError> {
    match task {
        Task::CharacterGravity => {
            physics::apply_gravity(&mut world.character.body, &ctx.config.physics);
        }
        Task::CharacterMovement => character_movement(world, ctx),
        Task::CharacterAnimation => character_animation(world, ctx),

        Task::GolemMovement => {
            for golem in &mut world.golems {
                golem.movement_tick();
            }
        }
        Task::GolemAnimation => golem_animation(world, ctx),
        Task::BossTracking => boss_tracking(world, ctx),
        Task::BossAnimation => boss_animation(world, ctx),
        Task::CloudDrift => {
            for cloud in &mut world.level.clouds {
                cloud.drift();
            }
        }

        Task::ProjectileGravity(id) => {
            let p = world.projectile_mut(id)?;
            physics::apply_gravity(&mut p.body, &ctx.config.physics);
        }
        Task::ProjectileFlight(id) => world.projectile_mut(id)?.fly(),
        Task::ProjectileAnimation(id) => {
            world.projectile_mut(id)?.animate();
        }
        Task::ProjectileExpire(id) => {
            // Cancel the siblings even if the projectile is already gone.
            ctx.follow_ups.push(FollowUp::Expired(id));
            world.remove_projectile(id)?;
            log::debug!("projectile {id} expired");
        }

        Task::WorldLogic => world_logic(world, ctx)?,
        Task::BossProximity => {
            if world.character.body.x > ctx.config.boss.proximity_x {
                world.boss.trigger_proximity();
            }
        }
        Task::FireRegen => {
            world.fire.regenerate(ctx.config.combat.fire_regen_amount);
        }
        // Regen restores the body's energy; the bar only mirrors it.
        Task::HealthRegen => {
            let body = &mut world.character.body;
            if !body.is_dead() && !world.health.is_full() {
                body.heal(ctx.config.combat.health_regen_amount);
                world.sync_health();
            }
        }

        Task::ClearHurt(EnemyRef::Golem(i)) => world.golem_mut(i)?.clear_hurt(),
        Task::ClearHurt(EnemyRef::Boss) => world.boss.clear_hurt(),
        Task::Lose => finish(ctx, GameEvent::Lost, GameEvent::LoseJingle),
        Task::Win => finish(ctx, GameEvent::Won, GameEvent::WinJingle),
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Character
// ══════════════════════════════════════════════════════════════

fn character_movement(world: &mut World, ctx: &mut TickCtx) {
    let walked = world.character.apply_input(
        &world.input,
        world.level.end_boundary_x,
        &ctx.config.physics,
    );
    if walked {
        ctx.emit(GameEvent::WalkStep);
    }
    world.camera.follow(world.character.body.x, ctx.config.camera.anchor_x);
}

fn character_animation(world: &mut World, ctx: &mut TickCtx) {
    let cfg = ctx.config;
    let state = world.character.state(
        &world.input,
        ctx.now,
        cfg.combat.hurt_window(),
        cfg.physics.ground_y,
    );
    world.character.animate(state);

    match state {
        AnimationState::Dead => {
            if world.character.latch_lose() {
                log::info!("character died at x={:.1}", world.character.body.x);
                ctx.after(cfg.combat.lose_delay(), Task::Lose);
            }
        }
        AnimationState::Hurt => ctx.emit(GameEvent::CharacterHurt),
        _ => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn golem_animation(world: &mut World, ctx: &mut TickCtx) {
    for golem in &mut world.golems {
        let state = golem.state();
        golem.animate(state);
        match state {
            AnimationState::Dead => {
                if golem.latch_death_cue() {
                    ctx.emit(GameEvent::EnemyDied);
                }
            }
            AnimationState::Hurt => ctx.emit(GameEvent::EnemyHurt),
            _ => {}
        }
    }
}

fn boss_tracking(world: &mut World, ctx: &mut TickCtx) {
    let character_x = world.character.body.x;
    world.boss.track(character_x, ctx.config.boss.min_x);
    if character_x > ctx.config.boss.aggro_x && world.boss.aggro() {
        ctx.emit(GameEvent::BossAggro);
    }
}

fn boss_animation(world: &mut World, ctx: &mut TickCtx) {
    let cfg = ctx.config;
    let state = world.boss.state(world.character.body.center_x(), cfg.boss.attack_range);
    world.boss.animate(state);

    match state {
        AnimationState::Dead => {
            if world.boss.latch_death_cue() {
                ctx.emit(GameEvent::EnemyDied);
            }
            if world.boss.latch_win() {
                log::info!("boss defeated");
                ctx.after(cfg.combat.win_delay(), Task::Win);
            }
        }
        AnimationState::Hurt => ctx.emit(GameEvent::EnemyHurt),
        _ => {}
    }
}

// ══════════════════════════════════════════════════════════════
// World logic
// ══════════════════════════════════════════════════════════════

fn world_logic(world: &mut World, ctx: &mut TickCtx) -> Result<(), TickError> {
    resolve_contact_damage(world, ctx);
    resolve_throw(world, ctx)?;
    resolve_projectile_hits(world, ctx);
    resolve_item_pickup(world, ctx);
    Ok(())
}

/// Every living enemy touching the character lands one hit. Contact is
/// checked again next tick; there are no invulnerability frames.
fn resolve_contact_damage(world: &mut World, ctx: &mut TickCtx) {
    let hits = world.living_enemies()
        .filter(|(_, enemy)| physics::is_colliding(&world.character.body, enemy))
        .count();
    if hits == 0 {
        return;
    }
    for _ in 0..hits {
        world.character.body.hit(ctx.config.combat.hit_damage, ctx.now);
    }
    world.sync_health();
}

/// Throw while the action is held and any charge remains. A throw with
/// less than one full cost of charge is free.
fn resolve_throw(world: &mut World, ctx: &mut TickCtx) -> Result<(), TickError> {
    if !world.input.action || world.fire.value() <= 0.0 {
        return Ok(());
    }
    world.fire.try_spend(ctx.config.combat.throw_cost);
    let id = world.spawn_projectile(ctx.config.physics.jump_impulse)?;
    log::debug!("projectile {id} thrown, fire charge now {}", world.fire.value());
    ctx.follow_ups.push(FollowUp::Spawned(id));
    ctx.emit(GameEvent::FireballThrown);
    Ok(())
}

/// Every (projectile, enemy) overlap is a hit. A projectile is not
/// consumed by hitting, so it can hit several enemies in one tick.
fn resolve_projectile_hits(world: &mut World, ctx: &mut TickCtx) {
    let mut hits: Vec<EnemyRef> = vec![];
    for p in &world.projectiles {
        for (enemy, body) in world.all_enemies() {
            if physics::is_colliding(&p.body, body) {
                hits.push(enemy);
            }
        }
    }

    let config = ctx.config;
    let combat = &config.combat;
    for enemy in hits {
        match enemy {
            EnemyRef::Golem(i) => {
                if let Some(golem) = world.golems.get_mut(i) {
                    golem.take_hit();
                }
            }
            EnemyRef::Boss => {
                if world.boss.take_hit(combat.boss_speedup) {
                    ctx.emit(GameEvent::BossHit);
                }
            }
        }
        ctx.after(combat.enemy_hurt(), Task::ClearHurt(enemy));
    }
}

/// Pick up every touched item while the fire gauge is below its cap.
/// `retain` visits each item exactly once, so removing one never skips
/// its neighbour.
fn resolve_item_pickup(world: &mut World, ctx: &mut TickCtx) {
    if world.fire.is_full() {
        return;
    }
    let character = &world.character.body;
    let mut picked = 0;
    world.level.items.retain(|item| {
        let touching = physics::is_colliding(character, &item.body);
        if touching {
            picked += 1;
        }
        !touching
    });
    for _ in 0..picked {
        world.fire.add(ctx.config.combat.pickup_amount);
        ctx.emit(GameEvent::ItemPicked);
    }
}

// ══════════════════════════════════════════════════════════════
// Terminal transitions
// ══════════════════════════════════════════════════════════════

fn finish(ctx: &mut TickCtx, signal: GameEvent, jingle: GameEvent) {
    ctx.emit(GameEvent::AmbientStop);
    ctx.emit(jingle);
    ctx.emit(signal);
    ctx.follow_ups.push(FollowUp::Stop);
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
