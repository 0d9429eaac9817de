/// Session: one game from start to win, loss or restart.
///
/// A session owns the world, the scheduler that drives it and the mute
/// flag. Nothing here reads a wall clock: the front end calls
/// `advance(dt)` with however much time passed, and every task that
/// falls due inside that window runs in fire-time order.
///
/// ## Lifecycle
///
///   start ──▶ running ──(Lose / Win / restart / stop)──▶ stopped
///
/// Stopping cancels every scheduled task at once. A stopped session
/// never changes again; a restart builds a new one.
///
/// ## Events
///
/// `advance` returns the events produced since the previous call.
/// While muted, audio cues are dropped (except `AmbientStop`); the
/// terminal signals always get through.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GameConfig;
use crate::domain::entity::InputState;
use crate::error::SetupError;
use super::event::{GameEvent, Outcome};
use super::level::LevelDef;
use super::render::{self, Canvas};
use super::scheduler::Scheduler;
use super::step::{self, FollowUp, Task, TickCtx};
use super::world::World;

pub struct Session {
    world: World,
    scheduler: Scheduler<Task>,
    config: GameConfig,
    muted: bool,
    outcome: Option<Outcome>,
    pending: Vec<GameEvent>,
}

impl Session {
    /// Load the configured level and start a fresh game.
    pub fn start(config: &GameConfig) -> Result<Self, SetupError> {
        let def = LevelDef::from_config(config)?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_level(config, &def, &mut rng)
    }

    pub fn with_level(config: &GameConfig, def: &LevelDef, rng: &mut impl Rng) -> Result<Self, SetupError> {
        config.validate()?;
        let world = World::new(def, config, rng)?;
        let mut session = Session {
            world,
            scheduler: Scheduler::new(),
            config: config.clone(),
            muted: config.start_muted,
            outcome: None,
            pending: vec![],
        };
        session.register_tasks();
        session.push_event(GameEvent::AmbientStart);
        log::info!("session started on level '{}'", session.world.level.name);
        Ok(session)
    }

    fn register_tasks(&mut self) {
        let t = &self.config.timing;
        let periodic = [
            (t.physics(), Task::CharacterGravity),
            (t.movement(), Task::CharacterMovement),
            (t.character_anim(), Task::CharacterAnimation),
            (t.enemy_move(), Task::GolemMovement),
            (t.enemy_anim(), Task::GolemAnimation),
            (t.enemy_move(), Task::BossTracking),
            (t.enemy_anim(), Task::BossAnimation),
            (t.enemy_move(), Task::CloudDrift),
            (t.world(), Task::WorldLogic),
            (t.proximity(), Task::BossProximity),
            (t.fire_regen(), Task::FireRegen),
            (t.health_regen(), Task::HealthRegen),
        ];
        for (period, task) in periodic {
            self.scheduler.register_periodic(period, task);
        }
    }

    // ── Input / time ──

    pub fn set_input(&mut self, input: InputState) {
        if self.is_running() {
            self.world.input = input;
        }
    }

    /// Run every task due in the next `dt` and return the resulting events.
    pub fn advance(&mut self, dt: Duration) -> Vec<GameEvent> {
        let until = self.scheduler.now() + dt;

        while let Some(task) = self.scheduler.pop_due(until) {
            let mut ctx = TickCtx::new(self.scheduler.now(), &self.config);
            if let Err(e) = step::run(&mut self.world, task, &mut ctx) {
                log::warn!("{task:?} failed: {e}");
            }
            let TickCtx { events, follow_ups, .. } = ctx;
            for event in events {
                self.push_event(event);
            }
            for follow_up in follow_ups {
                self.apply(follow_up);
            }
        }
        self.scheduler.advance_to(until);

        std::mem::take(&mut self.pending)
    }

    fn apply(&mut self, follow_up: FollowUp) {
        let timing = &self.config.timing;
        match follow_up {
            FollowUp::Once { delay, task } => {
                self.scheduler.register_one_shot(delay, task);
            }
            FollowUp::Spawned(id) => {
                self.scheduler.register_periodic(timing.physics(), Task::ProjectileGravity(id));
                self.scheduler.register_periodic(timing.projectile(), Task::ProjectileFlight(id));
                self.scheduler.register_periodic(timing.projectile(), Task::ProjectileAnimation(id));
                self.scheduler.register_one_shot(
                    self.config.combat.projectile_ttl(),
                    Task::ProjectileExpire(id),
                );
            }
            FollowUp::Expired(id) => {
                self.scheduler.cancel_where(|t| t.projectile() == Some(id));
            }
            FollowUp::Stop => self.stop(),
        }
    }

    fn push_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Lost if self.outcome.is_none() => self.outcome = Some(Outcome::Lost),
            GameEvent::Won if self.outcome.is_none() => self.outcome = Some(Outcome::Won),
            _ => {}
        }
        if self.muted && event.is_cue() && event != GameEvent::AmbientStop {
            return;
        }
        self.pending.push(event);
    }

    // ── Lifecycle ──

    /// Cancel everything. Idempotent.
    pub fn stop(&mut self) {
        if self.scheduler.is_stopped() {
            return;
        }
        self.scheduler.cancel_all();
        log::info!(
            "session stopped at {:.2}s, outcome {:?}",
            self.scheduler.now().as_secs_f32(),
            self.outcome
        );
    }

    /// Tear down and ask the front end for a new session.
    pub fn request_restart(&mut self) -> Vec<GameEvent> {
        if self.is_running() {
            self.push_event(GameEvent::AmbientStop);
        }
        self.stop();
        self.push_event(GameEvent::RestartRequested);
        std::mem::take(&mut self.pending)
    }

    pub fn is_running(&self) -> bool {
        !self.scheduler.is_stopped()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // ── Audio ──

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        if muted == self.muted {
            return;
        }
        if muted {
            self.push_event(GameEvent::AmbientStop);
            self.muted = true;
        } else {
            self.muted = false;
            if self.is_running() {
                self.push_event(GameEvent::AmbientStart);
            }
        }
    }

    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.muted);
    }

    // ── Rendering ──

    pub fn render<C: Canvas>(&self, canvas: &mut C) {
        render::draw_world(&self.world, canvas, self.config.debug_outlines);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn session(level: &str) -> Session {
        let def = LevelDef::parse(level).unwrap();
        Session::with_level(&GameConfig::default(), &def, &mut StdRng::seed_from_u64(11)).unwrap()
    }

    fn count(events: &[GameEvent], e: GameEvent) -> usize {
        events.iter().filter(|x| **x == e).count()
    }

    #[test]
    fn start_plays_ambient() {
        let mut s = session("");
        assert!(s.is_running());
        assert_eq!(s.advance(ms(1)), vec![GameEvent::AmbientStart]);
    }

    #[test]
    fn throw_scenario() {
        let mut s = session("character_x = 0");
        s.world_mut().fire.set(50.0);
        s.set_input(InputState { action: true, ..Default::default() });
        let events = s.advance(ms(200));

        let w = s.world();
        assert_eq!(w.fire.value(), 40.0);
        assert_eq!(w.projectiles.len(), 1);
        assert_eq!(w.projectiles[0].body.x, w.character.body.x - 26.0);
        assert_eq!(w.projectiles[0].body.facing, w.character.body.facing);
        assert_eq!(count(&events, GameEvent::FireballThrown), 1);
    }

    #[test]
    fn projectile_flies_then_expires() {
        let mut s = session("");
        s.world_mut().fire.set(10.0);
        s.set_input(InputState { action: true, ..Default::default() });
        s.advance(ms(200));
        s.set_input(InputState::default());

        let x0 = s.world().projectiles[0].body.x;
        s.advance(ms(100));
        assert_eq!(s.world().projectiles[0].body.x, x0 + 30.0);

        // Spawned at 200 ms, lives 1500 ms.
        s.advance(ms(1399));
        assert_eq!(s.world().projectiles.len(), 1);
        s.advance(ms(1));
        assert!(s.world().projectiles.is_empty());

        // Its periodic tasks went with it: nothing left to fail.
        s.advance(ms(1000));
        assert!(s.world().projectiles.is_empty());
    }

    #[test]
    fn golem_death_cue_exactly_once() {
        let mut s = session("golems = [{ x = 200.0, speed = 0.0 }]");
        s.world_mut().golems[0].lives = 1;
        s.world_mut().fire.set(10.0);
        s.set_input(InputState { action: true, ..Default::default() });
        let mut events = s.advance(ms(200));
        s.set_input(InputState::default());

        assert_eq!(s.world().golems[0].lives, 0);
        events.extend(s.advance(ms(3000)));
        assert_eq!(count(&events, GameEvent::EnemyDied), 1);
        assert_eq!(s.world().golems[0].body.x, 200.0);
    }

    #[test]
    fn boss_death_wins_once_after_delay() {
        let mut s = session("");
        s.world_mut().boss.lives = 1;
        s.world_mut().boss.take_hit(0.04);

        // Dead state seen at 100 ms, win due 700 ms later.
        let events = s.advance(ms(799));
        assert_eq!(count(&events, GameEvent::Won), 0);
        assert_eq!(count(&events, GameEvent::EnemyDied), 1);

        let events = s.advance(ms(1));
        assert_eq!(count(&events, GameEvent::Won), 1);
        assert_eq!(s.outcome(), Some(Outcome::Won));
        assert!(!s.is_running());

        let events = s.advance(ms(5000));
        assert!(events.is_empty());
    }

    #[test]
    fn character_killed_by_contact_loses_once() {
        let mut s = session("golems = [{ x = 120.0, speed = 0.0 }]");
        s.world_mut().character.body.energy = 10;

        // Two contact hits at 200 and 400 ms.
        let mut events = s.advance(ms(400));
        assert!(s.world().character.body.is_dead());
        events.extend(s.advance(ms(499)));
        assert_eq!(count(&events, GameEvent::Lost), 0);

        events.extend(s.advance(ms(5000)));
        assert_eq!(count(&events, GameEvent::Lost), 1);
        assert_eq!(count(&events, GameEvent::LoseJingle), 1);
        assert_eq!(s.outcome(), Some(Outcome::Lost));
        assert_eq!(s.world().health.value(), 0.0);
    }

    #[test]
    fn failing_projectile_ticks_do_not_stall_the_session() {
        let mut s = session("golems = [{ x = 800.0, speed = 0.5 }]");
        s.world_mut().fire.set(50.0);
        s.set_input(InputState { action: true, ..Default::default() });
        s.advance(ms(200));
        assert_eq!(s.world().projectiles.len(), 1);

        // Its flight and gravity tasks are still registered.
        s.world_mut().projectiles.clear();
        s.set_input(InputState { right: true, ..Default::default() });
        let golem_x = s.world().golems[0].body.x;
        let character_x = s.world().character.body.x;

        s.advance(ms(600));
        assert!(s.is_running());
        assert!(s.world().golems[0].body.x < golem_x);
        assert!(s.world().character.body.x > character_x);

        // Expiry of the missing projectile fails too, and still cancels.
        s.set_input(InputState::default());
        let golem_x = s.world().golems[0].body.x;
        s.advance(ms(1500));
        assert!(s.is_running());
        assert!(s.outcome().is_none());
        assert!(s.world().golems[0].body.x < golem_x);
    }

    #[test]
    fn nothing_changes_after_stop() {
        let mut s = session("golems = [{}, {}, {}]\nclouds = [{}]");
        s.set_input(InputState { right: true, space: true, ..Default::default() });
        s.advance(ms(500));
        s.stop();
        s.stop();

        let snapshot = |s: &Session| {
            let w = s.world();
            (
                w.character.body.x,
                w.character.body.y,
                w.character.frame(),
                w.golems.iter().map(|g| (g.body.x, g.frame())).collect::<Vec<_>>(),
                w.level.clouds[0].body.x,
                w.fire.value(),
                w.health.value(),
            )
        };
        let before = snapshot(&s);
        s.set_input(InputState { left: true, action: true, ..Default::default() });
        assert!(s.advance(ms(10_000)).is_empty());
        assert_eq!(snapshot(&s), before);
    }

    #[test]
    fn muted_session_drops_cues_not_signals() {
        let mut s = session("");
        s.set_muted(true);
        s.world_mut().fire.set(50.0);
        s.set_input(InputState { action: true, ..Default::default() });
        let events = s.advance(ms(200));
        assert_eq!(events, vec![GameEvent::AmbientStart, GameEvent::AmbientStop]);

        let events = s.request_restart();
        assert_eq!(events, vec![GameEvent::AmbientStop, GameEvent::RestartRequested]);
        assert!(!s.is_running());
    }

    #[test]
    fn unmute_restarts_ambient() {
        let mut s = session("");
        s.advance(ms(1));
        s.toggle_mute();
        s.toggle_mute();
        assert!(!s.is_muted());
        assert_eq!(s.advance(ms(1)), vec![GameEvent::AmbientStop, GameEvent::AmbientStart]);
    }

    #[test]
    fn boss_walks_after_aggro() {
        let mut s = session("character_x = 1500");
        s.advance(ms(20));
        let events = s.advance(ms(1000));
        assert!(s.world().boss.proximity_triggered());
        assert!(s.world().boss.body.x < 2100.0);
        assert_eq!(count(&events, GameEvent::BossAggro), 0);
    }
}
