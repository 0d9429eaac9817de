/// Enemies: the golem that walks left until it dies, and the endboss
/// that waits for the character and then hunts it down.
///
/// Both count hits in `lives` instead of body energy. Hurt is a plain
/// flag; clearing it after a fixed delay is the scheduler's job, one
/// clear per hit taken.
///
/// State ticks:
///   Golem: Dead > Hurt > Walking
///   Boss:  Dead > Hurt > Attacking > Walking (only once aggroed) > Idle

use crate::error::SetupError;
use super::animation::{AnimationState, Animator, ClipKey, FrameRef};
use super::entity::{Body, EntityKind, Facing, Insets};

// ══════════════════════════════════════════════════════════════
// MinorEnemy (golem)
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct MinorEnemy {
    pub body: Body,
    pub lives: u32,
    pub anim: Animator,
    hurt: bool,
    death_cue_played: bool,
}

impl MinorEnemy {
    pub const LIVES: u32 = 5;
    pub const Y: f32 = 250.0;
    pub const SIZE: f32 = 100.0;
    pub const INSETS: Insets = Insets::new(80.0, 30.0, 50.0, 85.0);

    pub fn new(x: f32, speed: f32) -> Result<Self, SetupError> {
        if !(speed.is_finite() && speed >= 0.0) {
            return Err(SetupError::InvalidGeometry {
                kind: EntityKind::MinorEnemy,
                reason: format!("speed {speed} must be a non-negative number"),
            });
        }
        let body = Body::new(EntityKind::MinorEnemy, x, Self::Y, Self::SIZE, Self::SIZE, Self::INSETS)?
            .with_speed(speed);
        Ok(MinorEnemy {
            body,
            lives: Self::LIVES,
            anim: Animator::new(ClipKey::GolemWalking),
            hurt: false,
            death_cue_played: false,
        })
    }

    pub fn is_dead(&self) -> bool {
        self.lives == 0
    }

    pub fn is_hurt(&self) -> bool {
        self.hurt
    }

    /// Creep left; a dead golem stays where it fell.
    pub fn movement_tick(&mut self) {
        if !self.is_dead() {
            self.body.move_left();
        }
    }

    /// Projectile contact. Hurt is set even when already dead.
    pub fn take_hit(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.hurt = true;
    }

    pub fn clear_hurt(&mut self) {
        self.hurt = false;
    }

    pub fn state(&self) -> AnimationState {
        AnimationState::resolve(self.is_dead(), self.hurt, None, true)
    }

    pub fn animate(&mut self, state: AnimationState) -> Option<FrameRef> {
        let clip = match state {
            AnimationState::Dead => ClipKey::GolemDead,
            AnimationState::Hurt => ClipKey::GolemHurt,
            AnimationState::Walking => ClipKey::GolemWalking,
            _ => return None,
        };
        Some(self.anim.play(clip))
    }

    /// True exactly once, on the first dead state tick.
    pub fn latch_death_cue(&mut self) -> bool {
        latch(self.is_dead(), &mut self.death_cue_played)
    }

    pub fn frame(&self) -> FrameRef {
        self.anim.current()
    }
}

// ══════════════════════════════════════════════════════════════
// BossEnemy (endboss)
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct BossEnemy {
    pub body: Body,
    pub lives: u32,
    pub anim: Animator,
    hurt: bool,
    proximity_triggered: bool,
    /// Forces Attacking when set. Tracking never sets it, so the attack
    /// state follows range alone.
    finished_walking: bool,
    start_cue_played: bool,
    death_cue_played: bool,
    win_scheduled: bool,
}

impl BossEnemy {
    pub const LIVES: u32 = 40;
    pub const Y: f32 = 195.0;
    pub const WIDTH: f32 = 200.0;
    pub const HEIGHT: f32 = 150.0;
    pub const SPEED: f32 = 0.35;
    pub const INSETS: Insets = Insets::new(80.0, 20.0, 20.0, 85.0);

    pub fn new(x: f32) -> Result<Self, SetupError> {
        let body = Body::new(EntityKind::BossEnemy, x, Self::Y, Self::WIDTH, Self::HEIGHT, Self::INSETS)?
            .with_speed(Self::SPEED);
        Ok(BossEnemy {
            body,
            lives: Self::LIVES,
            anim: Animator::new(ClipKey::BossWalking),
            hurt: false,
            proximity_triggered: false,
            finished_walking: false,
            start_cue_played: false,
            death_cue_played: false,
            win_scheduled: false,
        })
    }

    pub fn is_dead(&self) -> bool {
        self.lives == 0
    }

    pub fn is_hurt(&self) -> bool {
        self.hurt
    }

    pub fn proximity_triggered(&self) -> bool {
        self.proximity_triggered
    }

    /// Latch proximity. Once set it never clears.
    pub fn trigger_proximity(&mut self) {
        if !self.proximity_triggered {
            log::debug!("boss proximity latched at x={:.1}", self.body.x);
        }
        self.proximity_triggered = true;
    }

    /// Latch proximity and report whether the aggro cue is due (first
    /// time only).
    pub fn aggro(&mut self) -> bool {
        self.trigger_proximity();
        latch(true, &mut self.start_cue_played)
    }

    /// One tracking step toward the character. Returns true if it moved.
    pub fn track(&mut self, character_x: f32, min_x: f32) -> bool {
        if self.is_dead() || !self.proximity_triggered {
            return false;
        }
        if self.body.x <= min_x || (character_x - self.body.x).abs() < 1.0 {
            return false;
        }
        if self.body.x > character_x {
            self.body.move_left();
            self.body.facing = Facing::Forward;
        } else {
            self.body.move_right();
            self.body.facing = Facing::Reversed;
        }
        true
    }

    /// Projectile contact. Returns true when a life was actually taken
    /// (and the hit cue should play).
    pub fn take_hit(&mut self, speedup: f32) -> bool {
        let took_life = self.lives > 0;
        if took_life {
            self.lives -= 1;
            self.body.speed += speedup;
        }
        self.hurt = true;
        took_life
    }

    pub fn clear_hurt(&mut self) {
        self.hurt = false;
    }

    pub fn state(&self, character_center_x: f32, attack_range: f32) -> AnimationState {
        let in_range = (character_center_x - self.body.center_x()).abs() < attack_range;
        let attacking = (self.finished_walking || in_range).then_some(AnimationState::Attacking);
        AnimationState::resolve(self.is_dead(), self.hurt, attacking, self.proximity_triggered)
    }

    pub fn animate(&mut self, state: AnimationState) -> Option<FrameRef> {
        let clip = match state {
            AnimationState::Dead => ClipKey::BossDead,
            AnimationState::Hurt => ClipKey::BossHurt,
            AnimationState::Attacking => ClipKey::BossAttacking,
            AnimationState::Walking => ClipKey::BossWalking,
            _ => return None,
        };
        Some(self.anim.play(clip))
    }

    pub fn latch_death_cue(&mut self) -> bool {
        latch(self.is_dead(), &mut self.death_cue_played)
    }

    pub fn latch_win(&mut self) -> bool {
        latch(self.is_dead(), &mut self.win_scheduled)
    }

    pub fn frame(&self) -> FrameRef {
        self.anim.current()
    }
}

/// One-way flag: returns true the first time `cond` holds.
fn latch(cond: bool, flag: &mut bool) -> bool {
    if cond && !*flag {
        *flag = true;
        true
    } else {
        false
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn golem() -> MinorEnemy {
        MinorEnemy::new(700.0, 0.5).unwrap()
    }

    fn boss() -> BossEnemy {
        BossEnemy::new(2100.0).unwrap()
    }

    // ── golem ──

    #[test]
    fn golem_walks_left() {
        let mut g = golem();
        g.movement_tick();
        assert_eq!(g.body.x, 699.5);
        assert_eq!(g.state(), AnimationState::Walking);
    }

    #[test]
    fn golem_rejects_negative_speed() {
        assert!(MinorEnemy::new(700.0, -1.0).is_err());
    }

    #[test]
    fn dead_golem_stops_moving() {
        let mut g = golem();
        g.lives = 0;
        g.movement_tick();
        assert_eq!(g.body.x, 700.0);
    }

    #[test]
    fn golem_hit_sets_hurt_until_cleared() {
        let mut g = golem();
        g.take_hit();
        assert_eq!(g.lives, 4);
        assert_eq!(g.state(), AnimationState::Hurt);
        g.clear_hurt();
        assert_eq!(g.state(), AnimationState::Walking);
    }

    #[test]
    fn last_life_plays_death_cue_once() {
        let mut g = golem();
        g.lives = 1;
        g.take_hit();
        assert_eq!(g.lives, 0);
        assert_eq!(g.state(), AnimationState::Dead);

        let cues = (0..10).filter(|_| g.latch_death_cue()).count();
        assert_eq!(cues, 1);
    }

    #[test]
    fn hits_on_dead_golem_do_not_underflow() {
        let mut g = golem();
        g.lives = 0;
        g.take_hit();
        assert_eq!(g.lives, 0);
        assert_eq!(g.animate(g.state()), Some(FrameRef::first(ClipKey::GolemDead)));
    }

    // ── boss ──

    #[test]
    fn boss_waits_until_proximity() {
        let mut b = boss();
        assert!(!b.track(1500.0, 300.0));
        assert_eq!(b.body.x, 2100.0);
        assert_eq!(b.state(170.0, 130.0), AnimationState::Idle);
    }

    #[test]
    fn boss_tracks_toward_character() {
        let mut b = boss();
        b.trigger_proximity();
        assert!(b.track(1500.0, 300.0));
        assert!(b.body.x < 2100.0);
        assert_eq!(b.body.facing, Facing::Forward);
        assert_eq!(b.state(1550.0, 130.0), AnimationState::Walking);

        let mut b = boss();
        b.body.x = 500.0;
        b.trigger_proximity();
        assert!(b.track(900.0, 300.0));
        assert!(b.body.x > 500.0);
        assert_eq!(b.body.facing, Facing::Reversed);
    }

    #[test]
    fn boss_stops_at_min_x() {
        let mut b = boss();
        b.body.x = 300.0;
        b.trigger_proximity();
        assert!(!b.track(0.0, 300.0));
        assert_eq!(b.body.x, 300.0);
    }

    #[test]
    fn boss_at_min_x_walks_when_character_is_out_of_range() {
        let mut b = boss();
        b.body.x = 300.0;
        b.trigger_proximity();
        assert!(!b.track(0.0, 300.0));
        let far = b.body.center_x() - 350.0;
        assert_eq!(b.state(far, 130.0), AnimationState::Walking);
        let near = b.body.center_x() - 100.0;
        assert_eq!(b.state(near, 130.0), AnimationState::Attacking);
    }

    #[test]
    fn boss_reaching_character_does_not_stay_attacking() {
        let mut b = boss();
        b.trigger_proximity();
        let mut steps = 0;
        while b.track(1500.0, 300.0) {
            steps += 1;
            assert!(steps < 10_000, "boss never stopped");
        }
        assert!((b.body.x - 1500.0).abs() < 1.0);

        let away = b.body.center_x() + 1000.0;
        assert_eq!(b.state(away, 130.0), AnimationState::Walking);

        assert!(b.track(2500.0, 300.0));
        assert_eq!(b.body.facing, Facing::Reversed);
        assert_eq!(b.state(away, 130.0), AnimationState::Walking);
    }

    #[test]
    fn boss_attacks_in_range() {
        let mut b = boss();
        let center = b.body.center_x();
        assert_eq!(b.state(center - 129.0, 130.0), AnimationState::Attacking);
        assert_eq!(b.state(center - 130.0, 130.0), AnimationState::Idle);
    }

    #[test]
    fn aggro_cue_plays_once() {
        let mut b = boss();
        assert!(b.aggro());
        assert!(!b.aggro());
        assert!(b.proximity_triggered());
    }

    #[test]
    fn boss_hit_speeds_up() {
        let mut b = boss();
        assert!(b.take_hit(0.04));
        assert_eq!(b.lives, 39);
        assert!((b.body.speed - 0.39).abs() < 1e-6);
        assert_eq!(b.state(0.0, 130.0), AnimationState::Hurt);
    }

    #[test]
    fn dead_boss_latches_once() {
        let mut b = boss();
        b.lives = 1;
        assert!(b.take_hit(0.04));
        assert!(!b.take_hit(0.04));
        assert!(b.is_dead());
        assert_eq!(b.state(0.0, 130.0), AnimationState::Dead);
        assert!(b.latch_death_cue());
        assert!(!b.latch_death_cue());
        assert!(b.latch_win());
        assert!(!b.latch_win());
    }

    #[test]
    fn dead_boss_does_not_track() {
        let mut b = boss();
        b.trigger_proximity();
        b.lives = 0;
        assert!(!b.track(0.0, 300.0));
    }
}
