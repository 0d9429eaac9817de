/// The player character.
///
/// Movement (per movement tick, right checked before left):
///   right held, x < end boundary, alive → move right, face forward
///   left  held, x > 0,            alive → move left,  face reversed
///   jump held, grounded,          alive → vertical impulse
///
/// The animation state is derived every tick from energy, hurt timing,
/// height and input; it is never stored.

use std::time::Duration;

use crate::config::PhysicsConfig;
use crate::error::SetupError;
use super::animation::{AnimationState, Animator, ClipKey, FrameRef};
use super::entity::{Body, EntityKind, Facing, InputState, Insets};
use super::physics;

#[derive(Clone, Debug)]
pub struct Character {
    pub body: Body,
    pub anim: Animator,
    lose_scheduled: bool,
}

impl Character {
    pub const Y: f32 = 250.0;
    pub const SIZE: f32 = 100.0;
    pub const SPEED: f32 = 10.0;
    pub const INSETS: Insets = Insets::new(80.0, 50.0, 50.0, 85.0);

    pub fn new(x: f32) -> Result<Self, SetupError> {
        let body = Body::new(EntityKind::Character, x, Self::Y, Self::SIZE, Self::SIZE, Self::INSETS)?
            .with_speed(Self::SPEED);
        Ok(Character {
            body,
            anim: Animator::new(ClipKey::CharacterWalking),
            lose_scheduled: false,
        })
    }

    /// One movement tick. Returns true when the character took a step.
    pub fn apply_input(&mut self, input: &InputState, end_x: f32, physics: &PhysicsConfig) -> bool {
        let alive = !self.body.is_dead();
        let mut walked = false;

        if input.right && self.body.x < end_x && alive {
            self.body.move_right();
            self.body.facing = Facing::Forward;
            walked = true;
        }
        if input.left && self.body.x > 0.0 && alive {
            self.body.move_left();
            self.body.facing = Facing::Reversed;
            walked = true;
        }
        if input.jump_requested() && !physics::is_airborne(&self.body, physics.ground_y) && alive {
            self.body.jump(physics.jump_impulse);
        }

        walked
    }

    pub fn state(&self, input: &InputState, now: Duration, hurt_window: Duration, ground_y: f32) -> AnimationState {
        let airborne = physics::is_airborne(&self.body, ground_y);
        AnimationState::resolve(
            self.body.is_dead(),
            self.body.is_hurt(now, hurt_window),
            airborne.then_some(AnimationState::Jumping),
            input.horizontal_held(),
        )
    }

    /// Advance the animation for `state`. Idle keeps the current frame.
    pub fn animate(&mut self, state: AnimationState) -> Option<FrameRef> {
        let clip = match state {
            AnimationState::Dead => ClipKey::CharacterDead,
            AnimationState::Hurt => ClipKey::CharacterHurt,
            AnimationState::Jumping => ClipKey::CharacterJumping,
            AnimationState::Walking => ClipKey::CharacterWalking,
            AnimationState::Attacking | AnimationState::Idle => return None,
        };
        Some(self.anim.play(clip))
    }

    /// True exactly once: the first time it is called after death.
    pub fn latch_lose(&mut self) -> bool {
        if self.body.is_dead() && !self.lose_scheduled {
            self.lose_scheduled = true;
            true
        } else {
            false
        }
    }

    pub fn frame(&self) -> FrameRef {
        self.anim.current()
    }
}
