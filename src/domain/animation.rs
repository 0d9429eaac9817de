/// Animation states, the clip catalogue and the per-entity animator.
///
/// Each animation tick an entity resolves exactly one `AnimationState`
/// by priority and maps it to a clip:
///
///   Dead > Hurt > Jumping / Attacking > Walking > Idle
///
/// `Idle` maps to no clip: the entity keeps showing its current frame.
///
/// The animator keeps one running counter for all clips. The frame shown
/// is `counter mod clip length`, so switching clips does not restart the
/// sequence and re-entering a clip can resume mid-way.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum AnimationState {
    Idle,
    Walking,
    Jumping,
    Attacking,
    Hurt,
    Dead,
}

impl AnimationState {
    /// Higher wins.
    pub fn priority(self) -> u8 {
        match self {
            AnimationState::Idle => 0,
            AnimationState::Walking => 1,
            AnimationState::Jumping | AnimationState::Attacking => 2,
            AnimationState::Hurt => 3,
            AnimationState::Dead => 4,
        }
    }

    /// Pick the state for this tick. `contextual` is the entity-specific
    /// middle tier (Jumping for the character, Attacking for the boss).
    pub fn resolve(
        dead: bool,
        hurt: bool,
        contextual: Option<AnimationState>,
        walking: bool,
    ) -> AnimationState {
        if dead {
            AnimationState::Dead
        } else if hurt {
            AnimationState::Hurt
        } else if let Some(state) = contextual {
            state
        } else if walking {
            AnimationState::Walking
        } else {
            AnimationState::Idle
        }
    }
}

/// Every animation clip the core can ask for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ClipKey {
    CharacterWalking,
    CharacterJumping,
    CharacterHurt,
    CharacterDead,
    GolemWalking,
    GolemHurt,
    GolemDead,
    BossWalking,
    BossAttacking,
    BossHurt,
    BossDead,
    Flame,
    FireItem,
    Cloud,
    Background,
}

impl ClipKey {
    pub const ALL: [ClipKey; 15] = [
        ClipKey::CharacterWalking,
        ClipKey::CharacterJumping,
        ClipKey::CharacterHurt,
        ClipKey::CharacterDead,
        ClipKey::GolemWalking,
        ClipKey::GolemHurt,
        ClipKey::GolemDead,
        ClipKey::BossWalking,
        ClipKey::BossAttacking,
        ClipKey::BossHurt,
        ClipKey::BossDead,
        ClipKey::Flame,
        ClipKey::FireItem,
        ClipKey::Cloud,
        ClipKey::Background,
    ];

    /// Number of frames in the clip. Never zero.
    pub const fn frame_count(self) -> usize {
        match self {
            ClipKey::CharacterWalking => 12,
            ClipKey::CharacterJumping => 12,
            ClipKey::CharacterHurt => 12,
            ClipKey::CharacterDead => 1,
            ClipKey::GolemWalking => 11,
            ClipKey::GolemHurt => 12,
            ClipKey::GolemDead => 1,
            ClipKey::BossWalking => 17,
            ClipKey::BossAttacking => 12,
            ClipKey::BossHurt => 12,
            ClipKey::BossDead => 1,
            ClipKey::Flame => 29,
            ClipKey::FireItem => 1,
            ClipKey::Cloud => 2,
            // One frame per parallax layer.
            ClipKey::Background => 4,
        }
    }
}

/// A reference to one frame of one clip. Resolving it to pixels (or
/// glyphs) is the asset collaborator's job.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct FrameRef {
    pub clip: ClipKey,
    pub index: usize,
}

impl FrameRef {
    pub fn first(clip: ClipKey) -> Self {
        FrameRef { clip, index: 0 }
    }
}

/// "Current frame for key K" capability. Returns `None` for anything
/// the collaborator could not load; callers draw nothing in that case.
pub trait FrameSource {
    type Frame;

    fn frame(&self, frame: FrameRef) -> Option<&Self::Frame>;
}

#[derive(Clone, Debug)]
pub struct Animator {
    current: FrameRef,
    counter: usize,
}

impl Animator {
    pub fn new(initial: ClipKey) -> Self {
        Animator { current: FrameRef::first(initial), counter: 0 }
    }

    /// Show the next frame of `clip` and advance the shared counter.
    pub fn play(&mut self, clip: ClipKey) -> FrameRef {
        let index = self.counter % clip.frame_count();
        self.current = FrameRef { clip, index };
        self.counter = self.counter.wrapping_add(1);
        self.current
    }

    pub fn current(&self) -> FrameRef {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order() {
        use AnimationState::*;
        assert!(Dead.priority() > Hurt.priority());
        assert!(Hurt.priority() > Jumping.priority());
        assert_eq!(Jumping.priority(), Attacking.priority());
        assert!(Attacking.priority() > Walking.priority());
        assert!(Walking.priority() > Idle.priority());
    }

    #[test]
    fn resolve_picks_highest_priority() {
        use AnimationState::*;
        assert_eq!(AnimationState::resolve(true, true, Some(Jumping), true), Dead);
        assert_eq!(AnimationState::resolve(false, true, Some(Jumping), true), Hurt);
        assert_eq!(AnimationState::resolve(false, false, Some(Attacking), true), Attacking);
        assert_eq!(AnimationState::resolve(false, false, None, true), Walking);
        assert_eq!(AnimationState::resolve(false, false, None, false), Idle);
    }

    #[test]
    fn clips_are_never_empty() {
        for clip in ClipKey::ALL {
            assert!(clip.frame_count() > 0, "{clip:?}");
        }
    }

    #[test]
    fn frames_wrap_modulo_clip_length() {
        let mut a = Animator::new(ClipKey::GolemWalking);
        let frames: Vec<usize> = (0..13).map(|_| a.play(ClipKey::GolemWalking).index).collect();
        assert_eq!(frames[..11], [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(frames[11], 0);
        assert_eq!(frames[12], 1);
    }

    #[test]
    fn switching_clips_keeps_the_counter() {
        let mut a = Animator::new(ClipKey::CharacterWalking);
        for _ in 0..5 {
            a.play(ClipKey::CharacterWalking);
        }
        // Counter is 5: the hurt clip starts mid-sequence.
        assert_eq!(a.play(ClipKey::CharacterHurt).index, 5);
        assert_eq!(a.play(ClipKey::CharacterWalking).index, 6);
    }

    #[test]
    fn single_frame_clip_stays_put() {
        let mut a = Animator::new(ClipKey::BossDead);
        for _ in 0..4 {
            assert_eq!(a.play(ClipKey::BossDead), FrameRef::first(ClipKey::BossDead));
        }
    }
}
