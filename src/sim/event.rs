/// Events emitted while a session runs.
///
/// Cues are for the audio collaborator and may be dropped while muted.
/// Signals are the three terminal notifications for the screen layer and
/// are always delivered.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum GameEvent {
    // ── cues ──
    CharacterHurt,
    WalkStep,
    FireballThrown,
    ItemPicked,
    EnemyHurt,
    EnemyDied,
    BossAggro,
    BossHit,
    AmbientStart,
    AmbientStop,
    WinJingle,
    LoseJingle,

    // ── signals ──
    Lost,
    Won,
    RestartRequested,
}

impl GameEvent {
    pub fn is_signal(self) -> bool {
        matches!(self, GameEvent::Lost | GameEvent::Won | GameEvent::RestartRequested)
    }

    pub fn is_cue(self) -> bool {
        !self.is_signal()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Won,
    Lost,
}
