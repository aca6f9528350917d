//! Sound-effect seam
//!
//! The core announces effects and never waits on them; synthesis and mixing
//! belong to the presentation layer behind `SoundSink`.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// Camera shutter, on every capture tap
    Shutter,
    /// Graded capture landed
    Success,
    /// Failure, miss, or escape
    Fail,
    /// Phase cleared
    LevelUp,
    /// HP restored
    Heal,
    /// Shield, reward, or other power-up moment
    PowerUp,
    /// Bomb detonation
    Explosion,
    /// UI confirmation
    Click,
}

/// Fire-and-forget effect playback. No return value, no errors surfaced.
pub trait SoundSink {
    fn play(&mut self, kind: SoundKind);
}

/// Discards everything (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SoundSink for NullSink {
    fn play(&mut self, _kind: SoundKind) {}
}

/// Records everything (tests)
#[derive(Debug, Default, Clone)]
pub struct SinkLog {
    pub played: Vec<SoundKind>,
}

impl SoundSink for SinkLog {
    fn play(&mut self, kind: SoundKind) {
        self.played.push(kind);
    }
}
