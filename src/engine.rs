//! Orchestrator
//!
//! `GameEngine` owns the run state and the phase table, exposes the action
//! surface to the presentation layer, and routes outbound events to the
//! collaborators: sounds to the sink, reached phases to the progress store,
//! and the final score to the game-over callback (exactly once).

use crate::audio::SoundSink;
use crate::persistence::ProgressStore;
use crate::sim::state::{CaptureOutcome, GameEvent, RunState};
use crate::sim::{capture, set_paused, start_phase, tick};
use crate::tuning::{PhaseTable, RewardKind};

pub use crate::sim::state::PausePolicy;

/// Session setup
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// RNG seed; same seed + same inputs = same run
    pub seed: u64,
    /// Phase to start at; `None` resumes from the progress store
    pub initial_phase: Option<u32>,
    /// Tuning mode: HP depletion auto-heals instead of ending the run
    pub dev_mode: bool,
    pub pause_policy: PausePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            initial_phase: None,
            dev_mode: false,
            pause_policy: PausePolicy::default(),
        }
    }
}

type GameOverHandler = Box<dyn FnMut(u64)>;

/// The game core plus its wired collaborators
pub struct GameEngine<S: SoundSink, P: ProgressStore> {
    state: RunState,
    table: PhaseTable,
    sound: S,
    progress: P,
    on_game_over: Option<GameOverHandler>,
}

impl<S: SoundSink, P: ProgressStore> GameEngine<S, P> {
    pub fn new(table: PhaseTable, config: EngineConfig, sound: S, mut progress: P) -> Self {
        let initial = config
            .initial_phase
            .or_else(|| progress.load_highest_phase())
            .unwrap_or(1);
        let mut state = RunState::new(config.seed, initial);
        state.dev_mode = config.dev_mode;
        state.pause_policy = config.pause_policy;
        log::info!("session start: phase {initial}, seed {}", config.seed);
        Self {
            state,
            table,
            sound,
            progress,
            on_game_over: None,
        }
    }

    /// Install the report-final-score callback
    pub fn set_game_over_handler(&mut self, handler: impl FnMut(u64) + 'static) {
        self.on_game_over = Some(Box::new(handler));
    }

    /// Advance one frame of `dt_ms` wall time
    pub fn frame(&mut self, dt_ms: f64) {
        tick(&mut self.state, &self.table, dt_ms);
        self.dispatch();
    }

    /// Player tapped a lane
    pub fn capture(&mut self, lane: usize) -> CaptureOutcome {
        let outcome = capture(&mut self.state, &self.table, lane);
        self.dispatch();
        outcome
    }

    /// Player started the briefed phase
    pub fn start_phase(&mut self) {
        start_phase(&mut self.state);
        self.dispatch();
    }

    /// Player claimed the offered combo reward
    pub fn claim_reward(&mut self) -> Option<RewardKind> {
        let claimed = crate::sim::rewards::claim_reward(&mut self.state, &self.table);
        self.dispatch();
        claimed
    }

    pub fn set_paused(&mut self, paused: bool) {
        set_paused(&mut self.state, paused);
    }

    /// Read-only view for the presentation layer
    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn table(&self) -> &PhaseTable {
        &self.table
    }

    /// The wired sound sink (handy for inspecting test doubles)
    pub fn sound_sink(&self) -> &S {
        &self.sound
    }

    /// Route buffered events to the collaborators
    fn dispatch(&mut self) {
        for event in self.state.events.drain(..) {
            match event {
                GameEvent::Sound(kind) => self.sound.play(kind),
                GameEvent::PhaseReached(phase) => self.progress.save_highest_phase(phase),
                GameEvent::GameOver { score } => {
                    if let Some(handler) = self.on_game_over.as_mut() {
                        handler(score);
                    }
                }
            }
        }
    }
}
