//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Explicit clocks only (no wall-time reads)
//! - Seeded RNG only
//! - Stable iteration order (by vehicle id)
//! - No rendering, audio, or storage dependencies

pub mod capture;
pub mod drive;
pub mod rewards;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod zone;

pub use capture::capture;
pub use state::{
    ActiveEffect, Behavior, CaptureOutcome, Clock, GameEvent, Livery, Message, PausePolicy,
    PendingAction, PendingKind, RunState, SimPhase, Vehicle,
};
pub use tick::{set_paused, start_phase, tick};
pub use zone::{Grade, Zone};
