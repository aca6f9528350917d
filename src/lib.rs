//! Speedtrap - a lane-based speed-camera arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, vehicle motion, capture, rewards)
//! - `tuning`: Data-driven phase balance (the stage editor's export format)
//! - `engine`: Orchestrator wiring the sim to its collaborators
//! - `audio`: Sound-effect sink seam
//! - `persistence`: Progress (highest phase) seam

pub mod audio;
pub mod engine;
pub mod persistence;
pub mod sim;
pub mod tuning;

pub use audio::{SoundKind, SoundSink};
pub use engine::{EngineConfig, GameEngine, PausePolicy};
pub use tuning::{PhaseConfig, PhaseTable};

/// Game rule constants
pub mod consts {
    /// Vertical position where vehicles enter (just above the visible top)
    pub const SPAWN_Y: f32 = -10.0;
    /// Vehicles past this position leave the live set
    pub const DESPAWN_Y: f32 = 110.0;
    /// Upper bound of the "too late" forgiveness window
    pub const LATE_LIMIT_Y: f32 = 120.0;
    /// Slack added to both zone edges when matching a tap to a vehicle
    pub const ZONE_TOLERANCE: f32 = 5.0;

    /// Minimum wall-clock gap between accepted capture taps (ms)
    pub const CAPTURE_DEBOUNCE_MS: f64 = 50.0;

    /// Speed a braking (trick) vehicle drops to at its trigger line
    pub const TRICK_DROP_SPEED: f32 = 92.0;
    /// Speed an accelerating (nitro) vehicle jumps to at its trigger line
    pub const NITRO_JUMP_SPEED: f32 = 138.0;
    /// Stop-and-go: distance above the zone top where the vehicle halts
    pub const STOP_LINE_OFFSET: f32 = 15.0;
    /// Stop-and-go: how long the vehicle stays halted (sim ms)
    pub const STOP_DURATION_MS: f64 = 3000.0;
    /// Stop-and-go: speed after pulling away from the stop line
    pub const STOP_RESUME_SPEED: f32 = 130.0;
    /// Police cruisers consider a lane drift this often (sim ms)
    pub const POLICE_DRIFT_INTERVAL_MS: f64 = 2000.0;
    /// Chance a due police drift actually changes lane
    pub const POLICE_DRIFT_PROB: f64 = 0.3;
    /// Per-spawn chance of a flagged rare vehicle (ambulance/police)
    pub const RARE_SPAWN_PROB: f64 = 0.1;
    /// Motorcycles never spawn slower than max speed plus this margin
    pub const MOTORCYCLE_SPEED_MARGIN: f32 = 10.0;

    /// Center-offset ratio at or below which a capture grades PERFECT
    pub const PERFECT_RATIO: f32 = 0.4;
    /// Center-offset ratio at or below which a capture grades GOOD
    pub const GOOD_RATIO: f32 = 0.7;
    /// Base scores per grade
    pub const PERFECT_SCORE: u64 = 30;
    pub const GOOD_SCORE: u64 = 15;
    pub const BAD_SCORE: u64 = 5;
    /// Score added per combo step on top of the base score
    pub const COMBO_STEP_BONUS: u64 = 2;

    /// Score deducted on a failed or missed capture (floored at 0)
    pub const MISS_SCORE_PENALTY: u64 = 30;
    /// HP deducted on a failed or missed capture
    pub const MISS_HP_PENALTY: f32 = 10.0;
    /// HP deducted when a speeder escapes past the zone
    pub const ESCAPE_HP_PENALTY: f32 = 20.0;

    /// Shield charges granted by the SHIELD reward
    pub const SHIELD_REWARD_CHARGES: u32 = 3;
    /// Shield charges granted by a PERFECT capture of a police cruiser
    pub const POLICE_SHIELD_BONUS: u32 = 1;

    /// Time scale during a short slow-motion window
    pub const SLOWMO_SCALE: f32 = 0.2;
    /// Length of the emergency-capture slow-motion window (wall ms)
    pub const SLOWMO_MS: f64 = 2000.0;
    /// Length of the reward preview slow-motion window (wall ms)
    pub const REWARD_PREVIEW_MS: f64 = 4000.0;
    /// Time scale while a bomb sequence is detonating
    pub const BOMB_SCALE: f32 = 0.05;
    /// Gap between staggered bomb detonations (wall ms)
    pub const BOMB_STEP_MS: f64 = 300.0;
    /// Score per vehicle removed by a bomb
    pub const BOMB_SCORE_PER_VEHICLE: u64 = 200;
    /// Lifetime of a timed reward effect (sim ms)
    pub const EFFECT_DURATION_MS: f64 = 60_000.0;
    /// Time scale while SLOW_TIME is active
    pub const SLOW_TIME_SCALE: f32 = 0.5;
    /// Lane count while ROAD_NARROW is active
    pub const NARROW_LANE_CAP: usize = 2;
    /// Effective zone height while CAMERA_BOOST is active
    pub const BOOSTED_ZONE_HEIGHT: f32 = 40.0;

    /// Fanfare hold after a phase target is met (wall ms)
    pub const STAGE_CLEAR_MS: f64 = 2500.0;
    /// Gap between countdown steps before a phase starts (wall ms)
    pub const COUNTDOWN_STEP_MS: f64 = 1000.0;
    /// Dramatic hold before the final score is reported (wall ms)
    pub const GAME_OVER_HOLD_MS: f64 = 2500.0;
    /// Time scale during the game-over sequence
    pub const GAME_OVER_SCALE: f32 = 0.05;

    /// Max-HP multiplier for clearing a phase without a single failure
    pub const PERFECT_MAX_HP_MULT: f32 = 1.1;
    /// Fraction of missing HP healed on a non-perfect clear
    pub const CLEAR_HEAL_FRACTION: f32 = 0.5;

    /// Transient message display times (wall ms)
    pub const MESSAGE_SHORT_MS: f64 = 500.0;
    pub const MESSAGE_LONG_MS: f64 = 800.0;
}
