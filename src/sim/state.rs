//! Run state and core simulation types
//!
//! All mutable session state lives in one `RunState` owned by the
//! orchestrator. The sim is deterministic: seeded RNG, explicit clocks,
//! stable iteration order (vehicles sorted by id).

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::SoundKind;
use crate::consts::*;
use crate::tuning::RewardKind;

/// What a vehicle does as it approaches the detection zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Drives straight through at its spawn speed
    Normal,
    /// Brakes hard just before the zone
    Trick,
    /// Accelerates hard just before the zone
    Nitro,
    /// Hops to an adjacent lane just before the zone
    Swerve,
    /// Halts at the stop line, waits, then bolts
    StopAndGo,
    /// Emergency vehicle; a PERFECT capture fully heals
    Ambulance,
    /// Cruiser that drifts between lanes; a PERFECT capture grants shield
    Police,
}

impl Behavior {
    /// Emergency vehicles get capture priority and PERFECT bonuses
    pub fn is_emergency(self) -> bool {
        matches!(self, Behavior::Ambulance | Behavior::Police)
    }
}

/// Visual variant, surfaced to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Livery {
    Red,
    Blue,
    Yellow,
    Motorcycle,
    Ambulance,
    Police,
}

/// A vehicle scrolling down a lane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u32,
    pub lane: usize,
    /// Vertical position in screen units, 0 = top, increases downward
    pub y: f32,
    /// Current speed (km/h)
    pub speed: f32,
    pub behavior: Behavior,
    pub captured: bool,
    /// One-shot approach action already fired
    pub action_done: bool,
    /// Speed at spawn time (readouts show this before any trick/nitro)
    pub spawn_speed: f32,
    pub livery: Livery,
    /// Stop-and-go: sim time the halt began
    pub stopped_at_ms: Option<f64>,
    /// Police: sim time of the last drift check
    pub last_drift_ms: Option<f64>,
}

/// Session-level state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    /// Live simulation
    Playing,
    /// Fanfare hold after the phase target is met; sim frozen
    StageClear,
    /// Mission text shown, waiting for the player to start
    Briefing,
    /// 3-2-1 before the phase goes live
    Countdown,
    /// Run ended; waiting to report the final score
    GameOver,
}

/// What paused time does to scheduled actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PausePolicy {
    /// Both clocks freeze; nothing expires while paused
    #[default]
    FreezeTimers,
    /// The wall clock keeps running while paused, so wall-scheduled
    /// windows (slow-motion restores, holds) keep expiring
    TimersRun,
}

/// Which clock a scheduled action fires against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Raw frame time; unaffected by time scale
    Wall,
    /// Scaled gameplay time
    Sim,
}

/// Deferred state mutations, pumped by the tick loop
#[derive(Debug, Clone, PartialEq)]
pub enum PendingKind {
    /// End a slow-motion window
    RestoreTimeScale,
    /// A claimed reward's preview ended; arm its real effect
    ApplyReward(RewardKind),
    /// Detonate one vehicle of a staggered bomb sequence
    BombStep { vehicle_id: u32, last: bool },
    /// Fanfare over; advance to the next phase
    StageClearDone,
    /// One step of the 3-2-1 countdown
    CountdownTick,
    /// Dramatic hold over; report the final score
    ReportGameOver,
}

/// A scheduled action tagged with the generation it was created in.
/// Stale-generation actions are dropped, never applied.
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub fire_at_ms: f64,
    pub clock: Clock,
    pub generation: u32,
    pub kind: PendingKind,
}

/// A timed reward effect and when it lapses (sim clock)
#[derive(Debug, Clone)]
pub struct ActiveEffect {
    pub kind: RewardKind,
    pub expires_at_ms: f64,
}

/// Transient on-screen text
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    pub until_wall_ms: f64,
}

/// Outbound notifications for the orchestrator's collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundKind),
    /// A new phase was reached (progress persistence hook)
    PhaseReached(u32),
    /// The run ended; final banked score, combo already flushed
    GameOver { score: u64 },
}

/// Result of a capture tap, for the caller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureOutcome {
    /// A speeder was photographed in the zone
    Captured {
        grade: crate::sim::zone::Grade,
        gained: u64,
    },
    /// The tapped vehicle wasn't actually speeding
    Failed { shielded: bool },
    /// Nothing to photograph in the zone
    Missed { shielded: bool },
    /// The speeder had already passed; forgiven
    TooLate,
    /// Debounced, paused, or not currently playing
    Ignored,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct RunState {
    pub seed: u64,
    pub rng: Pcg32,
    /// Current phase number (1-based)
    pub phase: u32,
    pub sim_phase: SimPhase,
    pub paused: bool,
    pub pause_policy: PausePolicy,
    /// Tuning/dev mode: HP depletion auto-heals instead of ending the run
    pub dev_mode: bool,

    pub hp: f32,
    pub max_hp: f32,
    /// Banked score
    pub score: u64,
    /// Captures since the combo last reset
    pub combo: u32,
    /// Score accumulated but not yet banked
    pub combo_score: u64,
    pub shield: u32,

    /// Current gameplay speed multiplier
    pub time_scale: f32,
    /// Added to the phase's zone height (CAMERA_BOOST)
    pub zone_modifier: f32,

    /// Raw elapsed frame time (ms)
    pub wall_ms: f64,
    /// Scaled gameplay time (ms); drives all gameplay timers
    pub sim_ms: f64,

    pub vehicles: Vec<Vehicle>,
    /// Latest known Y per lane, for the spawner's density check
    pub lane_last_y: Vec<f32>,
    next_id: u32,
    /// Sim time of the last spawn
    pub last_spawn_ms: f64,
    /// Wall time of the last accepted capture tap (debounce)
    pub last_capture_ms: f64,

    /// Banked + unbanked score when the current phase began
    pub phase_start_score: u64,
    /// No failure or miss yet this phase
    pub perfect_phase: bool,
    pub ambulance_spawned: bool,
    pub police_spawned: bool,

    pub effects: Vec<ActiveEffect>,
    pub pending: Vec<PendingAction>,
    /// Bumped on every phase change and on game over; stale scheduled
    /// actions compare against this and no-op
    pub generation: u32,

    /// Remaining countdown steps (3, 2, 1)
    pub countdown: Option<u8>,
    pub message: Option<Message>,
    /// Claimable combo milestone, if any
    pub reward_offer: Option<u32>,
    pub game_over_reported: bool,

    /// Drained by the orchestrator every frame
    pub events: Vec<GameEvent>,
}

impl RunState {
    /// Fresh session at the given phase. A session always begins in the
    /// briefing: the player gates the first countdown.
    pub fn new(seed: u64, initial_phase: u32) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: initial_phase.max(1),
            sim_phase: SimPhase::Briefing,
            paused: false,
            pause_policy: PausePolicy::default(),
            dev_mode: false,
            hp: 100.0,
            max_hp: 100.0,
            score: 0,
            combo: 0,
            combo_score: 0,
            shield: 0,
            time_scale: 1.0,
            zone_modifier: 0.0,
            wall_ms: 0.0,
            sim_ms: 0.0,
            vehicles: Vec::new(),
            lane_last_y: Vec::new(),
            next_id: 1,
            last_spawn_ms: 0.0,
            last_capture_ms: f64::NEG_INFINITY,
            phase_start_score: 0,
            perfect_phase: true,
            ambulance_spawned: false,
            police_spawned: false,
            effects: Vec::new(),
            pending: Vec::new(),
            generation: 0,
            countdown: None,
            message: None,
            reward_offer: None,
            game_over_reported: false,
            events: Vec::new(),
        }
    }

    /// Allocate a monotonic vehicle id
    pub fn next_vehicle_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Make sure the per-lane spawn records cover `lanes` lanes.
    /// New lanes start fully clear.
    pub fn ensure_lane_slots(&mut self, lanes: usize) {
        if self.lane_last_y.len() < lanes {
            self.lane_last_y.resize(lanes, 100.0);
        }
    }

    /// Lanes accepting traffic right now (ROAD_NARROW caps the road)
    pub fn active_lanes(&self, configured: usize) -> usize {
        if self.effect_active(RewardKind::RoadNarrow) {
            configured.min(NARROW_LANE_CAP)
        } else {
            configured
        }
    }

    /// Whether a timed reward effect is currently live
    pub fn effect_active(&self, kind: RewardKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    /// Presentation flag: force every speed readout visible
    pub fn searchlight_on(&self) -> bool {
        self.effect_active(RewardKind::Searchlight)
    }

    /// Time scale with no slow-motion window in flight
    pub fn base_time_scale(&self) -> f32 {
        if self.effect_active(RewardKind::SlowTime) {
            SLOW_TIME_SCALE
        } else {
            1.0
        }
    }

    /// Score earned since the current phase began (penalties can push
    /// this negative)
    pub fn phase_progress(&self) -> i64 {
        (self.score + self.combo_score) as i64 - self.phase_start_score as i64
    }

    /// Bank the unbanked combo score and reset the combo
    pub fn bank_combo(&mut self) {
        if self.combo_score > 0 {
            self.score += self.combo_score;
            self.combo_score = 0;
        }
        self.combo = 0;
        self.reward_offer = None;
    }

    pub fn push_sound(&mut self, kind: SoundKind) {
        self.events.push(GameEvent::Sound(kind));
    }

    /// Replace the transient message
    pub fn show_message(&mut self, text: impl Into<String>, duration_ms: f64) {
        self.message = Some(Message {
            text: text.into(),
            until_wall_ms: self.wall_ms + duration_ms,
        });
    }

    /// Schedule a deferred action `delay_ms` from now on the given clock,
    /// tagged with the current generation
    pub fn schedule(&mut self, clock: Clock, delay_ms: f64, kind: PendingKind) {
        let fire_at_ms = match clock {
            Clock::Wall => self.wall_ms + delay_ms,
            Clock::Sim => self.sim_ms + delay_ms,
        };
        self.pending.push(PendingAction {
            fire_at_ms,
            clock,
            generation: self.generation,
            kind,
        });
    }

    /// Clamp HP into [0, max] after any adjustment
    pub fn clamp_hp(&mut self) {
        self.hp = self.hp.clamp(0.0, self.max_hp);
    }

    /// A failure/miss lands: an available shield absorbs it (combo
    /// preserved, no penalties); otherwise the combo is banked and the
    /// penalties apply. Returns true when a shield took the hit.
    pub fn absorb_or_penalize(
        &mut self,
        hp_penalty: f32,
        score_penalty: u64,
        label: &str,
    ) -> bool {
        if self.shield > 0 {
            self.shield -= 1;
            self.push_sound(SoundKind::PowerUp);
            self.show_message("SHIELD PROTECTED!", MESSAGE_LONG_MS);
            true
        } else {
            self.bank_combo();
            self.score = self.score.saturating_sub(score_penalty);
            self.hp -= hp_penalty;
            self.clamp_hp();
            self.push_sound(SoundKind::Fail);
            self.show_message(label, MESSAGE_SHORT_MS);
            self.perfect_phase = false;
            false
        }
    }

    /// Deterministic iteration order for vehicles
    pub fn normalize_order(&mut self) {
        self.vehicles.sort_by_key(|v| v.id);
    }
}
