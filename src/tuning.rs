//! Data-driven game balance
//!
//! Phase tables are what the external stage-tuning editor exports: table-wide
//! rules, physics constants, and one config per phase number. The core treats
//! a loaded table as read-only; a phase lookup never fails (missing phases
//! fall back to the nearest configured one).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Effects a combo reward can roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RewardKind {
    /// Restore 50% of max HP
    #[serde(rename = "HEAL_50")]
    Heal50,
    /// Restore to full HP
    #[serde(rename = "HEAL_100")]
    Heal100,
    /// +3 shield charges
    #[serde(rename = "SHIELD")]
    Shield,
    /// Remove every visible vehicle, staggered
    #[serde(rename = "BOMB_ALL")]
    BombAll,
    /// Remove the closest half of visible vehicles, staggered
    #[serde(rename = "BOMB_HALF")]
    BombHalf,
    /// Cap active lanes to 2 for a while
    #[serde(rename = "ROAD_NARROW")]
    RoadNarrow,
    /// Enlarge the detection zone for a while
    #[serde(rename = "CAMERA_BOOST")]
    CameraBoost,
    /// Halve the time scale for a while
    #[serde(rename = "SLOW_TIME")]
    SlowTime,
    /// Double non-combo capture score for a while
    #[serde(rename = "DOUBLE_SCORE")]
    DoubleScore,
    /// Force all speed readouts visible for a while (presentation flag)
    #[serde(rename = "SEARCHLIGHT")]
    Searchlight,
}

/// Per-phase difficulty tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Score to earn (relative to phase start) before the phase clears
    pub score_target: u64,
    /// Detection-zone height, % of screen
    pub zone_height: f32,
    /// Lanes open this phase
    pub lanes: usize,
    /// Speed-to-motion divisor (lower = visually faster)
    pub speed_coefficient: f32,
    /// Chance a spawn brakes hard before the zone
    pub trick_prob: f64,
    /// Chance a spawn accelerates hard before the zone
    pub nitro_prob: f64,
    /// Chance an overspeed spawn swerves lanes before the zone
    pub swerve_prob: f64,
    /// Chance an overspeed spawn halts at the stop line then bolts
    pub stop_and_go_prob: f64,
    /// Chance a spawn is a motorcycle
    pub motorcycle_prob: f64,
    /// One ambulance may appear this phase
    pub has_ambulance: bool,
    /// One police cruiser may appear this phase
    pub has_police: bool,
    /// Gap between spawn attempts (sim ms)
    pub spawn_interval_ms: f64,
    /// A lane's last vehicle must pass this % Y before the lane can respawn
    pub spawn_y_threshold: f32,
    /// Slowest spawn speed (km/h)
    pub min_speed: f32,
    /// Fastest spawn speed (km/h)
    pub max_speed: f32,
    /// Chance a spawn is over the target speed at all
    pub overspeed_prob: f64,
    /// Combo count -> effect pool enabled at that milestone
    pub combo_rewards: BTreeMap<u32, Vec<RewardKind>>,
    /// Mission text shown at phase start
    pub description: String,
}

/// Table-wide rules shared by every phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRules {
    /// Speed at or above which a vehicle is a capture target (km/h)
    pub target_speed: f32,
    /// Total lanes the road can ever show
    pub max_lanes: usize,
    /// Bottom edge of the detection zone, % of screen from the top
    pub zone_bottom: f32,
}

impl Default for TableRules {
    fn default() -> Self {
        Self {
            target_speed: 100.0,
            max_lanes: 5,
            zone_bottom: 90.0,
        }
    }
}

/// Motion and trigger constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Physics {
    /// Fallback speed divisor when a phase doesn't override it
    pub speed_coefficient: f32,
    /// Fallback spawn density threshold
    pub spawn_y_threshold: f32,
    /// Fixed ambulance speed (km/h)
    pub ambulance_speed: f32,
    /// Fixed police cruiser speed (km/h)
    pub police_speed: f32,
    /// Distance above the zone top where a trick vehicle brakes
    pub trigger_offset_trick: f32,
    /// Distance above the zone top where a swerve vehicle changes lane
    pub trigger_offset_swerve: f32,
    /// Motorcycles trigger earlier than cars
    pub trigger_offset_motorcycle: f32,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            speed_coefficient: 160.0,
            spawn_y_threshold: 30.0,
            ambulance_speed: 200.0,
            police_speed: 170.0,
            trigger_offset_trick: 5.0,
            trigger_offset_swerve: 5.0,
            trigger_offset_motorcycle: 10.0,
        }
    }
}

/// Errors from loading or validating an external table
#[derive(Debug)]
pub enum TuningError {
    /// The JSON didn't parse
    Parse(serde_json::Error),
    /// A phase violates a table invariant
    Invalid { phase: u32, reason: String },
    /// The table has no phases at all
    Empty,
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "tuning parse error: {e}"),
            TuningError::Invalid { phase, reason } => {
                write!(f, "invalid phase {phase}: {reason}")
            }
            TuningError::Empty => write!(f, "tuning table has no phases"),
        }
    }
}

impl std::error::Error for TuningError {}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

/// The whole balance table: rules + physics + phase configs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTable {
    pub rules: TableRules,
    pub physics: Physics,
    pub phases: BTreeMap<u32, PhaseConfig>,
}

impl PhaseTable {
    /// Config for a phase, falling back to the nearest lower configured phase
    /// (else the first). The embedded table is never empty, and external
    /// tables are validated non-empty on load.
    pub fn config(&self, phase: u32) -> &PhaseConfig {
        if let Some(cfg) = self.phases.get(&phase) {
            return cfg;
        }
        let fallback = self
            .phases
            .range(..=phase)
            .next_back()
            .or_else(|| self.phases.iter().next())
            .map(|(n, cfg)| (*n, cfg))
            .expect("phase table validated non-empty");
        log::warn!("no config for phase {phase}, using phase {}", fallback.0);
        fallback.1
    }

    /// Whether the table defines this exact phase number
    pub fn has_phase(&self, phase: u32) -> bool {
        self.phases.contains_key(&phase)
    }

    /// Check every table invariant
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.phases.is_empty() {
            return Err(TuningError::Empty);
        }
        for (&phase, cfg) in &self.phases {
            let fail = |reason: String| TuningError::Invalid { phase, reason };
            if cfg.score_target == 0 {
                return Err(fail("score target must be > 0".into()));
            }
            if !(cfg.min_speed < self.rules.target_speed
                && self.rules.target_speed < cfg.max_speed)
            {
                return Err(fail(format!(
                    "need min {} < target {} < max {}",
                    cfg.min_speed, self.rules.target_speed, cfg.max_speed
                )));
            }
            if cfg.lanes == 0 || cfg.lanes > self.rules.max_lanes {
                return Err(fail(format!("lane count {} out of range", cfg.lanes)));
            }
            if cfg.zone_height <= 0.0 || cfg.zone_height >= self.rules.zone_bottom {
                return Err(fail(format!("zone height {} out of range", cfg.zone_height)));
            }
            if cfg.spawn_interval_ms <= 0.0 {
                return Err(fail("spawn interval must be > 0".into()));
            }
            for (name, p) in [
                ("trick", cfg.trick_prob),
                ("nitro", cfg.nitro_prob),
                ("swerve", cfg.swerve_prob),
                ("stop-and-go", cfg.stop_and_go_prob),
                ("motorcycle", cfg.motorcycle_prob),
                ("overspeed", cfg.overspeed_prob),
            ] {
                if !(0.0..=1.0).contains(&p) {
                    return Err(fail(format!("{name} probability {p} outside [0,1]")));
                }
            }
        }
        Ok(())
    }

    /// Load and validate a table from the editor's JSON export
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let table: PhaseTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Export the table as JSON (the editor's import format)
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The shipped 19-phase campaign
    pub fn standard() -> Self {
        use RewardKind::*;

        let full_pool = || {
            vec![
                Heal50, Heal100, Shield, BombAll, BombHalf, RoadNarrow, CameraBoost, SlowTime,
            ]
        };
        // Milestones default to the full pool; early phases narrow the first
        // tiers to teach one effect at a time.
        let rewards = |tiers: &[(u32, Vec<RewardKind>)]| {
            let mut map: BTreeMap<u32, Vec<RewardKind>> = [10, 20, 30, 40]
                .into_iter()
                .map(|t| (t, full_pool()))
                .collect();
            for (threshold, pool) in tiers {
                map.insert(*threshold, pool.clone());
            }
            map
        };

        let base = PhaseConfig {
            score_target: 1500,
            zone_height: 25.0,
            lanes: 4,
            speed_coefficient: 160.0,
            trick_prob: 0.0,
            nitro_prob: 0.0,
            swerve_prob: 0.0,
            stop_and_go_prob: 0.0,
            motorcycle_prob: 0.0,
            has_ambulance: false,
            has_police: false,
            spawn_interval_ms: 1000.0,
            spawn_y_threshold: 30.0,
            min_speed: 88.0,
            max_speed: 130.0,
            overspeed_prob: 0.6,
            combo_rewards: rewards(&[]),
            description: String::new(),
        };

        let phases: BTreeMap<u32, PhaseConfig> = [
            (1, PhaseConfig {
                score_target: 2000,
                zone_height: 30.0,
                lanes: 1,
                spawn_interval_ms: 400.0,
                max_speed: 110.0,
                combo_rewards: rewards(&[(10, vec![DoubleScore])]),
                description: "Basics: tap vehicles over 100 km/h inside the yellow zone".into(),
                ..base.clone()
            }),
            (2, PhaseConfig {
                score_target: 900,
                zone_height: 30.0,
                lanes: 3,
                combo_rewards: rewards(&[(10, vec![Shield])]),
                description: "More lanes open. Tighten up enforcement".into(),
                ..base.clone()
            }),
            (3, PhaseConfig {
                score_target: 900,
                zone_height: 30.0,
                lanes: 3,
                swerve_prob: 0.65,
                combo_rewards: rewards(&[(10, vec![Shield])]),
                description: "Drivers are swerving lanes to dodge the camera".into(),
                ..base.clone()
            }),
            (4, PhaseConfig {
                zone_height: 30.0,
                swerve_prob: 0.65,
                overspeed_prob: 0.7,
                combo_rewards: rewards(&[(10, vec![RoadNarrow, Shield])]),
                description: "A wide road is a dangerous road. Try a 10 combo".into(),
                ..base.clone()
            }),
            (5, PhaseConfig {
                stop_and_go_prob: 0.5,
                spawn_y_threshold: 65.0,
                combo_rewards: rewards(&[(10, vec![Shield, DoubleScore]), (20, vec![BombAll])]),
                description: "Some drivers slam the brakes at the stop line".into(),
                ..base.clone()
            }),
            (6, PhaseConfig {
                nitro_prob: 0.5,
                spawn_y_threshold: 45.0,
                combo_rewards: rewards(&[(10, vec![DoubleScore, Shield]), (20, vec![BombHalf])]),
                description: "Sudden acceleration ahead. Watch them all the way in".into(),
                ..base.clone()
            }),
            (7, PhaseConfig {
                score_target: 2500,
                lanes: 5,
                speed_coefficient: 150.0,
                trick_prob: 0.25,
                nitro_prob: 0.5,
                combo_rewards: rewards(&[(10, vec![DoubleScore, SlowTime, Shield])]),
                description: "Eyes open!".into(),
                ..base.clone()
            }),
            (8, PhaseConfig {
                score_target: 1700,
                zone_height: 20.0,
                speed_coefficient: 150.0,
                trick_prob: 0.1,
                stop_and_go_prob: 0.1,
                motorcycle_prob: 0.1,
                combo_rewards: rewards(&[
                    (10, vec![Shield, SlowTime, DoubleScore]),
                    (20, vec![BombAll, BombHalf]),
                ]),
                description: "Warning: road outlaws incoming".into(),
                ..base.clone()
            }),
            (9, PhaseConfig {
                score_target: 2700,
                zone_height: 27.0,
                speed_coefficient: 150.0,
                trick_prob: 0.25,
                nitro_prob: 0.6,
                swerve_prob: 0.1,
                stop_and_go_prob: 0.1,
                spawn_y_threshold: 65.0,
                min_speed: 62.0,
                max_speed: 145.0,
                combo_rewards: rewards(&[
                    (10, vec![Shield, SlowTime, DoubleScore]),
                    (20, vec![BombAll, BombHalf, DoubleScore]),
                ]),
                description: "Caution: braking tricks!".into(),
                ..base.clone()
            }),
            (10, PhaseConfig {
                score_target: 1000,
                zone_height: 22.0,
                lanes: 5,
                trick_prob: 0.3,
                min_speed: 92.0,
                max_speed: 125.0,
                description: "Caution: vehicles shedding speed at the last moment".into(),
                ..base.clone()
            }),
            (11, PhaseConfig {
                zone_height: 22.0,
                lanes: 5,
                swerve_prob: 0.3,
                spawn_interval_ms: 1100.0,
                spawn_y_threshold: 35.0,
                max_speed: 115.0,
                description: "Danger: lane changers dodging the camera".into(),
                ..base.clone()
            }),
            (12, PhaseConfig {
                lanes: 5,
                nitro_prob: 0.3,
                spawn_interval_ms: 1300.0,
                spawn_y_threshold: 40.0,
                max_speed: 115.0,
                description: "Warning: hard accelerators about".into(),
                ..base.clone()
            }),
            (13, PhaseConfig {
                zone_height: 20.0,
                lanes: 5,
                stop_and_go_prob: 0.4,
                spawn_interval_ms: 1100.0,
                spawn_y_threshold: 35.0,
                max_speed: 120.0,
                description: "Caution: stop-line lurkers that bolt".into(),
                ..base.clone()
            }),
            (14, PhaseConfig {
                zone_height: 20.0,
                lanes: 5,
                swerve_prob: 0.5,
                motorcycle_prob: 0.4,
                spawn_interval_ms: 1100.0,
                min_speed: 95.0,
                description: "Warning: a swarm of small fast motorcycles".into(),
                ..base.clone()
            }),
            (15, PhaseConfig {
                score_target: 2500,
                zone_height: 18.0,
                lanes: 5,
                stop_and_go_prob: 0.2,
                has_ambulance: true,
                spawn_interval_ms: 800.0,
                spawn_y_threshold: 20.0,
                min_speed: 98.0,
                max_speed: 140.0,
                description: "Warning: more traffic, more speed".into(),
                ..base.clone()
            }),
            (16, PhaseConfig {
                score_target: 2500,
                zone_height: 18.0,
                lanes: 5,
                trick_prob: 0.5,
                nitro_prob: 0.5,
                stop_and_go_prob: 0.1,
                has_ambulance: true,
                spawn_interval_ms: 800.0,
                spawn_y_threshold: 20.0,
                min_speed: 98.0,
                max_speed: 150.0,
                description: "Warning: the chaos keeps building".into(),
                ..base.clone()
            }),
            (17, PhaseConfig {
                score_target: 2500,
                zone_height: 18.0,
                lanes: 5,
                trick_prob: 0.3,
                nitro_prob: 0.3,
                swerve_prob: 0.5,
                stop_and_go_prob: 0.3,
                motorcycle_prob: 0.3,
                has_ambulance: true,
                has_police: true,
                spawn_interval_ms: 800.0,
                spawn_y_threshold: 20.0,
                min_speed: 98.0,
                max_speed: 150.0,
                description: "Warning: the motorcycles are back".into(),
                ..base.clone()
            }),
            (18, PhaseConfig {
                score_target: 2500,
                zone_height: 18.0,
                lanes: 5,
                trick_prob: 0.2,
                nitro_prob: 0.2,
                swerve_prob: 0.2,
                stop_and_go_prob: 0.2,
                motorcycle_prob: 0.2,
                has_ambulance: true,
                has_police: true,
                spawn_interval_ms: 800.0,
                spawn_y_threshold: 20.0,
                min_speed: 99.0,
                max_speed: 160.0,
                overspeed_prob: 0.8,
                description: "Warning: nearly everyone is speeding".into(),
                ..base.clone()
            }),
            (19, PhaseConfig {
                score_target: 99_999,
                zone_height: 18.0,
                lanes: 5,
                trick_prob: 0.5,
                nitro_prob: 0.5,
                swerve_prob: 0.5,
                stop_and_go_prob: 0.5,
                motorcycle_prob: 0.2,
                has_ambulance: true,
                has_police: true,
                spawn_interval_ms: 700.0,
                spawn_y_threshold: 20.0,
                min_speed: 99.0,
                max_speed: 180.0,
                overspeed_prob: 0.7,
                description: "Endless patrol: prove you're the best there is".into(),
                ..base.clone()
            }),
        ]
        .into();

        let table = Self {
            rules: TableRules::default(),
            physics: Physics::default(),
            phases,
        };
        debug_assert!(table.validate().is_ok());
        table
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self::standard()
    }
}
