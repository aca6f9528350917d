//! Speedtrap entry point
//!
//! Headless demo driver: an autopilot plays a scripted session at a fixed
//! timestep and prints the run report. Useful for eyeballing balance changes
//! without a frontend (RUST_LOG=debug shows spawn/reward traces).

use speedtrap::persistence::MemoryProgress;
use speedtrap::sim::{CaptureOutcome, SimPhase, Zone};
use speedtrap::{EngineConfig, GameEngine, PhaseTable, SoundKind, SoundSink};

/// Counts effect playbacks instead of making noise
#[derive(Default)]
struct SoundCounter {
    played: u32,
}

impl SoundSink for SoundCounter {
    fn play(&mut self, _kind: SoundKind) {
        self.played += 1;
    }
}

/// Fixed demo timestep (120 Hz)
const DT_MS: f64 = 1000.0 / 120.0;
/// Give up after this much simulated wall time
const DEMO_LIMIT_MS: f64 = 10.0 * 60.0 * 1000.0;

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2024);

    let table = PhaseTable::standard();
    let mut engine = GameEngine::new(
        table,
        EngineConfig {
            seed,
            initial_phase: Some(1),
            ..Default::default()
        },
        SoundCounter::default(),
        MemoryProgress::new(),
    );
    engine.set_game_over_handler(|score| println!("final score reported: {score}"));

    let mut captures = 0u32;
    let mut elapsed = 0.0;

    while elapsed < DEMO_LIMIT_MS {
        match engine.state().sim_phase {
            SimPhase::Briefing => {
                let cfg = engine.table().config(engine.state().phase);
                println!(
                    "phase {} briefing: {}",
                    engine.state().phase,
                    cfg.description
                );
                engine.start_phase();
            }
            SimPhase::Playing => {
                if engine.state().reward_offer.is_some() {
                    if let Some(kind) = engine.claim_reward() {
                        println!("reward claimed: {kind:?}");
                    }
                }
                if let Some(lane) = best_tap(&engine) {
                    if let CaptureOutcome::Captured { .. } = engine.capture(lane) {
                        captures += 1;
                    }
                }
            }
            SimPhase::GameOver => {
                if engine.state().game_over_reported {
                    break;
                }
            }
            _ => {}
        }

        engine.frame(DT_MS);
        elapsed += DT_MS;
    }

    let state = engine.state();
    println!("--- demo run report (seed {seed}) ---");
    println!("phase reached:   {}", state.phase);
    println!("banked score:    {}", state.score);
    println!("captures:        {captures}");
    println!("hp:              {:.0}/{:.0}", state.hp, state.max_hp);
    println!("sounds played:   {}", engine.sound_sink().played);
}

/// Tap the lane whose speeder sits closest to the zone center
fn best_tap(engine: &GameEngine<SoundCounter, MemoryProgress>) -> Option<usize> {
    let state = engine.state();
    let table = engine.table();
    let cfg = table.config(state.phase);
    let zone = Zone::new(
        table.rules.zone_bottom,
        cfg.zone_height + state.zone_modifier,
    );

    state
        .vehicles
        .iter()
        .filter(|v| !v.captured && v.speed >= table.rules.target_speed && zone.contains(v.y))
        .min_by(|a, b| {
            zone.offset_ratio(a.y)
                .partial_cmp(&zone.offset_ratio(b.y))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|v| v.lane)
}
