//! Vehicle advancement
//!
//! Runs once per tick over every live vehicle: one-shot approach actions,
//! the stop-and-go state machine, police lane drift, position integration,
//! the escaped-speeder penalty, and despawn. All stateful timers run on the
//! simulation clock, so slow motion stretches them consistently.

use rand::Rng;

use crate::consts::*;
use crate::sim::state::{Behavior, Livery, RunState};
use crate::sim::zone::Zone;
use crate::tuning::{PhaseConfig, PhaseTable};

/// Advance every vehicle by `dt_secs` of frame time (time scale applied
/// inside). Penalties and despawns happen here too.
pub fn advance_vehicles(
    state: &mut RunState,
    table: &PhaseTable,
    cfg: &PhaseConfig,
    dt_secs: f64,
) {
    let zone = Zone::new(table.rules.zone_bottom, cfg.zone_height + state.zone_modifier);
    let target = table.rules.target_speed;
    let lanes = state.active_lanes(cfg.lanes);
    let coeff = cfg.speed_coefficient;
    let scaled_dt = dt_secs * state.time_scale as f64;
    let sim_now = state.sim_ms;
    let zone_bottom = table.rules.zone_bottom;
    let physics = &table.physics;

    state.ensure_lane_slots(cfg.lanes);

    let mut escapes = 0u32;
    {
        let RunState {
            vehicles,
            rng,
            lane_last_y,
            ..
        } = state;

        for v in vehicles.iter_mut() {
            // One-shot approach action at the trigger line
            if !v.action_done {
                let offset = match (v.behavior, v.livery) {
                    (Behavior::Swerve, Livery::Motorcycle) => physics.trigger_offset_motorcycle,
                    (Behavior::Swerve, _) => physics.trigger_offset_swerve,
                    _ => physics.trigger_offset_trick,
                };
                if v.y > zone.top - offset {
                    match v.behavior {
                        Behavior::Trick => v.speed = TRICK_DROP_SPEED,
                        Behavior::Nitro => v.speed = NITRO_JUMP_SPEED,
                        Behavior::Swerve => {
                            let mut options = [0usize; 2];
                            let mut n = 0;
                            if v.lane > 0 {
                                options[n] = v.lane - 1;
                                n += 1;
                            }
                            if v.lane + 1 < lanes {
                                options[n] = v.lane + 1;
                                n += 1;
                            }
                            if n > 0 {
                                v.lane = options[rng.random_range(0..n)];
                            }
                        }
                        _ => {}
                    }
                    v.action_done = true;
                }
            }

            // Stop-and-go: halt at the stop line, wait, then bolt
            if v.behavior == Behavior::StopAndGo && !v.captured && !v.action_done {
                let stop_line = zone.top - STOP_LINE_OFFSET;
                if v.y >= stop_line {
                    match v.stopped_at_ms {
                        None => {
                            v.speed = 0.0;
                            v.stopped_at_ms = Some(sim_now);
                        }
                        Some(t) if sim_now - t >= STOP_DURATION_MS => {
                            v.speed = STOP_RESUME_SPEED;
                            v.action_done = true;
                        }
                        Some(_) => v.speed = 0.0,
                    }
                }
            }

            // Police cruisers drift unpredictably between lanes
            if v.behavior == Behavior::Police && !v.captured {
                let last = v.last_drift_ms.get_or_insert(sim_now);
                if sim_now - *last >= POLICE_DRIFT_INTERVAL_MS {
                    *last = sim_now;
                    if rng.random_bool(POLICE_DRIFT_PROB) {
                        let shifted = if v.lane == 0 {
                            1
                        } else if v.lane + 1 >= lanes {
                            v.lane - 1
                        } else if rng.random_bool(0.5) {
                            v.lane - 1
                        } else {
                            v.lane + 1
                        };
                        if shifted < lanes {
                            v.lane = shifted;
                        }
                    }
                }
            }

            // Position integration
            let per_second = (v.speed / coeff) * 60.0;
            let new_y = v.y + (per_second as f64 * scaled_dt) as f32;
            if v.lane < lane_last_y.len() {
                lane_last_y[v.lane] = new_y;
            }

            // A speeder crossing the gate uncaptured is an escape
            if v.y < zone_bottom && new_y >= zone_bottom && !v.captured && v.speed >= target {
                escapes += 1;
            }
            v.y = new_y;
        }
    }

    for _ in 0..escapes {
        state.absorb_or_penalize(ESCAPE_HP_PENALTY, 0, "MISSED!");
    }

    state.vehicles.retain(|v| v.y < DESPAWN_Y);
}
