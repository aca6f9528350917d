//! Capture resolution
//!
//! A lane tap resolves synchronously against the zone: find the best
//! candidate, grade it, apply score/combo/HP, and surface exactly one
//! feedback sound (shutter first) plus one transient message.

use crate::audio::SoundKind;
use crate::consts::*;
use crate::sim::state::{Behavior, CaptureOutcome, Clock, PendingKind, RunState, SimPhase};
use crate::sim::zone::{Grade, Zone};
use crate::tuning::{PhaseTable, RewardKind};

/// Resolve a capture tap on `lane`.
pub fn capture(state: &mut RunState, table: &PhaseTable, lane: usize) -> CaptureOutcome {
    if state.paused || state.sim_phase != SimPhase::Playing {
        return CaptureOutcome::Ignored;
    }
    if state.wall_ms - state.last_capture_ms < CAPTURE_DEBOUNCE_MS {
        return CaptureOutcome::Ignored;
    }
    state.last_capture_ms = state.wall_ms;
    state.push_sound(SoundKind::Shutter);

    let cfg = table.config(state.phase);
    let zone = Zone::new(table.rules.zone_bottom, cfg.zone_height + state.zone_modifier);
    let target = table.rules.target_speed;

    // Best candidate in the zone. Overlaps resolve in the player's favor:
    // emergency vehicles first, then actual speeders, then the newest spawn.
    let best = state
        .vehicles
        .iter()
        .enumerate()
        .filter(|(_, v)| v.lane == lane && !v.captured && zone.admits(v.y))
        .max_by_key(|(_, v)| (v.behavior.is_emergency(), v.speed >= target, v.id))
        .map(|(i, _)| i);

    let Some(i) = best else {
        return resolve_empty_tap(state, table, lane, &zone);
    };

    let (y, speed, behavior) = {
        let v = &state.vehicles[i];
        (v.y, v.speed, v.behavior)
    };
    state.vehicles[i].captured = true;

    if speed < target {
        // Not actually speeding: a wrong capture, same cost as a miss
        let shielded = state.absorb_or_penalize(MISS_HP_PENALTY, MISS_SCORE_PENALTY, "FAILED!");
        return CaptureOutcome::Failed { shielded };
    }

    let grade = zone.grade(y);
    let mut base = grade.base_score();
    if state.effect_active(RewardKind::DoubleScore) {
        base *= 2;
    }

    match (behavior, grade) {
        (Behavior::Ambulance, Grade::Perfect) => {
            state.hp = state.max_hp;
            state.push_sound(SoundKind::Heal);
            state.show_message("FULL HEAL!", MESSAGE_LONG_MS);
            start_slowmo(state);
        }
        (Behavior::Police, Grade::Perfect) => {
            state.shield += POLICE_SHIELD_BONUS;
            state.push_sound(SoundKind::PowerUp);
            state.show_message("POLICE BACKUP: SHIELD +1", MESSAGE_LONG_MS);
            start_slowmo(state);
        }
        (_, Grade::Perfect) => {
            state.push_sound(SoundKind::Success);
            state.show_message("PERFECT!!", MESSAGE_LONG_MS);
        }
        (_, Grade::Good) => {
            state.push_sound(SoundKind::Success);
            state.show_message("GOOD!", MESSAGE_LONG_MS);
        }
        (_, Grade::Bad) => {
            state.push_sound(SoundKind::Success);
            state.show_message("BAD..", MESSAGE_LONG_MS);
        }
    }

    state.combo += 1;
    let gained = base + state.combo as u64 * COMBO_STEP_BONUS;
    state.combo_score += gained;

    CaptureOutcome::Captured { grade, gained }
}

/// No candidate in the zone: forgive a just-passed speeder, otherwise
/// it's a true miss.
fn resolve_empty_tap(
    state: &mut RunState,
    table: &PhaseTable,
    lane: usize,
    zone: &Zone,
) -> CaptureOutcome {
    let target = table.rules.target_speed;
    let late = state.vehicles.iter().any(|v| {
        v.lane == lane
            && !v.captured
            && v.y >= zone.bottom + ZONE_TOLERANCE
            && v.y < LATE_LIMIT_Y
            && v.speed >= target
    });

    if late {
        state.show_message("TOO LATE", MESSAGE_SHORT_MS);
        CaptureOutcome::TooLate
    } else {
        let shielded = state.absorb_or_penalize(MISS_HP_PENALTY, MISS_SCORE_PENALTY, "MISS!");
        CaptureOutcome::Missed { shielded }
    }
}

/// The short slow-motion flourish after an emergency PERFECT
fn start_slowmo(state: &mut RunState) {
    state.time_scale = SLOWMO_SCALE;
    state.schedule(Clock::Wall, SLOWMO_MS, PendingKind::RestoreTimeScale);
}
