//! Per-frame update
//!
//! One `tick` per frame drives everything: clock advance, the deferred
//! action pump (with its generation guard), spawn cadence, vehicle
//! advancement, reward-offer watching, and the phase state machine
//! Playing -> StageClear -> Briefing -> Countdown -> Playing, with GameOver
//! as the terminal branch.

use crate::audio::SoundKind;
use crate::consts::*;
use crate::sim::state::{
    Clock, GameEvent, PausePolicy, PendingAction, PendingKind, RunState, SimPhase,
};
use crate::sim::{drive, rewards, spawn};
use crate::tuning::PhaseTable;

/// Advance the session by one frame of `dt_ms` wall time.
pub fn tick(state: &mut RunState, table: &PhaseTable, dt_ms: f64) {
    if state.paused {
        // Frozen sim. Whether scheduled windows keep expiring is policy.
        if state.pause_policy == PausePolicy::TimersRun {
            state.wall_ms += dt_ms;
            pump_pending(state, table);
            expire_message(state);
        }
        return;
    }

    state.wall_ms += dt_ms;
    pump_pending(state, table);
    expire_message(state);

    if state.sim_phase != SimPhase::Playing {
        return;
    }

    let cfg = table.config(state.phase);
    state.sim_ms += dt_ms * state.time_scale as f64;
    rewards::expire_effects(state);

    // Phase target met? The next phase must exist; the last configured
    // phase runs forever.
    if state.phase_progress() >= cfg.score_target as i64 && table.has_phase(state.phase + 1) {
        enter_stage_clear(state);
        return;
    }

    if state.sim_ms - state.last_spawn_ms > cfg.spawn_interval_ms {
        spawn::try_spawn(state, table, cfg);
        state.last_spawn_ms = state.sim_ms;
    }

    drive::advance_vehicles(state, table, cfg, dt_ms / 1000.0);
    rewards::check_offer(state, cfg);

    if state.hp <= 0.0 {
        if state.dev_mode {
            state.hp = state.max_hp;
            state.show_message("AUTO-REPAIR (TUNING MODE)", MESSAGE_LONG_MS);
            log::info!("tuning mode: HP depleted, auto-healed");
        } else {
            enter_game_over(state);
            return;
        }
    }

    state.normalize_order();
}

/// Unpause gate for player actions lives with the actions themselves;
/// this only flips the flag.
pub fn set_paused(state: &mut RunState, paused: bool) {
    state.paused = paused;
}

/// Player starts the briefed phase: 3-2-1, then play.
pub fn start_phase(state: &mut RunState) {
    if state.sim_phase != SimPhase::Briefing {
        return;
    }
    state.sim_phase = SimPhase::Countdown;
    state.countdown = Some(3);
    state.push_sound(SoundKind::Click);
    state.schedule(Clock::Wall, COUNTDOWN_STEP_MS, PendingKind::CountdownTick);
}

fn enter_stage_clear(state: &mut RunState) {
    state.bank_combo();
    state.sim_phase = SimPhase::StageClear;
    state.push_sound(SoundKind::LevelUp);
    state.show_message("STAGE CLEAR!", STAGE_CLEAR_MS);
    state.schedule(Clock::Wall, STAGE_CLEAR_MS, PendingKind::StageClearDone);
    log::info!(
        "phase {} cleared at score {} (perfect: {})",
        state.phase,
        state.score,
        state.perfect_phase
    );
}

/// Fanfare over: advance the phase and reset everything per-phase.
fn advance_phase(state: &mut RunState) {
    state.generation += 1;
    state.phase += 1;

    // Per-phase modifiers all reset
    state.time_scale = 1.0;
    state.zone_modifier = 0.0;
    state.effects.clear();
    state.shield = 0;
    state.vehicles.clear();
    for y in state.lane_last_y.iter_mut() {
        *y = 100.0;
    }
    state.ambulance_spawned = false;
    state.police_spawned = false;
    state.phase_start_score = state.score;

    if state.perfect_phase {
        state.max_hp *= PERFECT_MAX_HP_MULT;
        state.hp = state.max_hp;
        state.push_sound(SoundKind::PowerUp);
        state.show_message("FLAWLESS! MAX HP +10%", MESSAGE_LONG_MS);
    } else {
        let heal = (state.max_hp - state.hp) * CLEAR_HEAL_FRACTION;
        state.hp += heal;
        state.clamp_hp();
        state.push_sound(SoundKind::Heal);
        state.show_message("PATCHED UP", MESSAGE_LONG_MS);
    }
    state.perfect_phase = true;

    state.events.push(GameEvent::PhaseReached(state.phase));
    state.sim_phase = SimPhase::Briefing;
    log::info!("entering phase {}", state.phase);
}

fn enter_game_over(state: &mut RunState) {
    state.generation += 1;
    state.bank_combo();
    state.sim_phase = SimPhase::GameOver;
    state.time_scale = GAME_OVER_SCALE;
    state.push_sound(SoundKind::Fail);
    state.show_message("MISSION FAILED", GAME_OVER_HOLD_MS);
    state.schedule(Clock::Wall, GAME_OVER_HOLD_MS, PendingKind::ReportGameOver);
    log::info!("game over at phase {} with score {}", state.phase, state.score);
}

/// Fire every due scheduled action, dropping any whose generation is stale.
fn pump_pending(state: &mut RunState, table: &PhaseTable) {
    loop {
        let due = |a: &PendingAction| match a.clock {
            Clock::Wall => state.wall_ms >= a.fire_at_ms,
            Clock::Sim => state.sim_ms >= a.fire_at_ms,
        };
        let Some(pos) = state.pending.iter().position(due) else {
            break;
        };
        let action = state.pending.remove(pos);
        if action.generation != state.generation {
            log::debug!("dropping stale scheduled action {:?}", action.kind);
            continue;
        }
        fire(state, table, action.kind);
    }
}

fn fire(state: &mut RunState, table: &PhaseTable, kind: PendingKind) {
    match kind {
        PendingKind::RestoreTimeScale => {
            state.time_scale = state.base_time_scale();
        }
        PendingKind::ApplyReward(kind) => rewards::arm_reward(state, table, kind),
        PendingKind::BombStep { vehicle_id, last } => rewards::bomb_step(state, vehicle_id, last),
        PendingKind::StageClearDone => advance_phase(state),
        PendingKind::CountdownTick => match state.countdown {
            Some(n) if n > 1 => {
                state.countdown = Some(n - 1);
                state.push_sound(SoundKind::Click);
                state.schedule(Clock::Wall, COUNTDOWN_STEP_MS, PendingKind::CountdownTick);
            }
            _ => {
                state.countdown = None;
                state.sim_phase = SimPhase::Playing;
                state.last_spawn_ms = state.sim_ms;
                log::debug!("phase {} live", state.phase);
            }
        },
        PendingKind::ReportGameOver => {
            if !state.game_over_reported {
                state.game_over_reported = true;
                state.events.push(GameEvent::GameOver { score: state.score });
            }
        }
    }
}

fn expire_message(state: &mut RunState) {
    if let Some(m) = &state.message {
        if state.wall_ms >= m.until_wall_ms {
            state.message = None;
        }
    }
}
