//! Combo rewards
//!
//! Milestones come from the phase's `combo_rewards` map. Hitting one makes a
//! reward claimable (idempotent until claimed or the combo resets). Claiming
//! rolls uniformly among the milestone's enabled effects, flushes the combo,
//! and applies the effect: instant ones land immediately under a short
//! slow-motion flourish, timed ones arm after a preview window and expire on
//! the simulation clock.

use rand::Rng;

use crate::audio::SoundKind;
use crate::consts::*;
use crate::sim::state::{ActiveEffect, Clock, PendingKind, RunState, SimPhase};
use crate::tuning::{PhaseConfig, PhaseTable, RewardKind};

/// Watch the combo count and surface a claimable milestone
pub fn check_offer(state: &mut RunState, cfg: &PhaseConfig) {
    if state.combo == 0 {
        state.reward_offer = None;
        return;
    }
    if state.reward_offer.is_some() {
        return;
    }
    if cfg.combo_rewards.contains_key(&state.combo) {
        state.reward_offer = Some(state.combo);
        state.push_sound(SoundKind::PowerUp);
    }
}

/// Claim the pending reward, if any. Rolls the effect, flushes the combo,
/// and applies it. An empty milestone pool is a logged no-op.
pub fn claim_reward(state: &mut RunState, table: &PhaseTable) -> Option<RewardKind> {
    if state.paused || state.sim_phase != SimPhase::Playing {
        return None;
    }
    let threshold = state.reward_offer.take()?;
    let cfg = table.config(state.phase);

    let pool = match cfg.combo_rewards.get(&threshold) {
        Some(pool) if !pool.is_empty() => pool,
        _ => {
            log::warn!("combo milestone {threshold} has no effects enabled");
            return None;
        }
    };
    let kind = pool[state.rng.random_range(0..pool.len())];
    log::info!("combo {threshold} reward claimed: {kind:?}");

    state.bank_combo();
    apply(state, table, kind);
    Some(kind)
}

fn apply(state: &mut RunState, table: &PhaseTable, kind: RewardKind) {
    match kind {
        RewardKind::Heal50 => {
            state.hp += state.max_hp * 0.5;
            state.clamp_hp();
            state.push_sound(SoundKind::Heal);
            state.show_message("HEAL +50%", MESSAGE_LONG_MS);
            flourish(state);
        }
        RewardKind::Heal100 => {
            state.hp = state.max_hp;
            state.push_sound(SoundKind::Heal);
            state.show_message("FULL REPAIR!", MESSAGE_LONG_MS);
            flourish(state);
        }
        RewardKind::Shield => {
            state.shield += SHIELD_REWARD_CHARGES;
            state.push_sound(SoundKind::PowerUp);
            state.show_message("SHIELD +3", MESSAGE_LONG_MS);
            flourish(state);
        }
        // A speed change is its own spectacle: no preview window
        RewardKind::SlowTime => {
            state.effects.push(ActiveEffect {
                kind,
                expires_at_ms: state.sim_ms + EFFECT_DURATION_MS,
            });
            state.time_scale = SLOW_TIME_SCALE;
            state.push_sound(SoundKind::PowerUp);
            state.show_message("TIME SLOW!", MESSAGE_LONG_MS);
        }
        RewardKind::BombAll => start_bomb(state, true),
        RewardKind::BombHalf => start_bomb(state, false),
        // Timed effects arm after the preview window
        RewardKind::RoadNarrow
        | RewardKind::CameraBoost
        | RewardKind::DoubleScore
        | RewardKind::Searchlight => {
            state.time_scale = SLOWMO_SCALE;
            state.schedule(Clock::Wall, REWARD_PREVIEW_MS, PendingKind::ApplyReward(kind));
            state.push_sound(SoundKind::PowerUp);
            let text = match kind {
                RewardKind::RoadNarrow => "ROADWORKS AHEAD...",
                RewardKind::CameraBoost => "UPGRADING CAMERA...",
                RewardKind::DoubleScore => "DOUBLE SCORE INCOMING...",
                _ => "SEARCHLIGHT WARMING UP...",
            };
            state.show_message(text, REWARD_PREVIEW_MS);
        }
    }
}

/// Instant rewards still get the short slow-motion beat
fn flourish(state: &mut RunState) {
    state.time_scale = SLOWMO_SCALE;
    state.schedule(Clock::Wall, SLOWMO_MS, PendingKind::RestoreTimeScale);
}

/// Queue a staggered detonation over the visible uncaptured vehicles,
/// closest to the gate first. Time crawls until the last one lands.
fn start_bomb(state: &mut RunState, all: bool) {
    let mut targets: Vec<(f32, u32)> = state
        .vehicles
        .iter()
        .filter(|v| !v.captured && v.y > -20.0 && v.y < LATE_LIMIT_Y)
        .map(|v| (v.y, v.id))
        .collect();
    if targets.is_empty() {
        state.show_message("ALL CLEAR", MESSAGE_SHORT_MS);
        return;
    }
    targets.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    let count = if all {
        targets.len()
    } else {
        targets.len().div_ceil(2)
    };

    state.time_scale = BOMB_SCALE;
    for (i, (_, id)) in targets[..count].iter().enumerate() {
        state.schedule(
            Clock::Wall,
            BOMB_STEP_MS * (i + 1) as f64,
            PendingKind::BombStep {
                vehicle_id: *id,
                last: i + 1 == count,
            },
        );
    }
    state.push_sound(SoundKind::PowerUp);
    state.show_message("AIR STRIKE INBOUND!", MESSAGE_LONG_MS);
}

/// One detonation of a staggered bomb sequence (pumped by the tick loop)
pub fn bomb_step(state: &mut RunState, vehicle_id: u32, last: bool) {
    if let Some(pos) = state
        .vehicles
        .iter()
        .position(|v| v.id == vehicle_id && !v.captured)
    {
        state.vehicles.remove(pos);
        state.score += BOMB_SCORE_PER_VEHICLE;
        state.push_sound(SoundKind::Explosion);
    }
    if last {
        state.time_scale = state.base_time_scale();
    }
}

/// A previewed reward's window begins: arm the effect and its expiry
pub fn arm_reward(state: &mut RunState, table: &PhaseTable, kind: RewardKind) {
    state.time_scale = state.base_time_scale();
    state.effects.push(ActiveEffect {
        kind,
        expires_at_ms: state.sim_ms + EFFECT_DURATION_MS,
    });
    match kind {
        RewardKind::RoadNarrow => {
            // Out-of-range traffic leaves with the closed lanes
            state.vehicles.retain(|v| v.lane < NARROW_LANE_CAP);
            state.show_message("ROAD NARROWED TO 2 LANES", MESSAGE_LONG_MS);
        }
        RewardKind::CameraBoost => {
            let cfg = table.config(state.phase);
            state.zone_modifier = (BOOSTED_ZONE_HEIGHT - cfg.zone_height).max(0.0);
            state.show_message("CAMERA BOOSTED", MESSAGE_LONG_MS);
        }
        RewardKind::DoubleScore => state.show_message("DOUBLE SCORE!", MESSAGE_LONG_MS),
        RewardKind::Searchlight => state.show_message("SEARCHLIGHT ON", MESSAGE_LONG_MS),
        _ => {}
    }
}

/// Lapse timed effects whose sim-clock expiry has passed, undoing their
/// side state
pub fn expire_effects(state: &mut RunState) {
    let now = state.sim_ms;
    let expired: Vec<RewardKind> = state
        .effects
        .iter()
        .filter(|e| now >= e.expires_at_ms)
        .map(|e| e.kind)
        .collect();
    if expired.is_empty() {
        return;
    }
    state.effects.retain(|e| now < e.expires_at_ms);
    for kind in expired {
        log::debug!("effect expired: {kind:?}");
        match kind {
            RewardKind::SlowTime => {
                state.time_scale = state.base_time_scale();
                state.show_message("TIME RESUMES", MESSAGE_SHORT_MS);
            }
            RewardKind::CameraBoost => {
                state.zone_modifier = 0.0;
                state.show_message("CAMERA RESET", MESSAGE_SHORT_MS);
            }
            RewardKind::RoadNarrow => state.show_message("ROAD REOPENED", MESSAGE_SHORT_MS),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Behavior, Livery, Vehicle};
    use crate::tuning::PhaseTable;

    fn vehicle(id: u32, lane: usize, y: f32) -> Vehicle {
        Vehicle {
            id,
            lane,
            y,
            speed: 120.0,
            behavior: Behavior::Normal,
            captured: false,
            action_done: false,
            spawn_speed: 120.0,
            livery: Livery::Red,
            stopped_at_ms: None,
            last_drift_ms: None,
        }
    }

    fn setup() -> (RunState, PhaseTable) {
        let mut state = RunState::new(21, 1);
        state.sim_phase = SimPhase::Playing;
        (state, PhaseTable::standard())
    }

    /// A table whose milestone 10 holds exactly one effect
    fn single_effect_table(kind: RewardKind) -> PhaseTable {
        let mut table = PhaseTable::standard();
        table
            .phases
            .get_mut(&1)
            .unwrap()
            .combo_rewards
            .insert(10, vec![kind]);
        table
    }

    #[test]
    fn test_offer_appears_at_milestone_and_sticks() {
        let (mut state, table) = setup();
        let cfg = table.config(1).clone();

        state.combo = 9;
        check_offer(&mut state, &cfg);
        assert_eq!(state.reward_offer, None);

        state.combo = 10;
        check_offer(&mut state, &cfg);
        assert_eq!(state.reward_offer, Some(10));

        // Combo keeps growing; offer stays claimable
        state.combo = 13;
        check_offer(&mut state, &cfg);
        assert_eq!(state.reward_offer, Some(10));

        // Combo broken: offer withdrawn
        state.combo = 0;
        check_offer(&mut state, &cfg);
        assert_eq!(state.reward_offer, None);
    }

    #[test]
    fn test_single_effect_pool_always_yields_it() {
        let table = single_effect_table(RewardKind::Shield);
        let (mut state, _) = setup();
        state.combo = 10;
        state.combo_score = 120;
        state.reward_offer = Some(10);

        let kind = claim_reward(&mut state, &table);
        assert_eq!(kind, Some(RewardKind::Shield));
        assert_eq!(state.shield, SHIELD_REWARD_CHARGES);
        // Claim flushed the combo into the score
        assert_eq!(state.score, 120);
        assert_eq!(state.combo, 0);
        assert_eq!(state.reward_offer, None);
    }

    #[test]
    fn test_claim_without_offer_is_noop() {
        let (mut state, table) = setup();
        assert_eq!(claim_reward(&mut state, &table), None);
    }

    #[test]
    fn test_empty_pool_is_warned_noop() {
        let table = {
            let mut t = PhaseTable::standard();
            t.phases.get_mut(&1).unwrap().combo_rewards.insert(10, vec![]);
            t
        };
        let (mut state, _) = setup();
        state.reward_offer = Some(10);
        state.combo = 10;
        state.combo_score = 50;

        assert_eq!(claim_reward(&mut state, &table), None);
        assert_eq!(state.reward_offer, None);
        // No effect applied, combo untouched
        assert_eq!(state.combo, 10);
        assert_eq!(state.combo_score, 50);
    }

    #[test]
    fn test_heal_50_restores_half_of_max() {
        let table = single_effect_table(RewardKind::Heal50);
        let (mut state, _) = setup();
        state.hp = 20.0;
        state.reward_offer = Some(10);

        claim_reward(&mut state, &table);
        assert_eq!(state.hp, 70.0);
        assert_eq!(state.time_scale, SLOWMO_SCALE);
    }

    #[test]
    fn test_slow_time_halves_scale_without_preview() {
        let table = single_effect_table(RewardKind::SlowTime);
        let (mut state, _) = setup();
        state.reward_offer = Some(10);

        claim_reward(&mut state, &table);
        assert_eq!(state.time_scale, SLOW_TIME_SCALE);
        assert!(state.effect_active(RewardKind::SlowTime));
        assert!(state.pending.is_empty(), "no preview window scheduled");
    }

    #[test]
    fn test_timed_reward_previews_then_arms() {
        let table = single_effect_table(RewardKind::DoubleScore);
        let (mut state, _) = setup();
        state.reward_offer = Some(10);

        claim_reward(&mut state, &table);
        assert_eq!(state.time_scale, SLOWMO_SCALE);
        assert!(!state.effect_active(RewardKind::DoubleScore));
        assert!(state
            .pending
            .iter()
            .any(|a| a.kind == PendingKind::ApplyReward(RewardKind::DoubleScore)));

        arm_reward(&mut state, &table, RewardKind::DoubleScore);
        assert!(state.effect_active(RewardKind::DoubleScore));
        assert_eq!(state.time_scale, 1.0);
    }

    #[test]
    fn test_camera_boost_widens_then_resets_zone() {
        let table = single_effect_table(RewardKind::CameraBoost);
        let (mut state, _) = setup();
        let base_height = table.config(1).zone_height;

        arm_reward(&mut state, &table, RewardKind::CameraBoost);
        assert_eq!(state.zone_modifier, BOOSTED_ZONE_HEIGHT - base_height);

        state.sim_ms += EFFECT_DURATION_MS + 1.0;
        expire_effects(&mut state);
        assert_eq!(state.zone_modifier, 0.0);
        assert!(!state.effect_active(RewardKind::CameraBoost));
    }

    #[test]
    fn test_road_narrow_discards_outer_lane_traffic() {
        let (mut state, table) = setup();
        state.vehicles.push(vehicle(1, 0, 40.0));
        state.vehicles.push(vehicle(2, 3, 50.0));
        state.vehicles.push(vehicle(3, 4, 60.0));

        arm_reward(&mut state, &table, RewardKind::RoadNarrow);
        assert_eq!(state.vehicles.len(), 1);
        assert_eq!(state.vehicles[0].id, 1);
        assert!(state.effect_active(RewardKind::RoadNarrow));
    }

    #[test]
    fn test_bomb_all_removes_everything_staggered() {
        let table = single_effect_table(RewardKind::BombAll);
        let (mut state, _) = setup();
        for i in 0..4 {
            state.vehicles.push(vehicle(i + 1, 0, 20.0 + i as f32 * 10.0));
        }
        state.reward_offer = Some(10);

        claim_reward(&mut state, &table);
        assert_eq!(state.time_scale, BOMB_SCALE);
        let steps: Vec<_> = state
            .pending
            .iter()
            .filter(|a| matches!(a.kind, PendingKind::BombStep { .. }))
            .collect();
        assert_eq!(steps.len(), 4);

        // Walk the sequence: closest to the gate (highest y) goes first
        let order: Vec<u32> = state
            .pending
            .iter()
            .filter_map(|a| match a.kind {
                PendingKind::BombStep { vehicle_id, .. } => Some(vehicle_id),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec![4, 3, 2, 1]);

        let actions: Vec<_> = state.pending.drain(..).collect();
        for a in actions {
            if let PendingKind::BombStep { vehicle_id, last } = a.kind {
                bomb_step(&mut state, vehicle_id, last);
            }
        }
        assert!(state.vehicles.is_empty());
        assert_eq!(state.score, 4 * BOMB_SCORE_PER_VEHICLE);
        assert_eq!(state.time_scale, 1.0);
    }

    #[test]
    fn test_bomb_half_takes_closest_half() {
        let table = single_effect_table(RewardKind::BombHalf);
        let (mut state, _) = setup();
        for i in 0..5 {
            state.vehicles.push(vehicle(i + 1, 0, 20.0 + i as f32 * 10.0));
        }
        state.reward_offer = Some(10);

        claim_reward(&mut state, &table);
        let order: Vec<u32> = state
            .pending
            .iter()
            .filter_map(|a| match a.kind {
                PendingKind::BombStep { vehicle_id, .. } => Some(vehicle_id),
                _ => None,
            })
            .collect();
        // ceil(5/2) = 3 vehicles, highest y first
        assert_eq!(order, vec![5, 4, 3]);
    }

    #[test]
    fn test_bomb_step_skips_already_gone_vehicle() {
        let (mut state, _) = setup();
        state.time_scale = BOMB_SCALE;
        bomb_step(&mut state, 99, true);
        assert_eq!(state.score, 0);
        assert_eq!(state.time_scale, 1.0, "last step still restores time");
    }

    #[test]
    fn test_slow_time_expiry_restores_scale() {
        let table = single_effect_table(RewardKind::SlowTime);
        let (mut state, _) = setup();
        state.reward_offer = Some(10);
        claim_reward(&mut state, &table);

        state.sim_ms += EFFECT_DURATION_MS + 1.0;
        expire_effects(&mut state);
        assert_eq!(state.time_scale, 1.0);
        assert!(!state.effect_active(RewardKind::SlowTime));
    }
}
