//! Vehicle spawner
//!
//! One spawn attempt per elapsed spawn interval. Lane choice respects the
//! phase's density threshold; behavior selection is a prioritized decision
//! table evaluated top to bottom, so a rule that hits starves everything
//! below it (deliberate difficulty tuning, not a bug).

use rand::Rng;

use crate::consts::*;
use crate::sim::state::{Behavior, Livery, RunState, Vehicle};
use crate::tuning::{PhaseConfig, PhaseTable};

/// Try to put one new vehicle on the road. Returns its id, or `None` when
/// every lane is still too crowded (a silently skipped attempt).
pub fn try_spawn(state: &mut RunState, table: &PhaseTable, cfg: &PhaseConfig) -> Option<u32> {
    let lanes = state.active_lanes(cfg.lanes);
    state.ensure_lane_slots(cfg.lanes.max(lanes));

    let open: Vec<usize> = (0..lanes)
        .filter(|&l| state.lane_last_y[l] > cfg.spawn_y_threshold)
        .collect();
    if open.is_empty() {
        return None;
    }
    let lane = open[state.rng.random_range(0..open.len())];

    let target = table.rules.target_speed;
    let overspeed = state.rng.random_bool(cfg.overspeed_prob);
    let mut speed = if overspeed {
        let lo = target + 1.0;
        lo + state.rng.random::<f32>() * (cfg.max_speed - lo)
    } else {
        cfg.min_speed + state.rng.random::<f32>() * ((target - 1.0) - cfg.min_speed)
    };

    let mut behavior = roll_behavior(state, cfg, overspeed);

    // Behavior-specific speed overrides
    match behavior {
        Behavior::Trick | Behavior::StopAndGo => speed = cfg.max_speed,
        Behavior::Nitro => speed = cfg.min_speed + 10.0,
        Behavior::Ambulance => speed = table.physics.ambulance_speed,
        Behavior::Police => speed = table.physics.police_speed,
        _ => {}
    }

    // Livery roll: three base liveries, motorcycle override, emergency last
    let mut livery = match state.rng.random_range(0..3u8) {
        0 => Livery::Red,
        1 => Livery::Blue,
        _ => Livery::Yellow,
    };
    if !behavior.is_emergency() && state.rng.random_bool(cfg.motorcycle_prob) {
        livery = Livery::Motorcycle;
        if overspeed {
            behavior = Behavior::Swerve;
        }
        speed = speed.max(cfg.max_speed + MOTORCYCLE_SPEED_MARGIN);
    }
    match behavior {
        Behavior::Ambulance => livery = Livery::Ambulance,
        Behavior::Police => livery = Livery::Police,
        _ => {}
    }

    let id = state.next_vehicle_id();
    state.vehicles.push(Vehicle {
        id,
        lane,
        y: SPAWN_Y,
        speed,
        behavior,
        captured: false,
        action_done: false,
        spawn_speed: speed,
        livery,
        stopped_at_ms: None,
        last_drift_ms: None,
    });
    state.lane_last_y[lane] = SPAWN_Y;
    log::debug!("spawned {behavior:?} #{id} in lane {lane} at {speed:.0} km/h");
    Some(id)
}

/// The behavior decision table. Guards in priority order:
///
/// 1. nitro roll
/// 2. trick roll (against the remaining probability mass)
/// 3. ambulance, once per phase when flagged
/// 4. police, once per phase when flagged
/// 5. swerve, overspeed vehicles only
/// 6. stop-and-go, overspeed vehicles only
/// 7. otherwise normal
fn roll_behavior(state: &mut RunState, cfg: &PhaseConfig, overspeed: bool) -> Behavior {
    let roll: f64 = state.rng.random();
    if roll < cfg.nitro_prob {
        return Behavior::Nitro;
    }
    if roll < cfg.nitro_prob + cfg.trick_prob {
        return Behavior::Trick;
    }
    if cfg.has_ambulance && !state.ambulance_spawned && state.rng.random_bool(RARE_SPAWN_PROB) {
        state.ambulance_spawned = true;
        return Behavior::Ambulance;
    }
    if cfg.has_police && !state.police_spawned && state.rng.random_bool(RARE_SPAWN_PROB) {
        state.police_spawned = true;
        return Behavior::Police;
    }
    if overspeed {
        if state.rng.random_bool(cfg.swerve_prob) {
            return Behavior::Swerve;
        }
        if state.rng.random_bool(cfg.stop_and_go_prob) {
            return Behavior::StopAndGo;
        }
    }
    Behavior::Normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::PhaseTable;

    fn setup() -> (RunState, PhaseTable) {
        (RunState::new(7, 1), PhaseTable::standard())
    }

    #[test]
    fn test_saturated_road_skips_spawn() {
        let (mut state, table) = setup();
        let cfg = table.config(1).clone();
        state.ensure_lane_slots(cfg.lanes);
        for y in state.lane_last_y.iter_mut() {
            *y = 0.0; // nothing has cleared the density threshold
        }
        assert_eq!(try_spawn(&mut state, &table, &cfg), None);
        assert!(state.vehicles.is_empty());
    }

    #[test]
    fn test_spawn_enters_offscreen_and_marks_lane() {
        let (mut state, table) = setup();
        let cfg = table.config(1).clone();
        let id = try_spawn(&mut state, &table, &cfg).unwrap();
        let v = &state.vehicles[0];
        assert_eq!(v.id, id);
        assert_eq!(v.y, SPAWN_Y);
        assert_eq!(state.lane_last_y[v.lane], SPAWN_Y);
        assert_eq!(v.spawn_speed, v.speed);
    }

    #[test]
    fn test_overspeed_rolls_above_target() {
        let (mut state, table) = setup();
        let mut cfg = table.config(1).clone();
        cfg.overspeed_prob = 1.0;
        for _ in 0..50 {
            state.vehicles.clear();
            state.ensure_lane_slots(cfg.lanes);
            state.lane_last_y[0] = 100.0;
            try_spawn(&mut state, &table, &cfg).unwrap();
            let v = &state.vehicles[0];
            assert!(v.speed > table.rules.target_speed, "speed {}", v.speed);
            assert!(v.speed <= cfg.max_speed + MOTORCYCLE_SPEED_MARGIN);
        }
    }

    #[test]
    fn test_lawful_rolls_below_target() {
        let (mut state, table) = setup();
        let mut cfg = table.config(1).clone();
        cfg.overspeed_prob = 0.0;
        cfg.motorcycle_prob = 0.0;
        for _ in 0..50 {
            state.vehicles.clear();
            state.ensure_lane_slots(cfg.lanes);
            state.lane_last_y[0] = 100.0;
            try_spawn(&mut state, &table, &cfg).unwrap();
            let v = &state.vehicles[0];
            assert!(v.speed < table.rules.target_speed, "speed {}", v.speed);
            assert!(v.speed >= cfg.min_speed);
        }
    }

    #[test]
    fn test_nitro_priority_and_speed_override() {
        let (mut state, table) = setup();
        let mut cfg = table.config(1).clone();
        cfg.nitro_prob = 1.0;
        cfg.trick_prob = 1.0; // starved by nitro
        cfg.motorcycle_prob = 0.0;
        try_spawn(&mut state, &table, &cfg).unwrap();
        let v = &state.vehicles[0];
        assert_eq!(v.behavior, Behavior::Nitro);
        assert_eq!(v.speed, cfg.min_speed + 10.0);
    }

    #[test]
    fn test_trick_forced_to_max_speed() {
        let (mut state, table) = setup();
        let mut cfg = table.config(1).clone();
        cfg.trick_prob = 1.0;
        cfg.motorcycle_prob = 0.0;
        try_spawn(&mut state, &table, &cfg).unwrap();
        let v = &state.vehicles[0];
        assert_eq!(v.behavior, Behavior::Trick);
        assert_eq!(v.speed, cfg.max_speed);
    }

    #[test]
    fn test_ambulance_spawns_once_per_phase() {
        let (mut state, table) = setup();
        let mut cfg = table.config(15).clone();
        assert!(cfg.has_ambulance);
        cfg.nitro_prob = 0.0;
        cfg.trick_prob = 0.0;
        cfg.motorcycle_prob = 0.0;
        cfg.spawn_y_threshold = -100.0; // every lane always open

        let mut ambulances = 0;
        for _ in 0..500 {
            state.vehicles.clear();
            if try_spawn(&mut state, &table, &cfg).is_some() {
                if state.vehicles[0].behavior == Behavior::Ambulance {
                    ambulances += 1;
                    assert_eq!(state.vehicles[0].speed, table.physics.ambulance_speed);
                    assert_eq!(state.vehicles[0].livery, Livery::Ambulance);
                }
            }
        }
        assert_eq!(ambulances, 1);
        assert!(state.ambulance_spawned);
    }

    #[test]
    fn test_motorcycle_speed_floor() {
        let (mut state, table) = setup();
        let mut cfg = table.config(1).clone();
        cfg.motorcycle_prob = 1.0;
        cfg.overspeed_prob = 1.0;
        try_spawn(&mut state, &table, &cfg).unwrap();
        let v = &state.vehicles[0];
        assert_eq!(v.livery, Livery::Motorcycle);
        assert_eq!(v.behavior, Behavior::Swerve);
        assert!(v.speed >= cfg.max_speed + MOTORCYCLE_SPEED_MARGIN);
    }

    #[test]
    fn test_road_narrow_limits_spawn_lanes() {
        let (mut state, table) = setup();
        let cfg = table.config(14).clone(); // 5-lane phase
        state.effects.push(crate::sim::state::ActiveEffect {
            kind: crate::tuning::RewardKind::RoadNarrow,
            expires_at_ms: f64::MAX,
        });
        for _ in 0..100 {
            state.ensure_lane_slots(cfg.lanes);
            for y in state.lane_last_y.iter_mut() {
                *y = 100.0;
            }
            state.vehicles.clear();
            try_spawn(&mut state, &table, &cfg).unwrap();
            assert!(state.vehicles[0].lane < NARROW_LANE_CAP);
        }
    }
}
