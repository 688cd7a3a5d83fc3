// Wave state machine: BetweenRounds <-> Active.

use super::{lifecycle, snapshot, zombies};
use crate::domain::events::{HookEvent, SimEvent};
use crate::domain::state::{RoundPhase, RoundState, SimulationState};
use crate::domain::tuning::ZombieTuning;
use tracing::info;

pub fn target_for_wave(t: &ZombieTuning, wave: u32) -> u32 {
    t.target_base + t.target_per_wave * wave
}

/// Spawn cadence for a wave, tightening by a fixed step down to the floor.
pub fn spawn_interval_ms(t: &ZombieTuning, wave: u32) -> u64 {
    t.spawn_every_ms
        .saturating_sub(t.spawn_step_ms * u64::from(wave.saturating_sub(1)))
        .max(t.spawn_floor_ms)
}

/// True once the quota is spawned, all of it killed, and nothing is left standing.
pub fn is_complete(round: &RoundState, alive: usize) -> bool {
    round.is_active() && round.spawned >= round.target && round.killed >= round.target && alive == 0
}

fn broadcast_round(state: &mut SimulationState) {
    let round = snapshot::round_snapshot(state);
    state.broadcast(SimEvent::Round(round));
}

/// Starts the current wave. Returns false if one is already running.
pub fn start_wave(state: &mut SimulationState) -> bool {
    if state.round.is_active() {
        return false;
    }
    let t = state.tuning.zombie;
    let wave = state.round.wave;
    state.round = RoundState {
        wave,
        phase: RoundPhase::Active,
        target: target_for_wave(&t, wave),
        spawned: 0,
        killed: 0,
        spawn_every_ms: spawn_interval_ms(&t, wave),
        next_spawn_at: state.now_ms,
        intermission_until: None,
    };
    for p in state.players.values_mut() {
        p.respawn_at = None;
    }

    info!(wave, target = state.round.target, "wave started");
    if !state.match_started {
        state.match_started = true;
        state.hook(HookEvent::GameStart);
    }
    state.hook(HookEvent::WaveStart { wave });
    broadcast_round(state);
    true
}

/// Auto-starts the next wave once a configured intermission has elapsed.
pub fn tick_intermission(state: &mut SimulationState) {
    if state.round.is_active() {
        return;
    }
    if state.round.intermission_until.is_some_and(|t| t <= state.now_ms) {
        start_wave(state);
    }
}

/// Spawns at most one wave zombie per tick on the wave's cadence.
pub fn tick_spawns(state: &mut SimulationState) {
    let round = &state.round;
    if !round.is_active() || round.spawned >= round.target || state.now_ms < round.next_spawn_at {
        return;
    }
    zombies::spawn_on_ring(state);
    state.round.spawned += 1;
    state.round.next_spawn_at = state.now_ms + state.round.spawn_every_ms;
}

/// Closes the wave if it is complete: advance the wave number, return to
/// BetweenRounds and revive anyone who went down.
pub fn check_completion(state: &mut SimulationState) -> bool {
    if !is_complete(&state.round, state.zombies.len()) {
        return false;
    }
    let finished = state.round.wave;
    let intermission = state.tuning.arena.intermission_ms;
    state.round = RoundState {
        wave: finished + 1,
        intermission_until: (intermission > 0).then_some(state.now_ms + intermission),
        ..RoundState::first()
    };

    info!(wave = finished, "wave cleared");
    state.hook(HookEvent::WaveEnd { wave: finished });
    lifecycle::revive_all_dead(state);
    broadcast_round(state);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Player;
    use crate::domain::tuning::Tuning;

    fn fresh() -> SimulationState {
        let mut state = SimulationState::new(21, Tuning::default());
        state.players.insert(1, Player::new(1, "p".into(), &state.tuning));
        state
    }

    fn kill_all(state: &mut SimulationState) {
        let members = state.zombies.iter().filter(|z| z.wave_member).count() as u32;
        state.zombies.clear();
        state.round.killed = (state.round.killed + members).min(state.round.target);
    }

    #[test]
    fn quota_and_cadence_scale() {
        let t = ZombieTuning::default();
        assert_eq!(target_for_wave(&t, 1), 8);
        assert_eq!(target_for_wave(&t, 2), 10);
        assert_eq!(spawn_interval_ms(&t, 1), 1400);
        assert_eq!(spawn_interval_ms(&t, 2), 1310);
        assert_eq!(spawn_interval_ms(&t, 50), 350);
    }

    #[test]
    fn start_is_idempotent_while_active() {
        let mut state = fresh();
        assert!(start_wave(&mut state));
        assert!(!start_wave(&mut state));
        assert_eq!(state.round.target, 8);
        assert!(state.hooks.iter().any(|h| matches!(h, HookEvent::WaveStart { wave: 1 })));
    }

    #[test]
    fn first_wave_of_a_match_queues_game_start_once() {
        let mut state = fresh();
        start_wave(&mut state);
        assert!(matches!(state.hooks.front(), Some(HookEvent::GameStart)));

        state.hooks.clear();
        state.round = RoundState { wave: 2, ..RoundState::first() };
        start_wave(&mut state);
        assert!(!state.hooks.iter().any(|h| matches!(h, HookEvent::GameStart)));
    }

    #[test]
    fn spawns_one_per_cadence() {
        let mut state = fresh();
        start_wave(&mut state);
        tick_spawns(&mut state);
        tick_spawns(&mut state);
        assert_eq!(state.round.spawned, 1);

        state.now_ms = state.round.spawn_every_ms;
        tick_spawns(&mut state);
        assert_eq!(state.round.spawned, 2);
        assert_eq!(state.zombies.len(), 2);
    }

    #[test]
    fn wave_of_eight_waits_for_the_full_quota() {
        let mut state = fresh();
        start_wave(&mut state);
        assert_eq!(state.round.target, 8);

        for i in 0..7u64 {
            state.now_ms = i * state.round.spawn_every_ms;
            tick_spawns(&mut state);
            kill_all(&mut state);
            assert!(!check_completion(&mut state), "ended after {} spawns", state.round.spawned);
            assert!(state.round.is_active());
        }
        assert_eq!(state.round.spawned, 7);
        assert_eq!(state.round.killed, 7);

        state.now_ms = 7 * state.round.spawn_every_ms;
        tick_spawns(&mut state);
        assert!(!check_completion(&mut state), "eighth zombie still alive");
        kill_all(&mut state);
        assert!(check_completion(&mut state));

        assert_eq!(state.round.wave, 2);
        assert_eq!(state.round.phase, RoundPhase::BetweenRounds);
        assert!(state.hooks.iter().any(|h| matches!(h, HookEvent::WaveEnd { wave: 1 })));
    }

    #[test]
    fn leftover_extras_hold_the_wave_open() {
        let mut state = fresh();
        start_wave(&mut state);
        state.round.spawned = state.round.target;
        state.round.killed = state.round.target;
        zombies::spawn_zombie(&mut state, 5.0, 5.0, false);
        assert!(!check_completion(&mut state));
        state.zombies.clear();
        assert!(check_completion(&mut state));
    }

    #[test]
    fn completion_revives_the_fallen() {
        let mut state = fresh();
        start_wave(&mut state);
        lifecycle::kill_player(&mut state, 1);
        state.round.spawned = state.round.target;
        state.round.killed = state.round.target;
        assert!(check_completion(&mut state));
        assert!(state.players[&1].alive);
    }

    #[test]
    fn intermission_auto_starts_next_wave() {
        let mut state = fresh();
        state.tuning.arena.intermission_ms = 5000;
        start_wave(&mut state);
        state.round.spawned = state.round.target;
        state.round.killed = state.round.target;
        state.now_ms = 1000;
        assert!(check_completion(&mut state));
        assert_eq!(state.round.intermission_until, Some(6000));

        state.now_ms = 5999;
        tick_intermission(&mut state);
        assert!(!state.round.is_active());
        state.now_ms = 6000;
        tick_intermission(&mut state);
        assert!(state.round.is_active());
        assert_eq!(state.round.wave, 2);
        assert_eq!(state.round.target, 10);
    }
}
