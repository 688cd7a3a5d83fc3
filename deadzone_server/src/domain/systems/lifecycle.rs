// Player lifecycle: safe spawn placement, join/leave, death, revival and full match restart.

use super::collision::{clamp_to_arena, resolve_obstacles};
use super::combat::loadout_event;
use super::snapshot::round_snapshot;
use crate::domain::events::{HookEvent, Recipient, SimEvent};
use crate::domain::state::{Obstacle, Player, PlayerId, RoundState, SimulationState};
use rand::Rng;
use std::f32::consts::TAU;
use tracing::{debug, info, warn};

const ANCHOR_RADII: [f32; 4] = [6.0, 4.0, 2.5, 1.0];
const TRIES_PER_RADIUS: usize = 12;
const RING_COUNT: u32 = 8;
const RING_STEP: f32 = 3.0;
const POINTS_PER_RING: u32 = 16;
const GRID_STEP: f32 = 2.0;
const FALLBACK_POINTS: [(f32, f32); 5] = [(0.0, 0.0), (10.0, 10.0), (-10.0, 10.0), (10.0, -10.0), (-10.0, -10.0)];

pub const DEAD_PROMPT: &str = "You died. Press R to restart the match.";

fn is_clear(obstacles: &[Obstacle], x: f32, z: f32, pad: f32) -> bool {
    !obstacles.iter().any(|o| o.contains_expanded(x, z, pad))
}

fn in_arena(x: f32, z: f32, radius: f32, half: f32) -> bool {
    let limit = half - radius;
    x.abs() <= limit && z.abs() <= limit
}

/// Picks a spawn point clear of every obstacle.
///
/// Search order: random points in shrinking discs around the anchor, square rings
/// around the anchor, fixed fallback points, a coarse grid scan. Whatever comes out
/// is nudged out of any residual overlap before it is returned.
pub fn find_safe_spawn(state: &mut SimulationState) -> (f32, f32) {
    let (ax, az) = (state.tuning.arena.spawn_anchor_x, state.tuning.arena.spawn_anchor_z);
    let radius = state.tuning.player.radius;
    let pad = radius + state.tuning.player.spawn_padding;
    let half = state.tuning.arena.half_size;
    let ok = |obstacles: &[Obstacle], x: f32, z: f32| in_arena(x, z, radius, half) && is_clear(obstacles, x, z, pad);

    for r in ANCHOR_RADII {
        for _ in 0..TRIES_PER_RADIUS {
            let angle = state.rng.random_range(0.0..TAU);
            let dist = r * state.rng.random::<f32>().sqrt();
            let (x, z) = (ax + angle.cos() * dist, az + angle.sin() * dist);
            if ok(&state.obstacles, x, z) {
                return (x, z);
            }
        }
    }

    for k in 1..=RING_COUNT {
        let side = k as f32 * RING_STEP;
        for i in 0..POINTS_PER_RING {
            // Walk the square perimeter; each side gets a quarter of the points.
            let t = i as f32 / POINTS_PER_RING as f32 * 4.0;
            let along = (t.fract() * 2.0 - 1.0) * side;
            let (x, z) = match t as u32 {
                0 => (ax + along, az - side),
                1 => (ax + side, az + along),
                2 => (ax - along, az + side),
                _ => (ax - side, az - along),
            };
            if ok(&state.obstacles, x, z) {
                return (x, z);
            }
        }
    }

    if let Some(&(x, z)) = FALLBACK_POINTS
        .iter()
        .find(|(x, z)| ok(&state.obstacles, *x, *z))
    {
        return (x, z);
    }

    let limit = half - radius;
    let mut x = -limit;
    while x <= limit {
        let mut z = -limit;
        while z <= limit {
            if ok(&state.obstacles, x, z) {
                return (x, z);
            }
            z += GRID_STEP;
        }
        x += GRID_STEP;
    }

    warn!("no clear spawn point found; nudging anchor");
    let (mut x, mut z) = (ax, az);
    resolve_obstacles(&mut x, &mut z, pad, &state.obstacles);
    clamp_to_arena(&mut x, &mut z, radius, half);
    (x, z)
}

/// Adds a connected player at a safe spawn point.
pub fn add_player(state: &mut SimulationState, player_id: PlayerId, name: String) {
    let mut p = Player::new(player_id, name.clone(), &state.tuning);
    let (x, z) = find_safe_spawn(state);
    p.x = x;
    p.z = z;
    state.players.insert(player_id, p);

    info!(player_id, %name, x, z, "player joined");
    state.emit(Recipient::AllExcept(player_id), SimEvent::Join { player_id, name });
    state.hook(HookEvent::PlayerSpawn { player_id });
}

pub fn remove_player(state: &mut SimulationState, player_id: PlayerId) -> bool {
    if state.players.remove(&player_id).is_none() {
        return false;
    }
    info!(player_id, "player left");
    state.broadcast(SimEvent::Leave { player_id });
    true
}

/// Marks a player down. Mid-wave there is no automatic respawn; between rounds a
/// respawn is scheduled.
pub fn kill_player(state: &mut SimulationState, player_id: PlayerId) {
    let now = state.now_ms;
    let between_rounds = !state.round.is_active();
    let respawn_ms = state.tuning.player.respawn_ms;
    let wave = state.round.wave;
    let Some(p) = state.players.get_mut(&player_id) else {
        return;
    };
    if !p.alive {
        return;
    }
    p.hp = 0;
    p.alive = false;
    p.keys = Default::default();
    for ws in [p.pistol.as_mut(), p.primary.as_mut()].into_iter().flatten() {
        ws.burst_remaining = 0;
    }
    p.respawn_at = between_rounds.then_some(now + respawn_ms);

    info!(player_id, wave, "player down");
    state.broadcast(SimEvent::PlayerDown { player_id });
    state.send_to(
        player_id,
        SimEvent::PlayerDead {
            wave,
            prompt: DEAD_PROMPT.to_string(),
        },
    );
    state.hook(HookEvent::PlayerDeath { player_id });
}

/// Brings a downed player back at full health at a safe spawn point.
pub fn revive_player(state: &mut SimulationState, player_id: PlayerId) -> bool {
    if !state.players.get(&player_id).is_some_and(|p| !p.alive) {
        return false;
    }
    let (x, z) = find_safe_spawn(state);
    let max_hp = state.tuning.player.max_hp;
    let Some(p) = state.players.get_mut(&player_id) else {
        return false;
    };
    p.x = x;
    p.z = z;
    p.hp = max_hp;
    p.alive = true;
    p.respawn_at = None;
    p.next_hit_allowed_at = 0;

    debug!(player_id, x, z, "player revived");
    state.hook(HookEvent::PlayerSpawn { player_id });
    true
}

pub fn revive_all_dead(state: &mut SimulationState) -> usize {
    let dead: Vec<PlayerId> = state
        .players
        .values()
        .filter(|p| !p.alive)
        .map(|p| p.id)
        .collect();
    dead.into_iter()
        .filter(|id| revive_player(state, *id))
        .count()
}

/// Revives players whose between-rounds respawn timer has elapsed.
pub fn tick_respawns(state: &mut SimulationState) {
    if state.round.is_active() {
        return;
    }
    let now = state.now_ms;
    let due: Vec<PlayerId> = state
        .players
        .values()
        .filter(|p| !p.alive && p.respawn_at.is_some_and(|t| t <= now))
        .map(|p| p.id)
        .collect();
    for id in due {
        revive_player(state, id);
    }
}

/// Resets the whole match: wave 1 between rounds, every player back to a fresh loadout.
pub fn restart_match(state: &mut SimulationState) {
    state.zombies.clear();
    state.pickups.clear();
    state.round = RoundState::first();
    let intermission = state.tuning.arena.intermission_ms;
    if intermission > 0 {
        state.round.intermission_until = Some(state.now_ms + intermission);
    }

    let ids: Vec<PlayerId> = state.players.keys().copied().collect();
    for id in &ids {
        let (x, z) = find_safe_spawn(state);
        let Some(old) = state.players.get(id) else {
            continue;
        };
        let mut fresh = Player::new(*id, old.name.clone(), &state.tuning);
        fresh.x = x;
        fresh.z = z;
        state.players.insert(*id, fresh);
    }

    info!(players = ids.len(), "match restarted");
    state.broadcast(SimEvent::RestartAck);
    let round = round_snapshot(state);
    state.broadcast(SimEvent::Round(round));
    for id in &ids {
        if let Some(p) = state.players.get(id) {
            let loadout = loadout_event(p);
            state.broadcast(loadout);
        }
    }
    for id in &ids {
        state.send_to(*id, SimEvent::Hud { items: Vec::new() });
    }

    state.match_started = true;
    state.hook(HookEvent::GameStart);
    for id in ids {
        state.hook(HookEvent::PlayerSpawn { player_id: id });
    }
}

/// Moves a player, then pushes them clear of obstacles and inside the arena.
pub fn teleport_player(state: &mut SimulationState, player_id: PlayerId, x: f32, z: f32) -> bool {
    let radius = state.tuning.player.radius;
    let half = state.tuning.arena.half_size;
    let Some(p) = state.players.get_mut(&player_id) else {
        return false;
    };
    p.x = x;
    p.z = z;
    clamp_to_arena(&mut p.x, &mut p.z, radius, half);
    resolve_obstacles(&mut p.x, &mut p.z, radius, &state.obstacles);
    clamp_to_arena(&mut p.x, &mut p.z, radius, half);
    true
}

pub fn set_god_mode(state: &mut SimulationState, player_id: PlayerId, on: bool) -> bool {
    let Some(p) = state.players.get_mut(&player_id) else {
        return false;
    };
    p.god_mode = on;
    info!(player_id, on, "god mode toggled");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{ObstacleKind, RoundPhase};
    use crate::domain::systems::obstacles;
    use crate::domain::tuning::Tuning;

    fn state_with_field(seed: u64) -> SimulationState {
        let mut state = SimulationState::new(seed, Tuning::default());
        state.obstacles = obstacles::generate(seed, &state.tuning.arena);
        state
    }

    #[test]
    fn spawns_clear_of_generated_obstacles() {
        for seed in 0..10 {
            let mut state = state_with_field(seed);
            let pad = state.tuning.player.radius + state.tuning.player.spawn_padding;
            for _ in 0..20 {
                let (x, z) = find_safe_spawn(&mut state);
                assert!(is_clear(&state.obstacles, x, z, pad), "seed {seed} at ({x}, {z})");
            }
        }
    }

    #[test]
    fn blocked_anchor_falls_through_to_rings() {
        let mut state = SimulationState::new(1, Tuning::default());
        state.obstacles.push(Obstacle {
            x: 0.0,
            z: 0.0,
            hx: 7.0,
            hz: 7.0,
            h: 2.0,
            kind: ObstacleKind::Box,
        });
        let (x, z) = find_safe_spawn(&mut state);
        assert!(x.abs() >= 7.0 || z.abs() >= 7.0);
        let pad = state.tuning.player.radius + state.tuning.player.spawn_padding;
        assert!(is_clear(&state.obstacles, x, z, pad));
    }

    #[test]
    fn death_mid_wave_has_no_respawn_timer() {
        let mut state = state_with_field(3);
        add_player(&mut state, 1, "a".into());
        state.round.phase = RoundPhase::Active;
        kill_player(&mut state, 1);

        let p = &state.players[&1];
        assert!(!p.alive);
        assert_eq!(p.hp, 0);
        assert!(p.respawn_at.is_none());
        assert!(state
            .outbox
            .iter()
            .any(|o| o.to == Recipient::Player(1) && matches!(o.event, SimEvent::PlayerDead { .. })));
        assert!(matches!(state.hooks.back(), Some(HookEvent::PlayerDeath { player_id: 1 })));

        state.now_ms = 1_000_000;
        tick_respawns(&mut state);
        assert!(!state.players[&1].alive);
    }

    #[test]
    fn death_between_rounds_respawns_after_delay() {
        let mut state = state_with_field(3);
        add_player(&mut state, 1, "a".into());
        state.now_ms = 500;
        kill_player(&mut state, 1);

        state.now_ms = 500 + state.tuning.player.respawn_ms - 1;
        tick_respawns(&mut state);
        assert!(!state.players[&1].alive);

        state.now_ms += 1;
        tick_respawns(&mut state);
        let p = &state.players[&1];
        assert!(p.alive);
        assert_eq!(p.hp, state.tuning.player.max_hp);
    }

    #[test]
    fn restart_resets_everything() {
        let mut state = state_with_field(9);
        add_player(&mut state, 1, "a".into());
        add_player(&mut state, 2, "b".into());
        state.round.wave = 5;
        state.round.phase = RoundPhase::Active;
        {
            let p = state.players.get_mut(&1).expect("player 1");
            p.cash = 999;
            p.armor = 0.5;
            p.inventory.medkits = 2;
        }
        kill_player(&mut state, 2);
        state.hooks.clear();
        state.outbox.clear();

        restart_match(&mut state);

        assert_eq!(state.round.wave, 1);
        assert_eq!(state.round.phase, RoundPhase::BetweenRounds);
        assert!(state.zombies.is_empty());
        for p in state.players.values() {
            assert!(p.alive);
            assert_eq!(p.cash, 0);
            assert_eq!(p.armor, 0.0);
            assert_eq!(p.inventory.medkits, 0);
            assert!(p.primary.is_none());
        }
        assert!(matches!(state.outbox.first().map(|o| &o.event), Some(SimEvent::RestartAck)));
        assert!(matches!(state.hooks.front(), Some(HookEvent::GameStart)));
        assert_eq!(state.hooks.len(), 3);
    }

    #[test]
    fn teleport_lands_outside_obstacles() {
        let mut state = SimulationState::new(1, Tuning::default());
        state.obstacles.push(Obstacle {
            x: 5.0,
            z: 5.0,
            hx: 1.0,
            hz: 1.0,
            h: 1.0,
            kind: ObstacleKind::Car,
        });
        add_player(&mut state, 1, "a".into());
        assert!(teleport_player(&mut state, 1, 5.2, 5.0));
        let p = &state.players[&1];
        assert!(!state.obstacles[0].contains_expanded(p.x, p.z, state.tuning.player.radius));
        assert!(!teleport_player(&mut state, 42, 0.0, 0.0));
    }
}
