// Zombie spawning, seek steering and throttled melee.

use super::collision::{clamp_to_arena, resolve_obstacles};
use super::lifecycle;
use crate::domain::events::SimEvent;
use crate::domain::state::{EntityId, PlayerId, SimulationState, Zombie};
use crate::domain::tuning::ZombieTuning;
use rand::Rng;
use tracing::debug;

pub fn hp_for_wave(t: &ZombieTuning, wave: u32) -> i32 {
    t.base_hp + t.hp_per_wave * wave.saturating_sub(1) as i32
}

pub fn speed_for_wave(t: &ZombieTuning, wave: u32) -> f32 {
    (t.base_speed + t.speed_per_wave * wave.saturating_sub(1) as f32).min(t.max_speed)
}

/// Melee damage after armor, never below 1.
pub fn melee_damage(t: &ZombieTuning, wave: u32, armor: f32) -> i32 {
    let raw = t.base_damage + t.damage_per_wave * wave.saturating_sub(1) as f32;
    let reduced = raw * (1.0 - armor.clamp(0.0, 1.0));
    (reduced.round() as i32).max(1)
}

/// Random point on the square ring just inside the arena wall.
pub fn ring_point(state: &mut SimulationState) -> (f32, f32) {
    let edge = (state.tuning.arena.half_size - state.tuning.arena.spawn_ring_inset).max(0.0);
    let along = state.rng.random_range(-edge..=edge);
    match state.rng.random_range(0..4) {
        0 => (along, -edge),
        1 => (edge, along),
        2 => (along, edge),
        _ => (-edge, along),
    }
}

/// Spawns a zombie scaled to the current wave.
pub fn spawn_zombie(state: &mut SimulationState, x: f32, z: f32, wave_member: bool) -> EntityId {
    let wave = state.round.wave;
    let hp = hp_for_wave(&state.tuning.zombie, wave);
    let speed = speed_for_wave(&state.tuning.zombie, wave);
    let id = state.next_id();
    let (mut x, mut z) = (x, z);
    clamp_to_arena(&mut x, &mut z, state.tuning.zombie.radius, state.tuning.arena.half_size);
    state.zombies.push(Zombie {
        id,
        x,
        z,
        hp,
        max_hp: hp,
        speed,
        wave_member,
    });
    debug!(zombie_id = id, wave, wave_member, "zombie spawned");
    id
}

pub fn spawn_on_ring(state: &mut SimulationState) -> EntityId {
    let (x, z) = ring_point(state);
    spawn_zombie(state, x, z, true)
}

/// Steers every zombie toward its nearest living player, then lands melee hits.
pub fn tick_zombies(state: &mut SimulationState, dt: f32) {
    let targets: Vec<(PlayerId, f32, f32)> = state.living_players().map(|p| (p.id, p.x, p.z)).collect();
    if targets.is_empty() {
        return;
    }
    let zr = state.tuning.zombie.radius;
    let contact = state.tuning.player.radius + zr;
    let reach = contact + state.tuning.zombie.melee_margin;
    let half = state.tuning.arena.half_size;

    let mut attacks = Vec::new();
    for zb in state.zombies.iter_mut() {
        let (zx, zz) = (zb.x, zb.z);
        let nearest = targets
            .iter()
            .map(|&(id, x, z)| (id, x, z, ((x - zx).powi(2) + (z - zz).powi(2)).sqrt()))
            .min_by(|a, b| a.3.total_cmp(&b.3));
        let Some((pid, tx, tz, dist)) = nearest else {
            continue;
        };

        if dist > f32::EPSILON {
            let step = (zb.speed * dt).min((dist - contact).max(0.0));
            zb.x += (tx - zb.x) / dist * step;
            zb.z += (tz - zb.z) / dist * step;
        }
        resolve_obstacles(&mut zb.x, &mut zb.z, zr, &state.obstacles);
        clamp_to_arena(&mut zb.x, &mut zb.z, zr, half);

        let now_dist = ((tx - zb.x).powi(2) + (tz - zb.z).powi(2)).sqrt();
        if now_dist <= reach {
            attacks.push(pid);
        }
    }

    for pid in attacks {
        melee(state, pid);
    }
}

fn melee(state: &mut SimulationState, player_id: PlayerId) {
    let now = state.now_ms;
    let t = state.tuning.zombie;
    let wave = state.round.wave;
    let Some(p) = state.players.get_mut(&player_id) else {
        return;
    };
    if !p.alive || now < p.next_hit_allowed_at {
        return;
    }

    if p.god_mode {
        p.next_hit_allowed_at = now + t.god_mode_cooldown_ms;
        let hp = p.hp;
        state.broadcast(SimEvent::PlayerHit { player_id, dmg: 0, hp });
        return;
    }

    let dmg = melee_damage(&t, wave, p.armor);
    p.hp = (p.hp - dmg).max(0);
    p.next_hit_allowed_at = now + t.attack_cooldown_ms;
    let hp = p.hp;
    state.broadcast(SimEvent::PlayerHit { player_id, dmg, hp });
    if hp == 0 {
        lifecycle::kill_player(state, player_id);
    }
}

pub fn nearest_zombie_to(state: &SimulationState, x: f32, z: f32) -> Option<EntityId> {
    state
        .zombies
        .iter()
        .min_by(|a, b| {
            let da = (a.x - x).powi(2) + (a.z - z).powi(2);
            let db = (b.x - x).powi(2) + (b.z - z).powi(2);
            da.total_cmp(&db)
        })
        .map(|zb| zb.id)
}

pub fn teleport_zombie(state: &mut SimulationState, zombie_id: EntityId, x: f32, z: f32) -> bool {
    let zr = state.tuning.zombie.radius;
    let half = state.tuning.arena.half_size;
    let Some(idx) = state.zombie_index(zombie_id) else {
        return false;
    };
    let zb = &mut state.zombies[idx];
    zb.x = x;
    zb.z = z;
    resolve_obstacles(&mut zb.x, &mut zb.z, zr, &state.obstacles);
    clamp_to_arena(&mut zb.x, &mut zb.z, zr, half);
    true
}

/// Drops the zombie nearest to a player right in front of them.
pub fn teleport_nearest_to_player(state: &mut SimulationState, player_id: PlayerId) -> bool {
    let Some((px, pz, yaw)) = state.players.get(&player_id).map(|p| (p.x, p.z, p.yaw)) else {
        return false;
    };
    let Some(zid) = nearest_zombie_to(state, px, pz) else {
        return false;
    };
    let gap = state.tuning.player.radius + state.tuning.zombie.radius + 1.5;
    let (fx, fz) = super::movement::forward(yaw);
    teleport_zombie(state, zid, px + fx * gap, pz + fz * gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::HookEvent;
    use crate::domain::state::{Player, RoundPhase};
    use crate::domain::tuning::Tuning;

    fn arena_with_player() -> SimulationState {
        let mut state = SimulationState::new(11, Tuning::default());
        let mut p = Player::new(1, "p".into(), &state.tuning);
        p.x = 0.0;
        p.z = 0.0;
        state.players.insert(1, p);
        state.round.phase = RoundPhase::Active;
        state
    }

    #[test]
    fn wave_scaling() {
        let t = ZombieTuning::default();
        assert_eq!(hp_for_wave(&t, 1), 90);
        assert_eq!(hp_for_wave(&t, 3), 120);
        assert!((speed_for_wave(&t, 1) - 2.4).abs() < 1e-6);
        assert_eq!(speed_for_wave(&t, 100), t.max_speed);
        assert_eq!(melee_damage(&t, 1, 0.0), 10);
        assert_eq!(melee_damage(&t, 1, 0.5), 5);
        assert_eq!(melee_damage(&t, 1, 1.0), 1);
    }

    #[test]
    fn ring_points_sit_inside_the_wall() {
        let mut state = SimulationState::new(5, Tuning::default());
        let edge = state.tuning.arena.half_size - state.tuning.arena.spawn_ring_inset;
        for _ in 0..100 {
            let (x, z) = ring_point(&mut state);
            assert!(x.abs() <= edge + 1e-4 && z.abs() <= edge + 1e-4);
            assert!((x.abs() - edge).abs() < 1e-4 || (z.abs() - edge).abs() < 1e-4);
        }
    }

    #[test]
    fn zombie_walks_toward_player() {
        let mut state = arena_with_player();
        let zid = spawn_zombie(&mut state, 10.0, 0.0, true);
        tick_zombies(&mut state, 0.5);
        let zb = &state.zombies[state.zombie_index(zid).expect("alive")];
        assert!((zb.x - (10.0 - zb.speed * 0.5)).abs() < 1e-4);
        assert_eq!(zb.z, 0.0);
    }

    #[test]
    fn melee_is_throttled_per_player() {
        let mut state = arena_with_player();
        spawn_zombie(&mut state, 1.0, 0.0, true);
        spawn_zombie(&mut state, -1.0, 0.0, true);

        state.now_ms = 1000;
        tick_zombies(&mut state, 0.05);
        assert_eq!(state.players[&1].hp, 90);

        state.now_ms = 1100;
        tick_zombies(&mut state, 0.05);
        assert_eq!(state.players[&1].hp, 90);

        state.now_ms = 1000 + state.tuning.zombie.attack_cooldown_ms;
        tick_zombies(&mut state, 0.05);
        assert_eq!(state.players[&1].hp, 80);
    }

    #[test]
    fn god_mode_takes_no_damage() {
        let mut state = arena_with_player();
        state.players.get_mut(&1).expect("player").god_mode = true;
        spawn_zombie(&mut state, 1.0, 0.0, true);
        for step in 0..20 {
            state.now_ms = step * 100;
            tick_zombies(&mut state, 0.05);
        }
        assert_eq!(state.players[&1].hp, 100);
        let pings = state
            .outbox
            .iter()
            .filter(|o| matches!(o.event, SimEvent::PlayerHit { dmg: 0, .. }))
            .count();
        assert!(pings >= 2);
    }

    #[test]
    fn lethal_hit_hands_off_to_lifecycle() {
        let mut state = arena_with_player();
        state.players.get_mut(&1).expect("player").hp = 5;
        spawn_zombie(&mut state, 1.0, 0.0, true);
        tick_zombies(&mut state, 0.05);

        assert!(!state.players[&1].alive);
        assert!(state.round.is_active());
        assert!(state.hooks.iter().any(|h| matches!(h, HookEvent::PlayerDeath { player_id: 1 })));

        // No target left: zombies idle.
        let before: Vec<_> = state.zombies.iter().map(|z| (z.x, z.z)).collect();
        tick_zombies(&mut state, 0.5);
        let after: Vec<_> = state.zombies.iter().map(|z| (z.x, z.z)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn teleport_nearest_lands_in_front() {
        let mut state = arena_with_player();
        let near = spawn_zombie(&mut state, 20.0, 0.0, true);
        spawn_zombie(&mut state, 40.0, 0.0, true);
        assert!(teleport_nearest_to_player(&mut state, 1));
        let zb = &state.zombies[state.zombie_index(near).expect("alive")];
        assert!(zb.z < 0.0);
        assert!(zb.x.abs() < 1e-4);
    }
}
