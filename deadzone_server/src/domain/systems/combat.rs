// Hitscan weapon resolution: ray-sphere hitboxes, pellet fan-out, damage falloff,
// ammo/reload state and burst continuation.

use crate::domain::events::{HitPart, HitReport, HookEvent, SimEvent, WeaponAmmo};
use crate::domain::state::{Aim, EntityId, Perk, Player, PlayerId, SimulationState, WeaponState, Zombie};
use crate::domain::weapons::{self, SlotKind, WeaponDef};
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info};

pub const BODY_RADIUS: f32 = 0.70;
pub const BODY_HEIGHT: f32 = 1.0;
pub const HEAD_RADIUS: f32 = 0.28;
pub const HEAD_HEIGHT: f32 = 1.55;
pub const HEAD_MULTIPLIER: i32 = 2;
/// Pellet hits a single zombie can absorb from one trigger pull.
pub const MAX_HITS_PER_ZOMBIE: u32 = 2;
const FAST_RELOAD_FACTOR: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error("unknown player")]
    UnknownPlayer,
    #[error("player is down")]
    PlayerDown,
    #[error("unknown weapon `{0}`")]
    UnknownWeapon(String),
    #[error("weapon `{0}` is not equipped")]
    NotEquipped(String),
    #[error("reload in progress")]
    Reloading,
    #[error("fire cooldown pending")]
    Cooldown,
    #[error("burst in progress")]
    BurstInProgress,
    #[error("out of ammo")]
    OutOfAmmo,
    #[error("clip already full")]
    ClipFull,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    Fired { hits: usize, kills: usize },
    ReloadStarted,
}

/// Body damage at `dist`: linear between close and far over the drop-off window,
/// rounded and floored at 1. Head hits double the body value.
pub fn damage_at(def: &WeaponDef, dist: f32, part: HitPart) -> i32 {
    let d = &def.range_drop_off;
    let raw = if dist <= d.start {
        d.close_damage
    } else if dist >= d.end {
        d.far_damage
    } else {
        let t = (dist - d.start) / (d.end - d.start);
        d.close_damage + (d.far_damage - d.close_damage) * t
    };
    let body = (raw.round() as i32).max(1);
    match part {
        HitPart::Body => body,
        HitPart::Head => body * HEAD_MULTIPLIER,
    }
}

/// Unit view vector for yaw/pitch (yaw 0 faces -Z, positive pitch looks up).
pub fn aim_direction(yaw: f32, pitch: f32) -> [f32; 3] {
    let cp = pitch.cos();
    [-yaw.sin() * cp, pitch.sin(), -yaw.cos() * cp]
}

/// Distance along a unit ray to the first intersection with a sphere.
pub fn ray_sphere(origin: [f32; 3], dir: [f32; 3], center: [f32; 3], radius: f32) -> Option<f32> {
    let oc = [
        origin[0] - center[0],
        origin[1] - center[1],
        origin[2] - center[2],
    ];
    let b = oc[0] * dir[0] + oc[1] * dir[1] + oc[2] * dir[2];
    let c = oc[0] * oc[0] + oc[1] * oc[1] + oc[2] * oc[2] - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let near = -b - sq;
    if near >= 0.0 {
        return Some(near);
    }
    // Origin inside the sphere.
    let far = -b + sq;
    (far >= 0.0).then_some(far)
}

/// Nearest of the two hitbox spheres for one zombie.
pub fn trace_zombie(origin: [f32; 3], dir: [f32; 3], z: &Zombie) -> Option<(f32, HitPart)> {
    let body = ray_sphere(origin, dir, [z.x, BODY_HEIGHT, z.z], BODY_RADIUS);
    let head = ray_sphere(origin, dir, [z.x, HEAD_HEIGHT, z.z], HEAD_RADIUS);
    match (body, head) {
        (Some(b), Some(h)) if h <= b => Some((h, HitPart::Head)),
        (Some(b), _) => Some((b, HitPart::Body)),
        (None, Some(h)) => Some((h, HitPart::Head)),
        (None, None) => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct PelletHit {
    zombie_id: EntityId,
    dist: f32,
    part: HitPart,
}

fn trace_pellet(origin: [f32; 3], dir: [f32; 3], range: f32, zombies: &[Zombie]) -> Option<PelletHit> {
    zombies
        .iter()
        .filter(|z| z.hp > 0)
        .filter_map(|z| {
            trace_zombie(origin, dir, z).map(|(dist, part)| PelletHit {
                zombie_id: z.id,
                dist,
                part,
            })
        })
        .filter(|h| h.dist <= range)
        .min_by(|a, b| a.dist.total_cmp(&b.dist))
}

pub fn ammo_of(ws: &WeaponState) -> WeaponAmmo {
    WeaponAmmo {
        weapon: ws.id(),
        clip: ws.clip,
        reserve: ws.reserve,
    }
}

pub fn loadout_event(p: &Player) -> SimEvent {
    SimEvent::Loadout {
        player_id: p.id,
        pistol: p.pistol.as_ref().map(ammo_of),
        primary: p.primary.as_ref().map(ammo_of),
        active: p.active_weapon().map(|w| w.id()),
    }
}

fn reload_duration(def: &WeaponDef, p: &Player) -> u64 {
    if p.inventory.perks.contains(&Perk::FastReload) {
        (def.reload_ms as f64 * FAST_RELOAD_FACTOR).round() as u64
    } else {
        def.reload_ms
    }
}

/// Moves ammo from reserve into the clip, never past capacity.
fn complete_reload(ws: &mut WeaponState) {
    let need = ws.def.clip_max_ammo.saturating_sub(ws.clip);
    let take = need.min(ws.reserve);
    ws.clip += take;
    ws.reserve -= take;
    ws.reload_until = None;
}

fn begin_reload(ws: &mut WeaponState, now: u64, duration: u64) -> Result<u64, CombatError> {
    if ws.reload_until.is_some() {
        return Err(CombatError::Reloading);
    }
    if ws.clip >= ws.def.clip_max_ammo {
        return Err(CombatError::ClipFull);
    }
    if ws.reserve == 0 {
        return Err(CombatError::OutOfAmmo);
    }
    ws.burst_remaining = 0;
    ws.reload_until = Some(now + duration);
    Ok(duration)
}

fn settle_reload(state: &mut SimulationState, player_id: PlayerId, weapon_id: &str) {
    let now = state.now_ms;
    let Some(ws) = state
        .players
        .get_mut(&player_id)
        .and_then(|p| p.weapon_mut(weapon_id))
    else {
        return;
    };
    if ws.reload_until.is_some_and(|until| until <= now) {
        complete_reload(ws);
        let ammo = ammo_of(ws);
        state.send_to(player_id, SimEvent::Ammo(ammo));
    }
}

/// Starts a manual reload for an equipped weapon.
pub fn reload(state: &mut SimulationState, player_id: PlayerId, weapon_id: &str) -> Result<u64, CombatError> {
    let def = weapons::get(weapon_id).ok_or_else(|| CombatError::UnknownWeapon(weapon_id.to_string()))?;
    settle_reload(state, player_id, weapon_id);

    let now = state.now_ms;
    let p = state
        .players
        .get_mut(&player_id)
        .ok_or(CombatError::UnknownPlayer)?;
    if !p.alive {
        return Err(CombatError::PlayerDown);
    }
    let duration = reload_duration(def, p);
    let ws = p
        .weapon_mut(weapon_id)
        .ok_or_else(|| CombatError::NotEquipped(weapon_id.to_string()))?;
    let duration = begin_reload(ws, now, duration)?;
    state.broadcast(SimEvent::Reload {
        player_id,
        weapon: def.id,
        duration_ms: duration,
    });
    Ok(duration)
}

/// Attempts one trigger pull.
pub fn fire(
    state: &mut SimulationState,
    player_id: PlayerId,
    weapon_id: &str,
    aim: Option<Aim>,
) -> Result<FireOutcome, CombatError> {
    let def = weapons::get(weapon_id).ok_or_else(|| CombatError::UnknownWeapon(weapon_id.to_string()))?;
    settle_reload(state, player_id, weapon_id);

    let now = state.now_ms;
    let p = state
        .players
        .get_mut(&player_id)
        .ok_or(CombatError::UnknownPlayer)?;
    if !p.alive {
        return Err(CombatError::PlayerDown);
    }
    let slot = p
        .slot_of(weapon_id)
        .ok_or_else(|| CombatError::NotEquipped(weapon_id.to_string()))?;
    let reload_ms = reload_duration(def, p);
    let aim = aim.unwrap_or(Aim {
        yaw: p.yaw,
        pitch: p.pitch,
    });
    let ws = p
        .slot_mut(slot)
        .as_mut()
        .ok_or_else(|| CombatError::NotEquipped(weapon_id.to_string()))?;

    if ws.reload_until.is_some() {
        return Err(CombatError::Reloading);
    }
    if ws.burst_remaining > 0 {
        return Err(CombatError::BurstInProgress);
    }
    if now < ws.next_fire_at {
        return Err(CombatError::Cooldown);
    }
    if ws.clip == 0 {
        if ws.reserve == 0 {
            return Err(CombatError::OutOfAmmo);
        }
        let duration = begin_reload(ws, now, reload_ms)?;
        state.broadcast(SimEvent::Reload {
            player_id,
            weapon: def.id,
            duration_ms: duration,
        });
        return Ok(FireOutcome::ReloadStarted);
    }

    ws.clip -= 1;
    ws.next_fire_at = now + def.fire_interval_ms;
    if let Some(burst) = def.burst {
        ws.burst_remaining = burst.count - 1;
        ws.next_burst_at = now + burst.gap_ms;
    }
    let ammo = ammo_of(ws);
    p.last_aim = aim;
    p.active_slot = slot;

    let (hits, kills) = resolve_shot(state, player_id, def, aim);
    state.send_to(player_id, SimEvent::Ammo(ammo));
    Ok(FireOutcome::Fired { hits, kills })
}

/// Fires scheduled burst rounds whose gap has elapsed, using the stored aim.
pub fn continue_bursts(state: &mut SimulationState) {
    let now = state.now_ms;
    let mut due = Vec::new();
    for p in state.players.values().filter(|p| p.alive) {
        for ws in [p.pistol.as_ref(), p.primary.as_ref()].into_iter().flatten() {
            if ws.burst_remaining > 0 && ws.next_burst_at <= now {
                due.push((p.id, ws.def, p.last_aim));
            }
        }
    }

    for (player_id, def, aim) in due {
        let Some(ws) = state
            .players
            .get_mut(&player_id)
            .and_then(|p| p.weapon_mut(def.id))
        else {
            continue;
        };
        if ws.clip == 0 {
            ws.burst_remaining = 0;
            ws.next_fire_at = now + def.fire_interval_ms;
            continue;
        }
        ws.clip -= 1;
        ws.burst_remaining -= 1;
        if ws.burst_remaining == 0 {
            // Regular cooldown starts once the burst is spent.
            ws.next_fire_at = now + def.fire_interval_ms;
        } else {
            let gap = def.burst.map(|b| b.gap_ms).unwrap_or_default();
            ws.next_burst_at = now + gap;
        }
        let ammo = ammo_of(ws);
        resolve_shot(state, player_id, def, aim);
        state.send_to(player_id, SimEvent::Ammo(ammo));
    }
}

/// Completes reloads whose deadline has passed.
pub fn finish_reloads(state: &mut SimulationState) {
    let now = state.now_ms;
    let mut done = Vec::new();
    for p in state.players.values_mut() {
        for ws in [p.pistol.as_mut(), p.primary.as_mut()].into_iter().flatten() {
            if ws.reload_until.is_some_and(|until| until <= now) {
                complete_reload(ws);
                done.push((p.id, ammo_of(ws)));
            }
        }
    }
    for (player_id, ammo) in done {
        state.send_to(player_id, SimEvent::Ammo(ammo));
    }
}

/// Traces every pellet, applies capped damage nearest-first and pays out cash.
///
/// Returns `(hits, kills)`.
fn resolve_shot(state: &mut SimulationState, player_id: PlayerId, def: &'static WeaponDef, aim: Aim) -> (usize, usize) {
    let Some((px, pz)) = state.players.get(&player_id).map(|p| (p.x, p.z)) else {
        return (0, 0);
    };
    let origin = [px, state.tuning.player.eye_height, pz];

    let mut pellet_hits = Vec::with_capacity(def.pellets as usize);
    for _ in 0..def.pellets {
        let (mut yaw, mut pitch) = (aim.yaw, aim.pitch);
        if def.spread > 0.0 {
            yaw += state.rng.random_range(-def.spread..=def.spread);
            pitch += state.rng.random_range(-def.spread..=def.spread);
        }
        let dir = aim_direction(yaw, pitch);
        if let Some(hit) = trace_pellet(origin, dir, def.range, &state.zombies) {
            pellet_hits.push(hit);
        }
    }
    pellet_hits.sort_by(|a, b| a.dist.total_cmp(&b.dist));

    state.broadcast(SimEvent::Shot {
        player_id,
        weapon: def.id,
        yaw: aim.yaw,
        pitch: aim.pitch,
        pellets: def.pellets,
    });

    let hit_reward = state.tuning.zombie.hit_reward;
    let kill_reward = state.tuning.zombie.kill_reward;
    let mut absorbed: HashMap<EntityId, u32> = HashMap::new();
    let (mut hits, mut kills, mut earned) = (0usize, 0usize, 0i64);

    for hit in pellet_hits {
        let count = absorbed.entry(hit.zombie_id).or_insert(0);
        if *count >= MAX_HITS_PER_ZOMBIE {
            continue;
        }
        // Already killed by a nearer pellet of this shot.
        let Some(idx) = state.zombie_index(hit.zombie_id) else {
            continue;
        };
        *count += 1;

        let dmg = damage_at(def, hit.dist, hit.part);
        let zombie = &mut state.zombies[idx];
        zombie.hp -= dmg;
        let killed = zombie.hp <= 0;
        let report = HitReport {
            player_id,
            zombie_id: zombie.id,
            weapon: def.id,
            part: hit.part,
            dmg,
            dist: hit.dist,
            killed,
            zombie_hp: zombie.hp.max(0),
            zombie_x: zombie.x,
            zombie_z: zombie.z,
        };
        let wave_member = zombie.wave_member;

        hits += 1;
        earned += hit_reward;
        state.broadcast(SimEvent::ZombieHit {
            zombie_id: report.zombie_id,
            player_id,
            part: report.part,
            dmg,
            hp: report.zombie_hp,
        });
        state.hook(HookEvent::Damage(report.clone()));

        if killed {
            kills += 1;
            earned += kill_reward;
            state.zombies.remove(idx);
            if wave_member && state.round.is_active() {
                state.round.killed = (state.round.killed + 1).min(state.round.target);
            }
            info!(player_id, zombie_id = report.zombie_id, weapon = def.id, "zombie killed");
            state.broadcast(SimEvent::ZombieDead {
                zombie_id: report.zombie_id,
                player_id,
                weapon: def.id,
            });
            state.hook(HookEvent::Kill(report));
        }
    }

    if earned != 0 {
        if let Some(p) = state.players.get_mut(&player_id) {
            p.cash += earned;
            let cash = p.cash;
            state.send_to(player_id, SimEvent::Cash { cash });
        }
    }
    debug!(player_id, weapon = def.id, hits, kills, "shot resolved");
    (hits, kills)
}

/// Puts a full-ammo copy of the weapon into its slot, replacing whatever was there.
pub fn give_weapon(state: &mut SimulationState, player_id: PlayerId, weapon_id: &str) -> bool {
    let Some(def) = weapons::get(weapon_id) else {
        return false;
    };
    let Some(p) = state.players.get_mut(&player_id) else {
        return false;
    };
    *p.slot_mut(def.slot) = Some(WeaponState::fresh(def));
    let loadout = loadout_event(p);
    state.broadcast(loadout);
    true
}

pub fn equip_weapon(state: &mut SimulationState, player_id: PlayerId, weapon_id: &str) -> bool {
    let Some(def) = weapons::get(weapon_id) else {
        return false;
    };
    let Some(p) = state.players.get_mut(&player_id) else {
        return false;
    };
    if p.slot_of(weapon_id).is_none() {
        *p.slot_mut(def.slot) = Some(WeaponState::fresh(def));
    }
    p.active_slot = def.slot;
    let loadout = loadout_event(p);
    state.broadcast(loadout);
    true
}

pub fn take_weapon(state: &mut SimulationState, player_id: PlayerId, weapon_id: &str) -> bool {
    let Some(p) = state.players.get_mut(&player_id) else {
        return false;
    };
    let Some(slot) = p.slot_of(weapon_id) else {
        return false;
    };
    *p.slot_mut(slot) = None;
    if slot == p.active_slot {
        p.active_slot = match slot {
            SlotKind::Pistol => SlotKind::Primary,
            SlotKind::Primary => SlotKind::Pistol,
        };
    }
    let loadout = loadout_event(p);
    state.broadcast(loadout);
    true
}

/// Refills clip and reserve; `None` restocks every equipped weapon.
pub fn restock(state: &mut SimulationState, player_id: PlayerId, weapon_id: Option<&str>) -> bool {
    let Some(p) = state.players.get_mut(&player_id) else {
        return false;
    };
    let mut refilled = Vec::new();
    for ws in [p.pistol.as_mut(), p.primary.as_mut()].into_iter().flatten() {
        if weapon_id.is_some_and(|id| id != ws.id()) {
            continue;
        }
        ws.clip = ws.def.clip_max_ammo;
        ws.reserve = ws.def.reserve_max_ammo;
        ws.reload_until = None;
        refilled.push(ammo_of(ws));
    }
    let any = !refilled.is_empty();
    for ammo in refilled {
        state.send_to(player_id, SimEvent::Ammo(ammo));
    }
    any
}

/// Sets ammo counts, clamped to the weapon's capacities.
pub fn set_ammo(state: &mut SimulationState, player_id: PlayerId, weapon_id: &str, clip: u32, reserve: u32) -> bool {
    let Some(ws) = state
        .players
        .get_mut(&player_id)
        .and_then(|p| p.weapon_mut(weapon_id))
    else {
        return false;
    };
    ws.clip = clip.min(ws.def.clip_max_ammo);
    ws.reserve = reserve.min(ws.def.reserve_max_ammo);
    let ammo = ammo_of(ws);
    state.send_to(player_id, SimEvent::Ammo(ammo));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::RoundPhase;
    use crate::domain::tuning::Tuning;
    use proptest::prelude::*;

    fn ak() -> &'static WeaponDef {
        weapons::get("ak47").expect("ak47 in catalog")
    }

    fn arena_with_shooter(primary: &str) -> SimulationState {
        let mut state = SimulationState::new(7, Tuning::default());
        let mut p = Player::new(1, "shooter".into(), &state.tuning);
        p.x = 0.0;
        p.z = 0.0;
        p.primary = weapons::get(primary).map(WeaponState::fresh);
        state.players.insert(1, p);
        state
    }

    fn zombie_at(state: &mut SimulationState, x: f32, z: f32, hp: i32) -> EntityId {
        let id = state.next_id();
        state.zombies.push(Zombie {
            id,
            x,
            z,
            hp,
            max_hp: hp,
            speed: 0.0,
            wave_member: true,
        });
        id
    }

    #[test]
    fn falloff_endpoints_match_catalog() {
        assert_eq!(damage_at(ak(), 0.0, HitPart::Body), 34);
        assert_eq!(damage_at(ak(), 65.0, HitPart::Body), 22);
        assert_eq!(damage_at(ak(), 0.0, HitPart::Head), 68);
        assert_eq!(damage_at(ak(), 500.0, HitPart::Body), 22);
    }

    #[test]
    fn damage_is_floored_at_one() {
        let mut def = ak().clone();
        def.range_drop_off.far_damage = 0.0;
        def.range_drop_off.close_damage = 0.2;
        assert_eq!(damage_at(&def, 60.0, HitPart::Body), 1);
        assert_eq!(damage_at(&def, 60.0, HitPart::Head), 2);
    }

    #[test]
    fn ray_hits_sphere_in_front_only() {
        let origin = [0.0, 1.0, 0.0];
        let dir = [0.0, 0.0, -1.0];
        let t = ray_sphere(origin, dir, [0.0, 1.0, -5.0], 0.7).expect("hit");
        assert!((t - 4.3).abs() < 1e-4);
        assert!(ray_sphere(origin, dir, [0.0, 1.0, 5.0], 0.7).is_none());
        assert!(ray_sphere(origin, dir, [3.0, 1.0, -5.0], 0.7).is_none());
    }

    #[test]
    fn head_sphere_wins_when_nearer() {
        let z = Zombie {
            id: 1,
            x: 0.0,
            z: -5.0,
            hp: 10,
            max_hp: 10,
            speed: 0.0,
            wave_member: true,
        };
        let level = trace_zombie([0.0, HEAD_HEIGHT, 0.0], [0.0, 0.0, -1.0], &z).expect("hit");
        assert_eq!(level.1, HitPart::Head);
        let low = trace_zombie([0.0, BODY_HEIGHT, 0.0], [0.0, 0.0, -1.0], &z).expect("hit");
        assert_eq!(low.1, HitPart::Body);
    }

    #[test]
    fn three_body_hits_kill_a_ninety_hp_zombie_once() {
        let mut state = arena_with_shooter("ak47");
        state.round.phase = RoundPhase::Active;
        state.round.target = 8;
        let zid = zombie_at(&mut state, 0.0, -1.5, 90);
        // Aim at the body centre from eye height.
        let pitch = ((BODY_HEIGHT - state.tuning.player.eye_height) / 1.5).atan();
        let aim = Aim { yaw: 0.0, pitch };

        let mut kills = 0;
        for shot in 0..3 {
            state.now_ms = shot * 1000;
            match fire(&mut state, 1, "ak47", Some(aim)).expect("shot fires") {
                FireOutcome::Fired { kills: k, .. } => kills += k,
                other => panic!("unexpected {other:?}"),
            }
            if shot < 2 {
                assert!(state.zombie_index(zid).is_some());
            }
        }
        assert_eq!(kills, 1);
        assert!(state.zombie_index(zid).is_none());
        assert_eq!(state.round.killed, 1);
        let kill_hooks = state
            .hooks
            .iter()
            .filter(|h| matches!(h, HookEvent::Kill(_)))
            .count();
        assert_eq!(kill_hooks, 1);
        // 3 hits plus the kill bonus.
        assert_eq!(state.players[&1].cash, 3 + 5);
    }

    #[test]
    fn shotgun_caps_hits_per_zombie() {
        let mut state = arena_with_shooter("shotgun");
        zombie_at(&mut state, 0.0, -1.2, 10_000);
        let pitch = ((BODY_HEIGHT - state.tuning.player.eye_height) / 1.2).atan();
        let outcome = fire(&mut state, 1, "shotgun", Some(Aim { yaw: 0.0, pitch })).expect("fires");
        match outcome {
            FireOutcome::Fired { hits, .. } => assert!(hits <= MAX_HITS_PER_ZOMBIE as usize && hits > 0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_unequipped_and_cooldown() {
        let mut state = arena_with_shooter("ak47");
        assert_eq!(
            fire(&mut state, 1, "railgun", None),
            Err(CombatError::UnknownWeapon("railgun".into()))
        );
        assert_eq!(
            fire(&mut state, 1, "mp5", None),
            Err(CombatError::NotEquipped("mp5".into()))
        );
        assert!(fire(&mut state, 1, "ak47", None).is_ok());
        assert_eq!(fire(&mut state, 1, "ak47", None), Err(CombatError::Cooldown));
    }

    #[test]
    fn empty_clip_auto_reloads_from_reserve() {
        let mut state = arena_with_shooter("ak47");
        {
            let ws = state.players.get_mut(&1).unwrap().primary.as_mut().unwrap();
            ws.clip = 0;
            ws.reserve = 10;
        }
        assert_eq!(fire(&mut state, 1, "ak47", None), Ok(FireOutcome::ReloadStarted));
        assert_eq!(fire(&mut state, 1, "ak47", None), Err(CombatError::Reloading));

        state.now_ms = 10_000;
        finish_reloads(&mut state);
        let ws = state.players[&1].primary.as_ref().unwrap();
        assert_eq!((ws.clip, ws.reserve), (10, 0));
        assert!(ws.reload_until.is_none());
    }

    #[test]
    fn burst_continues_on_schedule() {
        let mut state = arena_with_shooter("m16");
        assert!(matches!(fire(&mut state, 1, "m16", None), Ok(FireOutcome::Fired { .. })));
        assert_eq!(fire(&mut state, 1, "m16", None), Err(CombatError::BurstInProgress));

        for t in [70, 140] {
            state.now_ms = t;
            continue_bursts(&mut state);
        }
        let ws = state.players[&1].primary.as_ref().unwrap();
        assert_eq!(ws.clip, 27);
        assert_eq!(ws.burst_remaining, 0);
        assert_eq!(ws.next_fire_at, 140 + ws.def.fire_interval_ms);
    }

    #[test]
    fn set_ammo_clamps_to_capacity() {
        let mut state = arena_with_shooter("ak47");
        assert!(set_ammo(&mut state, 1, "ak47", 999, 999));
        let ws = state.players[&1].primary.as_ref().unwrap();
        assert_eq!((ws.clip, ws.reserve), (30, 120));
        assert!(!set_ammo(&mut state, 1, "mp5", 1, 1));
    }

    proptest! {
        #[test]
        fn damage_never_increases_with_distance(a in 0.0f32..65.0, b in 0.0f32..65.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(damage_at(ak(), near, HitPart::Body) >= damage_at(ak(), far, HitPart::Body));
        }

        #[test]
        fn head_is_exactly_double(d in 0.0f32..130.0) {
            for w in weapons::all() {
                prop_assert_eq!(damage_at(w, d, HitPart::Head), 2 * damage_at(w, d, HitPart::Body));
            }
        }

        #[test]
        fn ammo_stays_in_bounds(ops in proptest::collection::vec(0u8..3, 1..60)) {
            let mut state = arena_with_shooter("mp5");
            for (i, op) in ops.into_iter().enumerate() {
                state.now_ms = i as u64 * 250;
                match op {
                    0 => { let _ = fire(&mut state, 1, "mp5", None); }
                    1 => { let _ = reload(&mut state, 1, "mp5"); }
                    _ => finish_reloads(&mut state),
                }
                let ws = state.players[&1].primary.as_ref().unwrap();
                prop_assert!(ws.clip <= ws.def.clip_max_ammo);
                prop_assert!(ws.reserve <= ws.def.reserve_max_ammo);
            }
        }
    }
}
