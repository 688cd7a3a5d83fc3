use super::collision::clamp_to_arena;
use super::combat;
use crate::domain::events::SimEvent;
use crate::domain::state::{Perk, Player, SimulationState};
use tracing::debug;

const SPRINT_PERK_BONUS: f32 = 1.15;

/// Planar heading for a yaw angle (0 rad faces -Z).
pub fn forward(yaw: f32) -> (f32, f32) {
    (-yaw.sin(), -yaw.cos())
}

fn right(yaw: f32) -> (f32, f32) {
    (yaw.cos(), -yaw.sin())
}

pub fn tick_player(p: &mut Player, dt: f32, sprint_multiplier: f32) {
    let k = p.keys;
    let along = (k.forward as i32 - k.back as i32) as f32;
    let across = (k.right as i32 - k.left as i32) as f32;
    if along == 0.0 && across == 0.0 {
        return;
    }

    let (fx, fz) = forward(p.yaw);
    let (rx, rz) = right(p.yaw);
    let mut mx = fx * along + rx * across;
    let mut mz = fz * along + rz * across;
    let len = (mx * mx + mz * mz).sqrt();
    if len <= f32::EPSILON {
        return;
    }
    mx /= len;
    mz /= len;

    let mut speed = p.speed;
    if k.sprint {
        speed *= sprint_multiplier;
        if p.inventory.perks.contains(&Perk::Sprint) {
            speed *= SPRINT_PERK_BONUS;
        }
    }

    p.x += mx * speed * dt;
    p.z += mz * speed * dt;
}

/// Integrates every living player's staged movement keys.
pub fn integrate_players(state: &mut SimulationState, dt: f32) {
    let radius = state.tuning.player.radius;
    let half = state.tuning.arena.half_size;
    let sprint = state.tuning.player.sprint_multiplier;
    for p in state.players.values_mut().filter(|p| p.alive) {
        tick_player(p, dt, sprint);
        clamp_to_arena(&mut p.x, &mut p.z, radius, half);
    }
}

/// Hands overlapping weapon pickups to the first living player touching them.
pub fn collect_pickups(state: &mut SimulationState) {
    let reach = state.tuning.player.pickup_radius;
    let reach_sq = reach * reach;

    let mut taken = Vec::new();
    for pickup in &state.pickups {
        let claimant = state.living_players().find(|p| {
            let dx = p.x - pickup.x;
            let dz = p.z - pickup.z;
            dx * dx + dz * dz <= reach_sq
        });
        if let Some(p) = claimant {
            taken.push((pickup.id, p.id, pickup.weapon.id));
        }
    }

    for (pickup_id, player_id, weapon_id) in taken {
        state.pickups.retain(|p| p.id != pickup_id);
        if combat::give_weapon(state, player_id, weapon_id) {
            debug!(player_id, weapon = weapon_id, "pickup collected");
            state.send_to(
                player_id,
                SimEvent::Toast {
                    text: format!("Picked up {weapon_id}"),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::MoveKeys;
    use crate::domain::tuning::Tuning;

    fn walker() -> Player {
        let mut p = Player::new(1, "p".into(), &Tuning::default());
        p.x = 0.0;
        p.z = 0.0;
        p
    }

    #[test]
    fn forward_key_moves_along_negative_z_at_zero_yaw() {
        let mut p = walker();
        p.keys = MoveKeys {
            forward: true,
            ..MoveKeys::default()
        };
        tick_player(&mut p, 0.5, 1.4);
        assert!(p.x.abs() < 1e-5);
        assert!((p.z + 3.0).abs() < 1e-4);
    }

    #[test]
    fn diagonal_is_normalized() {
        let mut p = walker();
        p.keys = MoveKeys {
            forward: true,
            right: true,
            ..MoveKeys::default()
        };
        tick_player(&mut p, 1.0, 1.4);
        let moved = (p.x * p.x + p.z * p.z).sqrt();
        assert!((moved - p.speed).abs() < 1e-4);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut p = walker();
        p.keys = MoveKeys {
            forward: true,
            back: true,
            ..MoveKeys::default()
        };
        tick_player(&mut p, 1.0, 1.4);
        assert_eq!((p.x, p.z), (0.0, 0.0));
    }
}
