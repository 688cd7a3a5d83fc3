use crate::domain::state::{Obstacle, SimulationState};

/// Share of a player-zombie penetration the zombie absorbs.
pub const ZOMBIE_SHARE: f32 = 0.85;
/// Obstacle passes per entity per tick.
const OBSTACLE_PASSES: usize = 2;
// Keeps resolved centres strictly outside the expanded box.
const SKIN: f32 = 1e-4;

/// Pushes two circles apart along the line between their centres.
///
/// `share_a` is the fraction of the penetration applied to `a`; the rest goes to `b`.
/// Returns true if the circles overlapped.
pub fn separate_circles(
    a: (&mut f32, &mut f32),
    ra: f32,
    b: (&mut f32, &mut f32),
    rb: f32,
    share_a: f32,
) -> bool {
    let dx = *b.0 - *a.0;
    let dz = *b.1 - *a.1;
    let min_dist = ra + rb;
    let dist_sq = dx * dx + dz * dz;
    if dist_sq >= min_dist * min_dist {
        return false;
    }

    let dist = dist_sq.sqrt();
    // Coincident centres have no normal; pick +X so both sides agree every tick.
    let (nx, nz) = if dist > f32::EPSILON {
        (dx / dist, dz / dist)
    } else {
        (1.0, 0.0)
    };
    let penetration = min_dist - dist;
    let share_b = 1.0 - share_a;

    *a.0 -= nx * penetration * share_a;
    *a.1 -= nz * penetration * share_a;
    *b.0 += nx * penetration * share_b;
    *b.1 += nz * penetration * share_b;
    true
}

/// Moves a circle out of one obstacle along the shortest penetration axis.
///
/// Returns true if the circle was displaced.
pub fn push_out_of_obstacle(x: &mut f32, z: &mut f32, radius: f32, obs: &Obstacle) -> bool {
    let (min_x, max_x) = (obs.x - obs.hx, obs.x + obs.hx);
    let (min_z, max_z) = (obs.z - obs.hz, obs.z + obs.hz);

    let near_x = x.clamp(min_x, max_x);
    let near_z = z.clamp(min_z, max_z);

    if near_x == *x && near_z == *z {
        // Centre inside the box: leave through the nearest edge.
        let to_left = *x - min_x;
        let to_right = max_x - *x;
        let to_back = *z - min_z;
        let to_front = max_z - *z;
        let nearest = to_left.min(to_right).min(to_back).min(to_front);
        if nearest == to_left {
            *x = min_x - radius - SKIN;
        } else if nearest == to_right {
            *x = max_x + radius + SKIN;
        } else if nearest == to_back {
            *z = min_z - radius - SKIN;
        } else {
            *z = max_z + radius + SKIN;
        }
        return true;
    }

    // Corners are treated as square so the centre always ends outside the grown box.
    let pen_x = obs.hx + radius - (*x - obs.x).abs();
    let pen_z = obs.hz + radius - (*z - obs.z).abs();
    if pen_x <= 0.0 || pen_z <= 0.0 {
        return false;
    }

    if pen_x <= pen_z {
        let dir = if *x >= obs.x { 1.0 } else { -1.0 };
        *x = obs.x + dir * (obs.hx + radius + SKIN);
    } else {
        let dir = if *z >= obs.z { 1.0 } else { -1.0 };
        *z = obs.z + dir * (obs.hz + radius + SKIN);
    }
    true
}

/// Resolves a circle against every obstacle, settling at most two passes.
pub fn resolve_obstacles(x: &mut f32, z: &mut f32, radius: f32, obstacles: &[Obstacle]) {
    for _ in 0..OBSTACLE_PASSES {
        let mut moved = false;
        for obs in obstacles {
            moved |= push_out_of_obstacle(x, z, radius, obs);
        }
        if !moved {
            break;
        }
    }
}

pub fn clamp_to_arena(x: &mut f32, z: &mut f32, radius: f32, half_size: f32) {
    let limit = (half_size - radius).max(0.0);
    *x = x.clamp(-limit, limit);
    *z = z.clamp(-limit, limit);
}

/// Runs every collision pass in the fixed per-tick order.
pub fn resolve_all(state: &mut SimulationState) {
    let pr = state.tuning.player.radius;
    let zr = state.tuning.zombie.radius;
    let half = state.tuning.arena.half_size;

    // Player-player.
    let mut players: Vec<_> = state.players.values_mut().filter(|p| p.alive).collect();
    for i in 0..players.len() {
        let (head, tail) = players.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            separate_circles((&mut a.x, &mut a.z), pr, (&mut b.x, &mut b.z), pr, 0.5);
        }
    }

    // Zombie-zombie.
    for i in 0..state.zombies.len() {
        let (head, tail) = state.zombies.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            separate_circles((&mut a.x, &mut a.z), zr, (&mut b.x, &mut b.z), zr, 0.5);
        }
    }

    // Player-zombie: zombies give way so players do not get pinned by a swarm.
    for p in players.iter_mut() {
        for zb in state.zombies.iter_mut() {
            separate_circles(
                (&mut p.x, &mut p.z),
                pr,
                (&mut zb.x, &mut zb.z),
                zr,
                1.0 - ZOMBIE_SHARE,
            );
        }
    }

    for p in players.iter_mut() {
        resolve_obstacles(&mut p.x, &mut p.z, pr, &state.obstacles);
        clamp_to_arena(&mut p.x, &mut p.z, pr, half);
    }
    for zb in state.zombies.iter_mut() {
        resolve_obstacles(&mut zb.x, &mut zb.z, zr, &state.obstacles);
        clamp_to_arena(&mut zb.x, &mut zb.z, zr, half);
    }
}
