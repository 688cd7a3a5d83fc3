use crate::domain::events::SimEvent;
use crate::domain::state::{Obstacle, ObstacleKind, SimulationState};
use crate::domain::tuning::ArenaTuning;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use tracing::debug;

const ATTEMPTS_PER_OBSTACLE: usize = 20;

/// Footprint for a kind at a position; `rotated` swaps the long axis onto X.
pub fn preset(kind: ObstacleKind, x: f32, z: f32, rotated: bool) -> Obstacle {
    let (hx, hz, h) = match kind {
        ObstacleKind::Box => (1.0, 1.0, 1.2),
        ObstacleKind::Bush => (1.1, 1.1, 1.0),
        ObstacleKind::Car => (1.0, 2.2, 1.5),
        ObstacleKind::Bus => (1.4, 5.5, 3.2),
    };
    let (hx, hz) = if rotated { (hz, hx) } else { (hx, hz) };
    Obstacle {
        x,
        z,
        hx,
        hz,
        h,
        kind,
    }
}

fn random_obstacle(rng: &mut Pcg32, arena: &ArenaTuning) -> Obstacle {
    let roll: f32 = rng.random();
    let kind = match roll {
        r if r < 0.40 => ObstacleKind::Box,
        r if r < 0.65 => ObstacleKind::Bush,
        r if r < 0.90 => ObstacleKind::Car,
        _ => ObstacleKind::Bus,
    };
    let mut obs = preset(kind, 0.0, 0.0, rng.random_bool(0.5));
    if kind == ObstacleKind::Box {
        obs.hx = rng.random_range(0.6..1.6);
        obs.hz = rng.random_range(0.6..1.6);
        obs.h = rng.random_range(1.0..2.2);
    }

    let inset = obs.hx.max(obs.hz) + 3.0;
    let limit = (arena.half_size - inset).max(0.0);
    obs.x = rng.random_range(-limit..=limit);
    obs.z = rng.random_range(-limit..=limit);
    obs
}

/// Builds the obstacle field for a seed. The same seed always yields the same layout,
/// and nothing is placed inside the safe radius around the spawn anchor.
pub fn generate(seed: u64, arena: &ArenaTuning) -> Vec<Obstacle> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut placed: Vec<Obstacle> = Vec::with_capacity(arena.obstacle_count);

    for _ in 0..arena.obstacle_count * ATTEMPTS_PER_OBSTACLE {
        if placed.len() >= arena.obstacle_count {
            break;
        }
        let obs = random_obstacle(&mut rng, arena);

        let reach = arena.safe_anchor_radius + obs.hx.max(obs.hz);
        let dx = obs.x - arena.spawn_anchor_x;
        let dz = obs.z - arena.spawn_anchor_z;
        if dx * dx + dz * dz < reach * reach {
            continue;
        }

        let gap = arena.obstacle_gap;
        let overlaps = placed.iter().any(|o| {
            (o.x - obs.x).abs() < o.hx + obs.hx + gap && (o.z - obs.z).abs() < o.hz + obs.hz + gap
        });
        if overlaps {
            continue;
        }
        placed.push(obs);
    }

    debug!(seed, count = placed.len(), "obstacle field generated");
    placed
}

/// Appends an obstacle at runtime and tells clients about the new field.
pub fn add(state: &mut SimulationState, obs: Obstacle) {
    state.obstacles.push(obs);
    let list = state.obstacles.clone();
    state.broadcast(SimEvent::Obstacles(list));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_layout() {
        let arena = ArenaTuning::default();
        assert_eq!(generate(42, &arena), generate(42, &arena));
        assert_ne!(generate(42, &arena), generate(43, &arena));
    }

    #[test]
    fn safe_anchor_stays_clear() {
        let arena = ArenaTuning::default();
        for seed in 0..20 {
            for o in generate(seed, &arena) {
                let near_x = arena.spawn_anchor_x.clamp(o.x - o.hx, o.x + o.hx);
                let near_z = arena.spawn_anchor_z.clamp(o.z - o.hz, o.z + o.hz);
                let d = ((near_x - arena.spawn_anchor_x).powi(2) + (near_z - arena.spawn_anchor_z).powi(2)).sqrt();
                assert!(d >= arena.safe_anchor_radius - o.hx.max(o.hz), "seed {seed}: {o:?}");
                assert!(o.x.abs() + o.hx <= arena.half_size);
                assert!(o.z.abs() + o.hz <= arena.half_size);
            }
        }
    }

    #[test]
    fn presets_rotate() {
        let bus = preset(ObstacleKind::Bus, 0.0, 0.0, false);
        let turned = preset(ObstacleKind::Bus, 0.0, 0.0, true);
        assert_eq!((bus.hx, bus.hz), (turned.hz, turned.hx));
    }
}
