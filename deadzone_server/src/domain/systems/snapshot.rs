use crate::domain::events::{PickupSnapshot, PlayerSnapshot, RoundSnapshot, WorldSnapshot, ZombieSnapshot};
use crate::domain::state::{Player, SimulationState};

pub fn round_snapshot(state: &SimulationState) -> RoundSnapshot {
    let r = &state.round;
    RoundSnapshot {
        wave: r.wave,
        phase: r.phase,
        target: r.target,
        spawned: r.spawned,
        killed: r.killed,
        alive: state.zombies.len() as u32,
    }
}

pub fn player_snapshot(p: &Player) -> PlayerSnapshot {
    PlayerSnapshot {
        id: p.id,
        name: p.name.clone(),
        x: p.x,
        z: p.z,
        yaw: p.yaw,
        pitch: p.pitch,
        hp: p.hp,
        alive: p.alive,
        cash: p.cash,
        armor: p.armor,
        god_mode: p.god_mode,
        weapon: p.active_weapon().map(|w| w.id()),
    }
}

pub fn pickup_snapshots(state: &SimulationState) -> Vec<PickupSnapshot> {
    state
        .pickups
        .iter()
        .map(|p| PickupSnapshot {
            id: p.id,
            weapon: p.weapon.id,
            x: p.x,
            z: p.z,
        })
        .collect()
}

pub fn world_snapshot(state: &SimulationState) -> WorldSnapshot {
    WorldSnapshot {
        tick: state.tick,
        players: state.players.values().map(player_snapshot).collect(),
        zombies: state
            .zombies
            .iter()
            .map(|z| ZombieSnapshot {
                id: z.id,
                x: z.x,
                z: z.z,
                hp: z.hp,
                max_hp: z.max_hp,
            })
            .collect(),
        pickups: pickup_snapshots(state),
        round: round_snapshot(state),
    }
}
