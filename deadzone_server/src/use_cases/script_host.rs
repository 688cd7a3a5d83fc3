// Bridges the script engine's capability trait onto the simulation state.
//
// Every call mutates `SimulationState` right away through the same domain systems the
// client commands use, so scripts cannot reach anything those systems do not expose.

use crate::domain::events::SimEvent;
use crate::domain::state::{HudItem, HudShape, ObstacleKind, Pickup, PlayerId, SimulationState};
use crate::domain::systems::collision::clamp_to_arena;
use crate::domain::systems::{combat, hud, lifecycle, obstacles, zombies};
use crate::domain::weapons;
use crate::dzs::host::{HudRect, HudText, ObstacleShape, ScriptHost, ScriptPlayerId, SpawnRequest, Target};
use rand::Rng;
use tracing::debug;

pub struct SimHost<'a> {
    state: &'a mut SimulationState,
}

impl<'a> SimHost<'a> {
    pub fn new(state: &'a mut SimulationState) -> Self {
        Self { state }
    }

    fn recipients(&self, target: Target) -> Vec<PlayerId> {
        match target {
            Target::All => self.state.players.keys().copied().collect(),
            Target::Player(id) => self.state.players.contains_key(&id).then_some(id).into_iter().collect(),
            Target::Radius { x, z, r } => self
                .state
                .players
                .values()
                .filter(|p| (p.x - x).powi(2) + (p.z - z).powi(2) <= r * r)
                .map(|p| p.id)
                .collect(),
        }
    }

    fn expiry(&self, ttl_ms: Option<u64>) -> Option<u64> {
        ttl_ms.map(|ttl| self.state.now_ms + ttl)
    }

    fn spawn_obstacle(&mut self, shape: ObstacleShape, x: f32, z: f32, size: [Option<f32>; 3], rotated: bool) -> Option<u64> {
        let kind = match shape {
            ObstacleShape::Box => ObstacleKind::Box,
            ObstacleShape::Bush => ObstacleKind::Bush,
            ObstacleShape::Car => ObstacleKind::Car,
            ObstacleShape::Bus => ObstacleKind::Bus,
        };
        let mut obs = obstacles::preset(kind, x, z, rotated);
        let [w, d, h] = size.map(|v| v.filter(|v| v.is_finite() && *v > 0.0));
        if let Some(w) = w {
            obs.hx = w / 2.0;
        }
        if let Some(d) = d {
            obs.hz = d / 2.0;
        }
        if let Some(h) = h {
            obs.h = h;
        }
        obstacles::add(self.state, obs);
        Some(self.state.obstacles.len() as u64)
    }

    fn spawn_pickup(&mut self, weapon: &str, x: f32, z: f32) -> Option<u64> {
        let def = weapons::get(weapon)?;
        let (mut x, mut z) = (x, z);
        clamp_to_arena(&mut x, &mut z, 0.0, self.state.tuning.arena.half_size);
        let id = self.state.next_id();
        self.state.pickups.push(Pickup { id, weapon: def, x, z });
        Some(id)
    }
}

impl ScriptHost for SimHost<'_> {
    fn cash(&self, player: ScriptPlayerId) -> Option<i64> {
        self.state.players.get(&player).map(|p| p.cash)
    }

    fn hp(&self, player: ScriptPlayerId) -> Option<i32> {
        self.state.players.get(&player).map(|p| p.hp)
    }

    fn add_cash(&mut self, player: ScriptPlayerId, amount: i64) -> bool {
        self.set_cash_with(player, |cash| Some(cash.saturating_add(amount).max(0)))
    }

    fn take_cash(&mut self, player: ScriptPlayerId, amount: i64) -> bool {
        self.set_cash_with(player, |cash| (amount >= 0 && cash >= amount).then(|| cash - amount))
    }

    fn set_cash(&mut self, player: ScriptPlayerId, amount: i64) -> bool {
        self.set_cash_with(player, |_| Some(amount.max(0)))
    }

    fn give_weapon(&mut self, player: ScriptPlayerId, weapon: &str) -> bool {
        combat::give_weapon(self.state, player, weapon)
    }

    fn take_weapon(&mut self, player: ScriptPlayerId, weapon: &str) -> bool {
        combat::take_weapon(self.state, player, weapon)
    }

    fn restock(&mut self, player: ScriptPlayerId, weapon: Option<&str>) -> bool {
        combat::restock(self.state, player, weapon)
    }

    fn set_ammo(&mut self, player: ScriptPlayerId, weapon: &str, clip: u32, reserve: u32) -> bool {
        combat::set_ammo(self.state, player, weapon, clip, reserve)
    }

    fn teleport(&mut self, player: ScriptPlayerId, x: f32, z: f32) -> bool {
        x.is_finite() && z.is_finite() && lifecycle::teleport_player(self.state, player, x, z)
    }

    fn teleport_zombie(&mut self, zombie: u64, x: f32, z: f32) -> bool {
        x.is_finite() && z.is_finite() && zombies::teleport_zombie(self.state, zombie, x, z)
    }

    fn set_god_mode(&mut self, player: ScriptPlayerId, on: bool) -> bool {
        lifecycle::set_god_mode(self.state, player, on)
    }

    fn hud_text(&mut self, target: Target, item: HudText) -> usize {
        let players = self.recipients(target);
        let item = HudItem {
            id: item.id,
            shape: HudShape::Text {
                text: item.text,
                size: item.size,
            },
            x: item.x,
            y: item.y,
            color: item.color,
            expires_at: self.expiry(item.ttl_ms),
        };
        hud::put(self.state, &players, &item)
    }

    fn hud_rect(&mut self, target: Target, item: HudRect) -> usize {
        let players = self.recipients(target);
        let item = HudItem {
            id: item.id,
            shape: HudShape::Rect { w: item.w, h: item.h },
            x: item.x,
            y: item.y,
            color: item.color,
            expires_at: self.expiry(item.ttl_ms),
        };
        hud::put(self.state, &players, &item)
    }

    fn hud_clear(&mut self, target: Target, id: Option<&str>) -> usize {
        let players = self.recipients(target);
        hud::clear(self.state, &players, id)
    }

    fn toast(&mut self, target: Target, text: &str) -> usize {
        let players = self.recipients(target);
        for id in &players {
            self.state.send_to(*id, SimEvent::Toast { text: text.to_string() });
        }
        players.len()
    }

    fn spawn(&mut self, request: SpawnRequest) -> Option<u64> {
        let (x, z) = match &request {
            SpawnRequest::Obstacle { x, z, .. } | SpawnRequest::Weapon { x, z, .. } | SpawnRequest::Zombie { x, z, .. } => {
                (*x, *z)
            }
        };
        if !x.is_finite() || !z.is_finite() {
            return None;
        }
        let spawned = match request {
            SpawnRequest::Obstacle {
                shape,
                w,
                d,
                h,
                rotated,
                ..
            } => self.spawn_obstacle(shape, x, z, [w, d, h], rotated),
            SpawnRequest::Weapon { weapon, .. } => self.spawn_pickup(&weapon, x, z),
            SpawnRequest::Zombie { hp, speed, .. } => {
                let id = zombies::spawn_zombie(self.state, x, z, false);
                if let Some(zb) = self.state.zombies.iter_mut().find(|zb| zb.id == id) {
                    if let Some(hp) = hp.filter(|hp| *hp > 0) {
                        zb.hp = hp;
                        zb.max_hp = hp;
                    }
                    if let Some(speed) = speed.filter(|s| s.is_finite() && *s >= 0.0) {
                        zb.speed = speed;
                    }
                }
                Some(id)
            }
        };
        debug!(?spawned, "script spawn");
        spawned
    }

    fn random(&mut self) -> f64 {
        self.state.rng.random::<f64>()
    }
}

impl SimHost<'_> {
    fn set_cash_with(&mut self, player: ScriptPlayerId, f: impl FnOnce(i64) -> Option<i64>) -> bool {
        let Some(p) = self.state.players.get_mut(&player) else {
            return false;
        };
        let Some(cash) = f(p.cash) else {
            return false;
        };
        p.cash = cash;
        self.state.send_to(player, SimEvent::Cash { cash });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Player;
    use crate::domain::tuning::Tuning;

    fn state_with_players() -> SimulationState {
        let mut state = SimulationState::new(3, Tuning::default());
        for (id, x) in [(1, 0.0), (2, 30.0)] {
            let mut p = Player::new(id, format!("p{id}"), &state.tuning);
            p.x = x;
            p.z = 0.0;
            state.players.insert(id, p);
        }
        state
    }

    #[test]
    fn cash_operations_report_failure() {
        let mut state = state_with_players();
        let mut host = SimHost::new(&mut state);
        assert!(host.add_cash(1, 50));
        assert!(!host.take_cash(1, 60));
        assert!(host.take_cash(1, 20));
        assert_eq!(host.cash(1), Some(30));
        assert!(!host.add_cash(99, 1));
        assert!(host.set_cash(1, -5));
        assert_eq!(host.cash(1), Some(0));
    }

    #[test]
    fn radius_target_selects_nearby_players() {
        let mut state = state_with_players();
        let mut host = SimHost::new(&mut state);
        assert_eq!(host.toast(Target::Radius { x: 0.0, z: 0.0, r: 5.0 }, "near"), 1);
        assert_eq!(host.toast(Target::All, "all"), 2);
        assert_eq!(host.toast(Target::Player(7), "nobody"), 0);
    }

    #[test]
    fn hud_ttl_uses_sim_clock() {
        let mut state = state_with_players();
        state.now_ms = 1_000;
        let mut host = SimHost::new(&mut state);
        let item = HudText {
            id: "w".into(),
            text: "Wave 1".into(),
            x: 0.0,
            y: 0.0,
            size: 16.0,
            color: "#fff".into(),
            ttl_ms: Some(500),
        };
        assert_eq!(host.hud_text(Target::Player(2), item), 1);
        assert_eq!(state.players[&2].hud[0].expires_at, Some(1_500));
        assert!(state.players[&1].hud.is_empty());
    }

    #[test]
    fn spawners() {
        let mut state = state_with_players();
        let before = state.obstacles.len();
        let mut host = SimHost::new(&mut state);
        assert!(host
            .spawn(SpawnRequest::Obstacle {
                shape: ObstacleShape::Car,
                x: 10.0,
                z: 10.0,
                w: Some(3.0),
                d: None,
                h: None,
                rotated: false,
            })
            .is_some());
        let zid = host
            .spawn(SpawnRequest::Zombie {
                x: 5.0,
                z: 5.0,
                hp: Some(500),
                speed: None,
            })
            .expect("zombie spawned");
        assert!(host
            .spawn(SpawnRequest::Weapon {
                weapon: "nope".into(),
                x: 0.0,
                z: 0.0
            })
            .is_none());
        assert!(host
            .spawn(SpawnRequest::Weapon {
                weapon: "ak47".into(),
                x: 0.0,
                z: 0.0
            })
            .is_some());

        assert_eq!(state.obstacles.len(), before + 1);
        assert_eq!(state.obstacles[before].hx, 1.5);
        let zb = &state.zombies[0];
        assert_eq!((zb.id, zb.hp, zb.wave_member), (zid, 500, false));
        assert_eq!(state.pickups.len(), 1);
    }
}
