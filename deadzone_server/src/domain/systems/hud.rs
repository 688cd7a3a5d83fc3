// Per-player HUD overlays owned by scripts. Every change resends the player's full item list.

use crate::domain::events::SimEvent;
use crate::domain::state::{HudItem, PlayerId, SimulationState};

fn push_hud(state: &mut SimulationState, player_id: PlayerId) {
    if let Some(items) = state.players.get(&player_id).map(|p| p.hud.clone()) {
        state.send_to(player_id, SimEvent::Hud { items });
    }
}

/// Inserts or replaces (by id) an item for each listed player. Returns how many received it.
pub fn put(state: &mut SimulationState, players: &[PlayerId], item: &HudItem) -> usize {
    let mut delivered = 0;
    for id in players {
        let Some(p) = state.players.get_mut(id) else {
            continue;
        };
        match p.hud.iter_mut().find(|h| h.id == item.id) {
            Some(slot) => *slot = item.clone(),
            None => p.hud.push(item.clone()),
        }
        delivered += 1;
        push_hud(state, *id);
    }
    delivered
}

/// Removes one item by id, or everything when `id` is `None`.
pub fn clear(state: &mut SimulationState, players: &[PlayerId], id: Option<&str>) -> usize {
    let mut touched = 0;
    for pid in players {
        let Some(p) = state.players.get_mut(pid) else {
            continue;
        };
        let before = p.hud.len();
        match id {
            Some(id) => p.hud.retain(|h| h.id != id),
            None => p.hud.clear(),
        }
        if p.hud.len() != before {
            touched += 1;
            push_hud(state, *pid);
        }
    }
    touched
}

/// Drops items whose ttl has run out.
pub fn expire(state: &mut SimulationState) {
    let now = state.now_ms;
    let mut changed = Vec::new();
    for p in state.players.values_mut() {
        let before = p.hud.len();
        p.hud.retain(|h| h.expires_at.is_none_or(|t| t > now));
        if p.hud.len() != before {
            changed.push(p.id);
        }
    }
    for id in changed {
        push_hud(state, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::Recipient;
    use crate::domain::state::{HudShape, Player};
    use crate::domain::tuning::Tuning;

    fn two_players() -> SimulationState {
        let mut state = SimulationState::new(1, Tuning::default());
        for id in [1, 2] {
            state.players.insert(id, Player::new(id, format!("p{id}"), &state.tuning));
        }
        state
    }

    fn label(id: &str, expires_at: Option<u64>) -> HudItem {
        HudItem {
            id: id.into(),
            shape: HudShape::Text {
                text: "hi".into(),
                size: 16.0,
            },
            x: 0.0,
            y: 0.0,
            color: "#fff".into(),
            expires_at,
        }
    }

    #[test]
    fn put_replaces_by_id() {
        let mut state = two_players();
        assert_eq!(put(&mut state, &[1, 2, 9], &label("a", None)), 2);
        put(&mut state, &[1], &label("a", Some(5)));
        assert_eq!(state.players[&1].hud.len(), 1);
        assert_eq!(state.players[&1].hud[0].expires_at, Some(5));
        assert_eq!(state.outbox.len(), 3);
        assert!(state.outbox.iter().all(|o| matches!(o.to, Recipient::Player(_))));
    }

    #[test]
    fn expired_items_are_removed_and_resent() {
        let mut state = two_players();
        put(&mut state, &[1], &label("keep", None));
        put(&mut state, &[1], &label("gone", Some(100)));
        state.outbox.clear();

        state.now_ms = 99;
        expire(&mut state);
        assert!(state.outbox.is_empty());

        state.now_ms = 100;
        expire(&mut state);
        assert_eq!(state.players[&1].hud.len(), 1);
        assert!(matches!(&state.outbox[0].event, SimEvent::Hud { items } if items.len() == 1));
    }

    #[test]
    fn clear_one_or_all() {
        let mut state = two_players();
        put(&mut state, &[1, 2], &label("a", None));
        put(&mut state, &[1, 2], &label("b", None));
        assert_eq!(clear(&mut state, &[1], Some("a")), 1);
        assert_eq!(state.players[&1].hud.len(), 1);
        assert_eq!(clear(&mut state, &[1, 2], None), 2);
        assert!(state.players.values().all(|p| p.hud.is_empty()));
        assert_eq!(clear(&mut state, &[1], None), 0);
    }
}
