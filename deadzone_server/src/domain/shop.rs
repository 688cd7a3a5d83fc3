// Between-shots economy: consumables, armor, perks and weapons bought with cash.

use crate::domain::events::SimEvent;
use crate::domain::state::{MEDKIT_CAP, Perk, PlayerId, SimulationState};
use crate::domain::systems::combat;
use crate::domain::weapons::{self, WeaponDef};
use tracing::info;

pub const MEDKIT_PRICE: i64 = 75;
pub const ARMOR_PRICE: i64 = 150;
pub const ARMOR_STEP: f32 = 0.25;
pub const ARMOR_CAP: f32 = 0.75;
pub const AMMO_PRICE: i64 = 40;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShopError {
    #[error("unknown player")]
    UnknownPlayer,
    #[error("player is down")]
    PlayerDown,
    #[error("unknown item `{0}`")]
    UnknownItem(String),
    #[error("need {price} cash, have {cash}")]
    InsufficientCash { price: i64, cash: i64 },
    #[error("{0} already at capacity")]
    AtCapacity(&'static str),
    #[error("no medkits")]
    NoMedkit,
    #[error("already at full health")]
    FullHealth,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShopItem {
    Medkit,
    Armor,
    Ammo,
    Perk(Perk),
    Weapon(&'static WeaponDef),
}

impl ShopItem {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "medkit" => Some(Self::Medkit),
            "armor" => Some(Self::Armor),
            "ammo" => Some(Self::Ammo),
            other => Perk::from_name(other).map(Self::Perk).or_else(|| {
                weapons::get(other)
                    .filter(|w| w.price > 0)
                    .map(Self::Weapon)
            }),
        }
    }

    pub fn price(&self) -> i64 {
        match self {
            Self::Medkit => MEDKIT_PRICE,
            Self::Armor => ARMOR_PRICE,
            Self::Ammo => AMMO_PRICE,
            Self::Perk(Perk::FastReload) => 300,
            Self::Perk(Perk::Sprint) => 250,
            Self::Weapon(def) => def.price,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Medkit => "medkit",
            Self::Armor => "armor",
            Self::Ammo => "ammo",
            Self::Perk(p) => p.name(),
            Self::Weapon(def) => def.id,
        }
    }
}

/// Buys one item, returning the player's remaining cash.
pub fn buy(state: &mut SimulationState, player_id: PlayerId, item_name: &str) -> Result<i64, ShopError> {
    let item = ShopItem::parse(item_name).ok_or_else(|| ShopError::UnknownItem(item_name.to_string()))?;
    let price = item.price();

    let p = state
        .players
        .get_mut(&player_id)
        .ok_or(ShopError::UnknownPlayer)?;
    if !p.alive {
        return Err(ShopError::PlayerDown);
    }
    if p.cash < price {
        return Err(ShopError::InsufficientCash { price, cash: p.cash });
    }

    match item {
        ShopItem::Medkit => {
            if p.inventory.medkits >= MEDKIT_CAP {
                return Err(ShopError::AtCapacity("medkit"));
            }
            p.inventory.medkits += 1;
        }
        ShopItem::Armor => {
            if p.armor >= ARMOR_CAP {
                return Err(ShopError::AtCapacity("armor"));
            }
            p.armor = (p.armor + ARMOR_STEP).min(ARMOR_CAP);
        }
        ShopItem::Perk(perk) => {
            if !p.inventory.perks.insert(perk) {
                return Err(ShopError::AtCapacity(perk.name()));
            }
        }
        ShopItem::Ammo | ShopItem::Weapon(_) => {}
    }
    p.cash -= price;
    let cash = p.cash;

    match item {
        ShopItem::Ammo => {
            combat::restock(state, player_id, None);
        }
        ShopItem::Weapon(def) => {
            combat::give_weapon(state, player_id, def.id);
        }
        _ => {}
    }

    info!(player_id, item = item.name(), price, cash, "item bought");
    state.send_to(
        player_id,
        SimEvent::Bought {
            item: item.name().to_string(),
            cash,
        },
    );
    state.send_to(player_id, SimEvent::Cash { cash });
    Ok(cash)
}

/// Consumes a medkit, returning the new hp.
pub fn use_medkit(state: &mut SimulationState, player_id: PlayerId) -> Result<i32, ShopError> {
    let max_hp = state.tuning.player.max_hp;
    let heal = state.tuning.player.medkit_heal;
    let p = state
        .players
        .get_mut(&player_id)
        .ok_or(ShopError::UnknownPlayer)?;
    if !p.alive {
        return Err(ShopError::PlayerDown);
    }
    if p.inventory.medkits == 0 {
        return Err(ShopError::NoMedkit);
    }
    if p.hp >= max_hp {
        return Err(ShopError::FullHealth);
    }
    p.inventory.medkits -= 1;
    p.hp = (p.hp + heal).min(max_hp);
    let hp = p.hp;
    state.send_to(
        player_id,
        SimEvent::Toast {
            text: format!("Medkit used ({hp} hp)"),
        },
    );
    Ok(hp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Player;
    use crate::domain::tuning::Tuning;

    fn rich(cash: i64) -> SimulationState {
        let mut state = SimulationState::new(1, Tuning::default());
        let mut p = Player::new(1, "buyer".into(), &state.tuning);
        p.cash = cash;
        state.players.insert(1, p);
        state
    }

    #[test]
    fn medkits_cap_at_three() {
        let mut state = rich(1000);
        for _ in 0..MEDKIT_CAP {
            buy(&mut state, 1, "medkit").expect("room left");
        }
        assert_eq!(buy(&mut state, 1, "medkit"), Err(ShopError::AtCapacity("medkit")));
        assert_eq!(state.players[&1].cash, 1000 - 3 * MEDKIT_PRICE);
    }

    #[test]
    fn armor_stacks_to_cap() {
        let mut state = rich(10_000);
        for _ in 0..3 {
            buy(&mut state, 1, "armor").expect("room left");
        }
        assert!((state.players[&1].armor - ARMOR_CAP).abs() < 1e-6);
        assert!(buy(&mut state, 1, "armor").is_err());
    }

    #[test]
    fn cannot_overspend() {
        let mut state = rich(10);
        assert_eq!(
            buy(&mut state, 1, "armor"),
            Err(ShopError::InsufficientCash { price: ARMOR_PRICE, cash: 10 })
        );
        assert_eq!(state.players[&1].cash, 10);
    }

    #[test]
    fn weapons_go_into_their_slot() {
        let mut state = rich(5000);
        assert_eq!(buy(&mut state, 1, "ak47"), Ok(4000));
        assert_eq!(state.players[&1].primary.as_ref().map(|w| w.id()), Some("ak47"));
        assert!(matches!(buy(&mut state, 1, "glock"), Err(ShopError::UnknownItem(_))));
    }

    #[test]
    fn perks_are_bought_once() {
        let mut state = rich(1000);
        buy(&mut state, 1, "sprint").expect("first purchase");
        assert_eq!(buy(&mut state, 1, "sprint"), Err(ShopError::AtCapacity("sprint")));
        assert!(state.players[&1].inventory.perks.contains(&Perk::Sprint));
    }

    #[test]
    fn medkit_heals_without_overflow() {
        let mut state = rich(1000);
        assert_eq!(use_medkit(&mut state, 1), Err(ShopError::NoMedkit));
        buy(&mut state, 1, "medkit").expect("bought");
        assert_eq!(use_medkit(&mut state, 1), Err(ShopError::FullHealth));
        state.players.get_mut(&1).expect("player").hp = 70;
        assert_eq!(use_medkit(&mut state, 1), Ok(100));
        assert_eq!(state.players[&1].inventory.medkits, 0);
    }
}
