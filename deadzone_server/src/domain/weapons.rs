// Static weapon catalog.
//
// Entries are authored with the legacy close/far fields and normalized once into
// `WeaponDef` so combat math reads a single canonical shape.

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Pistol,
    Primary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeDropOff {
    /// Distance up to which `close_damage` applies.
    pub start: f32,
    /// Distance from which `far_damage` applies.
    pub end: f32,
    pub close_damage: f32,
    pub far_damage: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstSpec {
    /// Shots per trigger pull, including the first.
    pub count: u32,
    pub gap_ms: u64,
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponDef {
    pub id: &'static str,
    pub name: &'static str,
    pub slot: SlotKind,
    pub damage: f32,
    pub range: f32,
    pub range_drop_off: RangeDropOff,
    pub clip_max_ammo: u32,
    pub reserve_max_ammo: u32,
    pub fire_interval_ms: u64,
    /// Maximum yaw/pitch perturbation per pellet, in radians.
    pub spread: f32,
    pub pellets: u32,
    pub burst: Option<BurstSpec>,
    pub reload_ms: u64,
    pub recoil_scale: f32,
    pub model: String,
    pub price: i64,
}

// Authoring shape. `drop_start` defaults to a quarter of the range.
struct LegacyWeapon {
    id: &'static str,
    name: &'static str,
    slot: SlotKind,
    dmg_close: f32,
    dmg_far: f32,
    range: f32,
    drop_start: Option<f32>,
    clip: u32,
    reserve: u32,
    fire_ms: u64,
    spread: f32,
    pellets: u32,
    burst: Option<BurstSpec>,
    reload_ms: u64,
    recoil: Option<f32>,
    price: i64,
}

impl From<&LegacyWeapon> for WeaponDef {
    fn from(w: &LegacyWeapon) -> Self {
        let start = w.drop_start.unwrap_or(w.range * 0.25).clamp(0.0, w.range);
        Self {
            id: w.id,
            name: w.name,
            slot: w.slot,
            damage: w.dmg_close,
            range: w.range,
            range_drop_off: RangeDropOff {
                start,
                end: w.range,
                close_damage: w.dmg_close,
                far_damage: w.dmg_far,
            },
            clip_max_ammo: w.clip.max(1),
            reserve_max_ammo: w.reserve,
            fire_interval_ms: w.fire_ms,
            spread: w.spread.max(0.0),
            pellets: w.pellets.max(1),
            burst: w.burst.filter(|b| b.count > 1),
            reload_ms: w.reload_ms,
            recoil_scale: w.recoil.unwrap_or(1.0),
            model: format!("models/weapons/{}.glb", w.id),
            price: w.price,
        }
    }
}

const LEGACY_CATALOG: &[LegacyWeapon] = &[
    LegacyWeapon {
        id: "glock",
        name: "Glock 17",
        slot: SlotKind::Pistol,
        dmg_close: 22.0,
        dmg_far: 14.0,
        range: 40.0,
        drop_start: None,
        clip: 12,
        reserve: 60,
        fire_ms: 220,
        spread: 0.012,
        pellets: 1,
        burst: None,
        reload_ms: 1300,
        recoil: Some(0.6),
        price: 0,
    },
    LegacyWeapon {
        id: "deagle",
        name: "Desert Eagle",
        slot: SlotKind::Pistol,
        dmg_close: 48.0,
        dmg_far: 30.0,
        range: 50.0,
        drop_start: Some(10.0),
        clip: 7,
        reserve: 35,
        fire_ms: 420,
        spread: 0.008,
        pellets: 1,
        burst: None,
        reload_ms: 1700,
        recoil: Some(1.4),
        price: 400,
    },
    LegacyWeapon {
        id: "mp5",
        name: "MP5",
        slot: SlotKind::Primary,
        dmg_close: 20.0,
        dmg_far: 12.0,
        range: 45.0,
        drop_start: None,
        clip: 30,
        reserve: 150,
        fire_ms: 85,
        spread: 0.03,
        pellets: 1,
        burst: None,
        reload_ms: 2000,
        recoil: Some(0.5),
        price: 700,
    },
    LegacyWeapon {
        id: "ak47",
        name: "AK-47",
        slot: SlotKind::Primary,
        dmg_close: 34.0,
        dmg_far: 22.0,
        range: 65.0,
        drop_start: None,
        clip: 30,
        reserve: 120,
        fire_ms: 110,
        spread: 0.02,
        pellets: 1,
        burst: None,
        reload_ms: 2400,
        recoil: Some(0.9),
        price: 1000,
    },
    LegacyWeapon {
        id: "m16",
        name: "M16 Burst",
        slot: SlotKind::Primary,
        dmg_close: 30.0,
        dmg_far: 20.0,
        range: 70.0,
        drop_start: None,
        clip: 30,
        reserve: 120,
        fire_ms: 380,
        spread: 0.012,
        pellets: 1,
        burst: Some(BurstSpec {
            count: 3,
            gap_ms: 70,
        }),
        reload_ms: 2300,
        recoil: Some(0.7),
        price: 1100,
    },
    LegacyWeapon {
        id: "shotgun",
        name: "SPAS-12",
        slot: SlotKind::Primary,
        dmg_close: 14.0,
        dmg_far: 4.0,
        range: 22.0,
        drop_start: Some(4.0),
        clip: 8,
        reserve: 40,
        fire_ms: 800,
        spread: 0.09,
        pellets: 8,
        burst: None,
        reload_ms: 2800,
        recoil: Some(1.8),
        price: 900,
    },
    LegacyWeapon {
        id: "awp",
        name: "AWP",
        slot: SlotKind::Primary,
        dmg_close: 110.0,
        dmg_far: 90.0,
        range: 120.0,
        drop_start: Some(40.0),
        clip: 5,
        reserve: 25,
        fire_ms: 1300,
        spread: 0.0,
        pellets: 1,
        burst: None,
        reload_ms: 3200,
        recoil: None,
        price: 1500,
    },
];

/// Weapon every player starts with.
pub const DEFAULT_PISTOL: &str = "glock";

fn catalog() -> &'static [WeaponDef] {
    static CATALOG: OnceLock<Vec<WeaponDef>> = OnceLock::new();
    CATALOG.get_or_init(|| LEGACY_CATALOG.iter().map(WeaponDef::from).collect())
}

pub fn all() -> &'static [WeaponDef] {
    catalog()
}

pub fn get(id: &str) -> Option<&'static WeaponDef> {
    catalog().iter().find(|w| w.id == id)
}

/// Ids offered for the given slot, in catalog order.
pub fn list(slot: SlotKind) -> Vec<&'static str> {
    catalog()
        .iter()
        .filter(|w| w.slot == slot)
        .map(|w| w.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_normalizes_drop_off_inside_range() {
        for w in all() {
            assert!(w.range_drop_off.start <= w.range_drop_off.end, "{}", w.id);
            assert_eq!(w.range_drop_off.end, w.range);
            assert_eq!(w.damage, w.range_drop_off.close_damage);
            assert!(w.model.ends_with(".glb"));
        }
    }

    #[test]
    fn lookup_and_lists() {
        assert_eq!(get("ak47").map(|w| w.clip_max_ammo), Some(30));
        assert!(get("railgun").is_none());
        assert!(list(SlotKind::Pistol).contains(&DEFAULT_PISTOL));
        assert!(list(SlotKind::Primary).contains(&"shotgun"));
        assert_eq!(get("shotgun").map(|w| w.pellets), Some(8));
        assert_eq!(get("m16").and_then(|w| w.burst).map(|b| b.count), Some(3));
    }
}
