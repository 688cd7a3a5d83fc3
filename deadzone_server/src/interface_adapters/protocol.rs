// Wire protocol DTOs and conversions for the public game socket.
//
// Every message is adjacently tagged: `{ "type": "...", "data": { ... } }` with camelCase names.

use crate::domain::events::{
    PickupSnapshot, PlayerSnapshot, RoundSnapshot, SimEvent, WeaponAmmo, WelcomeInfo, WorldSnapshot,
    ZombieSnapshot,
};
use crate::domain::state::{Aim, HudItem, HudShape, MoveKeys, Obstacle, RoundPhase};
use crate::domain::weapons::{self, SlotKind, WeaponDef};
use crate::use_cases::ClientCommand;
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Welcome(Box<WelcomeDto>),
    Snapshot(SnapshotDto),
    Shot {
        player_id: u64,
        weapon: &'static str,
        yaw: f32,
        pitch: f32,
        pellets: u32,
    },
    #[serde(rename = "zhit")]
    ZombieHit {
        zombie_id: u64,
        player_id: u64,
        part: &'static str,
        dmg: i32,
        hp: i32,
    },
    #[serde(rename = "zdead")]
    ZombieDead {
        zombie_id: u64,
        player_id: u64,
        weapon: &'static str,
    },
    Reload {
        player_id: u64,
        weapon: &'static str,
        duration_ms: u64,
    },
    Loadout {
        player_id: u64,
        pistol: Option<AmmoDto>,
        primary: Option<AmmoDto>,
        active: Option<&'static str>,
    },
    Ammo(AmmoDto),
    Bought {
        item: String,
        cash: i64,
    },
    Toast {
        text: String,
    },
    Join {
        player_id: u64,
        name: String,
    },
    Leave {
        player_id: u64,
    },
    Round(RoundDto),
    #[serde(rename = "phit")]
    PlayerHit {
        player_id: u64,
        dmg: i32,
        hp: i32,
    },
    #[serde(rename = "pdown")]
    PlayerDown {
        player_id: u64,
    },
    PlayerDead {
        wave: u32,
        prompt: String,
    },
    RestartAck,
    Hud {
        items: Vec<HudItemDto>,
    },
    Cash {
        cash: i64,
    },
    Obstacles {
        obstacles: Vec<ObstacleDto>,
    },
    DzsHelp {
        lines: Vec<String>,
    },
}

impl ServerMessage {
    pub fn is_snapshot(&self) -> bool {
        matches!(self, ServerMessage::Snapshot(_))
    }
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    // Client-side dt is accepted on the wire but the server integrates with its own step.
    Input(InputDto),
    Shoot {
        #[serde(default)]
        weapon: Option<String>,
        #[serde(default)]
        aim: Option<AimDto>,
    },
    Reload {
        #[serde(default)]
        weapon: Option<String>,
    },
    PickPistol {
        weapon: String,
    },
    PickPrimary {
        weapon: String,
    },
    Buy {
        item: String,
    },
    UseMedkit,
    Restart,
    Ready,
    GetDzsHelp,
    DevSetLoadout {
        #[serde(default)]
        pistol: Option<String>,
        #[serde(default)]
        primary: Option<String>,
    },
    DevEquipWeapon {
        weapon: String,
    },
    DevGiveWeapon {
        weapon: String,
    },
    DevSetGodMode {
        on: bool,
    },
    DevTeleportZombieToPlayer,
    DevReloadScripts,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputDto {
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default)]
    pub keys: KeysDto,
}

/// Held movement keys. Accepts both named and WASD spellings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct KeysDto {
    #[serde(alias = "w", alias = "up")]
    pub forward: bool,
    #[serde(alias = "s", alias = "down")]
    pub back: bool,
    #[serde(alias = "a")]
    pub left: bool,
    #[serde(alias = "d")]
    pub right: bool,
    #[serde(alias = "shift")]
    pub sprint: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AimDto {
    pub yaw: f32,
    pub pitch: f32,
}

impl From<KeysDto> for MoveKeys {
    fn from(k: KeysDto) -> Self {
        Self {
            forward: k.forward,
            back: k.back,
            left: k.left,
            right: k.right,
            sprint: k.sprint,
        }
    }
}

impl From<AimDto> for Aim {
    fn from(a: AimDto) -> Self {
        Self { yaw: a.yaw, pitch: a.pitch }
    }
}

impl From<ClientMessage> for ClientCommand {
    fn from(msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::Input(input) => ClientCommand::Input {
                yaw: input.yaw,
                pitch: input.pitch,
                keys: input.keys.into(),
            },
            ClientMessage::Shoot { weapon, aim } => ClientCommand::Shoot {
                weapon,
                aim: aim.map(Aim::from),
            },
            ClientMessage::Reload { weapon } => ClientCommand::Reload { weapon },
            ClientMessage::PickPistol { weapon } => ClientCommand::PickPistol { weapon },
            ClientMessage::PickPrimary { weapon } => ClientCommand::PickPrimary { weapon },
            ClientMessage::Buy { item } => ClientCommand::Buy { item },
            ClientMessage::UseMedkit => ClientCommand::UseMedkit,
            ClientMessage::Restart => ClientCommand::Restart,
            ClientMessage::Ready => ClientCommand::Ready,
            ClientMessage::GetDzsHelp => ClientCommand::GetDzsHelp,
            ClientMessage::DevSetLoadout { pistol, primary } => ClientCommand::DevSetLoadout { pistol, primary },
            ClientMessage::DevEquipWeapon { weapon } => ClientCommand::DevEquipWeapon { weapon },
            ClientMessage::DevGiveWeapon { weapon } => ClientCommand::DevGiveWeapon { weapon },
            ClientMessage::DevSetGodMode { on } => ClientCommand::DevSetGodMode { on },
            ClientMessage::DevTeleportZombieToPlayer => ClientCommand::DevTeleportZombieToPlayer,
            ClientMessage::DevReloadScripts => ClientCommand::DevReloadScripts,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeDto {
    pub id: u64,
    pub arena: ArenaDto,
    pub obstacles: Vec<ObstacleDto>,
    pub pickups: Vec<PickupDto>,
    pub weapons: Vec<WeaponDto>,
    pub lists: WeaponListsDto,
    pub round: RoundDto,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaDto {
    pub half_size: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponListsDto {
    pub pistols: Vec<&'static str>,
    pub primaries: Vec<&'static str>,
}

impl From<&WelcomeInfo> for WelcomeDto {
    fn from(w: &WelcomeInfo) -> Self {
        Self {
            id: w.player_id,
            arena: ArenaDto {
                half_size: w.arena_half_size,
            },
            obstacles: w.obstacles.iter().map(ObstacleDto::from).collect(),
            pickups: w.pickups.iter().map(PickupDto::from).collect(),
            weapons: weapons::all().iter().map(WeaponDto::from).collect(),
            lists: WeaponListsDto {
                pistols: w.pistols.clone(),
                primaries: w.primaries.clone(),
            },
            round: RoundDto::from(&w.round),
        }
    }
}

/// Client-facing weapon catalog entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponDto {
    pub id: &'static str,
    pub name: &'static str,
    pub slot: &'static str,
    pub damage: f32,
    pub range: f32,
    pub range_drop_off: RangeDropOffDto,
    pub clip_max_ammo: u32,
    pub reserve_max_ammo: u32,
    pub fire_interval_ms: u64,
    pub spread: f32,
    pub pellets: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst: Option<BurstDto>,
    pub reload_ms: u64,
    pub recoil_scale: f32,
    pub model: String,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeDropOffDto {
    pub start: f32,
    pub end: f32,
    pub close_damage: f32,
    pub far_damage: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurstDto {
    pub count: u32,
    pub gap_ms: u64,
}

fn slot_name(slot: SlotKind) -> &'static str {
    match slot {
        SlotKind::Pistol => "pistol",
        SlotKind::Primary => "primary",
    }
}

impl From<&WeaponDef> for WeaponDto {
    fn from(w: &WeaponDef) -> Self {
        Self {
            id: w.id,
            name: w.name,
            slot: slot_name(w.slot),
            damage: w.damage,
            range: w.range,
            range_drop_off: RangeDropOffDto {
                start: w.range_drop_off.start,
                end: w.range_drop_off.end,
                close_damage: w.range_drop_off.close_damage,
                far_damage: w.range_drop_off.far_damage,
            },
            clip_max_ammo: w.clip_max_ammo,
            reserve_max_ammo: w.reserve_max_ammo,
            fire_interval_ms: w.fire_interval_ms,
            spread: w.spread,
            pellets: w.pellets,
            burst: w.burst.map(|b| BurstDto {
                count: b.count,
                gap_ms: b.gap_ms,
            }),
            reload_ms: w.reload_ms,
            recoil_scale: w.recoil_scale,
            model: w.model.clone(),
            price: w.price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObstacleDto {
    pub x: f32,
    pub z: f32,
    pub hx: f32,
    pub hz: f32,
    pub h: f32,
    pub kind: &'static str,
}

impl From<&Obstacle> for ObstacleDto {
    fn from(o: &Obstacle) -> Self {
        Self {
            x: o.x,
            z: o.z,
            hx: o.hx,
            hz: o.hz,
            h: o.h,
            kind: o.kind.name(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupDto {
    pub id: u64,
    pub weapon: &'static str,
    pub x: f32,
    pub z: f32,
}

impl From<&PickupSnapshot> for PickupDto {
    fn from(p: &PickupSnapshot) -> Self {
        Self {
            id: p.id,
            weapon: p.weapon,
            x: p.x,
            z: p.z,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundDto {
    pub wave: u32,
    pub active: bool,
    pub target: u32,
    pub spawned: u32,
    pub killed: u32,
    pub alive: u32,
}

impl From<&RoundSnapshot> for RoundDto {
    fn from(r: &RoundSnapshot) -> Self {
        Self {
            wave: r.wave,
            active: r.phase == RoundPhase::Active,
            target: r.target,
            spawned: r.spawned,
            killed: r.killed,
            alive: r.alive,
        }
    }
}

/// Snapshot of the world sent to clients on the snapshot cadence.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotDto {
    pub tick: u64,
    pub players: Vec<PlayerDto>,
    pub zombies: Vec<ZombieDto>,
    pub pickups: Vec<PickupDto>,
    pub round: RoundDto,
}

impl From<&WorldSnapshot> for SnapshotDto {
    fn from(s: &WorldSnapshot) -> Self {
        Self {
            tick: s.tick,
            players: s.players.iter().map(PlayerDto::from).collect(),
            zombies: s.zombies.iter().map(ZombieDto::from).collect(),
            pickups: s.pickups.iter().map(PickupDto::from).collect(),
            round: RoundDto::from(&s.round),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: u64,
    pub name: String,
    pub x: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub hp: i32,
    pub alive: bool,
    pub cash: i64,
    pub armor: f32,
    pub god_mode: bool,
    pub weapon: Option<&'static str>,
}

impl From<&PlayerSnapshot> for PlayerDto {
    fn from(p: &PlayerSnapshot) -> Self {
        Self {
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
            weapon: p.weapon,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZombieDto {
    pub id: u64,
    pub x: f32,
    pub z: f32,
    pub hp: i32,
    pub max_hp: i32,
}

impl From<&ZombieSnapshot> for ZombieDto {
    fn from(z: &ZombieSnapshot) -> Self {
        Self {
            id: z.id,
            x: z.x,
            z: z.z,
            hp: z.hp,
            max_hp: z.max_hp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AmmoDto {
    pub weapon: &'static str,
    pub clip: u32,
    pub reserve: u32,
}

impl From<&WeaponAmmo> for AmmoDto {
    fn from(a: &WeaponAmmo) -> Self {
        Self {
            weapon: a.weapon,
            clip: a.clip,
            reserve: a.reserve,
        }
    }
}

/// HUD overlay item; `kind` selects which of the shape fields are present.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HudItemDto {
    pub id: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f32>,
    pub x: f32,
    pub y: f32,
    pub color: String,
}

impl From<&HudItem> for HudItemDto {
    fn from(item: &HudItem) -> Self {
        let (kind, text, size, w, h) = match &item.shape {
            HudShape::Text { text, size } => ("text", Some(text.clone()), Some(*size), None, None),
            HudShape::Rect { w, h } => ("rect", None, None, Some(*w), Some(*h)),
        };
        Self {
            id: item.id.clone(),
            kind,
            text,
            size,
            w,
            h,
            x: item.x,
            y: item.y,
            color: item.color.clone(),
        }
    }
}

impl From<&SimEvent> for ServerMessage {
    fn from(event: &SimEvent) -> Self {
        match event {
            SimEvent::Welcome(info) => ServerMessage::Welcome(Box::new(WelcomeDto::from(info.as_ref()))),
            SimEvent::Snapshot(snap) => ServerMessage::Snapshot(SnapshotDto::from(snap)),
            SimEvent::Shot {
                player_id,
                weapon,
                yaw,
                pitch,
                pellets,
            } => ServerMessage::Shot {
                player_id: *player_id,
                weapon: *weapon,
                yaw: *yaw,
                pitch: *pitch,
                pellets: *pellets,
            },
            SimEvent::ZombieHit {
                zombie_id,
                player_id,
                part,
                dmg,
                hp,
            } => ServerMessage::ZombieHit {
                zombie_id: *zombie_id,
                player_id: *player_id,
                part: part.name(),
                dmg: *dmg,
                hp: *hp,
            },
            SimEvent::ZombieDead {
                zombie_id,
                player_id,
                weapon,
            } => ServerMessage::ZombieDead {
                zombie_id: *zombie_id,
                player_id: *player_id,
                weapon: *weapon,
            },
            SimEvent::Reload {
                player_id,
                weapon,
                duration_ms,
            } => ServerMessage::Reload {
                player_id: *player_id,
                weapon: *weapon,
                duration_ms: *duration_ms,
            },
            SimEvent::Loadout {
                player_id,
                pistol,
                primary,
                active,
            } => ServerMessage::Loadout {
                player_id: *player_id,
                pistol: pistol.as_ref().map(AmmoDto::from),
                primary: primary.as_ref().map(AmmoDto::from),
                active: *active,
            },
            SimEvent::Ammo(ammo) => ServerMessage::Ammo(AmmoDto::from(ammo)),
            SimEvent::Bought { item, cash } => ServerMessage::Bought {
                item: item.clone(),
                cash: *cash,
            },
            SimEvent::Toast { text } => ServerMessage::Toast { text: text.clone() },
            SimEvent::Join { player_id, name } => ServerMessage::Join {
                player_id: *player_id,
                name: name.clone(),
            },
            SimEvent::Leave { player_id } => ServerMessage::Leave { player_id: *player_id },
            SimEvent::Round(round) => ServerMessage::Round(RoundDto::from(round)),
            SimEvent::PlayerHit { player_id, dmg, hp } => ServerMessage::PlayerHit {
                player_id: *player_id,
                dmg: *dmg,
                hp: *hp,
            },
            SimEvent::PlayerDown { player_id } => ServerMessage::PlayerDown { player_id: *player_id },
            SimEvent::PlayerDead { wave, prompt } => ServerMessage::PlayerDead {
                wave: *wave,
                prompt: prompt.clone(),
            },
            SimEvent::RestartAck => ServerMessage::RestartAck,
            SimEvent::Hud { items } => ServerMessage::Hud {
                items: items.iter().map(HudItemDto::from).collect(),
            },
            SimEvent::Cash { cash } => ServerMessage::Cash { cash: *cash },
            SimEvent::Obstacles(obstacles) => ServerMessage::Obstacles {
                obstacles: obstacles.iter().map(ObstacleDto::from).collect(),
            },
            SimEvent::DzsHelp { lines } => ServerMessage::DzsHelp { lines: lines.clone() },
        }
    }
}
