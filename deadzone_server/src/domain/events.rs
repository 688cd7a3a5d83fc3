// Domain-level outbound events and script hook occurrences.
//
// The adapter layer turns `SimEvent`s into wire DTOs; the orchestrator feeds
// `HookEvent`s to the script engine.

use super::state::{EntityId, HudItem, Obstacle, PlayerId, RoundPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    All,
    Player(PlayerId),
    AllExcept(PlayerId),
}

impl Recipient {
    pub fn includes(&self, player_id: PlayerId) -> bool {
        match self {
            Recipient::All => true,
            Recipient::Player(id) => *id == player_id,
            Recipient::AllExcept(id) => *id != player_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outbound {
    pub to: Recipient,
    pub event: SimEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    Head,
}

impl HitPart {
    pub fn name(self) -> &'static str {
        match self {
            HitPart::Body => "body",
            HitPart::Head => "head",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
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

#[derive(Debug, Clone)]
pub struct ZombieSnapshot {
    pub id: EntityId,
    pub x: f32,
    pub z: f32,
    pub hp: i32,
    pub max_hp: i32,
}

#[derive(Debug, Clone)]
pub struct PickupSnapshot {
    pub id: EntityId,
    pub weapon: &'static str,
    pub x: f32,
    pub z: f32,
}

#[derive(Debug, Clone)]
pub struct RoundSnapshot {
    pub wave: u32,
    pub phase: RoundPhase,
    pub target: u32,
    pub spawned: u32,
    pub killed: u32,
    pub alive: u32,
}

#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub players: Vec<PlayerSnapshot>,
    pub zombies: Vec<ZombieSnapshot>,
    pub pickups: Vec<PickupSnapshot>,
    pub round: RoundSnapshot,
}

#[derive(Debug, Clone)]
pub struct WelcomeInfo {
    pub player_id: PlayerId,
    pub arena_half_size: f32,
    pub obstacles: Vec<Obstacle>,
    pub pickups: Vec<PickupSnapshot>,
    pub pistols: Vec<&'static str>,
    pub primaries: Vec<&'static str>,
    pub round: RoundSnapshot,
}

#[derive(Debug, Clone)]
pub struct WeaponAmmo {
    pub weapon: &'static str,
    pub clip: u32,
    pub reserve: u32,
}

#[derive(Debug, Clone)]
pub enum SimEvent {
    Welcome(Box<WelcomeInfo>),
    Snapshot(WorldSnapshot),
    Shot {
        player_id: PlayerId,
        weapon: &'static str,
        yaw: f32,
        pitch: f32,
        pellets: u32,
    },
    ZombieHit {
        zombie_id: EntityId,
        player_id: PlayerId,
        part: HitPart,
        dmg: i32,
        hp: i32,
    },
    ZombieDead {
        zombie_id: EntityId,
        player_id: PlayerId,
        weapon: &'static str,
    },
    Reload {
        player_id: PlayerId,
        weapon: &'static str,
        duration_ms: u64,
    },
    Loadout {
        player_id: PlayerId,
        pistol: Option<WeaponAmmo>,
        primary: Option<WeaponAmmo>,
        active: Option<&'static str>,
    },
    Ammo(WeaponAmmo),
    Bought {
        item: String,
        cash: i64,
    },
    Toast {
        text: String,
    },
    Join {
        player_id: PlayerId,
        name: String,
    },
    Leave {
        player_id: PlayerId,
    },
    Round(RoundSnapshot),
    PlayerHit {
        player_id: PlayerId,
        dmg: i32,
        hp: i32,
    },
    PlayerDown {
        player_id: PlayerId,
    },
    PlayerDead {
        wave: u32,
        prompt: String,
    },
    RestartAck,
    Hud {
        items: Vec<HudItem>,
    },
    Cash {
        cash: i64,
    },
    Obstacles(Vec<Obstacle>),
    DzsHelp {
        lines: Vec<String>,
    },
}

/// One resolved pellet hit, as seen by the economy and the script engine.
#[derive(Debug, Clone)]
pub struct HitReport {
    pub player_id: PlayerId,
    pub zombie_id: EntityId,
    pub weapon: &'static str,
    pub part: HitPart,
    pub dmg: i32,
    pub dist: f32,
    pub killed: bool,
    pub zombie_hp: i32,
    pub zombie_x: f32,
    pub zombie_z: f32,
}

/// Gameplay occurrences scripts can hook.
#[derive(Debug, Clone)]
pub enum HookEvent {
    Damage(HitReport),
    Kill(HitReport),
    PlayerSpawn { player_id: PlayerId },
    PlayerDeath { player_id: PlayerId },
    GameStart,
    WaveStart { wave: u32 },
    WaveEnd { wave: u32 },
}
