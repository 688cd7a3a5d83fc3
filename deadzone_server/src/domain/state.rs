// Domain-level simulation entities and the single state record the orchestrator owns.

use super::events::{HookEvent, Outbound, Recipient, SimEvent};
use super::tuning::Tuning;
use super::weapons::{self, SlotKind, WeaponDef};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub type PlayerId = u64;
pub type EntityId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aim {
    pub yaw: f32,
    pub pitch: f32,
}

/// Per-equipped-weapon mutable instance.
#[derive(Debug, Clone)]
pub struct WeaponState {
    pub def: &'static WeaponDef,
    pub clip: u32,
    pub reserve: u32,
    /// Reload completes at this sim time when set.
    pub reload_until: Option<u64>,
    pub next_fire_at: u64,
    pub burst_remaining: u32,
    pub next_burst_at: u64,
}

impl WeaponState {
    pub fn fresh(def: &'static WeaponDef) -> Self {
        Self {
            def,
            clip: def.clip_max_ammo,
            reserve: def.reserve_max_ammo,
            reload_until: None,
            next_fire_at: 0,
            burst_remaining: 0,
            next_burst_at: 0,
        }
    }

    pub fn id(&self) -> &'static str {
        self.def.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Perk {
    FastReload,
    Sprint,
}

impl Perk {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fastReload" => Some(Self::FastReload),
            "sprint" => Some(Self::Sprint),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::FastReload => "fastReload",
            Self::Sprint => "sprint",
        }
    }
}

pub const MEDKIT_CAP: u32 = 3;

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub medkits: u32,
    pub perks: BTreeSet<Perk>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HudShape {
    Text { text: String, size: f32 },
    Rect { w: f32, h: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HudItem {
    pub id: String,
    pub shape: HudShape,
    pub x: f32,
    pub y: f32,
    pub color: String,
    pub expires_at: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub hp: i32,
    pub alive: bool,
    pub cash: i64,
    /// Damage reduction in `0.0..=1.0`.
    pub armor: f32,
    pub speed: f32,
    pub pistol: Option<WeaponState>,
    pub primary: Option<WeaponState>,
    pub active_slot: SlotKind,
    pub inventory: Inventory,
    pub next_hit_allowed_at: u64,
    pub respawn_at: Option<u64>,
    pub god_mode: bool,

    // Intent staged by inbound messages (do not serialize to clients)
    pub keys: MoveKeys,
    pub last_aim: Aim,
    pub hud: Vec<HudItem>,
}

impl Player {
    pub fn new(id: PlayerId, name: String, tuning: &Tuning) -> Self {
        Self {
            id,
            name,
            x: tuning.arena.spawn_anchor_x,
            z: tuning.arena.spawn_anchor_z,
            yaw: 0.0,
            pitch: 0.0,
            hp: tuning.player.max_hp,
            alive: true,
            cash: tuning.player.starting_cash,
            armor: 0.0,
            speed: tuning.player.speed,
            pistol: weapons::get(weapons::DEFAULT_PISTOL).map(WeaponState::fresh),
            primary: None,
            active_slot: SlotKind::Pistol,
            inventory: Inventory::default(),
            next_hit_allowed_at: 0,
            respawn_at: None,
            god_mode: false,
            keys: MoveKeys::default(),
            last_aim: Aim::default(),
            hud: Vec::new(),
        }
    }

    pub fn slot(&self, slot: SlotKind) -> Option<&WeaponState> {
        match slot {
            SlotKind::Pistol => self.pistol.as_ref(),
            SlotKind::Primary => self.primary.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: SlotKind) -> &mut Option<WeaponState> {
        match slot {
            SlotKind::Pistol => &mut self.pistol,
            SlotKind::Primary => &mut self.primary,
        }
    }

    /// Slot holding the given weapon id, if any.
    pub fn slot_of(&self, weapon_id: &str) -> Option<SlotKind> {
        [SlotKind::Pistol, SlotKind::Primary]
            .into_iter()
            .find(|s| self.slot(*s).is_some_and(|w| w.id() == weapon_id))
    }

    pub fn weapon_mut(&mut self, weapon_id: &str) -> Option<&mut WeaponState> {
        let slot = self.slot_of(weapon_id)?;
        self.slot_mut(slot).as_mut()
    }

    pub fn active_weapon(&self) -> Option<&WeaponState> {
        self.slot(self.active_slot)
            .or_else(|| self.pistol.as_ref())
            .or_else(|| self.primary.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct Zombie {
    pub id: EntityId,
    pub x: f32,
    pub z: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub speed: f32,
    /// Script-spawned extras do not count toward the wave quota.
    pub wave_member: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Box,
    Bush,
    Car,
    Bus,
}

impl ObstacleKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Bush => "bush",
            Self::Car => "car",
            Self::Bus => "bus",
        }
    }
}

/// Static axis-aligned box on the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub x: f32,
    pub z: f32,
    pub hx: f32,
    pub hz: f32,
    pub h: f32,
    pub kind: ObstacleKind,
}

impl Obstacle {
    /// True when (x, z) lies strictly inside the box grown by `pad` on every side.
    pub fn contains_expanded(&self, x: f32, z: f32, pad: f32) -> bool {
        (x - self.x).abs() < self.hx + pad && (z - self.z).abs() < self.hz + pad
    }
}

#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: EntityId,
    pub weapon: &'static WeaponDef,
    pub x: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    BetweenRounds,
    Active,
}

#[derive(Debug, Clone)]
pub struct RoundState {
    pub wave: u32,
    pub phase: RoundPhase,
    pub target: u32,
    pub spawned: u32,
    pub killed: u32,
    pub spawn_every_ms: u64,
    pub next_spawn_at: u64,
    pub intermission_until: Option<u64>,
}

impl RoundState {
    pub fn first() -> Self {
        Self {
            wave: 1,
            phase: RoundPhase::BetweenRounds,
            target: 0,
            spawned: 0,
            killed: 0,
            spawn_every_ms: 0,
            next_spawn_at: 0,
            intermission_until: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == RoundPhase::Active
    }
}

/// Everything the tick orchestrator mutates, threaded explicitly through every system.
pub struct SimulationState {
    pub tuning: Tuning,
    pub players: BTreeMap<PlayerId, Player>,
    pub zombies: Vec<Zombie>,
    pub obstacles: Vec<Obstacle>,
    pub pickups: Vec<Pickup>,
    pub round: RoundState,
    pub rng: Pcg32,
    pub seed: u64,
    /// Simulation clock in milliseconds.
    pub now_ms: u64,
    pub tick: u64,
    /// Set once `gameStart` has been queued for the current match.
    pub match_started: bool,
    next_entity_id: EntityId,

    // Messages for the adapter layer and events for the script engine.
    pub outbox: Vec<Outbound>,
    pub hooks: VecDeque<HookEvent>,
}

impl SimulationState {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            tuning,
            players: BTreeMap::new(),
            zombies: Vec::new(),
            obstacles: Vec::new(),
            pickups: Vec::new(),
            round: RoundState::first(),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            now_ms: 0,
            tick: 0,
            match_started: false,
            next_entity_id: 1,
            outbox: Vec::new(),
            hooks: VecDeque::new(),
        }
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id = self.next_entity_id.wrapping_add(1);
        id
    }

    pub fn emit(&mut self, to: Recipient, event: SimEvent) {
        self.outbox.push(Outbound { to, event });
    }

    pub fn broadcast(&mut self, event: SimEvent) {
        self.emit(Recipient::All, event);
    }

    pub fn send_to(&mut self, player_id: PlayerId, event: SimEvent) {
        self.emit(Recipient::Player(player_id), event);
    }

    pub fn hook(&mut self, event: HookEvent) {
        self.hooks.push_back(event);
    }

    pub fn zombie_index(&self, id: EntityId) -> Option<usize> {
        self.zombies.iter().position(|z| z.id == id)
    }

    pub fn living_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.alive)
    }
}
