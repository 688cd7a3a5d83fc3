// Capability surface scripts can reach. Every method mutates game state immediately and
// reports failure with a sentinel instead of an error.

pub type ScriptPlayerId = u64;

/// Which players a HUD or toast call addresses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    All,
    Player(ScriptPlayerId),
    Radius { x: f32, z: f32, r: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HudText {
    pub id: String,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: String,
    pub ttl_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HudRect {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub color: String,
    pub ttl_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleShape {
    Box,
    Bush,
    Car,
    Bus,
}

impl ObstacleShape {
    pub fn name(self) -> &'static str {
        match self {
            ObstacleShape::Box => "box",
            ObstacleShape::Bush => "bush",
            ObstacleShape::Car => "car",
            ObstacleShape::Bus => "bus",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRequest {
    Obstacle {
        shape: ObstacleShape,
        x: f32,
        z: f32,
        /// Full footprint overrides; presets apply when absent.
        w: Option<f32>,
        d: Option<f32>,
        h: Option<f32>,
        rotated: bool,
    },
    Weapon {
        weapon: String,
        x: f32,
        z: f32,
    },
    Zombie {
        x: f32,
        z: f32,
        hp: Option<i32>,
        speed: Option<f32>,
    },
}

pub trait ScriptHost {
    fn cash(&self, player: ScriptPlayerId) -> Option<i64>;
    fn hp(&self, player: ScriptPlayerId) -> Option<i32>;
    fn add_cash(&mut self, player: ScriptPlayerId, amount: i64) -> bool;
    /// Fails without change when the player cannot afford `amount`.
    fn take_cash(&mut self, player: ScriptPlayerId, amount: i64) -> bool;
    fn set_cash(&mut self, player: ScriptPlayerId, amount: i64) -> bool;

    fn give_weapon(&mut self, player: ScriptPlayerId, weapon: &str) -> bool;
    fn take_weapon(&mut self, player: ScriptPlayerId, weapon: &str) -> bool;
    fn restock(&mut self, player: ScriptPlayerId, weapon: Option<&str>) -> bool;
    fn set_ammo(&mut self, player: ScriptPlayerId, weapon: &str, clip: u32, reserve: u32) -> bool;

    fn teleport(&mut self, player: ScriptPlayerId, x: f32, z: f32) -> bool;
    fn teleport_zombie(&mut self, zombie: u64, x: f32, z: f32) -> bool;
    fn set_god_mode(&mut self, player: ScriptPlayerId, on: bool) -> bool;

    /// Returns how many players received the item.
    fn hud_text(&mut self, target: Target, item: HudText) -> usize;
    fn hud_rect(&mut self, target: Target, item: HudRect) -> usize;
    fn hud_clear(&mut self, target: Target, id: Option<&str>) -> usize;
    fn toast(&mut self, target: Target, text: &str) -> usize;

    /// Returns the new entity id, if anything was spawned.
    fn spawn(&mut self, request: SpawnRequest) -> Option<u64>;

    /// Uniform sample in `[0, 1)` from the simulation's seeded generator.
    fn random(&mut self) -> f64;
}
