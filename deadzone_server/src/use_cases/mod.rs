// Use cases layer: application workflows for the game server.

pub mod game;
pub mod script_host;
pub mod types;

pub use game::{Game, GameSettings, world_task};
pub use types::{ClientCommand, GameEvent, OutboundBatch};
