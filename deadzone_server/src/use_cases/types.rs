// Use-case level inputs for the game loop.

use crate::domain::events::Outbound;
use crate::domain::PlayerId;
use crate::domain::state::{Aim, MoveKeys};
use std::sync::Arc;

/// Everything one world-task step emitted, shared by reference with the serializer.
pub type OutboundBatch = Arc<Vec<Outbound>>;

/// A decoded client request, already sanitized by the adapter layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Input { yaw: f32, pitch: f32, keys: MoveKeys },
    Shoot { weapon: Option<String>, aim: Option<Aim> },
    Reload { weapon: Option<String> },
    PickPistol { weapon: String },
    PickPrimary { weapon: String },
    Buy { item: String },
    UseMedkit,
    Restart,
    Ready,
    GetDzsHelp,
    DevSetLoadout { pistol: Option<String>, primary: Option<String> },
    DevEquipWeapon { weapon: String },
    DevGiveWeapon { weapon: String },
    DevSetGodMode { on: bool },
    DevTeleportZombieToPlayer,
    DevReloadScripts,
}

impl ClientCommand {
    pub fn is_dev(&self) -> bool {
        matches!(
            self,
            Self::DevSetLoadout { .. }
                | Self::DevEquipWeapon { .. }
                | Self::DevGiveWeapon { .. }
                | Self::DevSetGodMode { .. }
                | Self::DevTeleportZombieToPlayer
                | Self::DevReloadScripts
        )
    }
}

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join { player_id: PlayerId, name: String },
    Leave { player_id: PlayerId },
    Command { player_id: PlayerId, cmd: ClientCommand },
}
