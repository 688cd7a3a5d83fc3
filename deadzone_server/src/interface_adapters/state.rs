use crate::domain::events::Recipient;
use crate::use_cases::GameEvent;
use axum::extract::ws::Utf8Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::sync::{broadcast, mpsc, watch};

/// One serialized server message and who should receive it.
#[derive(Debug, Clone)]
pub struct RoutedBytes {
    pub to: Recipient,
    pub bytes: Utf8Bytes,
}

/// Everything the world task emitted in one step, serialized once for all sockets.
pub type RoutedBatch = Arc<Vec<RoutedBytes>>;

pub struct AppState {
    // Inputs flowing from the network into the game loop.
    pub input_tx: mpsc::Sender<GameEvent>,
    // Serialized outbound messages, shared across all connections.
    pub routed_tx: broadcast::Sender<RoutedBatch>,
    // Latest serialized snapshot for lag recovery.
    pub latest_snapshot_tx: watch::Sender<Utf8Bytes>,
    // Connection-scoped player ids; never reused within a process.
    pub next_player_id: AtomicU64,
}
