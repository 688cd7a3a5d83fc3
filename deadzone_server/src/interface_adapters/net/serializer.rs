use crate::domain::events::Outbound;
use crate::interface_adapters::protocol::ServerMessage;
use crate::interface_adapters::state::{RoutedBatch, RoutedBytes};
use crate::use_cases::OutboundBatch;

use axum::extract::ws::Utf8Bytes;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{error, warn};

/// Serializes one world-task batch. Returns the routed messages plus the newest
/// snapshot bytes, if the batch carried one.
pub fn serialize_batch(batch: &[Outbound]) -> (Vec<RoutedBytes>, Option<Utf8Bytes>) {
    let mut routed = Vec::with_capacity(batch.len());
    let mut latest_snapshot = None;
    for out in batch {
        let msg = ServerMessage::from(&out.event);
        let txt = match serde_json::to_string(&msg) {
            Ok(txt) => txt,
            Err(e) => {
                error!(error = ?e, "failed to serialize server message");
                continue;
            }
        };
        let bytes = Utf8Bytes::from(txt);
        if msg.is_snapshot() {
            latest_snapshot = Some(bytes.clone());
        }
        routed.push(RoutedBytes { to: out.to, bytes });
    }
    (routed, latest_snapshot)
}

pub async fn outbound_serializer(
    mut outbound_rx: broadcast::Receiver<OutboundBatch>,
    routed_tx: broadcast::Sender<RoutedBatch>,
    latest_snapshot_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each batch once and broadcast the shared bytes.
    loop {
        match outbound_rx.recv().await {
            Ok(batch) => {
                let (routed, snapshot) = serialize_batch(&batch);
                if let Some(bytes) = snapshot {
                    let _ = latest_snapshot_tx.send(bytes);
                }
                if !routed.is_empty() {
                    let _ = routed_tx.send(Arc::new(routed));
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "outbound serializer lagged; skipping to latest batch");
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("outbound channel closed; serializer exiting");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{Recipient, RoundSnapshot, SimEvent, WorldSnapshot};
    use crate::domain::state::RoundPhase;

    #[test]
    fn keeps_routing_and_tracks_snapshot() {
        let snapshot = SimEvent::Snapshot(WorldSnapshot {
            tick: 3,
            players: Vec::new(),
            zombies: Vec::new(),
            pickups: Vec::new(),
            round: RoundSnapshot {
                wave: 1,
                phase: RoundPhase::BetweenRounds,
                target: 0,
                spawned: 0,
                killed: 0,
                alive: 0,
            },
        });
        let batch = vec![
            Outbound {
                to: Recipient::Player(2),
                event: SimEvent::Cash { cash: 5 },
            },
            Outbound {
                to: Recipient::All,
                event: snapshot,
            },
        ];
        let (routed, latest) = serialize_batch(&batch);
        assert_eq!(routed.len(), 2);
        assert_eq!(routed[0].to, Recipient::Player(2));
        assert_eq!(routed[0].bytes.as_str(), r#"{"type":"cash","data":{"cash":5}}"#);
        let latest = latest.expect("snapshot captured");
        assert!(latest.as_str().starts_with(r#"{"type":"snapshot""#));
    }
}
