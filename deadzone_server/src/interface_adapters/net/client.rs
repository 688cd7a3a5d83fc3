use crate::interface_adapters::protocol::ClientMessage;
use crate::interface_adapters::state::{AppState, RoutedBatch};
use crate::use_cases::{ClientCommand, GameEvent};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    f32::consts::FRAC_PI_2,
    sync::{Arc, atomic::Ordering},
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, info, info_span, warn};

// Categorizes connection lifecycle failures so callers can decide policy.
#[derive(Debug, thiserror::Error)]
enum NetError {
    #[error("websocket: {0}")]
    Ws(#[from] axum::Error),
    #[error("world input channel closed")]
    InputClosed,
    #[error("outbound broadcast closed")]
    OutboundClosed,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ConnectQuery {
    // Display name shown to other players.
    #[serde(default)]
    name: Option<String>,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_NAME_LEN: usize = 24;
const MAX_ID_LEN: usize = 32;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    let player_id = state.next_player_id.fetch_add(1, Ordering::Relaxed);
    let name = display_name(query.name.as_deref(), player_id);
    ws.on_upgrade(move |socket| handle_socket(socket, state, player_id, name).instrument(info_span!("conn", player_id)))
}

fn display_name(requested: Option<&str>, player_id: u64) -> String {
    let cleaned: String = requested
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        format!("Player {player_id}")
    } else {
        cleaned.to_string()
    }
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, player_id: u64, name: String) {
    // Subscribe to updates *before* joining so the welcome is not missed.
    let routed_rx = state.routed_tx.subscribe();
    let latest_snapshot_rx = state.latest_snapshot_tx.subscribe();

    if state
        .input_tx
        .send(GameEvent::Join {
            player_id,
            name: name.clone(),
        })
        .await
        .is_err()
    {
        warn!("world task unavailable; refusing connection");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::ERROR,
                reason: "server unavailable".into(),
            })))
            .await;
        return;
    }
    info!(player_id, %name, "client connected");

    let now = Instant::now() - LOG_THROTTLE;
    let mut ctx = ConnCtx {
        player_id,
        input_tx: state.input_tx.clone(),
        routed_rx,
        latest_snapshot_rx,
        lag_recovery_count: 0,
        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,
        invalid_json: 0,
        last_input_full_log: now,
        last_lag_log: now,
        last_invalid_input_log: now,
        close_frame: None,
    };

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = %e, "client loop exited with error");
    }
}

struct ConnCtx {
    pub player_id: u64,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub routed_rx: broadcast::Receiver<RoutedBatch>,
    pub latest_snapshot_rx: watch::Receiver<Utf8Bytes>,
    // Count lag recovery snapshots sent to this client.
    pub lag_recovery_count: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_input_full_log: Instant,
    pub last_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn clean_id(id: String) -> Option<String> {
    let id = id.trim();
    (!id.is_empty() && id.len() <= MAX_ID_LEN).then(|| id.to_string())
}

/// Rejects non-finite angles and oversized identifiers; clamps pitch to straight up/down.
fn sanitize_command(cmd: ClientCommand) -> Option<ClientCommand> {
    Some(match cmd {
        ClientCommand::Input { yaw, pitch, keys } => {
            if !yaw.is_finite() || !pitch.is_finite() {
                return None;
            }
            ClientCommand::Input {
                yaw,
                pitch: pitch.clamp(-FRAC_PI_2, FRAC_PI_2),
                keys,
            }
        }
        ClientCommand::Shoot { weapon, aim } => {
            if aim.is_some_and(|a| !a.yaw.is_finite() || !a.pitch.is_finite()) {
                return None;
            }
            let weapon = match weapon {
                Some(w) => Some(clean_id(w)?),
                None => None,
            };
            ClientCommand::Shoot { weapon, aim }
        }
        ClientCommand::Reload { weapon: Some(w) } => ClientCommand::Reload {
            weapon: Some(clean_id(w)?),
        },
        ClientCommand::PickPistol { weapon } => ClientCommand::PickPistol {
            weapon: clean_id(weapon)?,
        },
        ClientCommand::PickPrimary { weapon } => ClientCommand::PickPrimary {
            weapon: clean_id(weapon)?,
        },
        ClientCommand::Buy { item } => ClientCommand::Buy { item: clean_id(item)? },
        ClientCommand::DevEquipWeapon { weapon } => ClientCommand::DevEquipWeapon {
            weapon: clean_id(weapon)?,
        },
        ClientCommand::DevGiveWeapon { weapon } => ClientCommand::DevGiveWeapon {
            weapon: clean_id(weapon)?,
        },
        other => other,
    })
}

// Movement intent is lossy by nature; everything else waits for channel space.
async fn forward_command(
    player_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    cmd: ClientCommand,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    let Some(cmd) = sanitize_command(cmd) else {
        if should_log(last_invalid_input_log) {
            warn!(player_id, "invalid command values; dropping");
        }
        return Ok(LoopControl::Continue);
    };

    let event = GameEvent::Command { player_id, cmd };
    if matches!(event, GameEvent::Command { cmd: ClientCommand::Input { .. }, .. }) {
        return match input_tx.try_send(event) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(mpsc::error::TrySendError::Full(_evt)) => {
                if should_log(last_input_full_log) {
                    warn!(player_id, "input channel full; dropping input");
                }
                Ok(LoopControl::Continue)
            }
            Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
        };
    }
    input_tx
        .send(event)
        .await
        .map_err(|_| NetError::InputClosed)?;
    Ok(LoopControl::Continue)
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        input_tx,
        routed_rx,
        latest_snapshot_rx,
        lag_recovery_count,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_input_full_log,
        last_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing routed messages
            batch = routed_rx.recv() => {
                match batch {
                    Ok(batch) => match forward_batch(&batch, player_id, socket, msgs_out, bytes_out).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_lag_log) {
                            warn!(missed = n, "outbound messages lagged; sending snapshot");
                        }

                        // Resync strategy: send the latest world snapshot.
                        let latest = latest_snapshot_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            *lag_recovery_count += 1;
                            match forward_bytes(latest, socket, msgs_out, bytes_out).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::OutboundClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = %err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(
        player_id,
        input_tx,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_json,
        *lag_recovery_count,
    )
    .await
    {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => {
                        forward_command(
                            player_id,
                            input_tx,
                            msg.into(),
                            last_input_full_log,
                            last_invalid_input_log,
                        )
                        .await
                    }
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_batch(
    batch: &RoutedBatch,
    player_id: u64,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    for routed in batch.iter().filter(|r| r.to.includes(player_id)) {
        if let LoopControl::Disconnect = forward_bytes(routed.bytes.clone(), socket, msgs_out, bytes_out).await {
            return LoopControl::Disconnect;
        }
    }
    LoopControl::Continue
}

async fn forward_bytes(
    bytes: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = bytes.len();
    match socket.send(Message::Text(bytes)).await.map_err(NetError::Ws) {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = %err, "failed to send server message");
            LoopControl::Disconnect
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    player_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    lag_recovery_count: u64,
) -> Result<(), NetError> {
    input_tx
        .send(GameEvent::Leave { player_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    debug!(
        player_id,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        lag_recovery_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{Aim, MoveKeys};

    #[test]
    fn ws_errors_carry_the_transport_cause() {
        let err = NetError::from(axum::Error::new("connection reset"));
        assert_eq!(err.to_string(), "websocket: connection reset");
        assert_eq!(NetError::InputClosed.to_string(), "world input channel closed");
    }

    #[test]
    fn names_are_trimmed_and_defaulted() {
        assert_eq!(display_name(Some("  Ana  "), 3), "Ana");
        assert_eq!(display_name(Some("\u{7}"), 3), "Player 3");
        assert_eq!(display_name(None, 9), "Player 9");
        assert_eq!(display_name(Some(&"x".repeat(100)), 1).len(), MAX_NAME_LEN);
    }

    #[test]
    fn sanitize_drops_non_finite_angles() {
        let bad = ClientCommand::Input {
            yaw: f32::NAN,
            pitch: 0.0,
            keys: MoveKeys::default(),
        };
        assert!(sanitize_command(bad).is_none());

        let steep = ClientCommand::Input {
            yaw: 0.0,
            pitch: 9.0,
            keys: MoveKeys::default(),
        };
        assert!(matches!(
            sanitize_command(steep),
            Some(ClientCommand::Input { pitch, .. }) if pitch == FRAC_PI_2
        ));

        let shot = ClientCommand::Shoot {
            weapon: None,
            aim: Some(Aim {
                yaw: f32::INFINITY,
                pitch: 0.0,
            }),
        };
        assert!(sanitize_command(shot).is_none());
    }

    #[test]
    fn sanitize_rejects_blank_ids() {
        assert!(sanitize_command(ClientCommand::Buy { item: "   ".into() }).is_none());
        assert_eq!(
            sanitize_command(ClientCommand::Buy { item: " medkit ".into() }),
            Some(ClientCommand::Buy { item: "medkit".into() })
        );
        assert_eq!(sanitize_command(ClientCommand::Ready), Some(ClientCommand::Ready));
    }
}
