// Framework bootstrap for the game server runtime.

use crate::domain::Tuning;
use crate::dzs::loader;
use crate::frameworks::config;
use crate::interface_adapters::net::{outbound_serializer, ws_handler};
use crate::interface_adapters::state::{AppState, RoutedBatch};
use crate::use_cases::{Game, GameEvent, GameSettings, OutboundBatch, world_task};

use axum::{Router, extract::ws::Utf8Bytes, routing::get};
use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::{io::Result, sync::Arc};
use tokio::sync::{broadcast, mpsc, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Settings and tuning as read from the environment.
pub fn settings_from_env() -> (GameSettings, Tuning) {
    let settings = GameSettings {
        seed: config::world_seed(),
        tick_interval: config::tick_interval(),
        snapshot_interval: config::snapshot_interval(),
        script_dirs: config::script_dirs(),
        dev_commands: config::dev_commands(),
        ..GameSettings::default()
    };
    let mut tuning = Tuning::default();
    tuning.arena.intermission_ms = config::round_intermission_ms();
    (settings, tuning)
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let (settings, tuning) = settings_from_env();
    run_with_settings(listener, settings, tuning).await
}

pub async fn run_with_settings(listener: tokio::net::TcpListener, settings: GameSettings, tuning: Tuning) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(settings, tuning);

    // Start the Web Server
    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([0, 0, 0, 0], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state(settings: GameSettings, tuning: Tuning) -> Arc<AppState> {
    // input_tx/rx: All client messages go to the single world task.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(config::INPUT_CHANNEL_CAPACITY);
    // outbound_tx/rx: Domain events, one batch per world step.
    let (outbound_tx, outbound_rx) = broadcast::channel::<OutboundBatch>(config::OUTBOUND_BROADCAST_CAPACITY);
    // routed_tx/rx: Serialized messages shared across all connections.
    let (routed_tx, _routed_rx) = broadcast::channel::<RoutedBatch>(config::OUTBOUND_BROADCAST_CAPACITY);
    let (latest_snapshot_tx, _latest_snapshot_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));

    let mut game = Game::new(settings, tuning);
    let scripts = loader::load_dirs(&game.settings().script_dirs);
    game.install_scripts(scripts);
    tracing::info!(
        seed = game.settings().seed,
        handlers = game.scripts().registry().handler_count(),
        dev_commands = game.settings().dev_commands,
        "game initialized"
    );

    // Spawn the world task and the serializer that feeds every socket.
    tokio::spawn(world_task(game, input_rx, outbound_tx));
    tokio::spawn(outbound_serializer(outbound_rx, routed_tx.clone(), latest_snapshot_tx.clone()));

    Arc::new(AppState {
        input_tx,
        routed_tx,
        latest_snapshot_tx,
        next_player_id: AtomicU64::new(1),
    })
}
