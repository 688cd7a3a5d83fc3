// Shared one-time server bootstrap and socket helpers for integration tests.
use deadzone_server::domain::Tuning;
use deadzone_server::use_cases::GameSettings;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Base URL published once the server thread has bound its port.
static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

pub const GREETING_SCRIPT: &str = "on playerSpawn {\n  toast(\"welcome\")\n}\n";

fn script_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("deadzone-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create script dir");
    std::fs::write(dir.join("greeting.dzs"), GREETING_SCRIPT).expect("write script");
    dir
}

/// Starts the server once per test binary and returns its `ws://` base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // A dedicated OS thread keeps the server alive across `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let settings = GameSettings {
                    seed: 7,
                    tick_interval: Duration::from_millis(20),
                    snapshot_interval: Duration::from_millis(100),
                    script_dirs: vec![script_dir()],
                    dev_commands: true,
                    ..GameSettings::default()
                };
                let _ = published_url_thread.set(format!("ws://{addr}"));
                deadzone_server::run_with_settings(listener, settings, Tuning::default())
                    .await
                    .expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };
    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("ws://")
        .expect("base url should use ws://");
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server did not become ready in time");
}

pub async fn connect(name: &str) -> Socket {
    let url = format!("{}/ws?name={name}", ensure_server());
    let (socket, _response) = connect_async(url).await.expect("websocket connect");
    socket
}

pub async fn send(socket: &mut Socket, msg: Value) {
    socket
        .send(Message::Text(msg.to_string().into()))
        .await
        .expect("send message");
}

/// Reads until a message with the given `type` arrives, skipping everything else.
pub async fn recv_type(socket: &mut Socket, ty: &str) -> Value {
    let wait = async {
        loop {
            let frame = socket
                .next()
                .await
                .expect("socket open")
                .expect("websocket frame");
            let Message::Text(text) = frame else {
                continue;
            };
            let msg: Value = serde_json::from_str(text.as_str()).expect("server sends json");
            if msg["type"] == ty {
                return msg;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for `{ty}`"))
}
