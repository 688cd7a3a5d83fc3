use std::{env, path::PathBuf, str::FromStr, time::Duration};

// Runtime/server constants (not gameplay tuning).

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub fn http_port() -> u16 {
    env_or("GAME_SERVER_PORT", 3001)
}

pub fn tick_interval() -> Duration {
    let hz: u64 = env_or("TICK_HZ", 20);
    Duration::from_millis(1000 / hz.clamp(1, 120))
}

pub fn snapshot_interval() -> Duration {
    Duration::from_millis(env_or("SNAPSHOT_INTERVAL_MS", 100))
}

pub fn world_seed() -> u64 {
    env_or("WORLD_SEED", 1337)
}

/// Directories scanned for `.dzs` files, relative to the working directory.
pub fn script_dirs() -> Vec<PathBuf> {
    let raw = env::var("DZS_DIRS").unwrap_or_else(|_| "scripts,dzs,data/scripts".to_string());
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

pub fn dev_commands() -> bool {
    match env::var("DEV_COMMANDS") {
        Ok(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"),
        Err(_) => true,
    }
}

/// Delay before the next wave auto-starts; zero waits for a `ready` message.
pub fn round_intermission_ms() -> u64 {
    env_or("ROUND_INTERMISSION_MS", 0)
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_BROADCAST_CAPACITY: usize = 256;
