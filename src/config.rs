//! Server configuration from environment variables

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND: &str = "0.0.0.0:4680";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Directory the screens are served from
    pub static_dir: PathBuf,
    /// Where to persist snapshots (None = in-memory only)
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 4680))),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            snapshot_path: None,
            snapshot_interval: Duration::from_secs(DEFAULT_SNAPSHOT_INTERVAL_SECS),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ServerConfig {
    /// Load config from environment variables, falling back to defaults
    /// (with a warning) when a value doesn't parse
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind = match env_var("HOTSHOT_BIND") {
            Some(raw) => raw.parse::<SocketAddr>().unwrap_or_else(|e| {
                tracing::warn!("Invalid HOTSHOT_BIND '{}': {}, using {}", raw, e, defaults.bind);
                defaults.bind
            }),
            None => defaults.bind,
        };

        let static_dir = env_var("HOTSHOT_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let snapshot_path = env_var("HOTSHOT_SNAPSHOT_PATH").map(PathBuf::from);

        let snapshot_interval = match env_var("HOTSHOT_SNAPSHOT_INTERVAL_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(
                        "Invalid HOTSHOT_SNAPSHOT_INTERVAL_SECS '{}', using {}s",
                        raw,
                        DEFAULT_SNAPSHOT_INTERVAL_SECS
                    );
                    defaults.snapshot_interval
                }
            },
            None => defaults.snapshot_interval,
        };

        if snapshot_path.is_none() {
            tracing::warn!("HOTSHOT_SNAPSHOT_PATH not set - rooms and votes live in memory only");
        }

        Self {
            bind,
            static_dir,
            snapshot_path,
            snapshot_interval,
        }
    }
}
