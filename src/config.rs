//! Client configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! One typed struct is built at startup and handed to every component. Values
//! that are absent or unparsable fall back to defaults; only a malformed
//! enumerated value (monitor mode) is a hard error.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.subgquiz.com/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_BOOT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_BOOT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_STORAGE_FILE: &str = "subg-session.json";
pub const DEFAULT_NETWORK_PROBE_URL: &str = "https://clients3.google.com/generate_204";
pub const DEFAULT_NETWORK_PROBE_INTERVAL_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

/// Which connectivity capability the network monitor should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMonitorMode {
    /// Probe the platform; fall back when the probe capability is unavailable.
    Auto,
    /// Always use the deterministic fallback.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Boot-time profile verification retry knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootRetry {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl BootRetry {
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub mode: NetworkMonitorMode,
    pub probe_url: String,
    pub probe_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timeouts: Timeouts,
    pub boot_retry: BootRetry,
    pub storage_path: PathBuf,
    pub network: NetworkConfig,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `SUBG_API_BASE_URL`: default [`DEFAULT_API_BASE_URL`]
    /// - `SUBG_REQUEST_TIMEOUT_SECS`: default 15
    /// - `SUBG_CONNECT_TIMEOUT_SECS`: default 5
    /// - `SUBG_BOOT_RETRY_ATTEMPTS`: default 3 (clamped to at least 1)
    /// - `SUBG_BOOT_RETRY_DELAY_MS`: default 2000
    /// - `SUBG_STORAGE_PATH`: default `subg-session.json` in the working directory
    /// - `SUBG_NETWORK_MONITOR`: `auto` (default) or `fallback`
    /// - `SUBG_NETWORK_PROBE_URL`: HTTP endpoint used for reachability
    /// - `SUBG_NETWORK_PROBE_INTERVAL_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if `SUBG_NETWORK_MONITOR` holds an unknown value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = std::env::var("SUBG_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeouts = Timeouts {
            request_secs: env_parse("SUBG_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("SUBG_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let boot_retry = BootRetry {
            attempts: env_parse("SUBG_BOOT_RETRY_ATTEMPTS", DEFAULT_BOOT_RETRY_ATTEMPTS).max(1),
            delay_ms: env_parse("SUBG_BOOT_RETRY_DELAY_MS", DEFAULT_BOOT_RETRY_DELAY_MS),
        };
        let storage_path = std::env::var("SUBG_STORAGE_PATH")
            .map_or_else(|_| PathBuf::from(DEFAULT_STORAGE_FILE), PathBuf::from);
        let network = NetworkConfig {
            mode: parse_monitor_mode(std::env::var("SUBG_NETWORK_MONITOR").ok().as_deref())?,
            probe_url: std::env::var("SUBG_NETWORK_PROBE_URL").unwrap_or_else(|_| DEFAULT_NETWORK_PROBE_URL.to_string()),
            probe_interval_secs: env_parse("SUBG_NETWORK_PROBE_INTERVAL_SECS", DEFAULT_NETWORK_PROBE_INTERVAL_SECS)
                .max(1),
        };

        Ok(Self { api_base_url, timeouts, boot_retry, storage_path, network })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeouts: Timeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS },
            boot_retry: BootRetry { attempts: DEFAULT_BOOT_RETRY_ATTEMPTS, delay_ms: DEFAULT_BOOT_RETRY_DELAY_MS },
            storage_path: PathBuf::from(DEFAULT_STORAGE_FILE),
            network: NetworkConfig {
                mode: NetworkMonitorMode::Auto,
                probe_url: DEFAULT_NETWORK_PROBE_URL.to_string(),
                probe_interval_secs: DEFAULT_NETWORK_PROBE_INTERVAL_SECS,
            },
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_monitor_mode(raw: Option<&str>) -> Result<NetworkMonitorMode, ConfigError> {
    match raw.unwrap_or("auto") {
        "auto" => Ok(NetworkMonitorMode::Auto),
        "fallback" | "mock" => Ok(NetworkMonitorMode::Fallback),
        other => Err(ConfigError::Parse(format!(
            "unsupported SUBG_NETWORK_MONITOR '{other}' (expected 'auto' or 'fallback')"
        ))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
