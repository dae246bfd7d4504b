use super::*;

use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_guard() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// # Safety
/// Callers must hold [`env_guard`] so env mutation is not concurrent.
unsafe fn clear_subg_env() {
    unsafe {
        std::env::remove_var("SUBG_API_BASE_URL");
        std::env::remove_var("SUBG_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("SUBG_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("SUBG_BOOT_RETRY_ATTEMPTS");
        std::env::remove_var("SUBG_BOOT_RETRY_DELAY_MS");
        std::env::remove_var("SUBG_STORAGE_PATH");
        std::env::remove_var("SUBG_NETWORK_MONITOR");
        std::env::remove_var("SUBG_NETWORK_PROBE_URL");
        std::env::remove_var("SUBG_NETWORK_PROBE_INTERVAL_SECS");
    }
}

#[test]
fn from_env_uses_defaults() {
    let _guard = env_guard();
    unsafe { clear_subg_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.boot_retry.delay(), Duration::from_millis(DEFAULT_BOOT_RETRY_DELAY_MS));
}

#[test]
fn from_env_parses_overrides() {
    let _guard = env_guard();
    unsafe {
        clear_subg_env();
        std::env::set_var("SUBG_API_BASE_URL", "http://localhost:5000/api/");
        std::env::set_var("SUBG_REQUEST_TIMEOUT_SECS", "30");
        std::env::set_var("SUBG_CONNECT_TIMEOUT_SECS", "3");
        std::env::set_var("SUBG_BOOT_RETRY_ATTEMPTS", "5");
        std::env::set_var("SUBG_BOOT_RETRY_DELAY_MS", "250");
        std::env::set_var("SUBG_STORAGE_PATH", "/tmp/subg.json");
        std::env::set_var("SUBG_NETWORK_MONITOR", "fallback");
        std::env::set_var("SUBG_NETWORK_PROBE_URL", "http://probe.test/");
        std::env::set_var("SUBG_NETWORK_PROBE_INTERVAL_SECS", "2");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, "http://localhost:5000/api");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 30, connect_secs: 3 });
    assert_eq!(cfg.boot_retry, BootRetry { attempts: 5, delay_ms: 250 });
    assert_eq!(cfg.storage_path, PathBuf::from("/tmp/subg.json"));
    assert_eq!(cfg.network.mode, NetworkMonitorMode::Fallback);
    assert_eq!(cfg.network.probe_url, "http://probe.test/");
    assert_eq!(cfg.network.probe_interval_secs, 2);

    unsafe { clear_subg_env() };
}

#[test]
fn from_env_invalid_numbers_fall_back_to_defaults() {
    let _guard = env_guard();
    unsafe {
        clear_subg_env();
        std::env::set_var("SUBG_REQUEST_TIMEOUT_SECS", "soon");
        std::env::set_var("SUBG_BOOT_RETRY_ATTEMPTS", "-1");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert_eq!(cfg.boot_retry.attempts, DEFAULT_BOOT_RETRY_ATTEMPTS);

    unsafe { clear_subg_env() };
}

#[test]
fn from_env_zero_attempts_clamped_to_one() {
    let _guard = env_guard();
    unsafe {
        clear_subg_env();
        std::env::set_var("SUBG_BOOT_RETRY_ATTEMPTS", "0");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.boot_retry.attempts, 1);

    unsafe { clear_subg_env() };
}

#[test]
fn from_env_unknown_monitor_mode_errors() {
    let _guard = env_guard();
    unsafe {
        clear_subg_env();
        std::env::set_var("SUBG_NETWORK_MONITOR", "carrier-pigeon");
    }

    let err = ClientConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("unsupported SUBG_NETWORK_MONITOR"));

    unsafe { clear_subg_env() };
}

#[test]
fn parse_monitor_mode_accepts_mock_alias() {
    assert_eq!(parse_monitor_mode(Some("mock")).unwrap(), NetworkMonitorMode::Fallback);
    assert_eq!(parse_monitor_mode(None).unwrap(), NetworkMonitorMode::Auto);
}
