use super::*;
use crate::config::{NetworkMonitorMode, Timeouts};
use crate::network::fallback::FallbackConnectivity;
use crate::notify::TracingNotifier;
use crate::storage::MemoryStore;

fn session_store() -> SessionStore {
    let api = HttpApi::new("http://127.0.0.1:9/api", Timeouts { request_secs: 1, connect_secs: 1 }).unwrap();
    SessionStore::new(Arc::new(api), Arc::new(MemoryStore::new()), Arc::new(TracingNotifier), RetryPolicy::none())
}

#[test]
fn empty_context_reports_missing_providers() {
    let context = AppContext::default();
    assert_eq!(context.session().err(), Some(ContextError::MissingProvider { capability: "session" }));
    assert_eq!(context.network().err(), Some(ContextError::MissingProvider { capability: "network" }));
}

#[test]
fn missing_provider_message_names_capability() {
    let err = ContextError::MissingProvider { capability: "session" };
    assert_eq!(err.to_string(), "session must be used within a context that provides it");
}

#[tokio::test]
async fn builder_installs_capabilities() {
    let network = NetworkMonitor::start(Arc::new(FallbackConnectivity), Arc::new(TracingNotifier)).await;
    let context = AppContext::builder().session(session_store()).network(network).build();

    assert!(context.session().unwrap().is_loading());
    assert!(context.network().unwrap().is_network_available());
}

#[tokio::test]
async fn partial_context_only_serves_what_was_installed() {
    let context = AppContext::builder().session(session_store()).build();
    assert!(context.session().is_ok());
    assert!(context.network().is_err());
}

#[tokio::test]
async fn from_config_wires_fallback_stack() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::default();
    config.api_base_url = "http://127.0.0.1:9/api".into();
    config.storage_path = dir.path().join("session.json");
    config.network.mode = NetworkMonitorMode::Fallback;

    let context = AppContext::from_config(&config, Arc::new(TracingNotifier)).await.unwrap();
    let network = context.network().unwrap();
    assert_eq!(network.provider_name(), "fallback");
    assert!(network.is_network_available());
    assert!(!context.session().unwrap().is_authenticated());

    context.shutdown();
}

#[tokio::test]
async fn clones_share_state() {
    let context = AppContext::builder().session(session_store()).build();
    let clone = context.clone();

    context.session().unwrap().check_auth_status().await;
    assert!(!clone.session().unwrap().is_loading());
}
