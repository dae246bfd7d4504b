//! Deterministic stand-in used when no real connectivity capability exists.
//!
//! Reports a connected, reachable link and never pushes events, so screens
//! that gate on availability keep working.

use super::platform::{ConnectionType, ConnectivityListener, ConnectivityProvider, ConnectivityState, NetworkError, Subscription};

#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackConnectivity;

#[async_trait::async_trait]
impl ConnectivityProvider for FallbackConnectivity {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn fetch(&self) -> Result<ConnectivityState, NetworkError> {
        Ok(ConnectivityState::online(ConnectionType::Unknown))
    }

    fn add_listener(&self, _listener: ConnectivityListener) -> Subscription {
        Subscription::noop()
    }
}
