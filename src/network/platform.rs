//! Platform connectivity capability.
//!
//! The monitor talks to this trait only. Concrete providers are chosen once
//! at startup (see [`super::select_connectivity`]), so callers see the same
//! contract whether the real probe or the fallback is behind it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Callback invoked with every pushed connectivity state.
pub type ConnectivityListener = Arc<dyn Fn(ConnectivityState) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The capability cannot be used on this device/configuration.
    #[error("connectivity capability unavailable: {0}")]
    Unavailable(String),
    /// A one-shot probe failed to produce a state.
    #[error("connectivity probe failed: {0}")]
    Probe(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Wifi,
    Cellular,
    Ethernet,
    Other,
    None,
    #[default]
    Unknown,
}

impl ConnectionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wifi => "wifi",
            Self::Cellular => "cellular",
            Self::Ethernet => "ethernet",
            Self::Other => "other",
            Self::None => "none",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw state reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityState {
    pub is_connected: bool,
    /// `None` while the provider cannot tell.
    pub is_internet_reachable: Option<bool>,
    pub connection_type: ConnectionType,
}

impl ConnectivityState {
    #[must_use]
    pub fn online(connection_type: ConnectionType) -> Self {
        Self { is_connected: true, is_internet_reachable: Some(true), connection_type }
    }

    #[must_use]
    pub fn offline() -> Self {
        Self { is_connected: false, is_internet_reachable: Some(false), connection_type: ConnectionType::None }
    }
}

#[async_trait::async_trait]
pub trait ConnectivityProvider: Send + Sync {
    /// Short provider label for logs.
    fn name(&self) -> &'static str;

    /// One-shot probe of the current state.
    async fn fetch(&self) -> Result<ConnectivityState, NetworkError>;

    /// Register `listener` for pushed changes. Dropping the returned handle
    /// releases the listener.
    fn add_listener(&self, listener: ConnectivityListener) -> Subscription;
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Listener registration. The release hook runs exactly once: on
/// [`Subscription::unsubscribe`] or on drop, whichever comes first.
#[must_use = "dropping a Subscription releases the listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }

    /// Handle with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}

#[cfg(test)]
#[path = "platform_test.rs"]
mod tests;
