//! Application context.
//!
//! DESIGN
//! ======
//! `AppContext` is built once at startup and cloned into every consumer. Each
//! capability is optional at construction time; asking for one that was never
//! installed is an error rather than a silent default, so wiring mistakes show
//! up at the first call site.

use std::sync::Arc;

use crate::api::HttpApi;
use crate::config::ClientConfig;
use crate::network::{self, NetworkMonitor};
use crate::notify::Notifier;
use crate::retry::RetryPolicy;
use crate::session::SessionStore;
use crate::storage::FileStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("{capability} must be used within a context that provides it")]
    MissingProvider { capability: &'static str },
    #[error("context build failed: {0}")]
    Build(String),
}

/// Shared handles to the session store and network monitor.
#[derive(Clone, Default)]
pub struct AppContext {
    session: Option<SessionStore>,
    network: Option<NetworkMonitor>,
}

impl AppContext {
    #[must_use]
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }

    /// Wire the production stack from `config`: HTTP gateway, file storage,
    /// session store and a started network monitor.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Build`] if the HTTP client cannot be built.
    pub async fn from_config(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ContextError> {
        let api = HttpApi::new(&config.api_base_url, config.timeouts).map_err(|e| ContextError::Build(e.to_string()))?;
        let storage = FileStore::new(config.storage_path.clone());
        let session = SessionStore::new(
            Arc::new(api),
            Arc::new(storage),
            Arc::clone(&notifier),
            RetryPolicy::from(config.boot_retry),
        );
        let provider = network::select_connectivity(&config.network);
        let network = NetworkMonitor::start(provider, notifier).await;

        Ok(Self::builder().session(session).network(network).build())
    }

    /// # Errors
    ///
    /// Returns [`ContextError::MissingProvider`] when no session store was installed.
    pub fn session(&self) -> Result<&SessionStore, ContextError> {
        self.session.as_ref().ok_or(ContextError::MissingProvider { capability: "session" })
    }

    /// # Errors
    ///
    /// Returns [`ContextError::MissingProvider`] when no network monitor was installed.
    pub fn network(&self) -> Result<&NetworkMonitor, ContextError> {
        self.network.as_ref().ok_or(ContextError::MissingProvider { capability: "network" })
    }

    /// Stop both components. Late results are ignored afterwards.
    pub fn shutdown(&self) {
        if let Some(session) = &self.session {
            session.shutdown();
        }
        if let Some(network) = &self.network {
            network.shutdown();
        }
    }
}

#[derive(Default)]
pub struct AppContextBuilder {
    session: Option<SessionStore>,
    network: Option<NetworkMonitor>,
}

impl AppContextBuilder {
    #[must_use]
    pub fn session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn network(mut self, network: NetworkMonitor) -> Self {
        self.network = Some(network);
        self
    }

    #[must_use]
    pub fn build(self) -> AppContext {
        AppContext { session: self.session, network: self.network }
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
