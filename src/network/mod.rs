//! Network monitor — connectivity tri-state and change notices.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs independently of the session store. Screens consult
//! `is_network_available()` before issuing API calls; the monitor never gates
//! the store's own requests.
//!
//! DESIGN
//! ======
//! The provider pushes raw states through a listener; `start` also runs one
//! initial probe. Both paths go through `apply`, which replaces every field at
//! once under `apply_lock`, so the published state is always the most recent
//! write. Notices are debounced by connectivity class: repeated events in the
//! same class produce nothing.
//!
//! The listener holds a `Weak` to the monitor so the provider's task never
//! keeps it alive; `shutdown` (or dropping the last clone) releases the
//! subscription.

pub mod fallback;
pub mod platform;
pub mod probe;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use self::fallback::FallbackConnectivity;
use self::platform::{ConnectionType, ConnectivityProvider, ConnectivityState, Subscription};
use self::probe::ProbeConnectivity;
use crate::config::{NetworkConfig, NetworkMonitorMode};
use crate::notify::{Notice, Notifier};

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkState {
    pub is_connected: bool,
    /// `None` until the first probe resolves it.
    pub is_internet_reachable: Option<bool>,
    pub connection_type: ConnectionType,
    pub is_loading: bool,
}

impl Default for NetworkState {
    fn default() -> Self {
        Self {
            is_connected: false,
            is_internet_reachable: None,
            connection_type: ConnectionType::Unknown,
            is_loading: true,
        }
    }
}

impl NetworkState {
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.is_connected && self.is_internet_reachable == Some(true)
    }

    #[must_use]
    pub fn class(&self) -> Option<ConnectivityClass> {
        ConnectivityClass::of(self.is_connected, self.is_internet_reachable)
    }
}

impl From<ConnectivityState> for NetworkState {
    fn from(raw: ConnectivityState) -> Self {
        Self {
            is_connected: raw.is_connected,
            is_internet_reachable: raw.is_internet_reachable,
            connection_type: raw.connection_type,
            is_loading: false,
        }
    }
}

/// Snapshot returned by [`NetworkMonitor::get_network_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    pub is_connected: bool,
    pub is_internet_reachable: Option<bool>,
    pub connection_type: ConnectionType,
    pub is_loading: bool,
    pub is_available: bool,
}

impl From<NetworkState> for NetworkInfo {
    fn from(state: NetworkState) -> Self {
        Self {
            is_connected: state.is_connected,
            is_internet_reachable: state.is_internet_reachable,
            connection_type: state.connection_type,
            is_loading: state.is_loading,
            is_available: state.is_available(),
        }
    }
}

/// Coarse bucket used to debounce notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityClass {
    Offline,
    /// Link present, internet unreachable.
    Limited,
    Online,
}

impl ConnectivityClass {
    /// `None` when a link exists but reachability is still unknown.
    #[must_use]
    pub fn of(is_connected: bool, is_internet_reachable: Option<bool>) -> Option<Self> {
        match (is_connected, is_internet_reachable) {
            (false, _) => Some(Self::Offline),
            (true, Some(false)) => Some(Self::Limited),
            (true, Some(true)) => Some(Self::Online),
            (true, None) => None,
        }
    }
}

/// Notice for moving from `previous` into `next`, if the move deserves one.
///
/// Reaching `Online` only announces a recovery; starting online is silent.
#[must_use]
pub fn transition_notice(previous: Option<ConnectivityClass>, next: ConnectivityClass) -> Option<Notice> {
    if previous == Some(next) {
        return None;
    }
    match next {
        ConnectivityClass::Offline => {
            Some(Notice::warning("No Internet", "You are offline. Some features may be unavailable."))
        }
        ConnectivityClass::Limited => Some(Notice::warning(
            "Limited Connectivity",
            "Connected to a network, but the internet is not reachable.",
        )),
        ConnectivityClass::Online => {
            previous.map(|_| Notice::success("Back Online", "Your internet connection has been restored."))
        }
    }
}

// =============================================================================
// MONITOR
// =============================================================================

#[derive(Clone)]
pub struct NetworkMonitor {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn ConnectivityProvider>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<NetworkState>,
    /// Last announced class; held while applying an event.
    apply_lock: Mutex<Option<ConnectivityClass>>,
    subscription: Mutex<Option<Subscription>>,
    active: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn apply(&self, raw: ConnectivityState) -> NetworkState {
        let mut last_class = lock(&self.apply_lock);
        if !self.active.load(Ordering::SeqCst) {
            return *self.state.borrow();
        }

        let next = NetworkState::from(raw);
        self.state.send_replace(next);
        debug!(
            connected = next.is_connected,
            reachable = ?next.is_internet_reachable,
            kind = %next.connection_type,
            "network state updated"
        );

        if let Some(class) = next.class() {
            if let Some(notice) = transition_notice(*last_class, class) {
                info!(?class, "connectivity class changed");
                self.notifier.notify(notice);
            }
            *last_class = Some(class);
        }
        next
    }
}

impl NetworkMonitor {
    /// Subscribe to `provider` and run the initial probe.
    pub async fn start(provider: Arc<dyn ConnectivityProvider>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(NetworkState::default());
        let inner = Arc::new(Inner {
            provider,
            notifier,
            state,
            apply_lock: Mutex::new(None),
            subscription: Mutex::new(None),
            active: AtomicBool::new(true),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let subscription = inner.provider.add_listener(Arc::new(move |raw| {
            if let Some(inner) = weak.upgrade() {
                inner.apply(raw);
            }
        }));
        *lock(&inner.subscription) = Some(subscription);
        debug!(provider = inner.provider.name(), "network monitor subscribed");

        let monitor = Self { inner };
        monitor.refresh_network_status().await;
        monitor
    }

    /// Probe now and return the resulting state.
    ///
    /// A failed probe only clears `is_loading`; the last known values stay.
    pub async fn refresh_network_status(&self) -> NetworkState {
        match self.inner.provider.fetch().await {
            Ok(raw) => self.inner.apply(raw),
            Err(err) => {
                warn!(provider = self.inner.provider.name(), error = %err, "network probe failed");
                if self.inner.active.load(Ordering::SeqCst) {
                    self.inner.state.send_modify(|s| s.is_loading = false);
                }
                self.state()
            }
        }
    }

    #[must_use]
    pub fn is_network_available(&self) -> bool {
        self.inner.state.borrow().is_available()
    }

    #[must_use]
    pub fn get_network_info(&self) -> NetworkInfo {
        NetworkInfo::from(self.state())
    }

    #[must_use]
    pub fn state(&self) -> NetworkState {
        *self.inner.state.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.inner.provider.name()
    }

    /// Release the provider listener. Later events are ignored.
    pub fn shutdown(&self) {
        self.inner.active.store(false, Ordering::SeqCst);
        let subscription = lock(&self.inner.subscription).take();
        drop(subscription);
        debug!("network monitor shut down");
    }
}

// =============================================================================
// PROVIDER SELECTION
// =============================================================================

/// Pick the connectivity capability for this configuration.
///
/// `Auto` uses the active probe when it can be built and falls back otherwise.
#[must_use]
pub fn select_connectivity(config: &NetworkConfig) -> Arc<dyn ConnectivityProvider> {
    match config.mode {
        NetworkMonitorMode::Fallback => {
            info!("network monitor using fallback provider");
            Arc::new(FallbackConnectivity)
        }
        NetworkMonitorMode::Auto => match ProbeConnectivity::new(config) {
            Ok(probe) => Arc::new(probe),
            Err(err) => {
                warn!(error = %err, "connectivity probe unavailable; using fallback provider");
                Arc::new(FallbackConnectivity)
            }
        },
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
