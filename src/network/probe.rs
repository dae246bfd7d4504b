//! Active connectivity probe.
//!
//! DESIGN
//! ======
//! Link presence is a route lookup: "connecting" a UDP socket to a public
//! address asks the OS for a route without sending a packet. Reachability is
//! an HTTP GET against a lightweight endpoint. A background task re-probes on
//! an interval and pushes a state to listeners only when it differs from the
//! previous one, so listeners see change events rather than a poll stream.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::platform::{ConnectionType, ConnectivityListener, ConnectivityProvider, ConnectivityState, NetworkError, Subscription};
use crate::config::NetworkConfig;

const ROUTE_TARGET: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), 53);
const PROBE_TIMEOUT_SECS: u64 = 5;

pub struct ProbeConnectivity {
    http: reqwest::Client,
    probe_url: reqwest::Url,
    interval: Duration,
}

impl ProbeConnectivity {
    /// # Errors
    ///
    /// Returns [`NetworkError::Unavailable`] if the probe URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: &NetworkConfig) -> Result<Self, NetworkError> {
        let probe_url = reqwest::Url::parse(&config.probe_url)
            .map_err(|e| NetworkError::Unavailable(format!("invalid probe url '{}': {e}", config.probe_url)))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()
            .map_err(|e| NetworkError::Unavailable(e.to_string()))?;
        Ok(Self { http, probe_url, interval: Duration::from_secs(config.probe_interval_secs.max(1)) })
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    async fn probe(http: &reqwest::Client, url: &reqwest::Url) -> Result<ConnectivityState, NetworkError> {
        if !link_present().await? {
            return Ok(state_from_probe(false, false));
        }
        let reachable = match http.get(url.clone()).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                debug!(error = %err, "reachability probe failed");
                false
            }
        };
        Ok(state_from_probe(true, reachable))
    }
}

/// `Ok(false)` when the OS has no route; `Err` when the check itself cannot run.
async fn link_present() -> Result<bool, NetworkError> {
    let socket = tokio::net::UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await.map_err(route_check_failed)?;
    Ok(socket.connect(ROUTE_TARGET).await.is_ok())
}

fn route_check_failed(err: std::io::Error) -> NetworkError {
    NetworkError::Probe(format!("route check socket: {err}"))
}

fn state_from_probe(link: bool, reachable: bool) -> ConnectivityState {
    if !link {
        return ConnectivityState::offline();
    }
    ConnectivityState { is_connected: true, is_internet_reachable: Some(reachable), connection_type: ConnectionType::Other }
}

#[async_trait::async_trait]
impl ConnectivityProvider for ProbeConnectivity {
    fn name(&self) -> &'static str {
        "probe"
    }

    async fn fetch(&self) -> Result<ConnectivityState, NetworkError> {
        Self::probe(&self.http, &self.probe_url).await
    }

    fn add_listener(&self, listener: ConnectivityListener) -> Subscription {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; connectivity changes will not be pushed");
            return Subscription::noop();
        };

        let http = self.http.clone();
        let url = self.probe_url.clone();
        let period = self.interval;
        let task = runtime.spawn(async move {
            // The monitor runs its own initial probe; start one period later.
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last: Option<ConnectivityState> = None;
            loop {
                ticker.tick().await;
                let state = match Self::probe(&http, &url).await {
                    Ok(state) => state,
                    Err(err) => {
                        debug!(error = %err, "background probe failed");
                        continue;
                    }
                };
                if last != Some(state) {
                    last = Some(state);
                    listener(state);
                }
            }
        });

        Subscription::new(move || task.abort())
    }
}

#[cfg(test)]
#[path = "probe_test.rs"]
mod tests;
