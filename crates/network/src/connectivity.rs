// crates/network/src/connectivity.rs
//! Reachability of the sync endpoint

use crate::client::Client;
use crate::error::{NetworkError, NetworkResult};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Path probed on the sync endpoint
const HEALTH_PATH: &str = "health";

/// Probes the sync endpoint's health route
#[derive(Debug, Clone)]
pub struct ConnectivityChecker {
    client: Client,
    health_url: String,
}

impl ConnectivityChecker {
    /// Creates a checker for the endpoint at `base_url`
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            health_url: format!("{}/{}", base_url.trim_end_matches('/'), HEALTH_PATH),
        }
    }

    /// URL that is probed
    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    /// Returns true if the endpoint answers its health route with success
    pub async fn is_online(&self) -> bool {
        self.client.is_accessible(&self.health_url).await
    }

    /// Checks connectivity and returns an error if the endpoint is unreachable
    pub async fn check(&self) -> NetworkResult<()> {
        match self.client.get(&self.health_url).await {
            Ok(_) => Ok(()),
            Err(e) => Err(NetworkError::NetworkUnavailable(e.to_string())),
        }
    }

    /// Round-trip time of one health probe
    pub async fn estimate_latency(&self) -> NetworkResult<Duration> {
        let start = Instant::now();
        self.client.get(&self.health_url).await?;
        Ok(start.elapsed())
    }
}

/// Background task that probes connectivity on an interval
///
/// `on_change` runs for the first probe and afterwards only when the
/// reachability flips. The task stops when the monitor is dropped.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    handle: JoinHandle<()>,
}

impl ConnectivityMonitor {
    /// Starts probing immediately, then every `interval`
    pub fn spawn<F>(checker: ConnectivityChecker, interval: Duration, on_change: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last: Option<bool> = None;

            loop {
                ticker.tick().await;
                let online = checker.is_online().await;

                if last != Some(online) {
                    log::info!(
                        "Sync endpoint {} is {}",
                        checker.health_url(),
                        if online { "reachable" } else { "unreachable" }
                    );
                    last = Some(online);
                    on_change(online);
                }
            }
        });

        Self { handle }
    }

    /// Stops probing
    pub fn stop(self) {
        self.handle.abort();
    }

    /// Returns true while the probe task is alive
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
