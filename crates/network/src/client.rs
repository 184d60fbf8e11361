// crates/network/src/client.rs
//! HTTP client wrapper with resilience

use crate::error::{NetworkError, NetworkResult};
use mastermind_config::SyncConfig;
use mastermind_resilience::{with_retry, CircuitBreaker, CircuitBreakerConfig, RetryPolicy};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Retry policy
    pub retry_policy: RetryPolicy,
    /// Circuit breaker config
    pub circuit_breaker_config: Option<CircuitBreakerConfig>,
}

impl ClientConfig {
    /// Builds a client configuration from the sync settings
    pub fn from_settings(settings: &SyncConfig) -> Self {
        let cooldown = settings.connectivity_interval();

        Self {
            timeout: settings.request_timeout(),
            retry_policy: RetryPolicy::new(settings.request_retries as usize)
                .with_initial_delay(Duration::from_millis(200))
                .with_max_delay(Duration::from_secs(5)),
            circuit_breaker_config: Some(CircuitBreakerConfig::new(
                settings.circuit_breaker_threshold as usize,
                cooldown,
            )),
            ..Self::default()
        }
    }

    /// Single-shot configuration for reachability probes
    ///
    /// Probes must observe the endpoint directly, so they neither retry nor
    /// short-circuit.
    pub fn probe(timeout: Duration) -> Self {
        Self {
            timeout,
            retry_policy: RetryPolicy::no_retry(),
            circuit_breaker_config: None,
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("Mastermind/{}", env!("CARGO_PKG_VERSION")),
            retry_policy: RetryPolicy::new(3).with_initial_delay(Duration::from_millis(100)),
            circuit_breaker_config: Some(CircuitBreakerConfig::new(5, Duration::from_secs(30))),
        }
    }
}

/// HTTP client with resilience features
///
/// Clones share the connection pool and the circuit breaker.
#[derive(Debug, Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
    circuit_breaker: Option<CircuitBreaker>,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let inner = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let circuit_breaker = config
            .circuit_breaker_config
            .as_ref()
            .map(|cfg| CircuitBreaker::new(cfg.clone()));

        Ok(Self {
            inner,
            config,
            circuit_breaker,
        })
    }

    /// Returns the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the circuit breaker, if enabled
    pub fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        self.circuit_breaker.as_ref()
    }

    /// Performs a GET request
    pub async fn get(&self, url: &str) -> NetworkResult<Response> {
        let url = parse_url(url)?;
        self.execute(|| self.inner.get(url.clone())).await
    }

    /// POSTs `body` as JSON
    pub async fn post_json<T>(&self, url: &str, body: &T) -> NetworkResult<Response>
    where
        T: Serialize + ?Sized,
    {
        let url = parse_url(url)?;
        self.execute(|| self.inner.post(url.clone()).json(body)).await
    }

    /// Checks if a URL answers with a success status
    pub async fn is_accessible(&self, url: &str) -> bool {
        self.get(url).await.is_ok()
    }

    async fn execute<F>(&self, build: F) -> NetworkResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let client = self;
        with_retry(&self.config.retry_policy, NetworkError::is_retryable, move || {
            client.attempt(build())
        })
        .await
    }

    async fn attempt(&self, request: RequestBuilder) -> NetworkResult<Response> {
        if let Some(cb) = &self.circuit_breaker {
            cb.can_proceed()?;
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                self.record_failure();
                return Err(NetworkError::Http(e));
            }
        };

        let status = response.status();
        if status.is_server_error() {
            self.record_failure();
        } else {
            self.record_success();
        }

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        log::debug!("{} answered {}: {}", url, status, body);

        Err(NetworkError::Status {
            status: status.as_u16(),
            url,
            body,
        })
    }

    fn record_success(&self) {
        if let Some(cb) = &self.circuit_breaker {
            cb.record_success();
        }
    }

    fn record_failure(&self) {
        if let Some(cb) = &self.circuit_breaker {
            cb.record_failure();
        }
    }
}

fn parse_url(url: &str) -> NetworkResult<reqwest::Url> {
    reqwest::Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", url, e)))
}
