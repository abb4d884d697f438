//! Liveness checker for proxy records
//!
//! Each candidate is used as a forward proxy for a GET against a well-known
//! echo endpoint. A proxy passes only when the request succeeds, the echoed
//! origin proves the traffic actually went through the candidate, and the
//! round trip stayed under the response-time ceiling. Certificate
//! verification is disabled on purpose: candidates are untrusted third
//! parties and the echo endpoint is reached over plaintext anyway — a known
//! and accepted risk of probing open proxies.

use crate::proxy::models::Proxy;
use crate::Result;
use anyhow::{anyhow, Context};
use futures::stream::{self, StreamExt};
use reqwest::{Client, Proxy as ReqwestProxy};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Default timeout for a single probe in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of concurrent probes
const DEFAULT_CONCURRENCY: usize = 50;

/// Default echo endpoint to probe through candidates
const DEFAULT_TEST_URL: &str = "http://httpbin.org/get";

/// Default ceiling on acceptable round-trip time in seconds
const DEFAULT_MAX_RESPONSE_SECS: f64 = 3.0;

/// Body returned by the echo endpoint; only the origin matters here.
#[derive(Debug, Deserialize)]
struct EchoResponse {
    #[serde(default)]
    origin: String,
}

/// Configuration for the liveness checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each probe
    pub timeout: Duration,
    /// Number of concurrent probes
    pub concurrency: usize,
    /// Echo endpoint requested through each candidate
    pub test_url: String,
    /// Probes slower than this are treated as failed
    pub max_response_secs: f64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_url: DEFAULT_TEST_URL.to_string(),
            max_response_secs: DEFAULT_MAX_RESPONSE_SECS,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }

    pub fn with_max_response_secs(mut self, secs: f64) -> Self {
        self.max_response_secs = secs;
        self
    }
}

/// Checker validating proxy liveness with bounded concurrency
#[derive(Debug, Clone)]
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    /// Create a new checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self { config }
    }

    /// Validate proxies concurrently, returning only the ones that passed,
    /// each enriched with its measured response time.
    ///
    /// The output is in completion order, not input order. Failures are
    /// dropped without individual reporting; the aggregate pass count is the
    /// only signal. A probe is attempted exactly once per proxy.
    pub async fn validate(&self, proxies: Vec<Proxy>) -> Vec<Proxy> {
        let total = proxies.len();
        info!(
            "Testing {} proxies with {} workers (timeout {}s, max response {}s)",
            total,
            self.config.concurrency,
            self.config.timeout.as_secs(),
            self.config.max_response_secs
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut probes = stream::iter(proxies)
            .map(|proxy| {
                let sem = Arc::clone(&semaphore);
                let checker = self.clone();
                async move {
                    // Semaphore acquire only fails if the semaphore is closed,
                    // which won't happen here since we own the Arc and keep it
                    // alive for the duration of the validation run.
                    let _permit = sem.acquire().await.expect("Semaphore closed unexpectedly");
                    checker.probe(&proxy).await
                }
            })
            .buffer_unordered(self.config.concurrency);

        let mut valid = Vec::new();
        let mut completed = 0usize;
        while let Some(outcome) = probes.next().await {
            completed += 1;
            if completed % 10 == 0 || completed == total {
                info!(
                    "Progress: {}/{} ({}%)",
                    completed,
                    total,
                    completed * 100 / total
                );
            }
            match outcome {
                Ok(proxy) => valid.push(proxy),
                Err(reason) => debug!("Probe failed: {reason:#}"),
            }
        }

        info!("Validation complete: {}/{} proxies passed", valid.len(), total);
        valid
    }

    /// Probe a single proxy once. Returns an enriched copy on success.
    pub async fn probe(&self, proxy: &Proxy) -> Result<Proxy> {
        let key = proxy.to_string();
        proxy
            .port
            .ok_or_else(|| anyhow!("record {key} has no port"))?;

        let client = self.client_through(proxy)?;

        let start = Instant::now();
        let response = client
            .get(&self.config.test_url)
            .send()
            .await
            .with_context(|| format!("request through {key} failed"))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(anyhow!("{key}: HTTP status {}", response.status()));
        }

        let echo: EchoResponse = response
            .json()
            .await
            .with_context(|| format!("{key}: unreadable echo body"))?;
        // measured time covers the whole exchange, body read included
        let elapsed = start.elapsed().as_secs_f64();

        // The echoed origin must contain the candidate's address, otherwise
        // the request fell back to a direct connection and proves nothing.
        if !echo.origin.contains(&proxy.host) {
            return Err(anyhow!("{key}: origin {:?} does not match", echo.origin));
        }

        if elapsed > self.config.max_response_secs {
            return Err(anyhow!("{key}: too slow ({elapsed:.2}s)"));
        }

        Ok(proxy.with_response_time(elapsed))
    }

    /// Build a client that routes all traffic through the candidate.
    fn client_through(&self, proxy: &Proxy) -> Result<Client> {
        let port = proxy.port.unwrap_or_default();
        let proxy_url = format!("{}://{}:{}", proxy.scheme(), proxy.host, port);
        let forward = ReqwestProxy::all(&proxy_url)
            .with_context(|| format!("invalid proxy url {proxy_url}"))?;

        let client = Client::builder()
            .proxy(forward)
            .timeout(self.config.timeout)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(client)
    }
}

impl Default for ProxyChecker {
    fn default() -> Self {
        Self::new()
    }
}
