//! Per-host rate limiting for listing requests.
//!
//! This module provides the [`RateLimiter`] struct which enforces a minimum
//! delay between successive requests to the same host, so directory crawls
//! do not overload the source server.
//!
//! Rate limiting is per-host: requests to different hosts never wait on each
//! other, only subsequent requests to the *same* host are delayed. The struct
//! is `Send + Sync`, so a future concurrent crawl driver can share it across
//! tasks unchanged.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Per-host rate limiter for listing requests.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ohmc_sync_core::fetch::RateLimiter;
///
/// # async fn example() {
/// let limiter = RateLimiter::new(Duration::from_millis(100));
///
/// // First request proceeds immediately
/// limiter.acquire("https://yaku.ohmc.ar/public/wrf/").await;
///
/// // Second request to the same host waits out the delay
/// limiter.acquire("https://yaku.ohmc.ar/public/MedicionAire/").await;
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum delay between requests to the same host.
    delay: Duration,

    /// Per-host last-request instants.
    /// Arc lets the state be cloned out so the `DashMap` shard lock is
    /// released before awaiting on the inner Mutex.
    hosts: DashMap<String, Arc<Mutex<Option<Instant>>>>,
}

impl RateLimiter {
    /// Creates a rate limiter with the given minimum inter-request delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            hosts: DashMap::new(),
        }
    }

    /// Waits until a request to the given URL's host is allowed, then records
    /// the request time.
    ///
    /// The first request to a host proceeds immediately.
    pub async fn acquire(&self, url: &str) {
        if self.delay.is_zero() {
            return;
        }

        let host = extract_host(url);
        let state = self
            .hosts
            .entry(host.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let mut last_request = state.lock().await;
        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                let wait = self.delay - elapsed;
                debug!(host = %host, ?wait, "rate limit pause");
                tokio::time::sleep(wait).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

/// Extracts the host component of a URL, falling back to the whole string
/// for unparseable input (which then rate-limits as its own bucket).
#[must_use]
pub fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(std::string::ToString::to_string))
        .unwrap_or_else(|| url.to_string())
}
