use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::{Request, Response};
use tokio::sync::Semaphore;

use crate::backoff::Backoff;
use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::headers::parse_rate_limit_headers;
use crate::quota::{QuotaSnapshot, SharedQuota};
use crate::round_trip::RoundTrip;
use crate::stats::TransportStats;

/// Token bucket enforcing the optional minimum dispatch interval
type Pacer = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A rate-limit-aware decorator around an HTTP executor.
///
/// Wraps any [`RoundTrip`] implementation and intercepts every outgoing
/// request. In serial mode requests execute strictly one at a time; in
/// parallel mode they overlap up to a configured concurrency bound. In
/// both modes all requests share one rate-limit state fed by response
/// headers: when the backend reports an exhausted quota, subsequent
/// dispatches are held back until the reset, and 429/5xx responses slow
/// down the ones after them.
///
/// The transport spawns no tasks of its own; it only suspends callers
/// inside [`execute`](Self::execute). Cloning is cheap and clones share
/// the same rate-limit state and concurrency slots.
///
/// Failed requests are never retried here. A retry policy, if any,
/// belongs to the layer above.
#[derive(Debug)]
pub struct RateLimitTransport<T> {
    /// The wrapped executor performing the actual round trips
    inner: Arc<T>,

    config: TransportConfig,

    /// Serializes round trips in serial mode (FIFO, so issuance order
    /// is preserved)
    serial_lock: Arc<tokio::sync::Mutex<()>>,

    /// Bounds in-flight round trips in parallel mode
    slots: Arc<Semaphore>,

    /// Optional proactive pacing between dispatches
    pacer: Option<Arc<Pacer>>,

    /// Quota state shared by all requests, fed by response headers
    quota: Arc<SharedQuota>,

    /// Adaptive delay applied after 429/5xx responses
    backoff: Arc<Backoff>,

    stats: Arc<Mutex<TransportStats>>,
}

impl<T> Clone for RateLimitTransport<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config,
            serial_lock: Arc::clone(&self.serial_lock),
            slots: Arc::clone(&self.slots),
            pacer: self.pacer.clone(),
            quota: Arc::clone(&self.quota),
            backoff: Arc::clone(&self.backoff),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T: RoundTrip> RateLimitTransport<T> {
    /// Create a new transport wrapping the given executor.
    ///
    /// The configuration is fixed for the lifetime of the transport;
    /// construct separate transports to run serial and parallel modes
    /// side by side.
    #[must_use]
    pub fn new(inner: T, config: TransportConfig) -> Self {
        let pacer = config
            .request_interval
            .and_then(Quota::with_period)
            .map(|quota| Arc::new(RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN))));

        Self {
            inner: Arc::new(inner),
            config,
            serial_lock: Arc::new(tokio::sync::Mutex::new(())),
            slots: Arc::new(Semaphore::new(config.max_concurrent)),
            pacer,
            quota: Arc::new(SharedQuota::default()),
            backoff: Arc::new(Backoff::default()),
            stats: Arc::new(Mutex::new(TransportStats::default())),
        }
    }

    /// Execute one request through the transport.
    ///
    /// This method:
    /// 1. Admits the request (serial lock or concurrency slot)
    /// 2. Waits for the pacing interval, if one is configured
    /// 3. Applies the current backoff delay, if any
    /// 4. Sleeps until the quota reset if the quota is exhausted,
    ///    still holding its slot
    /// 5. Performs the round trip
    /// 6. Updates shared quota, backoff, and statistics from the outcome
    ///
    /// Each request's outcome is independent: a failure is returned to
    /// this caller only and neither cancels sibling requests nor leaves
    /// the transport unusable. Dropping the returned future (e.g. on a
    /// caller-side timeout) releases the slot and aborts only this
    /// request's wait.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the underlying round trip fails.
    /// Rate-limit exhaustion is absorbed as a delay, never an error.
    pub async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        if self.config.parallel_requests {
            let _permit = self
                .slots
                .acquire()
                .await
                .map_err(|_| TransportError::Closed)?;
            self.dispatch(request).await
        } else {
            let _guard = self.serial_lock.lock().await;
            self.dispatch(request).await
        }
    }

    /// Perform one admitted round trip: pace, back off, wait out the
    /// quota window, send, then record the outcome.
    async fn dispatch(&self, request: Request) -> Result<Response, TransportError> {
        if let Some(pacer) = &self.pacer {
            pacer.until_ready().await;
        }

        let backoff = self.backoff.current();
        if !backoff.is_zero() {
            log::debug!(
                "Applying backoff delay of {}ms before dispatching {}",
                backoff.as_millis(),
                request.url()
            );
            tokio::time::sleep(backoff).await;
        }

        if let Some(wait) = self.quota.wait_needed(SystemTime::now()) {
            log::debug!(
                "Quota exhausted, delaying {} by {}ms until reset",
                request.url(),
                wait.as_millis()
            );
            tokio::time::sleep(wait).await;
            self.stats.lock().unwrap().record_quota_wait(wait);
        }

        let start = Instant::now();
        let response = match self.inner.round_trip(request).await {
            Ok(response) => response,
            Err(err) => {
                self.stats.lock().unwrap().record_network_error();
                return Err(err);
            }
        };
        let request_time = start.elapsed();

        let status = response.status().as_u16();
        self.quota.observe(parse_rate_limit_headers(response.headers()));
        self.backoff.record_response(status, response.headers());
        self.stats
            .lock()
            .unwrap()
            .record_response(status, request_time);

        Ok(response)
    }

    /// Get a copy of the current transport statistics
    ///
    /// # Panics
    ///
    /// Panics if the statistics mutex is poisoned
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        self.stats.lock().unwrap().clone()
    }

    /// Get a copy of the current quota state as reported by the backend
    #[must_use]
    pub fn quota_snapshot(&self) -> QuotaSnapshot {
        self.quota.snapshot()
    }

    /// Get the current number of available concurrency slots
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Get the transport's configuration
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }
}
