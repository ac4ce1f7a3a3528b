//! Test doubles for exercising the transport without a network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::{RoundTrip, TransportError};

/// A scripted [`RoundTrip`] implementation with a fixed per-request
/// latency. It echoes the request URL in the response body so callers
/// can verify that every response reached its originating request, and
/// it tracks the in-flight high-water mark for concurrency assertions.
pub(crate) struct MockTransport {
    latency: Duration,
    /// Requests whose URL contains this substring fail with a network error
    fail_marker: Option<&'static str>,
    /// Rate-limit headers attached to every response, if set
    rate_limit: Option<(u64, u64)>,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new(latency: Duration) -> Self {
        Self {
            latency,
            fail_marker: None,
            rate_limit: None,
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        }
    }

    /// Fail requests whose URL contains the given substring
    pub(crate) fn failing_on(mut self, marker: &'static str) -> Self {
        self.fail_marker = Some(marker);
        self
    }

    /// Attach `X-RateLimit-Remaining`/`X-RateLimit-Reset` to every response
    pub(crate) fn with_rate_limit_headers(mut self, remaining: u64, reset_epoch: u64) -> Self {
        self.rate_limit = Some((remaining, reset_epoch));
        self
    }

    /// The largest number of round trips that were in flight at once
    pub(crate) fn max_in_flight(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

/// Produce a real `reqwest` error without touching the network: the
/// client rejects non-HTTP schemes before connecting.
async fn network_error() -> TransportError {
    let err = reqwest::Client::new()
        .get("ftp://unreachable.local/")
        .send()
        .await
        .expect_err("non-HTTP scheme must be rejected");
    TransportError::Network(err)
}

#[async_trait]
impl RoundTrip for MockTransport {
    async fn round_trip(&self, request: Request) -> Result<Response, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(marker) = self.fail_marker
            && request.url().as_str().contains(marker)
        {
            return Err(network_error().await);
        }

        let mut builder = http::Response::builder().status(200);
        if let Some((remaining, reset)) = self.rate_limit {
            builder = builder
                .header("x-ratelimit-remaining", remaining)
                .header("x-ratelimit-reset", reset);
        }
        let response = builder
            .body(request.url().as_str().to_owned())
            .expect("mock response must build");

        Ok(Response::from(response))
    }
}
