use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::TransportError;

/// The capability to perform one HTTP round trip.
///
/// This is the seam between [`crate::RateLimitTransport`] and the network:
/// any conforming implementation (a real [`reqwest::Client`], a mock, a
/// recorded fixture) can be substituted.
///
/// Implementations MUST be safe for concurrent invocation; in parallel
/// mode the transport calls `round_trip` from many tasks at once.
/// `reqwest::Client` satisfies this. In serial mode calls are externally
/// serialized, so even a non-reentrant test double behaves.
#[async_trait]
pub trait RoundTrip: Send + Sync {
    /// Send the request and return the response, or a failure.
    ///
    /// One invocation maps to exactly one network round trip; the
    /// transport never retries on behalf of an implementation.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the round trip could not be
    /// completed (connection refused, DNS failure, timeout, ...).
    /// Non-2xx responses are not errors at this layer.
    async fn round_trip(&self, request: Request) -> Result<Response, TransportError>;
}

#[async_trait]
impl RoundTrip for reqwest::Client {
    async fn round_trip(&self, request: Request) -> Result<Response, TransportError> {
        self.execute(request).await.map_err(TransportError::Network)
    }
}
