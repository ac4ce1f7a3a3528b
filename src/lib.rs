//! `rategate` is a rate-limit-aware decorator around an HTTP executor.
//!
//! It wraps anything that can perform a round trip (a [`reqwest::Client`]
//! by default) and schedules requests either strictly one at a time
//! (serial mode) or with controlled overlap up to a concurrency bound
//! (parallel mode), while a single shared view of the backend's
//! rate-limit headers holds requests back when the quota is exhausted.
//!
//! ```no_run
//! use rategate::{RateLimitTransport, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TransportConfig {
//!         parallel_requests: true,
//!         ..Default::default()
//!     };
//!     let transport = RateLimitTransport::new(reqwest::Client::new(), config);
//!
//!     let request = reqwest::Request::new(
//!         reqwest::Method::GET,
//!         "https://api.github.com/rate_limit".parse()?,
//!     );
//!     let response = transport.execute(request).await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```
#![warn(missing_docs)]

mod backoff;
mod config;
mod error;
mod headers;
mod quota;
mod round_trip;
mod stats;
mod transport;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::TransportConfig;
pub use error::TransportError;
pub use quota::QuotaSnapshot;
pub use round_trip::RoundTrip;
pub use stats::TransportStats;
pub use transport::RateLimitTransport;

/// Convenience alias for results produced by this crate
pub type Result<T> = std::result::Result<T, TransportError>;
