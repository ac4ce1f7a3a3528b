use std::sync::Mutex;
use std::time::Duration;

use crate::headers::parse_retry_after;

/// Initial delay after the first rate-limit response
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Upper bound for the exponential rate-limit backoff
const MAX_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(30);

/// Increment added per server error response
const SERVER_ERROR_STEP: Duration = Duration::from_millis(200);

/// Upper bound for the server-error backoff
const MAX_SERVER_ERROR_BACKOFF: Duration = Duration::from_secs(10);

/// Longest `Retry-After` delay we are willing to honor
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Adaptive delay applied before each dispatch, shared by all requests
/// going through one transport.
///
/// This is back-pressure only: a 429 or 5xx slows down *subsequent*
/// requests, it never triggers a retry of the request that observed it.
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    delay: Mutex<Duration>,
}

impl Backoff {
    /// The delay the next dispatch should apply before sending
    pub(crate) fn current(&self) -> Duration {
        *self.delay.lock().unwrap()
    }

    /// Adjust the delay based on a completed response.
    pub(crate) fn record_response(&self, status: u16, headers: &http::HeaderMap) {
        {
            let mut delay = self.delay.lock().unwrap();
            match status {
                200..=299 => {
                    // Reset backoff on success
                    *delay = Duration::ZERO;
                }
                429 => {
                    let doubled = if delay.is_zero() {
                        INITIAL_BACKOFF
                    } else {
                        *delay * 2
                    };
                    let next = doubled.min(MAX_RATE_LIMIT_BACKOFF);
                    log::debug!(
                        "Rate limited (429), increasing backoff from {}ms to {}ms",
                        delay.as_millis(),
                        next.as_millis()
                    );
                    *delay = next;
                }
                500..=599 => {
                    *delay = (*delay + SERVER_ERROR_STEP).min(MAX_SERVER_ERROR_BACKOFF);
                }
                _ => {} // No backoff change for other status codes
            }
        }

        // An explicit Retry-After overrides whatever we computed, unless
        // the advertised delay is unreasonably long.
        if let Some(value) = headers.get("retry-after")
            && let Ok(retry_after) = parse_retry_after(value)
            && retry_after <= MAX_RETRY_AFTER
        {
            let mut delay = self.delay.lock().unwrap();
            *delay = (*delay).max(retry_after);
        }
    }
}
