//! Handle rate limiting headers.
//!
//! Header names are not standardised yet, but there is an
//! [IETF draft](https://datatracker.ietf.org/doc/draft-ietf-httpapi-ratelimit-headers/),
//! so we accept the spellings commonly seen in the wild.

use http::HeaderValue;
use std::time::{Duration, SystemTime};
use thiserror::Error;

use crate::quota::QuotaSnapshot;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum RetryAfterParseError {
    #[error("Unable to parse value '{0}'")]
    ValueError(String),

    #[error("Header value contains invalid chars")]
    HeaderValueError,
}

/// Parse the "Retry-After" header as specified per
/// [RFC 7231 section 7.1.3](https://www.rfc-editor.org/rfc/rfc7231#section-7.1.3)
pub(crate) fn parse_retry_after(value: &HeaderValue) -> Result<Duration, RetryAfterParseError> {
    let value = value
        .to_str()
        .map_err(|_| RetryAfterParseError::HeaderValueError)?;

    // RFC 7231: Retry-After = HTTP-date / delay-seconds
    value.parse::<u64>().map(Duration::from_secs).or_else(|_| {
        httpdate::parse_http_date(value)
            .map(|s| {
                s.duration_since(SystemTime::now())
                    // if date is in the past, we can use ZERO
                    .unwrap_or(Duration::ZERO)
            })
            .map_err(|_| RetryAfterParseError::ValueError(value.into()))
    })
}

/// Extract a quota snapshot from the common "X-RateLimit" header fields.
///
/// The reset field is a Unix timestamp in seconds, as sent by the GitHub
/// API among others. Missing or malformed fields are simply absent from
/// the snapshot; they never fail a request.
pub(crate) fn parse_rate_limit_headers(headers: &http::HeaderMap) -> QuotaSnapshot {
    let remaining = parse_header_value(
        headers,
        &[
            "x-ratelimit-remaining",
            "x-rate-limit-remaining",
            "ratelimit-remaining",
        ],
    );

    let reset = parse_header_value(
        headers,
        &["x-ratelimit-reset", "x-rate-limit-reset", "ratelimit-reset"],
    )
    .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs));

    QuotaSnapshot { remaining, reset }
}

/// Helper method to parse numeric header values from common rate limit headers
fn parse_header_value(headers: &http::HeaderMap, header_names: &[&str]) -> Option<u64> {
    for header_name in header_names {
        if let Some(value) = headers.get(*header_name)
            && let Ok(value_str) = value.to_str()
            && let Ok(number) = value_str.parse::<u64>()
        {
            return Some(number);
        }
    }
    None
}
