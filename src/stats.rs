use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use serde::Serialize;
use serde::ser::SerializeStruct;

/// How many recent request durations to keep for timing statistics
const TIMING_WINDOW_CAPACITY: usize = 100;

/// A rolling window of recent request durations. Bounded so a
/// long-lived transport does not grow without limit; old entries are
/// dropped as new ones arrive.
#[derive(Debug, Clone)]
struct TimingWindow {
    times: VecDeque<Duration>,
    capacity: usize,
}

impl TimingWindow {
    fn push(&mut self, time: Duration) {
        if self.times.len() >= self.capacity {
            self.times.pop_front();
        }
        self.times.push_back(time);
    }

    fn average(&self) -> Option<Duration> {
        if self.times.is_empty() {
            return None;
        }
        let total: Duration = self.times.iter().sum();
        #[allow(clippy::cast_possible_truncation)]
        Some(total / (self.times.len() as u32))
    }

    fn median(&self) -> Option<Duration> {
        if self.times.is_empty() {
            return None;
        }

        let mut times: Vec<_> = self.times.iter().copied().collect();
        times.sort();
        let mid = times.len() / 2;

        if times.len().is_multiple_of(2) {
            // Average of two middle values
            Some((times[mid - 1] + times[mid]) / 2)
        } else {
            Some(times[mid])
        }
    }
}

impl Default for TimingWindow {
    fn default() -> Self {
        Self {
            times: VecDeque::with_capacity(TIMING_WINDOW_CAPACITY),
            capacity: TIMING_WINDOW_CAPACITY,
        }
    }
}

/// Record and report statistics for a [`crate::RateLimitTransport`]
#[derive(Debug, Clone, Default)]
pub struct TransportStats {
    /// Total number of round trips attempted
    pub total_requests: u64,
    /// Number of successful requests (2xx status)
    pub successful_requests: u64,
    /// Number of requests that received rate limit responses (429)
    pub rate_limited: u64,
    /// Number of server error responses (5xx)
    pub server_errors: u64,
    /// Number of client error responses (4xx, excluding 429)
    pub client_errors: u64,
    /// Number of round trips that failed below the HTTP layer
    pub network_errors: u64,
    /// Number of requests that had to wait for the quota window to reset
    pub quota_waits: u64,
    /// Cumulative time spent waiting for quota resets
    pub quota_waited: Duration,
    /// Status code counts
    pub status_codes: HashMap<u16, u64>,
    /// Recent request durations for average/median calculation
    request_times: TimingWindow,
}

impl TransportStats {
    /// Record a response with status code and request duration
    pub(crate) fn record_response(&mut self, status_code: u16, request_time: Duration) {
        self.total_requests += 1;

        // Track status code
        *self.status_codes.entry(status_code).or_insert(0) += 1;

        // Categorize response
        match status_code {
            200..=299 => self.successful_requests += 1,
            429 => self.rate_limited += 1,
            400..=499 => self.client_errors += 1,
            500..=599 => self.server_errors += 1,
            _ => {} // Other status codes
        }

        self.request_times.push(request_time);
    }

    /// Record a round trip that never produced a response
    pub(crate) fn record_network_error(&mut self) {
        self.total_requests += 1;
        self.network_errors += 1;
    }

    /// Record a delay spent waiting for the quota window to reset
    pub(crate) fn record_quota_wait(&mut self, waited: Duration) {
        self.quota_waits += 1;
        self.quota_waited += waited;
    }

    /// Get median request time over the recent window
    #[must_use]
    pub fn median_request_time(&self) -> Option<Duration> {
        self.request_times.median()
    }

    /// Get average request time over the recent window
    #[must_use]
    pub fn average_request_time(&self) -> Option<Duration> {
        self.request_times.average()
    }

    /// Get error rate (percentage)
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        let errors =
            self.rate_limited + self.client_errors + self.server_errors + self.network_errors;
        #[allow(clippy::cast_precision_loss)]
        let error_rate = errors as f64 / self.total_requests as f64;
        error_rate * 100.0
    }

    /// Get the current success rate (0.0 to 1.0)
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            1.0 // Assume success until proven otherwise
        } else {
            #[allow(clippy::cast_precision_loss)]
            let success_rate = self.successful_requests as f64 / self.total_requests as f64;
            success_rate
        }
    }

    /// Get human-readable summary of the stats
    #[must_use]
    pub fn summary(&self) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let success_pct = (self.success_rate() * 100.0) as u64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let error_pct = self.error_rate() as u64;

        let avg_time = self
            .average_request_time()
            .map_or_else(|| "N/A".to_string(), |d| format!("{:.0}ms", d.as_millis()));

        format!(
            "{} requests ({}% success, {}% errors), avg: {}, waited {}ms for quota",
            self.total_requests,
            success_pct,
            error_pct,
            avg_time,
            self.quota_waited.as_millis()
        )
    }
}

impl Serialize for TransportStats {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let median_request_time_ms = self.median_request_time().map(|d| d.as_millis());

        let mut s = serializer.serialize_struct("TransportStats", 10)?;
        s.serialize_field("total_requests", &self.total_requests)?;
        s.serialize_field("successful_requests", &self.successful_requests)?;
        s.serialize_field("success_rate", &self.success_rate())?;
        s.serialize_field("rate_limited", &self.rate_limited)?;
        s.serialize_field("client_errors", &self.client_errors)?;
        s.serialize_field("server_errors", &self.server_errors)?;
        s.serialize_field("network_errors", &self.network_errors)?;
        s.serialize_field("quota_waits", &self.quota_waits)?;
        s.serialize_field("median_request_time_ms", &median_request_time_ms)?;
        s.serialize_field("status_codes", &self.status_codes)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stats_success_rate() {
        let mut stats = TransportStats::default();

        // No requests yet - should assume success
        assert!((stats.success_rate() - 1.0).abs() < f64::EPSILON);

        stats.record_response(200, Duration::from_millis(100));
        stats.record_response(200, Duration::from_millis(120));
        assert!((stats.success_rate() - 1.0).abs() < f64::EPSILON);

        stats.record_response(429, Duration::from_millis(150));
        assert!((stats.success_rate() - (2.0 / 3.0)).abs() < 0.001);

        stats.record_response(500, Duration::from_millis(200));
        assert!((stats.success_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_tracking() {
        let mut stats = TransportStats::default();

        assert_eq!(stats.total_requests, 0);
        assert!(stats.error_rate().abs() < f64::EPSILON);

        stats.record_response(200, Duration::from_millis(100));
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.successful_requests, 1);
        assert_eq!(stats.status_codes.get(&200), Some(&1));

        stats.record_response(429, Duration::from_millis(200));
        assert_eq!(stats.rate_limited, 1);
        assert!((stats.error_rate() - 50.0).abs() < f64::EPSILON);

        stats.record_network_error();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.network_errors, 1);

        // Network errors have no duration; median comes from responses only
        assert_eq!(
            stats.median_request_time(),
            Some(Duration::from_millis(150))
        );
    }

    #[test]
    fn test_timing_window_is_bounded() {
        let mut stats = TransportStats::default();
        for i in 0..(TIMING_WINDOW_CAPACITY as u64 + 50) {
            stats.record_response(200, Duration::from_millis(i));
        }

        assert_eq!(stats.request_times.times.len(), TIMING_WINDOW_CAPACITY);
        // Oldest entries were dropped, so the minimum kept duration is 50ms
        assert_eq!(
            stats.request_times.times.front(),
            Some(&Duration::from_millis(50))
        );
    }

    #[test]
    fn test_quota_wait_tracking() {
        let mut stats = TransportStats::default();
        stats.record_quota_wait(Duration::from_millis(200));
        stats.record_quota_wait(Duration::from_millis(300));

        assert_eq!(stats.quota_waits, 2);
        assert_eq!(stats.quota_waited, Duration::from_millis(500));
    }

    #[test]
    fn test_summary_formatting() {
        let mut stats = TransportStats::default();
        stats.record_response(200, Duration::from_millis(150));
        stats.record_response(500, Duration::from_millis(200));

        let summary = stats.summary();
        assert!(summary.contains("2 requests"));
        assert!(summary.contains("50% success"));
        assert!(summary.contains("50% errors"));
        assert!(summary.contains("175ms")); // average of 150 and 200
    }
}
