use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of concurrent in-flight requests in parallel mode
const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Configuration for a [`crate::RateLimitTransport`], fixed at
/// construction time.
///
/// There is no ambient or global toggle: each transport instance carries
/// its own configuration, so a serial and a parallel transport can live
/// side by side in the same process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// When `true`, requests may overlap up to `max_concurrent`.
    /// When `false`, requests execute strictly one at a time.
    #[serde(default)]
    pub parallel_requests: bool,

    /// Maximum number of simultaneously in-flight requests in parallel
    /// mode. Has no effect in serial mode.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Optional minimum interval between dispatches, enforced with a
    /// token bucket. `None` disables proactive pacing; header-driven
    /// back-pressure still applies.
    #[serde(default, with = "humantime_serde")]
    pub request_interval: Option<Duration>,
}

const fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            parallel_requests: false,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            request_interval: None,
        }
    }
}

impl TransportConfig {
    /// Create a `TransportConfig` from options, using defaults for missing values
    #[must_use]
    pub fn from_options(
        parallel_requests: bool,
        max_concurrent: Option<usize>,
        request_interval: Option<Duration>,
    ) -> Self {
        Self {
            parallel_requests,
            max_concurrent: max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT),
            request_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_serial() {
        let config = TransportConfig::default();
        assert!(!config.parallel_requests);
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.request_interval, None);
    }

    #[test]
    fn test_from_options() {
        let config = TransportConfig::from_options(true, None, Some(Duration::from_millis(50)));
        assert!(config.parallel_requests);
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.request_interval, Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_config_serialization() {
        let config = TransportConfig {
            parallel_requests: true,
            max_concurrent: 15,
            request_interval: Some(Duration::from_millis(200)),
        };

        let toml = toml::to_string(&config).unwrap();
        let deserialized: TransportConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let deserialized: TransportConfig = toml::from_str("parallel_requests = true").unwrap();
        assert!(deserialized.parallel_requests);
        assert_eq!(deserialized.max_concurrent, 10);
        assert_eq!(deserialized.request_interval, None);
    }
}
