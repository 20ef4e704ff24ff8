//! Rate-limit backpressure for the lookup service.
//!
//! The service advertises its quota through two response headers whose names
//! come from configuration. When the remaining count is exactly `"0"` the
//! client must wait the advertised retry-after seconds plus a fixed safety
//! margin before the next request. There is no retry policy of our own: a
//! response is always used as-is and the wait only delays the next lookup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::warn;

use crate::config::LookupConfig;

/// Header-driven wait rule.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    /// Header with the remaining request count
    pub remaining_header: String,

    /// Header with the seconds until the quota resets
    pub retry_after_header: String,

    /// Added to the advertised wait
    pub safety_margin: Duration,
}

impl RateLimitPolicy {
    pub fn from_config(config: &LookupConfig) -> Self {
        Self {
            remaining_header: config.remaining_header.clone(),
            retry_after_header: config.retry_after_header.clone(),
            safety_margin: config.safety_margin,
        }
    }

    /// How long to wait after a response with these headers, if at all.
    ///
    /// Returns `None` unless the remaining count is the literal `"0"`. An
    /// exhausted quota with a missing, non-integer or overflowing retry-after
    /// is logged and treated as no wait.
    pub fn backoff(&self, headers: &HeaderMap) -> Option<Duration> {
        let remaining = headers
            .get(self.remaining_header.as_str())
            .and_then(|v| v.to_str().ok())?;
        if remaining != "0" {
            return None;
        }

        let raw = headers
            .get(self.retry_after_header.as_str())
            .and_then(|v| v.to_str().ok());
        let wait = raw
            .and_then(|s| s.trim().parse::<u64>().ok())
            .and_then(|secs| Duration::from_secs(secs).checked_add(self.safety_margin));
        match wait {
            Some(wait) => Some(wait),
            None => {
                warn!(
                    header = %self.retry_after_header,
                    value = raw.unwrap_or("<absent>"),
                    "Request quota exhausted but retry-after is not a usable number of seconds"
                );
                None
            }
        }
    }
}

/// Where the lookup client waits. Swappable so tests can observe waits
/// without sleeping.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    fn policy() -> RateLimitPolicy {
        RateLimitPolicy {
            remaining_header: "X-Rl".into(),
            retry_after_header: "X-Ttl".into(),
            safety_margin: Duration::from_secs(2),
        }
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(k, v) in pairs {
            map.insert(HeaderName::from_static(k), HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn exhausted_quota_waits_retry_after_plus_margin() {
        let h = headers(&[("x-rl", "0"), ("x-ttl", "5")]);
        assert_eq!(policy().backoff(&h), Some(Duration::from_secs(7)));
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let h = headers(&[("x-rl", "0"), ("x-ttl", "0")]);
        assert_eq!(policy().backoff(&h), Some(Duration::from_secs(2)));
    }

    #[test]
    fn remaining_quota_means_no_wait() {
        assert_eq!(policy().backoff(&headers(&[("x-rl", "44"), ("x-ttl", "5")])), None);
        assert_eq!(policy().backoff(&headers(&[("x-ttl", "5")])), None);
        // Only the literal "0" counts as exhausted.
        assert_eq!(policy().backoff(&headers(&[("x-rl", "00"), ("x-ttl", "5")])), None);
    }

    #[test]
    fn unusable_retry_after_means_no_wait() {
        assert_eq!(policy().backoff(&headers(&[("x-rl", "0")])), None);
        assert_eq!(
            policy().backoff(&headers(&[("x-rl", "0"), ("x-ttl", "soon")])),
            None
        );
    }

    #[test]
    fn overflowing_retry_after_means_no_wait() {
        let h = headers(&[("x-rl", "0"), ("x-ttl", "18446744073709551615")]);
        assert_eq!(policy().backoff(&h), None);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_pacer_sleeps_for_the_duration() {
        let start = tokio::time::Instant::now();
        TokioPacer.pause(Duration::from_secs(7)).await;
        assert!(start.elapsed() >= Duration::from_secs(7));
    }
}
