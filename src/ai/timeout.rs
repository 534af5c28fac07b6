//! Timeout Helpers
//!
//! Wraps async operations so an overrun surfaces as [`FitError::Timeout`],
//! which the orchestrator classifies as a network failure.
//!
//! ```ignore
//! use crate::ai::timeout::with_timeout;
//!
//! let value = with_timeout(Duration::from_secs(30), transport.invoke(prompt), "relay").await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::constants::network as net_constants;
use crate::types::{FitError, Result};

/// Timeouts for checks that leave the process. Model requests are bounded
/// by the HTTP client and the chain's per-attempt timeout instead.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Preflight reachability probe
    pub probe: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(net_constants::PROBE_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    pub fn with_probe_secs(secs: u64) -> Self {
        Self {
            probe: Duration::from_secs(secs),
        }
    }
}

/// Execute an async operation with a timeout
///
/// Returns [`FitError::Timeout`] if the operation doesn't complete within
/// `timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(FitError::timeout(operation_name, timeout)),
    }
}

/// Run with a timeout only when one is configured
pub async fn maybe_with_timeout<T, F>(
    timeout: Option<Duration>,
    future: F,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => with_timeout(limit, future, operation_name).await,
        None => future.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorClassifier, FailureKind};

    #[test]
    fn test_timeout_config_defaults() {
        let config = TimeoutConfig::default();
        assert_eq!(config.probe.as_secs(), 5);
        assert_eq!(TimeoutConfig::with_probe_secs(2).probe.as_secs(), 2);
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, FitError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, FitError>(42)
            },
            "slow operation",
        )
        .await;
        let err = result.unwrap_err();
        assert!(matches!(err, FitError::Timeout { .. }));
        assert_eq!(
            ErrorClassifier::classify_error(&err, "relay").kind,
            FailureKind::NetworkError
        );
    }

    #[tokio::test]
    async fn test_maybe_with_timeout_none_passes_through() {
        let result = maybe_with_timeout(None, async { Ok::<_, FitError>("done") }, "op").await;
        assert_eq!(result.unwrap(), "done");
    }
}
