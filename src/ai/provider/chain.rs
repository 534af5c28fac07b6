//! Transport Chain
//!
//! Resolves a prompt by walking transports in environment order, retrying
//! each with backoff and escalating one classified failure at the end.
//!
//! ## Strategy
//!
//! 1. Try the transport, up to `retries` attempts
//! 2. On failure, classify it with [`ErrorClassifier`]
//! 3. Safety blocks and configuration errors abort the whole chain
//! 4. Rate limits, overload and network failures wait `base * 2^attempt`,
//!    including after the last attempt of a transport that is not the final one
//! 5. Other failures wait `base` between attempts and move on without waiting
//! 6. The last attempt on the last transport escalates its failure

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{SharedTransport, TransportKind, create_transport};
use crate::ai::timeout::maybe_with_timeout;
use crate::config::{Config, RetryConfig};
use crate::constants::chain as chain_constants;
use crate::types::{ClassifiedFailure, ErrorClassifier, FitError, Result, RetryPolicy};

// =============================================================================
// Sleeper
// =============================================================================

/// Backoff wait, injectable so tests can record delays instead of sleeping
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Waits on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// =============================================================================
// Configuration and Stats
// =============================================================================

/// Retry parameters for the chain
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Attempts per transport
    pub retries: u32,
    /// Base delay for backoff
    pub base_delay: Duration,
    /// Per-attempt timeout; the HTTP client timeout applies when unset
    pub attempt_timeout: Option<Duration>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            retries: chain_constants::DEFAULT_RETRIES,
            base_delay: Duration::from_millis(chain_constants::BASE_DELAY_MS),
            attempt_timeout: None,
        }
    }
}

impl From<&RetryConfig> for ChainConfig {
    fn from(config: &RetryConfig) -> Self {
        Self {
            retries: config.retries,
            base_delay: config.base_delay(),
            attempt_timeout: config.attempt_timeout(),
        }
    }
}

impl ChainConfig {
    /// Wait before the next attempt, `None` meaning move on immediately
    fn delay_for(
        &self,
        policy: RetryPolicy,
        attempt: u32,
        is_last_attempt: bool,
    ) -> Option<Duration> {
        match policy {
            RetryPolicy::Exponential => {
                Some(self.base_delay.saturating_mul(2u32.saturating_pow(attempt)))
            }
            RetryPolicy::Flat if is_last_attempt => None,
            RetryPolicy::Flat => Some(self.base_delay),
            RetryPolicy::Abort => None,
        }
    }
}

/// One attempt on one transport
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub transport: String,
    /// 1-based attempt number on this transport
    pub attempt_number: u32,
    pub failure: Option<ClassifiedFailure>,
    pub duration_ms: u64,
}

/// Execution statistics for the chain
#[derive(Debug, Default)]
pub struct ChainStats {
    pub total_attempts: usize,
    pub successful_transport: Option<String>,
    pub attempts: Vec<AttemptRecord>,
    pub waits: Vec<Duration>,
    pub total_duration_ms: u64,
}

// =============================================================================
// Transport Chain
// =============================================================================

/// Ordered transports with retry, backoff and failure classification
#[derive(Clone)]
pub struct TransportChain {
    transports: Vec<SharedTransport>,
    config: ChainConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for TransportChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportChain")
            .field(
                "transports",
                &self.transports.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}

impl TransportChain {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            transports: Vec::new(),
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Append a transport; transports are tried in insertion order
    pub fn with_transport(mut self, transport: SharedTransport) -> Self {
        self.transports.push(transport);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Build the chain for the configured environment
    ///
    /// Transports that cannot be built are skipped; an empty chain is a
    /// configuration error.
    pub fn for_environment(config: &Config) -> Result<Self> {
        let mut chain = Self::new(ChainConfig::from(&config.retry));
        let mut skipped = Vec::new();

        for &kind in TransportKind::order_for(config.environment) {
            match create_transport(kind, config) {
                Ok(transport) => chain.transports.push(transport),
                Err(e) => {
                    warn!(transport = %kind, error = %e, "Skipping transport");
                    skipped.push(format!("{}: {}", kind, e));
                }
            }
        }

        if chain.transports.is_empty() {
            return Err(FitError::Config(format!(
                "No usable transport for {} environment ({})",
                config.environment,
                skipped.join("; ")
            )));
        }

        debug!(
            environment = %config.environment,
            transports = ?chain.transport_names(),
            "Transport chain ready"
        );

        Ok(chain)
    }

    pub fn transport_names(&self) -> Vec<&str> {
        self.transports.iter().map(|t| t.name()).collect()
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Resolve a prompt into a JSON value
    pub async fn resolve(&self, prompt: &str) -> Result<Value> {
        self.resolve_with_cancel(prompt, &CancellationToken::new())
            .await
    }

    /// Resolve a prompt, aborting in-flight requests and waits on cancellation
    pub async fn resolve_with_cancel(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let (value, _stats) = self.execute(prompt, cancel).await?;
        Ok(value)
    }

    /// Resolve and return the value with execution statistics
    #[instrument(skip(self, prompt, cancel), fields(transports = self.transports.len()))]
    pub async fn execute(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<(Value, ChainStats)> {
        let mut stats = ChainStats::default();
        let start_time = Instant::now();

        if self.transports.is_empty() {
            return Err(FitError::Config(
                "No transports configured in chain".to_string(),
            ));
        }

        let retries = self.config.retries.max(1);
        let mut last_failure: Option<ClassifiedFailure> = None;

        for (index, transport) in self.transports.iter().enumerate() {
            let transport_name = transport.name().to_string();
            let is_last_transport = index + 1 == self.transports.len();

            for attempt in 0..retries {
                if cancel.is_cancelled() {
                    return Err(FitError::Cancelled);
                }

                let is_last_attempt = attempt + 1 == retries;
                stats.total_attempts += 1;
                let attempt_start = Instant::now();

                debug!(
                    transport = %transport_name,
                    attempt = attempt + 1,
                    retries,
                    "Chain attempt"
                );

                let outcome = tokio::select! {
                    _ = cancel.cancelled() => Err(FitError::Cancelled),
                    result = maybe_with_timeout(
                        self.config.attempt_timeout,
                        transport.invoke(prompt),
                        &transport_name,
                    ) => result,
                };
                let duration_ms = attempt_start.elapsed().as_millis() as u64;

                let err = match outcome {
                    Ok(value) => {
                        stats.attempts.push(AttemptRecord {
                            transport: transport_name.clone(),
                            attempt_number: attempt + 1,
                            failure: None,
                            duration_ms,
                        });
                        stats.successful_transport = Some(transport_name.clone());
                        stats.total_duration_ms = start_time.elapsed().as_millis() as u64;

                        info!(
                            transport = %transport_name,
                            attempts = stats.total_attempts,
                            "Chain succeeded"
                        );
                        return Ok((value, stats));
                    }
                    Err(FitError::Cancelled) => return Err(FitError::Cancelled),
                    Err(err) => err,
                };

                let failure = ErrorClassifier::classify_error(&err, &transport_name);
                stats.attempts.push(AttemptRecord {
                    transport: transport_name.clone(),
                    attempt_number: attempt + 1,
                    failure: Some(failure.clone()),
                    duration_ms,
                });

                warn!(
                    transport = %transport_name,
                    attempt = attempt + 1,
                    kind = %failure.kind,
                    error = %err,
                    "Transport attempt failed"
                );

                let policy = failure.kind.retry_policy();

                if policy == RetryPolicy::Abort {
                    warn!(kind = %failure.kind, "Aborting chain");
                    stats.total_duration_ms = start_time.elapsed().as_millis() as u64;
                    return Err(failure.into());
                }

                if is_last_transport && is_last_attempt {
                    warn!(diagnostic = %failure.diagnostic(), "All transports exhausted");
                    stats.total_duration_ms = start_time.elapsed().as_millis() as u64;
                    return Err(failure.into());
                }

                match self.config.delay_for(policy, attempt, is_last_attempt) {
                    Some(delay) => {
                        debug!(delay_ms = delay.as_millis() as u64, "Backing off");
                        stats.waits.push(delay);
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(FitError::Cancelled),
                            _ = self.sleeper.sleep(delay) => {}
                        }
                    }
                    None => {
                        info!(transport = %transport_name, "Moving to next transport");
                    }
                }

                last_failure = Some(failure);
            }
        }

        // Only reachable when the final transport's loop ends without escalating.
        Err(last_failure
            .map(FitError::from)
            .unwrap_or_else(|| FitError::Config("All transports failed".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::Transport;
    use crate::types::FailureKind;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Records requested waits without sleeping
    #[derive(Debug, Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn waits(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    /// Scripted transport: fails with the given messages, then succeeds
    struct MockTransport {
        name: String,
        kind: TransportKind,
        failures: Vec<FitError>,
        calls: AtomicU32,
    }

    impl MockTransport {
        fn new(name: &str, kind: TransportKind) -> Self {
            Self {
                name: name.to_string(),
                kind,
                failures: Vec::new(),
                calls: AtomicU32::new(0),
            }
        }

        fn failing(mut self, errors: Vec<FitError>) -> Self {
            self.failures = errors;
            self
        }

        fn always(name: &str, kind: TransportKind, make: fn() -> FitError) -> Self {
            Self::new(name, kind).failing((0..100).map(|_| make()).collect())
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn invoke(&self, _prompt: &str) -> Result<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match self.failures.get(call) {
                Some(FitError::Transport { status, message }) => Err(FitError::Transport {
                    status: *status,
                    message: message.clone(),
                }),
                Some(FitError::InvalidResponse { raw, reason }) => Err(FitError::InvalidResponse {
                    raw: raw.clone(),
                    reason: reason.clone(),
                }),
                Some(FitError::Config(msg)) => Err(FitError::Config(msg.clone())),
                Some(other) => Err(FitError::Transport {
                    status: None,
                    message: other.to_string(),
                }),
                None => Ok(json!({"transport": self.name})),
            }
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> TransportKind {
            self.kind
        }
    }

    fn rate_limited() -> FitError {
        FitError::http_status(429, "HTTP error! status: 429")
    }

    fn network() -> FitError {
        FitError::network("fetch failed")
    }

    fn safety() -> FitError {
        FitError::Transport {
            status: None,
            message: "Response blocked by SAFETY filter".to_string(),
        }
    }

    fn unknown() -> FitError {
        FitError::http_status(500, "HTTP error! status: 500")
    }

    fn base() -> Duration {
        Duration::from_millis(100)
    }

    fn chain_with(
        retries: u32,
        transports: Vec<Arc<MockTransport>>,
    ) -> (TransportChain, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut chain = TransportChain::new(ChainConfig {
            retries,
            base_delay: base(),
            attempt_timeout: None,
        })
        .with_sleeper(sleeper.clone());
        for t in transports {
            chain = chain.with_transport(t);
        }
        (chain, sleeper)
    }

    fn kind_of(err: &FitError) -> FailureKind {
        match err {
            FitError::Invocation(failure) => failure.kind,
            other => panic!("expected invocation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_first_transport() {
        let direct = Arc::new(MockTransport::new("direct", TransportKind::Direct));
        let relay = Arc::new(MockTransport::new("relay", TransportKind::Relay));
        let (chain, sleeper) = chain_with(3, vec![direct.clone(), relay.clone()]);

        let (value, stats) = chain
            .execute("prompt", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(value["transport"], "direct");
        assert_eq!(stats.total_attempts, 1);
        assert_eq!(stats.successful_transport.as_deref(), Some("direct"));
        assert_eq!(relay.calls(), 0);
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn test_safety_block_aborts_without_second_transport() {
        let direct = Arc::new(MockTransport::always("direct", TransportKind::Direct, safety));
        let relay = Arc::new(MockTransport::new("relay", TransportKind::Relay));
        let (chain, sleeper) = chain_with(3, vec![direct.clone(), relay.clone()]);

        let err = chain.resolve("prompt").await.unwrap_err();

        assert_eq!(kind_of(&err), FailureKind::SafetyBlocked);
        assert_eq!(
            err.to_string(),
            "The request was blocked due to safety settings. Please modify your input."
        );
        assert_eq!(direct.calls(), 1);
        assert_eq!(relay.calls(), 0);
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_exhausts_retries_with_doubling_waits() {
        let relay = Arc::new(MockTransport::always("relay", TransportKind::Relay, rate_limited));
        let (chain, sleeper) = chain_with(3, vec![relay.clone()]);

        let err = chain.resolve("prompt").await.unwrap_err();

        assert_eq!(kind_of(&err), FailureKind::RateLimited);
        assert_eq!(relay.calls(), 3);
        assert_eq!(sleeper.waits(), vec![base(), base() * 2]);
    }

    #[tokio::test]
    async fn test_rate_limited_everywhere_escalates_quota_message() {
        let direct = Arc::new(MockTransport::always("direct", TransportKind::Direct, rate_limited));
        let relay = Arc::new(MockTransport::always("relay", TransportKind::Relay, rate_limited));
        let (chain, sleeper) = chain_with(2, vec![direct.clone(), relay.clone()]);

        let err = chain.resolve("prompt").await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "You have exceeded your API quota. Please check your plan and billing details, or try again later."
        );
        assert_eq!(direct.calls(), 2);
        assert_eq!(relay.calls(), 2);
        // the last attempt on a non-final transport still backs off
        assert_eq!(sleeper.waits(), vec![base(), base() * 2, base()]);
    }

    #[tokio::test]
    async fn test_network_failure_falls_through_to_relay() {
        let direct = Arc::new(MockTransport::always("direct", TransportKind::Direct, network));
        let relay = Arc::new(MockTransport::new("relay", TransportKind::Relay));
        let (chain, sleeper) = chain_with(3, vec![direct.clone(), relay.clone()]);

        let (value, stats) = chain
            .execute("prompt", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(value["transport"], "relay");
        assert_eq!(stats.total_attempts, 4);
        assert_eq!(direct.calls(), 3);
        assert_eq!(sleeper.waits(), vec![base(), base() * 2, base() * 4]);
    }

    #[tokio::test]
    async fn test_unknown_failure_flat_wait_and_no_wait_on_last_attempt() {
        let direct = Arc::new(MockTransport::always("direct", TransportKind::Direct, unknown));
        let relay = Arc::new(MockTransport::new("relay", TransportKind::Relay));
        let (chain, sleeper) = chain_with(3, vec![direct, relay]);

        chain.resolve("prompt").await.unwrap();

        assert_eq!(sleeper.waits(), vec![base(), base()]);
    }

    #[tokio::test]
    async fn test_retry_then_success_same_transport() {
        let relay = Arc::new(
            MockTransport::new("relay", TransportKind::Relay).failing(vec![network(), unknown()]),
        );
        let (chain, sleeper) = chain_with(3, vec![relay.clone()]);

        let (_, stats) = chain
            .execute("prompt", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.attempts[0].failure.as_ref().unwrap().kind, FailureKind::NetworkError);
        assert_eq!(sleeper.waits(), vec![base(), base()]);
    }

    #[tokio::test]
    async fn test_invalid_response_escalates_generic_message() {
        let relay = Arc::new(MockTransport::always("relay", TransportKind::Relay, || {
            FitError::InvalidResponse {
                raw: "nope".to_string(),
                reason: "expected value".to_string(),
            }
        }));
        let (chain, _) = chain_with(2, vec![relay]);

        let err = chain.resolve("prompt").await.unwrap_err();
        assert_eq!(kind_of(&err), FailureKind::InvalidResponse);
        assert_eq!(
            err.to_string(),
            "Failed to generate content from AI after multiple attempts."
        );
    }

    #[tokio::test]
    async fn test_configuration_error_never_retried() {
        let direct = Arc::new(MockTransport::always("direct", TransportKind::Direct, || {
            FitError::Config("missing key".to_string())
        }));
        let relay = Arc::new(MockTransport::new("relay", TransportKind::Relay));
        let (chain, _) = chain_with(3, vec![direct.clone(), relay.clone()]);

        let err = chain.resolve("prompt").await.unwrap_err();
        assert_eq!(kind_of(&err), FailureKind::ConfigurationError);
        assert_eq!(direct.calls(), 1);
        assert_eq!(relay.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let relay = Arc::new(MockTransport::new("relay", TransportKind::Relay));
        let (chain, _) = chain_with(3, vec![relay.clone()]);
        let token = CancellationToken::new();
        token.cancel();

        let err = chain.resolve_with_cancel("prompt", &token).await.unwrap_err();
        assert!(matches!(err, FitError::Cancelled));
        assert_eq!(relay.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let relay = Arc::new(MockTransport::always("relay", TransportKind::Relay, network));
        let chain = TransportChain::new(ChainConfig {
            retries: 3,
            base_delay: Duration::from_secs(60),
            attempt_timeout: None,
        })
        .with_transport(relay.clone());

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = chain.resolve_with_cancel("prompt", &token).await.unwrap_err();
        assert!(matches!(err, FitError::Cancelled));
        assert_eq!(relay.calls(), 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout_classifies_as_network() {
        struct SlowTransport;

        #[async_trait]
        impl Transport for SlowTransport {
            async fn invoke(&self, _prompt: &str) -> Result<Value> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(json!({}))
            }
            fn name(&self) -> &str {
                "slow"
            }
            fn kind(&self) -> TransportKind {
                TransportKind::Relay
            }
        }

        let sleeper = Arc::new(RecordingSleeper::default());
        let chain = TransportChain::new(ChainConfig {
            retries: 1,
            base_delay: base(),
            attempt_timeout: Some(Duration::from_millis(10)),
        })
        .with_sleeper(sleeper)
        .with_transport(Arc::new(SlowTransport));

        let err = chain.resolve("prompt").await.unwrap_err();
        assert_eq!(kind_of(&err), FailureKind::NetworkError);
    }

    #[tokio::test]
    async fn test_empty_chain_is_config_error() {
        let chain = TransportChain::new(ChainConfig::default());
        assert!(matches!(
            chain.resolve("prompt").await,
            Err(FitError::Config(_))
        ));
    }

    #[test]
    fn test_for_environment_production_is_relay_only() {
        let config = Config::default();
        let chain = TransportChain::for_environment(&config).unwrap();
        assert_eq!(chain.transport_names(), vec!["relay"]);
    }

    #[test]
    fn test_for_environment_development_order() {
        let mut config = Config::default();
        config.environment = crate::config::Environment::Development;
        config.gemini.api_key = Some("test-key".to_string());
        let chain = TransportChain::for_environment(&config).unwrap();
        assert_eq!(chain.transport_names(), vec!["direct", "relay"]);
    }

    #[test]
    fn test_delay_for() {
        let config = ChainConfig {
            retries: 3,
            base_delay: base(),
            attempt_timeout: None,
        };
        assert_eq!(config.delay_for(RetryPolicy::Exponential, 2, true), Some(base() * 4));
        assert_eq!(config.delay_for(RetryPolicy::Flat, 0, false), Some(base()));
        assert_eq!(config.delay_for(RetryPolicy::Flat, 2, true), None);
        assert_eq!(config.delay_for(RetryPolicy::Abort, 0, false), None);
    }
}
