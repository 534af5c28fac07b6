//! Pre-flight Validation Checks
//!
//! Validates configuration and reachability before an analysis.
//!
//! ## Checks
//!
//! - Configuration ranges and endpoint URLs
//! - Credential availability for the configured environment
//! - Transport chain construction
//! - Network reachability of the relay and (in development) the Gemini API
//!
//! The reachability result doubles as offline detection: when nothing
//! answers, the analysis can go straight to the fallback.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::provider::TransportChain;
use crate::ai::timeout::TimeoutConfig;
use crate::config::{Config, Environment};
use crate::constants::gemini as gemini_constants;
use crate::types::{FitError, Result};

/// Pre-flight check results
#[derive(Debug, Clone, Serialize)]
pub struct PreflightResult {
    /// All checks passed
    pub passed: bool,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Warnings (non-blocking)
    pub warnings: Vec<String>,
    /// Errors (blocking)
    pub errors: Vec<String>,
    /// Recommendations
    pub recommendations: Vec<String>,
    /// At least one inference endpoint answered
    pub online: bool,
}

impl PreflightResult {
    pub fn new() -> Self {
        Self {
            passed: true,
            checks: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            recommendations: Vec::new(),
            online: false,
        }
    }

    fn add_check(&mut self, check: CheckResult) {
        if !check.passed {
            self.passed = false;
            self.errors.push(check.message.clone());
        }
        if let Some(ref warn) = check.warning {
            self.warnings.push(warn.clone());
        }
        self.checks.push(check);
    }

    fn add_recommendation(&mut self, rec: String) {
        self.recommendations.push(rec);
    }
}

impl Default for PreflightResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Individual check result
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub warning: Option<String>,
    pub duration_ms: u64,
}

/// Pre-flight validation checker
pub struct PreflightCheck {
    timeouts: TimeoutConfig,
    client: reqwest::Client,
}

impl Default for PreflightCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl PreflightCheck {
    pub fn new() -> Self {
        Self::with_timeouts(TimeoutConfig::default())
    }

    pub fn with_timeouts(timeouts: TimeoutConfig) -> Self {
        Self {
            timeouts,
            client: reqwest::Client::new(),
        }
    }

    /// Run all pre-flight checks for an analysis
    pub async fn check_analysis(&self, config: &Config) -> PreflightResult {
        let mut result = PreflightResult::new();

        info!(environment = %config.environment, "Running pre-flight checks...");

        // 1. Configuration
        self.check_config(config, &mut result);

        // 2. Credential
        self.check_credential(config, &mut result);

        // 3. Transport chain
        self.check_transports(config, &mut result);

        // 4. Reachability
        self.check_reachability(config, &mut result).await;

        if result.passed {
            info!("Pre-flight checks passed ({} checks)", result.checks.len());
        } else {
            warn!("Pre-flight checks failed: {} errors", result.errors.len());
        }

        result
    }

    /// True when any endpoint the chain would use answers
    pub async fn is_online(&self, config: &Config) -> bool {
        let mut result = PreflightResult::new();
        self.check_reachability(config, &mut result).await;
        result.online
    }

    fn check_config(&self, config: &Config, result: &mut PreflightResult) {
        let start = Instant::now();
        let (passed, message) = match config.validate() {
            Ok(()) => (true, "Configuration is valid".to_string()),
            Err(e) => (false, e.to_string()),
        };

        result.add_check(CheckResult {
            name: "config".to_string(),
            passed,
            message,
            warning: None,
            duration_ms: start.elapsed().as_millis() as u64,
        });
    }

    fn check_credential(&self, config: &Config, result: &mut PreflightResult) {
        let start = Instant::now();
        let has_key = config.gemini.resolve_api_key().is_some();

        let (message, warning) = match (config.environment, has_key) {
            (_, true) => ("Gemini API key found".to_string(), None),
            (Environment::Development, false) => (
                "Gemini API key not set, direct transport will be skipped".to_string(),
                Some("Development mode will only use the relay".to_string()),
            ),
            (Environment::Production, false) => (
                "No local Gemini API key (the relay holds it)".to_string(),
                None,
            ),
        };

        if !has_key {
            result.add_recommendation(format!(
                "Set {} to enable the direct transport or to run the relay server",
                gemini_constants::API_KEY_ENV
            ));
        }

        result.add_check(CheckResult {
            name: "credential".to_string(),
            passed: true,
            message,
            warning,
            duration_ms: start.elapsed().as_millis() as u64,
        });
    }

    fn check_transports(&self, config: &Config, result: &mut PreflightResult) {
        let start = Instant::now();
        let (passed, message) = match TransportChain::for_environment(config) {
            Ok(chain) => (
                true,
                format!("Transport order: {}", chain.transport_names().join(" -> ")),
            ),
            Err(e) => (false, e.to_string()),
        };

        result.add_check(CheckResult {
            name: "transports".to_string(),
            passed,
            message,
            warning: None,
            duration_ms: start.elapsed().as_millis() as u64,
        });
    }

    /// Unreachable endpoints are warnings: the analysis can still fall back.
    async fn check_reachability(&self, config: &Config, result: &mut PreflightResult) {
        let mut targets = vec![("relay", config.relay.url.clone())];
        if config.environment == Environment::Development {
            targets.insert(0, ("gemini", config.gemini.api_base.clone()));
        }

        for (name, url) in targets {
            let start = Instant::now();
            let outcome = self.probe(&url, self.timeouts.probe).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (message, warning) = match outcome {
                Ok(status) => {
                    result.online = true;
                    (format!("{} reachable (HTTP {})", name, status), None)
                }
                Err(e) => (
                    format!("{} unreachable", name),
                    Some(format!("{} at {} did not answer: {}", name, url, e)),
                ),
            };

            result.add_check(CheckResult {
                name: format!("reachability_{}", name),
                passed: true,
                message,
                warning,
                duration_ms,
            });
        }

        if !result.online {
            result.add_recommendation(
                "No endpoint answered; analyze will use the offline estimate unless the fallback policy is never".to_string(),
            );
        }
    }

    /// Any HTTP answer counts as reachable
    async fn probe(&self, url: &str, timeout: Duration) -> Result<u16> {
        debug!(url = %url, "Probing endpoint");
        let response = self
            .client
            .request(reqwest::Method::OPTIONS, url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FitError::network(e.without_url()))?;
        Ok(response.status().as_u16())
    }
}
