//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/resumefit/) and project (.resumefit/) level configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{chain, extraction, gemini, network, relay};
use crate::types::{FitError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Deployment environment, decides the transport order
    pub environment: Environment,

    /// Gemini provider settings
    pub gemini: GeminiConfig,

    /// Relay settings (client URL and server bind)
    pub relay: RelayConfig,

    /// Retry and backoff settings
    pub retry: RetryConfig,

    /// Analysis pipeline settings
    pub analysis: AnalysisConfig,

    /// Document extraction limits
    pub extraction: ExtractionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            environment: Environment::default(),
            gemini: GeminiConfig::default(),
            relay: RelayConfig::default(),
            retry: RetryConfig::default(),
            analysis: AnalysisConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `FitError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.retry.retries == 0 {
            return Err(FitError::Config(
                "retry.retries must be at least 1".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            return Err(FitError::Config(format!(
                "gemini.temperature must be between 0.0 and 2.0, got {}",
                self.gemini.temperature
            )));
        }

        if !(0.0..=1.0).contains(&self.gemini.top_p) {
            return Err(FitError::Config(format!(
                "gemini.top_p must be between 0.0 and 1.0, got {}",
                self.gemini.top_p
            )));
        }

        if self.gemini.timeout_secs == 0 {
            return Err(FitError::Config(
                "gemini.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.attempt_timeout_secs == Some(0) {
            return Err(FitError::Config(
                "retry.attempt_timeout_secs must be greater than 0 when set".to_string(),
            ));
        }

        url::Url::parse(&self.relay.url).map_err(|e| {
            FitError::Config(format!("relay.url '{}' is not a valid URL: {}", self.relay.url, e))
        })?;

        if !self.relay.path.starts_with('/') {
            return Err(FitError::Config(format!(
                "relay.path must start with '/', got {}",
                self.relay.path
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment
///
/// Development tries the direct transport first and falls back to the relay;
/// production only ever uses the relay so the credential stays server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!(
                "Unknown environment: {}. Valid values: development, production",
                s
            )),
        }
    }
}

// =============================================================================
// Gemini Configuration
// =============================================================================

/// Gemini provider settings
///
/// The API key is never serialized and is redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Model name
    pub model: String,

    /// API base URL
    pub api_base: String,

    /// API key (falls back to the GEMINI_API_KEY env var)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: gemini::DEFAULT_MODEL.to_string(),
            api_base: gemini::DEFAULT_API_BASE.to_string(),
            api_key: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: gemini::TEMPERATURE,
            top_p: gemini::TOP_P,
            top_k: gemini::TOP_K,
            max_output_tokens: gemini::MAX_OUTPUT_TOKENS,
        }
    }
}

impl GeminiConfig {
    /// Configured key, or the GEMINI_API_KEY environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(gemini::API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

// =============================================================================
// Relay Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// URL the relay transport posts prompts to
    pub url: String,

    /// Address the relay server binds to
    pub bind: String,

    /// Route the relay server mounts the proxy on
    pub path: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: relay::DEFAULT_URL.to_string(),
            bind: relay::DEFAULT_BIND.to_string(),
            path: relay::DEFAULT_PATH.to_string(),
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per transport
    pub retries: u32,

    /// Base delay for backoff in milliseconds
    pub base_delay_ms: u64,

    /// Optional per-attempt timeout in seconds
    pub attempt_timeout_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: chain::DEFAULT_RETRIES,
            base_delay_ms: chain::BASE_DELAY_MS,
            attempt_timeout_secs: None,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_secs.map(Duration::from_secs)
    }
}

// =============================================================================
// Analysis Configuration
// =============================================================================

/// When a total invocation failure is replaced by the offline analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Always surface the failure
    Never,
    /// Substitute the fallback result for network failures only
    #[default]
    OnNetworkError,
    /// Substitute for any retryable failure kind
    OnAnyFailure,
}

impl std::fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackPolicy::Never => write!(f, "never"),
            FallbackPolicy::OnNetworkError => write!(f, "on-network-error"),
            FallbackPolicy::OnAnyFailure => write!(f, "on-any-failure"),
        }
    }
}

impl std::str::FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "never" => Ok(FallbackPolicy::Never),
            "on-network-error" => Ok(FallbackPolicy::OnNetworkError),
            "on-any-failure" => Ok(FallbackPolicy::OnAnyFailure),
            _ => Err(format!(
                "Unknown fallback policy: {}. Valid values: never, on-network-error, on-any-failure",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub fallback: FallbackPolicy,
}

// =============================================================================
// Extraction Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum file size in bytes
    pub max_file_size: u64,

    /// Maximum PDF pages read
    pub max_pdf_pages: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_file_size: extraction::MAX_FILE_SIZE,
            max_pdf_pages: extraction::MAX_PDF_PAGES,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
