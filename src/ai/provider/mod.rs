//! Transport Abstraction
//!
//! Defines the `Transport` trait: one strategy for getting a prompt to Gemini
//! and a JSON value back. Transports make a single request per invocation;
//! retries, backoff and ordering live in [`TransportChain`].
//!
//! ## Modules
//!
//! - `gemini`: generateContent HTTP client shared with the relay server
//! - `direct`: calls Gemini with a locally held credential
//! - `relay`: calls the trusted relay that holds the credential
//! - `chain`: environment-ordered transport chain with retry and backoff

mod chain;
mod direct;
mod gemini;
mod relay;

pub use chain::{AttemptRecord, ChainConfig, ChainStats, Sleeper, TokioSleeper, TransportChain};
pub use direct::DirectTransport;
pub use gemini::GeminiClient;
pub use relay::RelayTransport;

// Re-export error types from centralized location
pub use crate::types::{ClassifiedFailure, ErrorClassifier, FailureKind};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::config::{Config, Environment};
use crate::types::Result;

// =============================================================================
// Transport Kind
// =============================================================================

/// Calling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Provider endpoint with a client-side credential
    Direct,
    /// Trusted server-side relay
    Relay,
}

impl TransportKind {
    /// Transport order for an environment
    pub fn order_for(environment: Environment) -> &'static [TransportKind] {
        match environment {
            Environment::Development => &[TransportKind::Direct, TransportKind::Relay],
            Environment::Production => &[TransportKind::Relay],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Direct => "direct",
            TransportKind::Relay => "relay",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared transport type for use across the chain and callers.
pub type SharedTransport = Arc<dyn Transport>;

// =============================================================================
// Transport Trait
// =============================================================================

/// One way of invoking the model
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the prompt once and return the sanitized JSON value
    async fn invoke(&self, prompt: &str) -> Result<Value>;

    /// Transport name for logging and diagnostics
    fn name(&self) -> &str;

    fn kind(&self) -> TransportKind;
}

/// Create a shared transport from configuration
pub fn create_transport(kind: TransportKind, config: &Config) -> Result<SharedTransport> {
    match kind {
        TransportKind::Direct => Ok(Arc::new(DirectTransport::new(&config.gemini)?)),
        TransportKind::Relay => Ok(Arc::new(RelayTransport::new(
            &config.relay,
            config.gemini.timeout_secs,
        )?)),
    }
}
