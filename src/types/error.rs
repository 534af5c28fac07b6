//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provides failure classification for retry and escalation decisions.
//!
//! ## Failure Kinds
//!
//! - **RateLimited**: provider quota exhausted (exponential backoff)
//! - **ServiceUnavailable**: provider overloaded (exponential backoff)
//! - **SafetyBlocked**: prompt rejected by safety settings (abort)
//! - **NetworkError**: connectivity issues (exponential backoff)
//! - **InvalidResponse**: model output could not be sanitized (flat retry)
//! - **ConfigurationError**: missing credential or endpoint (abort)
//! - **Unknown**: anything else (flat retry)

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Failure Kinds
// =============================================================================

/// Failure categories driving retry and escalation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    RateLimited,
    ServiceUnavailable,
    SafetyBlocked,
    NetworkError,
    InvalidResponse,
    ConfigurationError,
    Unknown,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
            Self::SafetyBlocked => write!(f, "SAFETY_BLOCKED"),
            Self::NetworkError => write!(f, "NETWORK_ERROR"),
            Self::InvalidResponse => write!(f, "INVALID_RESPONSE"),
            Self::ConfigurationError => write!(f, "CONFIGURATION_ERROR"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// How the orchestrator waits before the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// `base_delay * 2^attempt`
    Exponential,
    /// `base_delay`, and no wait after the last attempt on a transport
    Flat,
    /// Abort the whole resolution
    Abort,
}

impl FailureKind {
    /// Retry behaviour for this kind
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RateLimited | Self::ServiceUnavailable | Self::NetworkError => {
                RetryPolicy::Exponential
            }
            Self::InvalidResponse | Self::Unknown => RetryPolicy::Flat,
            Self::SafetyBlocked | Self::ConfigurationError => RetryPolicy::Abort,
        }
    }

    /// Check if this kind is retried on the same transport
    pub fn is_retryable(&self) -> bool {
        self.retry_policy() != RetryPolicy::Abort
    }

    /// Message shown to the end user once retries are exhausted
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimited => {
                "You have exceeded your API quota. Please check your plan and billing details, or try again later."
            }
            Self::ServiceUnavailable => {
                "The AI service is currently overloaded. Please try again in a few moments."
            }
            Self::SafetyBlocked => {
                "The request was blocked due to safety settings. Please modify your input."
            }
            Self::NetworkError => {
                "Network connectivity issue. Please check your internet connection and try again."
            }
            Self::ConfigurationError => "The AI service is not configured",
            Self::InvalidResponse | Self::Unknown => {
                "Failed to generate content from AI after multiple attempts."
            }
        }
    }
}

// =============================================================================
// Classified Failure
// =============================================================================

/// A classified invocation failure with its raw detail
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedFailure {
    /// Failure category for routing decisions
    pub kind: FailureKind,
    /// Raw underlying message (diagnostics, never shown as-is)
    pub detail: String,
    /// HTTP status, when the failure came from a response
    pub status: Option<u16>,
    /// Transport that produced the failure
    pub transport: Option<String>,
}

impl std::fmt::Display for ClassifiedFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FailureKind::ConfigurationError => {
                write!(f, "{}: {}", self.kind.user_message(), self.detail)
            }
            _ => write!(f, "{}", self.kind.user_message()),
        }
    }
}

impl std::error::Error for ClassifiedFailure {}

impl ClassifiedFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            status: None,
            transport: None,
        }
    }

    /// Add transport context
    pub fn transport(mut self, transport: impl Into<String>) -> Self {
        self.transport = Some(transport.into());
        self
    }

    /// Add status context
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Short diagnostic form: `[direct:RATE_LIMITED] HTTP error! status: 429`
    pub fn diagnostic(&self) -> String {
        match &self.transport {
            Some(t) => format!("[{}:{}] {}", t, self.kind, self.detail),
            None => format!("[{}] {}", self.kind, self.detail),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Substring-based failure classifier.
///
/// The check order is significant: a message mentioning both "429" and
/// "network" is a rate limit.
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a status code and message
    pub fn classify(status: Option<u16>, message: &str) -> FailureKind {
        if status == Some(429) || message.contains("429") || message.contains("quota") {
            return FailureKind::RateLimited;
        }

        if status == Some(503) || message.contains("503") || message.contains("overloaded") {
            return FailureKind::ServiceUnavailable;
        }

        if message.contains("SAFETY") {
            return FailureKind::SafetyBlocked;
        }

        if message.contains("network") || message.contains("fetch") {
            return FailureKind::NetworkError;
        }

        FailureKind::Unknown
    }

    /// Classify any crate error raised by a transport
    pub fn classify_error(err: &FitError, transport: &str) -> ClassifiedFailure {
        match err {
            FitError::Invocation(failure) => {
                let mut failure = failure.clone();
                failure.transport.get_or_insert_with(|| transport.to_string());
                failure
            }
            FitError::InvalidResponse { reason, .. } => {
                ClassifiedFailure::new(FailureKind::InvalidResponse, reason.clone())
                    .transport(transport)
            }
            FitError::Config(msg) => {
                ClassifiedFailure::new(FailureKind::ConfigurationError, msg.clone())
                    .transport(transport)
            }
            FitError::Timeout { .. } => {
                ClassifiedFailure::new(FailureKind::NetworkError, format!("network {}", err))
                    .transport(transport)
            }
            FitError::Transport { status, message } => {
                let failure = ClassifiedFailure::new(
                    Self::classify(*status, message),
                    message.clone(),
                )
                .transport(transport);
                match status {
                    Some(code) => failure.status(*code),
                    None => failure,
                }
            }
            other => {
                let message = other.to_string();
                ClassifiedFailure::new(Self::classify(None, &message), message)
                    .transport(transport)
            }
        }
    }
}

// =============================================================================
// Extraction Error
// =============================================================================

/// Document extraction failures
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File appears to be empty. Please select a valid file.")]
    Empty,

    #[error("File is too large ({size} bytes). Please select a file smaller than {limit} bytes.")]
    TooLarge { size: u64, limit: u64 },

    #[error("Failed to parse {format} file: {reason}")]
    Unreadable { format: &'static str, reason: String },

    #[error("The {format} file appears to have no extractable text content.")]
    NoContent { format: &'static str },
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum FitError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Invocation Errors
    // -------------------------------------------------------------------------
    /// Raw transport failure, classified by the orchestrator
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Model output that could not be sanitized into JSON
    #[error("Invalid JSON response from model: {reason}")]
    InvalidResponse { raw: String, reason: String },

    /// Final classified failure after retries
    #[error("{0}")]
    Invocation(ClassifiedFailure),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Operation cancelled")]
    Cancelled,

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<ClassifiedFailure> for FitError {
    fn from(failure: ClassifiedFailure) -> Self {
        FitError::Invocation(failure)
    }
}

pub type Result<T> = std::result::Result<T, FitError>;

impl FitError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a transport error from a response status
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a transport error for a connectivity failure
    pub fn network(message: impl std::fmt::Display) -> Self {
        Self::Transport {
            status: None,
            message: format!("network error: {}", message),
        }
    }

    /// Failure kind, when this error is the outcome of an invocation
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Invocation(failure) => Some(failure.kind),
            Self::InvalidResponse { .. } => Some(FailureKind::InvalidResponse),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
