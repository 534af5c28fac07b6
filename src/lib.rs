//! resumefit - Resume vs. Job Description Analysis
//!
//! Scores a resume against a job description with Gemini, behind a
//! resilient invocation layer, and falls back to a local keyword estimate
//! when the model cannot be reached.
//!
//! ## Core Features
//!
//! - **Transport Chain**: direct and relay transports ordered by environment,
//!   with classified failures, retries and exponential backoff
//! - **Response Sanitizer**: repairs near-JSON model output
//! - **Offline Fallback**: deterministic keyword-overlap analysis
//! - **Relay Server**: keeps the Gemini key on the server side
//! - **Document Extraction**: PDF, DOCX and plain text
//!
//! ## Quick Start
//!
//! ```ignore
//! use resumefit::{AnalysisPipeline, ConfigLoader};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ConfigLoader::load()?;
//! let pipeline = AnalysisPipeline::from_config(&config)?;
//! let outcome = pipeline.run(&resume, &job, &CancellationToken::new()).await?;
//! println!("{}", outcome.result.match_score.total);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: prompt, transports, transport chain, sanitizer, preflight
//! - [`analysis`]: analysis pipeline and offline fallback
//! - [`extract`]: document text extraction
//! - [`relay`]: relay HTTP server
//! - [`config`]: layered configuration

pub mod ai;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod constants;
pub mod extract;
pub mod relay;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, Environment, FallbackPolicy};

// Error Types
pub use types::error::{ClassifiedFailure, ErrorClassifier, FailureKind, FitError, Result};

// Result Model
pub use types::analysis::AnalysisResult;

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use analysis::{AnalysisOutcome, AnalysisPipeline, AnalysisSource, FallbackAnalyzer};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    // Transports
    DirectTransport,
    GeminiClient,
    // Preflight
    PreflightCheck,
    RelayTransport,
    Transport,
    TransportChain,
    TransportKind,
    // Sanitizer
    sanitize,
};

// =============================================================================
// Extraction Re-exports
// =============================================================================

pub use extract::{DocumentFormat, extract_text};
