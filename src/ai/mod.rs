//! AI Integration Layer
//!
//! Gemini invocation: prompt construction, transports, the retrying
//! transport chain, response sanitizing and pre-flight checks.

pub mod preflight;
pub mod prompt;
pub mod provider;
pub mod timeout;
pub mod validation;

pub use preflight::{CheckResult, PreflightCheck, PreflightResult};
pub use prompt::{PromptBuilder, PromptSection, PromptTemplates};
pub use provider::{
    ChainConfig, ChainStats, DirectTransport, GeminiClient, RelayTransport, SharedTransport,
    Transport, TransportChain, TransportKind, create_transport,
};
pub use timeout::{TimeoutConfig, maybe_with_timeout, with_timeout};
pub use validation::{sanitize, sanitize_into};
