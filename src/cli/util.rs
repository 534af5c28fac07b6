//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::Path;

use clap::ValueEnum;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::ui::Output;
use crate::config::{Config, ConfigLoader};
use crate::types::{FitError, Result};

/// Report format for commands that print structured results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        *self == OutputFormat::Json
    }
}

/// Command execution context
///
/// Loaded configuration plus terminal output, created once per invocation.
pub struct CommandContext {
    pub config: Config,
    pub output: Output,
}

impl CommandContext {
    /// Load from an explicit file, or the global → project → env chain
    pub fn load(config_path: Option<&Path>, quiet: bool) -> Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };

        Ok(Self {
            config,
            output: Output::quiet(quiet),
        })
    }

    /// Runtime for the async part of a command
    pub fn runtime(&self) -> Result<Runtime> {
        Runtime::new().map_err(FitError::Io)
    }
}

/// Token cancelled on Ctrl-C. Must be called inside a runtime.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupted, cancelling");
                child.cancel();
            }
            Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C"),
        }
    });

    token
}
