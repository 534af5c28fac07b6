//! Config Command
//!
//! Manage resumefit configuration.
//!
//! Usage:
//!   resumefit config show [-f json]
//!   resumefit config path
//!   resumefit config init [-g] [--force]

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat};
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the effective configuration
pub fn show(ctx: &CommandContext, format: OutputFormat) -> Result<()> {
    ConfigLoader::show_config(&ctx.config, format.is_json())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Write a default configuration file; works even when the current one is broken
pub fn init(output: &Output, global: bool, force: bool) -> Result<()> {
    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };

    let scope = if global { "global" } else { "project" };
    output.success(&format!("Initialized {} configuration", scope));
    output.field("Config", &path.display().to_string());
    Ok(())
}
