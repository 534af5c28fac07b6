//! Check Command
//!
//! Runs the pre-flight checks and reports each one.

use crate::ai::preflight::{PreflightCheck, PreflightResult};
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat};
use crate::types::{FitError, Result};

pub fn run(ctx: CommandContext, format: OutputFormat) -> Result<()> {
    let rt = ctx.runtime()?;
    let result = rt.block_on(PreflightCheck::new().check_analysis(&ctx.config));

    if format.is_json() {
        ctx.output.plain(&serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&ctx.output, &ctx.config.environment.to_string(), &result);
    }

    if result.passed {
        Ok(())
    } else {
        Err(FitError::Config(format!(
            "{} pre-flight check(s) failed",
            result.errors.len()
        )))
    }
}

fn print_result(output: &Output, environment: &str, result: &PreflightResult) {
    output.header("Pre-flight Checks");
    output.field("Environment", environment);
    output.field("Online", if result.online { "yes" } else { "no" });

    output.section("Checks");
    for check in &result.checks {
        let line = format!("{} ({}ms): {}", check.name, check.duration_ms, check.message);
        if !check.passed {
            output.error(&line);
        } else if check.warning.is_some() {
            output.warning(&line);
        } else {
            output.success(&line);
        }
    }

    if !result.warnings.is_empty() {
        output.section("Warnings");
        output.bullets(&result.warnings);
    }

    if !result.recommendations.is_empty() {
        output.section("Recommendations");
        output.bullets(&result.recommendations);
    }
}
