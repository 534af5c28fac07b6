//! Analyze Command
//!
//! Extracts both documents, runs the analysis pipeline and prints a report.
//! When no endpoint answers a reachability probe the offline estimate is used
//! directly, unless the fallback policy is `never`.
//!
//! Usage:
//!   resumefit analyze --resume cv.pdf --job job.txt [--env development]
//!                     [--offline] [--fallback never] [--format json]

use std::path::PathBuf;

use tracing::{info, warn};

use crate::ai::PreflightCheck;
use crate::analysis::{AnalysisOutcome, AnalysisPipeline};
use crate::cli::ui::report;
use crate::cli::util::{CommandContext, OutputFormat, cancel_on_ctrl_c};
use crate::config::{Config, Environment, FallbackPolicy};
use crate::extract::extract_text;
use crate::types::Result;

/// Analyze options; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub resume: PathBuf,
    pub job: PathBuf,
    pub environment: Option<Environment>,
    pub offline: bool,
    pub fallback: Option<FallbackPolicy>,
    pub retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub format: OutputFormat,
}

impl AnalyzeOptions {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(environment) = self.environment {
            config.environment = environment;
        }
        if let Some(fallback) = self.fallback {
            config.analysis.fallback = fallback;
        }
        if let Some(retries) = self.retries {
            config.retry.retries = retries;
        }
        if let Some(delay) = self.base_delay_ms {
            config.retry.base_delay_ms = delay;
        }
        config.validate()
    }
}

pub fn run(mut ctx: CommandContext, options: AnalyzeOptions) -> Result<()> {
    options.apply(&mut ctx.config)?;

    let rt = ctx.runtime()?;
    let outcome = rt.block_on(analyze(&ctx.config, &options))?;

    if options.format.is_json() {
        ctx.output.plain(&serde_json::to_string_pretty(&outcome)?);
    } else {
        if outcome.source.is_fallback() {
            ctx.output
                .warning("AI analysis unavailable, showing an offline keyword estimate");
        }
        ctx.output.plain(&report::render_text(&outcome));
    }

    Ok(())
}

async fn analyze(config: &Config, options: &AnalyzeOptions) -> Result<AnalysisOutcome> {
    let resume = extract_text(&options.resume, &config.extraction).await?;
    let job = extract_text(&options.job, &config.extraction).await?;
    info!(
        resume_chars = resume.len(),
        job_chars = job.len(),
        "Documents extracted"
    );

    let pipeline = AnalysisPipeline::from_config(config)?;

    if options.offline {
        return pipeline.run_offline(&resume, &job);
    }

    if config.analysis.fallback != FallbackPolicy::Never
        && !PreflightCheck::new().is_online(config).await
    {
        warn!("No endpoint reachable, using the offline estimate");
        return pipeline.run_offline(&resume, &job);
    }

    let cancel = cancel_on_ctrl_c();
    pipeline.run(&resume, &job, &cancel).await
}
