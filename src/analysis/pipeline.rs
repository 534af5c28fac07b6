//! Analysis Pipeline
//!
//! Prompt construction, chain resolution, result decoding and the fallback
//! policy for one resume/job-description pair.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::fallback::FallbackAnalyzer;
use crate::ai::prompt::PromptTemplates;
use crate::ai::provider::TransportChain;
use crate::config::{Config, FallbackPolicy};
use crate::types::{AnalysisResult, FailureKind, FitError, Result};

/// Where a result came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnalysisSource {
    /// Produced by the model through a transport
    Model { transport: String },
    /// Produced locally by the fallback analyzer
    Fallback { reason: String },
}

impl AnalysisSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, AnalysisSource::Fallback { .. })
    }
}

/// A result with its provenance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub request_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub source: AnalysisSource,
    pub result: AnalysisResult,
}

impl AnalysisOutcome {
    fn new(source: AnalysisSource, result: AnalysisResult) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            created_at: Utc::now(),
            source,
            result,
        }
    }
}

/// Resume analysis over a transport chain with a fallback policy
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    chain: TransportChain,
    policy: FallbackPolicy,
    fallback: FallbackAnalyzer,
}

impl AnalysisPipeline {
    pub fn new(chain: TransportChain, policy: FallbackPolicy) -> Self {
        Self {
            chain,
            policy,
            fallback: FallbackAnalyzer::new(),
        }
    }

    /// Pipeline for the configured environment and fallback policy
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            TransportChain::for_environment(config)?,
            config.analysis.fallback,
        ))
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Analyze through the model, falling back per policy
    #[instrument(skip_all, fields(policy = %self.policy))]
    pub async fn run(
        &self,
        resume: &str,
        job_description: &str,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome> {
        validate_inputs(resume, job_description)?;

        let prompt = PromptTemplates::resume_analysis(resume, job_description);

        let err = match self.invoke(&prompt, cancel).await {
            Ok(outcome) => return Ok(outcome),
            Err(err) => err,
        };

        if !self.should_fall_back(&err) {
            return Err(err);
        }

        warn!(error = %err, "Model analysis failed, using offline fallback");
        Ok(AnalysisOutcome::new(
            AnalysisSource::Fallback {
                reason: err.to_string(),
            },
            self.fallback.analyze(resume, job_description),
        ))
    }

    /// Offline analysis, no network
    pub fn run_offline(&self, resume: &str, job_description: &str) -> Result<AnalysisOutcome> {
        validate_inputs(resume, job_description)?;
        info!("Running offline analysis");
        Ok(AnalysisOutcome::new(
            AnalysisSource::Fallback {
                reason: "offline".to_string(),
            },
            self.fallback.analyze(resume, job_description),
        ))
    }

    async fn invoke(&self, prompt: &str, cancel: &CancellationToken) -> Result<AnalysisOutcome> {
        let (value, stats) = self.chain.execute(prompt, cancel).await?;

        let result: AnalysisResult =
            serde_json::from_value(value.clone()).map_err(|e| FitError::InvalidResponse {
                raw: value.to_string(),
                reason: e.to_string(),
            })?;

        let transport = stats
            .successful_transport
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            transport = %transport,
            attempts = stats.total_attempts,
            total = result.match_score.total,
            "Model analysis complete"
        );

        Ok(AnalysisOutcome::new(
            AnalysisSource::Model { transport },
            result,
        ))
    }

    /// Whether a total failure is replaced by the fallback result
    fn should_fall_back(&self, err: &FitError) -> bool {
        let Some(kind) = err.failure_kind() else {
            return false;
        };

        match (self.policy, kind) {
            (_, FailureKind::SafetyBlocked | FailureKind::ConfigurationError) => false,
            (FallbackPolicy::Never, _) => false,
            (FallbackPolicy::OnNetworkError, kind) => kind == FailureKind::NetworkError,
            (FallbackPolicy::OnAnyFailure, kind) => kind.is_retryable(),
        }
    }
}

fn validate_inputs(resume: &str, job_description: &str) -> Result<()> {
    if resume.trim().is_empty() {
        return Err(FitError::InvalidInput("resume text is empty".to_string()));
    }
    if job_description.trim().is_empty() {
        return Err(FitError::InvalidInput(
            "job description text is empty".to_string(),
        ));
    }
    Ok(())
}
