//! Gemini generateContent Client
//!
//! Thin HTTP client shared by the direct transport and the relay server.
//! Returns the raw model text; sanitizing is the caller's job.

use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GeminiConfig;
use crate::constants::gemini as gemini_constants;
use crate::types::{FitError, Result};

/// Gemini API client with secure API key handling
pub struct GeminiClient {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    generation: GenerationConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("generation", &self.generation)
            .finish()
    }
}

impl GeminiClient {
    /// Build a client from configuration, resolving the key from the
    /// config file or `GEMINI_API_KEY`.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            FitError::Config(format!(
                "Gemini API key not found. Set {} or gemini.api_key in config",
                gemini_constants::API_KEY_ENV
            ))
        })?;

        Self::with_api_key(config, SecretString::from(api_key))
    }

    /// Build a client with an explicit key
    pub fn with_api_key(config: &GeminiConfig, api_key: SecretString) -> Result<Self> {
        let api_base = config.api_base.trim_end_matches('/').to_string();
        url::Url::parse(&api_base).map_err(|e| {
            FitError::Config(format!("Invalid Gemini API base '{}': {}", api_base, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FitError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_base,
            model: config.model.clone(),
            generation: GenerationConfig::from_config(config),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint without the key query parameter (safe to log)
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: self.generation.clone(),
            safety_settings: gemini_constants::HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: category.to_string(),
                    threshold: gemini_constants::SAFETY_THRESHOLD.to_string(),
                })
                .collect(),
        }
    }

    /// Send one generateContent request and return the first candidate's text
    ///
    /// Failure messages are shaped for [`crate::types::ErrorClassifier`]:
    /// connectivity failures mention "network", safety blocks mention
    /// "SAFETY", and non-2xx responses carry their status.
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        info!(model = %self.model, "Calling Gemini generateContent");

        let start_time = Instant::now();
        let request = self.build_request(prompt);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.expose_secret())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| FitError::network(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "Gemini returned an error status");
            return Err(FitError::http_status(
                status.as_u16(),
                format!("HTTP error! status: {}", status.as_u16()),
            ));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_body() {
                FitError::network(e.without_url())
            } else {
                FitError::Transport {
                    status: Some(status.as_u16()),
                    message: format!("Failed to decode Gemini response: {}", e.without_url()),
                }
            }
        })?;

        debug!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Received Gemini response"
        );

        body.into_text()
    }
}

// =============================================================================
// Request/Response types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: String,
}

impl GenerationConfig {
    fn from_config(config: &GeminiConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            response_mime_type: gemini_constants::RESPONSE_MIME_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            warn!(block_reason = %reason, "Prompt blocked by Gemini");
            return Err(FitError::Transport {
                status: None,
                message: format!("Prompt blocked by SAFETY filter ({})", reason),
            });
        }

        let candidate = self.candidates.into_iter().next();

        if let Some(reason) = candidate
            .as_ref()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|r| *r == "SAFETY")
        {
            warn!(finish_reason = %reason, "Candidate blocked by Gemini");
            return Err(FitError::Transport {
                status: None,
                message: "Response blocked by SAFETY filter".to_string(),
            });
        }

        candidate
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FitError::Transport {
                status: None,
                message: gemini_constants::NO_RESPONSE_TEXT.to_string(),
            })
    }
}
