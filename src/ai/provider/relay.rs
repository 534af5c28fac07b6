//! Relay Transport
//!
//! Posts `{prompt}` to the trusted relay, which holds the credential and
//! answers with the already sanitized model object.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{Transport, TransportKind};
use crate::config::RelayConfig;
use crate::constants::relay as relay_constants;
use crate::types::{FitError, Result};

#[derive(Debug)]
pub struct RelayTransport {
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct RelayErrorBody {
    error: Option<String>,
}

impl RelayTransport {
    pub fn new(config: &RelayConfig, timeout_secs: u64) -> Result<Self> {
        url::Url::parse(&config.url).map_err(|e| {
            FitError::Config(format!("Invalid relay URL '{}': {}", config.url, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FitError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: config.url.clone(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Turn a relay error status and body into a classifiable transport error
    fn status_error(status: u16, error: Option<String>) -> FitError {
        let message = error.unwrap_or_else(|| format!("HTTP error! status: {}", status));

        if status == 500 && message.starts_with(relay_constants::CONFIG_ERROR_PREFIX) {
            return FitError::Config(message);
        }

        // The relay reports these in plain words; restore the markers the
        // classifier keys on.
        let message = match status {
            400 if message.to_lowercase().contains("safety") => format!("SAFETY: {}", message),
            502 if !message.contains("network") => format!("network: {}", message),
            _ => message,
        };

        FitError::http_status(status, message)
    }
}

#[async_trait]
impl Transport for RelayTransport {
    async fn invoke(&self, prompt: &str) -> Result<Value> {
        debug!(url = %self.url, "Posting prompt to relay");

        let response = self
            .client
            .post(&self.url)
            .json(&RelayRequest { prompt })
            .send()
            .await
            .map_err(FitError::network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<RelayErrorBody>().await.ok();
            let error = body.and_then(|b| b.error);
            warn!(status = status.as_u16(), error = ?error, "Relay returned an error");
            return Err(Self::status_error(status.as_u16(), error));
        }

        let text = response.text().await.map_err(FitError::network)?;
        serde_json::from_str(&text).map_err(|e| FitError::InvalidResponse {
            raw: text,
            reason: e.to_string(),
        })
    }

    fn name(&self) -> &str {
        "relay"
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Relay
    }
}
