//! Direct Transport
//!
//! Calls the Gemini endpoint from this process with a locally held key.

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use tracing::debug;

use super::gemini::GeminiClient;
use super::{Transport, TransportKind};
use crate::ai::validation::sanitize;
use crate::config::GeminiConfig;
use crate::types::Result;

#[derive(Debug)]
pub struct DirectTransport {
    client: GeminiClient,
}

impl DirectTransport {
    /// Fails with a configuration error when no key is available
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(config)?,
        })
    }

    pub fn with_api_key(config: &GeminiConfig, api_key: SecretString) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::with_api_key(config, api_key)?,
        })
    }
}

#[async_trait]
impl Transport for DirectTransport {
    async fn invoke(&self, prompt: &str) -> Result<Value> {
        let text = self.client.generate_text(prompt).await?;
        debug!(model = %self.client.model(), chars = text.len(), "Sanitizing direct response");
        sanitize(&text)
    }

    fn name(&self) -> &str {
        "direct"
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Direct
    }
}
