// Generation module
// Collaborator interface for the generative model that turns a grounded
// prompt into an answer


use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::OllamaConfig;
use crate::embeddings::ollama::{
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_TIMEOUT_SECONDS, request_with_retry,
};
use crate::{Result, TextQaError};

/// Maps a prompt to generated text. Implementations are remote services or
/// local models; tests use in-process fakes.
pub trait GenerationClient: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Client for the Ollama text generation API.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .url()
            .map_err(|e| TextQaError::Config(e.to_string()))?;

        // Generation is slower than embedding, give it more headroom.
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS * 4)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.generation_model.clone(),
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
        use anyhow::Context;

        debug!("Generating answer for prompt of {} characters", prompt.len());

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let url = self
            .base_url
            .join("/api/generate")
            .context("Failed to build generation URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generation request")?;

        let response_text = request_with_retry(&self.base_url, self.retry_attempts, || {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Failed to generate answer")?;

        let generate_response: GenerateResponse =
            serde_json::from_str(&response_text).context("Failed to parse generation response")?;

        debug!(
            "Generated answer of {} characters",
            generate_response.response.len()
        );
        Ok(generate_response.response)
    }
}

impl GenerationClient for OllamaGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_text(prompt)
            .map_err(|e| TextQaError::Generation(format!("{:#}", e)))
    }
}
