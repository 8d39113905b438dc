//! Cohere client for caption summarization.
//!
//! Turns an ordered collection of caption records into one concise
//! scene description via the Cohere generate API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::SummaryAdapter;
use crate::error::{MlError, MlResult};

const DEFAULT_API_URL: &str = "https://api.cohere.com/v1/generate";
const DEFAULT_MODEL: &str = "command-r-plus";

/// Configuration for the Cohere summarizer.
#[derive(Debug, Clone)]
pub struct CohereConfig {
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CohereConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 100,
            temperature: 0.4,
        }
    }
}

/// Cohere API client.
pub struct CohereClient {
    api_key: String,
    config: CohereConfig,
    client: Client,
}

/// Cohere generate request.
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
}

/// Cohere generate response.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    generations: Vec<Generation>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    text: String,
}

impl CohereClient {
    /// Create a client with an explicit key and configuration.
    pub fn new(api_key: impl Into<String>, config: CohereConfig) -> Self {
        Self {
            api_key: api_key.into(),
            config,
            client: Client::new(),
        }
    }

    /// Create from environment variables (`COHERE_API_KEY`, optionally
    /// `COHERE_API_URL` and `COHERE_MODEL`).
    pub fn from_env() -> MlResult<Self> {
        let api_key =
            std::env::var("COHERE_API_KEY").map_err(|_| MlError::config("COHERE_API_KEY not set"))?;

        let mut config = CohereConfig::default();
        if let Ok(url) = std::env::var("COHERE_API_URL") {
            config.api_url = url;
        }
        if let Ok(model) = std::env::var("COHERE_MODEL") {
            config.model = model;
        }

        Ok(Self::new(api_key, config))
    }

    /// Build the summarization prompt from ordered records.
    fn build_prompt(records: &[(String, Vec<String>)]) -> String {
        let caption_text = records
            .iter()
            .flat_map(|(key, texts)| {
                texts
                    .iter()
                    .map(move |text| format!("Frame {}: {}", key, text))
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are an AI assistant. Summarize the following video frame captions \
             into one cohesive and concise description of the scene:\n{}\n\nFinal Summary:",
            caption_text
        )
    }
}

#[async_trait]
impl SummaryAdapter for CohereClient {
    async fn summarize(&self, records: &[(String, Vec<String>)]) -> MlResult<String> {
        if records.is_empty() {
            return Err(MlError::request_failed("no records to summarize"));
        }

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: Self::build_prompt(records),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(records = records.len(), "Requesting summary");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(MlError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::request_failed(format!(
                "Cohere returned {}: {}",
                status, body
            )));
        }

        let generated: GenerateResponse = response.json().await.map_err(MlError::Network)?;

        let text = generated
            .generations
            .first()
            .map(|g| g.text.trim().to_string())
            .ok_or_else(|| MlError::invalid_response("no generations in Cohere response"))?;

        if text.is_empty() {
            return Err(MlError::invalid_response("empty summary"));
        }

        Ok(text)
    }
}
