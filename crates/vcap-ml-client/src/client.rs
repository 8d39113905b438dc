//! ML service HTTP client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use vcap_models::{Detections, Frame};

use crate::adapter::{CaptionAdapter, DetectionAdapter};
use crate::error::{MlError, MlResult};
use crate::types::{
    decode_image, encode_image, CaptionRequest, CaptionResponse, DetectRequest, DetectResponse,
    HealthResponse,
};

/// Configuration for the ML client.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Base URL of the ML service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ML_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("ML_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("ML_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Client for the detection/captioning ML service.
pub struct MlClient {
    http: Client,
    config: MlClientConfig,
}

impl MlClient {
    /// Create a new ML client.
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(MlClientConfig::from_env())
    }

    /// Check if the ML service is healthy.
    pub async fn health_check(&self) -> MlResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("ML service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("ML service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// POST a JSON body and parse a JSON reply.
    async fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> MlResult<Resp>
    where
        Req: serde::Serialize + Sync,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("Sending request to {}", url);

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .post(&url)
                    .json(request)
                    .send()
                    .await
                    .map_err(MlError::Network)?;

                // Server errors are transient and worth retrying; client
                // errors are not and fall through to the check below.
                if response.status().is_server_error() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(MlError::request_failed(format!(
                        "ML service responded {}: {}",
                        status, body
                    )));
                }
                Ok(response)
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::InvalidResponse(format!(
                "ML service rejected request with {}: {}",
                status, body
            )));
        }

        response.json().await.map_err(MlError::Network)
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "ML call failed on attempt {}, retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| MlError::request_failed("unknown error")))
    }
}

#[async_trait]
impl DetectionAdapter for MlClient {
    async fn detect(&self, frame: &Frame) -> MlResult<Detections> {
        let request = DetectRequest {
            image: encode_image(&frame.image)?,
        };
        let response: DetectResponse = self.post_json("/detect", &request).await?;

        // A missing or undecodable annotated frame falls back to the
        // original pixels rather than failing the whole detection.
        let annotated = match response.annotated.as_deref() {
            Some(payload) => match decode_image(payload) {
                Ok(image) => Arc::new(image),
                Err(e) => {
                    warn!("Discarding undecodable annotated frame: {}", e);
                    Arc::clone(&frame.image)
                }
            },
            None => Arc::clone(&frame.image),
        };

        Ok(Detections::from_labels(response.labels, annotated))
    }
}

#[async_trait]
impl CaptionAdapter for MlClient {
    async fn caption(&self, images: &[Frame], hints: &[String]) -> MlResult<Vec<String>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let encoded: Vec<String> = images
            .iter()
            .map(|f| encode_image(&f.image))
            .collect::<MlResult<_>>()?;

        let request = CaptionRequest {
            images: encoded,
            hints: hints.to_vec(),
        };
        let response: CaptionResponse = self.post_json("/caption", &request).await?;

        if response.captions.len() != images.len() {
            return Err(MlError::invalid_response(format!(
                "expected {} captions, got {}",
                images.len(),
                response.captions.len()
            )));
        }

        Ok(response.captions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MlClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 2);
    }
}
