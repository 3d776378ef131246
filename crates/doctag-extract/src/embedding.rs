//! HTTP embedding backend (Ollama-compatible `/api/embed`).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use doctag_core::{defaults, EmbeddingBackend, Error, Result};

/// Default embedding service endpoint.
pub const DEFAULT_EMBED_URL: &str = defaults::EMBED_URL;

/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = defaults::EMBED_MODEL;

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding backend speaking the Ollama batch embedding API.
pub struct HttpEmbeddingBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl HttpEmbeddingBackend {
    /// Create a new backend with default settings.
    pub fn new() -> Self {
        Self::with_config(
            DEFAULT_EMBED_URL.to_string(),
            DEFAULT_EMBED_MODEL.to_string(),
        )
    }

    /// Create a new backend with custom endpoint and model.
    pub fn with_config(base_url: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::EMBED_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            subsystem = "extract",
            component = "http_embedding",
            op = "init",
            url = %base_url,
            model = %model,
            "Initializing embedding backend"
        );

        Self {
            client,
            base_url,
            model,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("DOCTAG_EMBED_URL").unwrap_or_else(|_| DEFAULT_EMBED_URL.to_string());
        let model =
            std::env::var("DOCTAG_EMBED_MODEL").unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string());
        Self::with_config(base_url, model)
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Extraction(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "Embedding service returned {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Extraction(format!("Failed to parse embedding response: {}", e)))?;

        if result.embeddings.len() != texts.len() {
            return Err(Error::Extraction(format!(
                "Embedding service returned {} vectors for {} inputs",
                result.embeddings.len(),
                texts.len()
            )));
        }

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            subsystem = "extract",
            component = "http_embedding",
            op = "embed",
            input_count = texts.len(),
            duration_ms = elapsed,
            "Embedding complete"
        );
        if elapsed > 5000 {
            warn!(
                duration_ms = elapsed,
                input_count = texts.len(),
                slow = true,
                "Slow embedding operation"
            );
        }
        Ok(result.embeddings)
    }
}

impl Default for HttpEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for HttpEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_texts(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Extraction("Embedding service returned no vector".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_texts(texts).await
    }
}
