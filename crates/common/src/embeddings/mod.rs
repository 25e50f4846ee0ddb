//! Embedding service abstraction
//!
//! Provides a unified interface for embedding providers:
//! - Jina (jina-embeddings-v3, task-aware)
//! - Mock (deterministic vectors for tests and offline runs)

use crate::config::EmbeddingConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What an embedding is used for
///
/// Asymmetric models encode questions and stored passages differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPurpose {
    Query,
    Document,
}

impl EmbedPurpose {
    /// Task identifier understood by the Jina API
    pub fn task(&self) -> &'static str {
        match self {
            EmbedPurpose::Query => "retrieval.query",
            EmbedPurpose::Document => "retrieval.passage",
        }
    }
}

/// Trait for embedding generation
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch), in input order
    async fn embed_batch(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;
}

/// Jina embedding client
pub struct JinaEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimension: usize,
    base_url: String,
    max_retries: u32,
    batch_size: usize,
}

#[derive(Serialize)]
struct JinaRequest<'a> {
    model: &'a str,
    input: &'a [String],
    task: &'a str,
}

#[derive(Deserialize)]
struct JinaResponse {
    data: Vec<JinaEmbedding>,
}

#[derive(Deserialize)]
struct JinaEmbedding {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

pub const DEFAULT_JINA_BASE: &str = "https://api.jina.ai/v1";

impl JinaEmbedder {
    /// Create a new Jina embedder
    pub fn new(api_key: String, config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            dimension: config.dimension,
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_JINA_BASE.to_string()),
            max_retries: config.max_retries.max(1),
            batch_size: config.batch_size.max(1),
        })
    }

    /// Make request with retry
    async fn request_with_retry(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(100 * (2_u64.pow(attempt)));
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            match self.make_request(texts, purpose).await {
                Ok(embeddings) => {
                    metrics::record_embedding(start.elapsed().as_secs_f64(), &self.model, texts.len(), true);
                    return Ok(embeddings);
                }
                Err(e) => {
                    metrics::record_embedding(start.elapsed().as_secs_f64(), &self.model, texts.len(), false);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "Embedding request failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::EmbeddingError {
            message: "Unknown error after retries".to_string(),
        }))
    }

    async fn make_request(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));

        let request = JinaRequest {
            model: &self.model,
            input: texts,
            task: purpose.task(),
        };

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::EmbeddingError {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: JinaResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingError {
                message: format!("Failed to parse response: {}", e),
            }
        })?;

        if result.data.len() != texts.len() {
            return Err(AppError::EmbeddingError {
                message: format!("Expected {} embeddings, got {}", texts.len(), result.data.len()),
            });
        }

        let mut data = result.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for JinaEmbedder {
    async fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>> {
        let embeddings = self.request_with_retry(&[text.to_string()], purpose).await?;
        embeddings.into_iter().next().ok_or_else(|| AppError::EmbeddingError {
            message: "Empty response".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.request_with_retry(chunk, purpose).await?;
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Mock embedder for testing
///
/// The vector is a pure function of the text, so a record embedded as a
/// document and the same text embedded as a query are identical.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());
        (0..self.dimension).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str, _purpose: EmbedPurpose) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String], _purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Create an embedder based on configuration
///
/// Returns `None` when vector search is disabled, including a `jina`
/// provider configured without an API key.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Option<Arc<dyn Embedder>>> {
    match config.provider.as_str() {
        "jina" => match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => Ok(Some(Arc::new(JinaEmbedder::new(key.to_string(), config)?))),
            None => {
                tracing::warn!("Jina API key missing, vector search disabled");
                Ok(None)
            }
        },
        "mock" => Ok(Some(Arc::new(MockEmbedder::new(config.dimension)))),
        "none" | "" => Ok(None),
        other => {
            tracing::warn!(provider = other, "Unknown embedding provider, vector search disabled");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::new(64);
        let a = embedder.embed("vol qualifié", EmbedPurpose::Query).await.unwrap();
        let b = embedder.embed("vol qualifié", EmbedPurpose::Document).await.unwrap();
        let c = embedder.embed("meurtre", EmbedPurpose::Query).await.unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_mock_batch() {
        let embedder = MockEmbedder::new(16);
        let texts = vec!["text1".to_string(), "text2".to_string()];
        let embeddings = embedder.embed_batch(&texts, EmbedPurpose::Document).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], embedder.embed("text1", EmbedPurpose::Query).await.unwrap());
    }

    #[test]
    fn test_purpose_task() {
        assert_eq!(EmbedPurpose::Query.task(), "retrieval.query");
        assert_eq!(EmbedPurpose::Document.task(), "retrieval.passage");
    }

    #[test]
    fn test_factory_degrades_without_key() {
        let config = EmbeddingConfig {
            provider: "jina".to_string(),
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(create_embedder(&config).unwrap().is_none());

        let config = EmbeddingConfig::default();
        assert!(create_embedder(&config).unwrap().is_none());
    }

    #[test]
    fn test_factory_builds_providers() {
        let config = EmbeddingConfig {
            provider: "mock".to_string(),
            dimension: 8,
            ..Default::default()
        };
        let embedder = create_embedder(&config).unwrap().unwrap();
        assert_eq!(embedder.dimension(), 8);

        let config = EmbeddingConfig {
            provider: "jina".to_string(),
            api_key: Some("jina_test".to_string()),
            ..Default::default()
        };
        let embedder = create_embedder(&config).unwrap().unwrap();
        assert_eq!(embedder.model_name(), "jina-embeddings-v3");
        assert_eq!(embedder.dimension(), 1024);
    }
}
