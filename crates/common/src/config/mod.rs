//! Configuration management for LexDZ services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Answer generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Retrieval engine configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Context assembly configuration
    #[serde(default)]
    pub context: ContextConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: jina, mock, none
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// API key for embedding service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Maximum attempts per request
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,

    /// Batch size for document embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Generation provider: groq, mock
    #[serde(default = "default_generation_provider")]
    pub provider: String,

    /// API key for the chat completion service
    pub api_key: Option<String>,

    /// Chat completion endpoint
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,

    /// Model to use
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

/// Which scoring strategies the retrieval engine may use
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Vector similarity with lexical fallback
    #[default]
    Hybrid,
    /// Vector similarity only
    Vector,
    /// Keyword matching only
    Lexical,
}

impl RetrievalMode {
    pub fn vector_enabled(&self) -> bool {
        matches!(self, RetrievalMode::Hybrid | RetrievalMode::Vector)
    }

    pub fn lexical_enabled(&self) -> bool {
        matches!(self, RetrievalMode::Hybrid | RetrievalMode::Lexical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Hybrid => "hybrid",
            RetrievalMode::Vector => "vector",
            RetrievalMode::Lexical => "lexical",
        }
    }
}

/// Lexical weight profile
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightProfile {
    #[default]
    Full,
    Light,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Enabled strategies
    #[serde(default)]
    pub mode: RetrievalMode,

    /// Results returned when the caller does not ask for a count
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Upper clamp for caller-supplied top_k
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// Budget for the query embedding round trip, in milliseconds
    #[serde(default = "default_embed_timeout_ms")]
    pub embed_timeout_ms: u64,

    /// Lexical weight profile
    #[serde(default)]
    pub weights: WeightProfile,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextConfig {
    /// Body excerpt length per article, in characters
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,

    /// Total context budget, in characters
    #[serde(default = "default_context_max_chars")]
    pub max_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 60 }
fn default_database_url() -> String { "sqlite://data/code_penal.db?mode=rwc".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_connect_timeout() -> u64 { 10 }
fn default_embedding_provider() -> String { "none".to_string() }
fn default_embedding_model() -> String { crate::DEFAULT_EMBEDDING_MODEL.to_string() }
fn default_embedding_dimension() -> usize { crate::DEFAULT_EMBEDDING_DIMENSION }
fn default_embedding_timeout() -> u64 { 30 }
fn default_embedding_retries() -> u32 { 1 }
fn default_batch_size() -> usize { 32 }
fn default_generation_provider() -> String { "mock".to_string() }
fn default_generation_endpoint() -> String { "https://api.groq.com/openai/v1/chat/completions".to_string() }
fn default_generation_model() -> String { "llama-3.1-8b-instant".to_string() }
fn default_temperature() -> f32 { 0.3 }
fn default_max_tokens() -> usize { 800 }
fn default_generation_timeout() -> u64 { 60 }
fn default_top_k() -> usize { 3 }
fn default_max_top_k() -> usize { 20 }
fn default_embed_timeout_ms() -> u64 { 5000 }
fn default_excerpt_chars() -> usize { 500 }
fn default_context_max_chars() -> usize { 6000 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "lexdz".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__RETRIEVAL__MODE=lexical
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl RetrievalConfig {
    /// Budget for the query embedding round trip
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_embedding_retries(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            api_key: None,
            endpoint: default_generation_endpoint(),
            model: default_generation_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: RetrievalMode::default(),
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            embed_timeout_ms: default_embed_timeout_ms(),
            weights: WeightProfile::default(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: default_excerpt_chars(),
            max_chars: default_context_max_chars(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.embedding.model, "jina-embeddings-v3");
        assert_eq!(config.retrieval.mode, RetrievalMode::Hybrid);
        assert_eq!(config.context.excerpt_chars, 500);
        assert_eq!(config.observability.service_name, "lexdz");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let raw = r#"
            [retrieval]
            mode = "lexical"
            default_top_k = 5

            [generation]
            provider = "groq"
            api_key = "gsk_test"
        "#;

        let config: AppConfig = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.retrieval.mode, RetrievalMode::Lexical);
        assert_eq!(config.retrieval.default_top_k, 5);
        assert_eq!(config.retrieval.max_top_k, 20);
        assert_eq!(config.generation.model, "llama-3.1-8b-instant");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_retrieval_mode_strategies() {
        assert!(RetrievalMode::Hybrid.vector_enabled());
        assert!(RetrievalMode::Hybrid.lexical_enabled());
        assert!(!RetrievalMode::Vector.lexical_enabled());
        assert!(!RetrievalMode::Lexical.vector_enabled());
    }

    #[test]
    fn test_embed_timeout() {
        let config = AppConfig::default();
        assert_eq!(config.retrieval.embed_timeout(), Duration::from_millis(5000));
    }
}
