//! LexDZ Common Library
//!
//! Shared code for the LexDZ services including:
//! - Penal-code records and corpus snapshots
//! - SQLite storage and repository patterns
//! - Embedding and answer-generation provider abstractions
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod corpus;
pub mod db;
pub mod embeddings;
pub mod errors;
pub mod generation;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use corpus::{Corpus, InMemoryStore, Record, RecordStore};
pub use db::Repository;
pub use embeddings::{EmbedPurpose, Embedder};
pub use generation::AnswerGenerator;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "jina-embeddings-v3";

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;

/// Disclaimer attached to every answer
pub const LEGAL_DISCLAIMER: &str = "⚠️ Cette réponse est une information juridique générale et ne constitue pas un avis juridique personnalisé.";
