//! Strategy selection, fallback and ranking

use super::{LexicalScorer, LexicalWeights, ScoredRecord, SearchResult, Strategy, VectorScorer};
use crate::penalty;
use lexdz_common::config::{RetrievalConfig, RetrievalMode};
use lexdz_common::errors::{AppError, Result};
use lexdz_common::{metrics, Corpus, EmbedPurpose, Embedder, RecordStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Why the vector path produced no ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VectorMiss {
    /// No embedder, or no vectorized records; not a fallback
    Unavailable,
    EmbeddingError,
    Timeout,
    NoMatch,
}

impl VectorMiss {
    fn as_str(&self) -> &'static str {
        match self {
            VectorMiss::Unavailable => "unavailable",
            VectorMiss::EmbeddingError => "embedding_error",
            VectorMiss::Timeout => "timeout",
            VectorMiss::NoMatch => "no_match",
        }
    }
}

/// Retrieval over a shared corpus snapshot
pub struct RetrievalEngine {
    corpus: RwLock<Arc<Corpus>>,
    embedder: Option<Arc<dyn Embedder>>,
    mode: RetrievalMode,
    lexical: LexicalScorer,
    vector: VectorScorer,
    embed_timeout: Duration,
    max_top_k: usize,
}

impl RetrievalEngine {
    /// Create an engine over a snapshot
    pub fn new(corpus: Corpus, config: &RetrievalConfig) -> Self {
        Self {
            corpus: RwLock::new(Arc::new(corpus)),
            embedder: None,
            mode: config.mode,
            lexical: LexicalScorer::new(LexicalWeights::for_profile(config.weights)),
            vector: VectorScorer,
            embed_timeout: config.embed_timeout(),
            max_top_k: config.max_top_k.max(1),
        }
    }

    /// Use an embedding provider for the vector path
    pub fn with_embedder(mut self, embedder: Option<Arc<dyn Embedder>>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_lexical_weights(mut self, weights: LexicalWeights) -> Self {
        self.lexical = LexicalScorer::new(weights);
        self
    }

    pub fn mode(&self) -> RetrievalMode {
        self.mode
    }

    pub fn embedder(&self) -> Option<&Arc<dyn Embedder>> {
        self.embedder.as_ref()
    }

    pub fn max_top_k(&self) -> usize {
        self.max_top_k
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> Arc<Corpus> {
        self.corpus.read().await.clone()
    }

    /// Swap in a new snapshot
    pub async fn replace(&self, corpus: Corpus) -> Arc<Corpus> {
        let corpus = Arc::new(corpus);
        metrics::record_corpus(corpus.len(), corpus.vectorized_count());
        *self.corpus.write().await = corpus.clone();
        corpus
    }

    /// Read a fresh snapshot from the store and swap it in
    ///
    /// Queries already running keep the snapshot they started with.
    pub async fn reload(&self, store: &dyn RecordStore) -> Result<Arc<Corpus>> {
        let corpus = Corpus::load(store).await?;
        let corpus = self.replace(corpus).await;
        info!(
            records = corpus.len(),
            vectorized = corpus.vectorized_count(),
            "Corpus snapshot replaced"
        );
        Ok(corpus)
    }

    /// Clamp a caller-supplied result count into `[1, max_top_k]`
    pub fn clamp_top_k(&self, top_k: usize) -> usize {
        top_k.clamp(1, self.max_top_k)
    }

    /// Rank the corpus for a query
    ///
    /// Never fails: provider errors and timeouts turn into an empty vector
    /// ranking, which hands over to lexical scoring when it is enabled.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> SearchResult {
        let start = Instant::now();
        let top_k = self.clamp_top_k(top_k);
        let corpus = self.snapshot().await;

        let default_strategy = if self.mode.vector_enabled() && !self.mode.lexical_enabled() {
            Strategy::Vector
        } else {
            Strategy::Lexical
        };

        if query.trim().is_empty() {
            return SearchResult::empty(default_strategy);
        }

        let mut fell_back = false;
        let (strategy, ranked) = if self.mode.vector_enabled() {
            match self.vector_rank(query, &corpus).await {
                Ok(ranked) => (Strategy::Vector, ranked),
                Err(miss) if self.mode.lexical_enabled() => {
                    if miss == VectorMiss::Unavailable {
                        debug!("Vector path unavailable, using lexical scoring");
                    } else {
                        warn!(reason = miss.as_str(), "Vector retrieval empty, falling back to lexical");
                        metrics::record_fallback(miss.as_str());
                        fell_back = true;
                    }
                    (Strategy::Lexical, self.lexical.rank(query, corpus.records()))
                }
                Err(miss) => {
                    debug!(reason = miss.as_str(), "Vector retrieval empty, lexical disabled");
                    (Strategy::Vector, Vec::new())
                }
            }
        } else {
            (Strategy::Lexical, self.lexical.rank(query, corpus.records()))
        };

        let records: Vec<ScoredRecord> = ranked
            .into_iter()
            .take(top_k)
            .filter_map(|(i, score)| {
                let record = corpus.records().get(i)?.clone();
                let penalty = penalty::extract(&record.body);
                Some(ScoredRecord { record, score, penalty })
            })
            .collect();

        metrics::record_retrieval(start.elapsed().as_secs_f64(), strategy.as_str(), records.len());
        debug!(
            strategy = strategy.as_str(),
            results = records.len(),
            top_k,
            fell_back,
            "Retrieval complete"
        );

        SearchResult {
            records,
            strategy,
            fell_back,
        }
    }

    async fn vector_rank(&self, query: &str, corpus: &Corpus) -> std::result::Result<Vec<(usize, f32)>, VectorMiss> {
        let embedder = match &self.embedder {
            Some(e) if corpus.has_vectors() => e,
            _ => return Err(VectorMiss::Unavailable),
        };

        let query_vector = match tokio::time::timeout(
            self.embed_timeout,
            embedder.embed(query, EmbedPurpose::Query),
        )
        .await
        {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => {
                warn!(error = %e, "Query embedding failed");
                return Err(VectorMiss::EmbeddingError);
            }
            Err(_) => {
                let err = AppError::EmbeddingTimeout {
                    timeout_ms: self.embed_timeout.as_millis() as u64,
                };
                warn!(error = %err, "Query embedding failed");
                return Err(VectorMiss::Timeout);
            }
        };

        let ranked = self.vector.rank(&query_vector, corpus.records());
        if ranked.is_empty() {
            return Err(VectorMiss::NoMatch);
        }
        Ok(ranked)
    }
}
