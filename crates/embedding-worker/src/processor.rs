//! Embedding backfill processor
//!
//! Finds articles without a vector, embeds them in batches and stores the vectors.

use lexdz_common::db::Repository;
use lexdz_common::embeddings::{EmbedPurpose, Embedder};
use lexdz_common::Record;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of one backfill run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    /// Articles that lacked a vector when the run started
    pub pending: usize,
    /// Vectors written
    pub attached: usize,
    /// Articles left without a vector because their batch failed
    pub failed: usize,
    /// Articles that received a vector from someone else mid-run
    pub skipped: usize,
}

/// Embedding backfill processor
pub struct BackfillProcessor {
    repository: Repository,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl BackfillProcessor {
    pub fn new(repository: Repository, embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            repository,
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed every article that has no vector yet
    #[instrument(skip(self), fields(model = %self.embedder.model_name()))]
    pub async fn run(&self) -> Result<BackfillReport, BackfillError> {
        let pending = self.repository.records_without_vector().await?;
        let mut report = BackfillReport {
            pending: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            info!("Every article already has a vector");
            return Ok(report);
        }

        info!(pending = pending.len(), batch_size = self.batch_size, "Starting backfill");

        for (index, batch) in pending.chunks(self.batch_size).enumerate() {
            match self.process_batch(batch).await {
                Ok((attached, skipped)) => {
                    report.attached += attached;
                    report.skipped += skipped;
                    debug!(batch = index, attached, skipped, "Batch stored");
                }
                Err(e) => {
                    report.failed += batch.len();
                    warn!(batch = index, size = batch.len(), error = %e, "Batch failed, skipping");
                }
            }
        }

        info!(
            attached = report.attached,
            failed = report.failed,
            skipped = report.skipped,
            "Backfill finished"
        );
        Ok(report)
    }

    async fn process_batch(&self, batch: &[Record]) -> Result<(usize, usize), BackfillError> {
        let texts: Vec<String> = batch.iter().map(Record::embedding_text).collect();

        let vectors = self
            .embedder
            .embed_batch(&texts, EmbedPurpose::Document)
            .await
            .map_err(|e| BackfillError::EmbeddingFailed(e.to_string()))?;

        if vectors.len() != batch.len() {
            return Err(BackfillError::EmbeddingFailed(format!(
                "expected {} vectors, got {}",
                batch.len(),
                vectors.len()
            )));
        }

        let mut attached = 0;
        let mut skipped = 0;
        for (record, vector) in batch.iter().zip(vectors.iter()) {
            if self.repository.attach_vector(record.id, vector).await? {
                attached += 1;
            } else {
                skipped += 1;
            }
        }

        Ok((attached, skipped))
    }

    /// Embed one text as a query (for smoke testing a provider)
    pub async fn embed_single(&self, text: &str) -> Result<Vec<f32>, BackfillError> {
        self.embedder
            .embed(text, EmbedPurpose::Query)
            .await
            .map_err(|e| BackfillError::EmbeddingFailed(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackfillError {
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<lexdz_common::errors::AppError> for BackfillError {
    fn from(e: lexdz_common::errors::AppError) -> Self {
        BackfillError::DatabaseError(e.to_string())
    }
}
