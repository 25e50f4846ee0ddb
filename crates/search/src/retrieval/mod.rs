//! Retrieval over the penal-code corpus
//!
//! Two scoring strategies:
//! - Vector search (cosine similarity against stored embeddings)
//! - Lexical search (weighted keyword matching)
//!
//! [`RetrievalEngine`] picks between them per query and falls back from
//! vector to lexical when the vector path produces nothing.

mod lexical;
mod orchestrator;
mod vector;

pub use lexical::{LexicalMatch, LexicalScorer, LexicalWeights, PreparedQuery};
pub use orchestrator::RetrievalEngine;
pub use vector::{cosine_similarity, VectorScorer};

use crate::penalty::Penalty;
use lexdz_common::Record;
use serde::{Deserialize, Serialize};

/// Strategy that produced a result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Vector,
    Lexical,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Vector => "vector",
            Strategy::Lexical => "lexical",
        }
    }
}

/// A record with its relevance for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: Record,

    /// Relevance in [0, 1], comparable only within one result
    pub score: f32,

    /// Penalties parsed from the record body
    pub penalty: Penalty,
}

/// Ranked records for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Non-increasing by score, ties in corpus order
    pub records: Vec<ScoredRecord>,

    pub strategy: Strategy,

    /// The vector path was tried and yielded nothing
    #[serde(default)]
    pub fell_back: bool,
}

impl SearchResult {
    pub fn empty(strategy: Strategy) -> Self {
        Self {
            records: Vec::new(),
            strategy,
            fell_back: false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
