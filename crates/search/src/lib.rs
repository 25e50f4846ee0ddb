//! LexDZ retrieval core
//!
//! Turns a free-text legal question into a ranked, bounded set of statute
//! excerpts with structured penalty fields:
//! - [`normalize`]: accent and case folding
//! - [`penalty`]: custodial term and fine extraction
//! - [`retrieval`]: lexical and vector scoring with fallback
//! - [`context`]: bounded context for the answer generator
//! - [`pipeline`]: the end-to-end assistant

pub mod context;
pub mod normalize;
pub mod penalty;
pub mod pipeline;
pub mod retrieval;

pub use context::ContextAssembler;
pub use normalize::normalize;
pub use penalty::{extract as extract_penalty, Penalty};
pub use pipeline::{Answer, LegalAssistant};
pub use retrieval::{RetrievalEngine, ScoredRecord, SearchResult, Strategy};
