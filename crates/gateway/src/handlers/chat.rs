//! Question answering handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use lexdz_common::errors::{AppError, Result};
use lexdz_search::context::excerpt;
use lexdz_search::ScoredRecord;

/// Chat request
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,

    /// Let the language model write the answer; plain rendering otherwise
    #[serde(default = "default_use_llm")]
    pub use_llm: bool,

    /// Clamped by the retrieval engine to `[1, max_top_k]`
    pub top_k: Option<usize>,
}

fn default_use_llm() -> bool { true }

/// Chat response
#[derive(Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub articles: Vec<ArticleHit>,
    pub provider: String,
    pub strategy: &'static str,
    pub fell_back: bool,
    pub disclaimer: &'static str,
}

#[derive(Serialize)]
pub struct ArticleHit {
    pub id: i64,
    pub label: String,
    pub category: String,
    pub section: String,
    pub custodial_term: String,
    pub fine: String,
    pub excerpt: String,
    pub score: f32,
}

const HIT_EXCERPT_CHARS: usize = 300;

impl From<ScoredRecord> for ArticleHit {
    fn from(scored: ScoredRecord) -> Self {
        Self {
            id: scored.record.id,
            excerpt: excerpt(&scored.record.body, HIT_EXCERPT_CHARS),
            label: scored.record.label,
            category: scored.record.category,
            section: scored.record.section,
            custodial_term: scored.penalty.custodial_term,
            fine: scored.penalty.fine,
            score: (scored.score * 1000.0).round() / 1000.0,
        }
    }
}

/// Answer a legal question
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("question".to_string()),
    })?;

    let answer = state
        .assistant
        .ask(&request.question, request.top_k, request.use_llm)
        .await?;

    Ok(Json(ChatResponse {
        answer: answer.answer,
        articles: answer.results.into_iter().map(ArticleHit::from).collect(),
        provider: answer.provider,
        strategy: answer.strategy.as_str(),
        fell_back: answer.fell_back,
        disclaimer: lexdz_common::LEGAL_DISCLAIMER,
    }))
}
