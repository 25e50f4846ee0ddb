//! Corpus administration

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;
use lexdz_common::errors::Result;

#[derive(Serialize)]
pub struct ReloadResponse {
    pub articles: usize,
    pub vectorized_articles: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Re-read the store and swap the corpus snapshot
pub async fn reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    let corpus = state.assistant.engine().reload(&state.repo).await?;

    Ok(Json(ReloadResponse {
        articles: corpus.len(),
        vectorized_articles: corpus.vectorized_count(),
        loaded_at: corpus.loaded_at(),
    }))
}
