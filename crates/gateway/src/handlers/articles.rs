//! Article lookup handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use lexdz_common::errors::{AppError, Result};
use lexdz_common::{Record, RecordStore};
use lexdz_search::{extract_penalty, Penalty};

/// Article without its embedding
#[derive(Serialize)]
pub struct ArticleView {
    pub id: i64,
    pub label: String,
    pub body: String,
    pub category: String,
    pub section: String,
    pub penalty: Penalty,
}

impl From<Record> for ArticleView {
    fn from(record: Record) -> Self {
        Self {
            penalty: extract_penalty(&record.body),
            id: record.id,
            label: record.label,
            body: record.body,
            category: record.category,
            section: record.section,
        }
    }
}

#[derive(Serialize)]
pub struct ArticleList {
    pub total: usize,
    pub articles: Vec<ArticleView>,
}

#[derive(Debug, Deserialize)]
pub struct LabelQuery {
    pub label: String,
}

/// All articles in id order
pub async fn list_articles(State(state): State<AppState>) -> Result<Json<ArticleList>> {
    let articles: Vec<ArticleView> = state
        .repo
        .list_all_records()
        .await?
        .into_iter()
        .map(ArticleView::from)
        .collect();

    Ok(Json(ArticleList {
        total: articles.len(),
        articles,
    }))
}

/// One article
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleView>> {
    let record = state
        .repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::ArticleNotFound { id: id.to_string() })?;

    Ok(Json(ArticleView::from(record)))
}

/// Articles whose label contains the given text
pub async fn search_by_label(
    State(state): State<AppState>,
    Query(query): Query<LabelQuery>,
) -> Result<Json<ArticleList>> {
    let label = query.label.trim();
    if label.is_empty() {
        return Err(AppError::Validation {
            message: "Label cannot be empty".to_string(),
            field: Some("label".to_string()),
        });
    }

    let articles: Vec<ArticleView> = state
        .repo
        .find_by_label_substring(label)
        .await?
        .into_iter()
        .map(ArticleView::from)
        .collect();

    Ok(Json(ArticleList {
        total: articles.len(),
        articles,
    }))
}
