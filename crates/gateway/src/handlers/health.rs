//! Service banner, health and configuration handlers

use axum::{extract::State, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct BannerResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
    pub database: CheckResult,
    pub articles: usize,
    pub vectorized_articles: usize,
    pub llm_provider: String,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub llm_provider: String,
    pub embedding_provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    pub retrieval_mode: &'static str,
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub articles: usize,
    pub vectorized_articles: usize,
}

/// Service banner
pub async fn root() -> Json<BannerResponse> {
    Json(BannerResponse {
        service: "LexDZ - Assistant juridique du Code pénal algérien",
        version: lexdz_common::VERSION,
        status: "running",
        endpoints: vec![
            "GET /health",
            "POST /chat",
            "GET /articles",
            "GET /articles/{id}",
            "GET /articles/search?label=",
            "GET /config",
            "POST /admin/reload",
        ],
    })
}

/// Liveness plus corpus and database status
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let start = std::time::Instant::now();

    let database = match state.repo.ping().await {
        Ok(_) => CheckResult {
            status: "up".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => CheckResult {
            status: "down".to_string(),
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    let corpus = state.assistant.engine().snapshot().await;
    let status = if database.status == "up" { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: lexdz_common::VERSION,
        database,
        articles: corpus.len(),
        vectorized_articles: corpus.vectorized_count(),
        llm_provider: state.assistant.provider().to_string(),
    })
}

/// Active providers and retrieval settings
pub async fn config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let engine = state.assistant.engine();
    let corpus = engine.snapshot().await;

    Json(ConfigResponse {
        llm_provider: state.assistant.provider().to_string(),
        embedding_provider: if engine.embedder().is_some() {
            state.config.embedding.provider.clone()
        } else {
            "none".to_string()
        },
        embedding_model: engine.embedder().map(|e| e.model_name().to_string()),
        retrieval_mode: engine.mode().as_str(),
        default_top_k: state.config.retrieval.default_top_k,
        max_top_k: engine.max_top_k(),
        articles: corpus.len(),
        vectorized_articles: corpus.vectorized_count(),
    })
}
