//! LexDZ API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Legal question answering over the penal-code corpus
//! - Article lookup
//! - Corpus reloads
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    routing::{get, post},
    BoxError, Router,
};
use lexdz_common::{
    config::{AppConfig, ObservabilityConfig},
    db::DbPool,
    embeddings::create_embedder,
    generation::create_generator,
    metrics, Corpus, Repository,
};
use lexdz_search::{ContextAssembler, LegalAssistant, RetrievalEngine};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub assistant: Arc<LegalAssistant>,
    pub repo: Repository,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    init_tracing(&config.observability);
    info!(
        service = %config.observability.service_name,
        "Starting LexDZ API Gateway v{}",
        lexdz_common::VERSION
    );

    // Initialize metrics
    init_metrics_exporter(&config.observability)?;

    // Initialize database connection
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db);
    repo.ensure_schema().await?;

    let corpus = Corpus::load(&repo).await?;
    if corpus.is_empty() {
        tracing::warn!("Corpus is empty, every question will get the no-result reply");
    }
    metrics::record_corpus(corpus.len(), corpus.vectorized_count());

    let assistant = build_assistant(&config, corpus)?;
    info!(
        mode = assistant.engine().mode().as_str(),
        llm_provider = assistant.provider(),
        vector_search = assistant.engine().embedder().is_some(),
        "Assistant ready"
    );

    let state = AppState {
        config: config.clone(),
        assistant: Arc::new(assistant),
        repo,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_metrics_exporter(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let port = config.metrics_port;
    if port == 0 {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    let prefix = metrics::METRICS_PREFIX;
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
        .add_global_label("service", config.service_name.clone())
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_retrieval_duration_seconds", prefix)),
            metrics::LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_request_duration_seconds", prefix)),
            metrics::LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Prefix(format!("{}_embedding", prefix)),
            metrics::PROVIDER_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Prefix(format!("{}_generation", prefix)),
            metrics::PROVIDER_BUCKETS,
        )?
        .install()?;

    metrics::register_metrics();
    info!(port, "Prometheus exporter listening");
    Ok(())
}

/// Wire providers, retrieval engine and context assembler
fn build_assistant(config: &AppConfig, corpus: Corpus) -> anyhow::Result<LegalAssistant> {
    let embedder = create_embedder(&config.embedding)?;
    let generator = create_generator(&config.generation)?;

    let engine = RetrievalEngine::new(corpus, &config.retrieval).with_embedder(embedder);

    Ok(LegalAssistant::new(
        Arc::new(engine),
        ContextAssembler::from(&config.context),
        generator,
        config.retrieval.default_top_k,
    ))
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_timeout))
        .timeout(state.config.request_timeout());

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/config", get(handlers::health::config))
        .route("/chat", post(handlers::chat::chat))
        .route("/articles", get(handlers::articles::list_articles))
        .route("/articles/search", get(handlers::articles::search_by_label))
        .route("/articles/{id}", get(handlers::articles::get_article))
        .route("/admin/reload", post(handlers::admin::reload))
        .route_layer(axum::middleware::from_fn(middleware::track_metrics))
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

async fn handle_timeout(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Unhandled error: {}", err))
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use lexdz_common::config::RetrievalMode;
    use lexdz_common::db::NewArticle;
    use lexdz_common::RecordStore;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let repo = Repository::new(DbPool::in_memory().await.unwrap());
        repo.ensure_schema().await.unwrap();
        repo.insert_article(NewArticle {
            numero: "Art. 350".to_string(),
            texte: "Quiconque soustrait frauduleusement une chose est coupable de vol et puni \
                    d'un emprisonnement d'un an à cinq ans et d'une amende de 100.000 DA à 500.000 DA."
                .to_string(),
            categorie: Some("Vol et extorsion".to_string()),
            section: None,
        })
        .await
        .unwrap();

        let mut config = AppConfig::default();
        config.retrieval.mode = RetrievalMode::Lexical;
        let corpus = Corpus::load(&repo).await.unwrap();
        let assistant = build_assistant(&config, corpus).unwrap();

        AppState {
            config: Arc::new(config),
            assistant: Arc::new(assistant),
            repo,
        }
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::post("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_chat_answers_with_articles() {
        let app = create_router(test_state().await);
        let (status, json) = call(app, chat_request(serde_json::json!({"question": "vol"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["provider"], "mock");
        assert_eq!(json["strategy"], "lexical");
        assert_eq!(json["articles"][0]["label"], "Art. 350");
        assert_eq!(json["articles"][0]["fine"], "100.000 DA à 500.000 DA");
        assert_eq!(json["disclaimer"], lexdz_common::LEGAL_DISCLAIMER);
    }

    #[tokio::test]
    async fn test_blank_question_is_bad_request() {
        let app = create_router(test_state().await);
        for question in ["", "   "] {
            let (status, json) =
                call(app.clone(), chat_request(serde_json::json!({"question": question}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_out_of_range_top_k_is_clamped() {
        let app = create_router(test_state().await);
        for top_k in [0, 500] {
            let (status, json) = call(
                app.clone(),
                chat_request(serde_json::json!({"question": "vol", "top_k": top_k})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["articles"].as_array().unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_direct_answer_without_llm() {
        let app = create_router(test_state().await);
        let (status, json) = call(
            app,
            chat_request(serde_json::json!({"question": "vol", "use_llm": false})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["provider"], "direct");
        assert!(json["answer"].as_str().unwrap().contains("🔒 **Sanctions:**"));
    }

    #[tokio::test]
    async fn test_article_lookup() {
        let state = test_state().await;
        let id = state.repo.list_all_records().await.unwrap()[0].id;
        let app = create_router(state);

        let req = Request::get(format!("/articles/{}", id)).body(Body::empty()).unwrap();
        let (status, json) = call(app.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["penalty"]["custodial_term"], "emprisonnement d'un an à cinq ans");

        let req = Request::get("/articles/9999").body(Body::empty()).unwrap();
        let (status, json) = call(app.clone(), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "ARTICLE_NOT_FOUND");

        let req = Request::get("/articles/search?label=350").body(Body::empty()).unwrap();
        let (status, json) = call(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 1);
    }

    #[tokio::test]
    async fn test_reload_picks_up_new_articles() {
        let state = test_state().await;
        let app = create_router(state.clone());

        state
            .repo
            .insert_article(NewArticle {
                numero: "Art. 372".to_string(),
                texte: "Escroquerie".to_string(),
                categorie: Some("Escroquerie".to_string()),
                section: None,
            })
            .await
            .unwrap();

        let req = Request::post("/admin/reload").body(Body::empty()).unwrap();
        let (status, json) = call(app.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["articles"], 2);

        let req = Request::get("/config").body(Body::empty()).unwrap();
        let (_, json) = call(app, req).await;
        assert_eq!(json["articles"], 2);
        assert_eq!(json["retrieval_mode"], "lexical");
        assert_eq!(json["embedding_provider"], "none");
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state().await);
        let req = Request::get("/health").body(Body::empty()).unwrap();
        let (status, json) = call(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["articles"], 1);
    }
}
