//! LexDZ Embedding Worker
//!
//! Backfills vectors for penal-code articles:
//! 1. Loads articles that have no embedding
//! 2. Embeds them in batches as documents
//! 3. Writes each vector once, never overwriting an existing one
//!
//! `embedding-worker test "<text>"` embeds a single text and prints its dimension.

mod processor;

use crate::processor::BackfillProcessor;
use lexdz_common::{
    config::AppConfig,
    db::DbPool,
    embeddings::create_embedder,
    Repository, VERSION,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }

    info!("Starting LexDZ Embedding Worker v{}", VERSION);

    // Initialize embedder
    let Some(embedder) = create_embedder(&config.embedding)? else {
        anyhow::bail!(
            "No embedding provider configured (provider = {:?}); set APP__EMBEDDING__PROVIDER and APP__EMBEDDING__API_KEY",
            config.embedding.provider
        );
    };

    info!(
        model = %embedder.model_name(),
        dimension = embedder.dimension(),
        "Embedder initialized"
    );

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db);
    repo.ensure_schema().await?;

    let processor = BackfillProcessor::new(repo, embedder, config.embedding.batch_size);

    // Check for command line arguments for testing
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "test" {
        info!("Running in test mode...");

        let test_text = if args.len() > 2 {
            args[2].clone()
        } else {
            "Quelle est la peine pour le vol ?".to_string()
        };

        match processor.embed_single(&test_text).await {
            Ok(embedding) => {
                println!("Embedding generated successfully!");
                println!("  Dimension: {}", embedding.len());
                println!("  First 5 values: {:?}", &embedding[..5.min(embedding.len())]);
            }
            Err(e) => {
                error!(error = %e, "Failed to generate embedding");
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        return Ok(());
    }

    let report = tokio::select! {
        report = processor.run() => report?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping backfill");
            return Ok(());
        }
    };

    println!(
        "Backfill done: {} pending, {} attached, {} failed, {} already vectorized",
        report.pending, report.attached, report.failed, report.skipped
    );

    info!("Embedding worker shutting down");
    Ok(())
}
