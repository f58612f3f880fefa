use std::sync::Arc;

use anyhow::Context;
use fitness_tracker::api::routes::{create_routes, AppState};
use fitness_tracker::auth::AuthService;
use fitness_tracker::config::{run_migrations, AppConfig, DatabaseConfig};
use fitness_tracker::services::{
    ExifTimestampReader, HttpOcrClient, IngestionPipeline, IngestionSettings, RasterImageCodec,
    TrainingSessionService,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let db_config = DatabaseConfig::from_env()?;
    let pool = db_config
        .create_pool()
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let sessions = Arc::new(TrainingSessionService::new(pool.clone()));
    let recognizer = HttpOcrClient::new(&config.ocr).context("Failed to create OCR client")?;

    let ingestion = IngestionPipeline::new(
        Arc::new(RasterImageCodec::new()),
        Arc::new(recognizer),
        Arc::new(ExifTimestampReader::new()),
        sessions.clone(),
        IngestionSettings::from_config(&config),
    );

    let auth = AuthService::new(pool, &config.jwt_secret)
        .with_exposed_reset_tokens(config.expose_reset_tokens);

    let app = create_routes(AppState {
        auth,
        sessions,
        ingestion,
    });

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Fitness tracker starting on http://{} ({})", address, config.environment);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
