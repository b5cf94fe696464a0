use std::sync::Arc;

use anyhow::Context;
use exam_score_reader::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "exam_score_reader=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let addr = config.listen_addr();

    tracing::info!(model = %config.model, base_url = %config.base_url, "Provider configured");

    let app = build_router(Arc::new(AppState::new(&config)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Server running on http://{}", addr);
    tracing::info!("  GET  /");
    tracing::info!("  POST /api/upload");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
