use tracing_subscriber::EnvFilter;

use pattern_curator::api;
use pattern_curator::config::{Config, UrlMode};
use pattern_curator::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    match config.rest_url() {
        Some(url) => tracing::info!("Record store: {url}"),
        None => tracing::info!("Record store: in-memory"),
    }
    tracing::info!(
        "Image URLs: {}",
        match config.storage.url_mode {
            UrlMode::Public => "public",
            UrlMode::Signed => "signed",
        }
    );
    tracing::info!(
        "LLM provider: {} ({}, model {})",
        config.llm.provider,
        config.llm.base_url,
        config.llm.chat_model
    );
    if let Some(var) = config.llm.missing_credential() {
        tracing::warn!("{var} is not set; /api/interpret will answer 500");
    }

    let state = AppState::new(config.clone())?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
