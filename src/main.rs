use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use content_translations::config::Config;
use content_translations::db::Database;
use content_translations::i18n::LanguageRegistry;
use content_translations::render::FilterChain;
use content_translations::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("content_translations=info".parse()?),
        )
        .init();

    info!("Starting content translations service");

    // Load configuration from environment
    let config = Config::from_env()?;

    let registry = match &config.languages {
        Some(spec) => LanguageRegistry::from_config(spec)?,
        None => LanguageRegistry::default(),
    };
    info!(
        "Serving {} languages (default: {})",
        registry.list().len(),
        registry.default_code()
    );

    let db = Database::new(&config.database_path)?;

    let state = AppState {
        db,
        registry: Arc::new(registry),
        chain: Arc::new(FilterChain::with_defaults()),
        config: Arc::new(config),
    };

    server::serve(state).await
}
