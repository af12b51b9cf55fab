use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Persistence
    pub database_path: String,

    // HTTP
    pub port: u16,

    // Editing
    /// API key required for write operations (edit rights).
    pub api_key: String,
    /// One-time edit tokens older than this are rejected.
    pub token_ttl_secs: i64,

    // Languages
    /// Deployment language list override (`LANGUAGES` syntax, see
    /// `LanguageRegistry::from_config`). `None` means the built-in list.
    pub languages: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "translations.db".to_string()),

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            api_key: std::env::var("EDITOR_API_KEY").context("EDITOR_API_KEY not set")?,

            token_ttl_secs: std::env::var("EDIT_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),

            languages: std::env::var("LANGUAGES").ok(),
        })
    }
}
