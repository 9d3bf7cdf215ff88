use std::env;

/// Origins allowed when `CORS_ALLOWED_ORIGINS` is not set.
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://sitepulse.app",
    "https://www.sitepulse.app",
    "http://localhost:3000",
    "http://localhost:5173",
];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// SQLite connection string. `None` runs without a database.
    pub database_url: Option<String>,
    /// Base URL of the owner notification service.
    pub forge_api_url: Option<String>,
    /// Bearer key for the owner notification service.
    pub forge_api_key: Option<String>,
    /// Origins allowed to make credentialed cross-origin requests.
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (optional)
    /// - `BUILT_IN_FORGE_API_URL` - Notification service base URL (optional)
    /// - `BUILT_IN_FORGE_API_KEY` - Notification service key (optional)
    /// - `CORS_ALLOWED_ORIGINS` - Comma separated origins (default: production and localhost)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let allowed_origins = match non_empty("CORS_ALLOWED_ORIGINS") {
            Some(origins) => parse_origins(&origins),
            None => DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
        };

        Self {
            database_url: non_empty("DATABASE_URL"),
            forge_api_url: non_empty("BUILT_IN_FORGE_API_URL"),
            forge_api_key: non_empty("BUILT_IN_FORGE_API_KEY"),
            allowed_origins,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
