use std::time::Duration;

/// Cookie carrying the session token.
pub const COOKIE_NAME: &str = "app_session_id";
const ONE_YEAR: Duration = Duration::from_secs(60 * 60 * 24 * 365);
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Complete auth configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Application id, embedded in session tokens and sent as OAuth client id.
    pub app_id: String,
    /// Secret the session tokens are signed with.
    pub session_secret: String,
    /// Base URL of the OAuth authorization server.
    pub oauth_server_url: String,
    /// Identity that becomes admin on first sign-in.
    pub owner_open_id: Option<String>,
    /// Production mode refuses to issue sessions signed with an empty secret.
    pub is_production: bool,
    pub cookie_name: String,
    pub session_ttl: Duration,
    pub provider_timeout: Duration,
}

impl AuthConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VITE_APP_ID`: Application id (default: empty)
    /// - `JWT_SECRET`: Session signing secret (default: empty)
    /// - `OAUTH_SERVER_URL`: OAuth server base URL (default: empty, logged as an error)
    /// - `OWNER_OPEN_ID`: Owner identity granted admin on first sign-in (optional)
    /// - `NODE_ENV`: `production` enables production mode
    ///
    /// Missing values never abort startup; they degrade the features that need them.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config = Self {
            app_id: lookup("VITE_APP_ID").unwrap_or_default(),
            session_secret: lookup("JWT_SECRET").unwrap_or_default(),
            oauth_server_url: lookup("OAUTH_SERVER_URL").unwrap_or_default(),
            owner_open_id: lookup("OWNER_OPEN_ID").filter(|id| !id.is_empty()),
            is_production: lookup("NODE_ENV").as_deref() == Some("production"),
            cookie_name: COOKIE_NAME.to_string(),
            session_ttl: ONE_YEAR,
            provider_timeout: PROVIDER_TIMEOUT,
        };

        if config.oauth_server_url.is_empty() {
            tracing::error!("OAUTH_SERVER_URL is not configured, OAuth calls will fail");
        }
        if !config.can_issue_sessions() {
            tracing::error!("JWT_SECRET is not configured, sign-in is disabled in production");
        } else if config.session_secret.is_empty() {
            tracing::warn!("JWT_SECRET is not configured, session tokens use an empty secret");
        }
        if config.owner_open_id.is_none() {
            tracing::info!("OWNER_OPEN_ID is not configured, no user is promoted to admin");
        }

        config
    }

    /// Whether new session tokens may be signed with this config.
    pub fn can_issue_sessions(&self) -> bool {
        !self.is_production || !self.session_secret.is_empty()
    }
}
