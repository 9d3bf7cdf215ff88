use thiserror::Error;

/// Failure kinds of the authentication subsystem.
///
/// The first six are the session taxonomy; the Request Context collapses all
/// of them into "anonymous". The remaining variants only occur on the OAuth
/// callback path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no session cookie")]
    NoSession,

    #[error("invalid session cookie")]
    InvalidSession,

    #[error("failed to sync user info: {0}")]
    SyncFailed(String),

    #[error("user not found")]
    UserNotFound,

    #[error("user store not available")]
    StoreUnavailable,

    #[error("identity provider request failed: {0}")]
    Transport(String),

    #[error("invalid OAuth state parameter")]
    InvalidState,

    #[error("openId missing from user info")]
    MissingOpenId,

    #[error("storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Short stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoSession => "no_session",
            Self::InvalidSession => "invalid_session",
            Self::SyncFailed(_) => "sync_failed",
            Self::UserNotFound => "user_not_found",
            Self::StoreUnavailable => "store_unavailable",
            Self::Transport(_) => "transport",
            Self::InvalidState => "invalid_state",
            Self::MissingOpenId => "missing_open_id",
            Self::Storage(_) => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let errors = [
            AuthError::NoSession,
            AuthError::InvalidSession,
            AuthError::SyncFailed(String::new()),
            AuthError::UserNotFound,
            AuthError::StoreUnavailable,
            AuthError::Transport(String::new()),
            AuthError::InvalidState,
            AuthError::MissingOpenId,
            AuthError::Storage(String::new()),
        ];
        let mut kinds: Vec<_> = errors.iter().map(AuthError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn sync_failed_display_carries_cause() {
        let error = AuthError::SyncFailed("connection refused".to_string());
        assert_eq!(
            error.to_string(),
            "failed to sync user info: connection refused"
        );
    }
}
