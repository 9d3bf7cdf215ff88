//! Pure types for request-scoped context.

use sitepulse_core::users::User;
use uuid::Uuid;

/// Unique identifier for a request, used for tracing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// A fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Request-scoped context available to all handlers.
///
/// Either anonymous or carrying the resolved user; never shared between
/// requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Authenticated user (None if anonymous).
    pub user: Option<User>,
    /// Unique request identifier for tracing.
    pub request_id: RequestId,
}

impl RequestContext {
    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|user| user.id)
    }
}
