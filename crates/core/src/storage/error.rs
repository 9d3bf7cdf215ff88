use thiserror::Error;

/// Errors that can occur when constructing a time range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeRangeError {
    #[error("Invalid time range: start must be before or equal to end")]
    InvalidRange,
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    /// No backing store is configured. Distinct from a failed write against
    /// a configured store.
    #[error("Database not available")]
    Unavailable,
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_error_display() {
        assert_eq!(
            TimeRangeError::InvalidRange.to_string(),
            "Invalid time range: start must be before or equal to end"
        );
    }

    #[test]
    fn test_repository_error_not_found_display() {
        let error = RepositoryError::NotFound {
            entity_type: "User",
            id: "open-123".to_string(),
        };
        assert_eq!(error.to_string(), "User not found: open-123");
    }

    #[test]
    fn test_repository_error_unavailable_display() {
        assert_eq!(
            RepositoryError::Unavailable.to_string(),
            "Database not available"
        );
    }

    #[test]
    fn test_repository_error_connection_failed_display() {
        let error = RepositoryError::ConnectionFailed("timeout after 30s".to_string());
        assert_eq!(error.to_string(), "Connection failed: timeout after 30s");
    }

    #[test]
    fn test_repository_error_query_failed_display() {
        let error = RepositoryError::QueryFailed("no such table: users".to_string());
        assert_eq!(error.to_string(), "Query failed: no such table: users");
    }

    #[test]
    fn test_repository_error_invalid_data_display() {
        let error = RepositoryError::InvalidData("openId is required".to_string());
        assert_eq!(error.to_string(), "Invalid data: openId is required");
    }
}
