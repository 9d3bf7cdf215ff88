//! SQLite error mapping.
//!
//! Maps `sqlx::Error` to `RepositoryError` from `sitepulse_core::storage`.

use sitepulse_core::storage::RepositoryError;

/// Maps a sqlx error to a RepositoryError.
///
/// # Error Mapping
///
/// - Unique constraint violations → `RepositoryError::InvalidData`
/// - `RowNotFound` → `RepositoryError::NotFound`
/// - Pool and I/O errors → `RepositoryError::ConnectionFailed`
/// - Column decode errors → `RepositoryError::Serialization`
/// - All other errors → `RepositoryError::QueryFailed`
pub fn map_sqlx_error(err: sqlx::Error, entity_type: &'static str) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::InvalidData(format!("Duplicate {entity_type}"))
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound {
            entity_type,
            id: "unknown".to_string(),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::ConnectionFailed(err.to_string())
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            RepositoryError::Serialization(err.to_string())
        }
        other => RepositoryError::QueryFailed(other.to_string()),
    }
}
