//! Row decoding helpers shared by the SQLite repositories.

use chrono::{DateTime, Utc};
use sitepulse_core::storage::{RepositoryError, Result};
use sqlx::{sqlite::SqliteRow, Row};

use super::error::map_sqlx_error;

/// Reads an RFC 3339 text column as a UTC timestamp.
pub fn parse_timestamp(
    row: &SqliteRow,
    column: &str,
    entity_type: &'static str,
) -> Result<DateTime<Utc>> {
    let raw: String = row
        .try_get(column)
        .map_err(|e| map_sqlx_error(e, entity_type))?;

    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Serialization(format!("{entity_type}.{column}: {e}")))
}

/// Reads a column, mapping decode failures.
pub fn column<'r, T>(row: &'r SqliteRow, column: &str, entity_type: &'static str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| map_sqlx_error(e, entity_type))
}
