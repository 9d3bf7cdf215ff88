//! SQLite repositories built on the shared [`Database`](super::Database) handle.

mod analytics;
mod conversions;
mod error;
mod schema;
mod users;

pub use analytics::AnalyticsStore;
pub use error::map_sqlx_error;
pub use schema::CREATE_TABLES;
pub use users::UserStore;
