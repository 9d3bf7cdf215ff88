//! Functional core for sitepulse.
//!
//! Pure types, validation and aggregation functions, and the repository and
//! provider traits implemented by the I/O crates. Nothing in here touches the
//! network or the database.

pub mod analytics;
#[cfg(feature = "auth")]
pub mod auth;
pub mod notification;
pub mod serde;
pub mod storage;
pub mod users;
