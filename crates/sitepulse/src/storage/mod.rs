//! Storage backends.

mod db;
pub mod sqlite;

pub use db::Database;

#[cfg(test)]
pub(crate) use db::memory_database;
