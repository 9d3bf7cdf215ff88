pub mod analytics;
pub mod error;
pub mod reports;
pub mod system;

pub use error::AppError;
