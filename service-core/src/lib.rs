//! service-core: Shared infrastructure for the academy billing crates.
pub mod config;
pub mod error;
pub mod observability;

pub use error::AppError;
pub use tracing;
pub use validator;
