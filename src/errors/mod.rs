//! Error types for the MSISDN scrubbing service

pub mod types;

pub use types::{AppError, LookupError};

/// Convenience result type used throughout the application
pub type AppResult<T> = Result<T, AppError>;

/// Result type for reference-store lookups; the pipeline wraps these with
/// the stage they aborted
pub type LookupResult<T> = Result<T, LookupError>;
