//! Error type definitions for the MSISDN scrubbing service
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that makes debugging and error
//! handling more straightforward.

use thiserror::Error;

/// Top-level application error type
///
/// This enum represents all possible errors that can occur in the application.
/// It uses `thiserror` to provide automatic error trait implementations and
/// proper error chaining.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reference-store lookup errors
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// A scrub stage aborted because its lookups could not complete.
    ///
    /// Distinguishes "confirmed not a member" from "lookup failed": a
    /// failed batch must never be reported as zero matches.
    #[error("Scrub stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: LookupError,
    },

}

/// Reference-store lookup specific errors
#[derive(Error, Debug)]
pub enum LookupError {
    /// The store is unreachable or a query failed outright
    #[error("Reference store unavailable: {message}")]
    Unavailable { message: String },

    /// A single membership batch failed part-way through a bulk lookup
    #[error("Membership batch {index} failed for {set}: {message}")]
    BatchFailed {
        set: String,
        index: usize,
        message: String,
    },

    /// The full-table fetch of a small reference set failed
    #[error("Full fetch failed for {set}: {message}")]
    FullFetchFailed { set: String, message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Wrap a lookup error with the stage it aborted
    pub fn stage<S: Into<String>>(stage: S, source: LookupError) -> Self {
        Self::Stage {
            stage: stage.into(),
            source,
        }
    }
}

impl LookupError {
    /// Create an unavailable error
    pub fn unavailable<M: Into<String>>(message: M) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a batch failed error
    pub fn batch_failed<S: Into<String>, M: Into<String>>(
        set: S,
        index: usize,
        message: M,
    ) -> Self {
        Self::BatchFailed {
            set: set.into(),
            index,
            message: message.into(),
        }
    }

    /// Create a full fetch failed error
    pub fn full_fetch_failed<S: Into<String>, M: Into<String>>(set: S, message: M) -> Self {
        Self::FullFetchFailed {
            set: set.into(),
            message: message.into(),
        }
    }
}
