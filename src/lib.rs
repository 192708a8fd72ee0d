//! MSISDN base scrubbing for outbound-call campaigns
//!
//! Prepares a clean list of subscriber numbers for a promotional campaign
//! by removing numbers that are legally or operationally ineligible:
//! do-not-disturb registrations, active subscribers, prior unsubscribers,
//! and numbers outside a target carrier's series. Tolerates inconsistent
//! number formatting and very large bases without exceeding database query
//! limits.

pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod normalizer;
pub mod pipeline;

pub use config::Config;
pub use database::{Database, LookupStore, ResultArchive, SqlLookupStore};
pub use errors::{AppError, AppResult, LookupError};
pub use models::{
    OperatorPrefixTable, ReferenceSet, ReferenceSetStats, ScrubOptions, ScrubReport,
    StageSnapshot,
};
pub use normalizer::Normalizer;
pub use pipeline::{BulkLookup, ScrubPipeline};
