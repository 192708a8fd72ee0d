//! Data model types for the scrubbing pipeline
//!
//! Everything here is request-scoped: created at the start of one scrub
//! invocation, consumed by the pipeline, and owned by the caller once the
//! report is returned. Nothing has cross-request identity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifies one of the authoritative reference sets a scrub stage
/// filters against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSet {
    /// Numbers on the do-not-disturb registry
    DoNotDisturb,
    /// Numbers with an active subscription to the given service
    ActiveSubscription { service_id: String },
    /// Numbers that previously unsubscribed
    Unsubscribed,
}

impl fmt::Display for ReferenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoNotDisturb => write!(f, "dnd_list"),
            Self::ActiveSubscription { service_id } => {
                write!(f, "subscriptions[{service_id}]")
            }
            Self::Unsubscribed => write!(f, "unsubscriptions"),
        }
    }
}

/// Per-stage toggles for a scrub run. All stages default to enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubOptions {
    pub dnd: bool,
    pub operator: bool,
    pub sub: bool,
    pub unsub: bool,
    /// Service the subscription stage checks against
    pub service_id: String,
    /// Carrier the operator stage keeps; `None` skips the stage entirely
    pub target_operator: Option<String>,
}

impl Default for ScrubOptions {
    fn default() -> Self {
        Self {
            dnd: true,
            operator: true,
            sub: true,
            unsub: true,
            service_id: "PROMO".to_string(),
            target_operator: None,
        }
    }
}

/// Snapshot of the surviving base after one pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageSnapshot {
    pub stage: String,
    pub count: usize,
    pub removed: usize,
}

/// Structured result of a full scrub run
///
/// Built incrementally by the pipeline, never mutated after the pipeline
/// completes. Serializes to the report wire format consumed downstream.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScrubReport {
    pub initial_count: usize,
    pub dnd_removed: usize,
    pub operator_removed: usize,
    pub sub_removed: usize,
    pub unsub_removed: usize,
    pub stages: Vec<StageSnapshot>,
}

impl ScrubReport {
    pub fn new(initial_count: usize) -> Self {
        Self {
            initial_count,
            stages: vec![StageSnapshot {
                stage: "Total Base".to_string(),
                count: initial_count,
                removed: 0,
            }],
            ..Default::default()
        }
    }

    pub fn record_stage<S: Into<String>>(&mut self, stage: S, count: usize, removed: usize) {
        self.stages.push(StageSnapshot {
            stage: stage.into(),
            count,
            removed,
        });
    }

    /// Total removed across all stages
    pub fn total_removed(&self) -> usize {
        self.dnd_removed + self.operator_removed + self.sub_removed + self.unsub_removed
    }
}

/// Row counts of the reference sets, for operational visibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSetStats {
    pub dnd_count: i64,
    pub sub_count: i64,
    pub unsub_count: i64,
}

/// Static mapping from operator name to its number series prefixes.
///
/// Prefixes are stored trunk-prefixed (`0803`) the way carriers publish
/// them; the operator stage strips them through the shared normalizer so
/// comparisons stay aligned with normalized keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorPrefixTable {
    operators: HashMap<String, Vec<String>>,
}

impl Default for OperatorPrefixTable {
    fn default() -> Self {
        let mut operators = HashMap::new();
        operators.insert(
            "MTN".to_string(),
            vec![
                "0803", "0806", "0703", "0706", "0810", "0813", "0814", "0816", "0903", "0906",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        operators.insert(
            "Airtel".to_string(),
            vec!["0802", "0808", "0701", "0708", "0812", "0902", "0901", "0907"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        operators.insert(
            "Glo".to_string(),
            vec!["0805", "0807", "0705", "0811", "0815", "0905"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        operators.insert(
            "9mobile".to_string(),
            vec!["0809", "0817", "0818", "0909"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        Self { operators }
    }
}

impl OperatorPrefixTable {
    /// Build a table from an explicit operator → prefixes mapping
    pub fn new(operators: HashMap<String, Vec<String>>) -> Self {
        Self { operators }
    }

    /// Prefixes for the named operator, `None` when the operator is unknown
    pub fn prefixes(&self, operator: &str) -> Option<&[String]> {
        self.operators.get(operator).map(|p| p.as_slice())
    }

    pub fn is_known(&self, operator: &str) -> bool {
        self.operators.contains_key(operator)
    }
}
