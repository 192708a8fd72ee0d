//! The scrubbing pipeline
//!
//! Runs an ordered sequence of filtering stages over a raw MSISDN base:
//! DND registry, operator series, active subscriptions, prior
//! unsubscriptions. Survivors keep their original text and relative order;
//! only the keep/remove decision uses normalized keys. Each stage completes
//! its lookups before the next starts, and the first stage failure aborts
//! the run naming the stage; a partially scrubbed base is never returned as
//! fully scrubbed.

pub mod bulk_lookup;

pub use bulk_lookup::BulkLookup;

use tracing::{info, warn};

use crate::config::ScrubConfig;
use crate::database::LookupStore;
use crate::errors::{AppError, AppResult};
use crate::models::{OperatorPrefixTable, ReferenceSet, ScrubOptions, ScrubReport};
use crate::normalizer::Normalizer;

pub struct ScrubPipeline<S: LookupStore> {
    lookup: BulkLookup<S>,
    normalizer: Normalizer,
    operators: OperatorPrefixTable,
}

impl<S: LookupStore> ScrubPipeline<S> {
    pub fn new(store: S, config: &ScrubConfig) -> Self {
        let normalizer = Normalizer::new(
            config.country_code.clone(),
            config.national_number_length,
        );
        Self {
            lookup: BulkLookup::new(store, normalizer.clone(), config),
            normalizer,
            operators: OperatorPrefixTable::default(),
        }
    }

    /// Replace the built-in operator prefix table
    pub fn with_operators(mut self, operators: OperatorPrefixTable) -> Self {
        self.operators = operators;
        self
    }

    /// Run the full scrub over `msisdns`, returning the surviving base and
    /// the stage-by-stage report.
    ///
    /// Stage order is fixed: DND, operator, subscription, unsubscription.
    /// Disabled stages are skipped entirely and leave no report entry.
    pub async fn run(
        &self,
        msisdns: &[String],
        options: &ScrubOptions,
    ) -> AppResult<(Vec<String>, ScrubReport)> {
        let mut report = ScrubReport::new(msisdns.len());
        let mut base: Vec<String> = msisdns.to_vec();

        info!(
            "Starting scrub run: {} numbers, options dnd={} operator={} sub={} unsub={}",
            base.len(),
            options.dnd,
            options.operator,
            options.sub,
            options.unsub
        );

        if options.dnd {
            let stage = "After DND";
            let (survivors, removed) = self
                .membership_stage(stage, &base, &ReferenceSet::DoNotDisturb)
                .await?;
            base = survivors;
            report.dnd_removed = removed;
            report.record_stage(stage, base.len(), removed);
        }

        if options.operator {
            if let Some(operator) = &options.target_operator {
                let (survivors, removed) = self.operator_stage(&base, operator);
                base = survivors;
                report.operator_removed = removed;
                report.record_stage(format!("After {operator} Scrubbing"), base.len(), removed);
            }
        }

        if options.sub {
            let stage = "After Subscription Check";
            let set = ReferenceSet::ActiveSubscription {
                service_id: options.service_id.clone(),
            };
            let (survivors, removed) = self.membership_stage(stage, &base, &set).await?;
            base = survivors;
            report.sub_removed = removed;
            report.record_stage(stage, base.len(), removed);
        }

        if options.unsub {
            let stage = "Final (After Unsub Check)";
            let (survivors, removed) = self
                .membership_stage(stage, &base, &ReferenceSet::Unsubscribed)
                .await?;
            base = survivors;
            report.unsub_removed = removed;
            report.record_stage(stage, base.len(), removed);
        }

        info!(
            "Scrub run complete: {} of {} survived, {} removed",
            base.len(),
            report.initial_count,
            report.total_removed()
        );
        Ok((base, report))
    }

    /// Remove every number whose normalized key is a member of `set`
    async fn membership_stage(
        &self,
        stage: &str,
        base: &[String],
        set: &ReferenceSet,
    ) -> AppResult<(Vec<String>, usize)> {
        if base.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let members = self
            .lookup
            .members(set, base)
            .await
            .map_err(|e| AppError::stage(stage, e))?;

        let survivors: Vec<String> = base
            .iter()
            .filter(|msisdn| !members.contains(&self.normalizer.normalize(msisdn)))
            .cloned()
            .collect();
        let removed = base.len() - survivors.len();
        info!("Stage '{}': {} kept, {} removed", stage, survivors.len(), removed);
        Ok((survivors, removed))
    }

    /// Keep only numbers whose normalized key starts with one of the
    /// operator's series prefixes. Unknown operator names are a no-op.
    fn operator_stage(&self, base: &[String], operator: &str) -> (Vec<String>, usize) {
        let Some(prefixes) = self.operators.prefixes(operator) else {
            warn!("Unknown operator '{}', operator stage is a no-op", operator);
            return (base.to_vec(), 0);
        };

        let aligned: Vec<String> = prefixes
            .iter()
            .map(|p| self.normalizer.normalize_prefix(p))
            .filter(|p| !p.is_empty())
            .collect();

        let survivors: Vec<String> = base
            .iter()
            .filter(|msisdn| {
                let key = self.normalizer.normalize(msisdn);
                !key.is_empty() && aligned.iter().any(|prefix| key.starts_with(prefix.as_str()))
            })
            .cloned()
            .collect();
        let removed = base.len() - survivors.len();
        info!(
            "Stage 'After {} Scrubbing': {} kept, {} removed",
            operator,
            survivors.len(),
            removed
        );
        (survivors, removed)
    }
}
