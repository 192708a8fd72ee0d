//! Adaptive bulk membership lookup
//!
//! Answers "which of these MSISDNs are members of reference set R" without
//! the caller caring how the store holds its keys or how large the set is.
//! Every input key is expanded into the alternate forms a table might store
//! it under, then the strategy picks a path per reference set: small sets
//! are pulled whole and intersected in memory, large sets are probed with
//! fixed-size `IN` batches.

use std::collections::{hash_map::Entry, HashMap, HashSet};

use tracing::{debug, warn};

use crate::config::ScrubConfig;
use crate::database::LookupStore;
use crate::errors::{LookupError, LookupResult};
use crate::models::ReferenceSet;
use crate::normalizer::Normalizer;

pub struct BulkLookup<S: LookupStore> {
    store: S,
    normalizer: Normalizer,
    full_fetch_threshold: u64,
    batch_size: usize,
}

impl<S: LookupStore> BulkLookup<S> {
    pub fn new(store: S, normalizer: Normalizer, config: &ScrubConfig) -> Self {
        Self {
            store,
            normalizer,
            full_fetch_threshold: config.full_fetch_threshold,
            batch_size: config.lookup_batch_size.max(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The normalized keys among `msisdns` that are members of `set`.
    ///
    /// A failed batch or full fetch aborts the whole lookup; an error here
    /// must never be read as "no matches".
    pub async fn members(
        &self,
        set: &ReferenceSet,
        msisdns: &[String],
    ) -> LookupResult<HashSet<String>> {
        // Expanded form -> normalized key(s) it was derived from. Short
        // suffix forms can collide across inputs, so the value is a list.
        let mut expansions: HashMap<String, Vec<String>> = HashMap::new();
        let mut query_keys: Vec<String> = Vec::new();

        for msisdn in msisdns {
            let key = self.normalizer.normalize(msisdn);
            if key.is_empty() {
                continue;
            }
            for form in self.normalizer.expand(&key) {
                match expansions.entry(form) {
                    Entry::Vacant(entry) => {
                        query_keys.push(entry.key().clone());
                        entry.insert(vec![key.clone()]);
                    }
                    Entry::Occupied(mut entry) => {
                        if !entry.get().contains(&key) {
                            entry.get_mut().push(key.clone());
                        }
                    }
                }
            }
        }

        if query_keys.is_empty() {
            return Ok(HashSet::new());
        }

        let full_fetch = match self.store.approximate_size(set).await {
            Ok(size) => {
                debug!("Reference set {} holds ~{} rows", set, size);
                size < self.full_fetch_threshold
            }
            Err(e) => {
                // Unknown size: the chunked path works at any scale
                warn!("Size estimate for {} failed ({}), using chunked lookup", set, e);
                false
            }
        };

        let mut members: HashSet<String> = HashSet::new();

        if full_fetch {
            debug!(
                "Full-fetch lookup against {} for {} query keys",
                set,
                query_keys.len()
            );
            for stored in self.store.all_keys(set).await? {
                if let Some(keys) = expansions.get(&stored) {
                    members.extend(keys.iter().cloned());
                }
            }
        } else {
            let batch_count = query_keys.len().div_ceil(self.batch_size);
            debug!(
                "Chunked lookup against {} ({} query keys, {} batches)",
                set,
                query_keys.len(),
                batch_count
            );
            for (index, batch) in query_keys.chunks(self.batch_size).enumerate() {
                let matched = self
                    .store
                    .keys_in(set, batch)
                    .await
                    .map_err(|e| LookupError::batch_failed(set.to_string(), index, e.to_string()))?;
                for stored in matched {
                    if let Some(keys) = expansions.get(&stored) {
                        members.extend(keys.iter().cloned());
                    }
                }
            }
        }

        debug!("{} of {} input keys are members of {}", members.len(), msisdns.len(), set);
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store that records which access path was taken
    #[derive(Default)]
    struct FakeStore {
        keys: Vec<String>,
        size_error: bool,
        batch_error: bool,
        full_fetches: AtomicUsize,
        batch_queries: AtomicUsize,
        batch_sizes: Mutex<Vec<usize>>,
    }

    impl FakeStore {
        fn with_keys(keys: &[&str]) -> Self {
            Self {
                keys: keys.iter().map(|k| k.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl LookupStore for FakeStore {
        async fn approximate_size(&self, _set: &ReferenceSet) -> LookupResult<u64> {
            if self.size_error {
                return Err(LookupError::unavailable("size probe down"));
            }
            Ok(self.keys.len() as u64)
        }

        async fn all_keys(&self, _set: &ReferenceSet) -> LookupResult<Vec<String>> {
            self.full_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.keys.clone())
        }

        async fn keys_in(&self, _set: &ReferenceSet, keys: &[String]) -> LookupResult<Vec<String>> {
            if self.batch_error {
                return Err(LookupError::unavailable("query timeout"));
            }
            self.batch_queries.fetch_add(1, Ordering::SeqCst);
            self.batch_sizes.lock().unwrap().push(keys.len());
            Ok(keys
                .iter()
                .filter(|k| self.keys.contains(k))
                .cloned()
                .collect())
        }
    }

    fn lookup_with(store: FakeStore, threshold: u64, batch_size: usize) -> BulkLookup<FakeStore> {
        let config = ScrubConfig {
            full_fetch_threshold: threshold,
            lookup_batch_size: batch_size,
            ..ScrubConfig::default()
        };
        BulkLookup::new(store, Normalizer::default(), &config)
    }

    #[test]
    fn small_set_goes_through_full_fetch() {
        let store = FakeStore::with_keys(&["08031234567", "2348051112222"]);
        let lookup = lookup_with(store, 30_000, 10_000);

        let input = vec!["+2348031234567".to_string(), "07001112222".to_string()];
        let members = tokio_test::block_on(
            lookup.members(&ReferenceSet::DoNotDisturb, &input),
        )
        .unwrap();

        // Stored trunk-prefixed form matched through expansion
        assert!(members.contains("8031234567"));
        assert!(!members.contains("7001112222"));
        assert_eq!(lookup.store().full_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(lookup.store().batch_queries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn large_set_goes_through_chunked_batches() {
        let store = FakeStore::with_keys(&["8031234567"]);
        // Threshold 0 forces the chunked path; batch size 4 splits the
        // expanded key set of a single input (6 forms) into two batches.
        let lookup = lookup_with(store, 0, 4);

        let input = vec!["08031234567".to_string()];
        let members = tokio_test::block_on(
            lookup.members(&ReferenceSet::DoNotDisturb, &input),
        )
        .unwrap();

        assert!(members.contains("8031234567"));
        assert_eq!(members.len(), 1, "matches must be deduplicated");
        assert_eq!(lookup.store().full_fetches.load(Ordering::SeqCst), 0);
        assert_eq!(lookup.store().batch_queries.load(Ordering::SeqCst), 2);
        let sizes = lookup.store().batch_sizes.lock().unwrap().clone();
        assert!(sizes.iter().all(|s| *s <= 4));
    }

    #[test]
    fn size_estimate_failure_falls_back_to_chunked() {
        let mut store = FakeStore::with_keys(&["08031234567"]);
        store.size_error = true;
        let lookup = lookup_with(store, 30_000, 10_000);

        let input = vec!["08031234567".to_string()];
        let members = tokio_test::block_on(
            lookup.members(&ReferenceSet::DoNotDisturb, &input),
        )
        .unwrap();

        assert!(members.contains("8031234567"));
        assert_eq!(lookup.store().full_fetches.load(Ordering::SeqCst), 0);
        assert!(lookup.store().batch_queries.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn failed_batch_surfaces_instead_of_returning_empty() {
        let mut store = FakeStore::with_keys(&["08031234567"]);
        store.batch_error = true;
        let lookup = lookup_with(store, 0, 10_000);

        let input = vec!["08031234567".to_string()];
        let err = tokio_test::block_on(
            lookup.members(&ReferenceSet::DoNotDisturb, &input),
        )
        .unwrap_err();

        assert!(matches!(err, LookupError::BatchFailed { index: 0, .. }));
    }

    #[test]
    fn empty_and_blank_inputs_issue_no_queries() {
        let store = FakeStore::with_keys(&["08031234567"]);
        let lookup = lookup_with(store, 0, 10_000);

        let input = vec!["".to_string(), "   ".to_string()];
        let members = tokio_test::block_on(
            lookup.members(&ReferenceSet::DoNotDisturb, &input),
        )
        .unwrap();

        assert!(members.is_empty());
        assert_eq!(lookup.store().batch_queries.load(Ordering::SeqCst), 0);
        assert_eq!(lookup.store().full_fetches.load(Ordering::SeqCst), 0);
    }
}
