//! Reference-set access for the scrubbing pipeline
//!
//! [`LookupStore`] is the seam between the pipeline and the authoritative
//! store: exact-size estimation, full key-column fetch, and batched
//! membership queries. The batching decision itself lives in the pipeline's
//! bulk-lookup strategy; this layer only answers the primitive queries and
//! issues nothing for empty inputs.

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use tracing::trace;

use crate::errors::{LookupError, LookupResult};
use crate::models::ReferenceSet;

#[async_trait]
pub trait LookupStore: Send + Sync {
    /// Approximate row count of a reference set
    async fn approximate_size(&self, set: &ReferenceSet) -> LookupResult<u64>;

    /// The full key column of a reference set, in stored textual form
    async fn all_keys(&self, set: &ReferenceSet) -> LookupResult<Vec<String>>;

    /// The subset of `keys` present in the reference set, in stored
    /// textual form. Empty input returns empty without touching the store.
    async fn keys_in(&self, set: &ReferenceSet, keys: &[String]) -> LookupResult<Vec<String>>;
}

/// SQL-backed [`LookupStore`] over the reference tables
#[derive(Clone)]
pub struct SqlLookupStore {
    pool: Pool<Sqlite>,
}

impl SqlLookupStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn placeholders(count: usize) -> String {
        let mut s = String::with_capacity(count * 3);
        for i in 0..count {
            if i > 0 {
                s.push_str(", ");
            }
            s.push('?');
        }
        s
    }
}

#[async_trait]
impl LookupStore for SqlLookupStore {
    async fn approximate_size(&self, set: &ReferenceSet) -> LookupResult<u64> {
        let count: i64 = match set {
            ReferenceSet::DoNotDisturb => {
                sqlx::query_scalar("SELECT COUNT(*) FROM dnd_list")
                    .fetch_one(&self.pool)
                    .await
            }
            ReferenceSet::ActiveSubscription { service_id } => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM subscriptions
                     WHERE service_id = ? AND status = 'ACTIVE'",
                )
                .bind(service_id)
                .fetch_one(&self.pool)
                .await
            }
            ReferenceSet::Unsubscribed => {
                sqlx::query_scalar("SELECT COUNT(*) FROM unsubscriptions")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(|e| LookupError::unavailable(format!("size estimate for {set}: {e}")))?;

        Ok(count as u64)
    }

    async fn all_keys(&self, set: &ReferenceSet) -> LookupResult<Vec<String>> {
        let rows = match set {
            ReferenceSet::DoNotDisturb => {
                sqlx::query("SELECT msisdn FROM dnd_list")
                    .fetch_all(&self.pool)
                    .await
            }
            ReferenceSet::ActiveSubscription { service_id } => {
                sqlx::query(
                    "SELECT msisdn FROM subscriptions
                     WHERE service_id = ? AND status = 'ACTIVE'",
                )
                .bind(service_id)
                .fetch_all(&self.pool)
                .await
            }
            ReferenceSet::Unsubscribed => {
                sqlx::query("SELECT msisdn FROM unsubscriptions")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| LookupError::full_fetch_failed(set.to_string(), e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.get("msisdn")).collect())
    }

    async fn keys_in(&self, set: &ReferenceSet, keys: &[String]) -> LookupResult<Vec<String>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        trace!("Membership query against {} with {} keys", set, keys.len());
        let placeholders = Self::placeholders(keys.len());

        let sql = match set {
            ReferenceSet::DoNotDisturb => {
                format!("SELECT msisdn FROM dnd_list WHERE msisdn IN ({placeholders})")
            }
            ReferenceSet::ActiveSubscription { .. } => format!(
                "SELECT msisdn FROM subscriptions
                 WHERE service_id = ? AND status = 'ACTIVE' AND msisdn IN ({placeholders})"
            ),
            ReferenceSet::Unsubscribed => {
                format!("SELECT msisdn FROM unsubscriptions WHERE msisdn IN ({placeholders})")
            }
        };

        let mut query = sqlx::query(&sql);

        if let ReferenceSet::ActiveSubscription { service_id } = set {
            query = query.bind(service_id.clone());
        }
        for key in keys {
            query = query.bind(key);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LookupError::unavailable(format!("membership query for {set}: {e}")))?;

        Ok(rows.into_iter().map(|row| row.get("msisdn")).collect())
    }
}
