//! Archival of scrubbed survivor lists
//!
//! The pipeline never persists anything itself; the caller hands the final
//! base to this collaborator after a run. Results go into the fixed
//! `scrub_results` table keyed by a caller-supplied run label, one named
//! result sink rather than a table per run.

use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use tracing::info;

use crate::errors::AppResult;

/// Multi-row insert chunk. One row binds three parameters, so a chunk
/// binds 15,000 and stays under SQLite's host-parameter limit of 32,766.
const INSERT_CHUNK: usize = 5_000;

#[derive(Clone)]
pub struct ResultArchive {
    pool: Pool<Sqlite>,
}

impl ResultArchive {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Store a survivor list under `run_label`, returning the row count
    pub async fn archive(&self, run_label: &str, msisdns: &[String]) -> AppResult<usize> {
        if msisdns.is_empty() {
            return Ok(0);
        }

        let created_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        for chunk in msisdns.chunks(INSERT_CHUNK) {
            let mut sql = String::from("INSERT INTO scrub_results (run_label, msisdn, created_at) VALUES ");
            let values: Vec<&str> = (0..chunk.len()).map(|_| "(?, ?, ?)").collect();
            sql.push_str(&values.join(", "));

            let mut query = sqlx::query(&sql);
            for msisdn in chunk {
                query = query.bind(run_label).bind(msisdn).bind(created_at);
            }
            query.execute(&mut *tx).await?;
        }

        tx.commit().await?;
        info!("Archived {} survivors under run '{}'", msisdns.len(), run_label);
        Ok(msisdns.len())
    }

    /// Retrieve a previously archived survivor list in insertion order
    pub async fn fetch(&self, run_label: &str) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT msisdn FROM scrub_results WHERE run_label = ? ORDER BY rowid",
        )
        .bind(run_label)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("msisdn")).collect())
    }
}
