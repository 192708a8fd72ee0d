//! Database layer: connection pool, schema setup, and reference-set access

use crate::config::DatabaseConfig;
use crate::models::ReferenceSetStats;
use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Pool, Sqlite};
use tracing::info;

pub mod archive;
pub mod lookup;

pub use archive::ResultArchive;
pub use lookup::{LookupStore, SqlLookupStore};

/// Schema applied on startup. The reference tables are normally populated
/// out of band by carrier data loads; this only guarantees they exist.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS dnd_list (
        msisdn TEXT PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS subscriptions (
        msisdn TEXT NOT NULL,
        service_id TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'ACTIVE',
        PRIMARY KEY (msisdn, service_id)
    )",
    "CREATE TABLE IF NOT EXISTS unsubscriptions (
        msisdn TEXT PRIMARY KEY,
        unsubscribed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS scrub_results (
        run_label TEXT NOT NULL,
        msisdn TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_scrub_results_run_label
        ON scrub_results (run_label)",
];

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        // Create database if it doesn't exist (for SQLite)
        if !Sqlite::database_exists(&config.url).await? {
            Sqlite::create_database(&config.url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(10))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool, used by tests running against `sqlite::memory:`
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }

    /// Row counts of the reference sets, for operational visibility
    pub async fn reference_set_stats(&self) -> Result<ReferenceSetStats> {
        let dnd_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dnd_list")
            .fetch_one(&self.pool)
            .await?;
        let sub_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE status = 'ACTIVE'")
                .fetch_one(&self.pool)
                .await?;
        let unsub_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM unsubscriptions")
            .fetch_one(&self.pool)
            .await?;

        Ok(ReferenceSetStats {
            dnd_count,
            sub_count,
            unsub_count,
        })
    }
}
