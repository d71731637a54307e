use super::KeyValueStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;

/// PostgreSQL-backed key-value storage, for clients that share a database
/// instead of a local data directory.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5) // Configure pool size
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;
        Ok(PostgresStore {
            pool: Arc::new(pool),
        })
    }

    /// Initializes the database schema if it doesn't exist.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(&*self.pool)
        .await
        .context("Failed to initialize database schema")?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for PostgresStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .with_context(|| format!("Failed to fetch key '{}' from database", key))?;
        Ok(value.map(|(v,)| v))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        // Single-statement upsert, so the row is replaced atomically.
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = NOW();
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&*self.pool)
        .await
        .with_context(|| format!("Failed to save key '{}' to database", key))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(&*self.pool)
            .await
            .with_context(|| format!("Failed to delete key '{}' from database", key))?;
        Ok(())
    }
}
