use anyhow::{Context, Result};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::models::KeyRecord;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_url: &str) -> Result<Self> {
        info!("Connecting to database: {db_url}");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .connect(db_url)
            .await
            .with_context(|| format!("Failed to connect to database: {db_url}"))?;

        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous = NORMAL").execute(&pool).await?;

        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory database for tests. Single connection so every query sees
    /// the same store.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("in-memory sqlite")?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert a key record if the identity is free. Returns `false` when the
    /// identity already holds a live record. The uniqueness check and the
    /// insert are one statement, so concurrent identical registrations
    /// cannot both succeed.
    pub async fn insert_key(
        &self,
        identity: &str,
        public_key: &str,
        registered_at: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO key_records (identity, public_key, registered_at)
            VALUES (?, ?, ?)
            ON CONFLICT(identity) DO NOTHING
            "#,
        )
        .bind(identity)
        .bind(public_key)
        .bind(registered_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert key record")?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_key(&self, identity: &str) -> Result<Option<KeyRecord>> {
        let row = sqlx::query(
            "SELECT identity, public_key, registered_at FROM key_records WHERE identity = ?",
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch key record")?;
        Ok(row.map(row_to_record))
    }

    pub async fn delete_key(&self, identity: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM key_records WHERE identity = ?")
            .bind(identity)
            .execute(&self.pool)
            .await
            .context("Failed to delete key record")?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn list_keys(&self) -> Result<Vec<KeyRecord>> {
        let rows = sqlx::query(
            "SELECT identity, public_key, registered_at FROM key_records ORDER BY identity",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list key records")?;
        Ok(rows.into_iter().map(row_to_record).collect())
    }
}

fn row_to_record(row: sqlx::sqlite::SqliteRow) -> KeyRecord {
    KeyRecord {
        identity: row.get("identity"),
        public_key: row.get("public_key"),
        registered_at: row.get("registered_at"),
    }
}

pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS key_records (
            identity TEXT PRIMARY KEY,
            public_key TEXT NOT NULL,
            registered_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
