use anyhow::{Context, Result};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::models::CatalogEntry;

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

    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("in-memory sqlite")?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert an entry unless the `data_id` is taken. Check-then-act is a
    /// single statement, so concurrent publishes of the same id cannot both
    /// succeed.
    pub async fn insert_entry(&self, entry: &CatalogEntry) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO catalog_entries (data_id, owner_id, description, endpoint, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(data_id) DO NOTHING
            "#,
        )
        .bind(&entry.data_id)
        .bind(&entry.owner_id)
        .bind(&entry.description)
        .bind(&entry.endpoint)
        .bind(&entry.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert catalog entry")?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_entry(&self, data_id: &str) -> Result<Option<CatalogEntry>> {
        let row = sqlx::query(
            r#"
            SELECT data_id, owner_id, description, endpoint, created_at
            FROM catalog_entries WHERE data_id = ?
            "#,
        )
        .bind(data_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch catalog entry")?;
        Ok(row.map(row_to_entry))
    }

    pub async fn delete_entry(&self, data_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM catalog_entries WHERE data_id = ?")
            .bind(data_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete catalog entry")?;
        Ok(result.rows_affected() == 1)
    }

    /// Case-insensitive substring match on the description.
    pub async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<CatalogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT data_id, owner_id, description, endpoint, created_at
            FROM catalog_entries
            WHERE instr(lower(description), lower(?)) > 0
            ORDER BY data_id
            "#,
        )
        .bind(keyword)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search catalog by keyword")?;
        Ok(rows.into_iter().map(row_to_entry).collect())
    }

    pub async fn search_by_owner(&self, owner_id: &str) -> Result<Vec<CatalogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT data_id, owner_id, description, endpoint, created_at
            FROM catalog_entries WHERE owner_id = ?
            ORDER BY data_id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search catalog by owner")?;
        Ok(rows.into_iter().map(row_to_entry).collect())
    }
}

fn row_to_entry(row: sqlx::sqlite::SqliteRow) -> CatalogEntry {
    CatalogEntry {
        data_id: row.get("data_id"),
        owner_id: row.get("owner_id"),
        description: row.get("description"),
        endpoint: row.get("endpoint"),
        created_at: row.get("created_at"),
    }
}

pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS catalog_entries (
            data_id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            description TEXT NOT NULL,
            endpoint TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_catalog_owner ON catalog_entries(owner_id)")
        .execute(pool)
        .await?;
    Ok(())
}
