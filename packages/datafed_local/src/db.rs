use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::models::{AccessGrant, LocalResource};

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_url: &str) -> Result<Self> {
        info!("Connecting to database: {db_url}");
        // foreign_keys is a per-connection pragma in sqlite; setting it via
        // connect options applies it to every pooled connection, which the
        // grant cascade on resource deletion relies on.
        let options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("Invalid database url: {db_url}"))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {db_url}"))?;

        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous = NORMAL").execute(&pool).await?;

        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("in-memory sqlite")?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("in-memory sqlite")?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn insert_resource(&self, resource: &LocalResource) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO local_resources (data_id, admin_id, description, endpoint, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(data_id) DO NOTHING
            "#,
        )
        .bind(&resource.data_id)
        .bind(&resource.admin_id)
        .bind(&resource.description)
        .bind(&resource.endpoint)
        .bind(&resource.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert resource")?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_resource(&self, data_id: &str) -> Result<Option<LocalResource>> {
        let row = sqlx::query(
            r#"
            SELECT data_id, admin_id, description, endpoint, created_at
            FROM local_resources WHERE data_id = ?
            "#,
        )
        .bind(data_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch resource")?;
        Ok(row.map(row_to_resource))
    }

    /// Delete a resource; the foreign key cascades over its grants in the
    /// same statement, so no grant can outlive its resource.
    pub async fn delete_resource(&self, data_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM local_resources WHERE data_id = ?")
            .bind(data_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete resource")?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn insert_grant(&self, grant: &AccessGrant) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO access_grants (data_id, grantee_id, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(data_id, grantee_id) DO NOTHING
            "#,
        )
        .bind(&grant.data_id)
        .bind(&grant.grantee_id)
        .bind(&grant.expires_at)
        .bind(&grant.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert grant")?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_grant(&self, data_id: &str, grantee_id: &str) -> Result<Option<AccessGrant>> {
        let row = sqlx::query(
            r#"
            SELECT data_id, grantee_id, expires_at, created_at
            FROM access_grants WHERE data_id = ? AND grantee_id = ?
            "#,
        )
        .bind(data_id)
        .bind(grantee_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch grant")?;
        Ok(row.map(row_to_grant))
    }

    pub async fn delete_grant(&self, data_id: &str, grantee_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM access_grants WHERE data_id = ? AND grantee_id = ?")
            .bind(data_id)
            .bind(grantee_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete grant")?;
        Ok(result.rows_affected() == 1)
    }

    /// Grants for one resource that have not yet lapsed. Timestamps are
    /// stored RFC 3339 UTC with a fixed layout, so string comparison orders
    /// them chronologically.
    pub async fn valid_grants(&self, data_id: &str, now: &str) -> Result<Vec<AccessGrant>> {
        let rows = sqlx::query(
            r#"
            SELECT data_id, grantee_id, expires_at, created_at
            FROM access_grants
            WHERE data_id = ? AND expires_at > ?
            ORDER BY grantee_id
            "#,
        )
        .bind(data_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list grants")?;
        Ok(rows.into_iter().map(row_to_grant).collect())
    }

    pub async fn count_grants(&self, data_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM access_grants WHERE data_id = ?")
            .bind(data_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count grants")?;
        Ok(row.get("n"))
    }
}

fn row_to_resource(row: sqlx::sqlite::SqliteRow) -> LocalResource {
    LocalResource {
        data_id: row.get("data_id"),
        admin_id: row.get("admin_id"),
        description: row.get("description"),
        endpoint: row.get("endpoint"),
        created_at: row.get("created_at"),
    }
}

fn row_to_grant(row: sqlx::sqlite::SqliteRow) -> AccessGrant {
    AccessGrant {
        data_id: row.get("data_id"),
        grantee_id: row.get("grantee_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}

pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS local_resources (
            data_id TEXT PRIMARY KEY,
            admin_id TEXT NOT NULL,
            description TEXT NOT NULL,
            endpoint TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS access_grants (
            data_id TEXT NOT NULL,
            grantee_id TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (data_id, grantee_id),
            FOREIGN KEY (data_id) REFERENCES local_resources(data_id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
