use anyhow::{Context, Result};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::models::User;

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

    pub async fn insert_user(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (user_id, password_hash, public_key, secret_key, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.password_hash)
        .bind(&user.public_key)
        .bind(&user.secret_key)
        .bind(&user.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert user")?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, password_hash, public_key, secret_key, created_at
            FROM users WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;
        Ok(row.map(|row| User {
            user_id: row.get("user_id"),
            password_hash: row.get("password_hash"),
            public_key: row.get("public_key"),
            secret_key: row.get("secret_key"),
            created_at: row.get("created_at"),
        }))
    }
}

pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL,
            public_key TEXT NOT NULL,
            secret_key TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
