//! The SQLite database that backs the command line. It implements both `Store`, holding every
//! user's documents, and `Identity`, holding the accounts.

mod accounts;
mod documents;
mod migrations;

use crate::error::Res;
use anyhow::{bail, ensure, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub(crate) use migrations::CURRENT_VERSION;

#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Creates a new database file at `path` and brings its schema to the current version. Fails if
    /// a file already exists there.
    pub(crate) async fn init(path: &Path) -> Res<Self> {
        if path.exists() {
            bail!("A database already exists at {}", path.display());
        }
        debug!("Creating database at {}", path.display());
        let pool = connect(path, true).await?;
        bootstrap_schema_version(&pool).await?;
        migrations::run(&pool, 0, CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    /// Opens the existing database at `path`, upgrading its schema if it is behind.
    pub(crate) async fn load(path: &Path) -> Res<Self> {
        ensure!(
            path.is_file(),
            "No database found at {}, has 'spendly init' been run?",
            path.display()
        );
        let pool = connect(path, false).await?;
        let version = read_schema_version(&pool).await?;
        ensure!(
            version <= CURRENT_VERSION,
            "The database schema is at version {version}, which is newer than this version of \
            spendly supports ({CURRENT_VERSION})"
        );
        migrations::run(&pool, version, CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    pub(crate) async fn schema_version(&self) -> Res<i32> {
        read_schema_version(&self.pool).await
    }
}

pub(crate) async fn connect(path: &Path, create: bool) -> Res<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .context("Failed to parse SQLite connection string")?
        .create_if_missing(create);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open the SQLite database at {}", path.display()))
}

/// Creates the `schema_version` table of a brand new database, at version 0.
pub(crate) async fn bootstrap_schema_version(pool: &SqlitePool) -> Res<()> {
    sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
        .execute(pool)
        .await
        .context("Failed to create schema_version table")?;

    sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
        .execute(pool)
        .await
        .context("Failed to insert initial schema version")?;
    Ok(())
}

pub(crate) async fn read_schema_version(pool: &SqlitePool) -> Res<i32> {
    let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Unable to read the schema version")?;
    Ok(row.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spendly.sqlite");
        let db = Db::init(&path).await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), CURRENT_VERSION);
        drop(db);
        let db = Db::load(&path).await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_init_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spendly.sqlite");
        Db::init(&path).await.unwrap();
        assert!(Db::init(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_load_requires_file() {
        let dir = TempDir::new().unwrap();
        let err = Db::load(&dir.path().join("missing.sqlite")).await.unwrap_err();
        assert!(err.to_string().contains("spendly init"));
    }

    #[tokio::test]
    async fn test_load_migrates_old_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spendly.sqlite");
        let pool = connect(&path, true).await.unwrap();
        bootstrap_schema_version(&pool).await.unwrap();
        pool.close().await;
        let db = Db::load(&path).await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_load_refuses_newer_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spendly.sqlite");
        let db = Db::init(&path).await.unwrap();
        sqlx::query("UPDATE schema_version SET version = ?")
            .bind(CURRENT_VERSION + 1)
            .execute(&db.pool)
            .await
            .unwrap();
        db.pool.close().await;
        assert!(Db::load(&path).await.is_err());
    }
}
