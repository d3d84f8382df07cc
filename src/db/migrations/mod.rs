//! Versioned schema changes for the spendly database.
//!
//! Each version has a pair of SQL files in this directory: `migration_NN_up.sql` takes the schema
//! from `NN-1` to `NN` and `migration_NN_down.sql` reverses it. The current version is recorded in
//! the single-row `schema_version` table.

use anyhow::Context;
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use crate::error::Res;

/// The schema version this build of spendly expects.
pub(crate) const CURRENT_VERSION: i32 = 1;

struct Migration {
    /// Applying `up_sql` brings the schema to this version, `down_sql` takes it back to the one
    /// before.
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Direction {
    Up,
    Down,
}

/// Moves the schema from `from` to `to`, one version at a time, in either direction. Every step
/// commits together with its `schema_version` update, and no step runs unless all of the required
/// migrations are available.
pub(crate) async fn run(pool: &SqlitePool, from: i32, to: i32) -> Res<()> {
    if from == to {
        debug!("Schema is at version {to}, nothing to migrate");
        return Ok(());
    }
    let steps = plan(from, to)?;
    for (direction, migration) in steps {
        let (sql, resulting_version) = match direction {
            Direction::Up => (migration.up_sql, migration.version),
            Direction::Down => (migration.down_sql, migration.version - 1),
        };
        debug!(
            "Applying migration {:02} ({direction:?})",
            migration.version
        );
        apply(pool, sql, resulting_version)
            .await
            .with_context(|| format!("Migration {:02} failed", migration.version))?;
    }
    debug!("Schema migrated from version {from} to {to}");
    Ok(())
}

/// The ordered list of migrations to apply. Fails if any version in the range has no migration.
fn plan(from: i32, to: i32) -> Res<Vec<(Direction, &'static Migration)>> {
    let (direction, versions): (Direction, Vec<i32>) = if from < to {
        (Direction::Up, ((from + 1)..=to).collect())
    } else {
        (Direction::Down, ((to + 1)..=from).rev().collect())
    };
    versions
        .into_iter()
        .map(|version| {
            let migration = MIGRATIONS
                .iter()
                .find(|m| m.version == version)
                .with_context(|| {
                    format!(
                        "Migration {version} is missing but required to migrate from version \
                        {from} to {to}"
                    )
                })?;
            Ok((direction, migration))
        })
        .collect()
}

async fn apply(pool: &SqlitePool, sql: &str, resulting_version: i32) -> Res<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Unable to begin the migration transaction")?;

    // Migration files hold several statements
    tx.execute(sql)
        .await
        .context("Unable to execute the migration SQL")?;

    sqlx::query("UPDATE schema_version SET version = ?")
        .bind(resulting_version)
        .execute(&mut *tx)
        .await
        .context("Unable to record the new schema version")?;

    tx.commit()
        .await
        .context("Unable to commit the migration transaction")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use tempfile::TempDir;

    /// An empty database with `schema_version` at 0.
    async fn create_test_db() -> Res<(TempDir, SqlitePool)> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let pool = crate::db::connect(&temp_dir.path().join("test.sqlite"), true).await?;
        crate::db::bootstrap_schema_version(&pool).await?;
        Ok((temp_dir, pool))
    }

    async fn table_exists(pool: &SqlitePool, table_name: &str) -> bool {
        let row: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table_name)
                .fetch_one(pool)
                .await
                .unwrap();
        row.0 > 0
    }

    #[tokio::test]
    async fn test_up_then_down() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        assert_eq!(crate::db::read_schema_version(&pool).await.unwrap(), 0);

        run(&pool, 0, CURRENT_VERSION).await.unwrap();
        assert_eq!(
            crate::db::read_schema_version(&pool).await.unwrap(),
            CURRENT_VERSION
        );
        assert!(table_exists(&pool, "documents").await);
        assert!(table_exists(&pool, "accounts").await);

        run(&pool, CURRENT_VERSION, 0).await.unwrap();
        assert_eq!(crate::db::read_schema_version(&pool).await.unwrap(), 0);
        assert!(!table_exists(&pool, "documents").await);
        assert!(!table_exists(&pool, "accounts").await);
    }

    #[tokio::test]
    async fn test_same_version_is_a_no_op() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        run(&pool, 0, 1).await.unwrap();
        run(&pool, 1, 1).await.unwrap();
        assert_eq!(crate::db::read_schema_version(&pool).await.unwrap(), 1);
    }

    #[test]
    fn test_plan() {
        let up = plan(0, 1).unwrap();
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].0, Direction::Up);
        let down = plan(1, 0).unwrap();
        assert_eq!(down[0].0, Direction::Down);
        assert!(plan(0, CURRENT_VERSION + 1).is_err());
        assert!(plan(CURRENT_VERSION + 2, CURRENT_VERSION).is_err());
    }
}
