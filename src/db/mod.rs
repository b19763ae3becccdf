//! Database layer for SQLite storage.
//!
//! This module handles all database operations including:
//! - Connection pool management with WAL mode
//! - Schema migrations
//! - Store operations for teams, users and pull requests
//! - Atomic units of work (`transaction::run_atomic`)
//!
//! Store operations take an explicit `&mut SqliteConnection`. Passing a
//! pooled connection runs the operation on its own; passing the connection
//! of an open transaction makes it part of that unit.

pub mod pool;
pub mod pull_requests;
pub mod teams;
pub mod transaction;
pub mod users;

use crate::error::AppError;
use std::path::Path;
use thiserror::Error;

/// Database-related errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Embedded migrations, applied in order and recorded by name.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_initial_schema",
    include_str!("migrations/0001_initial_schema.sql"),
)];

/// Initialize the database with default pool settings.
pub async fn initialize(db_path: &Path) -> Result<pool::DbPool, DbError> {
    initialize_with(db_path, &pool::PoolSettings::default()).await
}

/// Initialize the database: create the file if needed and run migrations.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
/// * `settings` - Pool sizing
///
/// # Returns
/// A connection pool configured with WAL mode
pub async fn initialize_with(
    db_path: &Path,
    settings: &pool::PoolSettings,
) -> Result<pool::DbPool, DbError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::Migration(format!("Failed to create database directory: {}", e))
            })?;
        }
    }

    let pool = pool::create_pool(db_path, settings).await?;

    run_migrations(&pool).await?;

    log::info!("Database ready at {}", db_path.display());
    Ok(pool)
}

/// Run all pending database migrations.
async fn run_migrations(pool: &pool::DbPool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    for (name, migration_sql) in MIGRATIONS {
        let applied: Option<(i64,)> = sqlx::query_as("SELECT id FROM _migrations WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        if applied.is_some() {
            continue;
        }

        log::info!("Applying migration {}", name);

        let mut tx = sqlx::Connection::begin(&mut *conn).await?;
        for statement in split_statements(migration_sql) {
            sqlx::query(&statement).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}

/// Split a migration script into statements.
///
/// `--` comments run to the end of the line. Semicolons and dashes inside
/// single-quoted literals are kept as text.
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_literal = false;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                // A doubled quote toggles twice and stays inside the literal.
                in_literal = !in_literal;
                current.push(ch);
            }
            '-' if !in_literal && chars.peek() == Some(&'-') => {
                while chars.next_if(|c| *c != '\n').is_some() {}
            }
            ';' if !in_literal => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let statement = raw.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
}

/// Kind of schema constraint a failed statement tripped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Unique,
    ForeignKey,
    Check,
}

/// Classify a store error as a constraint violation, if it is one.
pub fn violated_constraint(err: &sqlx::Error) -> Option<Constraint> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };

    if db_err.is_unique_violation() {
        Some(Constraint::Unique)
    } else if db_err.is_foreign_key_violation() {
        Some(Constraint::ForeignKey)
    } else if db_err.is_check_violation() {
        Some(Constraint::Check)
    } else {
        None
    }
}

/// Wrap an unclassified store failure, logging it with the operation name.
pub(crate) fn store_error(err: sqlx::Error, operation: &str) -> AppError {
    log::error!("Store operation '{}' failed: {}", operation, err);
    AppError::database_with_op(err.to_string(), operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_initialize_creates_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let pool = initialize(&db_path).await.unwrap();

        assert!(db_path.exists());

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_migrations' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(
            table_names,
            vec!["pr_reviewers", "pull_requests", "teams", "users"]
        );
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let _pool1 = initialize(&db_path).await.unwrap();
        let pool2 = initialize(&db_path).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(&pool2)
            .await
            .unwrap();
        assert_eq!(count.0, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_violated_constraint_classification() {
        let dir = tempdir().unwrap();
        let pool = initialize(&dir.path().join("test.db")).await.unwrap();

        sqlx::query("INSERT INTO teams (name) VALUES ('core')")
            .execute(&pool)
            .await
            .unwrap();

        let dup = sqlx::query("INSERT INTO teams (name) VALUES ('core')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert_eq!(violated_constraint(&dup), Some(Constraint::Unique));

        let orphan = sqlx::query(
            "INSERT INTO users (id, username, team_name, is_active) VALUES ('u1', 'A', 'ghost', 1)",
        )
        .execute(&pool)
        .await
        .unwrap_err();
        assert_eq!(violated_constraint(&orphan), Some(Constraint::ForeignKey));

        let empty_username = sqlx::query(
            "INSERT INTO users (id, username, team_name, is_active) VALUES ('u2', '', 'core', 1)",
        )
        .execute(&pool)
        .await
        .unwrap_err();
        assert_eq!(violated_constraint(&empty_username), Some(Constraint::Check));

        assert_eq!(violated_constraint(&sqlx::Error::RowNotFound), None);
    }

    #[test]
    fn test_split_statements() {
        let sql = r#"
            -- leading comment
            CREATE TABLE a (x TEXT DEFAULT 'a;b--c', y INTEGER CHECK (y <> 0));
            CREATE INDEX i ON a (x); -- trailing comment
            CREATE TABLE b (y TEXT DEFAULT 'it''s')
        "#;
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("CREATE TABLE a"));
        assert!(statements[0].contains("'a;b--c'"));
        assert_eq!(statements[1], "CREATE INDEX i ON a (x)");
        assert_eq!(statements[2], "CREATE TABLE b (y TEXT DEFAULT 'it''s')");
    }
}
