//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for teams, members, pull requests and
//! reviewer links.

mod reassign_tx;
mod repository;

pub use reassign_tx::*;
pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(sqlx::Error::Io)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            team_id INTEGER REFERENCES teams(id),
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pull_requests (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            author_id TEXT NOT NULL REFERENCES members(id),
            status TEXT NOT NULL DEFAULT 'OPEN' CHECK (status IN ('OPEN', 'MERGED')),
            created_at TEXT NOT NULL,
            merged_at TEXT,
            version INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Current reviewer links.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pr_reviewers (
            pr_id TEXT NOT NULL REFERENCES pull_requests(id),
            member_id TEXT NOT NULL REFERENCES members(id),
            assigned_at TEXT NOT NULL,
            PRIMARY KEY (pr_id, member_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Every reviewer ever linked to a pull request. Rows are never deleted.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pr_reviewer_history (
            pr_id TEXT NOT NULL REFERENCES pull_requests(id),
            member_id TEXT NOT NULL REFERENCES members(id),
            first_assigned_at TEXT NOT NULL,
            PRIMARY KEY (pr_id, member_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_members_team_id ON members(team_id);
        CREATE INDEX IF NOT EXISTS idx_members_name ON members(name);
        CREATE INDEX IF NOT EXISTS idx_pull_requests_author_id ON pull_requests(author_id);
        CREATE INDEX IF NOT EXISTS idx_pr_reviewers_member_id ON pr_reviewers(member_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
