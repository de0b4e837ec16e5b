//! # Cuaderno DB
//!
//! SQLite connection pool and schema migrations for the Cuaderno API.
//!
//! Every connection opened by the pool enforces foreign keys, uses WAL
//! journaling and waits on locks instead of failing immediately.
//!
//! # Example
//!
//! ```ignore
//! use cuaderno_db::{DatabaseConfig, init_db_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sqlx::Error> {
//!     let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
//!     run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub use sqlx::SqlitePool;

/// Schema migrations embedded from the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub const DEFAULT_DATABASE_URL: &str = "sqlite://storage/cuaderno.db?mode=rwc";

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

/// Opens the SQLite pool described by `config`.
///
/// The parent directory of a file-backed database is created when missing.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(config.busy_timeout);

    let filename = options.get_filename().to_path_buf();
    if let Some(parent) = filename.parent()
        && !parent.as_os_str().is_empty()
        && !is_memory(&config.url)
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .connect_with(options)
        .await?;

    tracing::info!(
        database = %filename.display(),
        max_connections = config.max_connections,
        "Database pool initialized"
    );

    Ok(pool)
}

/// Applies pending migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

fn is_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_memory() {
        assert!(is_memory("sqlite::memory:"));
        assert!(is_memory("sqlite://cuaderno?mode=memory"));
        assert!(!is_memory(DEFAULT_DATABASE_URL));
    }

    #[tokio::test]
    async fn test_in_memory_pool_runs_migrations() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            busy_timeout: Duration::from_millis(100),
        };

        let pool = init_db_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'subjects', 'notifications')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 3);

        let fk: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(fk, 1);
    }
}
