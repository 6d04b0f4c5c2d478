//! The SQLite pool shared by the event store, membership index and output
//! stream.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::Duration;
use thiserror::Error;

use crate::migrations::{run_migrations, MigrationError};

/// Pooled connections to one Hearth database file.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a writer waits for the database lock, in milliseconds.
    /// Writers take the lock with `BEGIN IMMEDIATE`, so this bounds how long
    /// concurrent input batches queue behind each other.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to open database pool at {path}: {source}")]
    Build { path: String, source: r2d2::Error },
}

/// Errors from [`open_database`].
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("failed to get connection for migrations: {0}")]
    Connection(#[from] r2d2::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Builds a pool over `db_path` without touching the schema.
///
/// `:memory:` gives every pooled connection its own private database, so
/// anything that needs to share state across connections should use a file.
///
/// # Errors
///
/// Returns `PoolError::Build` if the first connection cannot be opened and
/// prepared.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(move |conn| prepare_connection(conn, settings));

    Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)
        .map_err(|source| PoolError::Build {
            path: db_path.to_string(),
            source,
        })
}

/// Per-connection setup: WAL journal, `NORMAL` sync, busy timeout.
fn prepare_connection(conn: &Connection, settings: DbRuntimeSettings) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    // In-memory databases report "memory".
    if mode != "wal" && mode != "memory" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("journal_mode stayed {mode}, expected wal")),
        ));
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))
}

/// Builds the pool and brings the schema up to date.
///
/// # Errors
///
/// Returns `DbError` if the pool cannot be built or a migration fails.
pub fn open_database(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, DbError> {
    let pool = create_pool(db_path, settings)?;
    let applied = run_migrations(&*pool.get()?)?;
    if applied > 0 {
        tracing::info!(count = applied, path = db_path, "applied database migrations");
    }
    Ok(pool)
}
