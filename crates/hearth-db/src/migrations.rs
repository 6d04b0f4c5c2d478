//! Embedded schema migrations.
//!
//! Each migration is a SQL file compiled into the binary and named after its
//! file. Applied names are recorded in `_hearth_migrations`; on startup only
//! the missing ones run, in list order.

use rusqlite::Connection;
use std::collections::HashSet;
use thiserror::Error;

/// `(name, sql)` pairs in apply order. Append only.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "000_room_events",
        include_str!("migrations/000_room_events.sql"),
    ),
    (
        "001_room_memberships",
        include_str!("migrations/001_room_memberships.sql"),
    ),
    (
        "002_output_stream",
        include_str!("migrations/002_output_stream.sql"),
    ),
];

const TRACKING_TABLE: &str = "CREATE TABLE IF NOT EXISTS _hearth_migrations (
    name TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
)";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to create migration tracking table: {0}")]
    Bootstrap(#[source] rusqlite::Error),

    #[error("failed to read applied migrations: {0}")]
    StateQuery(#[source] rusqlite::Error),

    /// The named migration failed; its statements were rolled back.
    #[error("migration '{name}' failed: {source}")]
    Failed {
        name: &'static str,
        source: rusqlite::Error,
    },
}

/// Applies every pending migration. Returns how many ran.
///
/// # Errors
///
/// Stops at the first failing migration. Migrations before it stay applied.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    apply_pending(conn, MIGRATIONS)
}

fn apply_pending(
    conn: &Connection,
    migrations: &[(&'static str, &'static str)],
) -> Result<usize, MigrationError> {
    conn.execute_batch(TRACKING_TABLE)
        .map_err(MigrationError::Bootstrap)?;

    let applied = applied_names(conn)?;
    let mut count = 0;
    for &(name, sql) in migrations {
        if applied.contains(name) {
            continue;
        }
        apply_one(conn, name, sql).map_err(|source| MigrationError::Failed { name, source })?;
        tracing::info!(migration = name, "applied migration");
        count += 1;
    }
    Ok(count)
}

fn applied_names(conn: &Connection) -> Result<HashSet<String>, MigrationError> {
    let mut stmt = conn
        .prepare("SELECT name FROM _hearth_migrations")
        .map_err(MigrationError::StateQuery)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .and_then(|rows| rows.collect::<rusqlite::Result<HashSet<_>>>())
        .map_err(MigrationError::StateQuery)?;
    Ok(names)
}

/// Runs `sql` and records `name` in one transaction.
fn apply_one(conn: &Connection, name: &str, sql: &str) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    tx.execute("INSERT INTO _hearth_migrations (name) VALUES (?1)", [name])?;
    tx.commit()
}
