//! Database layer for Hearth.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization
//! and embedded SQL migrations. Every table the room-event core touches
//! (`room_events`, `room_memberships`, `output_stream`) is created through
//! versioned migrations managed by this crate.
//!
//! The crate never opens transactions on behalf of callers. Components that
//! need atomicity take a `rusqlite::Transaction` from their caller.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, open_database, DbError, DbPool, DbRuntimeSettings, PoolError};
