//! Shared SQLite connection.
//!
//! One connection sits behind a mutex. A [`PooledConnection`] holds the lock
//! for a whole moderation operation, and [`PooledConnection::transaction`]
//! groups the writes of a multi-record step so readers never see it
//! half-applied.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;
use tracing::warn;

use crate::error::{Result, StorageError};
use crate::schema::run_migrations;

/// How long a statement waits on a lock held by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings applied before migrations.
const PRAGMAS: &str = "
    PRAGMA foreign_keys = ON;
    PRAGMA synchronous = NORMAL;
    PRAGMA cache_size = -2000;
";

/// Thread-safe handle to the moderation database.
#[derive(Clone)]
pub struct ConnectionPool {
    conn: Arc<Mutex<Connection>>,
}

impl ConnectionPool {
    /// Open (or create) a file-based database and bring its schema up to date.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL lets the CLI read while a server holds the file
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Self::from_connection(conn)
    }

    /// Create a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(PRAGMAS)?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the connection for one operation.
    ///
    /// A panic in an earlier operation does not disable the pool: any
    /// transaction it left open was rolled back when its guard dropped.
    pub fn get(&self) -> Result<PooledConnection<'_>> {
        let guard = self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("Connection lock was poisoned by a panicked operation; recovering");
            poisoned.into_inner()
        });

        Ok(PooledConnection { guard })
    }
}

/// The locked connection.
pub struct PooledConnection<'a> {
    guard: MutexGuard<'a, Connection>,
}

impl PooledConnection<'_> {
    /// Runs `f` in a transaction, committing only if it returns `Ok`.
    ///
    /// Database failures inside `f`, and a failed commit, surface as
    /// [`StorageError::Transaction`]; domain errors pass through unchanged.
    /// Either way nothing `f` wrote is kept.
    pub fn transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let tx = self
            .guard
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(e.to_string()))?;

        let value = f(&tx).map_err(StorageError::into_transaction_failure)?;

        tx.commit()
            .map_err(|e| StorageError::Transaction(e.to_string()))?;

        Ok(value)
    }
}

impl std::ops::Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}
