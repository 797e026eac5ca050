//! Application state for the API server.

use std::sync::Arc;

use warden_storage::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Arc<Database>,
}

impl AppState {
    /// Creates a new application state with the given database.
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }
}
