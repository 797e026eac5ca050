//! Configuration repository.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::Config;

/// Repository for configuration operations.
pub struct ConfigRepo;

impl ConfigRepo {
    /// Get a configuration value.
    pub fn get(conn: &Connection, key: &str) -> Result<Option<Config>> {
        let value_str: Option<String> = conn
            .query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match value_str {
            Some(s) => Ok(Some(Config {
                key: key.to_string(),
                value: serde_json::from_str(&s)?,
            })),
            None => Ok(None),
        }
    }

    /// Set a configuration value (insert or update).
    pub fn set(conn: &Connection, key: &str, value: &serde_json::Value) -> Result<()> {
        let value_json = serde_json::to_string(value)?;

        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value_json],
        )?;

        Ok(())
    }

    /// Get a typed configuration value, falling back to `default` when the
    /// key is missing.
    ///
    /// A stored value that no longer deserializes is an error rather than a
    /// silent reset.
    pub fn get_or_default<T: serde::de::DeserializeOwned>(
        conn: &Connection,
        key: &str,
        default: T,
    ) -> Result<T> {
        match Self::get(conn, key)? {
            Some(config) => Ok(serde_json::from_value(config.value)?),
            None => Ok(default),
        }
    }
}
