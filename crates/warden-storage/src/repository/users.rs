//! Users repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use warden_core::{AccountStatus, UserRole};

use super::{format_timestamp, parse_datetime, parse_enum};
use crate::error::Result;
use crate::models::{NewUser, User};

/// Repository for user operations.
pub struct UsersRepo;

impl UsersRepo {
    /// Insert a new active user.
    pub fn insert(conn: &Connection, user: &NewUser) -> Result<i64> {
        conn.execute(
            "INSERT INTO users (name, email, role, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.name,
                user.email,
                user.role.as_str(),
                AccountStatus::Active.as_str()
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a user by ID.
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
        let user = conn
            .query_row(
                "SELECT id, name, email, role, status, status_updated_at FROM users WHERE id = ?1",
                [id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        role: parse_enum(3, row.get(3)?, UserRole::parse)?,
                        status: parse_enum(4, row.get(4)?, AccountStatus::parse)?,
                        status_updated_at: row
                            .get::<_, Option<String>>(5)?
                            .map(|s| parse_datetime(5, s))
                            .transpose()?,
                    })
                },
            )
            .optional()?;

        Ok(user)
    }

    /// Set a user's account status. Returns false if the user does not exist.
    pub fn set_status(
        conn: &Connection,
        id: i64,
        status: AccountStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let updated = conn.execute(
            "UPDATE users SET status = ?1, status_updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), format_timestamp(at), id],
        )?;
        Ok(updated > 0)
    }
}
