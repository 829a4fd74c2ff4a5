//! Slot storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide a raw read/write API over named slots.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - A write replaces the slot value atomically and stamps `updated_at`.
//! - Connections are validated (schema version, required table) before use.

use crate::db::{DbError, SCHEMA_VERSION};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error for slot persistence operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Connection schema is not at the expected bootstrapped version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing from the connection.
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection not bootstrapped: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Raw key-value contract over the durable medium.
///
/// Implementations move opaque payloads only; (de)serialization and default
/// substitution live in [`crate::store::TaskSlot`].
pub trait SlotStore {
    /// Reads the payload stored under `key`, `None` when the slot is absent.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;
    /// Replaces the payload stored under `key`.
    fn write(&self, key: &str, payload: &str) -> StoreResult<()>;
}

/// SQLite-backed slot store over the `slots` key-value table.
pub struct SqliteSlotStore {
    conn: Connection,
}

impl SqliteSlotStore {
    /// Wraps a bootstrapped connection after validating its schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `PRAGMA user_version` is not the
    ///   version this binary bootstraps.
    /// - `MissingRequiredTable` when the `slots` table is absent.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != SCHEMA_VERSION {
            return Err(StoreError::UninitializedConnection {
                expected_version: SCHEMA_VERSION,
                actual_version,
            });
        }

        let has_slots: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'slots';",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if has_slots.is_none() {
            return Err(StoreError::MissingRequiredTable("slots"));
        }

        Ok(Self { conn })
    }
}

impl SlotStore for SqliteSlotStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let payload = self
            .conn
            .query_row("SELECT value FROM slots WHERE key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(payload)
    }

    fn write(&self, key: &str, payload: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO slots (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, payload],
        )?;
        Ok(())
    }
}
