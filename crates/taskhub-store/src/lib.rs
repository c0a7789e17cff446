// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, ErrorCode as SqliteErrorCode, Transaction, TransactionBehavior};
use taskhub_model::ValidationError;

mod blob;
mod files;
mod groups;
mod notifications;
mod progress;
mod schema;
mod streaks;
mod tasks;
mod users;

pub use blob::{BlobStore, LocalFsBlobStore, MemoryBlobStore};
pub use groups::GroupMember;
pub use schema::SQLITE_SCHEMA_VERSION;
pub use tasks::TaskStatusCounts;

pub const CRATE_NAME: &str = "taskhub-store";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    NotFound,
    Conflict,
    Io,
    Corrupt,
    Internal,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Io => "io_error",
            Self::Corrupt => "corrupt_row",
            Self::Internal => "internal_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => Self::new(StoreErrorCode::NotFound, "row not found"),
            rusqlite::Error::SqliteFailure(e, _) if e.code == SqliteErrorCode::ConstraintViolation => {
                Self::new(StoreErrorCode::Conflict, err.to_string())
            }
            rusqlite::Error::FromSqlConversionFailure(..) => {
                Self::new(StoreErrorCode::Corrupt, err.to_string())
            }
            _ => Self::new(StoreErrorCode::Internal, err.to_string()),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::new(StoreErrorCode::NotFound, err.to_string())
        } else {
            Self::new(StoreErrorCode::Io, err.to_string())
        }
    }
}

impl From<StoreError> for taskhub_core::Error {
    fn from(err: StoreError) -> Self {
        match err.code {
            StoreErrorCode::NotFound => Self::not_found(err.message),
            StoreErrorCode::Conflict => Self::conflict(err.message),
            _ => Self::internal(err.to_string()),
        }
    }
}

/// SQLite backed persistence. One connection, serialized behind a mutex;
/// every unit of work runs inside a single transaction.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;
        schema::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` in an immediate (write-locking) transaction. Any error
    /// rolls back every write made by `f`.
    pub fn write<T, E>(&self, f: impl FnOnce(&StoreTx<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        self.run(TransactionBehavior::Immediate, f, true)
    }

    /// Runs `f` in a deferred transaction that is never committed.
    pub fn read<T, E>(&self, f: impl FnOnce(&StoreTx<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        self.run(TransactionBehavior::Deferred, f, false)
    }

    fn run<T, E>(
        &self,
        behavior: TransactionBehavior,
        f: impl FnOnce(&StoreTx<'_>) -> Result<T, E>,
        commit: bool,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::new(StoreErrorCode::Internal, "store connection poisoned"))?;
        let tx = conn
            .transaction_with_behavior(behavior)
            .map_err(StoreError::from)?;
        let stx = StoreTx { tx };
        let out = f(&stx)?;
        if commit {
            stx.tx.commit().map_err(StoreError::from)?;
        }
        Ok(out)
    }
}

/// Typed access to the tables inside one transaction.
pub struct StoreTx<'c> {
    tx: Transaction<'c>,
}

impl StoreTx<'_> {
    fn conn(&self) -> &Connection {
        &self.tx
    }
}

pub(crate) fn invalid_column(idx: usize, err: ValidationError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

pub(crate) fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub(crate) fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_write_rolls_back() {
        let store = SqliteStore::open_in_memory().expect("open");
        let res: Result<(), StoreError> = store.write(|tx| {
            tx.conn()
                .execute("CREATE TABLE scratch(x INTEGER)", [])
                .map_err(StoreError::from)?;
            Err(StoreError::new(StoreErrorCode::Internal, "boom"))
        });
        assert!(res.is_err());
        let exists: i64 = store
            .read(|tx| {
                tx.conn()
                    .query_row(
                        "SELECT COUNT(*) FROM sqlite_master WHERE name='scratch'",
                        [],
                        |r| r.get(0),
                    )
                    .map_err(StoreError::from)
            })
            .expect("query");
        assert_eq!(exists, 0);
    }

    #[test]
    fn store_errors_map_to_domain_codes() {
        let conflict: taskhub_core::Error =
            StoreError::new(StoreErrorCode::Conflict, "dup").into();
        assert!(conflict.is(taskhub_core::ErrorCode::Conflict));
        let io: taskhub_core::Error = StoreError::new(StoreErrorCode::Io, "disk").into();
        assert!(io.is(taskhub_core::ErrorCode::Internal));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" a%b_ "), "%a\\%b\\_%");
    }
}
