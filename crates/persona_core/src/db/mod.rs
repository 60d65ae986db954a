//! SQLite storage bootstrap, configuration and connection ownership.
//!
//! # Responsibility
//! - Hold the only copy of storage configuration (`DbConfig`).
//! - Open and configure SQLite connections and apply schema migrations.
//! - Decide connection release through `ConnectionProvider`.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Releasing a connection never fails and is idempotent.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod config;
pub mod migrations;
mod open;
mod provider;

pub use config::{DbConfig, DEFAULT_BUSY_TIMEOUT};
pub use open::{open_db, open_db_in_memory};
pub use provider::{
    release_connection, ConnectionProvider, ScopedConnection, SqliteConnectionProvider,
};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Lock wait exceeded the configured busy timeout.
    Busy(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Returns whether this error is a lock-wait timeout.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Busy(err) => write!(f, "database busy, lock wait timed out: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Busy(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) => Self::Busy(value),
            _ => Self::Sqlite(value),
        }
    }
}
