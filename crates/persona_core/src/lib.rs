//! Core data access for the persona person registry.
//! This crate owns the transactional contract: connection ownership,
//! repository statements and commit/rollback decisions.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{
    open_db, open_db_in_memory, release_connection, ConnectionProvider, DbConfig, DbError,
    DbResult, ScopedConnection, SqliteConnectionProvider,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::person::{Person, PersonId, PersonValidationError};
pub use repo::person_repo::{PersonRepository, RepoError, RepoResult, SqlitePersonRepository};
pub use service::session::{
    execute_command, run_commands, CommandOutcome, MenuChoice, PersonCommand, MENU_TEXT,
};
pub use service::transaction::{RollbackError, TransactionRunner, TxError, TxResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
