//! Transaction orchestration over one owned connection.
//!
//! # Responsibility
//! - Group a caller-supplied sequence of repository calls into one
//!   all-or-nothing unit of work.
//! - Make exactly one commit-or-rollback decision per run.
//!
//! # Invariants
//! - Every repository call inside `work` receives the same connection.
//! - On failure nothing from the run is durably visible.
//! - A rollback failure is logged and attached, never substituted for the
//!   original cause.
//! - The connection is released after the decision, on every path.

use crate::db::{ConnectionProvider, DbError, ScopedConnection};
use crate::repo::person_repo::RepoError;
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type TxResult<T, E = RepoError> = Result<T, TxError<E>>;

/// Secondary failure raised while rolling back.
///
/// When present, the final state of the transaction is uncertain.
#[derive(Debug)]
pub struct RollbackError(DbError);

impl RollbackError {
    pub fn db_error(&self) -> &DbError {
        &self.0
    }
}

impl Display for RollbackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "rollback failed: {}", self.0)
    }
}

impl Error for RollbackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

/// Outcome of a transaction that did not commit.
#[derive(Debug)]
pub enum TxError<E = RepoError> {
    /// No connection could be acquired; nothing ran.
    Connect(DbError),
    /// The explicit transaction could not be started; nothing ran.
    Begin(DbError),
    /// The unit of work failed and the transaction was rolled back.
    Aborted {
        cause: E,
        rollback: Option<RollbackError>,
    },
    /// All work succeeded but COMMIT failed.
    Commit {
        source: DbError,
        rollback: Option<RollbackError>,
    },
}

impl<E> TxError<E> {
    /// Returns the unit-of-work failure, if that is what aborted the run.
    pub fn cause(&self) -> Option<&E> {
        match self {
            Self::Aborted { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn rollback_error(&self) -> Option<&RollbackError> {
        match self {
            Self::Aborted { rollback, .. } | Self::Commit { rollback, .. } => rollback.as_ref(),
            Self::Connect(_) | Self::Begin(_) => None,
        }
    }
}

impl<E: Display> Display for TxError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(err) => write!(f, "could not acquire connection: {err}"),
            Self::Begin(err) => write!(f, "could not begin transaction: {err}"),
            Self::Aborted { cause, rollback } => {
                write!(f, "transaction rolled back: {cause}")?;
                if let Some(rollback) = rollback {
                    write!(f, " ({rollback})")?;
                }
                Ok(())
            }
            Self::Commit { source, rollback } => {
                write!(f, "commit failed: {source}")?;
                if let Some(rollback) = rollback {
                    write!(f, " ({rollback})")?;
                }
                Ok(())
            }
        }
    }
}

impl<E: Error + 'static> Error for TxError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect(err) | Self::Begin(err) => Some(err),
            Self::Aborted { cause, .. } => Some(cause),
            Self::Commit { source, .. } => Some(source),
        }
    }
}

/// Runs units of work inside one explicit transaction each.
pub struct TransactionRunner<P> {
    provider: P,
}

impl<P: ConnectionProvider> TransactionRunner<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Runs `work` on a fresh connection inside one transaction.
    ///
    /// `work` must pass the connection it receives as the external connection
    /// of every repository call it makes. Returns the value of `work` after a
    /// successful commit; otherwise returns the failure after rollback.
    ///
    /// # Side effects
    /// - Emits `tx_begin`, `tx_commit` and `tx_rollback` logging events.
    pub fn run<T, E, F>(&self, work: F) -> TxResult<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: Display,
    {
        let started_at = Instant::now();
        let scoped = ScopedConnection::acquire(&self.provider).map_err(TxError::<E>::Connect)?;
        let conn = scoped.connection();

        // Raw statements rather than `rusqlite::Transaction`: a connection that
        // is already inside a transaction is joined, and a failed COMMIT or
        // ROLLBACK must be reported instead of dropped.
        let joined = !conn.is_autocommit();
        if !joined {
            conn.execute_batch("BEGIN DEFERRED;")
                .map_err(|err| TxError::<E>::Begin(err.into()))?;
        }
        info!("event=tx_begin module=tx status=ok joined={joined}");

        match work(conn) {
            Ok(value) => match conn.execute_batch("COMMIT;") {
                Ok(()) => {
                    info!(
                        "event=tx_commit module=tx status=ok duration_ms={}",
                        started_at.elapsed().as_millis()
                    );
                    Ok(value)
                }
                Err(err) => {
                    let source = DbError::from(err);
                    error!("event=tx_commit module=tx status=error error={source}");
                    let rollback = rollback_open_transaction(conn);
                    Err(TxError::Commit { source, rollback })
                }
            },
            Err(cause) => {
                warn!("event=tx_rollback module=tx status=start cause={cause}");
                let rollback = rollback_open_transaction(conn);
                Err(TxError::Aborted { cause, rollback })
            }
        }
    }
}

fn rollback_open_transaction(conn: &Connection) -> Option<RollbackError> {
    // SQLite rolls back on its own after some failures (e.g. SQLITE_FULL).
    if conn.is_autocommit() {
        info!("event=tx_rollback module=tx status=ok already_closed=true");
        return None;
    }

    match conn.execute_batch("ROLLBACK;") {
        Ok(()) => {
            info!("event=tx_rollback module=tx status=ok");
            None
        }
        Err(err) => {
            let err = RollbackError(err.into());
            error!("event=tx_rollback module=tx status=error state=uncertain error={err}");
            Some(err)
        }
    }
}
