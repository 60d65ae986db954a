//! Connection acquisition and release.
//!
//! # Responsibility
//! - Produce live, migrated connections from `DbConfig`.
//! - Release owned connections exactly once, on every exit path.
//!
//! # Invariants
//! - `release_connection` never fails and is a no-op on an empty slot.
//! - A `ScopedConnection` hands its connection back to the provider that
//!   produced it when dropped.

use super::config::DbConfig;
use super::open::open_db;
use super::DbResult;
use log::{debug, warn};
use rusqlite::Connection;
use std::mem::ManuallyDrop;

/// Source of database connections.
///
/// Implementations decide where connections come from; callers that
/// acquire a connection also own its release.
pub trait ConnectionProvider {
    /// Returns a live connection in auto-commit mode.
    fn acquire(&self) -> DbResult<Connection>;

    /// Releases the connection held in `slot`, leaving `None` behind.
    ///
    /// Must be safe to call on an empty slot and must not fail.
    fn release(&self, slot: &mut Option<Connection>) {
        release_connection(slot);
    }
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for &P {
    fn acquire(&self) -> DbResult<Connection> {
        (**self).acquire()
    }

    fn release(&self, slot: &mut Option<Connection>) {
        (**self).release(slot);
    }
}

/// Provider that opens a fresh SQLite connection per acquisition.
#[derive(Debug, Clone)]
pub struct SqliteConnectionProvider {
    config: DbConfig,
}

impl SqliteConnectionProvider {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    fn acquire(&self) -> DbResult<Connection> {
        open_db(&self.config)
    }
}

/// Closes the connection held in `slot`, if any.
///
/// Close failures are logged and swallowed: the handle is dropped either
/// way, and SQLite finalizes it on drop.
pub fn release_connection(slot: &mut Option<Connection>) {
    let Some(conn) = slot.take() else {
        return;
    };

    match conn.close() {
        Ok(()) => debug!("event=db_release module=db status=ok"),
        Err((conn, err)) => {
            warn!("event=db_release module=db status=error error_code=db_close_failed error={err}");
            drop(conn);
        }
    }
}

/// Owned connection that is released through its provider when dropped.
pub struct ScopedConnection<'p, P: ConnectionProvider + ?Sized> {
    provider: &'p P,
    conn: ManuallyDrop<Connection>,
}

impl<'p, P: ConnectionProvider + ?Sized> ScopedConnection<'p, P> {
    /// Acquires a connection from `provider` for the lifetime of the guard.
    pub fn acquire(provider: &'p P) -> DbResult<Self> {
        let conn = provider.acquire()?;
        Ok(Self {
            provider,
            conn: ManuallyDrop::new(conn),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl<P: ConnectionProvider + ?Sized> Drop for ScopedConnection<'_, P> {
    fn drop(&mut self) {
        // SAFETY: `conn` is taken exactly once, here, and never touched again.
        let conn = unsafe { ManuallyDrop::take(&mut self.conn) };
        self.provider.release(&mut Some(conn));
    }
}

#[cfg(test)]
mod tests {
    use super::{release_connection, ConnectionProvider, ScopedConnection};
    use crate::db::{open_db_in_memory, DbResult};
    use rusqlite::Connection;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingProvider {
        acquired: Cell<usize>,
        released: Cell<usize>,
    }

    impl ConnectionProvider for CountingProvider {
        fn acquire(&self) -> DbResult<Connection> {
            self.acquired.set(self.acquired.get() + 1);
            open_db_in_memory()
        }

        fn release(&self, slot: &mut Option<Connection>) {
            if slot.is_some() {
                self.released.set(self.released.get() + 1);
            }
            release_connection(slot);
        }
    }

    #[test]
    fn release_is_idempotent_and_accepts_empty_slot() {
        let mut slot = Some(open_db_in_memory().unwrap());
        release_connection(&mut slot);
        assert!(slot.is_none());
        release_connection(&mut slot);

        let mut empty: Option<Connection> = None;
        release_connection(&mut empty);
        assert!(empty.is_none());
    }

    #[test]
    fn scoped_connection_releases_on_drop() {
        let provider = CountingProvider::default();
        {
            let scoped = ScopedConnection::acquire(&provider).unwrap();
            let one: i64 = scoped
                .connection()
                .query_row("SELECT 1;", [], |row| row.get(0))
                .unwrap();
            assert_eq!(one, 1);
            assert_eq!(provider.released.get(), 0);
        }
        assert_eq!(provider.acquired.get(), 1);
        assert_eq!(provider.released.get(), 1);
    }

    #[test]
    fn scoped_connection_releases_on_early_return() {
        fn failing_work(provider: &CountingProvider) -> Result<(), String> {
            let scoped = ScopedConnection::acquire(provider).map_err(|err| err.to_string())?;
            scoped
                .connection()
                .execute_batch("SELECT * FROM missing_table;")
                .map_err(|err| err.to_string())?;
            Ok(())
        }

        let provider = CountingProvider::default();
        assert!(failing_work(&provider).is_err());
        assert_eq!(provider.released.get(), 1);
    }
}
