#![allow(dead_code)]

use persona_core::db::release_connection;
use persona_core::{ConnectionProvider, DbConfig, DbResult, SqliteConnectionProvider};
use rusqlite::Connection;
use std::cell::Cell;
use tempfile::TempDir;

/// File-backed provider that counts acquisitions and releases.
pub struct SpyProvider {
    inner: SqliteConnectionProvider,
    pub acquired: Cell<usize>,
    pub released: Cell<usize>,
    _dir: TempDir,
}

impl SpyProvider {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("persona.sqlite3"));
        Self {
            inner: SqliteConnectionProvider::new(config),
            acquired: Cell::new(0),
            released: Cell::new(0),
            _dir: dir,
        }
    }

    pub fn config(&self) -> &DbConfig {
        self.inner.config()
    }

    pub fn open_unchecked(&self) -> Connection {
        self.inner.acquire().unwrap()
    }
}

impl ConnectionProvider for SpyProvider {
    fn acquire(&self) -> DbResult<Connection> {
        self.acquired.set(self.acquired.get() + 1);
        self.inner.acquire()
    }

    fn release(&self, slot: &mut Option<Connection>) {
        if slot.is_some() {
            self.released.set(self.released.get() + 1);
        }
        release_connection(slot);
    }
}
