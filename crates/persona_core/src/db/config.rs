//! Storage configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lock wait applied to every connection unless configured otherwise.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location and tuning of the person database.
///
/// This is the only place storage settings live; providers read it and
/// repositories never see it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbConfig {
    /// SQLite database file. Created on first open.
    pub path: PathBuf,
    /// Upper bound on how long a statement waits for a lock.
    #[serde(default = "default_busy_timeout", with = "millis")]
    pub busy_timeout: Duration,
}

impl DbConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

fn default_busy_timeout() -> Duration {
    DEFAULT_BUSY_TIMEOUT
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
