use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConnectParams;
use crate::error::SqlGateError;

use super::connection::SqliteConnection;

/// Target that selects a non-persistent in-memory database.
pub const IN_MEMORY_TARGET: &str = ":memory:";

/// Suffix appended to every on-disk target.
pub const FILE_SUFFIX: &str = ".db";

/// Options for opening an embedded `SQLite` connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteOptions {
    /// Longest time a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Journal mode applied right after opening; `None` leaves the engine default.
    pub journal_mode: Option<String>,
    /// Capacity of rusqlite's own prepared-statement cache. Grows with the connection's cache.
    pub native_cache_capacity: usize,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(1000),
            journal_mode: Some("WAL".to_string()),
            native_cache_capacity: 64,
        }
    }
}

impl SqliteOptions {
    #[must_use]
    pub fn builder() -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::default()
    }

    /// Filesystem path (or the in-memory sentinel) opened for `target`.
    #[must_use]
    pub fn resolve_path(target: &str) -> String {
        if target == IN_MEMORY_TARGET {
            target.to_string()
        } else {
            format!("{target}{FILE_SUFFIX}")
        }
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone, Default)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn journal_mode(mut self, mode: Option<&str>) -> Self {
        self.opts.journal_mode = mode.map(str::to_string);
        self
    }

    #[must_use]
    pub fn native_cache_capacity(mut self, capacity: usize) -> Self {
        self.opts.native_cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Open a connection with these options.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` if the database cannot be opened or configured.
    pub fn connect(self, params: &ConnectParams) -> Result<SqliteConnection, SqlGateError> {
        SqliteConnection::connect_with(params, &self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_connect_behavior() {
        let opts = SqliteOptions::default();
        assert_eq!(opts.busy_timeout, Duration::from_millis(1000));
        assert_eq!(opts.journal_mode.as_deref(), Some("WAL"));
    }

    #[test]
    fn targets_get_file_suffix_except_memory() {
        assert_eq!(SqliteOptions::resolve_path("inventory"), "inventory.db");
        assert_eq!(SqliteOptions::resolve_path("/tmp/x"), "/tmp/x.db");
        assert_eq!(SqliteOptions::resolve_path(":memory:"), ":memory:");
    }

    #[test]
    fn builder_overrides() {
        let opts = SqliteOptions::builder()
            .busy_timeout(Duration::from_millis(50))
            .journal_mode(None)
            .native_cache_capacity(8)
            .finish();
        assert_eq!(opts.busy_timeout, Duration::from_millis(50));
        assert!(opts.journal_mode.is_none());
        assert_eq!(opts.native_cache_capacity, 8);
    }
}
