use std::collections::HashSet;
use std::rc::Rc;

use rusqlite::Connection;
use tracing::{info, warn};

use crate::cache::StatementCache;
use crate::config::ConnectParams;
use crate::connection::{DatabaseConnection, parse_last_insert_id};
use crate::error::SqlGateError;
use crate::results::Row;
use crate::statement::PreparedStatement;
use crate::types::BackendTag;

use super::config::{IN_MEMORY_TARGET, SqliteOptions};
use super::prepared::SqliteStatement;

const LAST_INSERT_ID_SQL: &str = "select last_insert_rowid()";

/// Embedded `SQLite` connection.
pub struct SqliteConnection {
    // declared before `handle` so statements go first on drop
    cache: StatementCache<SqliteStatement>,
    handle: Option<Rc<Connection>>,
    path: String,
    native_capacity: usize,
    // texts prepared through `get_statement`; their plans share rusqlite's LRU
    standalone_sql: HashSet<String>,
}

impl SqliteConnection {
    /// Open `params.target` with default options.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` if the database cannot be opened or configured.
    pub fn connect(params: &ConnectParams) -> Result<Self, SqlGateError> {
        Self::connect_with(params, &SqliteOptions::default())
    }

    /// Open `params.target` with explicit options.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` if the database cannot be opened or configured.
    pub fn connect_with(params: &ConnectParams, opts: &SqliteOptions) -> Result<Self, SqlGateError> {
        let path = SqliteOptions::resolve_path(&params.target);
        let conn = if path == IN_MEMORY_TARGET {
            Connection::open_in_memory()
        } else {
            Connection::open(&path)
        }
        .map_err(|e| SqlGateError::ConnectionError(format!("Failed to open {path}: {e}")))?;

        conn.busy_timeout(opts.busy_timeout).map_err(|e| {
            SqlGateError::ConnectionError(format!("Failed to set busy timeout on {path}: {e}"))
        })?;
        if let Some(mode) = &opts.journal_mode {
            conn.execute_batch(&format!("PRAGMA journal_mode = {mode};"))
                .map_err(|e| {
                    SqlGateError::ConnectionError(format!(
                        "Failed to set journal mode {mode} on {path}: {e}"
                    ))
                })?;
        }
        conn.set_prepared_statement_cache_capacity(opts.native_cache_capacity);

        info!(path = %path, "opened sqlite connection");
        Ok(Self {
            cache: StatementCache::new(),
            handle: Some(Rc::new(conn)),
            path,
            native_capacity: opts.native_cache_capacity,
            standalone_sql: HashSet::new(),
        })
    }

    /// Path (or `:memory:`) this connection was opened on.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The cached statement for `sql`, if one exists.
    #[must_use]
    pub fn cached_statement(&self, sql: &str) -> Option<&SqliteStatement> {
        self.cache.get(sql)
    }

    fn live_handle(&self) -> Result<Rc<Connection>, SqlGateError> {
        self.handle
            .as_ref()
            .map(Rc::clone)
            .ok_or_else(|| SqlGateError::ConnectionError("SQLite connection is closed".into()))
    }

    /// Grow rusqlite's LRU before a new plan joins it, so no resident plan is evicted.
    fn reserve_native_slot(&mut self, conn: &Connection) {
        let resident = self.cache.len() + self.standalone_sql.len();
        if resident >= self.native_capacity {
            self.native_capacity = (self.native_capacity * 2).max(resident + 1);
            conn.set_prepared_statement_cache_capacity(self.native_capacity);
        }
    }

    fn cached(&mut self, sql: &str) -> Result<&mut SqliteStatement, SqlGateError> {
        let conn = self.live_handle()?;
        if !self.cache.contains(sql) {
            self.reserve_native_slot(&conn);
        }
        self.cache
            .get_or_build(sql, |sql| SqliteStatement::new(conn, sql))
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .field("open", &self.handle.is_some())
            .field("cached_statements", &self.cache.len())
            .finish()
    }
}

impl DatabaseConnection for SqliteConnection {
    fn execute(&mut self, script: &str) -> Result<(), SqlGateError> {
        let conn = self.live_handle()?;
        conn.execute_batch(script)
            .map_err(|e| SqlGateError::execution(script, e))
    }

    fn query(&mut self, sql: &str) -> Result<(), SqlGateError> {
        self.cached(sql)?.query()
    }

    fn query_rows(&mut self, sql: &str, args: &[&str]) -> Result<Vec<Row>, SqlGateError> {
        self.cached(sql)?.query_rows(args)
    }

    fn query_json_with(&mut self, sql: &str, args: &[&str]) -> Result<String, SqlGateError> {
        self.cached(sql)?.query_json_with(args)
    }

    fn get_statement(&mut self, sql: &str) -> Result<Box<dyn PreparedStatement>, SqlGateError> {
        let conn = self.live_handle()?;
        if !self.cache.contains(sql) && !self.standalone_sql.contains(sql) {
            self.reserve_native_slot(&conn);
            self.standalone_sql.insert(sql.to_string());
        }
        let mut stmt = SqliteStatement::new(conn, sql);
        stmt.build()?;
        Ok(Box::new(stmt))
    }

    fn last_insert_id(&mut self) -> Result<u64, SqlGateError> {
        let rows = self.query_rows(LAST_INSERT_ID_SQL, &[])?;
        parse_last_insert_id(LAST_INSERT_ID_SQL, &rows)
    }

    fn close(&mut self) -> Result<(), SqlGateError> {
        self.cache.clear();
        self.standalone_sql.clear();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle.flush_prepared_statement_cache();
        match Rc::try_unwrap(handle) {
            Ok(conn) => {
                conn.close().map_err(|(_, e)| {
                    SqlGateError::ConnectionError(format!("Failed to close {}: {e}", self.path))
                })?;
                info!(path = %self.path, "closed sqlite connection");
            }
            Err(_) => {
                warn!(
                    path = %self.path,
                    "standalone statements still hold the sqlite handle; it closes when they drop"
                );
            }
        }
        Ok(())
    }

    fn backend_tag(&self) -> BackendTag {
        BackendTag::Sqlite
    }

    fn name(&self) -> &'static str {
        "SQLite"
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        self.cache.clear();
    }
}
