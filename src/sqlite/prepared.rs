use std::rc::Rc;

use rusqlite::Connection;
use tracing::debug;

use crate::error::SqlGateError;
use crate::results::{JsonDocument, Materializer, Row, RowCollector};
use crate::statement::{PreparedStatement, StatementStats};

use super::query::{drain_statement, run_statement};

/// Prepared statement on an embedded `SQLite` connection.
///
/// The native plan lives in rusqlite's `prepare_cached` LRU, keyed by the SQL text, so the
/// handle only keeps the shared connection and the source text.
pub struct SqliteStatement {
    conn: Rc<Connection>,
    sql: String,
    built: bool,
    stats: StatementStats,
}

impl SqliteStatement {
    pub(crate) fn new(conn: Rc<Connection>, sql: &str) -> Self {
        Self {
            conn,
            sql: sql.to_string(),
            built: false,
            stats: StatementStats::default(),
        }
    }

    fn ensure_built(&mut self) -> Result<(), SqlGateError> {
        if !self.built {
            self.build()?;
        }
        Ok(())
    }

    fn run<M: Materializer>(&mut self, args: &[&str], sink: M) -> Result<M::Output, SqlGateError> {
        self.ensure_built()?;
        self.stats.executions += 1;
        let mut stmt = self
            .conn
            .prepare_cached(&self.sql)
            .map_err(|e| SqlGateError::prepare(&self.sql, e))?;
        run_statement(&mut stmt, &self.sql, args, sink)
    }
}

impl std::fmt::Debug for SqliteStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStatement")
            .field("sql", &self.sql)
            .field("built", &self.built)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl PreparedStatement for SqliteStatement {
    fn source(&self) -> &str {
        &self.sql
    }

    fn is_built(&self) -> bool {
        self.built
    }

    fn build(&mut self) -> Result<(), SqlGateError> {
        if self.built {
            return Err(SqlGateError::AlreadyBuilt {
                sql: self.sql.clone(),
            });
        }
        debug!(sql = %self.sql, "preparing sqlite statement");
        // compiles the text and parks the plan in rusqlite's cache
        self.conn
            .prepare_cached(&self.sql)
            .map_err(|e| SqlGateError::prepare(&self.sql, e))?;
        self.built = true;
        self.stats.builds += 1;
        Ok(())
    }

    fn query(&mut self) -> Result<(), SqlGateError> {
        self.ensure_built()?;
        self.stats.executions += 1;
        let mut stmt = self
            .conn
            .prepare_cached(&self.sql)
            .map_err(|e| SqlGateError::prepare(&self.sql, e))?;
        drain_statement(&mut stmt, &self.sql)
    }

    fn query_rows(&mut self, args: &[&str]) -> Result<Vec<Row>, SqlGateError> {
        self.run(args, RowCollector::default())
    }

    fn query_json_with(&mut self, args: &[&str]) -> Result<String, SqlGateError> {
        self.run(args, JsonDocument::default())
    }

    fn stats(&self) -> StatementStats {
        self.stats
    }
}
