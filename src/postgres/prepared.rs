use tokio_postgres::Statement;
use tracing::debug;

use crate::error::SqlGateError;
use crate::results::{JsonDocument, Materializer, Row, RowCollector};
use crate::statement::{PreparedStatement, StatementStats};

use super::params::{TextArg, convert_args};
use super::query::build_result;
use super::session::SessionHandle;

/// Prepared statement on a PostgreSQL session.
///
/// Rebuilding is allowed and replaces the server-side plan. A statement built against an
/// older session generation rebuilds itself before its next execution.
pub struct PgStatement {
    session: SessionHandle,
    sql: String,
    plan: Option<(Statement, u64)>,
    stats: StatementStats,
}

impl PgStatement {
    pub(crate) fn new(session: SessionHandle, sql: &str) -> Self {
        Self {
            session,
            sql: sql.to_string(),
            plan: None,
            stats: StatementStats::default(),
        }
    }

    /// The current native plan, rebuilt first if the session was re-established.
    fn current_plan(&mut self) -> Result<Statement, SqlGateError> {
        let generation = self.session.borrow().generation();
        match &self.plan {
            Some((stmt, built_for)) if *built_for == generation => Ok(stmt.clone()),
            _ => {
                self.build()?;
                self.plan
                    .as_ref()
                    .map(|(stmt, _)| stmt.clone())
                    .ok_or_else(|| SqlGateError::prepare(&self.sql, "statement has no plan"))
            }
        }
    }

    fn run<M: Materializer>(&mut self, args: &[&str], sink: M) -> Result<M::Output, SqlGateError> {
        let stmt = self.current_plan()?;
        self.stats.executions += 1;
        let text_args: Vec<TextArg<'_>> = args.iter().copied().map(TextArg).collect();
        let params = convert_args(&text_args);

        let session = self.session.borrow();
        let client = session.client()?;
        let rows = session
            .block_on(client.query(&stmt, &params))
            .map_err(|e| SqlGateError::execution(&self.sql, e))?;
        build_result(&stmt, &rows, &self.sql, sink)
    }
}

impl std::fmt::Debug for PgStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStatement")
            .field("sql", &self.sql)
            .field("generation", &self.plan.as_ref().map(|(_, g)| *g))
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl PreparedStatement for PgStatement {
    fn source(&self) -> &str {
        &self.sql
    }

    fn is_built(&self) -> bool {
        self.plan.is_some()
    }

    fn build(&mut self) -> Result<(), SqlGateError> {
        debug!(sql = %self.sql, rebuild = self.plan.is_some(), "preparing postgres statement");
        let session = self.session.borrow();
        let client = session.client()?;
        let stmt = session
            .block_on(client.prepare(&self.sql))
            .map_err(|e| SqlGateError::prepare(&self.sql, e))?;
        self.plan = Some((stmt, session.generation()));
        self.stats.builds += 1;
        Ok(())
    }

    fn query(&mut self) -> Result<(), SqlGateError> {
        let stmt = self.current_plan()?;
        self.stats.executions += 1;
        let session = self.session.borrow();
        let client = session.client()?;
        session
            .block_on(client.execute(&stmt, &[]))
            .map_err(|e| SqlGateError::execution(&self.sql, e))?;
        Ok(())
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
