use sqlx::query::Query;
use sqlx::{Database, Encode, Executor, Statement, Type};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::error::SqlGateError;
use crate::results::{JsonDocument, Materializer, Row, RowCollector};
use crate::statement::{PreparedStatement, StatementStats};

use super::query::{build_result, column_names};
use super::session::{DriverHandle, NativeConnection};

/// A plan prepared by one of the installed drivers.
enum NativePlan {
    Sqlite(sqlx::sqlite::SqliteStatement<'static>),
    Postgres(sqlx::postgres::PgStatement<'static>),
    MySql(sqlx::mysql::MySqlStatement<'static>),
}

impl NativePlan {
    fn prepare(
        runtime: &Runtime,
        conn: &mut NativeConnection,
        sql: &str,
    ) -> Result<Self, sqlx::Error> {
        Ok(match conn {
            NativeConnection::Sqlite(c) => {
                NativePlan::Sqlite(Statement::to_owned(&runtime.block_on(c.prepare(sql))?))
            }
            NativeConnection::Postgres(c) => {
                NativePlan::Postgres(Statement::to_owned(&runtime.block_on(c.prepare(sql))?))
            }
            NativeConnection::MySql(c) => {
                NativePlan::MySql(Statement::to_owned(&runtime.block_on(c.prepare(sql))?))
            }
        })
    }
}

/// Bind each argument as text; the driver converts it where the statement needs another type.
fn bind_text<'q, DB>(
    mut query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    args: &[&str],
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    String: Encode<'q, DB> + Type<DB>,
{
    for arg in args {
        query = query.bind((*arg).to_string());
    }
    query
}

fn foreign_plan(sql: &str) -> SqlGateError {
    SqlGateError::prepare(sql, "statement was prepared by a different driver")
}

/// Prepared statement on a driver-manager connection. Rebuilding replaces the plan.
pub struct DriverStatement {
    session: DriverHandle,
    sql: String,
    plan: Option<NativePlan>,
    stats: StatementStats,
}

impl DriverStatement {
    pub(crate) fn new(session: DriverHandle, sql: &str) -> Self {
        Self {
            session,
            sql: sql.to_string(),
            plan: None,
            stats: StatementStats::default(),
        }
    }

    fn ensure_built(&mut self) -> Result<(), SqlGateError> {
        if self.plan.is_none() {
            self.build()?;
        }
        Ok(())
    }

    fn run<M: Materializer>(&mut self, args: &[&str], sink: M) -> Result<M::Output, SqlGateError> {
        self.ensure_built()?;
        self.stats.executions += 1;
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| SqlGateError::prepare(&self.sql, "statement has no plan"))?;
        let sql = self.sql.as_str();
        let fetch_failed = |e: sqlx::Error| SqlGateError::execution(sql, e);

        let mut session = self.session.borrow_mut();
        let (runtime, conn) = session.parts()?;
        match (conn, plan) {
            (NativeConnection::Sqlite(c), NativePlan::Sqlite(p)) => {
                let rows = runtime
                    .block_on(bind_text(p.query(), args).fetch_all(c))
                    .map_err(fetch_failed)?;
                build_result(column_names(p.columns()), &rows, sql, sink)
            }
            (NativeConnection::Postgres(c), NativePlan::Postgres(p)) => {
                let rows = runtime
                    .block_on(bind_text(p.query(), args).fetch_all(c))
                    .map_err(fetch_failed)?;
                build_result(column_names(p.columns()), &rows, sql, sink)
            }
            (NativeConnection::MySql(c), NativePlan::MySql(p)) => {
                let rows = runtime
                    .block_on(bind_text(p.query(), args).fetch_all(c))
                    .map_err(fetch_failed)?;
                build_result(column_names(p.columns()), &rows, sql, sink)
            }
            _ => Err(foreign_plan(sql)),
        }
    }
}

impl std::fmt::Debug for DriverStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverStatement")
            .field("sql", &self.sql)
            .field("built", &self.plan.is_some())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl PreparedStatement for DriverStatement {
    fn source(&self) -> &str {
        &self.sql
    }

    fn is_built(&self) -> bool {
        self.plan.is_some()
    }

    fn build(&mut self) -> Result<(), SqlGateError> {
        debug!(sql = %self.sql, rebuild = self.plan.is_some(), "preparing driver statement");
        let mut session = self.session.borrow_mut();
        let (runtime, conn) = session.parts()?;
        let plan = NativePlan::prepare(runtime, conn, &self.sql)
            .map_err(|e| SqlGateError::prepare(&self.sql, e))?;
        self.plan = Some(plan);
        self.stats.builds += 1;
        Ok(())
    }

    fn query(&mut self) -> Result<(), SqlGateError> {
        self.ensure_built()?;
        self.stats.executions += 1;
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| SqlGateError::prepare(&self.sql, "statement has no plan"))?;
        let sql = self.sql.as_str();

        let mut session = self.session.borrow_mut();
        let (runtime, conn) = session.parts()?;
        let done = match (conn, plan) {
            (NativeConnection::Sqlite(c), NativePlan::Sqlite(p)) => {
                runtime.block_on(p.query().execute(c)).map(drop)
            }
            (NativeConnection::Postgres(c), NativePlan::Postgres(p)) => {
                runtime.block_on(p.query().execute(c)).map(drop)
            }
            (NativeConnection::MySql(c), NativePlan::MySql(p)) => {
                runtime.block_on(p.query().execute(c)).map(drop)
            }
            _ => return Err(foreign_plan(sql)),
        };
        done.map_err(|e| SqlGateError::execution(sql, e))
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
