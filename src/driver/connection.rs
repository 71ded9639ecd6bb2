use tracing::info;

use crate::cache::StatementCache;
use crate::config::ConnectParams;
use crate::connection::{DatabaseConnection, parse_last_insert_id};
use crate::error::SqlGateError;
use crate::results::Row;
use crate::statement::PreparedStatement;
use crate::types::BackendTag;

use super::config::{DataSources, url_redacted};
use super::prepared::DriverStatement;
use super::session::{Driver, DriverHandle, DriverSession};

/// Query returning the identifier generated by the last insert on the active driver.
fn last_insert_id_sql(driver: Driver) -> &'static str {
    match driver {
        Driver::Sqlite => "select last_insert_rowid()",
        Driver::Postgres => "select lastval()",
        Driver::MySql => "select LAST_INSERT_ID()",
    }
}

/// Connection opened through the driver registry.
pub struct DriverConnection {
    cache: StatementCache<DriverStatement>,
    session: DriverHandle,
    closed: bool,
}

impl DriverConnection {
    /// Connect using only URL targets and `SQLGATE_DSN_*` environment variables.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` if the data source is unknown or unreachable.
    pub fn connect(params: &ConnectParams) -> Result<Self, SqlGateError> {
        Self::connect_with(params, &DataSources::default())
    }

    /// Connect, resolving the target through `sources`.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` if the data source is unknown or unreachable, or
    /// `SqlGateError::ConfigError` if its URL cannot be completed.
    pub fn connect_with(
        params: &ConnectParams,
        sources: &DataSources,
    ) -> Result<Self, SqlGateError> {
        let url = sources.connect_url(params)?;
        let source = url_redacted(&url);
        let session = DriverSession::open(&url, source)?;
        info!(source = %session.source(), driver = session.driver().name(), "opened driver connection");
        Ok(Self {
            cache: StatementCache::new(),
            session: DriverHandle::new(session),
            closed: false,
        })
    }

    /// Name of the driver serving this connection.
    #[must_use]
    pub fn driver_name(&self) -> &'static str {
        self.driver().name()
    }

    #[must_use]
    pub fn driver(&self) -> Driver {
        self.session.borrow_mut().driver()
    }

    /// The cached statement for `sql`, if one exists.
    #[must_use]
    pub fn cached_statement(&self, sql: &str) -> Option<&DriverStatement> {
        self.cache.get(sql)
    }

    fn ensure_open(&self) -> Result<(), SqlGateError> {
        if self.closed {
            return Err(SqlGateError::ConnectionError(
                "Driver manager connection is closed".into(),
            ));
        }
        Ok(())
    }

    fn cached(&mut self, sql: &str) -> Result<&mut DriverStatement, SqlGateError> {
        self.ensure_open()?;
        let session = self.session.clone();
        self.cache
            .get_or_build(sql, |sql| DriverStatement::new(session, sql))
    }
}

impl std::fmt::Debug for DriverConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverConnection")
            .field("closed", &self.closed)
            .field("cached_statements", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl DatabaseConnection for DriverConnection {
    fn execute(&mut self, script: &str) -> Result<(), SqlGateError> {
        self.ensure_open()?;
        self.session.borrow_mut().run_script(script)
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
        self.ensure_open()?;
        let mut stmt = DriverStatement::new(self.session.clone(), sql);
        stmt.build()?;
        Ok(Box::new(stmt))
    }

    fn last_insert_id(&mut self) -> Result<u64, SqlGateError> {
        self.ensure_open()?;
        let sql = last_insert_id_sql(self.driver());
        let rows = self.query_rows(sql, &[])?;
        parse_last_insert_id(sql, &rows)
    }

    fn close(&mut self) -> Result<(), SqlGateError> {
        if self.closed {
            return Ok(());
        }
        self.cache.clear();
        self.closed = true;
        let mut session = self.session.borrow_mut();
        session.close()?;
        info!(source = %session.source(), "closed driver connection");
        Ok(())
    }

    fn backend_tag(&self) -> BackendTag {
        BackendTag::DriverManager
    }

    fn name(&self) -> &'static str {
        "Driver manager"
    }
}

impl Drop for DriverConnection {
    fn drop(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_insert_id_query_follows_the_driver() {
        assert_eq!(
            last_insert_id_sql(Driver::Sqlite),
            "select last_insert_rowid()"
        );
        assert_eq!(last_insert_id_sql(Driver::Postgres), "select lastval()");
        assert_eq!(last_insert_id_sql(Driver::MySql), "select LAST_INSERT_ID()");
    }
}
