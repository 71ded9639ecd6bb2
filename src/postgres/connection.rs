use tracing::info;

use crate::cache::StatementCache;
use crate::config::ConnectParams;
use crate::connection::{DatabaseConnection, parse_last_insert_id};
use crate::error::SqlGateError;
use crate::reconnect::ReconnectManager;
use crate::results::Row;
use crate::statement::PreparedStatement;
use crate::types::BackendTag;

use super::config::PostgresOptions;
use super::prepared::PgStatement;
use super::session::{PgSession, SessionHandle};

const LAST_INSERT_ID_SQL: &str = "select lastval()";

/// Client-server connection on `tokio-postgres`, with transparent reconnect.
///
/// Every entry point checks the transport first; a dead session is re-established, the schema
/// re-selected, and every cached statement rebuilt before the call proceeds.
pub struct PostgresConnection {
    cache: StatementCache<PgStatement>,
    session: SessionHandle,
    reconnect: ReconnectManager,
    closed: bool,
}

impl PostgresConnection {
    /// Connect with default options.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConfigError` for unusable parameters or
    /// `SqlGateError::ConnectionError` if the server cannot be reached.
    pub fn connect(params: &ConnectParams) -> Result<Self, SqlGateError> {
        Self::connect_with(params, &PostgresOptions::default())
    }

    /// Connect with explicit options.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConfigError` for unusable parameters or
    /// `SqlGateError::ConnectionError` if the server cannot be reached.
    pub fn connect_with(
        params: &ConnectParams,
        opts: &PostgresOptions,
    ) -> Result<Self, SqlGateError> {
        let config = opts.client_config(params)?;
        let session = PgSession::open(config, &params.target, opts.probe_liveness)?;
        info!(schema = %params.target, "opened postgres connection");
        Ok(Self {
            cache: StatementCache::new(),
            session: SessionHandle::new(session),
            reconnect: ReconnectManager::new(),
            closed: false,
        })
    }

    /// The cached statement for `sql`, if one exists.
    #[must_use]
    pub fn cached_statement(&self, sql: &str) -> Option<&PgStatement> {
        self.cache.get(sql)
    }

    /// Number of times the session has been re-established.
    #[must_use]
    pub fn reconnects(&self) -> u64 {
        self.reconnect.reconnects()
    }

    fn ensure_ready(&mut self) -> Result<(), SqlGateError> {
        if self.closed {
            return Err(SqlGateError::ConnectionError(
                "PostgreSQL connection is closed".into(),
            ));
        }
        self.reconnect
            .ensure_alive(&mut self.session, &mut self.cache)?;
        Ok(())
    }

    fn cached(&mut self, sql: &str) -> Result<&mut PgStatement, SqlGateError> {
        self.ensure_ready()?;
        let session = self.session.clone();
        self.cache
            .get_or_build(sql, |sql| PgStatement::new(session, sql))
    }
}

impl std::fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("schema", &self.session.borrow().schema())
            .field("closed", &self.closed)
            .field("cached_statements", &self.cache.len())
            .field("reconnects", &self.reconnect.reconnects())
            .finish()
    }
}

impl DatabaseConnection for PostgresConnection {
    fn execute(&mut self, script: &str) -> Result<(), SqlGateError> {
        self.ensure_ready()?;
        let session = self.session.borrow();
        let client = session.client()?;
        session
            .block_on(client.batch_execute(script))
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
        self.ensure_ready()?;
        let mut stmt = PgStatement::new(self.session.clone(), sql);
        stmt.build()?;
        Ok(Box::new(stmt))
    }

    fn last_insert_id(&mut self) -> Result<u64, SqlGateError> {
        let rows = self.query_rows(LAST_INSERT_ID_SQL, &[])?;
        parse_last_insert_id(LAST_INSERT_ID_SQL, &rows)
    }

    fn close(&mut self) -> Result<(), SqlGateError> {
        if self.closed {
            return Ok(());
        }
        self.cache.clear();
        self.session.shut_down();
        self.closed = true;
        info!("closed postgres connection");
        Ok(())
    }

    fn backend_tag(&self) -> BackendTag {
        BackendTag::Postgres
    }

    fn name(&self) -> &'static str {
        "PostgreSQL"
    }
}

impl Drop for PostgresConnection {
    fn drop(&mut self) {
        self.cache.clear();
    }
}
