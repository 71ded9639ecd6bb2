use std::path::Path;

use crate::config::ConnectParams;
use crate::error::SqlGateError;
use crate::results::Row;
use crate::script::read_script;
use crate::statement::PreparedStatement;
use crate::types::BackendTag;

#[cfg(feature = "driver")]
use crate::driver::DriverConnection;
#[cfg(feature = "postgres")]
use crate::postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteConnection;

/// The operations every backend offers.
///
/// Ad hoc and parameterized calls go through the connection's statement cache, so repeating
/// the same SQL text reuses one prepared plan.
pub trait DatabaseConnection {
    /// Submit a whole script as one multi-statement batch.
    ///
    /// # Errors
    /// Returns [`SqlGateError::ExecutionError`] if the backend rejects any part of the batch.
    fn execute(&mut self, script: &str) -> Result<(), SqlGateError>;

    /// Run one statement that produces no result set.
    ///
    /// # Errors
    /// Returns a prepare or execution error from the backend.
    fn query(&mut self, sql: &str) -> Result<(), SqlGateError>;

    /// Run one statement with positional text arguments and collect its rows.
    ///
    /// # Errors
    /// Returns a prepare, execution, or unsupported-column error.
    fn query_rows(&mut self, sql: &str, args: &[&str]) -> Result<Vec<Row>, SqlGateError>;

    /// Run one statement and render its result as a JSON document.
    ///
    /// # Errors
    /// Returns a prepare, execution, or unsupported-column error.
    fn query_json(&mut self, sql: &str) -> Result<String, SqlGateError> {
        self.query_json_with(sql, &[])
    }

    /// Run one statement with positional text arguments and render a JSON document.
    ///
    /// # Errors
    /// Returns a prepare, execution, or unsupported-column error.
    fn query_json_with(&mut self, sql: &str, args: &[&str]) -> Result<String, SqlGateError>;

    /// Build a standalone statement that is not stored in the cache.
    ///
    /// # Errors
    /// Returns [`SqlGateError::PrepareError`] if the SQL does not compile.
    fn get_statement(&mut self, sql: &str) -> Result<Box<dyn PreparedStatement>, SqlGateError>;

    /// Identifier generated by the most recent insert on this session.
    ///
    /// # Errors
    /// Returns [`SqlGateError::ExecutionError`] if the backend returns no usable identifier.
    fn last_insert_id(&mut self) -> Result<u64, SqlGateError>;

    /// Finalize cached statements and release the native handle.
    ///
    /// # Errors
    /// Returns [`SqlGateError::ConnectionError`] if the native close fails.
    fn close(&mut self) -> Result<(), SqlGateError>;

    fn backend_tag(&self) -> BackendTag;

    /// Human-readable backend name.
    fn name(&self) -> &'static str;

    /// Read a SQL script from disk and submit it with [`DatabaseConnection::execute`].
    ///
    /// # Errors
    /// Returns [`SqlGateError::ScriptIoError`] if the file cannot be read, otherwise whatever
    /// `execute` returns.
    fn execute_file(&mut self, path: &Path) -> Result<(), SqlGateError> {
        let script = read_script(path)?;
        self.execute(&script)
    }
}

impl std::fmt::Debug for dyn DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple(self.name()).finish()
    }
}

/// Open a connection to the backend selected by `backend`, using default backend options.
///
/// # Errors
/// Returns the backend's connection error, or [`SqlGateError::Unimplemented`] when the
/// backend's feature is not compiled in.
pub fn connect(
    backend: BackendTag,
    params: &ConnectParams,
) -> Result<Box<dyn DatabaseConnection>, SqlGateError> {
    match backend {
        #[cfg(feature = "sqlite")]
        BackendTag::Sqlite => Ok(Box::new(SqliteConnection::connect(params)?)),
        #[cfg(feature = "postgres")]
        BackendTag::Postgres => Ok(Box::new(PostgresConnection::connect(params)?)),
        #[cfg(feature = "driver")]
        BackendTag::DriverManager => Ok(Box::new(DriverConnection::connect(params)?)),
        #[allow(unreachable_patterns)]
        other => Err(SqlGateError::Unimplemented(format!(
            "backend `{other}` is not enabled in the current build"
        ))),
    }
}

/// Interpret the result of a "last generated identifier" query.
///
/// Expects exactly one row with one column holding an unsigned integer.
#[cfg_attr(not(any(feature = "sqlite", feature = "postgres", feature = "driver")), allow(dead_code))]
pub(crate) fn parse_last_insert_id(sql: &str, rows: &[Row]) -> Result<u64, SqlGateError> {
    let [row] = rows else {
        return Err(SqlGateError::execution(
            sql,
            format!("expected exactly one row, got {}", rows.len()),
        ));
    };
    if row.len() != 1 {
        return Err(SqlGateError::execution(
            sql,
            format!("expected exactly one column, got {}", row.len()),
        ));
    }
    let value = row.get_by_index(0).unwrap_or_default();
    value.trim().parse::<u64>().map_err(|e| {
        SqlGateError::execution(sql, format!("`{value}` is not an insert id: {e}"))
    })
}
