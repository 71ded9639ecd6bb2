use crate::error::SqlGateError;
use crate::results::Row;

/// Counters kept by every prepared statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementStats {
    /// Native prepares performed for this statement (first build plus rebuilds).
    pub builds: u32,
    /// Successful or failed executions handed to the native client.
    pub executions: u64,
}

/// A prepared, reusable SQL statement bound to one connection.
///
/// Execution entry points build the statement on first use, so a statement can be created
/// cheaply and compiled lazily. After every execution the native cursor is reset and the
/// statement is ready for the next bind-execute cycle.
pub trait PreparedStatement {
    /// The SQL text this statement was created from.
    fn source(&self) -> &str;

    fn is_built(&self) -> bool;

    /// Prepare the source text against the owning connection.
    ///
    /// # Errors
    /// Returns [`SqlGateError::PrepareError`] when the backend rejects the SQL, or
    /// [`SqlGateError::AlreadyBuilt`] on backends that do not allow rebuilding.
    fn build(&mut self) -> Result<(), SqlGateError>;

    /// Execute without expecting a result set (DDL/DML).
    ///
    /// # Errors
    /// Returns [`SqlGateError::ExecutionError`] if the backend reports a failure.
    fn query(&mut self) -> Result<(), SqlGateError>;

    /// Bind positional text arguments, execute, and collect every row.
    ///
    /// # Errors
    /// Returns [`SqlGateError::ExecutionError`] on bind or execution failures, or
    /// [`SqlGateError::UnsupportedColumnType`] when a column cannot be encoded.
    fn query_rows(&mut self, args: &[&str]) -> Result<Vec<Row>, SqlGateError>;

    /// Execute and render the result as a JSON document.
    ///
    /// # Errors
    /// Same as [`PreparedStatement::query_rows`].
    fn query_json(&mut self) -> Result<String, SqlGateError> {
        self.query_json_with(&[])
    }

    /// Bind positional text arguments, execute, and render a JSON document.
    ///
    /// # Errors
    /// Same as [`PreparedStatement::query_rows`].
    fn query_json_with(&mut self, args: &[&str]) -> Result<String, SqlGateError>;

    fn stats(&self) -> StatementStats;
}

impl std::fmt::Debug for dyn PreparedStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("source", &self.source())
            .field("built", &self.is_built())
            .finish()
    }
}
