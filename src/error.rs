use std::path::PathBuf;

use thiserror::Error;

/// Failure categories surfaced by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Prepare,
    Execution,
    UnsupportedColumnType,
    ScriptIo,
    Config,
    Unimplemented,
}

#[derive(Debug, Error)]
pub enum SqlGateError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Could not prepare statement: {message}\n\nWith statement\n{sql}")]
    PrepareError { sql: String, message: String },

    #[error("Statement was already built\n\nWith statement\n{sql}")]
    AlreadyBuilt { sql: String },

    #[error("Could not execute statement: {message}\n\nWith statement\n{sql}")]
    ExecutionError { sql: String, message: String },

    #[error("Received unknown column type ({column} is {type_code})")]
    UnsupportedColumnType { column: String, type_code: String },

    #[error("Could not open SQL script file {}: {source}", path.display())]
    ScriptIoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

impl SqlGateError {
    pub(crate) fn prepare(sql: &str, message: impl std::fmt::Display) -> Self {
        SqlGateError::PrepareError {
            sql: sql.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn execution(sql: &str, message: impl std::fmt::Display) -> Self {
        SqlGateError::ExecutionError {
            sql: sql.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn unsupported_column(column: &str, type_code: impl std::fmt::Display) -> Self {
        SqlGateError::UnsupportedColumnType {
            column: column.to_string(),
            type_code: type_code.to_string(),
        }
    }

    /// Category of this error, for callers that branch on failure type.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SqlGateError::ConnectionError(_) => ErrorKind::Connection,
            SqlGateError::PrepareError { .. } | SqlGateError::AlreadyBuilt { .. } => {
                ErrorKind::Prepare
            }
            SqlGateError::ExecutionError { .. } => ErrorKind::Execution,
            SqlGateError::UnsupportedColumnType { .. } => ErrorKind::UnsupportedColumnType,
            SqlGateError::ScriptIoError { .. } => ErrorKind::ScriptIo,
            SqlGateError::ConfigError(_) => ErrorKind::Config,
            SqlGateError::Unimplemented(_) => ErrorKind::Unimplemented,
        }
    }

    /// SQL text attached to a prepare or execution failure.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        match self {
            SqlGateError::PrepareError { sql, .. }
            | SqlGateError::AlreadyBuilt { sql }
            | SqlGateError::ExecutionError { sql, .. } => Some(sql),
            _ => None,
        }
    }
}
