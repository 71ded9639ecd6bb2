//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{ConnectParams, ConnectParamsBuilder};
pub use crate::connection::{DatabaseConnection, connect};
pub use crate::error::{ErrorKind, SqlGateError};
pub use crate::results::Row;
pub use crate::script::read_script;
pub use crate::statement::{PreparedStatement, StatementStats};
pub use crate::types::{BackendTag, NativeValue};

pub use crate::exports::*;
