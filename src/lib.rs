//! Synchronous, uniform SQL access over three interchangeable backends.
//!
//! - an embedded engine (`SQLite` via rusqlite),
//! - a client-server engine (PostgreSQL via tokio-postgres, with transparent reconnect),
//! - a driver manager (a registry of sqlx drivers chosen by URL scheme).
//!
//! Every backend caches prepared statements by their exact SQL text and produces the same
//! textual output: rows of encoded strings, or a JSON array-of-objects document.
//!
//! ```rust,no_run
//! use sqlgate::prelude::*;
//!
//! # fn main() -> Result<(), SqlGateError> {
//! let mut conn = connect(BackendTag::Sqlite, &ConnectParams::new(":memory:"))?;
//! conn.execute("create table t(a integer, b text); insert into t values (1, 'x');")?;
//! assert_eq!(
//!     conn.query_json("select a, b from t")?,
//!     "[\n{\n\"a\" : \"1\",\n\"b\" : \"x\"\n}\n]\n"
//! );
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod connection;
pub mod encoding;
pub mod error;
pub mod exports;
pub mod prelude;
pub mod reconnect;
pub mod results;
pub mod script;
pub mod statement;
pub mod types;

#[cfg(feature = "driver")]
pub mod driver;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{ConnectParams, ConnectParamsBuilder};
pub use connection::{DatabaseConnection, connect};
pub use error::{ErrorKind, SqlGateError};
pub use results::Row;
pub use statement::{PreparedStatement, StatementStats};
pub use types::{BackendTag, NativeValue};
