//! Backend-specific type exports.
//!
//! All feature-gated re-exports live here so the prelude can pull them in one line.

// SQLite exports
#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteOptions, SqliteOptionsBuilder, SqliteStatement};

// PostgreSQL exports
#[cfg(feature = "postgres")]
pub use crate::postgres::{
    PgStatement, PostgresConnection, PostgresOptions, PostgresOptionsBuilder,
};

// Driver manager exports
#[cfg(feature = "driver")]
pub use crate::driver::{DataSources, Driver, DriverConnection, DriverStatement};
