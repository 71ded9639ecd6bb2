// Embedded backend on rusqlite.
//
// - config: `SqliteOptions` and the target -> path rule
// - connection: `SqliteConnection`, the `DatabaseConnection` realization
// - prepared: `SqliteStatement`
// - query: value extraction and the fetch loop

pub mod config;
pub mod connection;
pub mod prepared;
pub mod query;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use connection::SqliteConnection;
pub use prepared::SqliteStatement;
