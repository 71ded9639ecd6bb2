// Client-server backend on tokio-postgres, driven synchronously.
//
// - config: `PostgresOptions`, native client config, identifier quoting
// - session: the runtime + client pair and its `Transport` impl
// - connection: `PostgresConnection`
// - prepared: `PgStatement`
// - params: text arguments converted to inferred parameter types
// - query: column decoding

pub mod config;
pub mod connection;
pub mod params;
pub mod prepared;
pub mod query;
pub mod session;

pub use config::{PostgresOptions, PostgresOptionsBuilder};
pub use connection::PostgresConnection;
pub use prepared::PgStatement;
