// Driver-manager backend: a registry of sqlx drivers chosen by URL scheme.
//
// - config: `DataSources` and URL completion
// - session: `Driver`, the runtime + native connection pair
// - connection: `DriverConnection`
// - prepared: `DriverStatement`
// - query: per-driver value decoding (`ExtractValue`)

pub mod config;
pub mod connection;
pub mod prepared;
pub mod query;
pub mod session;

pub use config::DataSources;
pub use connection::DriverConnection;
pub use prepared::DriverStatement;
pub use session::Driver;
