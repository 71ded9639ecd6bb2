use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConnectParams;
use crate::error::SqlGateError;

use super::connection::PostgresConnection;

/// Options for the client-server backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresOptions {
    /// Physical database to log into. `None` uses the server default for the principal.
    pub database: Option<String>,
    /// Round-trip an empty query before each call to detect half-open sockets.
    pub probe_liveness: bool,
    pub connect_timeout: Option<Duration>,
    pub application_name: String,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            database: None,
            probe_liveness: true,
            connect_timeout: None,
            application_name: "sqlgate".to_string(),
        }
    }
}

impl PostgresOptions {
    #[must_use]
    pub fn builder() -> PostgresOptionsBuilder {
        PostgresOptionsBuilder::default()
    }

    /// Native client configuration for `params` with these options.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConfigError` if the target is empty or no principal can be
    /// determined.
    pub fn client_config(
        &self,
        params: &ConnectParams,
    ) -> Result<tokio_postgres::Config, SqlGateError> {
        if params.target.is_empty() {
            return Err(SqlGateError::ConfigError(
                "target (schema) is required".to_string(),
            ));
        }

        let mut config = tokio_postgres::Config::new();
        match (&params.socket, &params.host) {
            (Some(socket), _) => add_socket(&mut config, socket)?,
            (None, Some(host)) => {
                config.host(host);
            }
            (None, None) => {
                config.host("localhost");
            }
        }
        if let Some(port) = params.port {
            config.port(port);
        }

        let user = params
            .principal
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .ok_or_else(|| SqlGateError::ConfigError("principal is required".to_string()))?;
        config.user(user);
        if let Some(password) = &params.credential {
            config.password(password);
        }
        if let Some(database) = &self.database {
            config.dbname(database);
        }
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout(timeout);
        }
        config.application_name(&self.application_name);
        Ok(config)
    }
}

#[cfg(unix)]
fn add_socket(
    config: &mut tokio_postgres::Config,
    socket: &std::path::Path,
) -> Result<(), SqlGateError> {
    config.host_path(socket);
    Ok(())
}

#[cfg(not(unix))]
fn add_socket(
    _config: &mut tokio_postgres::Config,
    socket: &std::path::Path,
) -> Result<(), SqlGateError> {
    Err(SqlGateError::ConfigError(format!(
        "unix socket {} is not supported on this platform",
        socket.display()
    )))
}

/// Fluent builder for `PostgresOptions`.
#[derive(Debug, Clone, Default)]
pub struct PostgresOptionsBuilder {
    opts: PostgresOptions,
}

impl PostgresOptionsBuilder {
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.opts.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn probe_liveness(mut self, probe: bool) -> Self {
        self.opts.probe_liveness = probe;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.opts.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.opts.application_name = name.into();
        self
    }

    #[must_use]
    pub fn finish(self) -> PostgresOptions {
        self.opts
    }

    /// Connect with these options.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConfigError` for unusable parameters or
    /// `SqlGateError::ConnectionError` if the server cannot be reached.
    pub fn connect(self, params: &ConnectParams) -> Result<PostgresConnection, SqlGateError> {
        PostgresConnection::connect_with(params, &self.finish())
    }
}

/// Quote `ident` as a PostgreSQL identifier.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
