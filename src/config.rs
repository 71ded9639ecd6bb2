use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SqlGateError;

/// Connection parameters shared by every backend.
///
/// Each backend reads only the subset it needs: `SQLite` only looks at `target`, the
/// client-server backend uses all of them, and the driver manager resolves `target` as a data
/// source and completes it with the principal and credential.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParams {
    pub target: String,
    pub host: Option<String>,
    pub socket: Option<PathBuf>,
    pub principal: Option<String>,
    pub credential: Option<String>,
    pub port: Option<u16>,
}

impl ConnectParams {
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn builder(target: impl Into<String>) -> ConnectParamsBuilder {
        ConnectParamsBuilder::new(target)
    }

    /// Read parameters from `<PREFIX>_TARGET`, `_HOST`, `_SOCKET`, `_USER`, `_PASSWORD` and
    /// `_PORT`. Unset or empty variables stay `None`.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConfigError` if the target is missing or the port is not a valid
    /// `u16`.
    pub fn from_env(prefix: &str) -> Result<Self, SqlGateError> {
        let var = |suffix: &str| {
            std::env::var(format!("{prefix}_{suffix}"))
                .ok()
                .filter(|v| !v.is_empty())
        };

        let target = var("TARGET").ok_or_else(|| {
            SqlGateError::ConfigError(format!("{prefix}_TARGET is required"))
        })?;
        let port = var("PORT")
            .map(|p| {
                p.parse::<u16>().map_err(|e| {
                    SqlGateError::ConfigError(format!("{prefix}_PORT `{p}` is not a port: {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            target,
            host: var("HOST"),
            socket: var("SOCKET").map(PathBuf::from),
            principal: var("USER"),
            credential: var("PASSWORD"),
            port,
        })
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("target", &self.target)
            .field("host", &self.host)
            .field("socket", &self.socket)
            .field("principal", &self.principal)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("port", &self.port)
            .finish()
    }
}

/// Fluent builder for [`ConnectParams`].
#[derive(Debug, Clone)]
pub struct ConnectParamsBuilder {
    params: ConnectParams,
}

impl ConnectParamsBuilder {
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            params: ConnectParams::new(target),
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.params.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn socket(mut self, socket: impl Into<PathBuf>) -> Self {
        self.params.socket = Some(socket.into());
        self
    }

    #[must_use]
    pub fn principal(mut self, principal: impl Into<String>) -> Self {
        self.params.principal = Some(principal.into());
        self
    }

    #[must_use]
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.params.credential = Some(credential.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.params.port = Some(port);
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectParams {
        self.params
    }
}
