use tracing::{info, warn};

use crate::cache::StatementCache;
use crate::error::SqlGateError;
use crate::statement::PreparedStatement;

/// A native session that can die and be re-established in place.
pub trait Transport {
    /// Whether the session can still carry requests.
    fn is_alive(&mut self) -> bool;

    /// Tear down the dead session, open a new one and restore session state
    /// (auto-commit, active schema).
    ///
    /// # Errors
    /// Returns [`SqlGateError::ConnectionError`] if the session cannot be re-established.
    fn reopen(&mut self) -> Result<(), SqlGateError>;
}

/// Detects dead transports and rebuilds the statement cache after reopening them.
#[derive(Debug, Default)]
pub struct ReconnectManager {
    reconnects: u64,
}

impl ReconnectManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful reconnects performed so far.
    #[must_use]
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// Make sure `transport` is usable before a request runs.
    ///
    /// Returns `true` when a reconnect happened. After a reconnect every cached statement has
    /// been rebuilt exactly once; the set of cached texts is unchanged.
    ///
    /// # Errors
    /// Any failure while reopening or rebuilding is reported as
    /// [`SqlGateError::ConnectionError`].
    pub fn ensure_alive<T, S>(
        &mut self,
        transport: &mut T,
        cache: &mut StatementCache<S>,
    ) -> Result<bool, SqlGateError>
    where
        T: Transport + ?Sized,
        S: PreparedStatement,
    {
        if transport.is_alive() {
            return Ok(false);
        }

        warn!("transport is dead; reconnecting");
        transport.reopen().map_err(|e| match e {
            SqlGateError::ConnectionError(_) => e,
            other => SqlGateError::ConnectionError(format!("reconnect failed: {other}")),
        })?;
        let rebuilt = cache.rebuild_all().map_err(|e| {
            SqlGateError::ConnectionError(format!(
                "reconnected, but rebuilding cached statements failed: {e}"
            ))
        })?;
        self.reconnects += 1;
        info!(rebuilt, "reconnected and rebuilt cached statements");
        Ok(true)
    }
}
