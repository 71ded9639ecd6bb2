use std::cell::{Ref, RefCell};
use std::future::Future;
use std::rc::Rc;

use tokio::runtime::Runtime;
use tokio_postgres::{Client, Config, NoTls};
use tracing::{debug, warn};

use crate::error::SqlGateError;
use crate::reconnect::Transport;

use super::config::quote_ident;

/// One live (or dead) PostgreSQL session plus the runtime that drives it.
///
/// The connection task is spawned on a private current-thread runtime, so it only makes
/// progress while a call is blocked in [`PgSession::block_on`].
pub struct PgSession {
    runtime: Runtime,
    config: Config,
    schema: String,
    probe_liveness: bool,
    client: Option<Client>,
    generation: u64,
}

impl PgSession {
    /// Open a session and select `schema`, creating it if absent.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` if the runtime cannot start, the server cannot be
    /// reached, or the schema cannot be provisioned.
    pub fn open(config: Config, schema: &str, probe_liveness: bool) -> Result<Self, SqlGateError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                SqlGateError::ConnectionError(format!("Failed to start postgres runtime: {e}"))
            })?;
        let mut session = Self {
            runtime,
            config,
            schema: schema.to_string(),
            probe_liveness,
            client: None,
            generation: 0,
        };
        session.client = Some(session.establish()?);
        Ok(session)
    }

    fn establish(&self) -> Result<Client, SqlGateError> {
        let (client, connection) = self
            .runtime
            .block_on(self.config.connect(NoTls))
            .map_err(|e| SqlGateError::ConnectionError(format!("Failed to connect: {e}")))?;
        self.runtime.spawn(async move {
            if let Err(e) = connection.await {
                warn!("postgres connection task ended: {e}");
            }
        });

        let schema = quote_ident(&self.schema);
        self.runtime
            .block_on(client.batch_execute(&format!(
                "CREATE SCHEMA IF NOT EXISTS {schema}; SET search_path TO {schema};"
            )))
            .map_err(|e| {
                SqlGateError::ConnectionError(format!(
                    "Failed to select schema {}: {e}",
                    self.schema
                ))
            })?;
        debug!(schema = %self.schema, "postgres session ready");
        Ok(client)
    }

    /// Run `future` to completion on the session's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// The native client.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` once the session has been shut down.
    pub fn client(&self) -> Result<&Client, SqlGateError> {
        self.client
            .as_ref()
            .ok_or_else(|| SqlGateError::ConnectionError("PostgreSQL connection is closed".into()))
    }

    /// Incremented every time the session is re-established.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Drop the client; the connection task ends with it.
    pub fn shut_down(&mut self) {
        if self.client.take().is_some() {
            // let the connection task observe the closed channel
            self.runtime.block_on(tokio::task::yield_now());
        }
    }
}

impl Transport for PgSession {
    fn is_alive(&mut self) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        if client.is_closed() {
            return false;
        }
        !self.probe_liveness || self.runtime.block_on(client.check_connection()).is_ok()
    }

    fn reopen(&mut self) -> Result<(), SqlGateError> {
        self.client = None;
        let client = self.establish()?;
        self.client = Some(client);
        self.generation += 1;
        Ok(())
    }
}

/// Shared handle to a [`PgSession`], held by the connection and every statement it creates.
#[derive(Clone)]
pub struct SessionHandle(Rc<RefCell<PgSession>>);

impl SessionHandle {
    #[must_use]
    pub fn new(session: PgSession) -> Self {
        Self(Rc::new(RefCell::new(session)))
    }

    /// Borrow the session for the duration of one native call.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, PgSession> {
        self.0.borrow()
    }

    pub fn shut_down(&self) {
        self.0.borrow_mut().shut_down();
    }
}

impl Transport for SessionHandle {
    fn is_alive(&mut self) -> bool {
        self.0.borrow_mut().is_alive()
    }

    fn reopen(&mut self) -> Result<(), SqlGateError> {
        self.0.borrow_mut().reopen()
    }
}
