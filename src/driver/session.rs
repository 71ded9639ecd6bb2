use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use sqlx::{Connection, MySqlConnection, PgConnection, SqliteConnection};
use tokio::runtime::Runtime;

use crate::error::SqlGateError;

/// Drivers installed in the registry, looked up by URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    Sqlite,
    Postgres,
    MySql,
}

impl Driver {
    /// The installed driver for `url`'s scheme.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` if no driver handles the scheme.
    pub fn for_url(url: &str) -> Result<Self, SqlGateError> {
        match url.split_once(':').map(|(scheme, _)| scheme) {
            Some("sqlite") => Ok(Driver::Sqlite),
            Some("postgres" | "postgresql") => Ok(Driver::Postgres),
            Some("mysql" | "mariadb") => Ok(Driver::MySql),
            Some(other) => Err(SqlGateError::ConnectionError(format!(
                "No driver installed for scheme `{other}`"
            ))),
            None => Err(SqlGateError::ConnectionError(
                "Data source URL has no scheme".into(),
            )),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Driver::Sqlite => "SQLite",
            Driver::Postgres => "PostgreSQL",
            Driver::MySql => "MySQL",
        }
    }
}

/// A live connection owned by one of the installed drivers.
pub enum NativeConnection {
    Sqlite(SqliteConnection),
    Postgres(PgConnection),
    MySql(MySqlConnection),
}

impl NativeConnection {
    async fn open(driver: Driver, url: &str) -> Result<Self, sqlx::Error> {
        Ok(match driver {
            Driver::Sqlite => NativeConnection::Sqlite(SqliteConnection::connect(url).await?),
            Driver::Postgres => NativeConnection::Postgres(PgConnection::connect(url).await?),
            Driver::MySql => NativeConnection::MySql(MySqlConnection::connect(url).await?),
        })
    }

    async fn run_script(&mut self, script: &str) -> Result<(), sqlx::Error> {
        match self {
            NativeConnection::Sqlite(c) => sqlx::raw_sql(script).execute(c).await.map(drop),
            NativeConnection::Postgres(c) => sqlx::raw_sql(script).execute(c).await.map(drop),
            NativeConnection::MySql(c) => sqlx::raw_sql(script).execute(c).await.map(drop),
        }
    }

    async fn close(self) -> Result<(), sqlx::Error> {
        match self {
            NativeConnection::Sqlite(c) => c.close().await,
            NativeConnection::Postgres(c) => c.close().await,
            NativeConnection::MySql(c) => c.close().await,
        }
    }
}

/// A driver-manager connection plus the runtime that drives it.
pub struct DriverSession {
    runtime: Runtime,
    conn: Option<NativeConnection>,
    driver: Driver,
    source: String,
}

impl DriverSession {
    /// Open `url` through the installed driver for its scheme.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` carrying the driver's diagnostic.
    pub fn open(url: &str, source: String) -> Result<Self, SqlGateError> {
        let driver = Driver::for_url(url)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                SqlGateError::ConnectionError(format!("Failed to start driver runtime: {e}"))
            })?;
        let conn = runtime
            .block_on(NativeConnection::open(driver, url))
            .map_err(|e| {
                SqlGateError::ConnectionError(format!("Failed to connect to {source}: {e}"))
            })?;
        Ok(Self {
            runtime,
            conn: Some(conn),
            driver,
            source,
        })
    }

    #[must_use]
    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// Data source, with any password redacted.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Runtime and live connection, borrowed together for one native call.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` once the session has been closed.
    pub fn parts(&mut self) -> Result<(&Runtime, &mut NativeConnection), SqlGateError> {
        let conn = self.conn.as_mut().ok_or_else(|| {
            SqlGateError::ConnectionError("Driver manager connection is closed".into())
        })?;
        Ok((&self.runtime, conn))
    }

    /// Run `script` (one or more statements) without preparing it.
    ///
    /// # Errors
    /// Returns `SqlGateError::ExecutionError` with the driver's diagnostic.
    pub fn run_script(&mut self, script: &str) -> Result<(), SqlGateError> {
        let (runtime, conn) = self.parts()?;
        runtime
            .block_on(conn.run_script(script))
            .map_err(|e| SqlGateError::execution(script, e))
    }

    /// Close the native connection. Later calls fail with a connection error.
    ///
    /// # Errors
    /// Returns `SqlGateError::ConnectionError` if the driver reports a failure while closing.
    pub fn close(&mut self) -> Result<(), SqlGateError> {
        match self.conn.take() {
            Some(conn) => self.runtime.block_on(conn.close()).map_err(|e| {
                SqlGateError::ConnectionError(format!("Failed to close {}: {e}", self.source))
            }),
            None => Ok(()),
        }
    }
}

/// Shared handle to a [`DriverSession`].
#[derive(Clone)]
pub struct DriverHandle(Rc<RefCell<DriverSession>>);

impl DriverHandle {
    #[must_use]
    pub fn new(session: DriverSession) -> Self {
        Self(Rc::new(RefCell::new(session)))
    }

    /// Exclusive access for the duration of one native call.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, DriverSession> {
        self.0.borrow_mut()
    }
}
