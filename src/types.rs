use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SqlGateError;

/// One column value as decoded from a native client, before encoding.
///
/// Every backend maps its own type system onto this enum so the encoder only has to know one
/// set of rules:
/// ```rust
/// use sqlgate::prelude::*;
///
/// assert_eq!(NativeValue::U8(200).encode(), "200");
/// assert_eq!(NativeValue::Null.encode(), "");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// NULL value
    Null,
    /// Text/string value
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
    /// Boolean value
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Fixed-point value, kept as the exact decimal text
    Decimal(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    /// JSON value
    Json(JsonValue),
}

#[cfg(any(feature = "postgres", feature = "driver"))]
impl From<pg_bigdecimal::PgNumeric> for NativeValue {
    /// NUMERIC keeps the scale the server reported; `NaN` has no decimal form.
    fn from(numeric: pg_bigdecimal::PgNumeric) -> Self {
        NativeValue::Decimal(numeric.n.map_or_else(|| "NaN".to_string(), |n| n.to_string()))
    }
}

/// Identifies which backend realization produced a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendTag {
    /// Embedded, file-based `SQLite`
    Sqlite,
    /// Client-server `PostgreSQL`
    Postgres,
    /// Driver registry selected by data-source URL
    #[serde(rename = "driver")]
    DriverManager,
}

impl BackendTag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendTag::Sqlite => "sqlite",
            BackendTag::Postgres => "postgres",
            BackendTag::DriverManager => "driver",
        }
    }
}

impl fmt::Display for BackendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendTag {
    type Err = SqlGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(BackendTag::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(BackendTag::Postgres),
            "driver" | "driver_manager" | "any" => Ok(BackendTag::DriverManager),
            other => Err(SqlGateError::ConfigError(format!(
                "unknown backend `{other}`"
            ))),
        }
    }
}
