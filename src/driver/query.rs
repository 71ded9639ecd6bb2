use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use pg_bigdecimal::PgNumeric;
use postgres_types::{FromSql, Type};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgRow, PgTypeKind};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, ColumnIndex, Decode, Row, TypeInfo, ValueRef};

use crate::error::SqlGateError;
use crate::results::Materializer;
use crate::types::NativeValue;

/// Decoding of one driver's row values into [`NativeValue`].
///
/// Each driver picks the decoder from the type the value arrived with, so a column declared
/// with a type the driver cannot describe still yields its text.
pub trait ExtractValue: Row {
    /// # Errors
    /// Returns `SqlGateError::UnsupportedColumnType` for types without an encoding rule, or
    /// `SqlGateError::ExecutionError` if the driver cannot decode the value.
    fn extract_value(&self, idx: usize, sql: &str) -> Result<NativeValue, SqlGateError>;
}

fn decode<'r, R, T>(row: &'r R, idx: usize, sql: &str) -> Result<T, SqlGateError>
where
    R: Row,
    usize: ColumnIndex<R>,
    T: Decode<'r, R::Database>,
{
    row.try_get_unchecked::<T, _>(idx)
        .map_err(|e| SqlGateError::execution(sql, e))
}

fn unsupported<R: Row>(row: &R, idx: usize, type_name: &str) -> SqlGateError {
    let column = row.columns().get(idx).map_or("?", |c| c.name());
    SqlGateError::unsupported_column(column, type_name)
}

impl ExtractValue for SqliteRow {
    fn extract_value(&self, idx: usize, sql: &str) -> Result<NativeValue, SqlGateError> {
        let raw = self
            .try_get_raw(idx)
            .map_err(|e| SqlGateError::execution(sql, e))?;
        if raw.is_null() {
            return Ok(NativeValue::Null);
        }
        // storage class of the value, not the declared column type
        let value = match raw.type_info().name() {
            "INTEGER" | "BOOLEAN" => NativeValue::I64(decode(self, idx, sql)?),
            "REAL" => NativeValue::F64(decode(self, idx, sql)?),
            "BLOB" => NativeValue::Blob(decode(self, idx, sql)?),
            "TEXT" | "NUMERIC" | "DATE" | "TIME" | "DATETIME" => {
                NativeValue::Text(decode(self, idx, sql)?)
            }
            other => return Err(unsupported(self, idx, other)),
        };
        Ok(value)
    }
}

impl ExtractValue for PgRow {
    fn extract_value(&self, idx: usize, sql: &str) -> Result<NativeValue, SqlGateError> {
        let raw = self
            .try_get_raw(idx)
            .map_err(|e| SqlGateError::execution(sql, e))?;
        if raw.is_null() {
            return Ok(NativeValue::Null);
        }
        let type_info = raw.type_info();
        let value = match type_info.name() {
            "BOOL" => NativeValue::Bool(decode(self, idx, sql)?),
            "INT2" => NativeValue::I16(decode(self, idx, sql)?),
            "INT4" => NativeValue::I32(decode(self, idx, sql)?),
            "INT8" => NativeValue::I64(decode(self, idx, sql)?),
            "OID" => NativeValue::U32(decode::<_, Oid>(self, idx, sql)?.0),
            "FLOAT4" => NativeValue::F32(decode(self, idx, sql)?),
            "FLOAT8" => NativeValue::F64(decode(self, idx, sql)?),
            "NUMERIC" => {
                let bytes = raw
                    .as_bytes()
                    .map_err(|e| SqlGateError::execution(sql, e))?;
                PgNumeric::from_sql(&Type::NUMERIC, bytes)
                    .map_err(|e| SqlGateError::execution(sql, e))?
                    .into()
            }
            // single-byte "char"
            "\"CHAR\"" => {
                let bytes = raw
                    .as_bytes()
                    .map_err(|e| SqlGateError::execution(sql, e))?;
                NativeValue::Text(String::from_utf8_lossy(bytes).into_owned())
            }
            "TEXT" | "VARCHAR" | "CHAR" | "NAME" | "UNKNOWN" | "CITEXT" | "citext" => {
                NativeValue::Text(decode(self, idx, sql)?)
            }
            "BYTEA" => NativeValue::Blob(decode(self, idx, sql)?),
            "JSON" | "JSONB" => NativeValue::Json(decode(self, idx, sql)?),
            "DATE" => NativeValue::Date(decode::<_, NaiveDate>(self, idx, sql)?),
            "TIME" => NativeValue::Time(decode::<_, NaiveTime>(self, idx, sql)?),
            "TIMESTAMP" => NativeValue::Timestamp(decode::<_, NaiveDateTime>(self, idx, sql)?),
            "TIMESTAMPTZ" => {
                NativeValue::TimestampTz(decode::<_, DateTime<Utc>>(self, idx, sql)?)
            }
            // enum labels travel as their text
            _ if matches!(type_info.kind(), PgTypeKind::Enum(_)) => {
                NativeValue::Text(decode(self, idx, sql)?)
            }
            other => return Err(unsupported(self, idx, other)),
        };
        Ok(value)
    }
}

impl ExtractValue for MySqlRow {
    fn extract_value(&self, idx: usize, sql: &str) -> Result<NativeValue, SqlGateError> {
        let raw = self
            .try_get_raw(idx)
            .map_err(|e| SqlGateError::execution(sql, e))?;
        if raw.is_null() {
            return Ok(NativeValue::Null);
        }
        let value = match raw.type_info().name() {
            "BOOLEAN" => NativeValue::Bool(decode(self, idx, sql)?),
            "TINYINT" => NativeValue::I8(decode(self, idx, sql)?),
            "SMALLINT" => NativeValue::I16(decode(self, idx, sql)?),
            "INT" | "MEDIUMINT" => NativeValue::I32(decode(self, idx, sql)?),
            "BIGINT" => NativeValue::I64(decode(self, idx, sql)?),
            "TINYINT UNSIGNED" => NativeValue::U8(decode(self, idx, sql)?),
            "SMALLINT UNSIGNED" | "YEAR" => NativeValue::U16(decode(self, idx, sql)?),
            "INT UNSIGNED" | "MEDIUMINT UNSIGNED" => NativeValue::U32(decode(self, idx, sql)?),
            "BIGINT UNSIGNED" => NativeValue::U64(decode(self, idx, sql)?),
            "FLOAT" => NativeValue::F32(decode(self, idx, sql)?),
            "DOUBLE" => NativeValue::F64(decode(self, idx, sql)?),
            // the server sends DECIMAL as its exact text
            "DECIMAL" => NativeValue::Decimal(decode(self, idx, sql)?),
            "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
            | "SET" => NativeValue::Text(decode(self, idx, sql)?),
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
                NativeValue::Blob(decode(self, idx, sql)?)
            }
            "JSON" => NativeValue::Json(decode(self, idx, sql)?),
            "DATE" => NativeValue::Date(decode::<_, NaiveDate>(self, idx, sql)?),
            "TIME" => NativeValue::Time(decode::<_, NaiveTime>(self, idx, sql)?),
            "DATETIME" => NativeValue::Timestamp(decode::<_, NaiveDateTime>(self, idx, sql)?),
            "TIMESTAMP" => {
                NativeValue::TimestampTz(decode::<_, DateTime<Utc>>(self, idx, sql)?)
            }
            other => return Err(unsupported(self, idx, other)),
        };
        Ok(value)
    }
}

/// Column names in declaration order.
#[must_use]
pub fn column_names<C: Column>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

/// Feed fetched rows into `sink`.
///
/// `names` comes from the prepared statement; when the driver reported none, the first row's
/// columns are used instead.
///
/// # Errors
/// Returns the first extraction failure.
pub fn build_result<R: ExtractValue, M: Materializer>(
    names: Vec<String>,
    rows: &[R],
    sql: &str,
    mut sink: M,
) -> Result<M::Output, SqlGateError> {
    let names = match rows.first() {
        Some(first) if names.is_empty() => column_names(first.columns()),
        _ => names,
    };
    let column_count = names.len();
    sink.begin(Arc::new(names));

    let mut values = Vec::with_capacity(column_count);
    for row in rows {
        values.clear();
        for idx in 0..column_count {
            values.push(row.extract_value(idx, sql)?);
        }
        sink.push_row(&values);
    }
    Ok(sink.finish())
}
