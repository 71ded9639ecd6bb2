use std::error::Error;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use pg_bigdecimal::PgNumeric;
use tokio_postgres::Statement;
use tokio_postgres::types::{FromSql, Kind, Type};

use crate::error::SqlGateError;
use crate::results::Materializer;
use crate::types::NativeValue;

/// Whether values of `ty` have an encoding rule.
#[must_use]
pub fn is_supported_type(ty: &Type) -> bool {
    match *ty {
        Type::BOOL
        | Type::CHAR
        | Type::INT2
        | Type::INT4
        | Type::INT8
        | Type::OID
        | Type::FLOAT4
        | Type::FLOAT8
        | Type::NUMERIC
        | Type::TEXT
        | Type::VARCHAR
        | Type::BPCHAR
        | Type::NAME
        | Type::UNKNOWN
        | Type::BYTEA
        | Type::JSON
        | Type::JSONB
        | Type::DATE
        | Type::TIME
        | Type::TIMESTAMP
        | Type::TIMESTAMPTZ => true,
        _ => matches!(ty.kind(), Kind::Enum(_)),
    }
}

/// A column value decoded straight into a [`NativeValue`].
///
/// Accepts every type; callers check [`is_supported_type`] first so unsupported columns are
/// reported by name.
#[derive(Debug)]
pub struct PgValue(pub NativeValue);

impl<'a> FromSql<'a> for PgValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let value = match *ty {
            Type::BOOL => NativeValue::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => NativeValue::I16(i16::from_sql(ty, raw)?),
            Type::INT4 => NativeValue::I32(i32::from_sql(ty, raw)?),
            Type::INT8 => NativeValue::I64(i64::from_sql(ty, raw)?),
            Type::OID => NativeValue::U32(u32::from_sql(ty, raw)?),
            Type::FLOAT4 => NativeValue::F32(f32::from_sql(ty, raw)?),
            Type::FLOAT8 => NativeValue::F64(f64::from_sql(ty, raw)?),
            Type::NUMERIC => PgNumeric::from_sql(ty, raw)?.into(),
            Type::BYTEA => NativeValue::Blob(raw.to_vec()),
            Type::JSON | Type::JSONB => {
                NativeValue::Json(serde_json::Value::from_sql(ty, raw)?)
            }
            Type::DATE => NativeValue::Date(NaiveDate::from_sql(ty, raw)?),
            Type::TIME => NativeValue::Time(NaiveTime::from_sql(ty, raw)?),
            Type::TIMESTAMP => NativeValue::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => NativeValue::TimestampTz(DateTime::<Utc>::from_sql(ty, raw)?),
            // text-like, single-byte "char" and enum labels
            _ => NativeValue::Text(String::from_utf8_lossy(raw).into_owned()),
        };
        Ok(PgValue(value))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(PgValue(NativeValue::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Extracts a `NativeValue` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `SqlGateError::UnsupportedColumnType` for columns without an encoding rule, or
/// `SqlGateError::ExecutionError` if the raw value cannot be decoded.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
    sql: &str,
) -> Result<NativeValue, SqlGateError> {
    let column = &row.columns()[idx];
    let ty = column.type_();
    if !is_supported_type(ty) {
        return Err(SqlGateError::unsupported_column(
            column.name(),
            format!("{} ({})", ty.name(), ty.oid()),
        ));
    }
    row.try_get::<_, PgValue>(idx)
        .map(|v| v.0)
        .map_err(|e| SqlGateError::execution(sql, e))
}

/// Feed fetched rows into `sink`, using the statement's column list for names.
///
/// # Errors
/// Returns the first extraction failure; rows already pushed are discarded with the sink.
pub fn build_result<M: Materializer>(
    stmt: &Statement,
    rows: &[tokio_postgres::Row],
    sql: &str,
    mut sink: M,
) -> Result<M::Output, SqlGateError> {
    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = column_names.len();
    sink.begin(Arc::new(column_names));

    let mut values = Vec::with_capacity(column_count);
    for row in rows {
        values.clear();
        for idx in 0..column_count {
            values.push(postgres_extract_value(row, idx, sql)?);
        }
        sink.push_row(&values);
    }

    Ok(sink.finish())
}
