use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::ValueRef;

use crate::error::SqlGateError;
use crate::results::Materializer;
use crate::types::NativeValue;

/// Convert one `SQLite` column value into a `NativeValue`.
#[must_use]
pub fn sqlite_extract_value(value: ValueRef<'_>) -> NativeValue {
    match value {
        ValueRef::Null => NativeValue::Null,
        ValueRef::Integer(i) => NativeValue::I64(i),
        ValueRef::Real(f) => NativeValue::F64(f),
        ValueRef::Text(bytes) => NativeValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => NativeValue::Blob(bytes.to_vec()),
    }
}

/// Bind `args`, run `stmt` and feed every row into `sink`.
///
/// The statement is reset when the row cursor is dropped, on success or failure.
///
/// # Errors
/// Returns `SqlGateError::ExecutionError` with `sql` attached if binding, stepping or reading a
/// column fails.
pub fn run_statement<M: Materializer>(
    stmt: &mut Statement<'_>,
    sql: &str,
    args: &[&str],
    mut sink: M,
) -> Result<M::Output, SqlGateError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();
    sink.begin(Arc::new(column_names));

    let mut rows = stmt
        .query(rusqlite::params_from_iter(args.iter()))
        .map_err(|e| SqlGateError::execution(sql, e))?;

    let mut values = Vec::with_capacity(col_count);
    while let Some(row) = rows.next().map_err(|e| SqlGateError::execution(sql, e))? {
        values.clear();
        for i in 0..col_count {
            let value = row
                .get_ref(i)
                .map_err(|e| SqlGateError::execution(sql, e))?;
            values.push(sqlite_extract_value(value));
        }
        sink.push_row(&values);
    }

    Ok(sink.finish())
}

/// Run `stmt` and discard whatever it returns.
///
/// # Errors
/// Returns `SqlGateError::ExecutionError` with `sql` attached on failure.
pub fn drain_statement(stmt: &mut Statement<'_>, sql: &str) -> Result<(), SqlGateError> {
    let mut rows = stmt
        .query([])
        .map_err(|e| SqlGateError::execution(sql, e))?;
    while rows
        .next()
        .map_err(|e| SqlGateError::execution(sql, e))?
        .is_some()
    {}
    Ok(())
}
