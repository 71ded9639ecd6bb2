use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use pg_bigdecimal::PgNumeric;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

/// A positional text argument, converted on the wire to whatever type the server inferred for
/// its placeholder.
#[derive(Debug, Clone, Copy)]
pub struct TextArg<'a>(pub &'a str);

/// Convert a slice of text arguments into the reference list `tokio_postgres` expects.
#[must_use]
pub fn convert_args<'a>(args: &'a [TextArg<'a>]) -> Vec<&'a (dyn ToSql + Sync)> {
    let mut references = Vec::with_capacity(args.len());
    for a in args {
        references.push(a as &(dyn ToSql + Sync));
    }
    references
}

fn parse_bool(text: &str) -> Result<bool, Box<dyn Error + Sync + Send>> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "n" | "no" | "off" => Ok(false),
        _ => Err(format!("`{text}` is not a boolean").into()),
    }
}

fn parse_numeric(text: &str) -> Result<PgNumeric, Box<dyn Error + Sync + Send>> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("nan") {
        return Ok(PgNumeric { n: None });
    }
    Ok(PgNumeric {
        n: Some(text.parse()?),
    })
}

/// `"char"` holds exactly one byte.
fn parse_char(text: &str) -> Result<i8, Box<dyn Error + Sync + Send>> {
    match text.as_bytes() {
        [byte] => Ok(i8::from_ne_bytes([*byte])),
        _ => Err(format!("`{text}` is not a single-byte character").into()),
    }
}

fn parse_timestamp(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
}

fn parse_timestamptz(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| parse_timestamp(text).map(|naive| naive.and_utc()))
}

impl ToSql for TextArg<'_> {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        let text = self.0;
        match *ty {
            Type::BOOL => parse_bool(text)?.to_sql(ty, out),
            Type::CHAR => parse_char(text)?.to_sql(ty, out),
            Type::INT2 => text.trim().parse::<i16>()?.to_sql(ty, out),
            Type::INT4 => text.trim().parse::<i32>()?.to_sql(ty, out),
            Type::INT8 => text.trim().parse::<i64>()?.to_sql(ty, out),
            Type::OID => text.trim().parse::<u32>()?.to_sql(ty, out),
            Type::FLOAT4 => text.trim().parse::<f32>()?.to_sql(ty, out),
            Type::FLOAT8 => text.trim().parse::<f64>()?.to_sql(ty, out),
            Type::NUMERIC => parse_numeric(text)?.to_sql(ty, out),
            Type::BYTEA => text.as_bytes().to_sql(ty, out),
            Type::JSON | Type::JSONB => {
                serde_json::from_str::<serde_json::Value>(text)?.to_sql(ty, out)
            }
            Type::DATE => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")?.to_sql(ty, out),
            Type::TIME => NaiveTime::parse_from_str(text.trim(), "%H:%M:%S%.f")?.to_sql(ty, out),
            Type::TIMESTAMP => parse_timestamp(text)?.to_sql(ty, out),
            Type::TIMESTAMPTZ => parse_timestamptz(text)?.to_sql(ty, out),
            _ => text.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
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
            | Type::BYTEA
            | Type::JSON
            | Type::JSONB
            | Type::DATE
            | Type::TIME
            | Type::TIMESTAMP
            | Type::TIMESTAMPTZ => true,
            // enum labels travel as their text
            _ => matches!(ty.kind(), Kind::Enum(_)) || <&str as ToSql>::accepts(ty),
        }
    }

    to_sql_checked!();
}
