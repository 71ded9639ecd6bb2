//! Canonical text encoding of column values.
//!
//! Rows and JSON documents both go through [`NativeValue::encode`], so the two result shapes
//! always agree on how a value is spelled. NULL becomes the empty string in both shapes, which
//! makes it indistinguishable from a genuine empty string.

use crate::types::NativeValue;

impl NativeValue {
    /// Canonical string form of this value.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NativeValue::Null => String::new(),
            NativeValue::Text(s) => s.clone(),
            NativeValue::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            NativeValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            NativeValue::I8(v) => v.to_string(),
            NativeValue::I16(v) => v.to_string(),
            NativeValue::I32(v) => v.to_string(),
            NativeValue::I64(v) => v.to_string(),
            NativeValue::U8(v) => v.to_string(),
            NativeValue::U16(v) => v.to_string(),
            NativeValue::U32(v) => v.to_string(),
            NativeValue::U64(v) => v.to_string(),
            NativeValue::F32(v) => v.to_string(),
            NativeValue::F64(v) => v.to_string(),
            NativeValue::Decimal(s) => s.clone(),
            NativeValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            NativeValue::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            NativeValue::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            NativeValue::TimestampTz(ts) => ts.to_rfc3339(),
            NativeValue::Json(v) => v.to_string(),
        }
    }

    /// Canonical string form, escaped for use inside a JSON string literal.
    #[must_use]
    pub fn encode_json(&self) -> String {
        json_escape(&self.encode())
    }
}

/// Escape `s` for embedding between double quotes in a JSON document.
///
/// Uses `serde_json`'s string escaper: `\b \f \n \r \t` get their short forms, other control
/// characters become lowercase `\u00XX`.
#[must_use]
pub fn json_escape(s: &str) -> String {
    match serde_json::to_string(s) {
        Ok(quoted) => quoted
            .strip_prefix('"')
            .and_then(|q| q.strip_suffix('"'))
            .unwrap_or_default()
            .to_string(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn integers_parse_back_exactly() {
        assert_eq!(NativeValue::I8(i8::MIN).encode().parse::<i8>().unwrap(), i8::MIN);
        assert_eq!(NativeValue::I16(-12_345).encode().parse::<i16>().unwrap(), -12_345);
        assert_eq!(NativeValue::I32(i32::MAX).encode().parse::<i32>().unwrap(), i32::MAX);
        assert_eq!(NativeValue::I64(i64::MIN).encode().parse::<i64>().unwrap(), i64::MIN);
        assert_eq!(NativeValue::U8(u8::MAX).encode().parse::<u8>().unwrap(), u8::MAX);
        assert_eq!(NativeValue::U16(65_535).encode().parse::<u16>().unwrap(), 65_535);
        assert_eq!(NativeValue::U32(u32::MAX).encode().parse::<u32>().unwrap(), u32::MAX);
        assert_eq!(NativeValue::U64(u64::MAX).encode().parse::<u64>().unwrap(), u64::MAX);
    }

    #[test]
    fn floats_round_trip() {
        for v in [0.1_f64, -2.5e-300, 1.0 / 3.0, 123_456_789.125, f64::MAX] {
            assert_eq!(NativeValue::F64(v).encode().parse::<f64>().unwrap(), v);
        }
        for v in [0.1_f32, -7.25, f32::MIN_POSITIVE] {
            assert_eq!(NativeValue::F32(v).encode().parse::<f32>().unwrap(), v);
        }
        assert_eq!(NativeValue::F64(2.0).encode(), "2");
    }

    #[test]
    fn null_encodes_empty_in_both_shapes() {
        assert_eq!(NativeValue::Null.encode(), "");
        assert_eq!(NativeValue::Null.encode_json(), "");
    }

    #[test]
    fn bool_decimal_and_blob_spellings() {
        assert_eq!(NativeValue::Bool(true).encode(), "1");
        assert_eq!(NativeValue::Bool(false).encode(), "0");
        assert_eq!(NativeValue::Decimal("-10.500".into()).encode(), "-10.500");
        assert_eq!(NativeValue::Blob(b"abc".to_vec()).encode(), "abc");
        assert_eq!(NativeValue::Blob(vec![0x61, 0xff]).encode(), "a\u{fffd}");
    }

    #[test]
    fn temporal_values_use_fixed_formats() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(NativeValue::Date(date).encode(), "2024-02-29");
        let ts = date.and_hms_opt(13, 5, 9).unwrap();
        assert_eq!(NativeValue::Timestamp(ts).encode(), "2024-02-29 13:05:09");
        let tz = Utc.from_utc_datetime(&ts);
        assert_eq!(NativeValue::TimestampTz(tz).encode(), "2024-02-29T13:05:09+00:00");
    }

    #[test]
    fn escapes_quotes_backslashes_and_controls() {
        assert_eq!(json_escape(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(json_escape("a\\b"), "a\\\\b");
        assert_eq!(json_escape("\u{08}\u{0c}\n\r\t"), "\\b\\f\\n\\r\\t");
        assert_eq!(json_escape("\u{01}\u{1f}"), "\\u0001\\u001f");
        assert_eq!(json_escape("\u{1b}"), "\\u001b");
        assert_eq!(json_escape("grüße"), "grüße");
        assert_eq!(json_escape(""), "");
        assert_eq!(json_escape("\""), "\\\"");
    }

    #[test]
    fn escaped_text_round_trips_through_a_json_parser() {
        let original = "quote \" backslash \\ newline \n tab \t bell \u{07}";
        let literal = format!("\"{}\"", NativeValue::Text(original.into()).encode_json());
        let parsed: String = serde_json::from_str(&literal).unwrap();
        assert_eq!(parsed, original);
    }
}
