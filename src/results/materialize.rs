use std::sync::Arc;

use crate::encoding::json_escape;
use crate::types::NativeValue;

use super::row::Row;

/// Sink fed by a backend's fetch loop.
///
/// Backends call [`Materializer::begin`] once with the projected column names, then
/// [`Materializer::push_row`] for every fetched row, and finally [`Materializer::finish`].
pub trait Materializer {
    type Output;

    fn begin(&mut self, column_names: Arc<Vec<String>>);

    fn push_row(&mut self, values: &[NativeValue]);

    fn finish(self) -> Self::Output;
}

/// Collects fetched rows into [`Row`]s.
#[derive(Debug, Default)]
pub struct RowCollector {
    column_names: Arc<Vec<String>>,
    rows: Vec<Row>,
}

impl Materializer for RowCollector {
    type Output = Vec<Row>;

    fn begin(&mut self, column_names: Arc<Vec<String>>) {
        self.column_names = column_names;
    }

    fn push_row(&mut self, values: &[NativeValue]) {
        let encoded = values.iter().map(NativeValue::encode).collect();
        self.rows
            .push(Row::new(Arc::clone(&self.column_names), encoded));
    }

    fn finish(self) -> Vec<Row> {
        self.rows
    }
}

/// Builds the JSON array-of-objects document.
///
/// Every value is emitted as a JSON string. The layout is fixed:
/// ```text
/// [
/// {
/// "a" : "1",
/// "b" : "x"
/// }
/// ]
/// ```
/// and an empty result is `"[\n]\n"`.
#[derive(Debug, Default)]
pub struct JsonDocument {
    escaped_names: Vec<String>,
    body: String,
}

impl Materializer for JsonDocument {
    type Output = String;

    fn begin(&mut self, column_names: Arc<Vec<String>>) {
        self.escaped_names = column_names.iter().map(|n| json_escape(n)).collect();
    }

    fn push_row(&mut self, values: &[NativeValue]) {
        self.body.push_str("{\n");
        let last = values.len().saturating_sub(1);
        for (i, (name, value)) in self.escaped_names.iter().zip(values).enumerate() {
            self.body.push('"');
            self.body.push_str(name);
            self.body.push_str("\" : \"");
            self.body.push_str(&value.encode_json());
            self.body.push_str(if i == last { "\"\n" } else { "\",\n" });
        }
        self.body.push_str("},\n");
    }

    fn finish(mut self) -> String {
        // drop the comma after the last object, keep its newline
        if !self.body.is_empty() {
            let comma = self.body.len() - 2;
            self.body.remove(comma);
        }
        let mut doc = String::with_capacity(self.body.len() + 4);
        doc.push_str("[\n");
        doc.push_str(&self.body);
        doc.push_str("]\n");
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Arc<Vec<String>> {
        Arc::new(names.iter().map(|s| (*s).to_string()).collect())
    }

    fn run<M: Materializer + Default>(names: &[&str], rows: &[Vec<NativeValue>]) -> M::Output {
        let mut sink = M::default();
        sink.begin(columns(names));
        for row in rows {
            sink.push_row(row);
        }
        sink.finish()
    }

    #[test]
    fn empty_result_is_literal_empty_array() {
        assert_eq!(run::<JsonDocument>(&["a"], &[]), "[\n]\n");
    }

    #[test]
    fn single_row_layout_is_exact() {
        let doc = run::<JsonDocument>(
            &["a", "b"],
            &[vec![NativeValue::I64(1), NativeValue::Text("x".into())]],
        );
        assert_eq!(doc, "[\n{\n\"a\" : \"1\",\n\"b\" : \"x\"\n}\n]\n");
    }

    #[test]
    fn rows_keep_fetch_order_without_stray_commas() {
        let rows: Vec<Vec<NativeValue>> = (1..=3)
            .map(|i| vec![NativeValue::I32(i), NativeValue::Null])
            .collect();
        let doc = run::<JsonDocument>(&["id", "note"], &rows);
        assert_eq!(
            doc,
            "[\n{\n\"id\" : \"1\",\n\"note\" : \"\"\n},\n{\n\"id\" : \"2\",\n\"note\" : \"\"\n},\n{\n\"id\" : \"3\",\n\"note\" : \"\"\n}\n]\n"
        );

        let parsed: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed.len(), 3);
        for (i, obj) in parsed.iter().enumerate() {
            let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            assert!(keys.contains(&"id") && keys.contains(&"note"));
            assert_eq!(obj["id"], serde_json::Value::String((i + 1).to_string()));
            assert_eq!(obj["note"], serde_json::Value::String(String::new()));
        }
    }

    #[test]
    fn special_characters_survive_a_json_parser() {
        let text = "she said \"no\"\\\n\tthen left";
        let doc = run::<JsonDocument>(
            &["we\"ird"],
            &[vec![NativeValue::Text(text.into())]],
        );
        let parsed: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed[0]["we\"ird"], serde_json::Value::String(text.into()));
    }

    #[test]
    fn row_collector_shares_columns_and_encodes_null_as_empty() {
        let rows = run::<RowCollector>(
            &["a", "b"],
            &[
                vec![NativeValue::U16(7), NativeValue::Null],
                vec![NativeValue::F64(0.5), NativeValue::Text("t".into())],
            ],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("a"), Some("7"));
        assert_eq!(rows[0].get("b"), Some(""));
        assert_eq!(rows[1].get("a"), Some("0.5"));
        assert_eq!(rows[1].column_names(), rows[0].column_names());
    }
}
