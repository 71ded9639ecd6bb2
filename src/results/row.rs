use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A row from a database query result
///
/// Maps column names to their encoded string values, in the column order the backend
/// reported. Every row of one execution shares the same column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    column_names: Arc<Vec<String>>,
    values: Vec<String>,
}

impl Row {
    /// Create a new row
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names, shared across a result
    /// * `values` - The encoded values, one per column
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<String>) -> Self {
        debug_assert_eq!(column_names.len(), values.len());
        Self {
            column_names,
            values,
        }
    }

    /// Get a value from the row by column name
    ///
    /// When a projection repeats a column name, the first occurrence wins.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&str> {
        self.column_names
            .iter()
            .position(|col| col == column_name)
            .and_then(|idx| self.get_by_index(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
