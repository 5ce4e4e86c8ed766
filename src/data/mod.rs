//! Row data.
//!
//! The engine reads rows through [`RowSource`]: an ordered sequence of rows,
//! each a mapping from column to optional string. Ordering is the caller's
//! job; grouping only detects adjacent runs of equal values.
//!
//! [`RowSet`] is the in-memory implementation, loadable from a JSON array of
//! flat objects.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::error::ReportError;

/// Ordered, column-addressable rows.
pub trait RowSource {
    fn row_count(&self) -> usize;

    /// Index of a named column, if the source has it.
    fn column_index(&self, name: &str) -> Option<usize>;

    /// Value at `row`, `column`. `None` when the row or column is out of
    /// range or the value is absent.
    fn value(&self, row: usize, column: usize) -> Option<&str>;

    fn value_by_name(&self, row: usize, name: &str) -> Option<&str> {
        self.column_index(name)
            .and_then(|column| self.value(row, column))
    }
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Append a row. Short rows are padded with absent values; extra values
    /// are dropped.
    pub fn push_row(&mut self, mut values: Vec<Option<String>>) {
        values.resize(self.columns.len(), None);
        self.rows.push(values);
    }

    /// Build from `(column, value)` pairs per row, adding columns as they are
    /// first seen.
    pub fn from_records<I, R, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut set = RowSet::default();
        for record in records {
            let mut row = vec![None; set.columns.len()];
            for (key, value) in record {
                let column = set.column_or_insert(key.into());
                if column >= row.len() {
                    row.resize(column + 1, None);
                }
                row[column] = Some(value.into());
            }
            set.rows.push(row);
        }
        set.pad_rows();
        set
    }

    /// Parse a JSON array of flat objects. Strings are taken as-is, numbers
    /// and booleans are stringified, `null` is absent.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Array(items) = value else {
            return Err(ReportError::InvalidData(
                "expected a JSON array of row objects".to_string(),
            ));
        };

        let mut set = RowSet::default();
        for (n, item) in items.into_iter().enumerate() {
            let Value::Object(map) = item else {
                return Err(ReportError::InvalidData(format!(
                    "row {} is not an object",
                    n
                )));
            };
            let mut row = vec![None; set.columns.len()];
            for (key, value) in map {
                let text = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s),
                    Value::Number(num) => Some(num.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    Value::Array(_) | Value::Object(_) => {
                        return Err(ReportError::InvalidData(format!(
                            "row {} column '{}' is not a scalar",
                            n, key
                        )));
                    }
                };
                let column = set.column_or_insert(key);
                if column >= row.len() {
                    row.resize(column + 1, None);
                }
                row[column] = text;
            }
            set.rows.push(row);
        }
        set.pad_rows();
        log::debug!(
            "loaded {} rows with {} columns",
            set.rows.len(),
            set.columns.len()
        );
        Ok(set)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        Self::from_json(&json)
    }

    fn column_or_insert(&mut self, name: String) -> usize {
        if let Some(&i) = self.index.get(&name) {
            return i;
        }
        let i = self.columns.len();
        self.index.insert(name.clone(), i);
        self.columns.push(name);
        i
    }

    fn pad_rows(&mut self) {
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, None);
        }
    }
}

impl RowSource for RowSet {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }
}
