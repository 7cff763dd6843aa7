//! Row-oriented output tables.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Number, Value};
use spine_kernel::Spill;

/// Lays out one spill's branch values as rows.
///
/// The row count is the longest value list. A single value is repeated on
/// every row; shorter lists are padded with NaN. No values anywhere means
/// no rows.
pub fn replicate(values: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let rows = values.iter().map(Vec::len).max().unwrap_or(0);
    (0..rows)
        .map(|row| {
            values
                .iter()
                .map(|branch| match branch.as_slice() {
                    [single] => *single,
                    many => many.get(row).copied().unwrap_or(f64::NAN),
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub run: i64,
    pub subrun: i64,
    pub event: i64,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Spills appended, including those that produced no rows.
    pub spills: usize,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            spills: 0,
        }
    }

    /// Appends the rows `values` expand to; returns how many were added.
    pub fn append_spill(&mut self, spill: &Spill, values: &[Vec<f64>]) -> usize {
        self.spills += 1;
        let header = &spill.header;
        let rows = replicate(values);
        let added = rows.len();
        self.rows.extend(rows.into_iter().map(|values| Row {
            run: header.run,
            subrun: header.subrun,
            event: header.event,
            values,
        }));
        added
    }

    /// One JSON object per row; non-finite values render as `null`.
    pub fn row_json(&self, row: &Row) -> Value {
        let mut object = Map::new();
        object.insert("run".to_string(), Value::from(row.run));
        object.insert("subrun".to_string(), Value::from(row.subrun));
        object.insert("event".to_string(), Value::from(row.event));
        for (column, value) in self.columns.iter().zip(&row.values) {
            let rendered = Number::from_f64(*value).map_or(Value::Null, Value::Number);
            object.insert(column.clone(), rendered);
        }
        Value::Object(object)
    }

    pub fn write_jsonl(&self, writer: &mut impl Write) -> std::io::Result<()> {
        for row in &self.rows {
            writeln!(writer, "{}", self.row_json(row))?;
        }
        Ok(())
    }

    pub fn write_to_path(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(fs::File::create(path)?);
        self.write_jsonl(&mut writer)?;
        writer.flush()
    }
}
