//! Run manifest: what was written, from which configuration, and when.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MANIFEST_KIND: &str = "spine.selection_manifest.v1";
pub const MANIFEST_SCHEMA: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema: u32,
    pub kind: String,
    pub config_digest: String,
    pub generated_at: DateTime<Utc>,
    pub tables: Vec<TableRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRecord {
    pub sample: String,
    pub table: String,
    /// Relative to the output directory.
    pub path: String,
    pub branches: Vec<String>,
    pub rows: usize,
    pub spills: usize,
}

impl Manifest {
    pub fn new(config_digest: impl Into<String>) -> Self {
        Self {
            schema: MANIFEST_SCHEMA,
            kind: MANIFEST_KIND.to_string(),
            config_digest: config_digest.into(),
            generated_at: Utc::now(),
            tables: Vec::new(),
        }
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|table| table.rows).sum()
    }

    pub fn write_to_dir(&self, dir: &Path) -> std::io::Result<()> {
        fs::create_dir_all(dir)?;
        let rendered = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(dir.join(MANIFEST_FILE), rendered + "\n")
    }

    pub fn read_from_dir(dir: &Path) -> std::io::Result<Self> {
        let text = fs::read_to_string(dir.join(MANIFEST_FILE))?;
        serde_json::from_str(&text).map_err(std::io::Error::other)
    }
}
