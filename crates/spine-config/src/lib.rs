//! # Spine Config
//!
//! Declarative analysis configuration in TOML.
//!
//! ```text
//!   text ──toml──► RawConfig ──reduce──► AnalysisConfig
//!                    (shape)    (names, @refs, types)   (kernel requests)
//! ```
//!
//! A configuration names samples, optional truth categories, and trees.
//! Each tree carries a mode, a cut list, and branch requests. Parameters
//! are numbers or `"@name"` references into the `[parameters]` table.
//! The reduced form carries the SHA-256 digest of the source text so a run
//! can record exactly which configuration produced it.

pub mod error;
pub mod reduce;
pub mod schema;

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

pub use error::ConfigError;
pub use reduce::{AnalysisConfig, BranchSpec, Sample, TreeSpec, reduce, resolve_parameters};
pub use schema::{ParamValue, RawConfig};

/// Hex SHA-256 of the configuration text.
pub fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Parses and reduces configuration text.
pub fn parse(text: &str) -> Result<AnalysisConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(text).map_err(|e| ConfigError::ParseToml(e.to_string()))?;
    reduce(raw, digest(text))
}

/// Loads a configuration file. Relative sample paths are taken relative
/// to the file's directory.
pub fn load(path: impl AsRef<Path>) -> Result<AnalysisConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let mut config = parse(&text)?;
    if let Some(base) = path.parent() {
        for sample in &mut config.samples {
            if sample.path.is_relative() {
                sample.path = base.join(&sample.path);
            }
        }
    }
    tracing::debug!(
        path = %path.display(),
        samples = config.samples.len(),
        trees = config.trees.len(),
        "configuration loaded"
    );
    Ok(config)
}
