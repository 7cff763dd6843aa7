//! Raw TOML schema, deserialized as written.
//!
//! Nothing here is validated beyond its shape; [`crate::reduce`] checks
//! names, resolves references, and produces kernel requests.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use spine_kernel::{CutObject, Scope};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub general: General,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    #[serde(default, rename = "sample")]
    pub samples: Vec<RawSample>,
    #[serde(default, rename = "category")]
    pub categories: Vec<RawCategory>,
    #[serde(default, rename = "tree")]
    pub trees: Vec<RawTree>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct General {
    pub output: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSample {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub ismc: bool,
    #[serde(default)]
    pub disable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCategory {
    pub name: String,
    #[serde(default)]
    pub cuts: Vec<RawCategoryCut>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCategoryCut {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParamValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTree {
    pub name: String,
    pub mode: String,
    #[serde(default)]
    pub sim_only: bool,
    #[serde(default)]
    pub add_exposure: bool,
    #[serde(default)]
    pub cut: Vec<RawCut>,
    #[serde(default)]
    pub branch: Vec<RawBranch>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCut {
    pub name: String,
    /// Required; checked during reduction so the error names the cut.
    #[serde(default, rename = "type")]
    pub object: Option<CutObject>,
    #[serde(default)]
    pub parameters: Vec<ParamValue>,
    #[serde(default)]
    pub decrements_exposure: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBranch {
    pub name: String,
    #[serde(rename = "type")]
    pub scope: Scope,
    #[serde(default)]
    pub parameters: Vec<ParamValue>,
    #[serde(default)]
    pub selector: Option<String>,
}

/// A literal number, or `"@name"` referring to `[parameters]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Reference(String),
}
