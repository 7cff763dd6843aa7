//! Validation and reduction of a [`RawConfig`] to kernel requests.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use spine_kernel::{
    Category, CategoryCut, CutEntry, Mode, Scope, Target, VariableEntry, branch_name,
};

use crate::error::ConfigError;
use crate::schema::{ParamValue, RawBranch, RawConfig, RawCut, RawSample, RawTree};

/// A fully resolved analysis configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub output: PathBuf,
    pub samples: Vec<Sample>,
    pub categories: Vec<Category>,
    pub trees: Vec<TreeSpec>,
    /// SHA-256 of the configuration text, hex encoded.
    pub digest: String,
}

impl AnalysisConfig {
    pub fn enabled_samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(|sample| !sample.disabled)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub path: PathBuf,
    pub is_simulated: bool,
    pub disabled: bool,
}

/// One output table: a mode, its cut list, and the requested branches.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSpec {
    pub name: String,
    pub mode: Mode,
    pub sim_only: bool,
    pub add_exposure: bool,
    pub cuts: Vec<CutEntry>,
    pub branches: Vec<BranchSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchSpec {
    pub variable: VariableEntry,
    pub scope: Scope,
}

impl BranchSpec {
    pub fn targets(&self) -> &'static [Target] {
        self.scope.targets()
    }
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("identifier regex must compile"))
}

fn cut_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^!?[A-Za-z][A-Za-z0-9_]*$").expect("cut name regex must compile"))
}

fn check_identifier(location: &str, what: &str, name: &str) -> Result<(), ConfigError> {
    if identifier_re().is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::invalid(location, format!("invalid {what} name `{name}`")))
    }
}

fn check_cut_name(location: &str, name: &str) -> Result<(), ConfigError> {
    if cut_name_re().is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::invalid(location, format!("invalid cut name `{name}`")))
    }
}

/// Resolves literal numbers and `@name` references against `[parameters]`.
pub fn resolve_parameters(
    location: &str,
    values: &[ParamValue],
    named: &BTreeMap<String, f64>,
) -> Result<Vec<f64>, ConfigError> {
    values
        .iter()
        .map(|value| match value {
            ParamValue::Number(number) => Ok(*number),
            ParamValue::Reference(text) => {
                let Some(name) = text.strip_prefix('@') else {
                    return Err(ConfigError::invalid(
                        location,
                        format!("parameter `{text}` is not a number or an `@` reference"),
                    ));
                };
                named
                    .get(name)
                    .copied()
                    .ok_or_else(|| ConfigError::UnresolvedReference {
                        location: location.to_string(),
                        name: name.to_string(),
                    })
            }
        })
        .collect()
}

fn reduce_sample(raw: RawSample) -> Result<Sample, ConfigError> {
    check_identifier("sample", "sample", &raw.name)?;
    Ok(Sample {
        name: raw.name,
        path: raw.path,
        is_simulated: raw.ismc,
        disabled: raw.disable,
    })
}

fn reduce_cut(
    location: &str,
    raw: RawCut,
    named: &BTreeMap<String, f64>,
) -> Result<CutEntry, ConfigError> {
    check_cut_name(location, &raw.name)?;
    let Some(object) = raw.object else {
        return Err(ConfigError::invalid(
            location,
            format!("cut `{}` has no `type`", raw.name),
        ));
    };
    let mut entry = CutEntry::new(raw.name, object)
        .with_parameters(resolve_parameters(location, &raw.parameters, named)?);
    entry.decrements_exposure = raw.decrements_exposure;
    Ok(entry)
}

fn reduce_branch(
    location: &str,
    raw: RawBranch,
    named: &BTreeMap<String, f64>,
) -> Result<BranchSpec, ConfigError> {
    check_identifier(location, "branch", &raw.name)?;
    if raw.scope.targets().is_empty() {
        return Err(ConfigError::invalid(
            location,
            format!("branch `{}` has type `{}`, which has no targets", raw.name, raw.scope),
        ));
    }
    let mut variable = VariableEntry::new(raw.name)
        .with_parameters(resolve_parameters(location, &raw.parameters, named)?);
    if let Some(selector) = raw.selector {
        check_identifier(location, "selector", &selector)?;
        variable = variable.with_selector(selector);
    }
    Ok(BranchSpec {
        variable,
        scope: raw.scope,
    })
}

fn reduce_tree(raw: RawTree, named: &BTreeMap<String, f64>) -> Result<TreeSpec, ConfigError> {
    let location = format!("tree[{}]", raw.name);
    check_identifier(&location, "tree", &raw.name)?;
    let mode: Mode = raw
        .mode
        .parse()
        .map_err(|mode| ConfigError::invalid(&location, format!("unknown mode `{mode}`")))?;

    let cuts = raw
        .cut
        .into_iter()
        .enumerate()
        .map(|(idx, cut)| reduce_cut(&format!("{location}.cut[{idx}]"), cut, named))
        .collect::<Result<Vec<_>, _>>()?;
    let branches = raw
        .branch
        .into_iter()
        .enumerate()
        .map(|(idx, branch)| reduce_branch(&format!("{location}.branch[{idx}]"), branch, named))
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns = BTreeSet::new();
    for branch in &branches {
        for target in branch.targets() {
            let column = branch_name(&branch.variable, *target);
            if !columns.insert(column.clone()) {
                return Err(ConfigError::invalid(
                    &location,
                    format!("branch `{column}` is requested twice"),
                ));
            }
        }
    }

    Ok(TreeSpec {
        name: raw.name,
        mode,
        sim_only: raw.sim_only,
        add_exposure: raw.add_exposure,
        cuts,
        branches,
    })
}

fn check_unique<'a>(what: &str, names: impl Iterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::invalid(what, format!("`{name}` is declared twice")));
        }
    }
    Ok(())
}

/// Validates `raw` and reduces it to kernel requests.
pub fn reduce(raw: RawConfig, digest: String) -> Result<AnalysisConfig, ConfigError> {
    for name in raw.parameters.keys() {
        check_identifier("parameters", "parameter", name)?;
    }
    let named = &raw.parameters;

    let samples = raw
        .samples
        .into_iter()
        .map(reduce_sample)
        .collect::<Result<Vec<_>, _>>()?;
    check_unique("sample", samples.iter().map(|sample| sample.name.as_str()))?;

    let mut categories = Vec::with_capacity(raw.categories.len());
    for category in raw.categories {
        let location = format!("category[{}]", category.name);
        check_identifier(&location, "category", &category.name)?;
        let cuts = category
            .cuts
            .iter()
            .map(|cut| {
                check_cut_name(&location, &cut.name)?;
                Ok(CategoryCut {
                    name: cut.name.clone(),
                    parameters: resolve_parameters(&location, &cut.parameters, named)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        categories.push(Category {
            name: category.name,
            cuts,
        });
    }
    check_unique("category", categories.iter().map(|category| category.name.as_str()))?;

    let trees = raw
        .trees
        .into_iter()
        .map(|tree| reduce_tree(tree, named))
        .collect::<Result<Vec<_>, _>>()?;
    check_unique("tree", trees.iter().map(|tree| tree.name.as_str()))?;

    Ok(AnalysisConfig {
        output: raw.general.output,
        samples,
        categories,
        trees,
        digest,
    })
}
