//! Sample loop: compile every tree for every enabled sample, stream the
//! sample's spills through them, and write the resulting tables.

use std::path::Path;

use spine_config::{AnalysisConfig, Sample, TreeSpec};
use spine_kernel::{Catalog, CompiledBranch, Spill, construct, construct_exposure, publish_categories};

use crate::error::AnalysisError;
use crate::manifest::{Manifest, TableRecord};
use crate::records::{RecordError, SpillReader};
use crate::table::Table;

pub const EXPOSURE_SUFFIX: &str = "_exposure";

/// A tree compiled for one sample.
#[derive(Debug, Clone)]
pub struct CompiledTree {
    pub name: String,
    pub branches: Vec<CompiledBranch>,
    /// `livetime` and `pot`, when the tree asks for exposure.
    pub exposure: Vec<CompiledBranch>,
}

impl CompiledTree {
    fn compile(catalog: &Catalog, sample: &Sample, tree: &TreeSpec) -> Result<Self, AnalysisError> {
        let wrap = |source| AnalysisError::Compile {
            sample: sample.name.clone(),
            tree: tree.name.clone(),
            source,
        };
        let mut branches = Vec::new();
        for branch in &tree.branches {
            for target in branch.targets() {
                let compiled = construct(
                    catalog,
                    &tree.cuts,
                    &branch.variable,
                    tree.mode,
                    *target,
                    sample.is_simulated,
                )
                .map_err(wrap)?;
                branches.push(compiled);
            }
        }
        let exposure = if tree.add_exposure {
            construct_exposure(catalog, &tree.cuts, sample.is_simulated).map_err(wrap)?
        } else {
            Vec::new()
        };
        Ok(Self {
            name: tree.name.clone(),
            branches,
            exposure,
        })
    }

    pub fn columns(&self) -> Vec<String> {
        self.branches.iter().map(|branch| branch.name().to_string()).collect()
    }

    pub fn exposure_table(&self) -> Option<String> {
        (!self.exposure.is_empty()).then(|| format!("{}{EXPOSURE_SUFFIX}", self.name))
    }

    fn tables(&self) -> Vec<Table> {
        let mut tables = vec![Table::new(&self.name, self.columns())];
        if let Some(name) = self.exposure_table() {
            let columns = self.exposure.iter().map(|branch| branch.name().to_string()).collect();
            tables.push(Table::new(name, columns));
        }
        tables
    }
}

fn evaluate(branches: &[CompiledBranch], spill: &Spill) -> Vec<Vec<f64>> {
    branches.iter().map(|branch| branch.evaluate(spill)).collect()
}

/// Every tree compiled for one sample.
#[derive(Debug, Clone)]
pub struct CompiledSample {
    pub sample: Sample,
    pub trees: Vec<CompiledTree>,
}

impl CompiledSample {
    /// Runs marked `spills` (as yielded by a [`SpillReader`]) through every
    /// tree in delivery order. Tables come back in tree order, each tree's
    /// exposure table right after it. Stops at the first record error.
    pub fn process(
        &self,
        spills: impl IntoIterator<Item = Result<Spill, RecordError>>,
    ) -> Result<Vec<Table>, RecordError> {
        let mut tables: Vec<Table> = self.trees.iter().flat_map(CompiledTree::tables).collect();
        for spill in spills {
            let spill = spill?;
            let mut slot = 0;
            for tree in &self.trees {
                tables[slot].append_spill(&spill, &evaluate(&tree.branches, &spill));
                slot += 1;
                if !tree.exposure.is_empty() {
                    tables[slot].append_spill(&spill, &evaluate(&tree.exposure, &spill));
                    slot += 1;
                }
            }
        }
        Ok(tables)
    }
}

/// A configuration compiled against a catalog, ready to run.
#[derive(Debug)]
pub struct Analysis {
    config: AnalysisConfig,
    samples: Vec<CompiledSample>,
}

impl Analysis {
    /// Publishes the configured categories into `catalog`, then compiles
    /// every tree for every enabled sample. Nothing is read from disk.
    pub fn new(config: AnalysisConfig, mut catalog: Catalog) -> Result<Self, AnalysisError> {
        if !config.categories.is_empty() {
            publish_categories(&mut catalog, &config.categories).map_err(AnalysisError::Category)?;
        }
        for sample in config.samples.iter().filter(|sample| sample.disabled) {
            tracing::warn!(sample = %sample.name, "sample disabled, skipping");
        }
        let mut samples = Vec::new();
        for sample in config.enabled_samples() {
            let mut trees = Vec::new();
            for tree in &config.trees {
                if tree.sim_only && !sample.is_simulated {
                    tracing::warn!(
                        sample = %sample.name,
                        tree = %tree.name,
                        "simulation-only tree skipped for data sample"
                    );
                    continue;
                }
                trees.push(CompiledTree::compile(&catalog, sample, tree)?);
            }
            samples.push(CompiledSample {
                sample: sample.clone(),
                trees,
            });
        }
        Ok(Self { config, samples })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn samples(&self) -> &[CompiledSample] {
        &self.samples
    }

    /// Reads every enabled sample, writes `<output>/<sample>/<table>.jsonl`
    /// and `<output>/manifest.json`.
    pub fn run(&self, output: &Path) -> Result<Manifest, AnalysisError> {
        let mut manifest = Manifest::new(&self.config.digest);
        for compiled in &self.samples {
            let sample = &compiled.sample;
            let records = |source| AnalysisError::Records {
                sample: sample.name.clone(),
                source,
            };
            let mut reader = SpillReader::open(&sample.path).map_err(records)?;
            let tables = compiled.process(&mut reader).map_err(records)?;
            tracing::info!(sample = %sample.name, subruns = reader.subruns(), "sample processed");
            for table in tables {
                let relative = format!("{}/{}.jsonl", sample.name, table.name);
                let path = output.join(&relative);
                table.write_to_path(&path).map_err(|e| AnalysisError::Write {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                tracing::info!(sample = %sample.name, table = %table.name, rows = table.rows.len(), "table written");
                manifest.tables.push(TableRecord {
                    sample: sample.name.clone(),
                    table: table.name,
                    path: relative,
                    branches: table.columns,
                    rows: table.rows.len(),
                    spills: table.spills,
                });
            }
        }
        manifest.write_to_dir(output).map_err(|e| AnalysisError::Write {
            path: output.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(manifest)
    }
}
