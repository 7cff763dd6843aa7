//! # Spine Ana
//!
//! The outer loop around the selection kernel.
//!
//! ```text
//!   config + catalog ──► Analysis::new ──► CompiledSample (per enabled sample)
//!                                               │
//!   <sample>.jsonl ──► SpillReader (marks subruns) ┴─► Table rows ──► <output>/
//! ```
//!
//! Each tree's branches are evaluated per spill and laid out as rows by
//! [`table::replicate`]. Exposure branches go to a sibling
//! `<tree>_exposure` table. A [`Manifest`] records every table written.

pub mod analysis;
pub mod error;
pub mod manifest;
pub mod records;
pub mod table;

pub use analysis::{Analysis, CompiledSample, CompiledTree, EXPOSURE_SUFFIX};
pub use error::AnalysisError;
pub use manifest::{MANIFEST_FILE, MANIFEST_KIND, Manifest, TableRecord};
pub use records::{RecordError, RecordSummary, SpillReader, SubrunMarker, summarize};
pub use table::{Row, Table, replicate};
