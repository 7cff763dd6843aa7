//! Exposure accumulation: livetime and POT branches.
//!
//! Only cuts flagged `decrements_exposure` take part. Event cuts gate the
//! whole spill; spill cuts are applied to every beam record the spill
//! carries rather than to the gate itself.
//!
//! On simulated samples exposure is a subrun-scoped quantity reported on
//! the first spill of each subrun, so these branches rely on the
//! `first_in_subrun` marker being set by an in-order, single pass over the
//! sample.

use std::sync::Arc;

use crate::bind::{Bound, all_of, negate};
use crate::catalog::Catalog;
use crate::construct::{CompiledBranch, CutEntry, CutObject, split_negation};
use crate::error::SelectionError;
use crate::model::{BeamSpill, Spill};

pub const LIVETIME_BRANCH: &str = "livetime";
pub const POT_BRANCH: &str = "pot";

fn bind<O: crate::scope::Object>(
    catalog: &Catalog,
    entry: &CutEntry,
) -> Result<Bound<O, bool>, SelectionError> {
    let (base, inverted) = split_negation(&entry.name, "exposure cut")?;
    let bound = catalog.cuts().lookup::<O>(base)?.bind(base, &entry.parameters)?;
    Ok(if inverted { negate(bound) } else { bound })
}

pub fn livetime(spill: &Spill, is_simulated: bool) -> f64 {
    let header = &spill.header;
    if is_simulated {
        return if header.first_in_subrun { header.ngenevt } else { 0.0 };
    }
    (header.bnb_info.len() + header.numi_info.len()) as f64
        + f64::from(header.noffbeam_bnb)
        + f64::from(header.noffbeam_numi)
}

pub fn pot(spill: &Spill, is_simulated: bool, spill_cut: &dyn Fn(&BeamSpill) -> bool) -> f64 {
    let header = &spill.header;
    if is_simulated {
        return if header.first_in_subrun { header.pot } else { 0.0 };
    }
    header
        .bnb_info
        .iter()
        .filter(|beam| spill_cut(*beam))
        .map(|beam| beam.tor875)
        .sum()
}

/// Compiles the `livetime` and `pot` branches for a tree's cut list.
/// Each emits one value per spill passing the exposure event cuts.
pub fn construct_exposure(
    catalog: &Catalog,
    cuts: &[CutEntry],
    is_simulated: bool,
) -> Result<Vec<CompiledBranch>, SelectionError> {
    let mut event_cuts = Vec::new();
    let mut spill_cuts = Vec::new();
    for entry in cuts.iter().filter(|entry| entry.decrements_exposure) {
        match entry.object {
            CutObject::Event => event_cuts.push(bind::<Spill>(catalog, entry)?),
            CutObject::Spill => spill_cuts.push(bind::<BeamSpill>(catalog, entry)?),
            other => {
                return Err(SelectionError::CutNotApplicable {
                    cut: entry.name.clone(),
                    object: other.as_str().to_string(),
                    mode: "exposure".to_string(),
                });
            }
        }
    }
    let event_cut = all_of(event_cuts);
    let spill_cut = all_of(spill_cuts);

    let gate = Arc::clone(&event_cut);
    let livetime_branch = CompiledBranch::new(
        LIVETIME_BRANCH,
        Arc::new(move |spill: &Spill| {
            if gate(spill) {
                vec![livetime(spill, is_simulated)]
            } else {
                Vec::new()
            }
        }),
    );
    let pot_branch = CompiledBranch::new(
        POT_BRANCH,
        Arc::new(move |spill: &Spill| {
            if event_cut(spill) {
                vec![pot(spill, is_simulated, &*spill_cut)]
            } else {
                Vec::new()
            }
        }),
    );
    tracing::debug!(is_simulated, "exposure branches compiled");
    Ok(vec![livetime_branch, pot_branch])
}
