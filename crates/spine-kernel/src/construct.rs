//! Branch compiler.
//!
//! [`construct`] turns a cut list and one variable request into a named,
//! multi-valued, per-spill function. Rows come from the collection chosen
//! by [`Mode`]; each row must pass every cut (AND, declared order) before
//! the variable is evaluated on its target object.
//!
//! Cuts and variables declared on the complementary side of the truth/reco
//! join are evaluated on the resolved match. An unresolved match rejects
//! the row on simulated samples and is bypassed on real data, where the
//! truth side does not exist. Truth-typed cuts are never evaluated on real
//! data; truth-targeted variables are NaN there.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bind::{Bound, Signature, all_of, negate};
use crate::catalog::{Catalog, Tables};
use crate::error::{RegistryError, SelectionError};
use crate::matching::{resolve, resolve_particle};
use crate::model::{
    BeamSpill, Interaction, Neutrino, ParticleRecord, RecoParticle, Spill, TrueInteraction,
    TrueParticle,
};
use crate::registry::Registry;
use crate::scope::{Object, Scope, canonical_name};

/// A compiled per-spill extraction: zero or more values per spill.
pub type SpillFn = Arc<dyn Fn(&Spill) -> Vec<f64> + Send + Sync>;

/// Which collection drives per-row iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[serde(rename = "true")]
    Truth,
    Reco,
    Event,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Truth => "true",
            Mode::Reco => "reco",
            Mode::Event => "event",
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "true" => Ok(Mode::Truth),
            "reco" => Ok(Mode::Reco),
            "event" => Ok(Mode::Event),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared object type of a configured cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutObject {
    #[serde(rename = "true")]
    Truth,
    Reco,
    TrueParticle,
    RecoParticle,
    Event,
    Spill,
}

impl CutObject {
    pub fn as_str(self) -> &'static str {
        match self {
            CutObject::Truth => "true",
            CutObject::Reco => "reco",
            CutObject::TrueParticle => "true_particle",
            CutObject::RecoParticle => "reco_particle",
            CutObject::Event => "event",
            CutObject::Spill => "spill",
        }
    }
}

/// Target granularity of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    #[serde(rename = "true")]
    Truth,
    Reco,
    Event,
    #[serde(rename = "mctruth")]
    McTruth,
    TrueParticle,
    RecoParticle,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Truth => "true",
            Target::Reco => "reco",
            Target::Event => "event",
            Target::McTruth => "mctruth",
            Target::TrueParticle => "true_particle",
            Target::RecoParticle => "reco_particle",
        }
    }

    /// `Some(true)` for truth-side targets, `Some(false)` for reco-side.
    fn truth_side(self) -> Option<bool> {
        match self {
            Target::Truth | Target::TrueParticle => Some(true),
            Target::Reco | Target::RecoParticle => Some(false),
            Target::Event | Target::McTruth => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Scope {
    /// Concrete targets a configured branch type expands to. `both` and
    /// `both_particle` expand to exactly two; `spill` to none.
    pub fn targets(self) -> &'static [Target] {
        match self {
            Scope::Truth => &[Target::Truth],
            Scope::Reco => &[Target::Reco],
            Scope::Both => &[Target::Truth, Target::Reco],
            Scope::Event => &[Target::Event],
            Scope::McTruth => &[Target::McTruth],
            Scope::TrueParticle => &[Target::TrueParticle],
            Scope::RecoParticle => &[Target::RecoParticle],
            Scope::BothParticle => &[Target::TrueParticle, Target::RecoParticle],
            Scope::Spill => &[],
        }
    }
}

/// One configured cut. `name` may carry a leading `!`.
#[derive(Debug, Clone, PartialEq)]
pub struct CutEntry {
    pub name: String,
    pub object: CutObject,
    pub parameters: Vec<f64>,
    pub decrements_exposure: bool,
}

impl CutEntry {
    pub fn new(name: impl Into<String>, object: CutObject) -> Self {
        Self {
            name: name.into(),
            object,
            parameters: Vec::new(),
            decrements_exposure: false,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<f64>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// One configured variable. With a selector, `name` is a particle
/// variable lifted to interaction granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableEntry {
    pub name: String,
    pub parameters: Vec<f64>,
    pub selector: Option<String>,
}

impl VariableEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            selector: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<f64>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

/// A named, immutable per-spill extraction.
#[derive(Clone)]
pub struct CompiledBranch {
    name: String,
    eval: SpillFn,
}

impl CompiledBranch {
    pub fn new(name: impl Into<String>, eval: SpillFn) -> Self {
        Self {
            name: name.into(),
            eval,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, spill: &Spill) -> Vec<f64> {
        (self.eval)(spill)
    }
}

impl fmt::Debug for CompiledBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledBranch")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Strips a leading `!`, reporting whether it was present.
pub(crate) fn split_negation<'a>(
    name: &'a str,
    what: &'static str,
) -> Result<(&'a str, bool), SelectionError> {
    let (base, inverted) = match name.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (name, false),
    };
    if base.is_empty() {
        return Err(SelectionError::EmptyName { what });
    }
    Ok((base, inverted))
}

fn bind_cut<O: Object>(
    tables: &Tables<bool>,
    entry: &CutEntry,
) -> Result<Bound<O, bool>, SelectionError> {
    let (base, inverted) = split_negation(&entry.name, "cut")?;
    let bound = tables.lookup::<O>(base)?.bind(base, &entry.parameters)?;
    Ok(if inverted { negate(bound) } else { bound })
}

/// One side of the truth/reco join, named by its particle record type.
pub trait Side: ParticleRecord + Object {
    type Opposite: Side<Opposite = Self>;
    const TRUTH: bool;

    fn interactions(spill: &Spill) -> &[Interaction<Self>];

    fn interaction_by_id(spill: &Spill, id: i64) -> Option<&Interaction<Self>>;

    fn particle_by_id(spill: &Spill, id: i64) -> Option<&Self>;

    fn interaction_slot<R>(tables: &Tables<R>) -> &Registry<Signature<Interaction<Self>, R>>;

    fn side_cuts(cuts: &CutSet) -> &SideCuts<Self>;

    /// The truth interaction of a row: the primary itself on the truth
    /// side, the resolved match on the reco side.
    fn truth_interaction<'a>(
        primary: &'a Interaction<Self>,
        matched: Option<&'a Interaction<Self::Opposite>>,
    ) -> Option<&'a TrueInteraction>;
}

impl Side for TrueParticle {
    type Opposite = RecoParticle;
    const TRUTH: bool = true;

    fn interactions(spill: &Spill) -> &[Interaction<Self>] {
        &spill.truth
    }

    fn interaction_by_id(spill: &Spill, id: i64) -> Option<&Interaction<Self>> {
        spill.true_interaction(id)
    }

    fn particle_by_id(spill: &Spill, id: i64) -> Option<&Self> {
        spill.true_particle(id)
    }

    fn interaction_slot<R>(tables: &Tables<R>) -> &Registry<Signature<Interaction<Self>, R>> {
        &tables.true_interaction
    }

    fn side_cuts(cuts: &CutSet) -> &SideCuts<Self> {
        &cuts.truth
    }

    fn truth_interaction<'a>(
        primary: &'a Interaction<Self>,
        _matched: Option<&'a Interaction<RecoParticle>>,
    ) -> Option<&'a TrueInteraction> {
        Some(primary)
    }
}

impl Side for RecoParticle {
    type Opposite = TrueParticle;
    const TRUTH: bool = false;

    fn interactions(spill: &Spill) -> &[Interaction<Self>] {
        &spill.reco
    }

    fn interaction_by_id(spill: &Spill, id: i64) -> Option<&Interaction<Self>> {
        spill.reco_interaction(id)
    }

    fn particle_by_id(spill: &Spill, id: i64) -> Option<&Self> {
        spill.reco_particle(id)
    }

    fn interaction_slot<R>(tables: &Tables<R>) -> &Registry<Signature<Interaction<Self>, R>> {
        &tables.reco_interaction
    }

    fn side_cuts(cuts: &CutSet) -> &SideCuts<Self> {
        &cuts.reco
    }

    fn truth_interaction<'a>(
        _primary: &'a Interaction<Self>,
        matched: Option<&'a Interaction<TrueParticle>>,
    ) -> Option<&'a TrueInteraction> {
        matched
    }
}

fn lookup_interaction<'t, S: Side, R>(
    tables: &'t Tables<R>,
    base: &str,
) -> Result<&'t Signature<Interaction<S>, R>, RegistryError> {
    S::interaction_slot(tables).get(&canonical_name::<S>(base))
}

/// Bound cuts declared on one side of the join.
pub struct SideCuts<S: Side> {
    interaction: Vec<Bound<Interaction<S>, bool>>,
    particle: Vec<Bound<S, bool>>,
}

impl<S: Side> Default for SideCuts<S> {
    fn default() -> Self {
        Self {
            interaction: Vec::new(),
            particle: Vec::new(),
        }
    }
}

/// Every configured cut, looked up and bound, grouped by object type.
pub struct CutSet {
    truth: SideCuts<TrueParticle>,
    reco: SideCuts<RecoParticle>,
    event: Vec<Bound<Spill, bool>>,
}

impl CutSet {
    /// Binds `cuts`. Truth-typed cuts are validated but dropped on real
    /// data; spill cuts are dropped on simulated samples.
    pub fn compile(
        catalog: &Catalog,
        cuts: &[CutEntry],
        mode: Mode,
        is_simulated: bool,
    ) -> Result<Self, SelectionError> {
        let tables = catalog.cuts();
        let mut set = CutSet {
            truth: SideCuts::default(),
            reco: SideCuts::default(),
            event: Vec::new(),
        };
        for entry in cuts {
            if mode == Mode::Event
                && !matches!(entry.object, CutObject::Event | CutObject::Spill)
            {
                return Err(SelectionError::CutNotApplicable {
                    cut: entry.name.clone(),
                    object: entry.object.as_str().to_string(),
                    mode: mode.as_str().to_string(),
                });
            }
            match entry.object {
                CutObject::Truth => {
                    let cut = bind_cut::<TrueInteraction>(tables, entry)?;
                    if is_simulated {
                        set.truth.interaction.push(cut);
                    }
                }
                CutObject::Reco => {
                    let cut = bind_cut(tables, entry)?;
                    set.reco.interaction.push(cut);
                }
                CutObject::TrueParticle => {
                    let cut = bind_cut::<TrueParticle>(tables, entry)?;
                    if is_simulated {
                        set.truth.particle.push(cut);
                    }
                }
                CutObject::RecoParticle => {
                    let cut = bind_cut(tables, entry)?;
                    set.reco.particle.push(cut);
                }
                CutObject::Event => set.event.push(bind_cut(tables, entry)?),
                CutObject::Spill => {
                    let cut = bind_cut::<BeamSpill>(tables, entry)?;
                    if !is_simulated {
                        set.event.push(Arc::new(move |spill: &Spill| {
                            spill.header.beam.as_ref().is_some_and(|beam| cut(beam))
                        }));
                    }
                }
            }
        }
        Ok(set)
    }
}

/// Per-particle qualifying predicate for particle sub-iteration.
type ParticleFilter<S> = Arc<dyn Fn(&Spill, &S) -> bool + Send + Sync>;

fn particle_filter<S: Side>(cuts: &CutSet, is_simulated: bool) -> ParticleFilter<S> {
    let own = all_of(S::side_cuts(cuts).particle.clone());
    let opposite = &<S::Opposite as Side>::side_cuts(cuts).particle;
    if opposite.is_empty() {
        return Arc::new(move |_: &Spill, particle: &S| own(particle));
    }
    let opposite = all_of(opposite.clone());
    Arc::new(move |spill: &Spill, particle: &S| {
        if !own(particle) {
            return false;
        }
        let matched =
            resolve_particle(particle, |id| <S::Opposite as Side>::particle_by_id(spill, id));
        match matched {
            Some(matched) => opposite(matched),
            None => !is_simulated,
        }
    })
}

/// Row extractor: appends the values of one passing row.
type Extract<S> = Arc<
    dyn Fn(&Spill, &Interaction<S>, Option<&Interaction<<S as Side>::Opposite>>, &mut Vec<f64>)
        + Send
        + Sync,
>;

fn interaction_variable<S: Side>(
    catalog: &Catalog,
    variable: &VariableEntry,
) -> Result<Bound<Interaction<S>, f64>, SelectionError> {
    let Some(selector) = &variable.selector else {
        return Ok(lookup_interaction::<S, f64>(catalog.variables(), &variable.name)?
            .bind(&variable.name, &variable.parameters)?);
    };
    let select = lookup_interaction::<S, Option<usize>>(catalog.selectors(), selector)?
        .bind(selector, &[])?;
    let extract = catalog
        .variables()
        .lookup::<S>(&variable.name)?
        .bind(&variable.name, &variable.parameters)?;
    Ok(Arc::new(move |interaction: &Interaction<S>| {
        select(interaction)
            .and_then(|index| interaction.particles.get(index))
            .map_or(f64::NAN, |particle| extract(particle))
    }))
}

fn emit_particles<S: Side>(
    spill: &Spill,
    interaction: Option<&Interaction<S>>,
    extract: &Bound<S, f64>,
    qualify: &ParticleFilter<S>,
    out: &mut Vec<f64>,
) {
    let Some(interaction) = interaction else {
        return;
    };
    out.extend(
        interaction
            .particles
            .iter()
            .filter(|particle| qualify(spill, *particle))
            .map(|particle| extract(particle)),
    );
}

fn particle_extract<S: Side>(
    catalog: &Catalog,
    cuts: &CutSet,
    variable: &VariableEntry,
    is_simulated: bool,
) -> Result<(Bound<S, f64>, ParticleFilter<S>), SelectionError> {
    let extract = catalog
        .variables()
        .lookup::<S>(&variable.name)?
        .bind(&variable.name, &variable.parameters)?;
    Ok((extract, particle_filter::<S>(cuts, is_simulated)))
}

fn row<P: Side, F>(extract: F) -> Extract<P>
where
    F: Fn(&Spill, &Interaction<P>, Option<&Interaction<P::Opposite>>, &mut Vec<f64>)
        + Send
        + Sync
        + 'static,
{
    Arc::new(extract)
}

fn interaction_target<P: Side>(
    catalog: &Catalog,
    variable: &VariableEntry,
    own: bool,
) -> Result<Extract<P>, SelectionError> {
    if own {
        let extract = interaction_variable::<P>(catalog, variable)?;
        return Ok(row(move |_, primary, _, out| out.push(extract(primary))));
    }
    let extract = interaction_variable::<P::Opposite>(catalog, variable)?;
    Ok(row(move |_, _, matched, out| {
        out.push(matched.map_or(f64::NAN, |interaction| extract(interaction)))
    }))
}

fn particle_target<P: Side>(
    catalog: &Catalog,
    cuts: &CutSet,
    variable: &VariableEntry,
    own: bool,
    is_simulated: bool,
) -> Result<Extract<P>, SelectionError> {
    if own {
        let (extract, qualify) = particle_extract::<P>(catalog, cuts, variable, is_simulated)?;
        return Ok(row(move |spill, primary, _, out| {
            emit_particles(spill, Some(primary), &extract, &qualify, out)
        }));
    }
    let (extract, qualify) =
        particle_extract::<P::Opposite>(catalog, cuts, variable, is_simulated)?;
    Ok(row(move |spill, _, matched, out| {
        emit_particles(spill, matched, &extract, &qualify, out)
    }))
}

/// Builds the row extractor for rows driven by side `P`.
fn row_extract<P: Side>(
    catalog: &Catalog,
    cuts: &CutSet,
    variable: &VariableEntry,
    target: Target,
    is_simulated: bool,
) -> Result<Extract<P>, SelectionError> {
    let own = target.truth_side() == Some(P::TRUTH);
    match target {
        Target::Event => {
            let extract = catalog
                .variables()
                .lookup::<Spill>(&variable.name)?
                .bind(&variable.name, &variable.parameters)?;
            Ok(row(move |spill, _, _, out| out.push(extract(spill))))
        }
        Target::McTruth => {
            let extract = catalog
                .variables()
                .lookup::<Neutrino>(&variable.name)?
                .bind(&variable.name, &variable.parameters)?;
            Ok(row(move |spill, primary, matched, out| {
                let value = P::truth_interaction(primary, matched)
                    .and_then(|truth| spill.neutrino(truth.nu_id))
                    .map_or(f64::NAN, |neutrino| extract(neutrino));
                out.push(value);
            }))
        }
        Target::Truth | Target::Reco => interaction_target::<P>(catalog, variable, own),
        Target::TrueParticle | Target::RecoParticle if variable.selector.is_some() => {
            interaction_target::<P>(catalog, variable, own)
        }
        Target::TrueParticle | Target::RecoParticle => {
            particle_target::<P>(catalog, cuts, variable, own, is_simulated)
        }
    }
}

/// The per-spill row loop for rows driven by side `P`.
fn interaction_rows<P: Side>(
    cuts: &CutSet,
    extract: Extract<P>,
    is_simulated: bool,
) -> SpillFn {
    let event = all_of(cuts.event.clone());
    let own = all_of(P::side_cuts(cuts).interaction.clone());
    let complementary = &<P::Opposite as Side>::side_cuts(cuts).interaction;
    let complementary = (!complementary.is_empty()).then(|| all_of(complementary.clone()));
    let opposite_absent = <P::Opposite as Side>::TRUTH && !is_simulated;

    Arc::new(move |spill: &Spill| {
        let mut values = Vec::new();
        if !event(spill) {
            return values;
        }
        for primary in P::interactions(spill) {
            if !own(primary) {
                continue;
            }
            let matched = if opposite_absent {
                None
            } else {
                resolve(primary, |id| <P::Opposite as Side>::interaction_by_id(spill, id))
            };
            if let Some(complementary) = &complementary {
                let pass = match matched {
                    Some(matched) => complementary(matched),
                    None => !is_simulated,
                };
                if !pass {
                    continue;
                }
            }
            extract(spill, primary, matched, &mut values);
        }
        values
    })
}

/// `<target>_<variable>`, or `<side>_<selector>_<variable>` for lifted
/// particle variables.
pub fn branch_name(variable: &VariableEntry, target: Target) -> String {
    match (&variable.selector, target.truth_side()) {
        (Some(selector), Some(true)) => format!("true_{selector}_{}", variable.name),
        (Some(selector), Some(false)) => format!("reco_{selector}_{}", variable.name),
        _ => format!("{}_{}", target.as_str(), variable.name),
    }
}

/// Compiles one branch.
///
/// Unknown names, bad parameter counts, and cut/target combinations the
/// mode cannot reach all fail here, before any spill is read.
pub fn construct(
    catalog: &Catalog,
    cuts: &[CutEntry],
    variable: &VariableEntry,
    mode: Mode,
    target: Target,
    is_simulated: bool,
) -> Result<CompiledBranch, SelectionError> {
    if variable.name.is_empty() {
        return Err(SelectionError::EmptyName { what: "variable" });
    }
    if let Some(selector) = &variable.selector
        && target.truth_side().is_none()
    {
        return Err(SelectionError::UnknownSelector {
            selector: selector.clone(),
            target: target.as_str().to_string(),
        });
    }
    let set = CutSet::compile(catalog, cuts, mode, is_simulated)?;
    let eval: SpillFn = match mode {
        Mode::Event => {
            if target != Target::Event {
                return Err(SelectionError::IllegalTarget {
                    target: target.as_str().to_string(),
                    variable: variable.name.clone(),
                    mode: mode.as_str().to_string(),
                });
            }
            let extract = catalog
                .variables()
                .lookup::<Spill>(&variable.name)?
                .bind(&variable.name, &variable.parameters)?;
            let event = all_of(set.event);
            Arc::new(move |spill: &Spill| {
                if event(spill) {
                    vec![extract(spill)]
                } else {
                    Vec::new()
                }
            })
        }
        Mode::Truth => {
            let extract = row_extract::<TrueParticle>(catalog, &set, variable, target, is_simulated)?;
            interaction_rows::<TrueParticle>(&set, extract, is_simulated)
        }
        Mode::Reco => {
            let extract = row_extract::<RecoParticle>(catalog, &set, variable, target, is_simulated)?;
            interaction_rows::<RecoParticle>(&set, extract, is_simulated)
        }
    };
    let name = branch_name(variable, target);
    tracing::debug!(branch = %name, mode = %mode, is_simulated, "branch compiled");
    Ok(CompiledBranch::new(name, eval))
}
