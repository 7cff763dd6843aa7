//! # Spine Kernel
//!
//! The selection-and-extraction compiler: a small runtime that turns
//! name-based cut lists and variable requests into per-spill extraction
//! functions over a fixed two-sided (truth/reco), three-level
//! (spill/interaction/particle) schema.
//!
//! This crate is **physics-agnostic**: it does not prescribe what a cut
//! measures. It only prescribes how cuts and variables are registered,
//! bound to parameters, resolved across the truth/reco join, and composed.
//!
//! ## Architecture
//!
//! ```text
//! Registry<V>           ← name → value, one per (value kind, object type)
//!     │
//! Signature / bind      ← plain or parameterized content → uniform closure
//!     │
//! Scoped / Catalog      ← scope registration, bootstrap, late category publish
//!     │
//! resolve               ← first-match lookup into the complementary arena
//!     │
//! Category classifier   ← ordered truth-cut conjunctions → bucket index
//!     │
//! construct             ← cuts + variable + mode + target → per-spill values
//! ```

pub mod bind;
pub mod catalog;
pub mod category;
pub mod construct;
pub mod error;
pub mod exposure;
pub mod matching;
pub mod model;
pub mod registry;
pub mod scope;

pub use bind::{Arity, Bound, Signature};
pub use catalog::{Catalog, CatalogBuilder, Registration, RegistryListing, bootstrap_with};
pub use category::{Category, CategoryCut, compile_classifier, publish_categories};
pub use construct::{
    CompiledBranch, CutEntry, CutObject, Mode, SpillFn, Target, VariableEntry, branch_name,
    construct,
};
pub use error::{ParameterError, RegistryError, SelectionError};
pub use exposure::construct_exposure;
pub use matching::resolve;
pub use model::{
    BeamSpill, Header, Interaction, Neutrino, OpFlash, ParticleCore, ParticleRecord,
    RecoInteraction, RecoParticle, Spill, TrueInteraction, TrueParticle,
};
pub use registry::Registry;
pub use scope::{Scope, Scoped};
