//! The startup phase and the read-only catalog it produces.
//!
//! Content modules expose registration functions; [`bootstrap_with`] runs
//! them in the given order against a [`CatalogBuilder`] and freezes the
//! result. After that the only write is [`Catalog::publish_category`].

use serde::Serialize;

use crate::bind::{Bound, Signature};
use crate::error::RegistryError;
use crate::model::{
    BeamSpill, Neutrino, RecoInteraction, RecoParticle, Spill, TrueInteraction, TrueParticle,
};
use crate::registry::Registry;
use crate::scope::{Object, Scoped, canonical_name};

pub const CATALOG_LISTING_KIND: &str = "spine.catalog_listing.v1";
pub const CATALOG_LISTING_SCHEMA: u32 = 1;

/// Base name under which the category classifier is published.
pub const CATEGORY_VARIABLE: &str = "category";

/// A registration function exposed by a content module.
pub type Registration = fn(&mut CatalogBuilder) -> Result<(), RegistryError>;

/// One registry per concrete object type, for a single value kind.
#[derive(Debug, Clone)]
pub struct Tables<R> {
    pub true_interaction: Registry<Signature<TrueInteraction, R>>,
    pub reco_interaction: Registry<Signature<RecoInteraction, R>>,
    pub true_particle: Registry<Signature<TrueParticle, R>>,
    pub reco_particle: Registry<Signature<RecoParticle, R>>,
    pub event: Registry<Signature<Spill, R>>,
    pub spill: Registry<Signature<BeamSpill, R>>,
    pub mctruth: Registry<Signature<Neutrino, R>>,
}

impl<R> Tables<R> {
    fn new(kind: &str) -> Self {
        let label = |object: &str| format!("{kind}<{object}>");
        Self {
            true_interaction: Registry::new(label(TrueInteraction::NAME)),
            reco_interaction: Registry::new(label(RecoInteraction::NAME)),
            true_particle: Registry::new(label(TrueParticle::NAME)),
            reco_particle: Registry::new(label(RecoParticle::NAME)),
            event: Registry::new(label(Spill::NAME)),
            spill: Registry::new(label(BeamSpill::NAME)),
            mctruth: Registry::new(label(Neutrino::NAME)),
        }
    }

    fn insert<O: Object>(&mut self, base: &str, signature: Signature<O, R>) -> Result<(), RegistryError> {
        O::slot_mut(self).register(canonical_name::<O>(base), signature)
    }

    fn register(&mut self, base: &str, item: Scoped<R>) -> Result<(), RegistryError> {
        match item {
            Scoped::Truth(signature) => self.insert(base, signature),
            Scoped::Reco(signature) => self.insert(base, signature),
            Scoped::Both(truth, reco) => {
                self.insert(base, truth)?;
                self.insert(base, reco)
            }
            Scoped::Event(signature) => self.insert(base, signature),
            Scoped::TrueParticle(signature) => self.insert(base, signature),
            Scoped::RecoParticle(signature) => self.insert(base, signature),
            Scoped::BothParticle(truth, reco) => {
                self.insert(base, truth)?;
                self.insert(base, reco)
            }
            Scoped::Spill(signature) => self.insert(base, signature),
            Scoped::McTruth(signature) => self.insert(base, signature),
        }
    }

    /// Looks up `base` in the registry of object type `O`.
    pub fn lookup<O: Object>(&self, base: &str) -> Result<&Signature<O, R>, RegistryError> {
        O::slot(self).get(&canonical_name::<O>(base))
    }

    fn listing(&self, out: &mut Vec<RegistryListing>) {
        fn push<V>(out: &mut Vec<RegistryListing>, registry: &Registry<V>) {
            if registry.is_empty() {
                return;
            }
            out.push(RegistryListing {
                registry: registry.label().to_string(),
                names: registry.names().map(str::to_string).collect(),
            });
        }
        push(out, &self.true_interaction);
        push(out, &self.reco_interaction);
        push(out, &self.true_particle);
        push(out, &self.reco_particle);
        push(out, &self.event);
        push(out, &self.spill);
        push(out, &self.mctruth);
    }

    fn total(&self) -> usize {
        self.true_interaction.len()
            + self.reco_interaction.len()
            + self.true_particle.len()
            + self.reco_particle.len()
            + self.event.len()
            + self.spill.len()
            + self.mctruth.len()
    }
}

/// Mutable registries, only reachable during the startup phase.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    cuts: Tables<bool>,
    variables: Tables<f64>,
    selectors: Tables<Option<usize>>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            cuts: Tables::new("cut"),
            variables: Tables::new("variable"),
            selectors: Tables::new("selector"),
        }
    }

    /// Registers a cut, and the same cut as a 0/1 variable so it can be
    /// requested as a branch.
    pub fn register_cut(&mut self, base: &str, item: Scoped<bool>) -> Result<(), RegistryError> {
        let flag = item.to_flag();
        self.cuts.register(base, item)?;
        match flag {
            Some(flag) => self.variables.register(base, flag),
            None => Ok(()),
        }
    }

    pub fn register_variable(&mut self, base: &str, item: Scoped<f64>) -> Result<(), RegistryError> {
        self.variables.register(base, item)
    }

    pub fn register_selector(
        &mut self,
        base: &str,
        item: Scoped<Option<usize>>,
    ) -> Result<(), RegistryError> {
        self.selectors.register(base, item)
    }

    pub fn finish(self) -> Catalog {
        Catalog {
            cuts: self.cuts,
            variables: self.variables,
            selectors: self.selectors,
        }
    }
}

/// Runs `registrations` in order and freezes the result.
pub fn bootstrap_with(registrations: &[Registration]) -> Result<Catalog, RegistryError> {
    let mut builder = CatalogBuilder::new();
    for registration in registrations {
        registration(&mut builder)?;
    }
    let catalog = builder.finish();
    tracing::debug!(
        cuts = catalog.cuts.total(),
        variables = catalog.variables.total(),
        selectors = catalog.selectors.total(),
        "catalog bootstrapped"
    );
    Ok(catalog)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryListing {
    pub registry: String,
    pub names: Vec<String>,
}

/// Read-only view of everything registered at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    cuts: Tables<bool>,
    variables: Tables<f64>,
    selectors: Tables<Option<usize>>,
}

impl Catalog {
    pub fn cuts(&self) -> &Tables<bool> {
        &self.cuts
    }

    pub fn variables(&self) -> &Tables<f64> {
        &self.variables
    }

    pub fn selectors(&self) -> &Tables<Option<usize>> {
        &self.selectors
    }

    /// Late registration of the category classifier as the truth
    /// variable `category`. Allowed once per catalog.
    pub fn publish_category(
        &mut self,
        classifier: Bound<TrueInteraction, f64>,
    ) -> Result<(), RegistryError> {
        self.variables
            .insert(CATEGORY_VARIABLE, Signature::Bound(classifier))?;
        tracing::debug!("category classifier published");
        Ok(())
    }

    /// Every non-empty registry with its names, cuts first, then variables,
    /// then selectors.
    pub fn listing(&self) -> Vec<RegistryListing> {
        let mut out = Vec::new();
        self.cuts.listing(&mut out);
        self.variables.listing(&mut out);
        self.selectors.listing(&mut out);
        out
    }
}

pub fn listing_json(catalog: &Catalog) -> serde_json::Value {
    serde_json::json!({
        "schema": CATALOG_LISTING_SCHEMA,
        "kind": CATALOG_LISTING_KIND,
        "registries": catalog.listing(),
    })
}
