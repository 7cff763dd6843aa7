//! # Spine Content
//!
//! The selection content shipped with the tool: every cut, variable, and
//! selector a configuration can name, grouped by the object level it reads.
//!
//! ```text
//!   interaction ── cuts, variables (truth, reco, or both)
//!   particle    ── cuts, variables, reco-only scorers
//!   selectors   ── pick one particle of an interaction
//!   event       ── whole-spill cuts and variables, beam-record cuts
//!   mctruth     ── generator-level neutrino variables
//!   pi0         ── photon pairs read as neutral-pion decays
//! ```
//!
//! [`bootstrap`] runs every registration in [`REGISTRATIONS`] order and
//! returns the sealed catalog. A name collision in any registry aborts
//! startup.

pub mod event;
pub mod interaction;
pub mod kinematics;
pub mod mctruth;
pub mod particle;
pub mod pi0;
pub mod selectors;

use spine_kernel::{Catalog, Registration, RegistryError, bootstrap_with};

/// Registration phase, in load order.
pub const REGISTRATIONS: &[Registration] = &[
    interaction::register_cuts,
    interaction::register_variables,
    particle::register_cuts,
    particle::register_variables,
    selectors::register,
    event::register,
    mctruth::register,
    pi0::register,
];

/// Builds the catalog of all shipped content.
pub fn bootstrap() -> Result<Catalog, RegistryError> {
    let catalog = bootstrap_with(REGISTRATIONS)?;
    tracing::info!(
        registrations = REGISTRATIONS.len(),
        "selection content loaded"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_kernel::model::{RecoInteraction, RecoParticle, Spill, TrueInteraction};

    #[test]
    fn bootstrap_has_no_collisions() {
        let catalog = bootstrap().expect("bootstrap");
        assert!(catalog.variables().lookup::<TrueInteraction>("category").is_err());
        assert!(catalog.cuts().lookup::<TrueInteraction>("iscc").is_ok());
        assert!(catalog.cuts().lookup::<RecoInteraction>("iscc").is_err());
        assert!(catalog.variables().lookup::<RecoInteraction>("flash_time").is_ok());
        assert!(catalog.variables().lookup::<RecoParticle>("lax_muon_pid").is_ok());
        assert!(catalog.variables().lookup::<Spill>("nreco").is_ok());
        assert!(catalog.variables().lookup::<RecoInteraction>("pi0_mass").is_ok());
        assert!(catalog.variables().lookup::<TrueInteraction>("valid_pi0_mass_cut").is_ok());
    }

    #[test]
    fn registering_the_content_twice_fails() {
        let doubled: [Registration; 2] = [interaction::register_cuts, interaction::register_cuts];
        let err = bootstrap_with(&doubled).err().expect("collision");
        assert_eq!(
            err,
            RegistryError::DuplicateName {
                registry: "cut<true_interaction>".to_string(),
                name: "true_no_cut".to_string(),
            }
        );
    }

    #[test]
    fn generator_and_beam_registries() {
        let catalog = bootstrap().expect("bootstrap");
        let listing: Vec<_> = catalog
            .listing()
            .into_iter()
            .filter(|entry| entry.registry.ends_with("<spill>") || entry.registry.ends_with("<mctruth>"))
            .collect();
        insta::assert_json_snapshot!(listing, @r#"
        [
          {
            "registry": "cut<spill>",
            "names": [
              "beam_quality_cut",
              "no_cut"
            ]
          },
          {
            "registry": "variable<mctruth>",
            "names": [
              "baseline",
              "cc",
              "interaction_mode",
              "interaction_type",
              "neutrino_energy",
              "pdg"
            ]
          }
        ]
        "#);
    }
}
