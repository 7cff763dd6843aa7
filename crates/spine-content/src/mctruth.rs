//! Generator-level neutrino variables.

use spine_kernel::model::Neutrino;
use spine_kernel::{CatalogBuilder, RegistryError, scoped};

use crate::particle::flag;

pub fn neutrino_energy(neutrino: &Neutrino) -> f64 {
    neutrino.energy
}

pub fn baseline(neutrino: &Neutrino) -> f64 {
    neutrino.baseline
}

pub fn pdg(neutrino: &Neutrino) -> f64 {
    neutrino.pdg as f64
}

pub fn cc(neutrino: &Neutrino) -> f64 {
    flag(neutrino.iscc)
}

pub fn interaction_mode(neutrino: &Neutrino) -> f64 {
    neutrino.genie_mode as f64
}

pub fn interaction_type(neutrino: &Neutrino) -> f64 {
    neutrino.genie_inttype as f64
}

pub fn register(builder: &mut CatalogBuilder) -> Result<(), RegistryError> {
    builder.register_variable("neutrino_energy", scoped!(mctruth, neutrino_energy))?;
    builder.register_variable("baseline", scoped!(mctruth, baseline))?;
    builder.register_variable("pdg", scoped!(mctruth, pdg))?;
    builder.register_variable("cc", scoped!(mctruth, cc))?;
    builder.register_variable("interaction_mode", scoped!(mctruth, interaction_mode))?;
    builder.register_variable("interaction_type", scoped!(mctruth, interaction_type))
}
