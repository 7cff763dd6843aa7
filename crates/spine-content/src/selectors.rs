//! Particle selectors: pick one particle of an interaction by index.

use spine_kernel::model::{Interaction, ParticleRecord, pid};
use spine_kernel::{CatalogBuilder, RegistryError, scoped};

/// Index of the most energetic particle of class `class`, if any has
/// positive kinetic energy.
pub fn leading<P: ParticleRecord>(interaction: &Interaction<P>, class: i64) -> Option<usize> {
    let mut best = None;
    let mut best_ke = 0.0;
    for (idx, particle) in interaction.particles.iter().enumerate() {
        if particle.pid() == class && particle.ke() > best_ke {
            best_ke = particle.ke();
            best = Some(idx);
        }
    }
    best
}

pub fn leading_photon<P: ParticleRecord>(interaction: &Interaction<P>) -> Option<usize> {
    leading(interaction, pid::PHOTON)
}

pub fn leading_electron<P: ParticleRecord>(interaction: &Interaction<P>) -> Option<usize> {
    leading(interaction, pid::ELECTRON)
}

pub fn leading_muon<P: ParticleRecord>(interaction: &Interaction<P>) -> Option<usize> {
    leading(interaction, pid::MUON)
}

pub fn leading_pion<P: ParticleRecord>(interaction: &Interaction<P>) -> Option<usize> {
    leading(interaction, pid::PION)
}

pub fn leading_proton<P: ParticleRecord>(interaction: &Interaction<P>) -> Option<usize> {
    leading(interaction, pid::PROTON)
}

pub fn register(builder: &mut CatalogBuilder) -> Result<(), RegistryError> {
    builder.register_selector("leading_photon", scoped!(both, leading_photon))?;
    builder.register_selector("leading_electron", scoped!(both, leading_electron))?;
    builder.register_selector("leading_muon", scoped!(both, leading_muon))?;
    builder.register_selector("leading_pion", scoped!(both, leading_pion))?;
    builder.register_selector("leading_proton", scoped!(both, leading_proton))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_kernel::model::{ParticleCore, RecoInteraction, RecoParticle};

    fn shower(pid: i64, calo_ke: f64) -> RecoParticle {
        RecoParticle {
            core: ParticleCore {
                pid,
                calo_ke,
                ..ParticleCore::default()
            },
            ..RecoParticle::default()
        }
    }

    #[test]
    fn picks_highest_energy_of_the_class() {
        let interaction = RecoInteraction {
            particles: vec![
                shower(pid::PHOTON, 40.0),
                shower(pid::ELECTRON, 90.0),
                shower(pid::PHOTON, 120.0),
                shower(pid::PHOTON, 120.0),
            ],
            ..RecoInteraction::default()
        };
        assert_eq!(leading_photon(&interaction), Some(2));
        assert_eq!(leading_electron(&interaction), Some(1));
        assert_eq!(leading_muon(&interaction), None);
    }

    #[test]
    fn zero_energy_particles_are_never_selected() {
        let interaction = RecoInteraction {
            particles: vec![shower(pid::PHOTON, 0.0)],
            ..RecoInteraction::default()
        };
        assert_eq!(leading_photon(&interaction), None);
    }
}
