//! Interaction-level cuts and variables.

use spine_kernel::model::{Interaction, ParticleRecord, RecoInteraction, Vec3, pid};
use spine_kernel::{Arity, CatalogBuilder, RegistryError, scoped};

use crate::kinematics::{PROTON_BINDING_ENERGY, add, angle_between, magnitude, transverse_momentum};
use crate::particle::{
    MUON_SIGNAL_THRESHOLD, PROTON_SIGNAL_THRESHOLD, SHOWER_SIGNAL_THRESHOLD, final_state_signal,
    flag,
};

/// Threshold parameter is optional; absent means the class default.
const OPTIONAL_THRESHOLD: Arity = Arity::AnyOf(&[0, 1]);

/// Default kinetic-energy threshold (MeV) for multiplicity variables.
pub const MULTIPLICITY_THRESHOLD: f64 = 25.0;

fn threshold(parameters: &[f64], default: f64) -> f64 {
    parameters.first().copied().unwrap_or(default)
}

/// Primaries of class `class` with kinetic energy at or above `threshold`.
pub fn primaries_above<P: ParticleRecord>(interaction: &Interaction<P>, class: i64, threshold: f64) -> usize {
    interaction
        .particles
        .iter()
        .filter(|particle| particle.pid() == class && particle.is_primary() && particle.ke() >= threshold)
        .count()
}

// --- cuts ----------------------------------------------------------------

pub fn no_cut<P>(_: &Interaction<P>) -> bool {
    true
}

pub fn valid_flashmatch<P>(interaction: &Interaction<P>) -> bool {
    interaction.is_flash_matched
        && interaction
            .flash_times
            .first()
            .is_some_and(|time| !time.is_nan())
}

/// With two parameters, a `[low, high]` window on the matched flash time;
/// otherwise only a valid flash match is required.
pub fn flash_cut<P>(interaction: &Interaction<P>, parameters: &[f64]) -> bool {
    if !valid_flashmatch(interaction) {
        return false;
    }
    match parameters {
        [low, high] => {
            let time = interaction.flash_times[0];
            time >= *low && time <= *high
        }
        _ => true,
    }
}

pub fn neutrino<P>(interaction: &Interaction<P>) -> bool {
    interaction.nu_id >= 0
}

pub fn cosmic<P>(interaction: &Interaction<P>) -> bool {
    !neutrino(interaction)
}

pub fn iscc<P>(interaction: &Interaction<P>) -> bool {
    interaction.current_type == 0
}

/// Fiducial, excluding a known detector region with degraded response.
pub fn fiducial_cut<P>(interaction: &Interaction<P>) -> bool {
    let [x, y, z] = interaction.vertex;
    interaction.is_fiducial && !(x > 210.215 && y > 60.0 && z > 290.0 && z < 390.0)
}

pub fn containment_cut<P>(interaction: &Interaction<P>) -> bool {
    interaction.is_contained
}

pub fn single_michel<P: ParticleRecord>(interaction: &Interaction<P>) -> bool {
    interaction
        .particles
        .iter()
        .filter(|particle| particle.core().shape == 2)
        .count()
        == 1
}

macro_rules! per_class {
    ($single:ident, $none:ident, $multiplicity:ident, $class:expr, $default:expr) => {
        pub fn $single<P: ParticleRecord>(interaction: &Interaction<P>, parameters: &[f64]) -> bool {
            primaries_above(interaction, $class, threshold(parameters, $default)) == 1
        }

        pub fn $none<P: ParticleRecord>(interaction: &Interaction<P>, parameters: &[f64]) -> bool {
            primaries_above(interaction, $class, threshold(parameters, $default)) == 0
        }

        pub fn $multiplicity<P: ParticleRecord>(interaction: &Interaction<P>, parameters: &[f64]) -> f64 {
            primaries_above(interaction, $class, threshold(parameters, MULTIPLICITY_THRESHOLD)) as f64
        }
    };
}

per_class!(single_photon, no_photons, photon_multiplicity, pid::PHOTON, SHOWER_SIGNAL_THRESHOLD);
per_class!(single_electron, no_electrons, electron_multiplicity, pid::ELECTRON, SHOWER_SIGNAL_THRESHOLD);
per_class!(single_muon, no_muons, muon_multiplicity, pid::MUON, MUON_SIGNAL_THRESHOLD);
per_class!(single_pion, no_charged_pions, pion_multiplicity, pid::PION, SHOWER_SIGNAL_THRESHOLD);
per_class!(single_proton, no_protons, proton_multiplicity, pid::PROTON, PROTON_SIGNAL_THRESHOLD);

// --- variables -----------------------------------------------------------

pub fn neutrino_id<P>(interaction: &Interaction<P>) -> f64 {
    interaction.nu_id as f64
}

pub fn interaction_id<P>(interaction: &Interaction<P>) -> f64 {
    interaction.id as f64
}

pub fn iou<P>(interaction: &Interaction<P>) -> f64 {
    interaction.match_overlaps.first().copied().unwrap_or(f64::NAN)
}

pub fn containment<P>(interaction: &Interaction<P>) -> f64 {
    flag(interaction.is_contained)
}

pub fn fiducial<P>(interaction: &Interaction<P>) -> f64 {
    flag(interaction.is_fiducial)
}

pub fn vertex_x<P>(interaction: &Interaction<P>) -> f64 {
    interaction.vertex[0]
}

pub fn vertex_y<P>(interaction: &Interaction<P>) -> f64 {
    interaction.vertex[1]
}

pub fn vertex_z<P>(interaction: &Interaction<P>) -> f64 {
    interaction.vertex[2]
}

pub fn flash_time(interaction: &RecoInteraction) -> f64 {
    interaction.flash_times.first().copied().unwrap_or(f64::NAN)
}

pub fn flash_total_pe(interaction: &RecoInteraction) -> f64 {
    interaction.flash_total_pe
}

pub fn flash_hypothesis(interaction: &RecoInteraction) -> f64 {
    interaction.flash_hypo_pe
}

/// Deposited final-state energy in GeV. Protons contribute their kinetic
/// energy plus the binding energy spent freeing them.
pub fn visible_energy<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    let total: f64 = interaction
        .particles
        .iter()
        .filter(|particle| final_state_signal(*particle))
        .map(|particle| {
            if particle.pid() == pid::PROTON {
                particle.energy() - (particle.mass() - PROTON_BINDING_ENERGY)
            } else {
                particle.energy()
            }
        })
        .sum();
    total / 1000.0
}

pub fn particle_count<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    interaction
        .particles
        .iter()
        .filter(|particle| final_state_signal(*particle))
        .count() as f64
}

/// Summed transverse momentum of final-state leptons and hadrons.
struct TransverseSums {
    lepton: Vec3,
    hadronic: Vec3,
}

impl TransverseSums {
    fn of<P: ParticleRecord>(interaction: &Interaction<P>) -> Self {
        let mut sums = Self {
            lepton: [0.0; 3],
            hadronic: [0.0; 3],
        };
        for particle in interaction.particles.iter().filter(|particle| final_state_signal(*particle)) {
            let pt = transverse_momentum(particle.core().momentum);
            match particle.pid() {
                pid::ELECTRON | pid::MUON => sums.lepton = add(sums.lepton, pt),
                class if class > pid::MUON => sums.hadronic = add(sums.hadronic, pt),
                _ => {}
            }
        }
        sums
    }

    fn total(&self) -> Vec3 {
        add(self.lepton, self.hadronic)
    }
}

/// Transverse momentum imbalance.
pub fn dpt<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    magnitude(TransverseSums::of(interaction).total())
}

/// Transverse opening angle between the lepton and the hadronic system.
pub fn dphit<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    let sums = TransverseSums::of(interaction);
    angle_between(sums.lepton, sums.hadronic.map(|component| -component))
}

/// Angle between the imbalance and the reversed lepton transverse momentum.
pub fn dalphat<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    let sums = TransverseSums::of(interaction);
    angle_between(sums.total(), sums.lepton.map(|component| -component))
}

pub fn register_cuts(builder: &mut CatalogBuilder) -> Result<(), RegistryError> {
    builder.register_cut("no_cut", scoped!(both, no_cut))?;
    builder.register_cut("valid_flashmatch", scoped!(both, valid_flashmatch))?;
    builder.register_cut("flash_cut", scoped!(both, flash_cut, Arity::Any))?;
    builder.register_cut("fiducial_cut", scoped!(both, fiducial_cut))?;
    builder.register_cut("containment_cut", scoped!(both, containment_cut))?;
    builder.register_cut("single_michel", scoped!(both, single_michel))?;

    builder.register_cut("single_photon", scoped!(both, single_photon, OPTIONAL_THRESHOLD))?;
    builder.register_cut("single_electron", scoped!(both, single_electron, OPTIONAL_THRESHOLD))?;
    builder.register_cut("single_muon", scoped!(both, single_muon, OPTIONAL_THRESHOLD))?;
    builder.register_cut("single_pion", scoped!(both, single_pion, OPTIONAL_THRESHOLD))?;
    builder.register_cut("single_proton", scoped!(both, single_proton, OPTIONAL_THRESHOLD))?;
    builder.register_cut("no_photons", scoped!(both, no_photons, OPTIONAL_THRESHOLD))?;
    builder.register_cut("no_electrons", scoped!(both, no_electrons, OPTIONAL_THRESHOLD))?;
    builder.register_cut("no_muons", scoped!(both, no_muons, OPTIONAL_THRESHOLD))?;
    builder.register_cut("no_charged_pions", scoped!(both, no_charged_pions, OPTIONAL_THRESHOLD))?;
    builder.register_cut("no_protons", scoped!(both, no_protons, OPTIONAL_THRESHOLD))?;

    builder.register_cut("neutrino", scoped!(true, neutrino))?;
    builder.register_cut("cosmic", scoped!(true, cosmic))?;
    builder.register_cut("iscc", scoped!(true, iscc))
}

pub fn register_variables(builder: &mut CatalogBuilder) -> Result<(), RegistryError> {
    builder.register_variable("neutrino_id", scoped!(true, neutrino_id))?;
    builder.register_variable("interaction_id", scoped!(both, interaction_id))?;
    builder.register_variable("iou", scoped!(both, iou))?;
    builder.register_variable("containment", scoped!(both, containment))?;
    builder.register_variable("fiducial", scoped!(both, fiducial))?;
    builder.register_variable("vertex_x", scoped!(both, vertex_x))?;
    builder.register_variable("vertex_y", scoped!(both, vertex_y))?;
    builder.register_variable("vertex_z", scoped!(both, vertex_z))?;
    builder.register_variable("visible_energy", scoped!(both, visible_energy))?;
    builder.register_variable("particle_count", scoped!(both, particle_count))?;
    builder.register_variable("dpT", scoped!(both, dpt))?;
    builder.register_variable("dphiT", scoped!(both, dphit))?;
    builder.register_variable("dalphaT", scoped!(both, dalphat))?;

    builder.register_variable("photon_multiplicity", scoped!(both, photon_multiplicity, OPTIONAL_THRESHOLD))?;
    builder.register_variable("electron_multiplicity", scoped!(both, electron_multiplicity, OPTIONAL_THRESHOLD))?;
    builder.register_variable("muon_multiplicity", scoped!(both, muon_multiplicity, OPTIONAL_THRESHOLD))?;
    builder.register_variable("pion_multiplicity", scoped!(both, pion_multiplicity, OPTIONAL_THRESHOLD))?;
    builder.register_variable("proton_multiplicity", scoped!(both, proton_multiplicity, OPTIONAL_THRESHOLD))?;

    builder.register_variable("flash_time", scoped!(reco, flash_time))?;
    builder.register_variable("flash_total_pe", scoped!(reco, flash_total_pe))?;
    builder.register_variable("flash_hypothesis", scoped!(reco, flash_hypothesis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_kernel::model::{ParticleCore, TrueInteraction, TrueParticle, mass_for_pid};

    fn particle(pid: i64, ke: f64, momentum: Vec3) -> TrueParticle {
        let mass = mass_for_pid(pid);
        TrueParticle {
            core: ParticleCore {
                pid,
                is_primary: true,
                momentum,
                ..ParticleCore::default()
            },
            energy_init: ke + mass,
            mass,
            t: 0.0,
        }
    }

    fn interaction(particles: Vec<TrueParticle>) -> TrueInteraction {
        TrueInteraction {
            particles,
            ..TrueInteraction::default()
        }
    }

    #[test]
    fn flash_cut_requires_valid_match_and_window() {
        let mut candidate = interaction(Vec::new());
        assert!(!flash_cut(&candidate, &[]));
        candidate.is_flash_matched = true;
        candidate.flash_times = vec![0.8];
        assert!(flash_cut(&candidate, &[]));
        assert!(flash_cut(&candidate, &[0.0, 1.6]));
        assert!(!flash_cut(&candidate, &[1.0, 1.6]));
        candidate.flash_times = vec![f64::NAN];
        assert!(!valid_flashmatch(&candidate));
    }

    #[test]
    fn fiducial_cut_excludes_degraded_region() {
        let mut candidate = interaction(Vec::new());
        candidate.is_fiducial = true;
        candidate.vertex = [250.0, 80.0, 300.0];
        assert!(!fiducial_cut(&candidate));
        candidate.vertex = [250.0, 80.0, 400.0];
        assert!(fiducial_cut(&candidate));
    }

    #[test]
    fn single_particle_cuts_take_optional_threshold() {
        let candidate = interaction(vec![
            particle(pid::MUON, 200.0, [0.0; 3]),
            particle(pid::PROTON, 60.0, [0.0; 3]),
            particle(pid::PROTON, 30.0, [0.0; 3]),
        ]);
        assert!(single_muon(&candidate, &[]));
        assert!(!single_muon(&candidate, &[250.0]));
        assert!(single_proton(&candidate, &[]));
        assert!(!single_proton(&candidate, &[20.0]));
        assert!(no_photons(&candidate, &[]));
        assert_eq!(proton_multiplicity(&candidate, &[]), 2.0);
        assert_eq!(proton_multiplicity(&candidate, &[50.0]), 1.0);
    }

    #[test]
    fn secondaries_do_not_count() {
        let mut muon = particle(pid::MUON, 500.0, [0.0; 3]);
        muon.core.is_primary = false;
        let candidate = interaction(vec![muon]);
        assert!(no_muons(&candidate, &[]));
        assert_eq!(particle_count(&candidate), 0.0);
    }

    #[test]
    fn visible_energy_adds_binding_energy_for_protons() {
        let candidate = interaction(vec![
            particle(pid::MUON, 400.0, [0.0; 3]),
            particle(pid::PROTON, 100.0, [0.0; 3]),
        ]);
        let expected = (400.0 + mass_for_pid(pid::MUON) + 100.0 + PROTON_BINDING_ENERGY) / 1000.0;
        assert!((visible_energy(&candidate) - expected).abs() < 1e-9);
    }

    #[test]
    fn balanced_transverse_momentum() {
        let candidate = interaction(vec![
            particle(pid::MUON, 400.0, [100.0, 0.0, 300.0]),
            particle(pid::PROTON, 100.0, [-100.0, 0.0, 200.0]),
        ]);
        assert!(dpt(&candidate).abs() < 1e-9);
        assert!(dphit(&candidate).abs() < 1e-9);
        assert!(dalphat(&candidate).is_nan());
    }

    #[test]
    fn truth_only_cuts() {
        let mut candidate = interaction(Vec::new());
        assert!(cosmic(&candidate));
        candidate.nu_id = 0;
        candidate.current_type = 0;
        assert!(neutrino(&candidate) && iscc(&candidate));
        assert!(iou(&candidate).is_nan());
    }
}
