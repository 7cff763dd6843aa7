//! Particle-level cuts and variables.
//!
//! Most content is written once over [`ParticleRecord`] and registered for
//! both sides. Score-based reinterpretations only exist for reconstructed
//! particles; `in_time` only for true particles, which carry a creation
//! time.

use spine_kernel::model::{ParticleRecord, RecoParticle, TrueParticle, pid};
use spine_kernel::{Arity, CatalogBuilder, RegistryError, scoped};

use crate::kinematics::{finite_or_nan, magnitude, near_boundary};

/// Kinetic-energy thresholds (MeV) a primary must exceed to count as a
/// visible final-state particle.
pub const MUON_SIGNAL_THRESHOLD: f64 = 143.425;
pub const SHOWER_SIGNAL_THRESHOLD: f64 = 25.0;
pub const PROTON_SIGNAL_THRESHOLD: f64 = 50.0;

/// Primary classification score above which the lax classifier calls a
/// particle primary.
const LAX_PRIMARY_SCORE: f64 = 0.10;
/// Muon score above which the lax classifier calls a particle a muon.
const LAX_MUON_SCORE: f64 = 0.25;

pub(crate) fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

fn first_or_nan(values: &[f64]) -> f64 {
    values.first().copied().unwrap_or(f64::NAN)
}

fn by_pid(values: &[f64], pid: i64) -> f64 {
    usize::try_from(pid)
        .ok()
        .and_then(|idx| values.get(idx))
        .copied()
        .map_or(f64::NAN, finite_or_nan)
}

// --- cuts ----------------------------------------------------------------

pub fn is_primary<P: ParticleRecord>(particle: &P) -> bool {
    particle.is_primary()
}

pub fn containment_cut<P: ParticleRecord>(particle: &P) -> bool {
    particle.is_contained()
}

/// A primary above its class's visibility threshold. Muons use their own
/// threshold; photons, electrons, and pions share the shower threshold.
pub fn final_state_signal<P: ParticleRecord>(particle: &P) -> bool {
    if !particle.is_primary() {
        return false;
    }
    let ke = particle.ke();
    match particle.pid() {
        pid::MUON => ke > MUON_SIGNAL_THRESHOLD,
        pid::PROTON => ke > PROTON_SIGNAL_THRESHOLD,
        class if class < pid::PROTON => ke > SHOWER_SIGNAL_THRESHOLD,
        _ => false,
    }
}

pub fn is_pid<P: ParticleRecord>(particle: &P, parameters: &[f64]) -> bool {
    particle.pid() as f64 == parameters[0]
}

/// A track whose two ends both sit on the detector boundary.
pub fn throughgoing<P: ParticleRecord>(particle: &P) -> bool {
    let core = particle.core();
    particle.pid() > pid::ELECTRON && near_boundary(core.start_point) && near_boundary(core.end_point)
}

/// Creation time (µs) strictly inside the `[low, high]` window.
pub fn in_time(particle: &TrueParticle, parameters: &[f64]) -> bool {
    let t = 0.001 * particle.t;
    t > parameters[0] && t < parameters[1]
}

// --- variables -----------------------------------------------------------

pub fn particle_id<P: ParticleRecord>(particle: &P) -> f64 {
    particle.pid() as f64
}

pub fn primary_classification<P: ParticleRecord>(particle: &P) -> f64 {
    flag(particle.is_primary())
}

pub fn semantic_type<P: ParticleRecord>(particle: &P) -> f64 {
    particle.core().shape as f64
}

pub fn iou<P: ParticleRecord>(particle: &P) -> f64 {
    first_or_nan(&particle.core().match_overlaps)
}

pub fn containment<P: ParticleRecord>(particle: &P) -> f64 {
    flag(particle.is_contained())
}

pub fn mass<P: ParticleRecord>(particle: &P) -> f64 {
    particle.mass()
}

pub fn ke<P: ParticleRecord>(particle: &P) -> f64 {
    particle.ke()
}

pub fn energy<P: ParticleRecord>(particle: &P) -> f64 {
    particle.energy()
}

pub fn calo_ke<P: ParticleRecord>(particle: &P) -> f64 {
    particle.core().calo_ke
}

pub fn length<P: ParticleRecord>(particle: &P) -> f64 {
    particle.core().length
}

macro_rules! component {
    ($name:ident, $field:ident, $axis:literal) => {
        pub fn $name<P: ParticleRecord>(particle: &P) -> f64 {
            finite_or_nan(particle.core().$field[$axis])
        }
    };
}

component!(start_x, start_point, 0);
component!(start_y, start_point, 1);
component!(start_z, start_point, 2);
component!(end_x, end_point, 0);
component!(end_y, end_point, 1);
component!(end_z, end_point, 2);
component!(px, momentum, 0);
component!(py, momentum, 1);
component!(pz, momentum, 2);

pub fn momentum<P: ParticleRecord>(particle: &P) -> f64 {
    magnitude(particle.core().momentum)
}

/// Cosine of the initial direction with respect to the beam axis.
pub fn cos_theta<P: ParticleRecord>(particle: &P) -> f64 {
    particle.core().start_dir[2]
}

// --- reconstructed-only scorers ------------------------------------------

pub fn default_pid(particle: &RecoParticle) -> f64 {
    particle.core.pid as f64
}

/// Calls a muon whenever its score clears a low bar, otherwise the
/// highest-scoring class.
pub fn lax_muon_pid(particle: &RecoParticle) -> f64 {
    let scores = &particle.pid_scores;
    if scores[pid::MUON as usize] > LAX_MUON_SCORE {
        return pid::MUON as f64;
    }
    let (best, _) = scores
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, top), (idx, &score)| {
            if score > top { (idx, score) } else { (best, top) }
        });
    best as f64
}

pub fn default_primary_classification(particle: &RecoParticle) -> f64 {
    flag(particle.core.is_primary)
}

pub fn lax_primary_classification(particle: &RecoParticle) -> f64 {
    flag(particle.primary_scores[1] > LAX_PRIMARY_SCORE)
}

pub fn csda_ke(particle: &RecoParticle) -> f64 {
    by_pid(&particle.csda_ke_per_pid, particle.core.pid)
}

pub fn mcs_ke(particle: &RecoParticle) -> f64 {
    by_pid(&particle.mcs_ke_per_pid, particle.core.pid)
}

pub fn register_cuts(builder: &mut CatalogBuilder) -> Result<(), RegistryError> {
    builder.register_cut("is_primary", scoped!(both_particle, is_primary))?;
    builder.register_cut("containment_cut", scoped!(both_particle, containment_cut))?;
    builder.register_cut("final_state_signal", scoped!(both_particle, final_state_signal))?;
    builder.register_cut("is_pid", scoped!(both_particle, is_pid, Arity::Exactly(1)))?;
    builder.register_cut("throughgoing", scoped!(both_particle, throughgoing))?;
    builder.register_cut("in_time", scoped!(true_particle, in_time, Arity::Exactly(2)))
}

pub fn register_variables(builder: &mut CatalogBuilder) -> Result<(), RegistryError> {
    builder.register_variable("pid", scoped!(both_particle, particle_id))?;
    builder.register_variable(
        "primary_classification",
        scoped!(both_particle, primary_classification),
    )?;
    builder.register_variable("semantic_type", scoped!(both_particle, semantic_type))?;
    builder.register_variable("iou", scoped!(both_particle, iou))?;
    builder.register_variable("containment", scoped!(both_particle, containment))?;
    builder.register_variable("mass", scoped!(both_particle, mass))?;
    builder.register_variable("ke", scoped!(both_particle, ke))?;
    builder.register_variable("energy", scoped!(both_particle, energy))?;
    builder.register_variable("calo_ke", scoped!(both_particle, calo_ke))?;
    builder.register_variable("length", scoped!(both_particle, length))?;
    builder.register_variable("start_x", scoped!(both_particle, start_x))?;
    builder.register_variable("start_y", scoped!(both_particle, start_y))?;
    builder.register_variable("start_z", scoped!(both_particle, start_z))?;
    builder.register_variable("end_x", scoped!(both_particle, end_x))?;
    builder.register_variable("end_y", scoped!(both_particle, end_y))?;
    builder.register_variable("end_z", scoped!(both_particle, end_z))?;
    builder.register_variable("px", scoped!(both_particle, px))?;
    builder.register_variable("py", scoped!(both_particle, py))?;
    builder.register_variable("pz", scoped!(both_particle, pz))?;
    builder.register_variable("momentum", scoped!(both_particle, momentum))?;
    builder.register_variable("cos_theta", scoped!(both_particle, cos_theta))?;

    builder.register_variable("default_pid", scoped!(reco_particle, default_pid))?;
    builder.register_variable("lax_muon_pid", scoped!(reco_particle, lax_muon_pid))?;
    builder.register_variable(
        "default_primary_classification",
        scoped!(reco_particle, default_primary_classification),
    )?;
    builder.register_variable(
        "lax_primary_classification",
        scoped!(reco_particle, lax_primary_classification),
    )?;
    builder.register_variable("csda_ke", scoped!(reco_particle, csda_ke))?;
    builder.register_variable("mcs_ke", scoped!(reco_particle, mcs_ke))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_kernel::model::ParticleCore;

    fn true_particle(pid: i64, ke: f64, primary: bool) -> TrueParticle {
        let mass = spine_kernel::model::mass_for_pid(pid);
        TrueParticle {
            core: ParticleCore {
                pid,
                is_primary: primary,
                ..ParticleCore::default()
            },
            energy_init: ke + mass,
            mass,
            t: 0.0,
        }
    }

    #[test]
    fn final_state_signal_uses_class_thresholds() {
        assert!(final_state_signal(&true_particle(pid::MUON, 150.0, true)));
        assert!(!final_state_signal(&true_particle(pid::MUON, 100.0, true)));
        assert!(final_state_signal(&true_particle(pid::PROTON, 60.0, true)));
        assert!(!final_state_signal(&true_particle(pid::PROTON, 40.0, true)));
        assert!(final_state_signal(&true_particle(pid::PHOTON, 30.0, true)));
        assert!(!final_state_signal(&true_particle(pid::PION, 30.0, false)));
    }

    #[test]
    fn in_time_window_is_exclusive_and_in_microseconds() {
        let mut particle = true_particle(pid::MUON, 200.0, true);
        particle.t = 1500.0;
        assert!(in_time(&particle, &[0.0, 1.6]));
        assert!(!in_time(&particle, &[1.5, 1.6]));
        assert!(!in_time(&particle, &[0.0, 1.5]));
    }

    #[test]
    fn throughgoing_needs_a_track_crossing_the_volume() {
        let mut particle = true_particle(pid::MUON, 2000.0, true);
        particle.core.start_point = [-200.0, 133.0, 0.0];
        particle.core.end_point = [-200.0, -180.0, 10.0];
        assert!(throughgoing(&particle));
        particle.core.end_point = [-200.0, 0.0, 10.0];
        assert!(!throughgoing(&particle));
        particle.core.pid = pid::ELECTRON;
        particle.core.end_point = [-200.0, -180.0, 10.0];
        assert!(!throughgoing(&particle));
    }

    #[test]
    fn lax_muon_pid_prefers_muon_when_plausible() {
        let mut particle = RecoParticle {
            pid_scores: [0.0, 0.0, 0.3, 0.0, 0.7],
            ..RecoParticle::default()
        };
        assert_eq!(lax_muon_pid(&particle), 2.0);
        particle.pid_scores = [0.1, 0.0, 0.2, 0.6, 0.1];
        assert_eq!(lax_muon_pid(&particle), 3.0);
    }

    #[test]
    fn lax_primary_uses_primary_score() {
        let particle = RecoParticle {
            primary_scores: [0.85, 0.15],
            ..RecoParticle::default()
        };
        assert_eq!(lax_primary_classification(&particle), 1.0);
        assert_eq!(default_primary_classification(&particle), 0.0);
    }

    #[test]
    fn per_pid_estimates_follow_assigned_class() {
        let mut particle = RecoParticle {
            csda_ke_per_pid: [0.0, 0.0, 310.0, 280.0, f64::INFINITY],
            mcs_ke_per_pid: [0.0, 0.0, 350.0, 0.0, 0.0],
            ..RecoParticle::default()
        };
        particle.core.pid = pid::MUON;
        assert_eq!(csda_ke(&particle), 310.0);
        assert_eq!(mcs_ke(&particle), 350.0);
        particle.core.pid = pid::PROTON;
        assert!(csda_ke(&particle).is_nan());
        particle.core.pid = 9;
        assert!(mcs_ke(&particle).is_nan());
    }

    #[test]
    fn unset_endpoints_read_as_nan() {
        let mut particle = true_particle(pid::PHOTON, 50.0, true);
        particle.core.end_point = [f64::INFINITY, 1.0, f64::NEG_INFINITY];
        assert!(end_x(&particle).is_nan());
        assert_eq!(end_y(&particle), 1.0);
        assert!(end_z(&particle).is_nan());
        assert!(iou(&particle).is_nan());
    }
}
