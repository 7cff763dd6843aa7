//! Neutral-pion content: the photon pair read as a pi0 decay, and the cuts
//! and variables built on it.
//!
//! Every variable here is NaN when the interaction has fewer than two
//! primary photons.

use spine_kernel::model::{Interaction, ParticleRecord, Vec3, pid};
use spine_kernel::{Arity, CatalogBuilder, RegistryError, scoped};

use crate::interaction::primaries_above;
use crate::kinematics::{BEAM_DIRECTION, add, dot, magnitude, scale};

/// Neutral pion mass, in MeV.
pub const PI0_MASS: f64 = 134.9768;

const THRESHOLD: Arity = Arity::Exactly(1);

/// Two primary photons of one interaction, ordered by kinetic energy.
#[derive(Debug)]
pub struct PhotonPair<'a, P> {
    pub leading: &'a P,
    pub subleading: &'a P,
    vertex: Vec3,
}

impl<'a, P: ParticleRecord> PhotonPair<'a, P> {
    fn ordered(vertex: Vec3, a: &'a P, b: &'a P) -> Self {
        let (leading, subleading) = if a.ke() > b.ke() { (a, b) } else { (b, a) };
        Self {
            leading,
            subleading,
            vertex,
        }
    }

    /// Unit vector from the vertex to where `photon` converts.
    fn direction(&self, photon: &P) -> Vec3 {
        let offset = add(photon.core().start_point, scale(self.vertex, -1.0));
        scale(offset, 1.0 / magnitude(offset))
    }

    fn conversion_distance(&self, photon: &P) -> f64 {
        magnitude(add(photon.core().start_point, scale(self.vertex, -1.0)))
    }

    pub fn cos_opening(&self) -> f64 {
        dot(self.direction(self.leading), self.direction(self.subleading))
    }

    /// Invariant mass of the pair, in MeV.
    pub fn mass(&self) -> f64 {
        (2.0 * self.leading.ke() * self.subleading.ke() * (1.0 - self.cos_opening())).sqrt()
    }

    /// Summed photon momentum, in MeV/c.
    pub fn momentum(&self) -> Vec3 {
        add(
            scale(self.direction(self.leading), self.leading.ke()),
            scale(self.direction(self.subleading), self.subleading.ke()),
        )
    }
}

/// The primary photon pair whose invariant mass lies closest to the pi0
/// mass. `None` with fewer than two primary photons.
pub fn photon_pair<P: ParticleRecord>(interaction: &Interaction<P>) -> Option<PhotonPair<'_, P>> {
    let photons: Vec<&P> = interaction
        .particles
        .iter()
        .filter(|particle| particle.pid() == pid::PHOTON && particle.is_primary())
        .collect();
    let mut best: Option<(f64, PhotonPair<'_, P>)> = None;
    for (i, &first) in photons.iter().enumerate() {
        for &second in &photons[i + 1..] {
            let pair = PhotonPair::ordered(interaction.vertex, first, second);
            let distance = (pair.mass() - PI0_MASS).abs();
            if best.as_ref().is_none_or(|(current, _)| distance < *current) {
                best = Some((distance, pair));
            }
        }
    }
    best.map(|(_, pair)| pair)
}

fn with_pair<P: ParticleRecord>(interaction: &Interaction<P>, read: impl FnOnce(PhotonPair<'_, P>) -> f64) -> f64 {
    photon_pair(interaction).map_or(f64::NAN, read)
}

// --- cuts ----------------------------------------------------------------

pub fn at_least_two_photons<P: ParticleRecord>(interaction: &Interaction<P>, parameters: &[f64]) -> bool {
    primaries_above(interaction, pid::PHOTON, parameters[0]) >= 2
}

pub fn less_than_four_photons<P: ParticleRecord>(interaction: &Interaction<P>, parameters: &[f64]) -> bool {
    primaries_above(interaction, pid::PHOTON, parameters[0]) < 4
}

/// The most energetic primary photon clears the threshold.
pub fn leading_photon_ke_cut<P: ParticleRecord>(interaction: &Interaction<P>, parameters: &[f64]) -> bool {
    interaction
        .particles
        .iter()
        .filter(|particle| particle.pid() == pid::PHOTON && particle.is_primary())
        .map(|particle| particle.ke())
        .reduce(f64::max)
        .is_some_and(|ke| ke >= parameters[0])
}

pub fn valid_pi0_mass_cut<P: ParticleRecord>(interaction: &Interaction<P>, parameters: &[f64]) -> bool {
    pi0_mass(interaction) < parameters[0]
}

// --- variables -----------------------------------------------------------

/// MeV.
pub fn pi0_mass<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    with_pair(interaction, |pair| pair.mass())
}

/// GeV/c.
pub fn pi0_momentum<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    with_pair(interaction, |pair| magnitude(pair.momentum()) / 1000.0)
}

pub fn pi0_beam_costheta<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    with_pair(interaction, |pair| {
        let momentum = pair.momentum();
        dot(momentum, BEAM_DIRECTION) / magnitude(momentum)
    })
}

pub fn photons_costheta<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    with_pair(interaction, |pair| pair.cos_opening())
}

/// GeV.
pub fn leading_photon_energy<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    with_pair(interaction, |pair| pair.leading.ke() / 1000.0)
}

/// GeV.
pub fn subleading_photon_energy<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    with_pair(interaction, |pair| pair.subleading.ke() / 1000.0)
}

pub fn leading_photon_conversion_distance<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    with_pair(interaction, |pair| pair.conversion_distance(pair.leading))
}

pub fn subleading_photon_conversion_distance<P: ParticleRecord>(interaction: &Interaction<P>) -> f64 {
    with_pair(interaction, |pair| pair.conversion_distance(pair.subleading))
}

pub fn register(builder: &mut CatalogBuilder) -> Result<(), RegistryError> {
    builder.register_cut("at_least_two_photons", scoped!(both, at_least_two_photons, THRESHOLD))?;
    builder.register_cut("less_than_four_photons", scoped!(both, less_than_four_photons, THRESHOLD))?;
    builder.register_cut("leading_photon_ke_cut", scoped!(both, leading_photon_ke_cut, THRESHOLD))?;
    builder.register_cut("valid_pi0_mass_cut", scoped!(both, valid_pi0_mass_cut, THRESHOLD))?;

    builder.register_variable("pi0_mass", scoped!(both, pi0_mass))?;
    builder.register_variable("pi0_momentum", scoped!(both, pi0_momentum))?;
    builder.register_variable("pi0_beam_costheta", scoped!(both, pi0_beam_costheta))?;
    builder.register_variable("photons_costheta", scoped!(both, photons_costheta))?;
    builder.register_variable("leading_photon_energy", scoped!(both, leading_photon_energy))?;
    builder.register_variable("subleading_photon_energy", scoped!(both, subleading_photon_energy))?;
    builder.register_variable(
        "leading_photon_conversion_distance",
        scoped!(both, leading_photon_conversion_distance),
    )?;
    builder.register_variable(
        "subleading_photon_conversion_distance",
        scoped!(both, subleading_photon_conversion_distance),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_kernel::model::{ParticleCore, RecoInteraction, RecoParticle, TrueInteraction, TrueParticle};

    fn photon(energy: f64, start_point: Vec3) -> TrueParticle {
        TrueParticle {
            core: ParticleCore {
                pid: pid::PHOTON,
                is_primary: true,
                start_point,
                ..ParticleCore::default()
            },
            energy_init: energy,
            mass: 0.0,
            t: 0.0,
        }
    }

    fn interaction(particles: Vec<TrueParticle>) -> TrueInteraction {
        TrueInteraction {
            vertex: [1.0, 1.0, 1.0],
            particles,
            ..TrueInteraction::default()
        }
    }

    #[test]
    fn variables_are_nan_without_a_pair() {
        for candidate in [
            interaction(Vec::new()),
            interaction(vec![photon(300.0, [11.0, 1.0, 1.0])]),
        ] {
            assert!(photon_pair(&candidate).is_none());
            assert!(pi0_mass(&candidate).is_nan());
            assert!(pi0_momentum(&candidate).is_nan());
            assert!(pi0_beam_costheta(&candidate).is_nan());
            assert!(photons_costheta(&candidate).is_nan());
            assert!(leading_photon_energy(&candidate).is_nan());
            assert!(subleading_photon_energy(&candidate).is_nan());
            assert!(leading_photon_conversion_distance(&candidate).is_nan());
            assert!(subleading_photon_conversion_distance(&candidate).is_nan());
            assert!(!valid_pi0_mass_cut(&candidate, &[1000.0]));
        }
    }

    #[test]
    fn secondary_photons_do_not_form_a_pair() {
        let mut secondary = photon(100.0, [1.0, 11.0, 1.0]);
        secondary.core.is_primary = false;
        let candidate = interaction(vec![photon(200.0, [11.0, 1.0, 1.0]), secondary]);
        assert!(pi0_mass(&candidate).is_nan());
        assert!(!at_least_two_photons(&candidate, &[0.0]));
    }

    #[test]
    fn perpendicular_pair() {
        let candidate = interaction(vec![
            photon(100.0, [1.0, 11.0, 1.0]),
            photon(200.0, [11.0, 1.0, 1.0]),
        ]);
        assert!((pi0_mass(&candidate) - 200.0).abs() < 1e-9);
        assert!(photons_costheta(&candidate).abs() < 1e-12);
        assert_eq!(leading_photon_energy(&candidate), 0.2);
        assert_eq!(subleading_photon_energy(&candidate), 0.1);
        assert!((leading_photon_conversion_distance(&candidate) - 10.0).abs() < 1e-12);
        assert!((pi0_momentum(&candidate) - 50_000f64.sqrt() / 1000.0).abs() < 1e-12);
        assert!(pi0_beam_costheta(&candidate).abs() < 1e-12);
    }

    #[test]
    fn pair_closest_to_the_pion_mass_wins() {
        // 60 and 80 MeV back to back give sqrt(2 * 60 * 80 * 2) ~= 138.6 MeV.
        let candidate = interaction(vec![
            photon(60.0, [11.0, 1.0, 1.0]),
            photon(500.0, [1.0, 11.0, 1.0]),
            photon(80.0, [-9.0, 1.0, 1.0]),
        ]);
        let pair = photon_pair(&candidate).expect("pair");
        assert_eq!(pair.leading.ke(), 80.0);
        assert_eq!(pair.subleading.ke(), 60.0);
        assert!((pi0_mass(&candidate) - 19_200f64.sqrt()).abs() < 1e-9);
        assert!(valid_pi0_mass_cut(&candidate, &[PI0_MASS + 10.0]));
        assert!(!valid_pi0_mass_cut(&candidate, &[PI0_MASS]));
    }

    #[test]
    fn photon_count_cuts_take_a_threshold() {
        let candidate = interaction(vec![
            photon(30.0, [11.0, 1.0, 1.0]),
            photon(80.0, [1.0, 11.0, 1.0]),
            photon(120.0, [1.0, 1.0, 11.0]),
        ]);
        assert!(at_least_two_photons(&candidate, &[50.0]));
        assert!(!at_least_two_photons(&candidate, &[100.0]));
        assert!(less_than_four_photons(&candidate, &[0.0]));
        assert!(leading_photon_ke_cut(&candidate, &[120.0]));
        assert!(!leading_photon_ke_cut(&candidate, &[121.0]));
        assert!(!leading_photon_ke_cut(&interaction(Vec::new()), &[0.0]));
    }

    #[test]
    fn reco_photons_use_calorimetric_energy() {
        let shower = |calo_ke: f64, start_point: Vec3| RecoParticle {
            core: ParticleCore {
                pid: pid::PHOTON,
                is_primary: true,
                start_point,
                calo_ke,
                ..ParticleCore::default()
            },
            ..RecoParticle::default()
        };
        let candidate = RecoInteraction {
            particles: vec![shower(150.0, [10.0, 0.0, 0.0]), shower(50.0, [0.0, 0.0, 10.0])],
            ..RecoInteraction::default()
        };
        assert_eq!(leading_photon_energy(&candidate), 0.15);
        assert_eq!(subleading_photon_energy(&candidate), 0.05);
        assert!((pi0_mass(&candidate) - 15_000f64.sqrt()).abs() < 1e-9);
    }
}
