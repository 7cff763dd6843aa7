//! Spill records: the fixed two-sided (truth/reco), three-level
//! (spill/interaction/particle) schema the kernel compiles against.
//!
//! Every cross-reference is an id into an arena owned by the [`Spill`]:
//! interaction match ids point into the opposite interaction collection,
//! particle match ids point into the opposite particle population, and
//! `nu_id` is an index into [`Spill::mc`]. Nothing here holds a reference
//! that could outlive the spill it was read from.

use serde::{Deserialize, Serialize};

pub type Vec3 = [f64; 3];

/// Number of particle classes carried by the per-class score arrays.
pub const PARTICLE_CLASSES: usize = 5;

pub mod pid {
    pub const PHOTON: i64 = 0;
    pub const ELECTRON: i64 = 1;
    pub const MUON: i64 = 2;
    pub const PION: i64 = 3;
    pub const PROTON: i64 = 4;
}

pub const ELECTRON_MASS: f64 = 0.5109989461;
pub const MUON_MASS: f64 = 105.6583745;
pub const PION_MASS: f64 = 139.57039;
pub const PROTON_MASS: f64 = 938.2720813;

/// One recorded trigger/gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spill {
    pub header: Header,
    pub reco: Vec<RecoInteraction>,
    pub truth: Vec<TrueInteraction>,
    /// Generator-level records, addressed by `TrueInteraction::nu_id`.
    pub mc: Vec<Neutrino>,
    pub opflashes: Vec<OpFlash>,
}

impl Spill {
    /// Generator-level parent of a truth interaction, if it has one.
    pub fn neutrino(&self, nu_id: i64) -> Option<&Neutrino> {
        usize::try_from(nu_id).ok().and_then(|idx| self.mc.get(idx))
    }

    pub fn reco_interaction(&self, id: i64) -> Option<&RecoInteraction> {
        self.reco.iter().find(|interaction| interaction.id == id)
    }

    pub fn true_interaction(&self, id: i64) -> Option<&TrueInteraction> {
        self.truth.iter().find(|interaction| interaction.id == id)
    }

    pub fn reco_particle(&self, id: i64) -> Option<&RecoParticle> {
        self.reco
            .iter()
            .flat_map(|interaction| interaction.particles.iter())
            .find(|particle| particle.core.id == id)
    }

    pub fn true_particle(&self, id: i64) -> Option<&TrueParticle> {
        self.truth
            .iter()
            .flat_map(|interaction| interaction.particles.iter())
            .find(|particle| particle.core.id == id)
    }
}

/// Event-level metadata and exposure accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub run: i64,
    pub subrun: i64,
    pub event: i64,
    pub ismc: bool,
    pub first_in_subrun: bool,
    pub pot: f64,
    pub ngenevt: f64,
    pub trigger: TriggerInfo,
    /// Beam conditions of the gate itself (real data only).
    pub beam: Option<BeamSpill>,
    pub bnb_info: Vec<BeamSpill>,
    pub numi_info: Vec<BeamSpill>,
    pub noffbeam_bnb: u32,
    pub noffbeam_numi: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerInfo {
    pub global_trigger_time: f64,
    pub beam_gate_time_abs: f64,
    pub trigger_within_gate: f64,
    pub beam_gate_det_time: f64,
    pub global_trigger_det_time: f64,
}

/// Beam monitoring record for one delivered spill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamSpill {
    pub tor860: f64,
    pub tor875: f64,
    pub lm875a: f64,
    pub lm875b: f64,
    pub lm875c: f64,
    pub thcurr: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpFlash {
    pub id: i64,
    pub time: f64,
    pub firsttime: f64,
    pub total_pe: f64,
}

/// Generator-level neutrino record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Neutrino {
    pub id: i64,
    pub energy: f64,
    pub baseline: f64,
    pub pdg: i64,
    pub iscc: bool,
    pub genie_mode: i64,
    pub genie_inttype: i64,
}

/// A reconstructed or true interaction candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interaction<P> {
    pub id: i64,
    pub vertex: Vec3,
    pub flash_times: Vec<f64>,
    pub is_flash_matched: bool,
    pub flash_total_pe: f64,
    pub flash_hypo_pe: f64,
    pub is_contained: bool,
    pub is_fiducial: bool,
    /// Index of the generator-level parent; negative for cosmics and for
    /// every reconstructed interaction.
    pub nu_id: i64,
    /// 0 for charged current, 1 for neutral current, -1 when undefined.
    pub current_type: i64,
    pub particles: Vec<P>,
    /// Candidate ids in the opposite collection, best overlap first.
    pub match_ids: Vec<i64>,
    pub match_overlaps: Vec<f64>,
}

impl<P> Default for Interaction<P> {
    fn default() -> Self {
        Self {
            id: 0,
            vertex: [0.0; 3],
            flash_times: Vec::new(),
            is_flash_matched: false,
            flash_total_pe: 0.0,
            flash_hypo_pe: 0.0,
            is_contained: false,
            is_fiducial: false,
            nu_id: -1,
            current_type: -1,
            particles: Vec::new(),
            match_ids: Vec::new(),
            match_overlaps: Vec::new(),
        }
    }
}

pub type RecoInteraction = Interaction<RecoParticle>;
pub type TrueInteraction = Interaction<TrueParticle>;

/// Fields shared by reconstructed and true particles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleCore {
    pub id: i64,
    pub interaction_id: i64,
    pub pid: i64,
    pub is_primary: bool,
    pub is_contained: bool,
    /// Semantic type: 0 shower, 1 track, 2 Michel, 3 delta, 4 low energy.
    pub shape: i64,
    pub momentum: Vec3,
    pub start_point: Vec3,
    pub end_point: Vec3,
    pub start_dir: Vec3,
    pub calo_ke: f64,
    pub length: f64,
    pub match_ids: Vec<i64>,
    pub match_overlaps: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoParticle {
    #[serde(flatten)]
    pub core: ParticleCore,
    pub pid_scores: [f64; PARTICLE_CLASSES],
    pub primary_scores: [f64; 2],
    pub csda_ke_per_pid: [f64; PARTICLE_CLASSES],
    pub mcs_ke_per_pid: [f64; PARTICLE_CLASSES],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrueParticle {
    #[serde(flatten)]
    pub core: ParticleCore,
    pub energy_init: f64,
    pub mass: f64,
    /// Creation time in ns.
    pub t: f64,
}

/// Uniform read access over both particle kinds, so content can be written
/// once and instantiated per side.
pub trait ParticleRecord {
    fn core(&self) -> &ParticleCore;

    /// Mass hypothesis in MeV (NaN for an unknown class).
    fn mass(&self) -> f64;

    /// Kinetic energy estimate in MeV.
    fn ke(&self) -> f64;

    fn id(&self) -> i64 {
        self.core().id
    }

    fn pid(&self) -> i64 {
        self.core().pid
    }

    fn is_primary(&self) -> bool {
        self.core().is_primary
    }

    fn is_contained(&self) -> bool {
        self.core().is_contained
    }

    fn energy(&self) -> f64 {
        self.ke() + self.mass()
    }

    fn match_ids(&self) -> &[i64] {
        &self.core().match_ids
    }
}

pub fn mass_for_pid(pid: i64) -> f64 {
    match pid {
        pid::PHOTON => 0.0,
        pid::ELECTRON => ELECTRON_MASS,
        pid::MUON => MUON_MASS,
        pid::PION => PION_MASS,
        pid::PROTON => PROTON_MASS,
        _ => f64::NAN,
    }
}

impl ParticleRecord for RecoParticle {
    fn core(&self) -> &ParticleCore {
        &self.core
    }

    fn mass(&self) -> f64 {
        mass_for_pid(self.core.pid)
    }

    // Showers use calorimetry; tracks use range when contained and
    // multiple scattering otherwise.
    fn ke(&self) -> f64 {
        if self.core.pid < pid::MUON {
            return self.core.calo_ke;
        }
        let per_pid = if self.core.is_contained {
            &self.csda_ke_per_pid
        } else {
            &self.mcs_ke_per_pid
        };
        usize::try_from(self.core.pid)
            .ok()
            .and_then(|idx| per_pid.get(idx))
            .copied()
            .filter(|ke| ke.is_finite())
            .unwrap_or(f64::NAN)
    }
}

impl ParticleRecord for TrueParticle {
    fn core(&self) -> &ParticleCore {
        &self.core
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn ke(&self) -> f64 {
        self.energy_init - self.mass
    }
}
