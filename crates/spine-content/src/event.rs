//! Event-level (whole spill) cuts and variables, and beam-record cuts.

use spine_kernel::model::{BeamSpill, Spill};
use spine_kernel::{Arity, CatalogBuilder, RegistryError, scoped};

use crate::particle::flag;

/// Starting value for the closest-flash search; kept when no flash exists.
const NO_FLASH_TIME: f64 = 10000.0;

// --- event cuts ----------------------------------------------------------

pub fn no_cut(_: &Spill) -> bool {
    true
}

/// With two parameters, a `[low, high]` window on the global trigger time.
pub fn global_trigger_time_cut(spill: &Spill, parameters: &[f64]) -> bool {
    match parameters {
        [low, high] => {
            let time = spill.header.trigger.global_trigger_time;
            time >= *low && time <= *high
        }
        _ => true,
    }
}

// --- spill cuts ----------------------------------------------------------

pub fn no_spill_cut(_: &BeamSpill) -> bool {
    true
}

/// Standard beam quality: toroid intensities, loss monitors, and horn
/// current all in range. Any missing reading fails the spill.
pub fn beam_quality_cut(beam: &BeamSpill) -> bool {
    let readings = [beam.tor860, beam.tor875, beam.lm875a, beam.lm875b, beam.lm875c, beam.thcurr];
    if readings.iter().any(|value| value.is_nan()) {
        return false;
    }
    beam.tor860 > 1e11
        && beam.tor875 > 1e11
        && beam.lm875a > 1e-2
        && beam.lm875b > 1e-2
        && beam.lm875c > 1e-2
        && beam.thcurr > 173.0
        && beam.thcurr < 175.0
}

// --- event variables -----------------------------------------------------

pub fn ntrue(spill: &Spill) -> f64 {
    spill.truth.len() as f64
}

pub fn nreco(spill: &Spill) -> f64 {
    spill.reco.len() as f64
}

pub fn is_first_in_subrun(spill: &Spill) -> f64 {
    flag(spill.header.first_in_subrun)
}

pub fn pot(spill: &Spill) -> f64 {
    spill.header.pot
}

/// Summed toroid intensity over the spill's BNB records, optionally scaled.
pub fn pot_from_spillinfo(spill: &Spill, parameters: &[f64]) -> f64 {
    let scale = parameters.first().copied().unwrap_or(1.0);
    spill.header.bnb_info.iter().map(|beam| scale * beam.tor875).sum()
}

pub fn ngenevt(spill: &Spill) -> f64 {
    spill.header.ngenevt
}

pub fn nbnb(spill: &Spill) -> f64 {
    spill.header.bnb_info.len() as f64
}

pub fn nnumi(spill: &Spill) -> f64 {
    spill.header.numi_info.len() as f64
}

pub fn noffbeambnb(spill: &Spill) -> f64 {
    f64::from(spill.header.noffbeam_bnb)
}

pub fn noffbeamnumi(spill: &Spill) -> f64 {
    f64::from(spill.header.noffbeam_numi)
}

pub fn global_trigger_time(spill: &Spill) -> f64 {
    spill.header.trigger.global_trigger_time
}

pub fn beam_gate_time_abs(spill: &Spill) -> f64 {
    spill.header.trigger.beam_gate_time_abs
}

pub fn trigger_within_gate(spill: &Spill) -> f64 {
    spill.header.trigger.trigger_within_gate
}

/// First time of the optical flash closest to `parameters[0]`, shifted by
/// the trigger's offset within the gate.
pub fn time_of_flash_closest_to_trigger(spill: &Spill, parameters: &[f64]) -> f64 {
    let offset = parameters[0];
    let closest = spill
        .opflashes
        .iter()
        .map(|flash| flash.firsttime)
        .fold(NO_FLASH_TIME, |closest, time| {
            if (time - offset).abs() < (closest - offset).abs() { time } else { closest }
        });
    closest + spill.header.trigger.trigger_within_gate
}

pub fn run(spill: &Spill) -> f64 {
    spill.header.run as f64
}

pub fn subrun(spill: &Spill) -> f64 {
    spill.header.subrun as f64
}

pub fn event(spill: &Spill) -> f64 {
    spill.header.event as f64
}

pub fn register(builder: &mut CatalogBuilder) -> Result<(), RegistryError> {
    builder.register_cut("no_cut", scoped!(event, no_cut))?;
    builder.register_cut(
        "global_trigger_time_cut",
        scoped!(event, global_trigger_time_cut, Arity::AnyOf(&[0, 2])),
    )?;
    builder.register_cut("no_cut", scoped!(spill, no_spill_cut))?;
    builder.register_cut("beam_quality_cut", scoped!(spill, beam_quality_cut))?;

    builder.register_variable("ntrue", scoped!(event, ntrue))?;
    builder.register_variable("nreco", scoped!(event, nreco))?;
    builder.register_variable("is_first_in_subrun", scoped!(event, is_first_in_subrun))?;
    builder.register_variable("pot", scoped!(event, pot))?;
    builder.register_variable(
        "pot_from_spillinfo",
        scoped!(event, pot_from_spillinfo, Arity::AnyOf(&[0, 1])),
    )?;
    builder.register_variable("ngenevt", scoped!(event, ngenevt))?;
    builder.register_variable("nbnb", scoped!(event, nbnb))?;
    builder.register_variable("nnumi", scoped!(event, nnumi))?;
    builder.register_variable("noffbeambnb", scoped!(event, noffbeambnb))?;
    builder.register_variable("noffbeamnumi", scoped!(event, noffbeamnumi))?;
    builder.register_variable("global_trigger_time", scoped!(event, global_trigger_time))?;
    builder.register_variable("beam_gate_time_abs", scoped!(event, beam_gate_time_abs))?;
    builder.register_variable("trigger_within_gate", scoped!(event, trigger_within_gate))?;
    builder.register_variable(
        "time_of_flash_closest_to_trigger",
        scoped!(event, time_of_flash_closest_to_trigger, Arity::AtLeast(1)),
    )?;
    builder.register_variable("run", scoped!(event, run))?;
    builder.register_variable("subrun", scoped!(event, subrun))?;
    builder.register_variable("event", scoped!(event, event))
}
