//! Vector helpers and detector geometry shared by content.

use spine_kernel::model::Vec3;

/// Neutrino beam direction in detector coordinates.
pub const BEAM_DIRECTION: Vec3 = [0.0, 0.0, 1.0];

/// Energy lost to nuclear binding per knocked-out proton, in MeV.
pub const PROTON_BINDING_ENERGY: f64 = 30.9;

/// Active volume of the two cryostats, in cm: `[x_min, x_max]` per
/// cryostat, then the shared y and z extents.
const CRYOSTATS_X: [[f64; 2]; 2] = [[-358.49, -61.94], [61.94, 358.49]];
const ACTIVE_Y: [f64; 2] = [-181.86, 134.96];
const ACTIVE_Z: [f64; 2] = [-894.95, 894.95];

/// Distance from a face of the active volume counted as "near".
const BOUNDARY_MARGIN: f64 = 5.0;

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn scale(a: Vec3, factor: f64) -> Vec3 {
    [a[0] * factor, a[1] * factor, a[2] * factor]
}

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn magnitude(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

/// Component of `momentum` along the beam.
pub fn longitudinal_momentum(momentum: Vec3) -> Vec3 {
    scale(BEAM_DIRECTION, dot(momentum, BEAM_DIRECTION))
}

/// Component of `momentum` transverse to the beam.
pub fn transverse_momentum(momentum: Vec3) -> Vec3 {
    add(momentum, scale(longitudinal_momentum(momentum), -1.0))
}

/// Opening angle between two vectors; NaN when either is null.
pub fn angle_between(a: Vec3, b: Vec3) -> f64 {
    (dot(a, b) / (magnitude(a) * magnitude(b))).acos()
}

fn within(value: f64, [low, high]: [f64; 2], margin: f64) -> bool {
    value > low + margin && value < high - margin
}

/// True when `point` lies within the margin of any face of the cryostat
/// containing it, or outside both cryostats.
pub fn near_boundary(point: Vec3) -> bool {
    let inside_deep = CRYOSTATS_X
        .iter()
        .any(|&x| within(point[0], x, BOUNDARY_MARGIN))
        && within(point[1], ACTIVE_Y, BOUNDARY_MARGIN)
        && within(point[2], ACTIVE_Z, BOUNDARY_MARGIN);
    !inside_deep
}

/// Replaces infinities (unset upstream) with the NaN sentinel.
pub fn finite_or_nan(value: f64) -> f64 {
    if value.is_infinite() { f64::NAN } else { value }
}
