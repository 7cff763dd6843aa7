//! Scope registrar: applicability scopes, canonical names, and the typed
//! registration payload.
//!
//! Content is usually written once, generic over the particle record type,
//! and registered under a scope that names which concrete object types it
//! applies to. [`Scoped`] carries one instantiation per concrete type; the
//! [`scoped!`](crate::scoped) macro builds it from a generic function.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bind::Signature;
use crate::catalog::Tables;
use crate::model::{
    BeamSpill, Neutrino, RecoInteraction, RecoParticle, Spill, TrueInteraction, TrueParticle,
};
use crate::registry::Registry;

/// Declared applicability of a cut, variable, or selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[serde(rename = "true")]
    Truth,
    Reco,
    Both,
    Event,
    TrueParticle,
    RecoParticle,
    BothParticle,
    Spill,
    #[serde(rename = "mctruth")]
    McTruth,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Truth => "true",
            Scope::Reco => "reco",
            Scope::Both => "both",
            Scope::Event => "event",
            Scope::TrueParticle => "true_particle",
            Scope::RecoParticle => "reco_particle",
            Scope::BothParticle => "both_particle",
            Scope::Spill => "spill",
            Scope::McTruth => "mctruth",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete object type content can be registered against.
///
/// Each implementor owns one registry slot per value kind in [`Tables`].
pub trait Object: Sized + 'static {
    /// Registry label suffix, e.g. `reco_interaction`.
    const NAME: &'static str;
    /// Canonical name prefix: `true`, `reco`, or empty.
    const PREFIX: &'static str;

    fn slot<R>(tables: &Tables<R>) -> &Registry<Signature<Self, R>>;
    fn slot_mut<R>(tables: &mut Tables<R>) -> &mut Registry<Signature<Self, R>>;
}

/// `<prefix>_<base>`, or `base` when the object type carries no prefix.
pub fn canonical_name<O: Object>(base: &str) -> String {
    if O::PREFIX.is_empty() {
        base.to_string()
    } else {
        format!("{}_{base}", O::PREFIX)
    }
}

macro_rules! object_slot {
    ($ty:ty, $field:ident, $name:literal, $prefix:literal) => {
        impl Object for $ty {
            const NAME: &'static str = $name;
            const PREFIX: &'static str = $prefix;

            fn slot<R>(tables: &Tables<R>) -> &Registry<Signature<Self, R>> {
                &tables.$field
            }

            fn slot_mut<R>(tables: &mut Tables<R>) -> &mut Registry<Signature<Self, R>> {
                &mut tables.$field
            }
        }
    };
}

object_slot!(TrueInteraction, true_interaction, "true_interaction", "true");
object_slot!(RecoInteraction, reco_interaction, "reco_interaction", "reco");
object_slot!(TrueParticle, true_particle, "true_particle", "true");
object_slot!(RecoParticle, reco_particle, "reco_particle", "reco");
object_slot!(Spill, event, "event", "");
object_slot!(BeamSpill, spill, "spill", "");
object_slot!(Neutrino, mctruth, "mctruth", "");

/// A registration payload: the scope, with one signature per concrete
/// object type the scope implies.
#[derive(Debug, Clone)]
pub enum Scoped<R> {
    Truth(Signature<TrueInteraction, R>),
    Reco(Signature<RecoInteraction, R>),
    Both(Signature<TrueInteraction, R>, Signature<RecoInteraction, R>),
    Event(Signature<Spill, R>),
    TrueParticle(Signature<TrueParticle, R>),
    RecoParticle(Signature<RecoParticle, R>),
    BothParticle(Signature<TrueParticle, R>, Signature<RecoParticle, R>),
    Spill(Signature<BeamSpill, R>),
    McTruth(Signature<Neutrino, R>),
}

impl<R> Scoped<R> {
    pub fn scope(&self) -> Scope {
        match self {
            Scoped::Truth(_) => Scope::Truth,
            Scoped::Reco(_) => Scope::Reco,
            Scoped::Both(..) => Scope::Both,
            Scoped::Event(_) => Scope::Event,
            Scoped::TrueParticle(_) => Scope::TrueParticle,
            Scoped::RecoParticle(_) => Scope::RecoParticle,
            Scoped::BothParticle(..) => Scope::BothParticle,
            Scoped::Spill(_) => Scope::Spill,
            Scoped::McTruth(_) => Scope::McTruth,
        }
    }
}

impl Scoped<bool> {
    /// The cut as a 0/1 variable under the same scope. Beam-record cuts
    /// have no variable counterpart.
    pub fn to_flag(&self) -> Option<Scoped<f64>> {
        Some(match self {
            Scoped::Truth(cut) => Scoped::Truth(cut.to_flag()),
            Scoped::Reco(cut) => Scoped::Reco(cut.to_flag()),
            Scoped::Both(truth, reco) => Scoped::Both(truth.to_flag(), reco.to_flag()),
            Scoped::Event(cut) => Scoped::Event(cut.to_flag()),
            Scoped::TrueParticle(cut) => Scoped::TrueParticle(cut.to_flag()),
            Scoped::RecoParticle(cut) => Scoped::RecoParticle(cut.to_flag()),
            Scoped::BothParticle(truth, reco) => {
                Scoped::BothParticle(truth.to_flag(), reco.to_flag())
            }
            Scoped::McTruth(cut) => Scoped::McTruth(cut.to_flag()),
            Scoped::Spill(_) => return None,
        })
    }
}

/// Builds a [`Scoped`] payload.
///
/// `both` and `both_particle` take the bare name of a function generic over
/// the particle record type and instantiate it once per side. The
/// single-type scopes take any expression coercible to a function pointer.
/// An optional trailing [`Arity`](crate::bind::Arity) selects the
/// parameterized form.
///
/// ```ignore
/// builder.register_variable("vertex_x", scoped!(both, vertex_x))?;
/// builder.register_cut("flash_cut", scoped!(both, flash_cut, Arity::Exactly(2)))?;
/// builder.register_variable("nreco", scoped!(event, nreco))?;
/// ```
#[macro_export]
macro_rules! scoped {
    (@sig $f:expr) => {
        $crate::bind::Signature::plain($f)
    };
    (@sig $f:expr, $arity:expr) => {
        $crate::bind::Signature::parameterized($arity, $f)
    };
    (both, $f:ident $(, $arity:expr)?) => {
        $crate::scope::Scoped::Both(
            $crate::scoped!(@sig $f::<$crate::model::TrueParticle> $(, $arity)?),
            $crate::scoped!(@sig $f::<$crate::model::RecoParticle> $(, $arity)?),
        )
    };
    (both_particle, $f:ident $(, $arity:expr)?) => {
        $crate::scope::Scoped::BothParticle(
            $crate::scoped!(@sig $f::<$crate::model::TrueParticle> $(, $arity)?),
            $crate::scoped!(@sig $f::<$crate::model::RecoParticle> $(, $arity)?),
        )
    };
    (true, $f:expr $(, $arity:expr)?) => {
        $crate::scope::Scoped::Truth($crate::scoped!(@sig $f $(, $arity)?))
    };
    (reco, $f:expr $(, $arity:expr)?) => {
        $crate::scope::Scoped::Reco($crate::scoped!(@sig $f $(, $arity)?))
    };
    (true_particle, $f:expr $(, $arity:expr)?) => {
        $crate::scope::Scoped::TrueParticle($crate::scoped!(@sig $f $(, $arity)?))
    };
    (reco_particle, $f:expr $(, $arity:expr)?) => {
        $crate::scope::Scoped::RecoParticle($crate::scoped!(@sig $f $(, $arity)?))
    };
    (event, $f:expr $(, $arity:expr)?) => {
        $crate::scope::Scoped::Event($crate::scoped!(@sig $f $(, $arity)?))
    };
    (spill, $f:expr $(, $arity:expr)?) => {
        $crate::scope::Scoped::Spill($crate::scoped!(@sig $f $(, $arity)?))
    };
    (mctruth, $f:expr $(, $arity:expr)?) => {
        $crate::scope::Scoped::McTruth($crate::scoped!(@sig $f $(, $arity)?))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_follow_object_prefix() {
        assert_eq!(canonical_name::<TrueInteraction>("vertex_x"), "true_vertex_x");
        assert_eq!(canonical_name::<RecoParticle>("ke"), "reco_ke");
        assert_eq!(canonical_name::<Spill>("nreco"), "nreco");
        assert_eq!(canonical_name::<Neutrino>("baseline"), "baseline");
    }

    #[test]
    fn scopes_round_trip_through_their_config_spelling() {
        for scope in [
            Scope::Truth,
            Scope::Reco,
            Scope::Both,
            Scope::Event,
            Scope::TrueParticle,
            Scope::RecoParticle,
            Scope::BothParticle,
            Scope::Spill,
            Scope::McTruth,
        ] {
            let rendered = serde_json::to_string(&scope).expect("serialize");
            assert_eq!(rendered, format!("\"{}\"", scope.as_str()));
            let parsed: Scope = serde_json::from_str(&rendered).expect("deserialize");
            assert_eq!(parsed, scope);
        }
    }
}
