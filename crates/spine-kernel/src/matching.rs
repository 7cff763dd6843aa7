//! Truth/reco matching resolver.
//!
//! Upstream matching already ranks candidates, best overlap first. The
//! resolver only follows the first id into the complementary arena, through
//! the spill's id lookups ([`Spill::true_interaction`] and friends).
//!
//! [`Spill::true_interaction`]: crate::model::Spill::true_interaction

use crate::model::{Interaction, ParticleRecord};

/// Something that carries a ranked match relation and an id.
pub trait Matched {
    fn id(&self) -> i64;
    fn match_ids(&self) -> &[i64];
}

impl<P> Matched for Interaction<P> {
    fn id(&self) -> i64 {
        self.id
    }

    fn match_ids(&self) -> &[i64] {
        &self.match_ids
    }
}

/// Best-matched complementary object, or `None` when the match list is
/// empty or `lookup` finds no object with its first id.
pub fn resolve<'a, C: 'a>(
    primary: &impl Matched,
    lookup: impl FnOnce(i64) -> Option<&'a C>,
) -> Option<&'a C> {
    lookup(*primary.match_ids().first()?)
}

/// Particle flavour of [`resolve`]: particles expose their match relation
/// through [`ParticleRecord::core`].
pub fn resolve_particle<'a, P: 'a>(
    primary: &impl ParticleRecord,
    lookup: impl FnOnce(i64) -> Option<&'a P>,
) -> Option<&'a P> {
    lookup(*primary.match_ids().first()?)
}
