use crate::math::Point3;
use crate::state::{BoundState, MolState};
use crate::surface::PanelId;

/// Index of a species in the reaction network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeciesId(pub usize);

/// A point molecule as seen by the surface engine.
///
/// `previous` is the start of the pending move and `position` its end. `via`
/// is the start of the remaining sub-segment during crossing resolution.
/// Bound molecules record the panel they sit on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Molecule {
    pub species: SpeciesId,
    pub state: MolState,
    pub position: Point3,
    pub previous: Point3,
    pub via: Point3,
    pub panel: Option<PanelId>,
}

impl Molecule {
    /// A free molecule moving from `previous` to `position`.
    #[must_use]
    pub fn free(species: SpeciesId, previous: Point3, position: Point3) -> Self {
        Self {
            species,
            state: MolState::Solution,
            position,
            previous,
            via: previous,
            panel: None,
        }
    }

    /// A molecule bound to `panel` in state `bound`, moving in the panel's
    /// plane from `previous` to `position`.
    #[must_use]
    pub fn bound(
        species: SpeciesId,
        bound: BoundState,
        panel: PanelId,
        previous: Point3,
        position: Point3,
    ) -> Self {
        Self {
            species,
            state: MolState::Bound(bound),
            position,
            previous,
            via: previous,
            panel: Some(panel),
        }
    }
}
