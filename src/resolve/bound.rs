use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::warn;

use crate::geometry::{Face, PanelGeometry};
use crate::molecule::Molecule;
use crate::state::MolState;
use crate::surface::{Action, ActionRule, PanelData, PanelId, Transition};

use super::{resting_face, CrossingResolver, Outcome, PanelIndex, ResolveScratch};

/// Result of a bound molecule's per-step transition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundStep {
    Stayed,
    /// Changed bound state on `panel`.
    Flipped { panel: PanelId },
    /// Released from `panel`; `landing` is how the release move resolved.
    Desorbed { panel: PanelId, landing: Outcome },
}

impl<I: PanelIndex + ?Sized> CrossingResolver<'_, I> {
    /// Samples the per-step transitions of a bound molecule.
    ///
    /// A desorbed molecule is placed on the release face, kicked off the
    /// panel along its normal by a random distance and resolved again.
    /// Free molecules always stay.
    pub fn check_bound<R: Rng + ?Sized>(
        &self,
        mol: &mut Molecule,
        scratch: &mut ResolveScratch,
        rng: &mut R,
    ) -> BoundStep {
        let (Some(bound), Some(id)) = (mol.state.bound(), mol.panel) else {
            return BoundStep::Stayed;
        };
        let Ok(panel) = self.store.panel(id) else {
            warn!(species = mol.species.0, "bound molecule on a panel that is not in the store");
            return BoundStep::Stayed;
        };
        let Ok(surface) = self.store.surface(panel.surface) else {
            return BoundStep::Stayed;
        };
        let ActionRule::Multiple(detail) = surface.actions.bound(mol.species, bound) else {
            return BoundStep::Stayed;
        };

        let Some((site, t)) = detail.sample(rng.random()) else {
            return BoundStep::Stayed;
        };
        match t.bound_action(site) {
            Action::ReversibleDesorb(face) => {
                let landing = self.desorb(mol, panel, face, t, true, scratch, rng);
                BoundStep::Desorbed { panel: id, landing }
            }
            Action::IrreversibleDesorb(face) => {
                let landing = self.desorb(mol, panel, face, t, false, scratch, rng);
                BoundStep::Desorbed { panel: id, landing }
            }
            Action::Flip(to) if to == bound => BoundStep::Stayed,
            Action::Flip(to) => {
                let eps = self.store.params().epsilon;
                let face = resting_face(bound, &panel.shape, &mol.position);
                mol.species = t.new_species;
                mol.state = MolState::Bound(to);
                let rest = to.face().unwrap_or(face);
                mol.position = panel.shape.snap_to_face(&mol.position, rest, eps);
                mol.previous = mol.position;
                mol.via = mol.position;
                BoundStep::Flipped { panel: id }
            }
            _ => BoundStep::Stayed,
        }
    }

    /// Releases the molecule from `panel` into solution on `face`.
    ///
    /// The release distance is half-normal with scale `sqrt(2 D dt)` for the
    /// released species. A reversible release is shortened by the square
    /// root of a uniform draw, which keeps readsorption at the rate the
    /// reverse probability was derived for.
    #[allow(clippy::too_many_arguments)]
    fn desorb<R: Rng + ?Sized>(
        &self,
        mol: &mut Molecule,
        panel: &PanelData,
        face: Face,
        transition: &Transition,
        reversible: bool,
        scratch: &mut ResolveScratch,
        rng: &mut R,
    ) -> Outcome {
        let params = self.store.params();
        let diffusion = self
            .store
            .diffusion(transition.new_species, MolState::Solution);
        let sigma = (2.0 * diffusion * params.time_step).sqrt();
        let normal: f64 = StandardNormal.sample(rng);
        let mut distance = sigma * normal.abs();
        if reversible {
            distance *= rng.random::<f64>().sqrt();
        }

        let near = panel.shape.nearest_point(&mol.position, params.margin);
        let base = panel.shape.snap_to_face(&near.point, face, params.epsilon);
        let direction = panel.shape.normal(&base, face);

        mol.species = transition.new_species;
        mol.state = MolState::Solution;
        mol.panel = None;
        mol.previous = base;
        mol.via = base;
        mol.position = base + direction * distance;
        self.resolve(mol, scratch, rng)
    }
}
