use tracing::warn;

use crate::geometry::Face;
use crate::kinetics::KineticInput;
use crate::molecule::SpeciesId;
use crate::state::{BoundState, MolState, Site};

/// What happens to a molecule at a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Reflect,
    Transmit,
    Absorb,
    /// Teleport to the panel's jump target.
    Jump,
    /// Hand the molecule to the surface's port.
    Port,
    Adsorb(BoundState),
    /// Release into solution on a face, with readsorption possible. This and
    /// the next two are per-step actions of bound molecules, taken from a
    /// sampled [`Transition`]; they never follow a collision.
    ReversibleDesorb(Face),
    IrreversibleDesorb(Face),
    Flip(BoundState),
    NoAction,
    /// Stochastic choice among several outcomes.
    Multiple,
}

/// One outcome of a [`Multiple`](Action::Multiple) rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// The authoritative rate or probability.
    pub input: KineticInput,
    pub new_species: SpeciesId,
    pub probability: f64,
    /// Sum of this and every earlier outcome's probability.
    pub cumulative: f64,
    pub rate: f64,
    /// Probability of the transition that undoes this one.
    pub reverse_probability: f64,
}

impl Transition {
    #[must_use]
    pub fn new(input: KineticInput, new_species: SpeciesId) -> Self {
        Self {
            input,
            new_species,
            probability: 0.0,
            cumulative: 0.0,
            rate: 0.0,
            reverse_probability: 0.0,
        }
    }

    /// The per-step action that takes a bound molecule to `destination`.
    #[must_use]
    pub fn bound_action(&self, destination: Site) -> Action {
        match destination {
            Site::Solution(face) if self.reverse_probability > 0.0 => Action::ReversibleDesorb(face),
            Site::Solution(face) => Action::IrreversibleDesorb(face),
            Site::Bound(to) => Action::Flip(to),
        }
    }
}

/// Outcome table of a [`Multiple`](Action::Multiple) rule, keyed by
/// destination site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionDetail {
    transitions: [Option<Transition>; Site::COUNT],
}

impl ActionDetail {
    #[must_use]
    pub fn get(&self, destination: Site) -> Option<&Transition> {
        self.transitions[destination.index()].as_ref()
    }

    /// Sets the outcome for `destination`, keeping derived values of an
    /// existing entry until the next refresh.
    pub fn set(&mut self, destination: Site, input: KineticInput, new_species: SpeciesId) {
        let slot = &mut self.transitions[destination.index()];
        match slot {
            Some(t) => {
                t.input = input;
                t.new_species = new_species;
            }
            None => *slot = Some(Transition::new(input, new_species)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Site, &Transition)> {
        Site::ALL
            .into_iter()
            .zip(&self.transitions)
            .filter_map(|(site, t)| t.as_ref().map(|t| (site, t)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Site, &mut Transition)> {
        Site::ALL
            .into_iter()
            .zip(&mut self.transitions)
            .filter_map(|(site, t)| t.as_mut().map(|t| (site, t)))
    }

    #[must_use]
    pub fn total_probability(&self) -> f64 {
        self.iter().map(|(_, t)| t.probability).sum()
    }

    /// Recomputes cumulative probabilities in site order.
    pub fn rebuild_cumulative(&mut self) {
        let mut running = 0.0;
        for (_, t) in self.iter_mut() {
            running += t.probability;
            t.cumulative = running;
        }
    }

    /// Picks an outcome for the uniform draw `u` in `[0, 1)`.
    ///
    /// Returns `None` for the remainder, which leaves the molecule unchanged.
    /// A table summing above one is normalised.
    #[must_use]
    pub fn sample(&self, u: f64) -> Option<(Site, &Transition)> {
        let total = self.iter().last().map_or(0.0, |(_, t)| t.cumulative);
        let u = if total > 1.0 {
            warn!(total, "outcome probabilities exceed one; normalising");
            u * total
        } else {
            u
        };
        self.iter().find(|(_, t)| u < t.cumulative)
    }
}

/// The rule for one (species, state, face) entry.
///
/// Only [`ActionRule::Multiple`] carries an outcome table.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionRule {
    Fixed {
        action: Action,
        /// Species after the action; `None` keeps the current one.
        new_species: Option<SpeciesId>,
    },
    Multiple(Box<ActionDetail>),
}

impl ActionRule {
    #[must_use]
    pub fn fixed(action: Action) -> Self {
        Self::Fixed {
            action,
            new_species: None,
        }
    }

    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::Fixed { action, .. } => *action,
            Self::Multiple(_) => Action::Multiple,
        }
    }

    #[must_use]
    pub fn detail(&self) -> Option<&ActionDetail> {
        match self {
            Self::Multiple(detail) => Some(detail.as_ref()),
            Self::Fixed { .. } => None,
        }
    }

    /// The outcome table, replacing a fixed action with an empty one.
    pub fn detail_mut(&mut self) -> &mut ActionDetail {
        match self {
            Self::Multiple(detail) => detail,
            Self::Fixed { .. } => {
                *self = Self::Multiple(Box::default());
                self.detail_mut()
            }
        }
    }
}

type CollisionRow = [[ActionRule; 2]; MolState::COUNT];
type BoundRow = [ActionRule; BoundState::COUNT];

/// Per-species rules of one surface.
///
/// Collision rules are keyed by the molecule's state and the face it hits.
/// Bound rules are consulted once per step for molecules bound to the
/// surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTable {
    collision: Vec<CollisionRow>,
    bound: Vec<BoundRow>,
}

impl ActionTable {
    /// Every collision reflects and bound molecules stay put.
    #[must_use]
    pub fn new(species_count: usize) -> Self {
        Self {
            collision: (0..species_count)
                .map(|_| {
                    std::array::from_fn(|_| {
                        std::array::from_fn(|_| ActionRule::fixed(Action::Reflect))
                    })
                })
                .collect(),
            bound: (0..species_count)
                .map(|_| std::array::from_fn(|_| ActionRule::fixed(Action::NoAction)))
                .collect(),
        }
    }

    #[must_use]
    pub fn species_count(&self) -> usize {
        self.collision.len()
    }

    /// Rule for a molecule in `state` hitting `face`.
    #[must_use]
    pub fn collision(&self, species: SpeciesId, state: MolState, face: Face) -> &ActionRule {
        &self.collision[species.0][state.index()][face.index()]
    }

    pub fn collision_mut(
        &mut self,
        species: SpeciesId,
        state: MolState,
        face: Face,
    ) -> &mut ActionRule {
        &mut self.collision[species.0][state.index()][face.index()]
    }

    /// Per-step rule for a molecule bound in `state`.
    #[must_use]
    pub fn bound(&self, species: SpeciesId, state: BoundState) -> &ActionRule {
        &self.bound[species.0][state.index()]
    }

    /// Rule whose outcomes start at `origin`: the solution collision rule
    /// for a face, or the per-step rule for a bound state.
    pub fn origin_mut(&mut self, species: SpeciesId, origin: Site) -> &mut ActionRule {
        match origin {
            Site::Solution(face) => self.collision_mut(species, MolState::Solution, face),
            Site::Bound(b) => &mut self.bound[species.0][b.index()],
        }
    }
}
