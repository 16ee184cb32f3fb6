mod bound;
mod edge_hop;
mod executor;

pub use bound::BoundStep;

use rand::Rng;
use tracing::warn;

use crate::geometry::{Crossing, Face, PanelGeometry, PanelShape};
use crate::math::{Point3, TOLERANCE};
use crate::molecule::{Molecule, SpeciesId};
use crate::state::{BoundState, Site};
use crate::surface::{Action, ActionRule, PanelData, PanelId, PortId, SurfaceStore};

use executor::Flow;

/// Spatial lookup of the panels a segment may cross.
pub trait PanelIndex {
    /// Appends to `out` every panel the segment `from -> to` may cross.
    /// Listing a panel more than once is allowed.
    fn candidates(&self, store: &SurfaceStore, from: &Point3, to: &Point3, out: &mut Vec<PanelId>);
}

/// Index that offers every panel of the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllPanels;

impl PanelIndex for AllPanels {
    fn candidates(&self, store: &SurfaceStore, _from: &Point3, _to: &Point3, out: &mut Vec<PanelId>) {
        out.extend(store.panel_ids());
    }
}

/// Buffers reused across calls. Each caller that resolves molecules owns
/// one.
#[derive(Debug, Default)]
pub struct ResolveScratch {
    candidates: Vec<PanelId>,
    neighbors: Vec<(PanelId, Point3)>,
}

impl ResolveScratch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// How a move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Reached the end of its (possibly redirected) move.
    Moved,
    /// Two crossings coincided; the molecule stopped short of them.
    Grazed,
    /// The move was discarded and the molecule is back where it started.
    Reverted,
    /// Removed from the simulation by `panel`.
    Absorbed { panel: PanelId },
    /// Handed to `port` at `panel`.
    Ported { port: PortId, panel: PanelId },
    /// Now bound to `panel`.
    Adsorbed { panel: PanelId },
    /// Teleported to `panel`.
    Jumped { panel: PanelId },
}

/// A crossing with the panel it belongs to.
struct Hit<'s> {
    id: PanelId,
    panel: &'s PanelData,
    crossing: Crossing,
}

/// Action to apply at a crossing and the species the molecule becomes.
#[derive(Debug, Clone, Copy)]
struct Choice {
    action: Action,
    species: SpeciesId,
}

/// Resolves molecule moves against a read-only store.
///
/// A move runs from [`Molecule::previous`] to [`Molecule::position`]. The
/// resolver repeatedly finds the nearest panel crossing on the remaining
/// sub-segment, picks an action from the panel's surface and applies it,
/// until the molecule reaches the end of its move or an action ends it.
pub struct CrossingResolver<'a, I: PanelIndex + ?Sized = AllPanels> {
    store: &'a SurfaceStore,
    index: &'a I,
}

impl<'a, I: PanelIndex + ?Sized> CrossingResolver<'a, I> {
    #[must_use]
    pub fn new(store: &'a SurfaceStore, index: &'a I) -> Self {
        Self { store, index }
    }

    #[must_use]
    pub fn store(&self) -> &'a SurfaceStore {
        self.store
    }

    /// Resolves every crossing of the molecule's move, mutating it in place.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        mol: &mut Molecule,
        scratch: &mut ResolveScratch,
        rng: &mut R,
    ) -> Outcome {
        self.resolve_above(mol, f64::NEG_INFINITY, scratch, rng)
    }

    /// As [`resolve`](Self::resolve), but crossings of the full move at a
    /// fraction of `cross_minimum` or less are skipped.
    pub fn resolve_above<R: Rng + ?Sized>(
        &self,
        mol: &mut Molecule,
        cross_minimum: f64,
        scratch: &mut ResolveScratch,
        rng: &mut R,
    ) -> Outcome {
        let snapshot = *mol;
        let params = self.store.params();
        mol.via = mol.previous;

        if mol.state.is_bound() && !edge_hop::slide(self.store, mol, scratch, rng) {
            warn!(
                species = mol.species.0,
                cap = params.max_iterations,
                "bound molecule kept leaving its panels; move discarded"
            );
            return revert(mol, &snapshot);
        }

        let mut minimum = cross_minimum;
        for _ in 0..params.max_iterations {
            let Some((hit, gap)) = self.nearest_crossing(mol, minimum, scratch) else {
                return Outcome::Moved;
            };
            minimum = f64::NEG_INFINITY;
            if gap <= params.epsilon {
                mol.position = mol.via;
                return Outcome::Grazed;
            }
            let choice = self.choose(mol, &hit, rng);
            match executor::apply(self.store, mol, &hit, choice) {
                Flow::Continue => {}
                Flow::Stop(Outcome::Reverted) => return revert(mol, &snapshot),
                Flow::Stop(outcome) => return outcome,
            }
        }

        warn!(
            species = mol.species.0,
            cap = params.max_iterations,
            "crossing resolution hit the iteration cap; move discarded"
        );
        revert(mol, &snapshot)
    }

    /// Nearest crossing of `via -> position`, with the distance along the
    /// segment to the next crossing after it.
    fn nearest_crossing(
        &self,
        mol: &Molecule,
        minimum: f64,
        scratch: &mut ResolveScratch,
    ) -> Option<(Hit<'a>, f64)> {
        let length = (mol.position - mol.via).norm();
        if length < TOLERANCE {
            return None;
        }

        scratch.candidates.clear();
        self.index
            .candidates(self.store, &mol.via, &mol.position, &mut scratch.candidates);
        scratch.candidates.sort_unstable();
        scratch.candidates.dedup();

        let resident = mol.panel.and_then(|id| self.store.panel(id).ok());
        let mut best: Option<Hit<'a>> = None;
        let mut runner_up = f64::INFINITY;
        for &id in &scratch.candidates {
            if mol.panel == Some(id) || resident.is_some_and(|r| r.neighbors.contains(&id)) {
                continue;
            }
            let Ok(panel) = self.store.panel(id) else {
                continue;
            };
            let Some(crossing) = panel
                .shape
                .intersect(&mol.via, &mol.position)
                .and_then(|c| beyond(c, minimum, &mol.via, &mol.position))
            else {
                continue;
            };
            if let Some(second) = crossing.second_fraction {
                runner_up = runner_up.min(second);
            }
            match &best {
                Some(b) if b.crossing.fraction <= crossing.fraction => {
                    runner_up = runner_up.min(crossing.fraction);
                }
                _ => {
                    if let Some(b) = best.take() {
                        runner_up = runner_up.min(b.crossing.fraction);
                    }
                    best = Some(Hit { id, panel, crossing });
                }
            }
        }

        best.map(|hit| {
            let gap = (runner_up - hit.crossing.fraction) * length;
            (hit, gap)
        })
    }

    fn choose<R: Rng + ?Sized>(&self, mol: &Molecule, hit: &Hit<'_>, rng: &mut R) -> Choice {
        let face = hit.crossing.face;
        let keep = |action| Choice {
            action,
            species: mol.species,
        };
        let Ok(surface) = self.store.surface(hit.panel.surface) else {
            return keep(Action::Reflect);
        };

        match surface.actions.collision(mol.species, mol.state, face) {
            ActionRule::Fixed {
                action: Action::Absorb,
                new_species,
            } if surface.has_emitters(mol.species, face) => {
                let p = hit
                    .panel
                    .emitter_absorption
                    .get(mol.species.0)
                    .map_or(0.0, |row| row[face.index()]);
                let action = if rng.random::<f64>() < p {
                    Action::Absorb
                } else {
                    Action::Reflect
                };
                Choice {
                    action,
                    species: (*new_species).unwrap_or(mol.species),
                }
            }
            ActionRule::Fixed {
                action,
                new_species,
            } => Choice {
                action: *action,
                species: (*new_species).unwrap_or(mol.species),
            },
            ActionRule::Multiple(detail) => match detail.sample(rng.random()) {
                Some((Site::Solution(_), t)) => Choice {
                    action: Action::Transmit,
                    species: t.new_species,
                },
                Some((Site::Bound(b), t)) => Choice {
                    action: Action::Adsorb(b),
                    species: t.new_species,
                },
                None => keep(Action::Reflect),
            },
        }
    }
}

/// The first crossing of `crossing`'s panel past `minimum`. A curved panel
/// entered at or before `minimum` still counts at its exit.
fn beyond(crossing: Crossing, minimum: f64, start: &Point3, end: &Point3) -> Option<Crossing> {
    if crossing.fraction > minimum {
        return Some(crossing);
    }
    let exit = crossing.second_fraction.filter(|&t| t > minimum)?;
    Some(Crossing {
        point: start + (end - start) * exit,
        fraction: exit,
        face: crossing.face.opposite(),
        end_face: crossing.end_face,
        second_fraction: None,
    })
}

fn revert(mol: &mut Molecule, snapshot: &Molecule) -> Outcome {
    *mol = *snapshot;
    mol.position = snapshot.previous;
    mol.via = snapshot.previous;
    Outcome::Reverted
}

/// Face a bound molecule rests on: the one its state names, or for up and
/// down states the side of the panel `point` lies on.
fn resting_face(bound: BoundState, shape: &PanelShape, point: &Point3) -> Face {
    bound
        .face()
        .unwrap_or_else(|| Face::from_distance(shape.signed_distance(point)))
}
