pub mod action;
pub mod emitter;
pub mod rates;

pub use action::{Action, ActionDetail, ActionRule, ActionTable, Transition};
pub use emitter::Emitter;

use slotmap::SlotMap;
use tracing::debug;

use crate::config::SurfaceParams;
use crate::error::{ConfigError, GeometryError, Result, StoreError};
use crate::geometry::{Face, PanelGeometry, PanelShape, ShapeKind};
use crate::kinetics::KineticInput;
use crate::math::Dim;
use crate::molecule::SpeciesId;
use crate::state::{MolState, Site};

slotmap::new_key_type! {
    /// Unique identifier for a surface.
    pub struct SurfaceId;
    /// Unique identifier for a panel.
    pub struct PanelId;
}

/// Identifier of an external port that takes molecules off a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId(pub usize);

/// Destination of a jump: a panel and the face molecules arrive on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JumpTarget {
    pub panel: PanelId,
    pub face: Face,
}

/// Data associated with a panel.
#[derive(Debug, Clone)]
pub struct PanelData {
    pub name: String,
    pub surface: SurfaceId,
    pub shape: PanelShape,
    /// Panels sharing an edge with this one.
    pub neighbors: Vec<PanelId>,
    /// Jump destination per face.
    pub jump: [Option<JumpTarget>; 2],
    /// Emitter-corrected absorption probability per species and face.
    pub emitter_absorption: Vec<[f64; 2]>,
}

/// Data associated with a surface.
#[derive(Debug, Clone)]
pub struct SurfaceData {
    pub name: String,
    /// Panels grouped by [`ShapeKind`].
    pub panels: [Vec<PanelId>; ShapeKind::COUNT],
    pub actions: ActionTable,
    pub port: Option<PortId>,
    pub emitters: Vec<Emitter>,
}

impl SurfaceData {
    /// Whether any emitter of `species` looks at `face`.
    #[must_use]
    pub fn has_emitters(&self, species: SpeciesId, face: Face) -> bool {
        self.emitters
            .iter()
            .any(|e| e.species == species && e.face == face)
    }
}

/// Arena that owns every surface and panel of a system, together with the
/// per-species diffusion coefficients the action tables are derived from.
#[derive(Debug)]
pub struct SurfaceStore {
    params: SurfaceParams,
    dim: Dim,
    diffusion: Vec<[f64; MolState::COUNT]>,
    surfaces: SlotMap<SurfaceId, SurfaceData>,
    panels: SlotMap<PanelId, PanelData>,
}

impl SurfaceStore {
    /// Creates an empty store for `species_count` species. Diffusion
    /// coefficients start at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` is invalid.
    pub fn new(dim: Dim, species_count: usize, params: SurfaceParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            dim,
            diffusion: vec![[0.0; MolState::COUNT]; species_count],
            surfaces: SlotMap::with_key(),
            panels: SlotMap::with_key(),
        })
    }

    #[must_use]
    pub fn params(&self) -> &SurfaceParams {
        &self.params
    }

    #[must_use]
    pub fn dim(&self) -> Dim {
        self.dim
    }

    #[must_use]
    pub fn species_count(&self) -> usize {
        self.diffusion.len()
    }

    /// Diffusion coefficient of `species` in `state`.
    #[must_use]
    pub fn diffusion(&self, species: SpeciesId, state: MolState) -> f64 {
        self.diffusion
            .get(species.0)
            .map_or(0.0, |row| row[state.index()])
    }

    fn check_species(&self, species: SpeciesId) -> std::result::Result<(), StoreError> {
        if species.0 < self.species_count() {
            Ok(())
        } else {
            Err(StoreError::SpeciesOutOfRange {
                species: species.0,
                count: self.species_count(),
            })
        }
    }

    // --- Surface operations ---

    /// Inserts a surface whose collisions all reflect.
    pub fn add_surface(&mut self, name: impl Into<String>) -> SurfaceId {
        let actions = ActionTable::new(self.species_count());
        self.surfaces.insert(SurfaceData {
            name: name.into(),
            panels: Default::default(),
            actions,
            port: None,
            emitters: Vec::new(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the surface is not in the store.
    pub fn surface(&self, id: SurfaceId) -> std::result::Result<&SurfaceData, StoreError> {
        self.surfaces
            .get(id)
            .ok_or(StoreError::EntityNotFound("surface"))
    }

    fn surface_mut(&mut self, id: SurfaceId) -> std::result::Result<&mut SurfaceData, StoreError> {
        self.surfaces
            .get_mut(id)
            .ok_or(StoreError::EntityNotFound("surface"))
    }

    /// Attaches a port to the surface, or detaches it with `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is not in the store.
    pub fn set_port(&mut self, surface: SurfaceId, port: Option<PortId>) -> Result<()> {
        self.surface_mut(surface)?.port = port;
        Ok(())
    }

    // --- Panel operations ---

    /// Inserts a panel into `surface`.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is not in the store or the shape was
    /// built for another dimension.
    pub fn add_panel(
        &mut self,
        surface: SurfaceId,
        name: impl Into<String>,
        shape: impl Into<PanelShape>,
    ) -> Result<PanelId> {
        let shape = shape.into();
        if shape.dim() != self.dim {
            return Err(GeometryError::DimensionMismatch {
                expected: self.dim.count(),
                found: shape.dim().count(),
            }
            .into());
        }
        self.surface(surface)?;
        let kind = shape.kind();
        let id = self.panels.insert(PanelData {
            name: name.into(),
            surface,
            shape,
            neighbors: Vec::new(),
            jump: [None; 2],
            emitter_absorption: vec![[0.0; 2]; self.diffusion.len()],
        });
        self.surface_mut(surface)?.panels[kind.index()].push(id);
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns an error if the panel is not in the store.
    pub fn panel(&self, id: PanelId) -> std::result::Result<&PanelData, StoreError> {
        self.panels
            .get(id)
            .ok_or(StoreError::EntityNotFound("panel"))
    }

    fn panel_mut(&mut self, id: PanelId) -> std::result::Result<&mut PanelData, StoreError> {
        self.panels
            .get_mut(id)
            .ok_or(StoreError::EntityNotFound("panel"))
    }

    /// Returns an iterator over all panel IDs.
    pub fn panel_ids(&self) -> impl Iterator<Item = PanelId> + '_ {
        self.panels.keys()
    }

    /// Panels of `surface` with the given shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is not in the store.
    pub fn panels_of(
        &self,
        surface: SurfaceId,
        kind: ShapeKind,
    ) -> std::result::Result<&[PanelId], StoreError> {
        Ok(self.surface(surface)?.panels[kind.index()].as_slice())
    }

    /// Records that `a` and `b` share an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if either panel is not in the store.
    pub fn connect_neighbors(&mut self, a: PanelId, b: PanelId) -> Result<()> {
        self.panel(b)?;
        for (from, to) in [(a, b), (b, a)] {
            let panel = self.panel_mut(from)?;
            if from != to && !panel.neighbors.contains(&to) {
                panel.neighbors.push(to);
            }
        }
        Ok(())
    }

    /// Makes molecules crossing `from` on `face` jump to `to`. With
    /// `both_ways`, `to` jumps back to `from`.
    ///
    /// # Errors
    ///
    /// Returns an error if a panel is not in the store or the two panels
    /// have different shapes.
    pub fn set_jump(
        &mut self,
        from: PanelId,
        face: Face,
        to: JumpTarget,
        both_ways: bool,
    ) -> Result<()> {
        let from_kind = self.panel(from)?.shape.kind();
        let to_kind = self.panel(to.panel)?.shape.kind();
        if from_kind != to_kind {
            return Err(ConfigError::JumpShapeMismatch {
                from: from_kind.name(),
                to: to_kind.name(),
            }
            .into());
        }
        self.panel_mut(from)?.jump[face.index()] = Some(to);
        if both_ways {
            self.panel_mut(to.panel)?.jump[to.face.index()] = Some(JumpTarget { panel: from, face });
        }
        Ok(())
    }

    // --- Kinetics ---

    /// Sets the diffusion coefficient of `species` in `state` and
    /// re-derives every surface's tables.
    ///
    /// # Errors
    ///
    /// Returns an error for a negative or non-finite value, or if a table
    /// can no longer be derived. The previous value is kept on error.
    pub fn set_diffusion(&mut self, species: SpeciesId, state: MolState, value: f64) -> Result<()> {
        self.check_species(species)?;
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "diffusion",
                value,
            }
            .into());
        }
        let previous = self.diffusion[species.0][state.index()];
        self.diffusion[species.0][state.index()] = value;

        let snapshot: Vec<(SurfaceId, ActionTable)> = self
            .surfaces
            .iter()
            .map(|(id, s)| (id, s.actions.clone()))
            .collect();
        let time_step = self.params.time_step;
        let derived = self
            .surfaces
            .values_mut()
            .try_for_each(|s| rates::refresh(&mut s.actions, &self.diffusion, time_step));
        if let Err(err) = derived {
            for (id, actions) in snapshot {
                if let Some(s) = self.surfaces.get_mut(id) {
                    s.actions = actions;
                }
            }
            self.diffusion[species.0][state.index()] = previous;
            return Err(err);
        }
        self.recompute_emitter_absorption();
        Ok(())
    }

    /// Sets a fixed collision action for `species` in `state` hitting
    /// `face`. `new_species` converts the molecule; `None` keeps it.
    ///
    /// # Errors
    ///
    /// Returns an error if an ID is invalid or the action cannot happen on
    /// collision: outcome tables are set through [`set_rate`](Self::set_rate)
    /// and [`set_probability`](Self::set_probability), desorption and flips
    /// only start from bound states, and bound molecules cannot adsorb.
    pub fn set_action(
        &mut self,
        surface: SurfaceId,
        species: SpeciesId,
        state: MolState,
        face: Face,
        action: Action,
        new_species: Option<SpeciesId>,
    ) -> Result<()> {
        self.check_species(species)?;
        if let Some(n) = new_species {
            self.check_species(n)?;
        }
        let reason = match action {
            Action::Multiple => Some("outcome tables are built from rates or probabilities"),
            Action::ReversibleDesorb(_) | Action::IrreversibleDesorb(_) | Action::Flip(_) => {
                Some("only bound-state outcomes can desorb or flip")
            }
            Action::Adsorb(_) if state.is_bound() => Some("bound molecules cannot adsorb"),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(ConfigError::InvalidAction {
                action: format!("{action:?}"),
                reason,
            }
            .into());
        }
        *self
            .surface_mut(surface)?
            .actions
            .collision_mut(species, state, face) = ActionRule::Fixed { action, new_species };
        Ok(())
    }

    /// Sets the rate constant of the transition from `origin` to
    /// `destination` and re-derives the surface's tables.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid IDs, a pair that is not a transition, a
    /// negative rate, or tables that cannot be derived. The table is left
    /// unchanged on error.
    pub fn set_rate(
        &mut self,
        surface: SurfaceId,
        species: SpeciesId,
        origin: Site,
        destination: Site,
        new_species: Option<SpeciesId>,
        rate: f64,
    ) -> Result<()> {
        if rate.is_nan() || rate < 0.0 {
            return Err(ConfigError::InvalidParameter { name: "rate", value: rate }.into());
        }
        self.set_kinetics(
            surface,
            species,
            origin,
            destination,
            new_species,
            KineticInput::Rate(rate),
        )
    }

    /// Sets the probability of the transition from `origin` to
    /// `destination` and re-derives the surface's tables.
    ///
    /// # Errors
    ///
    /// As for [`set_rate`](Self::set_rate), with probabilities outside
    /// `[0, 1]` rejected.
    pub fn set_probability(
        &mut self,
        surface: SurfaceId,
        species: SpeciesId,
        origin: Site,
        destination: Site,
        new_species: Option<SpeciesId>,
        probability: f64,
    ) -> Result<()> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigError::ProbabilityOutOfRange {
                what: "transition",
                value: probability,
            }
            .into());
        }
        self.set_kinetics(
            surface,
            species,
            origin,
            destination,
            new_species,
            KineticInput::Probability(probability),
        )
    }

    fn set_kinetics(
        &mut self,
        surface: SurfaceId,
        species: SpeciesId,
        origin: Site,
        destination: Site,
        new_species: Option<SpeciesId>,
        input: KineticInput,
    ) -> Result<()> {
        self.check_species(species)?;
        let new_species = new_species.unwrap_or(species);
        self.check_species(new_species)?;
        if rates::scenario(origin, destination).is_none() {
            return Err(ConfigError::InvalidTransition {
                origin,
                destination,
            }
            .into());
        }

        let time_step = self.params.time_step;
        let data = self
            .surfaces
            .get_mut(surface)
            .ok_or(StoreError::EntityNotFound("surface"))?;
        let snapshot = data.actions.clone();
        data.actions
            .origin_mut(species, origin)
            .detail_mut()
            .set(destination, input, new_species);
        if let Err(err) = rates::refresh(&mut data.actions, &self.diffusion, time_step) {
            data.actions = snapshot;
            return Err(err);
        }
        debug!(surface = %data.name, species = species.0, ?origin, ?destination, ?input, "kinetics set");
        Ok(())
    }

    // --- Emitters ---

    /// Adds an unbounded-domain emitter to `surface`. Call
    /// [`recompute_emitter_absorption`](Self::recompute_emitter_absorption)
    /// once emitters and panels are in place.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid ID or a non-positive amount.
    pub fn add_emitter(&mut self, surface: SurfaceId, emitter: Emitter) -> Result<()> {
        self.check_species(emitter.species)?;
        if emitter.amount.is_nan() || emitter.amount <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "emitter amount",
                value: emitter.amount,
            }
            .into());
        }
        let position = self.dim.flatten_point(emitter.position);
        self.surface_mut(surface)?.emitters.push(Emitter {
            position,
            ..emitter
        });
        Ok(())
    }

    /// Recomputes the emitter-corrected absorption probability of every
    /// panel, species and face.
    pub fn recompute_emitter_absorption(&mut self) {
        let time_step = self.params.time_step;
        for (_, panel) in &mut self.panels {
            panel.emitter_absorption.fill([0.0; 2]);
        }
        for (_, surface) in &self.surfaces {
            let mut groups: Vec<(SpeciesId, Face)> =
                surface.emitters.iter().map(|e| (e.species, e.face)).collect();
            groups.sort_unstable();
            groups.dedup();
            for (species, face) in groups {
                let group = surface
                    .emitters
                    .iter()
                    .filter(move |e| e.species == species && e.face == face);
                let diffusion = self
                    .diffusion
                    .get(species.0)
                    .map_or(0.0, |row| row[MolState::Solution.index()]);
                for &id in surface.panels.iter().flatten() {
                    let Some(panel) = self.panels.get_mut(id) else {
                        continue;
                    };
                    panel.emitter_absorption[species.0][face.index()] =
                        emitter::absorption_probability(
                            &panel.shape,
                            face,
                            group.clone(),
                            diffusion,
                            time_step,
                        );
                }
            }
            debug!(surface = %surface.name, emitters = surface.emitters.len(), "emitter absorption recomputed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PanelsimError;
    use crate::geometry::{Rectangle, Sphere};
    use crate::math::{Point3, Vector3};
    use crate::state::BoundState;

    fn store() -> SurfaceStore {
        let mut s = SurfaceStore::new(Dim::Three, 2, SurfaceParams::default()).unwrap();
        for species in [SpeciesId(0), SpeciesId(1)] {
            s.set_diffusion(species, MolState::Solution, 1.0).unwrap();
        }
        s
    }

    fn wall() -> Rectangle {
        Rectangle::new(
            Dim::Three,
            Point3::new(1.0, -1.0, -1.0),
            &[Vector3::new(0.0, 2.0, 0.0), Vector3::new(0.0, 0.0, 2.0)],
            Vector3::x(),
        )
        .unwrap()
    }

    #[test]
    fn panels_group_by_shape() {
        let mut s = store();
        let surf = s.add_surface("membrane");
        let a = s.add_panel(surf, "a", wall()).unwrap();
        let b = s
            .add_panel(surf, "b", Sphere::new(Dim::Three, Point3::origin(), 1.0, Face::Front).unwrap())
            .unwrap();
        assert_eq!(s.panels_of(surf, ShapeKind::Rectangle).unwrap(), &[a]);
        assert_eq!(s.panels_of(surf, ShapeKind::Sphere).unwrap(), &[b]);
        assert_eq!(s.panel(a).unwrap().surface, surf);
        assert_eq!(s.panel_ids().count(), 2);
    }

    #[test]
    fn panel_dimension_must_match() {
        let mut s = store();
        let surf = s.add_surface("x");
        let flat = Sphere::new(Dim::Two, Point3::origin(), 1.0, Face::Front).unwrap();
        let err = s.add_panel(surf, "circle", flat).unwrap_err();
        assert!(matches!(
            err,
            PanelsimError::Geometry(GeometryError::DimensionMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn neighbors_are_mutual_and_unique() {
        let mut s = store();
        let surf = s.add_surface("x");
        let a = s.add_panel(surf, "a", wall()).unwrap();
        let b = s.add_panel(surf, "b", wall()).unwrap();
        s.connect_neighbors(a, b).unwrap();
        s.connect_neighbors(b, a).unwrap();
        assert_eq!(s.panel(a).unwrap().neighbors, vec![b]);
        assert_eq!(s.panel(b).unwrap().neighbors, vec![a]);
    }

    #[test]
    fn jump_requires_matching_shapes() {
        let mut s = store();
        let surf = s.add_surface("x");
        let a = s.add_panel(surf, "a", wall()).unwrap();
        let b = s.add_panel(surf, "b", wall()).unwrap();
        let c = s
            .add_panel(surf, "c", Sphere::new(Dim::Three, Point3::origin(), 1.0, Face::Front).unwrap())
            .unwrap();
        let target = JumpTarget { panel: c, face: Face::Back };
        assert!(s.set_jump(a, Face::Front, target, false).is_err());
        s.set_jump(a, Face::Front, JumpTarget { panel: b, face: Face::Back }, true)
            .unwrap();
        assert_eq!(
            s.panel(b).unwrap().jump[Face::Back.index()],
            Some(JumpTarget { panel: a, face: Face::Front })
        );
    }

    #[test]
    fn set_action_rejects_table_only_actions() {
        let mut s = store();
        let surf = s.add_surface("x");
        let sp = SpeciesId(0);
        for action in [
            Action::Multiple,
            Action::Flip(BoundState::Up),
            Action::IrreversibleDesorb(Face::Front),
        ] {
            assert!(s
                .set_action(surf, sp, MolState::Solution, Face::Front, action, None)
                .is_err());
        }
        assert!(s
            .set_action(
                surf,
                sp,
                MolState::Bound(BoundState::Front),
                Face::Front,
                Action::Adsorb(BoundState::Front),
                None
            )
            .is_err());
        s.set_action(surf, sp, MolState::Solution, Face::Back, Action::Absorb, Some(SpeciesId(1)))
            .unwrap();
        let rule = s
            .surface(surf)
            .unwrap()
            .actions
            .collision(sp, MolState::Solution, Face::Back)
            .clone();
        assert_eq!(
            rule,
            ActionRule::Fixed {
                action: Action::Absorb,
                new_species: Some(SpeciesId(1))
            }
        );
    }

    #[test]
    fn failed_probability_leaves_table_unchanged() {
        let mut s = store();
        let surf = s.add_surface("x");
        let sp = SpeciesId(0);
        let front = Site::Solution(Face::Front);
        s.set_probability(surf, sp, front, Site::Solution(Face::Back), None, 0.6)
            .unwrap();
        let before = s.surface(surf).unwrap().actions.clone();
        let err = s
            .set_probability(surf, sp, front, Site::Bound(BoundState::Up), None, 0.5)
            .unwrap_err();
        assert!(matches!(
            err,
            PanelsimError::Config(ConfigError::ProbabilitySum { .. })
        ));
        assert_eq!(s.surface(surf).unwrap().actions, before);
        assert!(s
            .set_probability(surf, sp, front, front, None, 0.1)
            .is_err());
        assert!(s
            .set_probability(surf, sp, front, Site::Solution(Face::Back), None, 1.5)
            .is_err());
    }

    #[test]
    fn diffusion_change_rederives_rates() {
        let mut s = store();
        let surf = s.add_surface("x");
        let sp = SpeciesId(0);
        let front = Site::Solution(Face::Front);
        let bound = Site::Bound(BoundState::Front);
        s.set_rate(surf, sp, front, bound, None, 1.0).unwrap();
        let p = |s: &SurfaceStore| {
            s.surface(surf)
                .unwrap()
                .actions
                .collision(sp, MolState::Solution, Face::Front)
                .detail()
                .unwrap()
                .get(bound)
                .unwrap()
                .probability
        };
        let before = p(&s);
        s.set_diffusion(sp, MolState::Solution, 4.0).unwrap();
        // s = sqrt(pi dt / D) halves, so the small probability roughly halves
        assert!((p(&s) / before - 0.5).abs() < 0.01);
        // A rate with no diffusion cannot be converted; the old value stays.
        assert!(s.set_diffusion(sp, MolState::Solution, 0.0).is_err());
        assert!((s.diffusion(sp, MolState::Solution) - 4.0).abs() < 1e-15);
    }

    #[test]
    fn emitter_absorption_is_cached_per_panel() {
        let mut s = store();
        let surf = s.add_surface("bounds");
        let sphere = s
            .add_panel(surf, "outer", Sphere::new(Dim::Three, Point3::origin(), 10.0, Face::Front).unwrap())
            .unwrap();
        s.add_emitter(
            surf,
            Emitter {
                species: SpeciesId(1),
                face: Face::Back,
                position: Point3::origin(),
                amount: 1.0,
            },
        )
        .unwrap();
        s.recompute_emitter_absorption();
        let row = s.panel(sphere).unwrap().emitter_absorption.clone();
        assert!(row[1][Face::Back.index()] > 0.0);
        assert!(row[1][Face::Front.index()].abs() < 1e-15);
        assert!(row[0][Face::Back.index()].abs() < 1e-15);
        assert!(s.surface(surf).unwrap().has_emitters(SpeciesId(1), Face::Back));
    }
}
