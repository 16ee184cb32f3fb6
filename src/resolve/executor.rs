use tracing::warn;

use crate::geometry::PanelGeometry;
use crate::math::frame::reflect_point;
use crate::molecule::Molecule;
use crate::state::{BoundState, MolState};
use crate::surface::{Action, SurfaceStore};

use super::{resting_face, Choice, Hit, Outcome};

/// Whether resolution goes on along the remaining sub-segment.
pub(super) enum Flow {
    Continue,
    Stop(Outcome),
}

/// Applies `choice` to a molecule whose move crosses `hit`.
pub(super) fn apply(store: &SurfaceStore, mol: &mut Molecule, hit: &Hit<'_>, choice: Choice) -> Flow {
    mol.species = choice.species;
    match choice.action {
        Action::Reflect => reflect(store, mol, hit),
        Action::Transmit | Action::NoAction => transmit(store, mol, hit),
        Action::Absorb => {
            mol.position = hit.crossing.point;
            Flow::Stop(Outcome::Absorbed { panel: hit.id })
        }
        Action::Jump => jump(store, mol, hit),
        Action::Port => port(store, mol, hit),
        Action::Adsorb(bound) => adsorb(store, mol, hit, bound),
        action @ (Action::ReversibleDesorb(_)
        | Action::IrreversibleDesorb(_)
        | Action::Flip(_)
        | Action::Multiple) => {
            warn!(
                ?action,
                species = mol.species.0,
                panel = %hit.panel.name,
                face = ?hit.crossing.face,
                "action cannot follow a collision; reflecting"
            );
            reflect(store, mol, hit)
        }
    }
}

/// Mirrors the end of the move across the tangent plane at the crossing.
/// Bound molecules are put back on their resident panel.
fn reflect(store: &SurfaceStore, mol: &mut Molecule, hit: &Hit<'_>) -> Flow {
    let eps = store.params().epsilon;
    let shape = &hit.panel.shape;
    let face = hit.crossing.face;
    let normal = shape.normal(&hit.crossing.point, face);
    let mut position = reflect_point(&mol.position, &hit.crossing.point, &normal);

    if let (Some(bound), Some(resident)) = (mol.state.bound(), mol.panel) {
        if let Ok(res) = store.panel(resident) {
            let rest = resting_face(bound, &res.shape, &mol.via);
            position = res.shape.snap_to_face(&res.shape.project(&position), rest, eps);
        }
    }

    if face.sign() * shape.signed_distance(&position) < -eps {
        return Flow::Stop(Outcome::Reverted);
    }
    mol.position = shape.snap_to_face(&position, face, eps);
    mol.via = shape.snap_to_face(&hit.crossing.point, face, eps);
    Flow::Continue
}

fn transmit(store: &SurfaceStore, mol: &mut Molecule, hit: &Hit<'_>) -> Flow {
    let eps = store.params().epsilon;
    let shape = &hit.panel.shape;
    let beyond = hit.crossing.face.opposite();
    if hit.crossing.end_face == beyond {
        mol.position = shape.snap_to_face(&mol.position, beyond, eps);
    }
    mol.via = shape.snap_to_face(&hit.crossing.point, beyond, eps);
    Flow::Continue
}

/// Carries the molecule by the offset between the two panels' centroids and
/// seats it on the target face.
fn jump(store: &SurfaceStore, mol: &mut Molecule, hit: &Hit<'_>) -> Flow {
    let face = hit.crossing.face;
    let Some(target) = hit.panel.jump[face.index()] else {
        warn!(panel = %hit.panel.name, ?face, species = mol.species.0, "jump without a target; reflecting");
        return reflect(store, mol, hit);
    };
    let Ok(dest) = store.panel(target.panel) else {
        warn!(panel = %hit.panel.name, ?face, "jump target is not in the store; reflecting");
        return reflect(store, mol, hit);
    };

    let eps = store.params().epsilon;
    let offset = dest.shape.centroid() - hit.panel.shape.centroid();
    let point = hit.crossing.point + offset;
    let mut position = mol.position + offset;
    if target.face.sign() * dest.shape.signed_distance(&position) < 0.0 {
        position = reflect_point(&position, &point, &dest.shape.normal(&point, target.face));
    }

    let rest = mol
        .state
        .bound()
        .and_then(BoundState::face)
        .unwrap_or(target.face);
    if mol.state.is_bound() {
        position = dest.shape.project(&position);
        mol.panel = Some(target.panel);
    }
    mol.position = dest.shape.snap_to_face(&position, rest, eps);
    mol.previous = dest.shape.snap_to_face(&point, rest, eps);
    mol.via = mol.previous;
    Flow::Stop(Outcome::Jumped {
        panel: target.panel,
    })
}

fn port(store: &SurfaceStore, mol: &mut Molecule, hit: &Hit<'_>) -> Flow {
    let port = store
        .surface(hit.panel.surface)
        .ok()
        .and_then(|s| s.port);
    let Some(port) = port else {
        warn!(panel = %hit.panel.name, species = mol.species.0, "port action on a surface without a port; reflecting");
        return reflect(store, mol, hit);
    };
    mol.position = hit.crossing.point;
    Flow::Stop(Outcome::Ported { port, panel: hit.id })
}

/// Binds the molecule at the crossing point, clamped into the panel.
/// Up and down states rest on the face the molecule arrived from.
fn adsorb(store: &SurfaceStore, mol: &mut Molecule, hit: &Hit<'_>, bound: BoundState) -> Flow {
    let params = store.params();
    let shape = &hit.panel.shape;
    let near = shape.nearest_point(&hit.crossing.point, params.margin);
    let face = bound.face().unwrap_or(hit.crossing.face);
    mol.position = shape.snap_to_face(&near.point, face, params.epsilon);
    mol.previous = mol.position;
    mol.via = mol.position;
    mol.state = MolState::Bound(bound);
    mol.panel = Some(hit.id);
    Flow::Stop(Outcome::Adsorbed { panel: hit.id })
}
