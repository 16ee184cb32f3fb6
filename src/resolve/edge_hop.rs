use rand::Rng;

use crate::geometry::PanelGeometry;
use crate::math::frame::rotate_between;
use crate::math::{Point3, TOLERANCE};
use crate::molecule::Molecule;
use crate::state::MolState;
use crate::surface::{PanelData, PanelId, SurfaceStore};

use super::{resting_face, ResolveScratch};

/// Keeps a bound molecule's end position on its panels.
///
/// When the move leaves the resident panel through an edge, the part beyond
/// the edge continues on the nearest neighbour within the neighbour
/// distance, rotated from the old panel's normal frame into the new one.
/// With no neighbour the edge reflects. A neighbour whose front faces the
/// other way takes the molecule on its back, with front and back bound
/// states swapped.
///
/// Returns `false` if the molecule was still leaving panels when the
/// iteration cap ran out.
pub(super) fn slide<R: Rng + ?Sized>(
    store: &SurfaceStore,
    mol: &mut Molecule,
    scratch: &mut ResolveScratch,
    rng: &mut R,
) -> bool {
    let (Some(mut bound), Some(mut resident)) = (mol.state.bound(), mol.panel) else {
        return true;
    };
    let params = store.params();
    let Ok(start) = store.panel(resident) else {
        return true;
    };
    let mut face = resting_face(bound, &start.shape, &mol.previous);

    for _ in 0..params.max_iterations {
        let Ok(panel) = store.panel(resident) else {
            return true;
        };
        let shape = &panel.shape;
        let projected = shape.project(&mol.position);
        let near = shape.nearest_point(&projected, 0.0);
        let overshoot = projected - near.point;
        if near.edge.is_none() || overshoot.norm() < TOLERANCE {
            mol.position = shape.snap_to_face(&projected, face, params.epsilon);
            mol.panel = Some(resident);
            mol.state = MolState::Bound(bound);
            return true;
        }
        let exit = near.point;

        let Some((next, landing)) = pick_neighbor(store, panel, &exit, scratch, rng) else {
            mol.position = exit - overshoot;
            continue;
        };
        let Ok(dest) = store.panel(next) else {
            return false;
        };

        let from_normal = shape.normal(&exit, face);
        let axis = from_normal.cross(&overshoot);
        let mut heading =
            rotate_between(&overshoot, &from_normal, &dest.shape.normal(&landing, face), &axis);
        if heading.dot(&(dest.shape.centroid() - landing)) < 0.0 {
            face = face.opposite();
            bound = bound.mirrored();
            heading =
                rotate_between(&overshoot, &from_normal, &dest.shape.normal(&landing, face), &axis);
        }
        mol.position = landing + heading;
        resident = next;
    }
    false
}

/// Nearest neighbour of `panel` within the neighbour distance of `exit`,
/// with the point on it closest to `exit`. Equally near neighbours are
/// chosen between at random.
fn pick_neighbor<R: Rng + ?Sized>(
    store: &SurfaceStore,
    panel: &PanelData,
    exit: &Point3,
    scratch: &mut ResolveScratch,
    rng: &mut R,
) -> Option<(PanelId, Point3)> {
    let params = store.params();
    scratch.neighbors.clear();
    let mut closest = f64::INFINITY;
    for &id in &panel.neighbors {
        let Ok(neighbor) = store.panel(id) else {
            continue;
        };
        let landing = neighbor.shape.nearest_point(exit, 0.0).point;
        let gap = (landing - exit).norm();
        if gap <= params.neighbor_dist {
            closest = closest.min(gap);
            scratch.neighbors.push((id, landing));
        }
    }
    scratch
        .neighbors
        .retain(|(_, landing)| (landing - exit).norm() <= closest + params.epsilon);
    match scratch.neighbors.len() {
        0 => None,
        1 => Some(scratch.neighbors[0]),
        n => Some(scratch.neighbors[rng.random_range(0..n)]),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::SurfaceParams;
    use crate::geometry::{Face, Rectangle};
    use crate::math::{Dim, Vector3};
    use crate::molecule::SpeciesId;
    use crate::resolve::{AllPanels, CrossingResolver, Outcome};
    use crate::state::BoundState;

    const EPS: f64 = 1e-9;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_square(corner: Point3, e1: Vector3, e2: Vector3, front: Vector3) -> Rectangle {
        Rectangle::new(Dim::Three, corner, &[e1, e2], front).unwrap()
    }

    fn floor() -> Rectangle {
        unit_square(Point3::origin(), Vector3::x(), Vector3::y(), Vector3::z())
    }

    fn run(s: &SurfaceStore, mol: &mut Molecule) -> Outcome {
        let mut scratch = ResolveScratch::new();
        let mut rng = StdRng::seed_from_u64(3);
        CrossingResolver::new(s, &AllPanels).resolve(mol, &mut scratch, &mut rng)
    }

    fn store(dim: Dim) -> SurfaceStore {
        SurfaceStore::new(dim, 1, SurfaceParams::default()).unwrap()
    }

    #[test]
    fn folds_onto_perpendicular_wall() {
        let mut s = store(Dim::Three);
        let surf = s.add_surface("corner");
        let f = s.add_panel(surf, "floor", floor()).unwrap();
        let w = s
            .add_panel(
                surf,
                "wall",
                unit_square(p(1.0, 0.0, 0.0), Vector3::y(), Vector3::z(), -Vector3::x()),
            )
            .unwrap();
        s.connect_neighbors(f, w).unwrap();

        let mut mol = Molecule::bound(
            SpeciesId(0),
            BoundState::Front,
            f,
            p(0.8, 0.5, EPS),
            p(1.2, 0.5, EPS),
        );
        assert_eq!(run(&s, &mut mol), Outcome::Moved);
        assert_eq!(mol.panel, Some(w));
        assert_eq!(mol.state, MolState::Bound(BoundState::Front));
        assert!((mol.position - p(1.0, 0.5, 0.2)).norm() < 1e-6);
        assert!(mol.position.x < 1.0);
    }

    #[test]
    fn bounces_off_edge_without_neighbour() {
        let mut s = store(Dim::Three);
        let surf = s.add_surface("tile");
        let f = s.add_panel(surf, "floor", floor()).unwrap();

        let mut mol = Molecule::bound(
            SpeciesId(0),
            BoundState::Up,
            f,
            p(0.8, 0.5, EPS),
            p(1.2, 0.5, EPS),
        );
        assert_eq!(run(&s, &mut mol), Outcome::Moved);
        assert_eq!(mol.panel, Some(f));
        assert!((mol.position - p(0.8, 0.5, 0.0)).norm() < 1e-6);
        assert!(mol.position.z > 0.0, "up state keeps its face");
    }

    #[test]
    fn coplanar_neighbour_facing_away_mirrors_state() {
        let mut s = store(Dim::Three);
        let surf = s.add_surface("sheet");
        let a = s.add_panel(surf, "a", floor()).unwrap();
        let b = s
            .add_panel(
                surf,
                "b",
                unit_square(p(1.0, 0.0, 0.0), Vector3::x(), Vector3::y(), -Vector3::z()),
            )
            .unwrap();
        s.connect_neighbors(a, b).unwrap();

        let mut mol = Molecule::bound(
            SpeciesId(0),
            BoundState::Front,
            a,
            p(0.8, 0.5, EPS),
            p(1.2, 0.5, EPS),
        );
        assert_eq!(run(&s, &mut mol), Outcome::Moved);
        assert_eq!(mol.panel, Some(b));
        assert_eq!(mol.state, MolState::Bound(BoundState::Back));
        assert!((mol.position - p(1.2, 0.5, 0.0)).norm() < 1e-6);
        assert!(mol.position.z > 0.0);
    }

    #[test]
    fn hops_around_a_corner_in_two_dimensions() {
        let mut s = store(Dim::Two);
        let surf = s.add_surface("outline");
        let bottom = s
            .add_panel(
                surf,
                "bottom",
                Rectangle::new(Dim::Two, Point3::origin(), &[Vector3::x()], Vector3::y()).unwrap(),
            )
            .unwrap();
        let side = s
            .add_panel(
                surf,
                "side",
                Rectangle::new(Dim::Two, p(1.0, 0.0, 0.0), &[Vector3::y()], -Vector3::x())
                    .unwrap(),
            )
            .unwrap();
        s.connect_neighbors(bottom, side).unwrap();

        let mut mol = Molecule::bound(
            SpeciesId(0),
            BoundState::Front,
            bottom,
            p(0.8, EPS, 0.0),
            p(1.2, EPS, 0.0),
        );
        assert_eq!(run(&s, &mut mol), Outcome::Moved);
        assert_eq!(mol.panel, Some(side));
        assert!((mol.position - p(1.0, 0.2, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn ties_between_neighbours_pick_either() {
        let mut s = store(Dim::Three);
        let surf = s.add_surface("fan");
        let f = s.add_panel(surf, "floor", floor()).unwrap();
        let up = s
            .add_panel(
                surf,
                "up",
                unit_square(p(1.0, 0.0, 0.0), Vector3::y(), Vector3::z(), -Vector3::x()),
            )
            .unwrap();
        let down = s
            .add_panel(
                surf,
                "down",
                unit_square(p(1.0, 0.0, 0.0), Vector3::y(), -Vector3::z(), -Vector3::x()),
            )
            .unwrap();
        s.connect_neighbors(f, up).unwrap();
        s.connect_neighbors(f, down).unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let mut scratch = ResolveScratch::new();
        let panel = s.panel(f).unwrap();
        let mut seen = [false; 2];
        for _ in 0..64 {
            let (id, landing) = pick_neighbor(&s, panel, &p(1.0, 0.5, 0.0), &mut scratch, &mut rng)
                .unwrap();
            assert!((landing - p(1.0, 0.5, 0.0)).norm() < 1e-12);
            seen[usize::from(id == down)] = true;
            assert!(id == up || id == down);
        }
        assert_eq!(seen, [true, true]);
        assert!(pick_neighbor(&s, panel, &p(1.0, 0.5, 3.0), &mut scratch, &mut rng).is_none());
    }

    #[test]
    fn bound_molecules_collide_with_panels_other_than_neighbours() {
        let mut s = store(Dim::Three);
        let surf = s.add_surface("ridge");
        let f = s.add_panel(surf, "floor", floor()).unwrap();
        let fin = s
            .add_panel(
                surf,
                "fin",
                unit_square(p(0.5, 0.0, 0.0), Vector3::y(), Vector3::z(), -Vector3::x()),
            )
            .unwrap();
        s.set_action(
            surf,
            SpeciesId(0),
            MolState::Bound(BoundState::Front),
            Face::Front,
            crate::surface::Action::Absorb,
            None,
        )
        .unwrap();
        let bound = |s: &SurfaceStore| {
            let mut mol = Molecule::bound(
                SpeciesId(0),
                BoundState::Front,
                f,
                p(0.2, 0.5, EPS),
                p(0.9, 0.5, EPS),
            );
            run(s, &mut mol)
        };

        assert_eq!(bound(&s), Outcome::Absorbed { panel: fin });
        s.connect_neighbors(f, fin).unwrap();
        assert_eq!(bound(&s), Outcome::Moved);
    }
}
