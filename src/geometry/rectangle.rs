use crate::error::{GeometryError, Result};
use crate::math::{Dim, Point3, Vector3, TOLERANCE};

use super::plane::Plane;
use super::{Crossing, Face, NearestPoint, PanelGeometry};

/// A flat rectangular panel.
///
/// Spanned from `corner` by `dim - 1` perpendicular edge vectors: a square
/// patch in 3D, a segment in 2D, a point in 1D.
#[derive(Debug, Clone)]
pub struct Rectangle {
    dim: Dim,
    plane: Plane,
    corner: Point3,
    edges: Vec<Vector3>,
}

impl Rectangle {
    /// Creates a rectangle. The normal is `e1 x e2` in 3D, perpendicular to
    /// `e1` in 2D and the x axis in 1D, negated if needed to agree with
    /// `front`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge count is not `dim - 1`, an edge is
    /// zero-length, 3D edges are not perpendicular, or `front` lies in the
    /// panel.
    pub fn new(dim: Dim, corner: Point3, edges: &[Vector3], front: Vector3) -> Result<Self> {
        if edges.len() + 1 != dim.count() {
            return Err(GeometryError::DimensionMismatch {
                expected: dim.count(),
                found: edges.len() + 1,
            }
            .into());
        }
        let corner = dim.flatten_point(corner);
        let edges: Vec<Vector3> = edges.iter().map(|e| dim.flatten(*e)).collect();
        if edges.iter().any(|e| e.norm() < TOLERANCE) {
            return Err(GeometryError::ZeroVector.into());
        }

        let normal = match edges.as_slice() {
            [e1, e2] => {
                if e1.dot(e2).abs() > TOLERANCE * e1.norm() * e2.norm() {
                    return Err(GeometryError::Degenerate(
                        "rectangle edges must be perpendicular".into(),
                    )
                    .into());
                }
                e1.cross(e2)
            }
            [e1] => dim.perpendicular(e1),
            _ => Vector3::x(),
        };
        let plane = Plane::oriented(corner, normal, &dim.flatten(front))?;

        Ok(Self {
            dim,
            plane,
            corner,
            edges,
        })
    }

    #[must_use]
    pub fn corner(&self) -> &Point3 {
        &self.corner
    }

    #[must_use]
    pub fn edges(&self) -> &[Vector3] {
        &self.edges
    }

    /// Edge parameters of an in-plane point; each lies in `[0, 1]` inside.
    fn parameters<'a>(&'a self, point: &'a Point3) -> impl Iterator<Item = f64> + 'a {
        self.edges
            .iter()
            .map(move |e| (point - self.corner).dot(e) / e.norm_squared())
    }

    fn contains(&self, point: &Point3) -> bool {
        self.parameters(point).all(|s| (0.0..=1.0).contains(&s))
    }
}

impl PanelGeometry for Rectangle {
    fn dim(&self) -> Dim {
        self.dim
    }

    fn signed_distance(&self, point: &Point3) -> f64 {
        self.plane.signed_distance(point)
    }

    fn intersect(&self, start: &Point3, end: &Point3) -> Option<Crossing> {
        let (fraction, face, end_face) = self.plane.crossing(start, end)?;
        let point = start + (end - start) * fraction;
        self.contains(&point).then_some(Crossing {
            point,
            fraction,
            face,
            end_face,
            second_fraction: None,
        })
    }

    fn project(&self, point: &Point3) -> Point3 {
        self.plane.project(point)
    }

    fn nearest_point(&self, point: &Point3, margin: f64) -> NearestPoint {
        let projected = self.project(point);
        let mut clamped = self.corner;
        let mut edge = None;
        for (i, (e, s)) in self.edges.iter().zip(self.parameters(&projected)).enumerate() {
            let inset = (margin / e.norm()).min(0.5);
            let s = if s < 0.0 {
                edge = edge.or(Some(2 * i));
                inset
            } else if s > 1.0 {
                edge = edge.or(Some(2 * i + 1));
                1.0 - inset
            } else {
                s
            };
            clamped += e * s;
        }
        match edge {
            Some(edge) => NearestPoint::clamped(clamped, edge),
            None => NearestPoint::interior(projected),
        }
    }

    fn normal(&self, _point: &Point3, face: Face) -> Vector3 {
        self.plane.plane_normal() * face.sign()
    }

    fn centroid(&self) -> Point3 {
        self.edges.iter().fold(self.corner, |c, e| c + e * 0.5)
    }

    fn area(&self) -> f64 {
        match self.edges.as_slice() {
            [e1, e2] => e1.cross(e2).norm(),
            [e1] => e1.norm(),
            _ => 1.0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square() -> Rectangle {
        Rectangle::new(
            Dim::Three,
            Point3::new(1.0, -1.0, -1.0),
            &[Vector3::new(0.0, 2.0, 0.0), Vector3::new(0.0, 0.0, 2.0)],
            Vector3::x(),
        )
        .unwrap()
    }

    #[test]
    fn segment_through_square() {
        let r = square();
        let c = r
            .intersect(&Point3::origin(), &Point3::new(2.0, 0.0, 0.0))
            .unwrap();
        assert!((c.fraction - 0.5).abs() < TOLERANCE);
        assert!((c.point - Point3::new(1.0, 0.0, 0.0)).norm() < TOLERANCE);
        assert_eq!(c.face, Face::Back);
        assert_eq!(c.end_face, Face::Front);
        assert!(c.second_fraction.is_none());
    }

    #[test]
    fn miss_outside_extent() {
        let r = square();
        assert!(r
            .intersect(&Point3::new(0.0, 3.0, 0.0), &Point3::new(2.0, 3.0, 0.0))
            .is_none());
    }

    #[test]
    fn nearest_point_clamps_and_reports_edge() {
        let r = square();
        let n = r.nearest_point(&Point3::new(5.0, 0.0, 4.0), 0.1);
        assert_eq!(n.edge, Some(3));
        assert!((n.point - Point3::new(1.0, 0.0, 0.9)).norm() < 1e-12);

        let n = r.nearest_point(&Point3::new(5.0, -3.0, 0.5), 0.0);
        assert_eq!(n.edge, Some(0));
        assert!((n.point - Point3::new(1.0, -1.0, 0.5)).norm() < 1e-12);

        let n = r.nearest_point(&Point3::new(-2.0, 0.2, 0.3), 0.1);
        assert_eq!(n.edge, None);
        assert!((n.point - Point3::new(1.0, 0.2, 0.3)).norm() < 1e-12);
    }

    #[test]
    fn area_and_centroid_by_dimension() {
        let r = square();
        assert!((r.area() - 4.0).abs() < 1e-12);
        assert!((r.centroid() - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);

        let seg = Rectangle::new(Dim::Two, Point3::origin(), &[Vector3::new(0.0, 3.0, 0.0)], -Vector3::x())
            .unwrap();
        assert!((seg.area() - 3.0).abs() < 1e-12);
        assert!((seg.normal(&Point3::origin(), Face::Front) + Vector3::x()).norm() < 1e-12);

        let point = Rectangle::new(Dim::One, Point3::new(2.0, 0.0, 0.0), &[], Vector3::x()).unwrap();
        assert!((point.area() - 1.0).abs() < 1e-12);
        assert!(point.signed_distance(&Point3::new(3.0, 0.0, 0.0)) > 0.0);
    }

    #[test]
    fn rejects_bad_edges() {
        assert!(Rectangle::new(Dim::Three, Point3::origin(), &[Vector3::x()], Vector3::z()).is_err());
        assert!(Rectangle::new(
            Dim::Three,
            Point3::origin(),
            &[Vector3::x(), Vector3::new(1.0, 1.0, 0.0)],
            Vector3::z()
        )
        .is_err());
    }

    #[test]
    fn reflection_negates_distance() {
        let r = square();
        for d in [0.25, 1.0, -0.7] {
            let p = Point3::new(1.0 + d, 0.3, 0.1);
            let c = Point3::new(1.0, 0.3, 0.1);
            let n = r.normal(&c, Face::Front);
            let q = crate::math::frame::reflect_point(&p, &c, &n);
            assert!((r.signed_distance(&q) + d).abs() < 1e-12);
        }
    }
}
