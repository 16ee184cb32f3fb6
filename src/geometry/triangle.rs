use crate::error::{GeometryError, Result};
use crate::math::{Dim, Point3, Vector3, TOLERANCE};

use super::plane::Plane;
use super::{Crossing, Face, NearestPoint, PanelGeometry};

/// A flat simplex panel with `dim` vertices.
///
/// A triangle in 3D, a segment in 2D, a point in 1D. In 3D edge `i` joins
/// vertex `i` to vertex `i + 1`.
#[derive(Debug, Clone)]
pub struct Triangle {
    dim: Dim,
    plane: Plane,
    vertices: Vec<Point3>,
}

impl Triangle {
    /// Creates a triangle whose front normal points toward `front`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex count is not `dim`, the vertices are
    /// coincident or collinear, or `front` lies in the panel.
    pub fn new(dim: Dim, vertices: &[Point3], front: Vector3) -> Result<Self> {
        if vertices.len() != dim.count() {
            return Err(GeometryError::DimensionMismatch {
                expected: dim.count(),
                found: vertices.len(),
            }
            .into());
        }
        let vertices: Vec<Point3> = vertices.iter().map(|v| dim.flatten_point(*v)).collect();

        let normal = match vertices.as_slice() {
            [a, b, c] => {
                let n = (b - a).cross(&(c - a));
                if n.norm() < TOLERANCE {
                    return Err(GeometryError::Degenerate(
                        "triangle vertices are collinear".into(),
                    )
                    .into());
                }
                n
            }
            [a, b] => {
                let e = b - a;
                if e.norm() < TOLERANCE {
                    return Err(GeometryError::ZeroVector.into());
                }
                dim.perpendicular(&e)
            }
            _ => Vector3::x(),
        };
        let plane = Plane::oriented(vertices[0], normal, &dim.flatten(front))?;

        Ok(Self {
            dim,
            plane,
            vertices,
        })
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Barycentric weights `(u, v, w)` of an in-plane point.
    fn barycentric(a: &Point3, b: &Point3, c: &Point3, p: &Point3) -> (f64, f64, f64) {
        let v0 = b - a;
        let v1 = c - a;
        let v2 = p - a;
        let d00 = v0.dot(&v0);
        let d01 = v0.dot(&v1);
        let d11 = v1.dot(&v1);
        let d20 = v2.dot(&v0);
        let d21 = v2.dot(&v1);
        let denom = d00 * d11 - d01 * d01;
        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        (1.0 - v - w, v, w)
    }

    fn contains(&self, point: &Point3) -> bool {
        match self.vertices.as_slice() {
            [a, b, c] => {
                let (u, v, w) = Self::barycentric(a, b, c, point);
                u >= 0.0 && v >= 0.0 && w >= 0.0
            }
            [a, b] => {
                let s = segment_parameter(a, b, point);
                (0.0..=1.0).contains(&s)
            }
            _ => true,
        }
    }
}

fn segment_parameter(a: &Point3, b: &Point3, p: &Point3) -> f64 {
    let e = b - a;
    (p - a).dot(&e) / e.norm_squared()
}

/// Closest point to `p` on the segment `a -> b`.
fn closest_on_segment(a: &Point3, b: &Point3, p: &Point3) -> Point3 {
    let s = segment_parameter(a, b, p).clamp(0.0, 1.0);
    a + (b - a) * s
}

impl PanelGeometry for Triangle {
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
        if self.contains(&projected) {
            return NearestPoint::interior(projected);
        }
        match self.vertices.as_slice() {
            [a, b] => {
                let s = segment_parameter(a, b, &projected);
                let inset = (margin / (b - a).norm()).min(0.5);
                let (s, edge) = if s < 0.0 { (inset, 0) } else { (1.0 - inset, 1) };
                NearestPoint::clamped(a + (b - a) * s, edge)
            }
            [_, _, _] => {
                let mut best = (f64::INFINITY, projected, 0);
                for i in 0..3 {
                    let a = &self.vertices[i];
                    let b = &self.vertices[(i + 1) % 3];
                    let q = closest_on_segment(a, b, &projected);
                    let d = (q - projected).norm_squared();
                    if d < best.0 {
                        best = (d, q, i);
                    }
                }
                let (_, on_edge, edge) = best;
                let inward = self.centroid() - on_edge;
                let pull = margin.min(0.5 * inward.norm());
                let point = match inward.try_normalize(0.0) {
                    Some(dir) => on_edge + dir * pull,
                    None => on_edge,
                };
                NearestPoint::clamped(point, edge)
            }
            _ => NearestPoint::interior(projected),
        }
    }

    fn normal(&self, _point: &Point3, face: Face) -> Vector3 {
        self.plane.plane_normal() * face.sign()
    }

    fn centroid(&self) -> Point3 {
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.coords);
        #[allow(clippy::cast_precision_loss)]
        let n = self.vertices.len() as f64;
        Point3::from(sum / n)
    }

    fn area(&self) -> f64 {
        match self.vertices.as_slice() {
            [a, b, c] => 0.5 * (b - a).cross(&(c - a)).norm(),
            [a, b] => (b - a).norm(),
            _ => 1.0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tri() -> Triangle {
        Triangle::new(
            Dim::Three,
            &[
                Point3::origin(),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ],
            Vector3::z(),
        )
        .unwrap()
    }

    #[test]
    fn barycentric_hit_and_miss() {
        let t = tri();
        let hit = t
            .intersect(&Point3::new(0.5, 0.5, 1.0), &Point3::new(0.5, 0.5, -1.0))
            .unwrap();
        assert_eq!(hit.face, Face::Front);
        assert!((hit.fraction - 0.5).abs() < TOLERANCE);
        assert!(t
            .intersect(&Point3::new(1.5, 1.5, 1.0), &Point3::new(1.5, 1.5, -1.0))
            .is_none());
    }

    #[test]
    fn nearest_point_on_hypotenuse() {
        let t = tri();
        let n = t.nearest_point(&Point3::new(2.0, 2.0, 3.0), 0.0);
        assert_eq!(n.edge, Some(1));
        assert!((n.point - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);

        let pulled = t.nearest_point(&Point3::new(2.0, 2.0, 3.0), 1e-3);
        assert!(t.contains(&pulled.point));
        assert!(((pulled.point - n.point).norm() - 1e-3).abs() < 1e-12);
    }

    #[test]
    fn segment_triangle_in_2d() {
        let s = Triangle::new(
            Dim::Two,
            &[Point3::new(1.0, -1.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
            Vector3::x(),
        )
        .unwrap();
        assert!((s.area() - 2.0).abs() < 1e-12);
        let n = s.nearest_point(&Point3::new(0.0, -4.0, 0.0), 0.0);
        assert_eq!(n.edge, Some(0));
        assert!((n.point - Point3::new(1.0, -1.0, 0.0)).norm() < 1e-12);
        let c = s
            .intersect(&Point3::new(2.0, 0.5, 0.0), &Point3::new(0.0, 0.5, 0.0))
            .unwrap();
        assert_eq!(c.face, Face::Front);
        assert_eq!(c.end_face, Face::Back);
    }

    #[test]
    fn collinear_rejected() {
        assert!(Triangle::new(
            Dim::Three,
            &[Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
            Vector3::z()
        )
        .is_err());
    }

    #[test]
    fn area_and_centroid() {
        let t = tri();
        assert!((t.area() - 2.0).abs() < 1e-12);
        let c = t.centroid();
        assert!((c - Point3::new(2.0 / 3.0, 2.0 / 3.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn reflection_negates_distance() {
        let t = tri();
        let c = Point3::new(0.5, 0.7, 0.0);
        let front = t.normal(&c, Face::Front);
        for face in Face::ALL {
            let n = t.normal(&c, face);
            for d in [0.3, 1.5, -0.2, -2.0] {
                let p = c + front * d;
                assert!((t.signed_distance(&p) - d).abs() < 1e-12);
                let q = crate::math::frame::reflect_point(&p, &c, &n);
                assert!((t.signed_distance(&q) + d).abs() < 1e-12);
            }
        }
    }
}
