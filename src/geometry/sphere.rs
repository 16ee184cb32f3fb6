use std::f64::consts::PI;

use crate::error::{GeometryError, Result};
use crate::math::{Dim, Point3, Vector3, TOLERANCE};

use super::quadric::{self, Quadric};
use super::{Crossing, Face, NearestPoint, PanelGeometry};

/// A full sphere panel: a circle in 2D, the point pair `center ± r` in 1D.
///
/// `outside` names the face on the convex side, so a sphere can enclose its
/// front or its back.
#[derive(Debug, Clone)]
pub struct Sphere {
    dim: Dim,
    center: Point3,
    radius: f64,
    outside: Face,
}

impl Sphere {
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive.
    pub fn new(dim: Dim, center: Point3, radius: f64, outside: Face) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("sphere radius must be positive".into()).into(),
            );
        }
        Ok(Self {
            dim,
            center: dim.flatten_point(center),
            radius,
            outside,
        })
    }

    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Face on the convex side.
    #[must_use]
    pub fn outside(&self) -> Face {
        self.outside
    }

    /// Unit direction from the center toward `point`, or the x axis at the
    /// center itself.
    pub(super) fn radial(center: &Point3, point: &Point3) -> Vector3 {
        (point - center)
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::x)
    }

    pub(super) fn quadric(center: &Point3, radius: f64, start: &Point3, end: &Point3) -> Quadric {
        let d = end - start;
        let dp = start - center;
        Quadric {
            a: d.norm_squared(),
            b: 2.0 * dp.dot(&d),
            c: dp.norm_squared() - radius * radius,
        }
    }
}

impl PanelGeometry for Sphere {
    fn dim(&self) -> Dim {
        self.dim
    }

    fn signed_distance(&self, point: &Point3) -> f64 {
        ((point - self.center).norm() - self.radius) * self.outside.sign()
    }

    fn intersect(&self, start: &Point3, end: &Point3) -> Option<Crossing> {
        let q = Self::quadric(&self.center, self.radius, start, end);
        let end_face = Face::from_distance(self.signed_distance(end));
        quadric::crossing(start, end, &q, self.outside, end_face, |_| true)
    }

    fn project(&self, point: &Point3) -> Point3 {
        self.center + Self::radial(&self.center, point) * self.radius
    }

    fn nearest_point(&self, point: &Point3, _margin: f64) -> NearestPoint {
        NearestPoint::interior(self.project(point))
    }

    fn normal(&self, point: &Point3, face: Face) -> Vector3 {
        Self::radial(&self.center, point) * (self.outside.sign() * face.sign())
    }

    fn centroid(&self) -> Point3 {
        self.center
    }

    fn area(&self) -> f64 {
        match self.dim {
            Dim::One => 2.0,
            Dim::Two => 2.0 * PI * self.radius,
            Dim::Three => 4.0 * PI * self.radius * self.radius,
        }
    }
}
