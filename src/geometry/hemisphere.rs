use std::f64::consts::PI;

use crate::error::{GeometryError, Result};
use crate::math::{Dim, Point3, Vector3, TOLERANCE};

use super::quadric;
use super::sphere::Sphere;
use super::{Crossing, Face, NearestPoint, PanelGeometry};

/// Half of a sphere, open toward `opening`. A semicircle in 2D.
///
/// The rim is edge 0.
#[derive(Debug, Clone)]
pub struct Hemisphere {
    dim: Dim,
    center: Point3,
    radius: f64,
    opening: Vector3,
    outside: Face,
}

impl Hemisphere {
    /// Creates a hemisphere. `opening` points from the center toward the
    /// missing half.
    ///
    /// # Errors
    ///
    /// Returns an error in one dimension, for a non-positive radius, or for a
    /// zero opening direction.
    pub fn new(
        dim: Dim,
        center: Point3,
        radius: f64,
        opening: Vector3,
        outside: Face,
    ) -> Result<Self> {
        if dim == Dim::One {
            return Err(GeometryError::UnsupportedDimension {
                shape: "hemisphere",
                dim: 1,
            }
            .into());
        }
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("hemisphere radius must be positive".into()).into(),
            );
        }
        let opening = dim.flatten(opening);
        let len = opening.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            dim,
            center: dim.flatten_point(center),
            radius,
            opening: opening / len,
            outside,
        })
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn opening(&self) -> &Vector3 {
        &self.opening
    }

    fn on_shell(&self, point: &Point3) -> bool {
        (point - self.center).dot(&self.opening) <= 0.0
    }
}

impl PanelGeometry for Hemisphere {
    fn dim(&self) -> Dim {
        self.dim
    }

    fn signed_distance(&self, point: &Point3) -> f64 {
        ((point - self.center).norm() - self.radius) * self.outside.sign()
    }

    fn intersect(&self, start: &Point3, end: &Point3) -> Option<Crossing> {
        let q = Sphere::quadric(&self.center, self.radius, start, end);
        let end_face = Face::from_distance(self.signed_distance(end));
        quadric::crossing(start, end, &q, self.outside, end_face, |p| self.on_shell(p))
    }

    fn project(&self, point: &Point3) -> Point3 {
        self.center + Sphere::radial(&self.center, point) * self.radius
    }

    fn nearest_point(&self, point: &Point3, margin: f64) -> NearestPoint {
        let projected = self.project(point);
        if self.on_shell(&projected) {
            return NearestPoint::interior(projected);
        }
        // Walk along the great circle to the rim, then `margin` past it.
        let dir = Sphere::radial(&self.center, point);
        let rim = (dir - self.opening * dir.dot(&self.opening))
            .try_normalize(0.0)
            .unwrap_or_else(|| self.dim.perpendicular(&self.opening));
        let angle = (margin / self.radius).min(0.5 * PI);
        let toward = rim * angle.cos() - self.opening * angle.sin();
        NearestPoint::clamped(self.center + toward * self.radius, 0)
    }

    fn normal(&self, point: &Point3, face: Face) -> Vector3 {
        Sphere::radial(&self.center, point) * (self.outside.sign() * face.sign())
    }

    /// Centroid of the shell, on the axis toward the closed pole.
    fn centroid(&self) -> Point3 {
        let offset = match self.dim {
            Dim::Three => 0.5 * self.radius,
            _ => 2.0 * self.radius / PI,
        };
        self.center - self.opening * offset
    }

    fn area(&self) -> f64 {
        match self.dim {
            Dim::Three => 2.0 * PI * self.radius * self.radius,
            _ => PI * self.radius,
        }
    }
}
