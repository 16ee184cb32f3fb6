use std::f64::consts::PI;

use crate::error::{GeometryError, Result};
use crate::math::{Dim, Point3, Vector3, TOLERANCE};

use super::plane::Plane;
use super::{Crossing, Face, NearestPoint, PanelGeometry};

/// A flat round panel: a disk in 3D, a segment of length `2r` in 2D.
///
/// The rim is edge 0.
#[derive(Debug, Clone)]
pub struct Disk {
    dim: Dim,
    plane: Plane,
    radius: f64,
}

impl Disk {
    /// Creates a disk centered at `center` with front normal `normal`.
    ///
    /// # Errors
    ///
    /// Returns an error in one dimension, for a non-positive radius, or for a
    /// zero normal.
    pub fn new(dim: Dim, center: Point3, radius: f64, normal: Vector3) -> Result<Self> {
        if dim == Dim::One {
            return Err(GeometryError::UnsupportedDimension {
                shape: "disk",
                dim: 1,
            }
            .into());
        }
        if radius < TOLERANCE {
            return Err(GeometryError::Degenerate("disk radius must be positive".into()).into());
        }
        let plane = Plane::new(dim.flatten_point(center), dim.flatten(normal))?;
        Ok(Self { dim, plane, radius })
    }

    #[must_use]
    pub fn center(&self) -> &Point3 {
        self.plane.origin()
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl PanelGeometry for Disk {
    fn dim(&self) -> Dim {
        self.dim
    }

    fn signed_distance(&self, point: &Point3) -> f64 {
        self.plane.signed_distance(point)
    }

    fn intersect(&self, start: &Point3, end: &Point3) -> Option<Crossing> {
        let (fraction, face, end_face) = self.plane.crossing(start, end)?;
        let point = start + (end - start) * fraction;
        ((point - self.center()).norm() <= self.radius).then_some(Crossing {
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
        let offset = projected - self.center();
        let r = offset.norm();
        if r <= self.radius {
            return NearestPoint::interior(projected);
        }
        let reach = self.radius - margin.min(self.radius);
        NearestPoint::clamped(self.center() + offset * (reach / r), 0)
    }

    fn normal(&self, _point: &Point3, face: Face) -> Vector3 {
        self.plane.plane_normal() * face.sign()
    }

    fn centroid(&self) -> Point3 {
        *self.center()
    }

    fn area(&self) -> f64 {
        match self.dim {
            Dim::Three => PI * self.radius * self.radius,
            _ => 2.0 * self.radius,
        }
    }
}
