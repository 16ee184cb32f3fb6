use std::f64::consts::PI;

use crate::error::{GeometryError, Result};
use crate::math::{Dim, Point3, Vector3, TOLERANCE};

use super::quadric::{self, Quadric};
use super::{Crossing, Face, NearestPoint, PanelGeometry};

/// An open-ended cylinder panel between two axis points.
///
/// In 2D it is the pair of segments at distance `radius` either side of the
/// axis. Rim 0 is at the axis start, rim 1 at the axis end.
#[derive(Debug, Clone)]
pub struct Cylinder {
    dim: Dim,
    start: Point3,
    axis: Vector3,
    length: f64,
    radius: f64,
    outside: Face,
}

impl Cylinder {
    /// # Errors
    ///
    /// Returns an error in one dimension, for coincident axis points, or for
    /// a non-positive radius.
    pub fn new(dim: Dim, start: Point3, end: Point3, radius: f64, outside: Face) -> Result<Self> {
        if dim == Dim::One {
            return Err(GeometryError::UnsupportedDimension {
                shape: "cylinder",
                dim: 1,
            }
            .into());
        }
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("cylinder radius must be positive".into()).into(),
            );
        }
        let start = dim.flatten_point(start);
        let axis = dim.flatten_point(end) - start;
        let length = axis.norm();
        if length < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            dim,
            start,
            axis: axis / length,
            length,
            radius,
            outside,
        })
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Unit axis direction.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Component of `v` perpendicular to the axis.
    fn perp(&self, v: &Vector3) -> Vector3 {
        v - self.axis * v.dot(&self.axis)
    }

    fn axial(&self, point: &Point3) -> f64 {
        (point - self.start).dot(&self.axis)
    }

    fn radial(&self, point: &Point3) -> Vector3 {
        self.perp(&(point - self.start))
            .try_normalize(0.0)
            .unwrap_or_else(|| self.dim.perpendicular(&self.axis))
    }
}

impl PanelGeometry for Cylinder {
    fn dim(&self) -> Dim {
        self.dim
    }

    fn signed_distance(&self, point: &Point3) -> f64 {
        (self.perp(&(point - self.start)).norm() - self.radius) * self.outside.sign()
    }

    fn intersect(&self, start: &Point3, end: &Point3) -> Option<Crossing> {
        let d = self.perp(&(end - start));
        let dp = self.perp(&(start - self.start));
        let q = Quadric {
            a: d.norm_squared(),
            b: 2.0 * dp.dot(&d),
            c: dp.norm_squared() - self.radius * self.radius,
        };
        let end_face = Face::from_distance(self.signed_distance(end));
        quadric::crossing(start, end, &q, self.outside, end_face, |p| {
            (0.0..=self.length).contains(&self.axial(p))
        })
    }

    fn project(&self, point: &Point3) -> Point3 {
        self.start + self.axis * self.axial(point) + self.radial(point) * self.radius
    }

    fn nearest_point(&self, point: &Point3, margin: f64) -> NearestPoint {
        let s = self.axial(point);
        let inset = margin.min(0.5 * self.length);
        let (s, edge) = if s < 0.0 {
            (inset, Some(0))
        } else if s > self.length {
            (self.length - inset, Some(1))
        } else {
            (s, None)
        };
        let surface = self.start + self.axis * s + self.radial(point) * self.radius;
        match edge {
            Some(edge) => NearestPoint::clamped(surface, edge),
            None => NearestPoint::interior(surface),
        }
    }

    fn normal(&self, point: &Point3, face: Face) -> Vector3 {
        self.radial(point) * (self.outside.sign() * face.sign())
    }

    fn centroid(&self) -> Point3 {
        self.start + self.axis * (0.5 * self.length)
    }

    fn area(&self) -> f64 {
        match self.dim {
            Dim::Three => 2.0 * PI * self.radius * self.length,
            _ => 2.0 * self.length,
        }
    }
}
