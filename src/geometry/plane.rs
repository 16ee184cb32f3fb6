use crate::error::{GeometryError, Result};
use crate::math::frame::reflect_point;
use crate::math::{Point3, Vector3, TOLERANCE};

use super::Face;

/// An unbounded oriented plane (a line in 2D, a point in 1D).
///
/// The flat panels clip it to their extent.
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane through `origin` with front normal `normal`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn new(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            normal: normal / len,
        })
    }

    /// Creates a plane whose normal is `normal` or its negation, whichever
    /// points toward `front`.
    ///
    /// # Errors
    ///
    /// Returns an error if either vector is zero-length or if `front` lies in
    /// the plane.
    pub fn oriented(origin: Point3, normal: Vector3, front: &Vector3) -> Result<Self> {
        let plane = Self::new(origin, normal)?;
        let front_len = front.norm();
        if front_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let alignment = plane.normal.dot(front) / front_len;
        if alignment.abs() < TOLERANCE {
            return Err(GeometryError::Degenerate(
                "front direction lies in the panel plane".into(),
            )
            .into());
        }
        Ok(if alignment < 0.0 { plane.flipped() } else { plane })
    }

    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Unit front normal.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            origin: self.origin,
            normal: -self.normal,
        }
    }

    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    #[must_use]
    pub fn project(&self, point: &Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    #[must_use]
    pub fn reflect(&self, point: &Point3) -> Point3 {
        reflect_point(point, &self.origin, &self.normal)
    }

    /// Where the segment `start -> end` passes from one face to the other.
    ///
    /// Returns the fraction along the segment with the start and end faces,
    /// using non-strict classification of both endpoints.
    #[must_use]
    pub fn crossing(&self, start: &Point3, end: &Point3) -> Option<(f64, Face, Face)> {
        let da = self.signed_distance(start);
        let db = self.signed_distance(end);
        let start_face = Face::from_distance(da);
        let end_face = Face::from_distance(db);
        if start_face == end_face {
            return None;
        }
        let t = (da / (da - db)).clamp(0.0, 1.0);
        Some((t, start_face, end_face))
    }
}
