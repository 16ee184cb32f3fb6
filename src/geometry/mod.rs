mod cylinder;
mod disk;
mod hemisphere;
mod plane;
mod quadric;
mod rectangle;
mod shape;
mod sphere;
mod triangle;

pub use cylinder::Cylinder;
pub use disk::Disk;
pub use hemisphere::Hemisphere;
pub use plane::Plane;
pub use rectangle::Rectangle;
pub use shape::{PanelShape, ShapeKind};
pub use sphere::Sphere;
pub use triangle::Triangle;

use crate::math::{Dim, Point3, Vector3};

/// One of the two sides of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    Front,
    Back,
}

impl Face {
    pub const ALL: [Self; 2] = [Self::Front, Self::Back];

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    /// `+1` for the front, `-1` for the back.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Front => 1.0,
            Self::Back => -1.0,
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Non-strict face of a signed distance: zero goes to the back.
    #[must_use]
    pub fn from_distance(distance: f64) -> Self {
        if distance > 0.0 {
            Self::Front
        } else {
            Self::Back
        }
    }
}

/// Result side of a classification. `None` only appears in strict mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    None,
}

impl From<Face> for Side {
    fn from(face: Face) -> Self {
        match face {
            Face::Front => Self::Front,
            Face::Back => Self::Back,
        }
    }
}

/// Side of a panel a point lies on, with its signed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub side: Side,
    pub distance: f64,
}

/// A segment crossing a panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Crossing point on the panel.
    pub point: Point3,
    /// Position of the crossing along the segment, in `[0, 1]`.
    pub fraction: f64,
    /// Face the segment approaches from.
    pub face: Face,
    /// Face the segment end lies on.
    pub end_face: Face,
    /// Later crossing of the same curved panel within the segment.
    pub second_fraction: Option<f64>,
}

/// Closest point on a panel's finite extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    pub point: Point3,
    /// Boundary edge the projection was clamped onto, if it was clamped.
    pub edge: Option<usize>,
}

impl NearestPoint {
    fn interior(point: Point3) -> Self {
        Self { point, edge: None }
    }

    fn clamped(point: Point3, edge: usize) -> Self {
        Self {
            point,
            edge: Some(edge),
        }
    }
}

/// Analytic geometry of a single panel.
///
/// Signed distance is positive on the front. For curved panels it is the
/// distance to the full underlying surface, so points beyond a cylinder's
/// ends or a hemisphere's opening still classify.
pub trait PanelGeometry {
    /// Dimension of the system the panel lives in.
    fn dim(&self) -> Dim;

    fn signed_distance(&self, point: &Point3) -> f64;

    /// Classifies a point. In strict mode an exact zero distance gives
    /// [`Side::None`]; otherwise it counts as the back.
    fn classify(&self, point: &Point3, strict: bool) -> Classification {
        let distance = self.signed_distance(point);
        let side = if strict && distance == 0.0 {
            Side::None
        } else {
            Face::from_distance(distance).into()
        };
        Classification { side, distance }
    }

    /// Earliest crossing of the segment `start -> end` with the panel.
    ///
    /// Curved panels also report a second crossing of the same segment in
    /// [`Crossing::second_fraction`].
    fn intersect(&self, start: &Point3, end: &Point3) -> Option<Crossing>;

    /// Orthogonal projection onto the panel's unbounded surface.
    fn project(&self, point: &Point3) -> Point3;

    /// Projection clamped to the panel's extent. A clamped point is pulled
    /// `margin` back toward the interior.
    fn nearest_point(&self, point: &Point3, margin: f64) -> NearestPoint;

    /// Unit normal pointing into `face` at the surface point nearest `point`.
    fn normal(&self, point: &Point3, face: Face) -> Vector3;

    fn centroid(&self) -> Point3;

    /// The `(dim - 1)`-dimensional measure of the panel.
    fn area(&self) -> f64;

    /// Moves `point` along the normal so it lies on `face`, `epsilon` off the
    /// surface. Points already at least `epsilon` onto that face are kept.
    fn snap_to_face(&self, point: &Point3, face: Face, epsilon: f64) -> Point3 {
        let distance = self.signed_distance(point);
        if face.sign() * distance >= epsilon {
            return *point;
        }
        let front = self.normal(point, Face::Front);
        point + front * (face.sign() * epsilon - distance)
    }
}
