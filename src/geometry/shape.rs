use crate::math::{Dim, Point3, Vector3};

use super::{
    Crossing, Cylinder, Disk, Face, Hemisphere, NearestPoint, PanelGeometry, Rectangle, Sphere,
    Triangle,
};

/// Shape tag of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Rectangle,
    Triangle,
    Sphere,
    Cylinder,
    Hemisphere,
    Disk,
}

impl ShapeKind {
    pub const COUNT: usize = 6;

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Triangle => "triangle",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Hemisphere => "hemisphere",
            Self::Disk => "disk",
        }
    }

    /// Whether the shape's surface has curvature.
    #[must_use]
    pub fn is_curved(self) -> bool {
        matches!(self, Self::Sphere | Self::Cylinder | Self::Hemisphere)
    }
}

/// The geometry of one panel.
#[derive(Debug, Clone)]
pub enum PanelShape {
    Rectangle(Rectangle),
    Triangle(Triangle),
    Sphere(Sphere),
    Cylinder(Cylinder),
    Hemisphere(Hemisphere),
    Disk(Disk),
}

impl PanelShape {
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle(_) => ShapeKind::Rectangle,
            Self::Triangle(_) => ShapeKind::Triangle,
            Self::Sphere(_) => ShapeKind::Sphere,
            Self::Cylinder(_) => ShapeKind::Cylinder,
            Self::Hemisphere(_) => ShapeKind::Hemisphere,
            Self::Disk(_) => ShapeKind::Disk,
        }
    }

    fn geometry(&self) -> &dyn PanelGeometry {
        match self {
            Self::Rectangle(s) => s,
            Self::Triangle(s) => s,
            Self::Sphere(s) => s,
            Self::Cylinder(s) => s,
            Self::Hemisphere(s) => s,
            Self::Disk(s) => s,
        }
    }
}

impl PanelGeometry for PanelShape {
    fn dim(&self) -> Dim {
        self.geometry().dim()
    }

    fn signed_distance(&self, point: &Point3) -> f64 {
        self.geometry().signed_distance(point)
    }

    fn intersect(&self, start: &Point3, end: &Point3) -> Option<Crossing> {
        self.geometry().intersect(start, end)
    }

    fn project(&self, point: &Point3) -> Point3 {
        self.geometry().project(point)
    }

    fn nearest_point(&self, point: &Point3, margin: f64) -> NearestPoint {
        self.geometry().nearest_point(point, margin)
    }

    fn normal(&self, point: &Point3, face: Face) -> Vector3 {
        self.geometry().normal(point, face)
    }

    fn centroid(&self) -> Point3 {
        self.geometry().centroid()
    }

    fn area(&self) -> f64 {
        self.geometry().area()
    }
}

macro_rules! impl_from_shape {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for PanelShape {
                fn from(shape: $variant) -> Self {
                    Self::$variant(shape)
                }
            }
        )*
    };
}

impl_from_shape!(Rectangle, Triangle, Sphere, Cylinder, Hemisphere, Disk);
