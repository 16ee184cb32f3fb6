pub mod frame;
pub mod quadratic;

use crate::error::GeometryError;

/// 3D point type. Lower-dimensional systems keep unused coordinates at zero.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Tolerance for rejecting degenerate construction input.
pub const TOLERANCE: f64 = 1e-10;

/// Spatial dimensionality of a simulated system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    One,
    Two,
    Three,
}

impl Dim {
    /// Number of coordinates in use.
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Zeroes the coordinates a system of this dimension does not use.
    #[must_use]
    pub fn flatten(self, v: Vector3) -> Vector3 {
        match self {
            Self::One => Vector3::new(v.x, 0.0, 0.0),
            Self::Two => Vector3::new(v.x, v.y, 0.0),
            Self::Three => v,
        }
    }

    /// Point version of [`flatten`](Self::flatten).
    #[must_use]
    pub fn flatten_point(self, p: Point3) -> Point3 {
        Point3::from(self.flatten(p.coords))
    }

    /// Returns a unit vector perpendicular to `v` that stays inside the
    /// system's coordinates.
    ///
    /// In one dimension there is no perpendicular direction and the x axis is
    /// returned.
    #[must_use]
    pub fn perpendicular(self, v: &Vector3) -> Vector3 {
        match self {
            Self::One => Vector3::x(),
            Self::Two => {
                let p = Vector3::new(v.y, -v.x, 0.0);
                p.try_normalize(0.0).unwrap_or_else(Vector3::x)
            }
            Self::Three => {
                // Choose a reference vector not parallel to v
                let reference = if v.x.abs() < 0.9 * v.norm() {
                    Vector3::x()
                } else {
                    Vector3::y()
                };
                v.cross(&reference)
                    .try_normalize(0.0)
                    .unwrap_or_else(Vector3::z)
            }
        }
    }
}

impl TryFrom<usize> for Dim {
    type Error = GeometryError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            _ => Err(GeometryError::Degenerate(format!(
                "systems must have 1, 2 or 3 dimensions, not {n}"
            ))),
        }
    }
}
