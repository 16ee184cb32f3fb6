use nalgebra::{Rotation3, Unit};

use super::{Point3, Vector3, TOLERANCE};

/// Mirrors `point` across the plane through `origin` with unit `normal`.
#[must_use]
pub fn reflect_point(point: &Point3, origin: &Point3, normal: &Vector3) -> Point3 {
    let d = (point - origin).dot(normal);
    point - normal * (2.0 * d)
}

/// Rotates `v` by the rotation that carries unit `from` onto unit `to`.
///
/// When the two normals are antiparallel the rotation is a half turn about
/// `fallback_axis`, which must be perpendicular to `from`.
#[must_use]
pub fn rotate_between(v: &Vector3, from: &Vector3, to: &Vector3, fallback_axis: &Vector3) -> Vector3 {
    if (from - to).norm() < TOLERANCE {
        return *v;
    }
    let rotation = Rotation3::rotation_between(from, to).or_else(|| {
        Unit::try_new(*fallback_axis, TOLERANCE)
            .map(|axis| Rotation3::from_axis_angle(&axis, std::f64::consts::PI))
    });
    match rotation {
        Some(r) => r * v,
        None => *v,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn reflect_flips_signed_distance() {
        let n = Vector3::new(1.0, 1.0, 0.0).normalize();
        let origin = Point3::new(1.0, 0.0, 0.0);
        let p = Point3::new(2.0, 1.5, -3.0);
        let d = (p - origin).dot(&n);
        let r = reflect_point(&p, &origin, &n);
        assert!(((r - origin).dot(&n) + d).abs() < 1e-12);
        // tangential component kept
        assert!((r.z - p.z).abs() < 1e-12);
    }

    #[test]
    fn rotate_quarter_turn_fold() {
        // Floor (normal +z) folding up into a wall (normal -x).
        let v = Vector3::new(0.2, 0.5, 0.0);
        let r = rotate_between(&v, &Vector3::z(), &-Vector3::x(), &Vector3::y());
        assert!((r - Vector3::new(0.0, 0.5, 0.2)).norm() < 1e-12);
        assert!((r.norm() - v.norm()).abs() < 1e-12);
    }

    #[test]
    fn rotate_antiparallel_uses_fallback() {
        let v = Vector3::new(1.0, 0.0, 0.0);
        let r = rotate_between(&v, &Vector3::z(), &-Vector3::z(), &Vector3::y());
        assert!((r - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn rotate_identity() {
        let v = Vector3::new(0.3, -0.1, 0.0);
        let r = rotate_between(&v, &Vector3::z(), &Vector3::z(), &Vector3::x());
        assert_eq!(r, v);
    }
}
