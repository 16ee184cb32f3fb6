use crate::math::quadratic::real_roots;
use crate::math::Point3;

use super::{Crossing, Face};

/// Coefficients of `a*t^2 + b*t + c`, the squared radial distance minus the
/// squared radius along a segment.
pub(super) struct Quadric {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Picks the crossings of a segment with a curved panel.
///
/// `outside` is the face on the convex side. The entry root counts when the
/// segment starts outside. The exit root counts when the segment is inside
/// just before it, and it is approached from the inside. `on_panel` rejects
/// roots on the missing part of the surface. When both roots count, the exit
/// is reported as the second fraction.
pub(super) fn crossing(
    start: &Point3,
    end: &Point3,
    q: &Quadric,
    outside: Face,
    end_face: Face,
    on_panel: impl Fn(&Point3) -> bool,
) -> Option<Crossing> {
    let (t1, t2) = real_roots(q.a, q.b, q.c)?;
    let start_outside = q.c > 0.0 || (q.c == 0.0 && outside == Face::Back);
    let at = |t: f64| start + (end - start) * t;

    let entry = (start_outside && (0.0..=1.0).contains(&t1))
        .then(|| (t1, at(t1)))
        .filter(|(_, p)| on_panel(p));
    let exit = ((0.0..=1.0).contains(&t2) && (!start_outside || t1 >= 0.0))
        .then(|| (t2, at(t2)))
        .filter(|(_, p)| on_panel(p));

    match (entry, exit) {
        (Some((t, point)), second) => Some(Crossing {
            point,
            fraction: t,
            face: outside,
            end_face,
            second_fraction: second.map(|(t, _)| t),
        }),
        (None, Some((t, point))) => Some(Crossing {
            point,
            fraction: t,
            face: outside.opposite(),
            end_face,
            second_fraction: None,
        }),
        (None, None) => None,
    }
}
