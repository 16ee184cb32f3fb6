/// Real roots of `a*t^2 + b*t + c = 0`, sorted ascending.
///
/// Uses the cancellation-free form `q = -(b + sign(b) * sqrt(disc)) / 2`,
/// `t = q / a` and `t = c / q`. A tangent solution is returned as two equal
/// roots. Returns `None` when the discriminant is negative or when `a` and
/// `b` are both zero.
#[must_use]
pub fn real_roots(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        let t = -c / b;
        return Some((t, t));
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }

    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        // b == 0 and c == 0
        return Some((0.0, 0.0));
    }

    let (r1, r2) = (q / a, c / q);
    Some(if r1 <= r2 { (r1, r2) } else { (r2, r1) })
}
