use tracing::warn;

use crate::geometry::{Face, PanelGeometry, PanelShape};
use crate::kinetics::{probability_from_rate, Conditions, Scenario};
use crate::math::{Dim, Point3, Vector3, TOLERANCE};
use crate::molecule::SpeciesId;

/// A point source whose molecules would spread through an unbounded domain.
///
/// Panels of the surface absorb on the emitter's face so that the simulated
/// volume keeps the unbounded concentration profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    pub species: SpeciesId,
    /// Face of the surface that looks toward the emitter.
    pub face: Face,
    pub position: Point3,
    /// Relative emission strength.
    pub amount: f64,
}

/// Absorption rate constant that makes a panel drain molecules as the
/// unbounded domain around the emitters would.
///
/// With `r` the vector from each emitter to the panel and `n` the normal
/// pointing away from `face`, the steady state of point sources gives
/// `kappa = D * sum(q r.n / |r|^dim) / sum(q / |r|^(dim-2))`.
#[must_use]
pub fn absorption_rate<'a>(
    shape: &PanelShape,
    face: Face,
    emitters: impl Iterator<Item = &'a Emitter> + Clone,
    diffusion: f64,
) -> f64 {
    let (flux_power, concentration_power) = match shape.dim() {
        Dim::One => (1, -1),
        Dim::Two => (2, 0),
        Dim::Three => (3, 1),
    };
    let anchor = anchor(shape, emitters.clone());
    let outward = -shape.normal(&anchor, face);

    let mut flux = 0.0;
    let mut concentration = 0.0;
    for e in emitters {
        let r: Vector3 = anchor - e.position;
        let dist = r.norm();
        if dist < TOLERANCE {
            continue;
        }
        flux += e.amount * r.dot(&outward) / dist.powi(flux_power);
        concentration += e.amount / dist.powi(concentration_power);
    }
    if concentration <= 0.0 {
        return 0.0;
    }
    (diffusion * flux / concentration).max(0.0)
}

/// Per-collision absorption probability for [`absorption_rate`].
#[must_use]
pub fn absorption_probability<'a>(
    shape: &PanelShape,
    face: Face,
    emitters: impl Iterator<Item = &'a Emitter> + Clone,
    diffusion: f64,
    time_step: f64,
) -> f64 {
    let kappa = absorption_rate(shape, face, emitters, diffusion);
    let cond = Conditions {
        time_step,
        diffusion,
        reverse_probability: 0.0,
    };
    probability_from_rate(Scenario::Adsorb, kappa, &cond).unwrap_or_else(|err| {
        warn!(%err, kappa, "emitter absorption could not be converted; using zero");
        0.0
    })
}

/// Point where the emitter field is evaluated: the centroid of a flat panel,
/// or the point of a curved panel nearest the emitters' weighted center.
fn anchor<'a>(shape: &PanelShape, emitters: impl Iterator<Item = &'a Emitter>) -> Point3 {
    if !shape.kind().is_curved() {
        return shape.centroid();
    }
    let (sum, weight) = emitters.fold((Vector3::zeros(), 0.0), |(sum, w), e| {
        (sum + e.position.coords * e.amount, w + e.amount)
    });
    if weight <= 0.0 {
        return shape.centroid();
    }
    shape.nearest_point(&Point3::from(sum / weight), 0.0).point
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::Sphere;

    #[test]
    fn sphere_around_emitter_absorbs_at_d_over_r() {
        // Molecules live inside the sphere, around the emitter at its center.
        let shape: PanelShape = Sphere::new(Dim::Three, Point3::origin(), 2.0, Face::Front)
            .unwrap()
            .into();
        let e = Emitter {
            species: SpeciesId(0),
            face: Face::Back,
            position: Point3::origin(),
            amount: 1.0,
        };
        let kappa = absorption_rate(&shape, Face::Back, [e].iter(), 3.0);
        assert_relative_eq!(kappa, 1.5, max_relative = 1e-12);
    }

    #[test]
    fn flat_wall_facing_away_from_emitters_absorbs_nothing() {
        let shape: PanelShape = crate::geometry::Rectangle::new(
            Dim::Three,
            Point3::new(0.0, -1.0, -1.0),
            &[Vector3::new(0.0, 2.0, 0.0), Vector3::new(0.0, 0.0, 2.0)],
            Vector3::x(),
        )
        .unwrap()
        .into();
        // Emitter in front of the wall; molecules behind it never see the flux.
        let e = Emitter {
            species: SpeciesId(0),
            face: Face::Front,
            position: Point3::new(5.0, 0.0, 0.0),
            amount: 1.0,
        };
        assert!(absorption_rate(&shape, Face::Back, [e].iter(), 1.0).abs() < 1e-15);
        let p = absorption_probability(&shape, Face::Front, [e].iter(), 1.0, 1e-3);
        assert!(p > 0.0 && p < 1.0);
    }
}
