use std::f64::consts::PI;

use crate::error::KineticsError;

/// The physical process behind a surface transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Solution to bound.
    Adsorb,
    /// Bound to solution.
    Desorb,
    /// Solution on one face to solution on the other.
    Transmit,
    /// Bound state to another bound state.
    Flip,
}

impl Scenario {
    /// Whether the transition happens on collision rather than per step.
    #[must_use]
    pub fn is_collision(self) -> bool {
        matches!(self, Self::Adsorb | Self::Transmit)
    }
}

/// The authoritative value of a transition: a rate or a probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KineticInput {
    Rate(f64),
    Probability(f64),
}

/// Physical parameters of a conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub time_step: f64,
    /// Diffusion coefficient of the molecule in its origin state.
    pub diffusion: f64,
    /// Probability of the reverse transition.
    pub reverse_probability: f64,
}

fn check_probability(p: f64) -> Result<f64, KineticsError> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(KineticsError::ProbabilityOutOfRange(p))
    }
}

fn check_rate(k: f64) -> Result<f64, KineticsError> {
    if k >= 0.0 && !k.is_nan() {
        Ok(k)
    } else {
        Err(KineticsError::InvalidRate(k))
    }
}

fn check_time_step(dt: f64) -> Result<f64, KineticsError> {
    if dt > 0.0 {
        Ok(dt)
    } else {
        Err(KineticsError::NonPositiveTimeStep(dt))
    }
}

/// Collision rate multiplier for adsorption and transmission.
fn collision_gain(scenario: Scenario, q: f64) -> f64 {
    match scenario {
        Scenario::Transmit => 1.0 / (1.0 - 0.5 * q),
        _ => 1.0 + 0.5 * q,
    }
}

/// Fraction of a first-order channel's net flux that is actually taken.
///
/// Reversible desorption is partly undone by readsorption within the same
/// step.
fn outflow_factor(scenario: Scenario, q: f64) -> f64 {
    if scenario == Scenario::Desorb {
        1.0 - 0.5 * q
    } else {
        1.0
    }
}

/// Per-collision probability of an adsorption or transmission with rate
/// constant `rate`.
///
/// Both scale with the distance a molecule diffuses in one step,
/// `s = sqrt(pi * dt / D)`:
///
/// - adsorption: `P = 1 - exp(-k * s * (1 + q/2))`
/// - transmission: `P = 1 - exp(-k * s / (1 - q/2))`
///
/// where `q` is the probability of the reverse transition. For small
/// probabilities both reduce to `P = k * s`.
///
/// # Errors
///
/// Returns an error for a negative rate, a non-positive time step, or a
/// non-positive diffusion coefficient.
pub fn collision_probability(
    scenario: Scenario,
    rate: f64,
    cond: &Conditions,
) -> Result<f64, KineticsError> {
    let rate = check_rate(rate)?;
    let dt = check_time_step(cond.time_step)?;
    if rate == 0.0 {
        return Ok(0.0);
    }
    if cond.diffusion <= 0.0 {
        return Err(KineticsError::NonPositiveDiffusion(cond.diffusion));
    }
    let q = check_probability(cond.reverse_probability)?;
    let s = (PI * dt / cond.diffusion).sqrt();
    Ok(-(-rate * s * collision_gain(scenario, q)).exp_m1())
}

/// Inverse of [`collision_probability`]. A certain collision gives an
/// infinite rate. A molecule that does not diffuse never collides, so its
/// rate is zero.
///
/// # Errors
///
/// Returns an error for a probability outside `[0, 1]` or a non-positive
/// time step.
pub fn collision_rate(
    scenario: Scenario,
    probability: f64,
    cond: &Conditions,
) -> Result<f64, KineticsError> {
    let p = check_probability(probability)?;
    let dt = check_time_step(cond.time_step)?;
    let q = check_probability(cond.reverse_probability)?;
    if p == 0.0 || cond.diffusion <= 0.0 {
        return Ok(0.0);
    }
    if p >= 1.0 {
        return Ok(f64::INFINITY);
    }
    let s = (PI * dt / cond.diffusion).sqrt();
    Ok(-(-p).ln_1p() / (s * collision_gain(scenario, q)))
}

/// One first-order channel out of a state.
///
/// `input` is authoritative. [`resolve_outflow`] fills `probability` and
/// `rate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutflowChannel {
    pub scenario: Scenario,
    pub input: KineticInput,
    pub reverse_probability: f64,
    pub probability: f64,
    pub rate: f64,
}

impl OutflowChannel {
    #[must_use]
    pub fn new(scenario: Scenario, input: KineticInput, reverse_probability: f64) -> Self {
        Self {
            scenario,
            input,
            reverse_probability,
            probability: 0.0,
            rate: 0.0,
        }
    }

    fn factor(&self) -> f64 {
        outflow_factor(self.scenario, self.reverse_probability)
    }
}

/// Resolves competing first-order channels out of one state.
///
/// Channels given as probabilities take a fixed share `p * f` of the step.
/// Rate channels share what remains, `(1 - fixed) * (1 - exp(-K dt))` for
/// their total rate `K`, in proportion to their rates. Each probability is
/// its share divided by its factor `f`. Probability channels are then given
/// the rates that would reproduce their shares.
///
/// # Errors
///
/// Returns an error for an invalid probability, rate, or time step.
pub fn resolve_outflow(channels: &mut [OutflowChannel], time_step: f64) -> Result<(), KineticsError> {
    let dt = check_time_step(time_step)?;
    let mut fixed = 0.0;
    let mut rate_total = 0.0;
    for ch in channels.iter() {
        check_probability(ch.reverse_probability)?;
        match ch.input {
            KineticInput::Probability(p) => fixed += check_probability(p)? * ch.factor(),
            KineticInput::Rate(k) => rate_total += check_rate(k)?,
        }
    }

    let rate_share = (1.0 - fixed).max(0.0) * -(-rate_total * dt).exp_m1();
    let mut shares = Vec::with_capacity(channels.len());
    for ch in channels.iter() {
        shares.push(match ch.input {
            KineticInput::Probability(p) => p * ch.factor(),
            KineticInput::Rate(k) if rate_total > 0.0 => rate_share * k / rate_total,
            KineticInput::Rate(_) => 0.0,
        });
    }

    let net: f64 = shares.iter().sum();
    let total_rate = if net >= 1.0 {
        f64::INFINITY
    } else {
        -(-net).ln_1p() / dt
    };

    for (ch, share) in channels.iter_mut().zip(shares) {
        ch.probability = share / ch.factor();
        ch.rate = match ch.input {
            KineticInput::Rate(k) => k,
            KineticInput::Probability(_) if share > 0.0 => total_rate * share / net,
            KineticInput::Probability(_) => 0.0,
        };
    }
    Ok(())
}

/// Probability of a transition with rate constant `rate` when it is the only
/// way out of its origin.
///
/// # Errors
///
/// Returns an error for invalid inputs; see [`collision_probability`] and
/// [`resolve_outflow`].
pub fn probability_from_rate(
    scenario: Scenario,
    rate: f64,
    cond: &Conditions,
) -> Result<f64, KineticsError> {
    if scenario.is_collision() {
        return collision_probability(scenario, rate, cond);
    }
    let mut ch = [OutflowChannel::new(
        scenario,
        KineticInput::Rate(rate),
        cond.reverse_probability,
    )];
    resolve_outflow(&mut ch, cond.time_step)?;
    Ok(ch[0].probability)
}

/// Inverse of [`probability_from_rate`].
///
/// # Errors
///
/// Returns an error for invalid inputs; see [`collision_rate`] and
/// [`resolve_outflow`].
pub fn rate_from_probability(
    scenario: Scenario,
    probability: f64,
    cond: &Conditions,
) -> Result<f64, KineticsError> {
    if scenario.is_collision() {
        return collision_rate(scenario, probability, cond);
    }
    let mut ch = [OutflowChannel::new(
        scenario,
        KineticInput::Probability(probability),
        cond.reverse_probability,
    )];
    resolve_outflow(&mut ch, cond.time_step)?;
    Ok(ch[0].rate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const SCENARIOS: [Scenario; 4] = [
        Scenario::Adsorb,
        Scenario::Desorb,
        Scenario::Transmit,
        Scenario::Flip,
    ];

    #[test]
    fn probability_rate_round_trip() {
        for scenario in SCENARIOS {
            for q in [0.0, 0.35] {
                for (dt, d) in [(1e-3, 1.0), (1e-5, 0.01), (0.1, 20.0)] {
                    let cond = Conditions {
                        time_step: dt,
                        diffusion: d,
                        reverse_probability: q,
                    };
                    for p in [1e-6, 0.01, 0.3, 0.75, 0.99] {
                        let k = rate_from_probability(scenario, p, &cond).unwrap();
                        let back = probability_from_rate(scenario, k, &cond).unwrap();
                        assert_relative_eq!(back, p, max_relative = 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn small_probability_limit() {
        let cond = Conditions {
            time_step: 1e-6,
            diffusion: 1.0,
            reverse_probability: 0.0,
        };
        let k = 1e-3;
        let p = probability_from_rate(Scenario::Adsorb, k, &cond).unwrap();
        assert_relative_eq!(p, k * (PI * 1e-6_f64).sqrt(), max_relative = 1e-6);
        let p = probability_from_rate(Scenario::Desorb, k, &cond).unwrap();
        assert_relative_eq!(p, k * 1e-6, max_relative = 1e-6);
    }

    #[test]
    fn competing_channels_round_trip() {
        let dt = 0.01;
        let rates = [3.0, 10.0, 0.5];
        let mut channels = [
            OutflowChannel::new(Scenario::Desorb, KineticInput::Rate(rates[0]), 0.4),
            OutflowChannel::new(Scenario::Desorb, KineticInput::Rate(rates[1]), 0.0),
            OutflowChannel::new(Scenario::Flip, KineticInput::Rate(rates[2]), 0.0),
        ];
        resolve_outflow(&mut channels, dt).unwrap();
        let net: f64 = channels
            .iter()
            .map(|c| c.probability * c.factor())
            .sum();
        assert_relative_eq!(net, -(-13.5_f64 * dt).exp_m1(), max_relative = 1e-12);

        let mut inverse: Vec<OutflowChannel> = channels
            .iter()
            .map(|c| {
                OutflowChannel::new(
                    c.scenario,
                    KineticInput::Probability(c.probability),
                    c.reverse_probability,
                )
            })
            .collect();
        resolve_outflow(&mut inverse, dt).unwrap();
        for (c, k) in inverse.iter().zip(rates) {
            assert_relative_eq!(c.rate, k, max_relative = 1e-9);
        }
    }

    #[test]
    fn mixed_inputs_share_the_step() {
        let mut channels = [
            OutflowChannel::new(Scenario::Flip, KineticInput::Probability(0.2), 0.0),
            OutflowChannel::new(Scenario::Flip, KineticInput::Rate(50.0), 0.0),
        ];
        resolve_outflow(&mut channels, 0.01).unwrap();
        assert!((channels[0].probability - 0.2).abs() < 1e-15);
        let expected = 0.8 * -(-0.5_f64).exp_m1();
        assert_relative_eq!(channels[1].probability, expected, max_relative = 1e-12);
        assert!(channels[0].rate > 0.0);
    }

    #[test]
    fn invalid_inputs() {
        let cond = Conditions {
            time_step: 1e-3,
            diffusion: 1.0,
            reverse_probability: 0.0,
        };
        assert_eq!(
            rate_from_probability(Scenario::Adsorb, 1.5, &cond),
            Err(KineticsError::ProbabilityOutOfRange(1.5))
        );
        assert_eq!(
            probability_from_rate(Scenario::Flip, -1.0, &cond),
            Err(KineticsError::InvalidRate(-1.0))
        );
        let frozen = Conditions {
            diffusion: 0.0,
            ..cond
        };
        assert_eq!(
            probability_from_rate(Scenario::Adsorb, 1.0, &frozen),
            Err(KineticsError::NonPositiveDiffusion(0.0))
        );
        assert_eq!(rate_from_probability(Scenario::Adsorb, 0.5, &frozen), Ok(0.0));
        assert!(rate_from_probability(Scenario::Adsorb, 1.0, &cond)
            .unwrap()
            .is_infinite());
    }
}
