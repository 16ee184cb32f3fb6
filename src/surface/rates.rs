use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::kinetics::{
    collision_probability, collision_rate, resolve_outflow, Conditions, KineticInput,
    OutflowChannel, Scenario,
};
use crate::molecule::SpeciesId;
use crate::state::{MolState, Site};

use super::action::{ActionDetail, ActionRule, ActionTable};

/// Rounds of reverse-probability refinement. Each round feeds the previous
/// round's probabilities in as the reverse probabilities of the opposite
/// transitions.
const REFINEMENT_PASSES: usize = 4;

/// Slack allowed on a sum of outcome probabilities.
const SUM_TOLERANCE: f64 = 1e-12;

/// The scenario of a transition from `origin` to `destination`, or `None`
/// if the pair is not a transition.
#[must_use]
pub fn scenario(origin: Site, destination: Site) -> Option<Scenario> {
    match (origin, destination) {
        (Site::Solution(a), Site::Solution(b)) if a != b => Some(Scenario::Transmit),
        (Site::Solution(_), Site::Bound(_)) => Some(Scenario::Adsorb),
        (Site::Bound(_), Site::Solution(_)) => Some(Scenario::Desorb),
        (Site::Bound(a), Site::Bound(b)) if a != b => Some(Scenario::Flip),
        _ => None,
    }
}

fn origin_state(origin: Site) -> MolState {
    match origin {
        Site::Solution(_) => MolState::Solution,
        Site::Bound(b) => MolState::Bound(b),
    }
}

/// Re-derives probabilities, rates and cumulative sums for every
/// [`ActionRule::Multiple`] entry in `table`.
///
/// `diffusion[species][state]` gives the diffusion coefficient of a species
/// in each molecule state.
///
/// # Errors
///
/// Returns an error if a conversion fails or the outcomes leaving one site
/// sum to more than one. The table may be partially updated on error.
pub fn refresh(
    table: &mut ActionTable,
    diffusion: &[[f64; MolState::COUNT]],
    time_step: f64,
) -> Result<()> {
    for species in 0..table.species_count() {
        let species = SpeciesId(species);
        let mut probability = [[0.0; Site::COUNT]; Site::COUNT];

        for _ in 0..REFINEMENT_PASSES {
            for origin in Site::ALL {
                let ActionRule::Multiple(detail) = table.origin_mut(species, origin) else {
                    continue;
                };
                for (destination, t) in detail.iter_mut() {
                    t.reverse_probability = probability[destination.index()][origin.index()];
                }
                let d = diffusion[species.0][origin_state(origin).index()];
                derive(detail, origin, d, time_step)?;
                for (destination, t) in detail.iter() {
                    probability[origin.index()][destination.index()] = t.probability;
                }
            }
        }

        for origin in Site::ALL {
            let ActionRule::Multiple(detail) = table.origin_mut(species, origin) else {
                continue;
            };
            let total = detail.total_probability();
            if total > 1.0 + SUM_TOLERANCE {
                return Err(ConfigError::ProbabilitySum {
                    species: species.0,
                    origin,
                    total,
                }
                .into());
            }
            detail.rebuild_cumulative();
            debug!(species = species.0, ?origin, total, "outcome table derived");
        }
    }
    Ok(())
}

fn derive(detail: &mut ActionDetail, origin: Site, diffusion: f64, time_step: f64) -> Result<()> {
    if let Site::Solution(_) = origin {
        for (destination, t) in detail.iter_mut() {
            let scenario = scenario(origin, destination)
                .ok_or(ConfigError::InvalidTransition {
                    origin,
                    destination,
                })?;
            let cond = Conditions {
                time_step,
                diffusion,
                reverse_probability: t.reverse_probability,
            };
            match t.input {
                KineticInput::Rate(k) => {
                    t.probability = collision_probability(scenario, k, &cond)?;
                    t.rate = k;
                }
                KineticInput::Probability(p) => {
                    t.rate = collision_rate(scenario, p, &cond)?;
                    t.probability = p;
                }
            }
        }
        return Ok(());
    }

    let mut channels = Vec::with_capacity(Site::COUNT);
    for (destination, t) in detail.iter() {
        let scenario = scenario(origin, destination).ok_or(ConfigError::InvalidTransition {
            origin,
            destination,
        })?;
        channels.push(OutflowChannel::new(scenario, t.input, t.reverse_probability));
    }
    resolve_outflow(&mut channels, time_step)?;
    for ((_, t), ch) in detail.iter_mut().zip(&channels) {
        t.probability = ch.probability;
        t.rate = ch.rate;
    }
    Ok(())
}
