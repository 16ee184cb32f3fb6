use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Numeric parameters shared by every surface in a system, loadable from
/// a TOML fragment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceParams {
    /// Distance a molecule is kept off a panel after crossing it, and the
    /// tolerance for treating two crossings as one.
    pub epsilon: f64,
    /// Inset applied when a point is clamped onto a panel's extent.
    pub margin: f64,
    /// Maximum gap between a panel edge and a neighbour for a bound molecule
    /// to hop across.
    pub neighbor_dist: f64,
    /// Cap on crossing-resolution iterations per move.
    pub max_iterations: usize,
    /// Simulation time step used for rate conversion.
    pub time_step: f64,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            epsilon: 1e-9,
            margin: 1e-8,
            neighbor_dist: 1e-6,
            max_iterations: 50,
            time_step: 1e-3,
        }
    }
}

impl SurfaceParams {
    /// Parses parameters from TOML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let params: Self = toml::from_str(text).map_err(ConfigError::from)?;
        params.validate()?;
        Ok(params)
    }

    /// # Errors
    ///
    /// Returns an error for a non-positive epsilon or time step, a negative
    /// margin or neighbour distance, or a zero iteration cap.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("epsilon", self.epsilon, self.epsilon > 0.0),
            ("margin", self.margin, self.margin >= 0.0),
            ("neighbor_dist", self.neighbor_dist, self.neighbor_dist >= 0.0),
            ("time_step", self.time_step, self.time_step > 0.0),
        ];
        if let Some((name, value, _)) = checks.into_iter().find(|(_, _, ok)| !ok) {
            return Err(ConfigError::InvalidParameter { name, value }.into());
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_iterations",
                value: 0.0,
            }
            .into());
        }
        Ok(())
    }
}
