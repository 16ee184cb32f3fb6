use thiserror::Error;

use crate::state::Site;

/// Top-level error type for the panelsim surface engine.
#[derive(Debug, Error)]
pub enum PanelsimError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Kinetics(#[from] KineticsError),
}

/// Errors raised while building panel geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("panel is {found}-dimensional but the system is {expected}-dimensional")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("{shape} panels are not defined in {dim} dimension(s)")]
    UnsupportedDimension { shape: &'static str, dim: usize },
}

/// Errors related to lookups in the surface store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("species {species} is out of range (the system has {count} species)")]
    SpeciesOutOfRange { species: usize, count: usize },
}

/// Errors raised by configuration-time setters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid action {action}: {reason}")]
    InvalidAction { action: String, reason: &'static str },

    #[error("no surface transition leads from {origin:?} to {destination:?}")]
    InvalidTransition { origin: Site, destination: Site },

    #[error("probability {value} for {what} is outside [0, 1]")]
    ProbabilityOutOfRange { what: &'static str, value: f64 },

    #[error("outcome probabilities for species {species} from {origin:?} sum to {total}, above 1")]
    ProbabilitySum { species: usize, origin: Site, total: f64 },

    #[error("jump panels must share a shape ({from} cannot jump to {to})")]
    JumpShapeMismatch { from: &'static str, to: &'static str },

    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("failed to parse surface parameters: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors from rate and probability conversion.
#[derive(Debug, Error, PartialEq)]
pub enum KineticsError {
    #[error("probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("rate {0} is negative or not finite")]
    InvalidRate(f64),

    #[error("time step {0} must be positive")]
    NonPositiveTimeStep(f64),

    #[error("diffusion coefficient {0} must be positive to convert a collision rate")]
    NonPositiveDiffusion(f64),
}

/// Convenience type alias for results using [`PanelsimError`].
pub type Result<T> = std::result::Result<T, PanelsimError>;
