pub mod config;
pub mod error;
pub mod geometry;
pub mod kinetics;
pub mod math;
pub mod molecule;
pub mod resolve;
pub mod state;
pub mod surface;

pub use config::SurfaceParams;
pub use error::{PanelsimError, Result};
pub use molecule::{Molecule, SpeciesId};
pub use resolve::{AllPanels, BoundStep, CrossingResolver, Outcome, PanelIndex, ResolveScratch};
pub use surface::{PanelId, SurfaceId, SurfaceStore};
