//! Plain data shared by the larvasim crates.
//!
//! Everything here is inert: state records, species parameter tables, feeding
//! epochs and kinematic poses. Behaviour lives in `larvasim_core`.

pub mod data;

pub use data::energetics::{EnergeticState, Stage};
pub use data::history::{Epoch, LifeHistory, SubstrateKind, SubstrateSpec};
pub use data::kinematics::{Pose, Stimulus};
pub use data::species::{Phenotype, SpeciesParameters};
