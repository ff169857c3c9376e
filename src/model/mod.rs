pub use larvasim_core::{
    AssimilationMode, Brain, EnergeticsEngine, EnergeticsRunner, Environment, Larva, LifeError,
    Metrics, Modality, Population, RateRatio, SensingError, SimConfig,
};
pub use larvasim_data::{
    EnergeticState, Epoch, LifeHistory, Phenotype, Pose, SpeciesParameters, Stage, Stimulus,
    SubstrateKind, SubstrateSpec,
};

pub mod brain {
    pub use larvasim_core::brain::*;
}
pub mod config {
    pub use larvasim_core::config::*;
}
pub mod coupling {
    pub use larvasim_core::coupling::*;
}
pub mod deb {
    pub use larvasim_core::deb::*;
}
pub mod error {
    pub use larvasim_core::error::*;
}
pub mod gut {
    pub use larvasim_core::gut::*;
}
pub mod lifecycle {
    pub use larvasim_core::lifecycle::*;
}
pub mod locomotor {
    pub use larvasim_core::locomotor::*;
}
pub mod metrics {
    pub use larvasim_core::metrics::*;
}
pub mod population {
    pub use larvasim_core::population::*;
}
pub mod sensors {
    pub use larvasim_core::sensors::*;
}
pub mod substrate {
    pub use larvasim_core::substrate::*;
}
