//! # Larvasim
//!
//! Facade over the larvasim workspace: a larva's energy budget across its
//! life stages, coupled to a sensorimotor brain that turns odours, touch,
//! temperature and wind into crawling, turning and feeding.
//!
//! Everything is re-exported under [`model`]; persistence lives in [`io`].

pub mod model;

pub use larvasim_io as io;
pub use model::{Larva, Population, SimConfig};

/// Installs the global `tracing` subscriber (env-filter aware, default `info`).
pub fn init_logging() {
    larvasim_core::init_logging();
}
