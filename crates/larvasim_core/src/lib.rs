//! # Larvasim Core
//!
//! Simulation engine for *Drosophila* larvae: a dynamic energy budget coupled
//! to a sensorimotor brain.
//!
//! This crate contains:
//! - The stage-structured energetics engine (egg, larva, pupa, imago)
//! - A residence-time gut and the substrate nutrition model
//! - Sensory modalities with optional associative memory
//! - Crawler, turner, feeder and intermitter locomotion with phase coupling
//! - The per-organism agent loop and a parallel population step
//! - Metrics collection and structured logging
//!
//! ## Example
//!
//! ```
//! use larvasim_core::deb::hunger;
//!
//! // A larva with a full reserve is at its baseline hunger.
//! assert_eq!(hunger(0.5, 1.0, 1.0), 0.5);
//! // An empty reserve saturates it.
//! assert_eq!(hunger(0.5, 1.0, 0.0), 1.0);
//! ```

/// Sensory activations summed into a single locomotor drive
pub mod brain;
/// Simulation configuration, TOML loading and flattening
pub mod config;
/// Phase-dependent attenuation of the turner
pub mod coupling;
/// Dynamic energy budget engine and its embedding in a host loop
pub mod deb;
/// Error types
pub mod error;
/// Food ingestion and absorption
pub mod gut;
/// Single-organism agent: sense, decide, act, metabolise
pub mod lifecycle;
/// Crawler, turner, feeder and intermitter
pub mod locomotor;
/// Performance metrics collection and logging
pub mod metrics;
/// Independent organisms stepped together
pub mod population;
/// Sensory modalities, sensors and associative memory
pub mod sensors;
/// Nutritional content of feeding substrates
pub mod substrate;

pub use brain::Brain;
pub use config::SimConfig;
pub use deb::{AssimilationMode, EnergeticsEngine, EnergeticsRunner, RateRatio};
pub use error::{LifeError, Result, SensingError};
pub use lifecycle::Larva;
pub use metrics::{init_logging, Metrics};
pub use population::Population;
pub use sensors::{Environment, Modality};
