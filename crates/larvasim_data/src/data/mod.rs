//! Core data structures for the larvasim simulation.

pub mod energetics;
pub mod history;
pub mod kinematics;
pub mod species;
