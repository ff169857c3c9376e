//! # Larvasim IO
//!
//! Persistence for larvasim runs:
//! - Gzipped JSON energetics records
//! - Validated rkyv snapshots of an organism's energetic state

/// Error types and result aliases for I/O operations
pub mod error;
/// Binary snapshots of energetic state
pub mod persistence;
/// Finalized energetics records
pub mod record;

pub use error::{IoError, Result};
pub use persistence::{load_state, save_state};
pub use record::{load_record, save_record};
