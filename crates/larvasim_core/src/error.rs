//! Error taxonomy of the organism core.
//!
//! Construction-time problems, deaths and solver failures are all carried by
//! [`LifeError`] so that a caller stepping many organisms can tell them apart
//! through [`LifeError::kind`]. Sensing problems have their own type because
//! they never leave the brain.

use thiserror::Error;

/// Broad class of a [`LifeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid or contradictory parameters; a data or programmer error.
    Misconfigured,
    /// The organism died; an expected terminal outcome.
    Died,
    /// A numerical search gave up; the parameters are outside model validity.
    SolverFailed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifeError {
    /// Invalid species, substrate or runtime parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Structure or reserve was exhausted.
    #[error("Starvation at {age_hours:.1} h")]
    Starvation { age_hours: f64 },

    /// A threshold-crossing or ODE event search ran out of budget.
    #[error("{solver} did not converge: {detail}")]
    NonConvergence {
        solver: &'static str,
        detail: String,
    },
}

/// Result type alias for energetics and lifecycle operations.
pub type Result<T> = std::result::Result<T, LifeError>;

impl LifeError {
    #[must_use]
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    #[must_use]
    pub fn non_convergence<S: Into<String>>(solver: &'static str, detail: S) -> Self {
        Self::NonConvergence {
            solver,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Misconfigured,
            Self::Starvation { .. } => ErrorKind::Died,
            Self::NonConvergence { .. } => ErrorKind::SolverFailed,
        }
    }

    /// Whether the error prevents the organism from existing at all.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Failure of a modality's environment query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensingError {
    #[error("environment has no '{0}' layer")]
    MissingLayer(String),

    #[error("position ({x:.3}, {y:.3}) is outside the arena")]
    OutOfBounds { x: f64, y: f64 },

    #[error("invalid reading: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LifeError::configuration("zero half-saturation");
        assert_eq!(err.to_string(), "Configuration error: zero half-saturation");
    }

    #[test]
    fn test_kinds_are_distinguishable() {
        assert_eq!(
            LifeError::configuration("x").kind(),
            ErrorKind::Misconfigured
        );
        assert_eq!(
            LifeError::Starvation { age_hours: 3.0 }.kind(),
            ErrorKind::Died
        );
        assert_eq!(
            LifeError::non_convergence("pupa", "no event").kind(),
            ErrorKind::SolverFailed
        );
        assert!(LifeError::configuration("x").is_fatal());
        assert!(!LifeError::Starvation { age_hours: 3.0 }.is_fatal());
    }
}
