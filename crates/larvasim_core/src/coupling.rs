//! Crawl/feed interference with turning.
//!
//! While an effector (crawler or feeder) is active the turner is suppressed.
//! The policy maps the effector's phase to an attenuation in [0, 1]; the
//! suppression mode decides whether it scales the turner's phase progression,
//! its amplitude, or both.

use crate::config::{CouplingConfig, SuppressionMode};
use crate::error::{LifeError, Result};
use std::f64::consts::TAU;

/// Width of the Gaussian relief bump, rad.
const RELIEF_SIGMA: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effector {
    Crawler,
    Feeder,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CouplingPolicy {
    /// The base attenuation whatever the phase.
    Constant,
    /// Relief while the effector's phase lies inside its window.
    PhaseWindowed {
        crawler_phi_range: [f64; 2],
        feeder_phi_range: [f64; 2],
    },
    /// Relief following a Gaussian bump around a peak phase.
    PhaseGaussian { max_attenuation_phase: f64, sigma: f64 },
}

impl CouplingPolicy {
    /// Resolves the policy named in the configuration.
    pub fn from_config(config: &CouplingConfig) -> Result<Self> {
        match config.mode.as_str() {
            "default" | "constant" => Ok(Self::Constant),
            "square" | "windowed" => Ok(Self::PhaseWindowed {
                crawler_phi_range: config.crawler_phi_range,
                feeder_phi_range: config.feeder_phi_range,
            }),
            "phasic" | "gaussian" => Ok(Self::PhaseGaussian {
                max_attenuation_phase: config.max_attenuation_phase,
                sigma: RELIEF_SIGMA,
            }),
            other => Err(LifeError::configuration(format!(
                "unknown coupling mode '{other}'"
            ))),
        }
    }
}

/// Circular distance between two phases.
fn phase_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coupling {
    policy: CouplingPolicy,
    attenuation: f64,
    attenuation_max: f64,
    suppression_mode: SuppressionMode,
    current_attenuation: f64,
}

impl Coupling {
    pub fn new(config: &CouplingConfig) -> Result<Self> {
        for (name, value) in [
            ("attenuation", config.attenuation),
            ("attenuation_max", config.attenuation_max),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LifeError::configuration(format!(
                    "coupling {name} {value} outside [0, 1]"
                )));
            }
        }
        Ok(Self {
            policy: CouplingPolicy::from_config(config)?,
            attenuation: config.attenuation,
            attenuation_max: config.attenuation_max,
            suppression_mode: config.suppression_mode,
            current_attenuation: 1.0,
        })
    }

    #[must_use]
    pub fn policy(&self) -> CouplingPolicy {
        self.policy
    }

    /// Attenuation while `effector` is at `phase`.
    #[must_use]
    pub fn get(&self, effector: Effector, phase: f64) -> f64 {
        let relief = match self.policy {
            CouplingPolicy::Constant => 0.0,
            CouplingPolicy::PhaseWindowed {
                crawler_phi_range,
                feeder_phi_range,
            } => {
                let [lo, hi] = match effector {
                    Effector::Crawler => crawler_phi_range,
                    Effector::Feeder => feeder_phi_range,
                };
                if (lo..=hi).contains(&phase.rem_euclid(TAU)) {
                    1.0
                } else {
                    0.0
                }
            }
            CouplingPolicy::PhaseGaussian {
                max_attenuation_phase,
                sigma,
            } => {
                let d = phase_distance(phase, max_attenuation_phase);
                (-d * d / (2.0 * sigma * sigma)).exp()
            }
        };
        (self.attenuation + self.attenuation_max * relief).clamp(0.0, 1.0)
    }

    /// Attenuation for the active effector, the feeder taking precedence.
    /// `None` when neither is active.
    #[must_use]
    pub fn check(&self, crawler_phase: Option<f64>, feeder_phase: Option<f64>) -> Option<f64> {
        feeder_phase
            .map(|phi| self.get(Effector::Feeder, phi))
            .or_else(|| crawler_phase.map(|phi| self.get(Effector::Crawler, phi)))
    }

    /// Updates the current attenuation and returns the (oscillation, amplitude) multipliers.
    pub fn step(&mut self, crawler_phase: Option<f64>, feeder_phase: Option<f64>) -> (f64, f64) {
        match self.check(crawler_phase, feeder_phase) {
            Some(att) => {
                self.current_attenuation = att;
                self.apply(att)
            }
            None => {
                self.current_attenuation = 1.0;
                (1.0, 1.0)
            }
        }
    }

    fn apply(&self, att: f64) -> (f64, f64) {
        match self.suppression_mode {
            SuppressionMode::Oscillation => (att, 1.0),
            SuppressionMode::Amplitude => (1.0, att),
            SuppressionMode::Both => (att, att),
        }
    }

    #[must_use]
    pub fn current_attenuation(&self) -> f64 {
        self.current_attenuation
    }
}
