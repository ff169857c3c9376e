use super::Oscillator;
use crate::config::FeederConfig;

/// Mouth-hook motion; each completed cycle while feeding is one bite.
#[derive(Debug, Clone, PartialEq)]
pub struct Feeder {
    osc: Oscillator,
}

impl Feeder {
    #[must_use]
    pub fn new(config: &FeederConfig) -> Self {
        Self {
            osc: Oscillator::new(config.freq),
        }
    }

    /// Returns `true` when a bite was completed.
    pub fn step(&mut self, dt: f64, active: bool) -> bool {
        if !active {
            return false;
        }
        self.osc.step(dt, 1.0);
        self.osc.complete_iteration
    }

    #[must_use]
    pub fn phase(&self) -> f64 {
        self.osc.phi
    }
}
