use super::Oscillator;
use crate::config::TurnerConfig;

/// Lateral bending oscillator whose amplitude follows the sensory drive.
#[derive(Debug, Clone, PartialEq)]
pub struct Turner {
    osc: Oscillator,
    amp: f64,
    activation_range: [f64; 2],
    activation: f64,
}

impl Turner {
    #[must_use]
    pub fn new(config: &TurnerConfig) -> Self {
        Self {
            osc: Oscillator::new(config.freq),
            amp: config.amp,
            activation_range: config.activation_range,
            activation: 1.0,
        }
    }

    /// Angular velocity (rad/s) for drive `a_in`.
    ///
    /// `osc_mult` slows the phase progression, `amp_mult` scales the output.
    pub fn step(&mut self, a_in: f64, dt: f64, osc_mult: f64, amp_mult: f64) -> f64 {
        let [lo, hi] = self.activation_range;
        self.activation = (1.0 + a_in).clamp(lo, hi);
        self.osc.step(dt, osc_mult);
        self.amp * self.activation * self.osc.phi.sin() * amp_mult
    }

    #[must_use]
    pub fn activation(&self) -> f64 {
        self.activation
    }

    #[must_use]
    pub fn phase(&self) -> f64 {
        self.osc.phi
    }
}
