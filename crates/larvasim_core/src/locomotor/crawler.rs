use super::Oscillator;
use crate::config::CrawlerConfig;

/// Peristaltic crawling: forward speed pulses once per stride.
#[derive(Debug, Clone, PartialEq)]
pub struct Crawler {
    osc: Oscillator,
    stride_dst_mean: f64,
}

impl Crawler {
    #[must_use]
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            osc: Oscillator::new(config.freq),
            stride_dst_mean: config.stride_dst_mean,
        }
    }

    /// Forward speed (m/s) for a body of `body_length` m; zero and phase held when inactive.
    pub fn step(&mut self, dt: f64, active: bool, body_length: f64) -> f64 {
        if !active {
            return 0.0;
        }
        self.osc.step(dt, 1.0);
        self.stride_dst_mean * body_length * self.osc.freq * (1.0 - self.osc.phi.cos())
    }

    #[must_use]
    pub fn phase(&self) -> f64 {
        self.osc.phi
    }

    /// Whether the last step finished a stride.
    #[must_use]
    pub fn completed_stride(&self) -> bool {
        self.osc.complete_iteration
    }
}
