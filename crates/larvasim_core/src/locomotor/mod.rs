//! Motor programs turning the combined sensory drive into motion.

pub mod crawler;
pub mod feeder;
pub mod intermitter;
pub mod turner;

use crate::config::{CouplingConfig, LocomotorConfig};
use crate::coupling::Coupling;
use crate::error::Result;
use std::f64::consts::TAU;

pub use crawler::Crawler;
pub use feeder::Feeder;
pub use intermitter::{Bout, Intermitter};
pub use turner::Turner;

/// Phase oscillator shared by the motor programs.
#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator {
    pub freq: f64,
    /// Phase in [0, 2π).
    pub phi: f64,
    /// Set when the last step wrapped the phase.
    pub complete_iteration: bool,
}

impl Oscillator {
    #[must_use]
    pub fn new(freq: f64) -> Self {
        Self {
            freq,
            phi: 0.0,
            complete_iteration: false,
        }
    }

    pub fn step(&mut self, dt: f64, mult: f64) {
        self.phi += TAU * self.freq * dt * mult;
        self.complete_iteration = self.phi >= TAU;
        if self.complete_iteration {
            self.phi = self.phi.rem_euclid(TAU);
        }
    }
}

/// Output of one behavioural tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotorCommand {
    /// m/s.
    pub linear_velocity: f64,
    /// rad/s.
    pub angular_velocity: f64,
    /// A bite was completed.
    pub feeding_trigger: bool,
}

pub trait Locomotor: std::fmt::Debug + Send + Sync {
    fn step(&mut self, a_in: f64, on_food: bool) -> MotorCommand;

    /// Current exploration/exploitation bias, if the locomotor has one.
    fn eeb(&self) -> Option<f64>;

    fn set_eeb(&mut self, eeb: f64);
}

/// Crawler, turner and feeder arbitrated by an intermitter and a coupling.
#[derive(Debug, Clone)]
pub struct DefaultLocomotor {
    dt: f64,
    body_length: f64,
    crawler: Option<Crawler>,
    turner: Option<Turner>,
    feeder: Option<Feeder>,
    intermitter: Option<Intermitter>,
    coupling: Coupling,
}

impl DefaultLocomotor {
    pub fn new(config: &LocomotorConfig, coupling: &CouplingConfig, dt: f64, seed: u64) -> Result<Self> {
        Ok(Self {
            dt,
            body_length: config.body_length,
            crawler: config.crawler.as_ref().map(Crawler::new),
            turner: config.turner.as_ref().map(Turner::new),
            feeder: config.feeder.as_ref().map(Feeder::new),
            intermitter: config.intermitter.as_ref().map(|c| Intermitter::new(c, seed)),
            coupling: Coupling::new(coupling)?,
        })
    }

    #[must_use]
    pub fn bout(&self) -> Bout {
        self.intermitter.as_ref().map_or(Bout::Crawl, Intermitter::bout)
    }

    /// Body length, m.
    #[must_use]
    pub fn body_length(&self) -> f64 {
        self.body_length
    }

    #[must_use]
    pub fn coupling(&self) -> &Coupling {
        &self.coupling
    }

    #[must_use]
    pub fn crawler(&self) -> Option<&Crawler> {
        self.crawler.as_ref()
    }

    #[must_use]
    pub fn turner(&self) -> Option<&Turner> {
        self.turner.as_ref()
    }
}

impl Locomotor for DefaultLocomotor {
    fn step(&mut self, a_in: f64, on_food: bool) -> MotorCommand {
        let bout = self.bout();
        let crawling = bout == Bout::Crawl && self.crawler.is_some();
        let feeding = bout == Bout::Feed && self.feeder.is_some();

        let linear_velocity = self
            .crawler
            .as_mut()
            .map_or(0.0, |c| c.step(self.dt, crawling, self.body_length));
        let feeding_trigger = self.feeder.as_mut().is_some_and(|f| f.step(self.dt, feeding));

        let crawler_phase = self.crawler.as_ref().filter(|_| crawling).map(Crawler::phase);
        let feeder_phase = self.feeder.as_ref().filter(|_| feeding).map(Feeder::phase);
        let (osc_mult, amp_mult) = self.coupling.step(crawler_phase, feeder_phase);

        let angular_velocity = self
            .turner
            .as_mut()
            .map_or(0.0, |t| t.step(a_in, self.dt, osc_mult, amp_mult));

        let cycle_done = match bout {
            Bout::Crawl => self.crawler.as_ref().map_or(true, Crawler::completed_stride),
            Bout::Feed => feeding_trigger || self.feeder.is_none(),
            Bout::Pause(_) => false,
        };
        if let Some(i) = self.intermitter.as_mut() {
            i.update(self.dt, cycle_done, on_food);
        }

        MotorCommand {
            linear_velocity,
            angular_velocity,
            feeding_trigger,
        }
    }

    fn eeb(&self) -> Option<f64> {
        self.intermitter.as_ref().map(Intermitter::eeb)
    }

    fn set_eeb(&mut self, eeb: f64) {
        if let Some(i) = self.intermitter.as_mut() {
            i.set_eeb(eeb);
        }
    }
}
