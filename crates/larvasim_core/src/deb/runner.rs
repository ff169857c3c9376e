//! Embedding of the energetics engine in a host loop with its own tick.

use super::EnergeticsEngine;
use crate::error::{LifeError, Result};

const RATIO_TOLERANCE: f64 = 1e-9;

/// How engine ticks line up with host ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateRatio {
    /// The engine runs once every `n` host ticks.
    EveryNthHostTick(u64),
    /// The engine runs `n` times per host tick.
    SubstepsPerHostTick(u64),
}

/// Resolves the ratio between the engine and host ticks, which must be an
/// exact integer in one direction or the other.
pub fn rate_ratio(engine_dt: f64, host_dt: f64) -> Result<RateRatio> {
    if !(engine_dt > 0.0 && host_dt > 0.0) {
        return Err(LifeError::configuration(format!(
            "ticks must be positive (engine {engine_dt} s, host {host_dt} s)"
        )));
    }
    let (ratio, coarser_engine) = if engine_dt >= host_dt {
        (engine_dt / host_dt, true)
    } else {
        (host_dt / engine_dt, false)
    };
    let n = ratio.round();
    if (ratio - n).abs() > RATIO_TOLERANCE * ratio {
        return Err(LifeError::configuration(format!(
            "engine tick {engine_dt} s and host tick {host_dt} s are not integer multiples"
        )));
    }
    let n = n as u64;
    Ok(if coarser_engine {
        RateRatio::EveryNthHostTick(n)
    } else {
        RateRatio::SubstepsPerHostTick(n)
    })
}

/// Drives an [`EnergeticsEngine`] from a host loop.
///
/// Ingested food accumulates between engine ticks. The runner keeps a running
/// estimate of the functional response that jumps up after every meal and
/// decays exponentially otherwise; it is what the engine sees as `f`.
#[derive(Debug)]
pub struct EnergeticsRunner {
    engine: EnergeticsEngine,
    ratio: RateRatio,
    host_dt: f64,
    host_ticks: u64,
    pending_volume: f64,
    f: f64,
    f_decay: f64,
    f_increment: f64,
}

impl EnergeticsRunner {
    pub fn new(engine: EnergeticsEngine, host_dt: f64, f_decay: f64, f_increment: f64) -> Result<Self> {
        let ratio = rate_ratio(engine.dt_seconds(), host_dt)?;
        let f = engine.base_f();
        Ok(Self {
            engine,
            ratio,
            host_dt,
            host_ticks: 0,
            pending_volume: 0.0,
            f,
            f_decay,
            f_increment,
        })
    }

    /// Processes one host tick in which `ingested_volume` cm³ of food were eaten.
    ///
    /// Returns the number of engine ticks that ran.
    pub fn update(&mut self, ingested_volume: f64) -> Result<u64> {
        self.host_ticks += 1;
        self.pending_volume += ingested_volume.max(0.0);
        let engine_ticks = match self.ratio {
            RateRatio::EveryNthHostTick(n) if self.host_ticks % n != 0 => return Ok(0),
            RateRatio::EveryNthHostTick(_) => 1,
            RateRatio::SubstepsPerHostTick(n) => n,
        };

        if self.pending_volume > 0.0 {
            self.f += self.f_increment;
        }
        self.f = (self.f * (-self.f_decay * self.host_dt).exp()).clamp(0.0, 1.0);

        let volume = std::mem::take(&mut self.pending_volume);
        let per_tick = volume / engine_ticks as f64;
        for _ in 0..engine_ticks {
            self.engine.run(self.f, per_tick)?;
        }
        Ok(engine_ticks)
    }

    #[must_use]
    pub fn engine(&self) -> &EnergeticsEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EnergeticsEngine {
        &mut self.engine
    }

    #[must_use]
    pub fn ratio(&self) -> RateRatio {
        self.ratio
    }

    /// Running estimate of the functional response.
    #[must_use]
    pub fn f(&self) -> f64 {
        self.f
    }

    /// Food eaten since the last engine tick, cm³.
    #[must_use]
    pub fn pending_volume(&self) -> f64 {
        self.pending_volume
    }

    #[must_use]
    pub fn into_engine(self) -> EnergeticsEngine {
        self.engine
    }
}
