//! Ingestion, residence and absorption of food.
//!
//! The energetics engine only sees the [`Gut`] trait: food goes in as an
//! ingested volume at some food density and comes out as assimilated energy,
//! never more than the engine's maximum assimilation for the tick.

use crate::config::GutConfig;
use crate::error::{LifeError, Result};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GutStats {
    pub feeds: u64,
    /// Volume accepted into the gut, cm³.
    pub ingested_volume: f64,
    /// Volume rejected because the gut was full, cm³.
    pub rejected_volume: f64,
    pub absorbed_mol: f64,
    pub egested_mol: f64,
}

pub trait Gut: std::fmt::Debug + Send + Sync {
    /// Takes in `volume` cm³ of food at `food_density` mol/cm³ for an organism
    /// of structural volume `structure`; returns the accepted volume.
    fn ingest(&mut self, volume: f64, food_density: f64, structure: f64) -> f64;

    /// Advances one engine tick and returns the assimilated energy, at most `max_energy`.
    fn absorb(&mut self, max_energy: f64) -> f64;

    fn residence_ticks(&self) -> usize;

    fn residence_minutes(&self) -> f64;

    /// Assimilation of the last tick relative to its maximum.
    fn realized_f(&self) -> f64;

    fn stats(&self) -> GutStats;
}

#[derive(Debug, Clone, PartialEq)]
struct Cohort {
    mol: f64,
    volume: f64,
    age: usize,
}

/// Gut holding one cohort per meal until its residence time runs out.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidenceGut {
    cohorts: VecDeque<Cohort>,
    residence_ticks: usize,
    residence_minutes: f64,
    /// Fraction of each cohort absorbed per tick.
    absorbed_fraction: f64,
    capacity: f64,
    /// Assimilated energy per mole of food, J/mol.
    energy_per_mol: f64,
    realized_f: f64,
    stats: GutStats,
}

impl ResidenceGut {
    pub fn new(config: &GutConfig, dt_seconds: f64, energy_per_mol: f64) -> Result<Self> {
        if !(dt_seconds > 0.0) || !(energy_per_mol > 0.0) {
            return Err(LifeError::configuration(
                "gut needs a positive tick and food energy content",
            ));
        }
        if !(config.residence_minutes > 0.0 && config.k_abs > 0.0 && config.capacity > 0.0) {
            return Err(LifeError::configuration(format!(
                "invalid gut parameters {config:?}"
            )));
        }
        let residence_ticks = ((config.residence_minutes * 60.0 / dt_seconds).ceil() as usize).max(1);
        Ok(Self {
            cohorts: VecDeque::with_capacity(residence_ticks),
            residence_ticks,
            residence_minutes: config.residence_minutes,
            absorbed_fraction: 1.0 - (-config.k_abs * dt_seconds / 3600.0).exp(),
            capacity: config.capacity,
            energy_per_mol,
            realized_f: 0.0,
            stats: GutStats::default(),
        })
    }

    /// Volume currently held, cm³.
    #[must_use]
    pub fn content_volume(&self) -> f64 {
        self.cohorts.iter().map(|c| c.volume).sum()
    }

    /// Food currently held, mol.
    #[must_use]
    pub fn content_mol(&self) -> f64 {
        self.cohorts.iter().map(|c| c.mol).sum()
    }
}

impl Gut for ResidenceGut {
    fn ingest(&mut self, volume: f64, food_density: f64, structure: f64) -> f64 {
        if volume <= 0.0 {
            return 0.0;
        }
        let free = (self.capacity * structure - self.content_volume()).max(0.0);
        let accepted = volume.min(free);
        self.stats.rejected_volume += volume - accepted;
        if accepted > 0.0 {
            self.stats.feeds += 1;
            self.stats.ingested_volume += accepted;
            self.cohorts.push_back(Cohort {
                mol: accepted * food_density.max(0.0),
                volume: accepted,
                age: 0,
            });
        }
        accepted
    }

    fn absorb(&mut self, max_energy: f64) -> f64 {
        let available: f64 = self.cohorts.iter().map(|c| c.mol).sum::<f64>() * self.absorbed_fraction;
        let wanted = available * self.energy_per_mol;
        let scale = if wanted > max_energy && wanted > 0.0 {
            max_energy.max(0.0) / wanted
        } else {
            1.0
        };

        let mut absorbed = 0.0;
        for cohort in &mut self.cohorts {
            let take = cohort.mol * self.absorbed_fraction * scale;
            if cohort.mol > 0.0 {
                cohort.volume *= 1.0 - take / cohort.mol;
            }
            cohort.mol -= take;
            cohort.age += 1;
            absorbed += take;
        }
        while self
            .cohorts
            .front()
            .is_some_and(|c| c.age >= self.residence_ticks)
        {
            if let Some(old) = self.cohorts.pop_front() {
                self.stats.egested_mol += old.mol;
            }
        }

        self.stats.absorbed_mol += absorbed;
        let energy = absorbed * self.energy_per_mol;
        self.realized_f = if max_energy > 0.0 {
            (energy / max_energy).clamp(0.0, 1.0)
        } else {
            0.0
        };
        energy
    }

    fn residence_ticks(&self) -> usize {
        self.residence_ticks
    }

    fn residence_minutes(&self) -> f64 {
        self.residence_minutes
    }

    fn realized_f(&self) -> f64 {
        self.realized_f
    }

    fn stats(&self) -> GutStats {
        self.stats
    }
}
