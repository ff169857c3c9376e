//! A population of independent larvae sharing one environment.

use crate::config::SimConfig;
use crate::error::{ErrorKind, LifeError, Result};
use crate::lifecycle::{Larva, StepReport};
use crate::metrics::{self, Metrics};
use crate::sensors::Environment;
use larvasim_data::{LifeHistory, Stage};
use std::time::Instant;
use uuid::Uuid;

#[cfg(feature = "std")]
use rayon::prelude::*;

/// Outcome of one organism's tick. An error here never affects the others.
#[derive(Debug)]
pub struct OrganismReport {
    pub id: Uuid,
    pub outcome: std::result::Result<StepReport, LifeError>,
}

#[derive(Debug, Default)]
pub struct Population {
    larvae: Vec<Larva>,
    metrics: Metrics,
}

impl Population {
    /// Hatches `size` larvae. Organism `i` gets seed `config.simulation.seed + i`.
    pub fn new(config: &SimConfig, history: &LifeHistory, size: usize) -> Result<Self> {
        crate::lifecycle::checked(config)?;
        let larvae = (0..size)
            .map(|i| {
                Larva::new(
                    format!("larva_{i}"),
                    config,
                    history,
                    config.simulation.seed.wrapping_add(i as u64),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(size, "Population hatched");
        Ok(Self {
            larvae,
            metrics: Metrics::new(),
        })
    }

    #[must_use]
    pub fn from_larvae(larvae: Vec<Larva>) -> Self {
        Self {
            larvae,
            metrics: Metrics::new(),
        }
    }

    /// Steps every organism once, each rewarded when its mouth is on food.
    pub fn step(&mut self, env: &dyn Environment) -> Vec<OrganismReport> {
        let start = Instant::now();

        #[cfg(feature = "std")]
        let reports: Vec<OrganismReport> = self
            .larvae
            .par_iter_mut()
            .map(|larva| step_one(larva, env))
            .collect();
        #[cfg(not(feature = "std"))]
        let reports: Vec<OrganismReport> = self
            .larvae
            .iter_mut()
            .map(|larva| step_one(larva, env))
            .collect();

        for report in &reports {
            self.count(report);
        }
        self.metrics
            .record_tick(start.elapsed(), self.larvae.len(), self.alive());
        reports
    }

    /// Runs `ticks` population steps and returns the errors raised along the way.
    pub fn run(&mut self, env: &dyn Environment, ticks: u64) -> Vec<(Uuid, LifeError)> {
        let mut errors = Vec::new();
        for _ in 0..ticks {
            errors.extend(
                self.step(env)
                    .into_iter()
                    .filter_map(|r| r.outcome.err().map(|e| (r.id, e))),
            );
        }
        errors
    }

    /// Runs for the configured simulation duration.
    pub fn run_for(&mut self, env: &dyn Environment, config: &SimConfig) -> Vec<(Uuid, LifeError)> {
        self.run(env, config.simulation.ticks())
    }

    fn count(&self, report: &OrganismReport) {
        match &report.outcome {
            Ok(step) => {
                self.metrics
                    .add_to_counter(metrics::SENSING_FALLBACK, step.sensing_fallbacks);
                if step.transitioned() {
                    match step.stage_after {
                        Stage::Pupa => self.metrics.increment_counter(metrics::PUPATED),
                        Stage::Imago => self.metrics.increment_counter(metrics::EMERGED),
                        _ => {}
                    }
                }
            }
            Err(error) => {
                tracing::debug!(id = %report.id, %error, "Organism step failed");
                match error.kind() {
                    ErrorKind::Died => self.metrics.increment_counter(metrics::STARVED),
                    ErrorKind::SolverFailed => self.metrics.increment_counter(metrics::SOLVER_FAILURE),
                    ErrorKind::Misconfigured => {}
                }
            }
        }
    }

    #[must_use]
    pub fn alive(&self) -> usize {
        self.larvae.iter().filter(|l| l.alive()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.larvae.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.larvae.is_empty()
    }

    #[must_use]
    pub fn larvae(&self) -> &[Larva] {
        &self.larvae
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Larva> {
        self.larvae.iter().find(|l| l.id == id)
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

fn step_one(larva: &mut Larva, env: &dyn Environment) -> OrganismReport {
    let reward = larva.mouth_on_food(env);
    OrganismReport {
        id: larva.id,
        outcome: larva.step(env, reward),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrainConfig;
    use crate::deb::AssimilationMode;
    use crate::error::SensingError;
    use crate::sensors::EmptyEnvironment;

    struct Lawn;

    impl Environment for Lawn {
        fn food_contact(&self, _x: f64, _y: f64) -> std::result::Result<bool, SensingError> {
            Ok(true)
        }
    }

    fn config() -> SimConfig {
        let mut config = SimConfig::default();
        config.brain = BrainConfig::senseless();
        config.energetics.assimilation_mode = AssimilationMode::Sim;
        config
    }

    #[test]
    fn test_population_steps_every_organism() {
        let mut pop = Population::new(&config(), &LifeHistory::default(), 3).unwrap();
        assert_eq!(pop.len(), 3);
        let reports = pop.step(&EmptyEnvironment);
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.outcome.is_ok()));
        assert_eq!(pop.metrics().tick_count(), 1);
        assert_eq!(pop.metrics().organism_count(), 3);
        assert_eq!(pop.metrics().alive_count(), 3);
    }

    #[test]
    fn test_ids_are_unique_and_addressable() {
        let pop = Population::new(&config(), &LifeHistory::default(), 2).unwrap();
        let ids: Vec<Uuid> = pop.larvae().iter().map(|l| l.id).collect();
        assert_ne!(ids[0], ids[1]);
        assert_eq!(pop.get(ids[1]).map(|l| l.name.as_str()), Some("larva_1"));
    }

    #[test]
    fn test_run_on_food_counts_no_errors() {
        let mut pop = Population::new(&config(), &LifeHistory::default(), 2).unwrap();
        let errors = pop.run(&Lawn, 1200);
        assert!(errors.is_empty());
        assert_eq!(pop.metrics().tick_count(), 1200);
        assert!(pop.larvae().iter().all(|l| l.runner().engine().gut_stats().is_some()));
    }

    #[test]
    fn test_run_for_configured_duration() {
        let mut c = config();
        c.simulation.duration = 2.0;
        let mut pop = Population::new(&c, &LifeHistory::default(), 1).unwrap();
        pop.run_for(&EmptyEnvironment, &c);
        assert_eq!(pop.larvae()[0].ticks(), 20);
    }

    #[test]
    fn test_sensing_fallbacks_are_counted() {
        let mut c = config();
        c.brain.windsensor = Some(crate::config::SensorConfig::windsensor());
        let mut pop = Population::new(&c, &LifeHistory::default(), 2).unwrap();
        pop.run(&EmptyEnvironment, 5);
        assert_eq!(pop.metrics().counter(metrics::SENSING_FALLBACK), 10);
    }
}
