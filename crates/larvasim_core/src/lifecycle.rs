//! A single simulated larva: brain, body pose and energy budget stepped together.

use crate::brain::Brain;
use crate::config::SimConfig;
use crate::deb::{EnergeticsEngine, EnergeticsRunner};
use crate::error::{LifeError, Result};
use crate::locomotor::MotorCommand;
use crate::sensors::Environment;
use larvasim_data::{LifeHistory, Pose, SpeciesParameters, Stage};
use uuid::Uuid;

/// What happened during one [`Larva::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub stage_before: Stage,
    pub stage_after: Stage,
    pub command: MotorCommand,
    /// Food volume eaten this tick, cm³.
    pub ingested_volume: f64,
    pub engine_ticks: u64,
    /// Sensing failures that fell back to a zero activation this tick.
    pub sensing_fallbacks: u64,
}

impl StepReport {
    #[must_use]
    pub fn transitioned(&self) -> bool {
        self.stage_before != self.stage_after
    }
}

#[derive(Debug)]
pub struct Larva {
    pub id: Uuid,
    pub name: String,
    pub pose: Pose,
    brain: Brain,
    runner: EnergeticsRunner,
    dt: f64,
    hunger_as_eeb: bool,
    ticks: u64,
}

impl Larva {
    /// Hatches a larva of the configured phenotype and replays `history`.
    pub fn new(name: impl Into<String>, config: &SimConfig, history: &LifeHistory, seed: u64) -> Result<Self> {
        checked(config)?;
        let species = SpeciesParameters::preset(config.energetics.phenotype);
        let engine = EnergeticsEngine::new(
            species,
            config.substrate,
            history,
            &config.energetics,
            &config.gut,
        )?;
        Self::assemble(name, config, engine, seed)
    }

    /// Wraps an already constructed engine.
    pub fn with_engine(
        name: impl Into<String>,
        config: &SimConfig,
        engine: EnergeticsEngine,
        seed: u64,
    ) -> Result<Self> {
        checked(config)?;
        Self::assemble(name, config, engine, seed)
    }

    fn assemble(
        name: impl Into<String>,
        config: &SimConfig,
        engine: EnergeticsEngine,
        seed: u64,
    ) -> Result<Self> {
        let brain = Brain::new(
            &config.brain,
            &config.locomotor,
            &config.coupling,
            &config.simulation,
            seed,
        )?;
        let runner = EnergeticsRunner::new(
            engine,
            config.simulation.dt,
            config.energetics.f_decay,
            config.energetics.f_increment,
        )?;
        let mut larva = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            pose: Pose::default(),
            brain,
            runner,
            dt: config.simulation.dt,
            hunger_as_eeb: config.energetics.hunger_as_eeb,
            ticks: 0,
        };
        larva.sync_eeb();
        tracing::debug!(id = %larva.id, name = %larva.name, "Larva created");
        Ok(larva)
    }

    /// Advances one host tick: sense, decide, move, then metabolise.
    ///
    /// `reward` is true while the mouth is on food. Behaviour only runs in the
    /// larval stage; pupae and imagines just keep metabolising. An energetic
    /// failure is returned once, after the pose has already been updated.
    pub fn step(&mut self, env: &dyn Environment, reward: bool) -> Result<StepReport> {
        let stage_before = self.stage();
        let fallbacks_before = self.brain.sensing_fallbacks();

        let behaving = stage_before == Stage::Larva && self.alive();
        let command = if behaving {
            let command = self.brain.step(env, &self.pose, reward);
            self.act(&command);
            command
        } else {
            MotorCommand::default()
        };

        let ingested_volume = if behaving && command.feeding_trigger && reward {
            self.runner.engine().bite()
        } else {
            0.0
        };
        self.ticks += 1;
        let engine_ticks = self.runner.update(ingested_volume)?;
        self.sync_eeb();

        Ok(StepReport {
            stage_before,
            stage_after: self.stage(),
            command,
            ingested_volume,
            engine_ticks,
            sensing_fallbacks: self.brain.sensing_fallbacks() - fallbacks_before,
        })
    }

    /// Whether the mouth, half a body length ahead of the pose, touches food.
    /// An environment without a food layer never rewards.
    #[must_use]
    pub fn mouth_on_food(&self, env: &dyn Environment) -> bool {
        let half = self.brain.body_length() / 2.0;
        let (x, y) = self.pose.project(half, 0.0);
        env.food_contact(x, y).unwrap_or(false)
    }

    fn act(&mut self, command: &MotorCommand) {
        let pose = &mut self.pose;
        pose.orientation = (pose.orientation + command.angular_velocity * self.dt)
            .rem_euclid(std::f64::consts::TAU);
        let distance = command.linear_velocity * self.dt;
        pose.x += distance * pose.orientation.cos();
        pose.y += distance * pose.orientation.sin();
    }

    fn sync_eeb(&mut self) {
        if self.hunger_as_eeb {
            let hunger = self.runner.engine().hunger();
            self.brain.locomotor_mut().set_eeb(hunger);
        }
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.runner.engine().stage()
    }

    #[must_use]
    pub fn alive(&self) -> bool {
        self.runner.engine().alive()
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time since the larva was created, s.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.ticks as f64 * self.dt
    }

    #[must_use]
    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    #[must_use]
    pub fn energetics(&self) -> &EnergeticsEngine {
        self.runner.engine()
    }

    #[must_use]
    pub fn runner(&self) -> &EnergeticsRunner {
        &self.runner
    }
}

/// Runs [`SimConfig::validate`], reporting a rejection as a configuration error.
pub(crate) fn checked(config: &SimConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| LifeError::configuration(format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrainConfig;
    use crate::deb::AssimilationMode;
    use crate::sensors::EmptyEnvironment;

    fn config() -> SimConfig {
        let mut config = SimConfig::default();
        config.brain = BrainConfig::senseless();
        config.energetics.assimilation_mode = AssimilationMode::Sim;
        config
    }

    fn larva(config: &SimConfig) -> Larva {
        Larva::new("test", config, &LifeHistory::default(), 7).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected_before_hatching() {
        let mut bad = config();
        bad.gut.k_abs = -1.0;
        let err = Larva::new("test", &bad, &LifeHistory::default(), 7).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("absorption"), "{err}");
    }

    #[test]
    fn test_new_larva_hatched() {
        let l = larva(&config());
        assert_eq!(l.stage(), Stage::Larva);
        assert_eq!(l.ticks(), 0);
        assert_eq!(l.pose, Pose::default());
    }

    #[test]
    fn test_crawling_moves_the_body() {
        let mut l = larva(&config());
        for _ in 0..100 {
            l.step(&EmptyEnvironment, false).unwrap();
        }
        let p = l.pose;
        assert!(p.x.hypot(p.y) > 0.0);
        assert_eq!(l.ticks(), 100);
        assert!((l.elapsed_seconds() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_food_without_reward() {
        let mut l = larva(&config());
        for _ in 0..600 {
            let report = l.step(&EmptyEnvironment, false).unwrap();
            assert_eq!(report.ingested_volume, 0.0);
        }
        assert_eq!(l.runner().pending_volume(), 0.0);
    }

    #[test]
    fn test_feeding_on_food_ingests_bites() {
        let mut l = larva(&config());
        let mut eaten = 0.0;
        for _ in 0..600 {
            eaten += l.step(&EmptyEnvironment, true).unwrap().ingested_volume;
        }
        assert!(eaten > 0.0);
    }

    #[test]
    fn test_engine_ticks_follow_rate_ratio() {
        let mut l = larva(&config());
        let ticks: u64 = (0..1200)
            .map(|_| l.step(&EmptyEnvironment, false).unwrap().engine_ticks)
            .sum();
        // 60 s engine tick, 0.1 s host tick.
        assert_eq!(ticks, 2);
    }

    #[test]
    fn test_hunger_drives_eeb() {
        let mut c = config();
        c.energetics.hunger_as_eeb = true;
        c.energetics.hunger_gain = 1.0;
        let l = larva(&c);
        let eeb = l.brain().locomotor().eeb().unwrap();
        assert!((eeb - l.energetics().hunger()).abs() < 1e-12);
    }
}
