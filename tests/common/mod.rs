pub mod macros;

use larvasim_lib::model::config::{BrainConfig, SimConfig};
use larvasim_lib::model::deb::{AssimilationMode, EnergeticsEngine};
use larvasim_lib::model::error::SensingError;
use larvasim_lib::model::sensors::Environment;
use larvasim_lib::model::{Larva, LifeHistory, SpeciesParameters, Stimulus};

type SpeciesMod = Box<dyn Fn(&mut SpeciesParameters)>;

/// Builds larvae and engines with test-friendly defaults.
#[allow(dead_code)]
pub struct LarvaBuilder {
    config: SimConfig,
    history: LifeHistory,
    species_mods: Vec<SpeciesMod>,
    seed: u64,
}

#[allow(dead_code)]
impl LarvaBuilder {
    pub fn new() -> Self {
        let mut config = SimConfig::default();
        config.brain = BrainConfig::senseless();
        config.energetics.assimilation_mode = AssimilationMode::Sim;
        Self {
            config,
            history: LifeHistory::default(),
            species_mods: Vec::new(),
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.config.simulation.seed = seed;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_history(mut self, history: LifeHistory) -> Self {
        self.history = history;
        self
    }

    pub fn until_pupation(self) -> Self {
        let substrate = self.config.substrate;
        self.with_history(LifeHistory::until_pupation(substrate))
    }

    pub fn with_species<F>(mut self, modifier: F) -> Self
    where
        F: Fn(&mut SpeciesParameters) + 'static,
    {
        self.species_mods.push(Box::new(modifier));
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn engine(&self) -> larvasim_lib::model::error::Result<EnergeticsEngine> {
        let mut species = SpeciesParameters::preset(self.config.energetics.phenotype);
        for modifier in &self.species_mods {
            modifier(&mut species);
        }
        EnergeticsEngine::new(
            species,
            self.config.substrate,
            &self.history,
            &self.config.energetics,
            &self.config.gut,
        )
    }

    pub fn build(self) -> larvasim_lib::model::error::Result<Larva> {
        let engine = self.engine()?;
        Larva::with_engine("test_larva", &self.config, engine, self.seed)
    }
}

/// A radial odour source at the origin and food everywhere within `food_radius`.
#[allow(dead_code)]
pub struct OdorArena {
    pub peak: f64,
    pub spread: f64,
    pub food_radius: f64,
}

impl Default for OdorArena {
    fn default() -> Self {
        Self {
            peak: 1.0,
            spread: 0.02,
            food_radius: 0.005,
        }
    }
}

impl Environment for OdorArena {
    fn odor_concentrations(&self, x: f64, y: f64) -> Result<Stimulus, SensingError> {
        let d2 = x * x + y * y;
        let c = self.peak * (-d2 / (2.0 * self.spread * self.spread)).exp();
        Ok(Stimulus::from([("Odor".to_string(), c)]))
    }

    fn food_contact(&self, x: f64, y: f64) -> Result<bool, SensingError> {
        Ok(x.hypot(y) <= self.food_radius)
    }
}

/// Every layer fails.
#[allow(dead_code)]
pub struct BrokenEnvironment;

impl Environment for BrokenEnvironment {
    fn odor_concentrations(&self, _x: f64, _y: f64) -> Result<Stimulus, SensingError> {
        Err(SensingError::Invalid("odor layer corrupted".to_string()))
    }

    fn food_contact(&self, x: f64, y: f64) -> Result<bool, SensingError> {
        Err(SensingError::OutOfBounds { x, y })
    }

    fn wind(&self, _pose: &larvasim_lib::model::Pose) -> Result<f64, SensingError> {
        Ok(f64::NAN)
    }

    fn thermal(&self, _u: f64, _v: f64) -> Result<Stimulus, SensingError> {
        Err(SensingError::MissingLayer("thermal".to_string()))
    }
}
