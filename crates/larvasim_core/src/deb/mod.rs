//! Dynamic energy budget of one organism across its developmental stages.
//!
//! Construction lays an egg whose reserve is calibrated to the requested
//! reserve density at birth, integrates the embryo to birth, predicts the
//! pupation threshold and replays the supplied feeding history. From then on
//! every [`EnergeticsEngine::run`] call advances one engine tick.

pub mod flux;
pub mod ode;
pub mod rates;
pub mod record;
pub mod runner;
pub mod solver;

use crate::config::{EnergeticsConfig, GutConfig};
use crate::error::{LifeError, Result};
use crate::gut::{Gut, GutStats, ResidenceGut};
use crate::substrate::Substrate;
use flux::{imago_step, larva_step};
use larvasim_data::{EnergeticState, LifeHistory, SpeciesParameters, Stage, SubstrateSpec};
use rates::{DerivedParameters, ScaledRates, L0};
use record::{EnergeticsRecord, FinalRecord, GutSummary, Timeline, TraceRow};
use serde::{Deserialize, Serialize};
use solver::{Emergence, LarvaPrediction, NumericStageSolver, StageSolver};

pub use runner::{EnergeticsRunner, RateRatio};

/// Source of the functional response used for assimilation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssimilationMode {
    /// The value passed to `run` overrides everything else.
    Sim,
    /// What the gut actually absorbed.
    #[default]
    Gut,
    /// The organism's baseline estimate for its substrate.
    Deb,
}

#[derive(Debug)]
pub struct EnergeticsEngine {
    species: SpeciesParameters,
    derived: DerivedParameters,
    rates: ScaledRates,
    solver: Box<dyn StageSolver + Send + Sync>,
    state: EnergeticState,
    e0: f64,
    /// Scaled length at birth.
    lb: f64,
    larva: LarvaPrediction,
    emergence: Option<Emergence>,
    substrate: Substrate,
    base_f: f64,
    f: f64,
    mode: AssimilationMode,
    hunger_gain: f64,
    base_hunger: f64,
    hunger: f64,
    bite_volume: f64,
    gut: Option<Box<dyn Gut>>,
    deb_p_a: f64,
    sim_p_a: f64,
    timeline: Timeline,
    sim_start: f64,
    hours_as_larva: f64,
    epochs: Vec<[f64; 2]>,
    epoch_qualities: Vec<f64>,
    record: Option<EnergeticsRecord>,
    max_stage_steps: u64,
    /// Physiological time (d) spent consecutively unable to cover maintenance.
    starving_days: f64,
}

impl EnergeticsEngine {
    pub fn new(
        species: SpeciesParameters,
        substrate: SubstrateSpec,
        history: &LifeHistory,
        config: &EnergeticsConfig,
        gut: &GutConfig,
    ) -> Result<Self> {
        let solver = NumericStageSolver::with_max_steps(config.max_stage_steps);
        Self::with_solver(species, substrate, history, config, gut, Box::new(solver))
    }

    /// Builds an engine whose stage transitions are computed by `solver`.
    pub fn with_solver(
        species: SpeciesParameters,
        substrate: SubstrateSpec,
        history: &LifeHistory,
        config: &EnergeticsConfig,
        gut_config: &GutConfig,
        solver: Box<dyn StageSolver + Send + Sync>,
    ) -> Result<Self> {
        history.check().map_err(LifeError::configuration)?;
        if !(config.eb > 0.0 && config.eb <= 1.0) {
            return Err(LifeError::configuration(format!("eb = {} outside (0, 1]", config.eb)));
        }
        for (name, value) in [("hunger gain", config.hunger_gain), ("base hunger", config.base_hunger)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LifeError::configuration(format!("{name} {value} outside [0, 1]")));
            }
        }
        if !(config.bite_volume > 0.0) {
            return Err(LifeError::configuration("bite volume must be positive"));
        }
        if config.assimilation_mode == AssimilationMode::Gut && !config.use_gut {
            return Err(LifeError::configuration("gut assimilation without a gut"));
        }

        let derived = DerivedParameters::derive(&species, config.temperature)?;
        let substrate = Substrate::new(substrate)?;
        let mut rates = ScaledRates::new(&species, &derived, config.dt)?;

        let e0 = solver.calibrate_egg(&species, &derived, &rates, config.eb)?;
        let mut state = EnergeticState::egg(e0, L0);
        let birth = solver.embryo(&mut state, &species, &derived, &rates)?;
        state.stage = Stage::Larva;
        rates.enter_larva(&species, &derived, birth.length);
        let lb = birth.length / derived.lm;
        let larva = solver.larva(&species, &derived, lb, 1.0)?;

        let gut: Option<Box<dyn Gut>> = if config.use_gut {
            Some(Box::new(ResidenceGut::new(
                gut_config,
                config.dt,
                species.y_e_x * species.mu_e,
            )?))
        } else {
            None
        };

        let base_f = substrate.functional_response(derived.half_saturation);
        let birth_hours = state.age_hours();
        tracing::info!(
            e0,
            birth_hours,
            lb,
            e_rj = larva.e_rj,
            "Embryo hatched"
        );

        let mut engine = Self {
            species,
            derived,
            rates,
            solver,
            state,
            e0,
            lb,
            larva,
            emergence: None,
            substrate,
            base_f,
            f: base_f,
            mode: config.assimilation_mode,
            hunger_gain: config.hunger_gain,
            base_hunger: config.base_hunger,
            hunger: 0.0,
            bite_volume: config.bite_volume,
            gut,
            deb_p_a: 0.0,
            sim_p_a: 0.0,
            timeline: Timeline {
                birth: Some(birth_hours),
                ..Timeline::default()
            },
            sim_start: birth_hours,
            hours_as_larva: 0.0,
            epochs: Vec::new(),
            epoch_qualities: Vec::new(),
            record: config.record.then(EnergeticsRecord::new),
            max_stage_steps: config.max_stage_steps,
            starving_days: 0.0,
        };
        engine.hunger = engine.compute_hunger();
        engine.grow_larva(history)?;
        Ok(engine)
    }

    /// Replays the feeding history from birth, one epoch after the other.
    fn grow_larva(&mut self, history: &LifeHistory) -> Result<()> {
        let tb = self.timeline.birth.unwrap_or(0.0);
        for epoch in &history.epochs {
            let f = Substrate::new(epoch.substrate)?.functional_response(self.derived.half_saturation);
            match epoch.ticks(self.rates.dt_days) {
                Some(ticks) => {
                    for _ in 0..ticks {
                        if self.state.stage != Stage::Larva {
                            break;
                        }
                        self.run_with_mode(f, 0.0, AssimilationMode::Sim)?;
                    }
                }
                None => {
                    let mut steps = 0;
                    while self.state.stage == Stage::Larva {
                        if steps >= self.max_stage_steps {
                            return Err(LifeError::non_convergence(
                                "larva growth",
                                format!("no pupation at f = {f:.3} after {steps} steps"),
                            ));
                        }
                        self.run_with_mode(f, 0.0, AssimilationMode::Sim)?;
                        steps += 1;
                    }
                }
            }
        }

        let tp = self.timeline.pupation;
        self.epochs = history
            .epochs
            .iter()
            .map(|e| {
                let end = e.end.map(|end| end + tb).or(tp).unwrap_or(self.state.age_hours());
                [e.start + tb, end]
            })
            .collect();
        self.epoch_qualities = history.epochs.iter().map(|e| e.substrate.quality).collect();
        self.hours_as_larva = self.state.age_hours() - tb;
        self.sim_start = self.state.age_hours();
        Ok(())
    }

    /// Advances one engine tick with the configured assimilation mode.
    ///
    /// `f` is the functional response offered by the host, `ingested_volume`
    /// the food volume (cm³) eaten since the previous tick.
    pub fn run(&mut self, f: f64, ingested_volume: f64) -> Result<()> {
        self.run_with_mode(f, ingested_volume, self.mode)
    }

    /// Advances one engine tick using `mode` for this call only.
    pub fn run_with_mode(&mut self, f: f64, ingested_volume: f64, mode: AssimilationMode) -> Result<()> {
        if !self.state.alive {
            return Ok(());
        }
        self.f = f.clamp(0.0, 1.0);
        self.state.age_days += self.rates.dt_days;

        let outcome = match self.state.stage {
            // Hatching happens during construction.
            Stage::Embryo => Ok(()),
            Stage::Larva => {
                if self.state.reproduction_buffer < self.larva.e_rj {
                    let max = self.rates.p_amm_dt * self.state.structure;
                    let p_a = self.assimilation(max, ingested_volume, mode);
                    let fluxes = larva_step(&mut self.state, p_a, &self.species, &self.rates);
                    self.hunger = self.compute_hunger();
                    self.check_starvation(fluxes.p_g < 0.0)
                } else {
                    self.pupate()
                }
            }
            Stage::Pupa => {
                if self
                    .timeline
                    .emergence
                    .is_some_and(|t| self.state.age_hours() >= t)
                {
                    self.emerge();
                }
                Ok(())
            }
            Stage::Imago => {
                let l = self.state.structural_length();
                let max = self.rates.p_am_dt * l * l;
                let p_a = self.assimilation(max, ingested_volume, mode);
                let fluxes = imago_step(&mut self.state, p_a, &self.species, &self.rates);
                self.hunger = self.compute_hunger();
                self.check_starvation(fluxes.p_r < 0.0)
            }
        };

        if self.record.is_some() {
            let row = TraceRow {
                age_hours: self.state.age_hours(),
                stage: self.state.stage,
                mass_mg: self.wet_mass() * 1000.0,
                length_mm: self.physical_length() * 10.0,
                reserve: self.state.reserve,
                reserve_density: self.reserve_density(),
                hunger: self.hunger,
                pupation_buffer: self.pupation_buffer(),
                f: self.f,
                deb_p_a: self.deb_p_a / self.state.structure,
                sim_p_a: self.sim_p_a / self.state.structure,
            };
            if let Some(record) = self.record.as_mut() {
                record.push(row);
            }
        }
        outcome
    }

    /// Assimilation for this tick given its maximum `max` (J at f = 1).
    fn assimilation(&mut self, max: f64, ingested_volume: f64, mode: AssimilationMode) -> f64 {
        self.deb_p_a = max * self.base_f;
        self.sim_p_a = max * self.f;
        let absorbed = self.gut.as_mut().map(|gut| {
            gut.ingest(ingested_volume, self.substrate.food_density(), self.state.structure);
            gut.absorb(max)
        });
        match (mode, absorbed) {
            (AssimilationMode::Sim, _) => self.sim_p_a,
            (AssimilationMode::Gut, Some(p_a)) => p_a,
            (AssimilationMode::Gut, None) | (AssimilationMode::Deb, _) => self.deb_p_a,
        }
    }

    fn pupate(&mut self) -> Result<()> {
        let age = self.state.age_hours();
        self.timeline.pupation = Some(age);
        self.state.stage = Stage::Pupa;
        let lj = self.state.structural_length() / self.derived.lm;
        let e = self.reserve_density();
        match self.solver.pupa(&self.species, &self.derived, lj, e) {
            Ok(em) => {
                let emergence = age + em.t_e_days * 24.0;
                tracing::info!(pupation_hours = age, emergence_hours = emergence, "Pupated");
                self.timeline.emergence = Some(emergence);
                self.emergence = Some(em);
                Ok(())
            }
            Err(e) => {
                // No emergence time to wait for, so the pupa dies where it lies.
                tracing::error!(error = %e, pupation_hours = age, "Pupal development failed");
                self.state.alive = false;
                self.timeline.death = Some(age);
                Err(e)
            }
        }
    }

    fn emerge(&mut self) {
        let Some(em) = self.emergence.as_ref() else {
            return;
        };
        let le = em.le * self.derived.lm;
        self.state.structure = le.powi(3);
        self.state.reserve = self.derived.reserve_from_scaled(&self.species, em.u_ee);
        self.state.maturity = self.species.e_he;
        self.state.reproduction_buffer = 0.0;
        self.state.stage = Stage::Imago;
        tracing::info!(
            emergence_hours = self.state.age_hours(),
            length_cm = le,
            "Imago emerged"
        );
    }

    /// Dead when structure or reserve is exhausted, or after starving for
    /// longer than the current size can survive.
    fn check_starvation(&mut self, starving: bool) -> Result<()> {
        if starving {
            self.starving_days += self.rates.dt_eff;
        } else {
            self.starving_days = 0.0;
        }
        if self.state.structure <= L0.powi(3)
            || self.state.reserve <= 0.0
            || self.starving_days > self.time_to_death_by_starvation()
        {
            return Err(self.starve());
        }
        Ok(())
    }

    fn starve(&mut self) -> LifeError {
        let age_hours = self.state.age_hours();
        self.state.alive = false;
        self.timeline.death = Some(age_hours);
        tracing::warn!(age_hours, stage = %self.state.stage, "Starved");
        LifeError::Starvation { age_hours }
    }

    fn compute_hunger(&self) -> f64 {
        hunger(self.base_hunger, self.hunger_gain, self.reserve_density())
    }

    #[must_use]
    pub fn state(&self) -> &EnergeticState {
        &self.state
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    #[must_use]
    pub fn alive(&self) -> bool {
        self.state.alive
    }

    /// Scaled reserve density `e = E / V / E_M`.
    #[must_use]
    pub fn reserve_density(&self) -> f64 {
        self.state.reserve / self.state.structure / self.derived.e_m
    }

    #[must_use]
    pub fn hunger(&self) -> f64 {
        self.hunger
    }

    /// Reproduction buffer relative to the pupation threshold.
    #[must_use]
    pub fn pupation_buffer(&self) -> f64 {
        self.state.reproduction_buffer / self.larva.e_rj
    }

    /// Wet mass, g.
    #[must_use]
    pub fn wet_mass(&self) -> f64 {
        let sp = &self.species;
        self.state.structure * sp.d_v
            + (self.state.reserve + self.state.reproduction_buffer) * sp.w_e / sp.mu_e
    }

    /// Wet volume including reserve, cm³.
    #[must_use]
    pub fn wet_volume(&self) -> f64 {
        let sp = &self.species;
        let omega_v = self.derived.e_m * sp.w_e / sp.d_e / sp.mu_e;
        self.state.structure * (1.0 + omega_v * self.reserve_density())
    }

    /// Physical length, cm.
    #[must_use]
    pub fn physical_length(&self) -> f64 {
        self.state.structural_length() / self.species.del_m
    }

    /// Feeding frequency (Hz) that sustains the baseline food level on the current substrate.
    #[must_use]
    pub fn feed_freq_estimate(&self) -> f64 {
        let lb = self.lb * self.derived.lm;
        let f_mm = self.species.f_m / lb;
        let j_x_amm = self.derived.j_x_am / lb;
        let filtering = 1.0 / (1.0 / f_mm + self.substrate.food_density() / j_x_amm);
        filtering / self.bite_volume * self.derived.t_factor / 86_400.0
    }

    /// Physiological days an organism of the current size survives once it
    /// can no longer cover its maintenance.
    #[must_use]
    pub fn time_to_death_by_starvation(&self) -> f64 {
        self.state.structural_length() / self.species.v * (1.0 / self.species.kap).ln()
    }

    /// Food volume (cm³) swallowed by one bite at the current size.
    #[must_use]
    pub fn bite(&self) -> f64 {
        self.bite_volume * self.state.structure
    }

    #[must_use]
    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    #[must_use]
    pub fn e0(&self) -> f64 {
        self.e0
    }

    /// Scaled length at birth.
    #[must_use]
    pub fn lb(&self) -> f64 {
        self.lb
    }

    #[must_use]
    pub fn larva_prediction(&self) -> &LarvaPrediction {
        &self.larva
    }

    #[must_use]
    pub fn emergence(&self) -> Option<&Emergence> {
        self.emergence.as_ref()
    }

    #[must_use]
    pub fn derived(&self) -> &DerivedParameters {
        &self.derived
    }

    #[must_use]
    pub fn species(&self) -> &SpeciesParameters {
        &self.species
    }

    /// Baseline functional response on the engine's substrate.
    #[must_use]
    pub fn base_f(&self) -> f64 {
        self.base_f
    }

    #[must_use]
    pub fn f(&self) -> f64 {
        self.f
    }

    #[must_use]
    pub fn assimilation_mode(&self) -> AssimilationMode {
        self.mode
    }

    pub fn set_assimilation_mode(&mut self, mode: AssimilationMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f64 {
        self.rates.dt_seconds()
    }

    #[must_use]
    pub fn hours_as_larva(&self) -> f64 {
        self.hours_as_larva
    }

    /// Age (h) at which the live simulation took over from the replayed history.
    #[must_use]
    pub fn sim_start(&self) -> f64 {
        self.sim_start
    }

    #[must_use]
    pub fn epochs(&self) -> &[[f64; 2]] {
        &self.epochs
    }

    #[must_use]
    pub fn gut_stats(&self) -> Option<GutStats> {
        self.gut.as_ref().map(|g| g.stats())
    }

    #[must_use]
    pub fn record(&self) -> Option<&EnergeticsRecord> {
        self.record.as_ref()
    }

    /// Closes the trace with its summary statistics; `None` when recording is off.
    #[must_use]
    pub fn finalize_record(&self, id: &str) -> Option<FinalRecord> {
        let record = self.record.as_ref()?;
        let f_mean = record.f_mean().unwrap_or(self.f);
        let gut = self.gut.as_ref().map(|g| {
            let stats = g.stats();
            let post_birth_s =
                (self.state.age_hours() - self.timeline.birth.unwrap_or(0.0)) * 3600.0;
            GutSummary {
                feeds: stats.feeds,
                mean_feed_freq: if post_birth_s > 0.0 {
                    stats.feeds as f64 / post_birth_s
                } else {
                    0.0
                },
                residence_minutes: g.residence_minutes(),
                ingested_volume: stats.ingested_volume,
                absorbed_mol: stats.absorbed_mol,
            }
        });
        Some(FinalRecord {
            id: id.to_string(),
            finalized_at: chrono::Utc::now(),
            timeline: self.timeline,
            hours_as_larva: self.hours_as_larva,
            sim_start: self.sim_start,
            epochs: self.epochs.clone(),
            epoch_qualities: self.epoch_qualities.clone(),
            tick_rate: 1.0 / self.rates.dt_seconds(),
            feed_freq_estimate: self.feed_freq_estimate(),
            f_mean,
            f_deviation_mean: f_mean - 1.0,
            gut,
            rows: record.rows().to_vec(),
        })
    }
}

/// `clip(base + gain * (1 - e), 0, 1)`.
#[must_use]
pub fn hunger(base_hunger: f64, gain: f64, reserve_density: f64) -> f64 {
    let h = base_hunger + gain * (1.0 - reserve_density);
    if h.is_nan() {
        return base_hunger.clamp(0.0, 1.0);
    }
    h.clamp(0.0, 1.0)
}
