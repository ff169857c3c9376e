//! Sensorimotor brain: modality activations summed into one drive for the locomotor.

use crate::config::{BrainConfig, CouplingConfig, LocomotorConfig, SimulationConfig};
use crate::error::Result;
use crate::locomotor::{DefaultLocomotor, Locomotor, MotorCommand};
use crate::sensors::{AssociativeMemory, Environment, Modality, Probe, Sensor};
use larvasim_data::Pose;
use std::collections::BTreeMap;

/// One sensory channel. Without a sensor it contributes nothing.
#[derive(Debug, Clone)]
pub struct ModalityState {
    pub modality: Modality,
    sensor: Option<Sensor>,
    memory: Option<AssociativeMemory>,
    activation: f64,
    fallbacks: u64,
}

impl ModalityState {
    fn new(modality: Modality, sensor: Option<Sensor>) -> Self {
        Self {
            modality,
            sensor,
            memory: None,
            activation: 0.0,
            fallbacks: 0,
        }
    }

    #[must_use]
    pub fn activation(&self) -> f64 {
        self.activation
    }

    #[must_use]
    pub fn has_sensor(&self) -> bool {
        self.sensor.is_some()
    }

    /// Ticks on which sensing failed and the activation fell back to zero.
    #[must_use]
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks
    }
}

#[derive(Debug)]
pub struct Brain {
    modalities: Vec<ModalityState>,
    touch_points: Vec<[f64; 2]>,
    body_length: f64,
    arena: [f64; 2],
    dt: f64,
    locomotor: Box<dyn Locomotor>,
}

impl Brain {
    pub fn new(
        config: &BrainConfig,
        locomotor: &LocomotorConfig,
        coupling: &CouplingConfig,
        simulation: &SimulationConfig,
        seed: u64,
    ) -> Result<Self> {
        let locomotor = DefaultLocomotor::new(locomotor, coupling, simulation.dt, seed)?;
        Ok(Self::with_locomotor(
            config,
            locomotor.body_length(),
            simulation,
            Box::new(locomotor),
        ))
    }

    /// A brain driving a caller-supplied locomotor.
    #[must_use]
    pub fn with_locomotor(
        config: &BrainConfig,
        body_length: f64,
        simulation: &SimulationConfig,
        locomotor: Box<dyn Locomotor>,
    ) -> Self {
        let sensor_for = |m: Modality| match m {
            Modality::Olfaction => config.olfactor.as_ref().map(Sensor::new),
            Modality::Touch => config.toucher.as_ref().map(|t| Sensor::new(&t.sensor)),
            Modality::Thermosensation => config.thermosensor.as_ref().map(Sensor::new),
            Modality::Wind => config.windsensor.as_ref().map(Sensor::new),
        };
        let mut modalities: Vec<ModalityState> = Modality::ALL
            .into_iter()
            .map(|m| ModalityState::new(m, sensor_for(m)))
            .collect();
        if let Some(mem) = &config.memory {
            if let Some(state) = modalities
                .iter_mut()
                .find(|s| s.modality == mem.modality && s.sensor.is_some())
            {
                state.memory = Some(AssociativeMemory::new(mem));
            }
        }
        Self {
            modalities,
            touch_points: config.toucher.as_ref().map(|t| t.points.clone()).unwrap_or_default(),
            body_length,
            arena: simulation.arena,
            dt: simulation.dt,
            locomotor,
        }
    }

    /// Updates every modality's activation and returns their sum.
    ///
    /// A failed environment query gives that modality a zero activation for
    /// this tick. Gains adapted by memory only take effect on the next tick.
    pub fn sense(&mut self, env: &dyn Environment, pose: &Pose, reward: bool) -> f64 {
        let probe = Probe {
            pose,
            body_length: self.body_length,
            touch_points: &self.touch_points,
            arena: self.arena,
        };
        for state in &mut self.modalities {
            let Some(sensor) = state.sensor.as_mut() else {
                state.activation = 0.0;
                continue;
            };
            match state.modality.sense(env, &probe) {
                Ok(stimulus) => {
                    state.activation = sensor.step(&stimulus, self.dt);
                    if let Some(memory) = state.memory.as_mut() {
                        memory.update(sensor.gains_mut(), &stimulus, reward);
                    }
                }
                Err(error) => {
                    tracing::debug!(modality = %state.modality, %error, "Sensing failed, activation set to zero");
                    state.activation = 0.0;
                    state.fallbacks += 1;
                }
            }
        }
        self.a_in()
    }

    /// One behavioural tick: sense at `pose`, then drive the locomotor.
    /// `reward` is true while the mouth is on food; it reinforces memory and
    /// lets the intermitter keep a feeding bout going.
    pub fn step(&mut self, env: &dyn Environment, pose: &Pose, reward: bool) -> MotorCommand {
        let a_in = self.sense(env, pose, reward);
        self.locomotor.step(a_in, reward)
    }

    /// Body length, m.
    #[must_use]
    pub fn body_length(&self) -> f64 {
        self.body_length
    }

    /// Combined drive: the sum of all modality activations.
    #[must_use]
    pub fn a_in(&self) -> f64 {
        self.modalities.iter().map(|m| m.activation).sum()
    }

    #[must_use]
    pub fn activation(&self, modality: Modality) -> f64 {
        self.modality(modality).map_or(0.0, ModalityState::activation)
    }

    #[must_use]
    pub fn activations(&self) -> BTreeMap<Modality, f64> {
        self.modalities.iter().map(|m| (m.modality, m.activation)).collect()
    }

    #[must_use]
    pub fn modality(&self, modality: Modality) -> Option<&ModalityState> {
        self.modalities.iter().find(|m| m.modality == modality)
    }

    /// Current gains of every modality that has both a sensor and a memory.
    #[must_use]
    pub fn memory_gains(&self) -> BTreeMap<Modality, BTreeMap<String, f64>> {
        self.modalities
            .iter()
            .filter(|m| m.memory.is_some())
            .filter_map(|m| m.sensor.as_ref().map(|s| (m.modality, s.gains().clone())))
            .collect()
    }

    #[must_use]
    pub fn sensing_fallbacks(&self) -> u64 {
        self.modalities.iter().map(|m| m.fallbacks).sum()
    }

    #[must_use]
    pub fn locomotor(&self) -> &dyn Locomotor {
        self.locomotor.as_ref()
    }

    pub fn locomotor_mut(&mut self) -> &mut dyn Locomotor {
        self.locomotor.as_mut()
    }
}
