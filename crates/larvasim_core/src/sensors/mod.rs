//! Sensory modalities: what the environment offers and how a sensor responds to it.
//!
//! A modality pairs a sensing function (a query against the host
//! [`Environment`]) with a [`Sensor`] that turns the raw readings into an
//! activation. Sensing functions return `Result`; deciding what a failed
//! query means is left to the brain.

pub mod memory;

use crate::config::SensorConfig;
use crate::error::SensingError;
use larvasim_data::{Pose, Stimulus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use memory::AssociativeMemory;

/// What the host world can be asked. Every layer is optional: the default
/// implementations report the layer as missing.
pub trait Environment: Sync {
    /// Odor concentration per source at a point.
    fn odor_concentrations(&self, _x: f64, _y: f64) -> Result<Stimulus, SensingError> {
        Err(SensingError::MissingLayer("odorscape".to_string()))
    }

    /// Whether a point lies on food.
    fn food_contact(&self, _x: f64, _y: f64) -> Result<bool, SensingError> {
        Err(SensingError::MissingLayer("food".to_string()))
    }

    /// Wind magnitude felt by an organism at `pose`.
    fn wind(&self, _pose: &Pose) -> Result<f64, SensingError> {
        Err(SensingError::MissingLayer("windscape".to_string()))
    }

    /// `cool` and `warm` readings at a coordinate normalised to the unit square.
    fn thermal(&self, _u: f64, _v: f64) -> Result<Stimulus, SensingError> {
        Err(SensingError::MissingLayer("thermoscape".to_string()))
    }
}

/// An environment with no layers at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEnvironment;

impl Environment for EmptyEnvironment {}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    #[default]
    Olfaction,
    Touch,
    Thermosensation,
    Wind,
}

impl Modality {
    pub const ALL: [Modality; 4] = [
        Modality::Olfaction,
        Modality::Touch,
        Modality::Thermosensation,
        Modality::Wind,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Olfaction => "olfaction",
            Modality::Touch => "touch",
            Modality::Thermosensation => "thermosensation",
            Modality::Wind => "wind",
        }
    }

    /// Queries the environment for this modality's raw readings.
    pub fn sense(self, env: &dyn Environment, probe: &Probe<'_>) -> Result<Stimulus, SensingError> {
        let pose = probe.pose;
        match self {
            Modality::Olfaction => {
                let (x, y) = pose.project(probe.body_length / 2.0, 0.0);
                env.odor_concentrations(x, y)
            }
            Modality::Touch => {
                let mut readings = Stimulus::new();
                for (i, [forward, left]) in probe.touch_points.iter().enumerate() {
                    let (x, y) =
                        pose.project(forward * probe.body_length, left * probe.body_length);
                    let contact = env.food_contact(x, y)?;
                    readings.insert(format!("touch_{i}"), if contact { 1.0 } else { 0.0 });
                }
                Ok(readings)
            }
            Modality::Thermosensation => {
                let [w, h] = probe.arena;
                let u = (pose.x + 0.5 * w) / w;
                let v = (pose.y + 0.5 * h) / h;
                if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
                    return Err(SensingError::OutOfBounds { x: pose.x, y: pose.y });
                }
                env.thermal(u, v)
            }
            Modality::Wind => {
                let magnitude = env.wind(pose)?;
                if !magnitude.is_finite() {
                    return Err(SensingError::Invalid(format!("wind magnitude {magnitude}")));
                }
                Ok(Stimulus::from([("windsensor".to_string(), magnitude)]))
            }
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "olfaction" | "olfactor" => Ok(Modality::Olfaction),
            "touch" | "toucher" => Ok(Modality::Touch),
            "thermosensation" | "thermosensor" => Ok(Modality::Thermosensation),
            "wind" | "windsensation" | "windsensor" => Ok(Modality::Wind),
            other => Err(format!("unknown modality '{other}'")),
        }
    }
}

/// Where and with what body the environment is being sensed.
#[derive(Debug, Clone, Copy)]
pub struct Probe<'a> {
    pub pose: &'a Pose,
    /// Body length, m.
    pub body_length: f64,
    /// Contact points as (forward, left) offsets in body lengths.
    pub touch_points: &'a [[f64; 2]],
    /// Arena width and height, m.
    pub arena: [f64; 2],
}

/// How a reading is turned into a change signal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Perception {
    /// Absolute change since the previous tick.
    #[default]
    Linear,
    /// Relative change since the previous tick.
    Log,
    /// The reading itself.
    Null,
}

impl Perception {
    #[must_use]
    pub fn change(self, previous: Option<f64>, current: f64) -> f64 {
        match (self, previous) {
            (Perception::Null, _) => current,
            (Perception::Linear, Some(prev)) => current - prev,
            (Perception::Log, Some(prev)) if prev != 0.0 => current / prev - 1.0,
            _ => 0.0,
        }
    }
}

/// Response dynamics of one sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    perception: Perception,
    decay_coef: f64,
    output_range: [f64; 2],
    gains: BTreeMap<String, f64>,
    default_gain: f64,
    previous: Stimulus,
    activation: f64,
}

impl Sensor {
    #[must_use]
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            perception: config.perception,
            decay_coef: config.decay_coef,
            output_range: config.output_range,
            gains: config.gains.clone(),
            default_gain: config.default_gain,
            previous: Stimulus::new(),
            activation: 0.0,
        }
    }

    /// Integrates one tick of readings and returns the new activation.
    ///
    /// The activation decays exponentially and is driven by the gain-weighted
    /// change of every stimulus. Stimuli seen for the first time are
    /// registered with the default gain.
    pub fn step(&mut self, input: &Stimulus, dt: f64) -> f64 {
        let mut drive = 0.0;
        for (id, &value) in input {
            let gain = *self.gains.entry(id.clone()).or_insert(self.default_gain);
            let change = self.perception.change(self.previous.get(id).copied(), value);
            drive += gain * change;
        }
        let [lo, hi] = self.output_range;
        let decayed = self.activation * (-dt * self.decay_coef).exp();
        self.activation = (decayed + dt * drive).clamp(lo, hi);
        self.previous.clone_from(input);
        self.activation
    }

    #[must_use]
    pub fn activation(&self) -> f64 {
        self.activation
    }

    #[must_use]
    pub fn gains(&self) -> &BTreeMap<String, f64> {
        &self.gains
    }

    pub fn gains_mut(&mut self) -> &mut BTreeMap<String, f64> {
        &mut self.gains
    }

    #[must_use]
    pub fn last_input(&self) -> &Stimulus {
        &self.previous
    }
}
