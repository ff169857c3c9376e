//! Configuration management for simulation parameters.
//!
//! Every section is a plain value struct composed by value into [`SimConfig`],
//! which maps onto a `larvasim.toml` file. Nothing here is looked up
//! dynamically: behaviour-selecting names (coupling policy, sensor modality)
//! are resolved once when the brain and engine are built.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls)
//! 2. A TOML file, see [`SimConfig::from_toml`] (overrides defaults)
//! 3. Dotted-key overrides through [`flatten`] / [`expand`]
//!
//! ## Example `larvasim.toml`
//!
//! ```toml
//! [simulation]
//! dt = 0.1
//! seed = 7
//!
//! [energetics]
//! phenotype = "rover"
//! dt = 60.0
//! hunger_gain = 0.5
//!
//! [substrate]
//! kind = "standard"
//! quality = 0.8
//!
//! [coupling]
//! mode = "phasic"
//! ```

use crate::deb::AssimilationMode;
use crate::sensors::{Modality, Perception};
use larvasim_data::{Phenotype, SubstrateSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The `[substrate]` section: feeding medium and its quality.
pub type SubstrateConfig = SubstrateSpec;

/// Host-loop settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Host tick in seconds.
    pub dt: f64,
    /// Seed of every random stream in the run.
    pub seed: u64,
    /// Arena width and height in m, used to normalise thermal coordinates.
    pub arena: [f64; 2],
    /// Length of a run, s.
    pub duration: f64,
}

impl SimulationConfig {
    /// Host ticks in a run of `duration` seconds.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        (self.duration / self.dt).round().max(0.0) as u64
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            seed: 42,
            arena: [0.1, 0.1],
            duration: 180.0,
        }
    }
}

/// Energetics engine settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnergeticsConfig {
    pub phenotype: Phenotype,
    /// Engine tick in seconds; rate constants are pre-scaled to it.
    pub dt: f64,
    /// Body temperature in K.
    pub temperature: f64,
    /// Scaled reserve density at birth.
    pub eb: f64,
    pub assimilation_mode: AssimilationMode,
    pub use_gut: bool,
    /// Sensitivity of hunger to reserve-density deficits, in [0, 1].
    pub hunger_gain: f64,
    pub base_hunger: f64,
    /// Whether hunger sets the locomotor's exploration/exploitation bias.
    pub hunger_as_eeb: bool,
    /// Volume of a single bite as a fraction of structural volume.
    pub bite_volume: f64,
    /// Exponential decay coefficient of the running functional-response estimate, 1/s.
    pub f_decay: f64,
    /// Increment of the running functional-response estimate after a meal.
    pub f_increment: f64,
    /// Keep a one-row-per-tick trace of the engine scalars.
    pub record: bool,
    /// Step budget of every threshold-crossing search.
    pub max_stage_steps: u64,
}

impl Default for EnergeticsConfig {
    fn default() -> Self {
        Self {
            phenotype: Phenotype::Default,
            dt: 60.0,
            temperature: 298.15,
            eb: 1.0,
            assimilation_mode: AssimilationMode::Gut,
            use_gut: true,
            hunger_gain: 0.0,
            base_hunger: 0.5,
            hunger_as_eeb: false,
            bite_volume: 0.0005,
            f_decay: 0.1,
            f_increment: 0.1,
            record: true,
            max_stage_steps: 2_000_000,
        }
    }
}

/// Gut settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GutConfig {
    /// Time food stays in the gut before egestion, minutes.
    pub residence_minutes: f64,
    /// First-order absorption rate, 1/h.
    pub k_abs: f64,
    /// Gut volume relative to structural volume.
    pub capacity: f64,
}

impl Default for GutConfig {
    fn default() -> Self {
        Self {
            residence_minutes: 60.0,
            k_abs: 4.0,
            capacity: 0.05,
        }
    }
}

/// Response dynamics shared by all sensors.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    pub perception: Perception,
    /// Activation decay coefficient, 1/s.
    pub decay_coef: f64,
    pub output_range: [f64; 2],
    /// Initial gain per stimulus id.
    pub gains: BTreeMap<String, f64>,
    /// Gain given to stimuli seen for the first time.
    pub default_gain: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            perception: Perception::Linear,
            decay_coef: 0.1,
            output_range: [-1.0, 1.0],
            gains: BTreeMap::new(),
            default_gain: 0.0,
        }
    }
}

impl SensorConfig {
    #[must_use]
    pub fn olfactor() -> Self {
        Self {
            perception: Perception::Log,
            gains: BTreeMap::from([("Odor".to_string(), 150.0)]),
            default_gain: 150.0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn thermosensor() -> Self {
        Self {
            gains: BTreeMap::from([("cool".to_string(), 1.0), ("warm".to_string(), 1.0)]),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn windsensor() -> Self {
        Self {
            perception: Perception::Null,
            gains: BTreeMap::from([("windsensor".to_string(), 1.0)]),
            ..Self::default()
        }
    }
}

/// Touch sensor with contact points given as body-relative offsets in body lengths.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ToucherConfig {
    pub sensor: SensorConfig,
    /// (forward, left) offsets of each contact point.
    pub points: Vec<[f64; 2]>,
}

impl Default for ToucherConfig {
    fn default() -> Self {
        Self {
            sensor: SensorConfig {
                output_range: [0.0, 1.0],
                default_gain: 40.0,
                ..SensorConfig::default()
            },
            points: vec![[0.5, 0.0], [0.3, 0.1], [0.3, -0.1]],
        }
    }
}

/// Associative memory adapting one modality's gains.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    pub modality: Modality,
    /// Fraction of the distance to the rewarded gain covered per tick.
    pub learning_rate: f64,
    /// Fraction of the distance back to baseline covered per unrewarded tick.
    pub relaxation: f64,
    pub gain_max: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            modality: Modality::Olfaction,
            learning_rate: 0.05,
            relaxation: 0.01,
            gain_max: 300.0,
        }
    }
}

/// Sensor capabilities of the brain. An absent sensor contributes nothing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BrainConfig {
    pub olfactor: Option<SensorConfig>,
    pub toucher: Option<ToucherConfig>,
    pub thermosensor: Option<SensorConfig>,
    pub windsensor: Option<SensorConfig>,
    pub memory: Option<MemoryConfig>,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            olfactor: Some(SensorConfig::olfactor()),
            toucher: None,
            thermosensor: None,
            windsensor: None,
            memory: None,
        }
    }
}

impl BrainConfig {
    /// A brain with no sensor at all.
    #[must_use]
    pub fn senseless() -> Self {
        Self {
            olfactor: None,
            toucher: None,
            thermosensor: None,
            windsensor: None,
            memory: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Stride frequency, Hz.
    pub freq: f64,
    /// Mean stride length in body lengths.
    pub stride_dst_mean: f64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            freq: 1.42,
            stride_dst_mean: 0.224,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TurnerConfig {
    /// Oscillation frequency, Hz.
    pub freq: f64,
    /// Angular velocity amplitude at unit activation, rad/s.
    pub amp: f64,
    /// Clamp of the activation `1 + A_in`.
    pub activation_range: [f64; 2],
}

impl Default for TurnerConfig {
    fn default() -> Self {
        Self {
            freq: 0.58,
            amp: 1.0,
            activation_range: [0.0, 2.0],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FeederConfig {
    /// Feeding-motion frequency, Hz.
    pub freq: f64,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self { freq: 2.0 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct IntermitterConfig {
    /// Probability of a pause after each completed stride or feeding cycle.
    pub pause_probability: f64,
    /// Pause duration, s.
    pub pause_duration: f64,
    /// Initial exploration/exploitation bias: probability of feeding when on food.
    pub eeb: f64,
}

impl Default for IntermitterConfig {
    fn default() -> Self {
        Self {
            pause_probability: 0.05,
            pause_duration: 1.0,
            eeb: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LocomotorConfig {
    /// Body length, m.
    pub body_length: f64,
    pub crawler: Option<CrawlerConfig>,
    pub turner: Option<TurnerConfig>,
    pub feeder: Option<FeederConfig>,
    pub intermitter: Option<IntermitterConfig>,
}

impl Default for LocomotorConfig {
    fn default() -> Self {
        Self {
            body_length: 0.004,
            crawler: Some(CrawlerConfig::default()),
            turner: Some(TurnerConfig::default()),
            feeder: Some(FeederConfig::default()),
            intermitter: Some(IntermitterConfig::default()),
        }
    }
}

/// Which of the two suppression multipliers the attenuation feeds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionMode {
    #[default]
    Amplitude,
    Oscillation,
    Both,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CouplingConfig {
    /// Policy name: `default`, `square` or `phasic`.
    pub mode: String,
    pub attenuation: f64,
    pub attenuation_max: f64,
    pub suppression_mode: SuppressionMode,
    /// Crawler phase window (rad) lifting turner suppression.
    pub crawler_phi_range: [f64; 2],
    /// Feeder phase window (rad) lifting turner suppression.
    pub feeder_phi_range: [f64; 2],
    /// Crawler phase (rad) of minimum turner suppression.
    pub max_attenuation_phase: f64,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            mode: "phasic".to_string(),
            attenuation: 0.1,
            attenuation_max: 0.6,
            suppression_mode: SuppressionMode::Amplitude,
            crawler_phi_range: [1.6, 3.6],
            feeder_phi_range: [1.6, 3.6],
            max_attenuation_phase: 3.4,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub energetics: EnergeticsConfig,
    pub substrate: SubstrateSpec,
    pub gut: GutConfig,
    pub brain: BrainConfig,
    pub locomotor: LocomotorConfig,
    pub coupling: CouplingConfig,
}

fn in_unit(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

fn check_sensor(name: &str, sensor: &SensorConfig) -> anyhow::Result<()> {
    anyhow::ensure!(
        sensor.decay_coef >= 0.0,
        "{name} decay coefficient must be non-negative"
    );
    anyhow::ensure!(
        sensor.output_range[0] < sensor.output_range[1],
        "{name} output range must be increasing"
    );
    anyhow::ensure!(
        sensor.gains.values().chain([&sensor.default_gain]).all(|g| g.is_finite()),
        "{name} gains must be finite"
    );
    Ok(())
}

impl SimConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` describing the
    /// first validation failure. Species-level consistency (half-saturation,
    /// filtering rate) is checked when the energetics engine is built.
    pub fn validate(&self) -> anyhow::Result<()> {
        let sim = &self.simulation;
        anyhow::ensure!(sim.dt > 0.0, "Host dt must be positive");
        anyhow::ensure!(
            sim.arena.iter().all(|d| *d > 0.0),
            "Arena dimensions must be positive"
        );
        anyhow::ensure!(sim.duration >= 0.0, "Duration must be non-negative");

        let deb = &self.energetics;
        anyhow::ensure!(deb.dt > 0.0, "Energetics dt must be positive");
        anyhow::ensure!(deb.temperature > 0.0, "Temperature must be positive (K)");
        anyhow::ensure!(deb.eb > 0.0 && deb.eb <= 1.0, "eb must be in (0, 1]");
        anyhow::ensure!(in_unit(deb.hunger_gain), "Hunger gain must be in [0.0, 1.0]");
        anyhow::ensure!(in_unit(deb.base_hunger), "Base hunger must be in [0.0, 1.0]");
        anyhow::ensure!(deb.bite_volume > 0.0, "Bite volume must be positive");
        anyhow::ensure!(deb.f_decay >= 0.0, "f decay must be non-negative");
        anyhow::ensure!(in_unit(deb.f_increment), "f increment must be in [0.0, 1.0]");
        anyhow::ensure!(deb.max_stage_steps > 0, "Stage step budget must be positive");
        anyhow::ensure!(
            deb.use_gut || deb.assimilation_mode != AssimilationMode::Gut,
            "Gut assimilation mode requires use_gut"
        );
        crate::deb::runner::rate_ratio(deb.dt, sim.dt)
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        anyhow::ensure!(
            in_unit(self.substrate.quality),
            "Substrate quality must be in [0.0, 1.0]"
        );

        let gut = &self.gut;
        anyhow::ensure!(gut.residence_minutes > 0.0, "Gut residence time must be positive");
        anyhow::ensure!(gut.k_abs > 0.0, "Gut absorption rate must be positive");
        anyhow::ensure!(gut.capacity > 0.0, "Gut capacity must be positive");

        let brain = &self.brain;
        if let Some(s) = &brain.olfactor {
            check_sensor("Olfactor", s)?;
        }
        if let Some(t) = &brain.toucher {
            check_sensor("Toucher", &t.sensor)?;
            anyhow::ensure!(!t.points.is_empty(), "Toucher needs at least one contact point");
        }
        if let Some(s) = &brain.thermosensor {
            check_sensor("Thermosensor", s)?;
        }
        if let Some(s) = &brain.windsensor {
            check_sensor("Windsensor", s)?;
        }
        if let Some(m) = &brain.memory {
            anyhow::ensure!(in_unit(m.learning_rate), "Memory learning rate must be in [0.0, 1.0]");
            anyhow::ensure!(in_unit(m.relaxation), "Memory relaxation must be in [0.0, 1.0]");
            anyhow::ensure!(m.gain_max.is_finite(), "Memory gain_max must be finite");
        }

        let loco = &self.locomotor;
        anyhow::ensure!(loco.body_length > 0.0, "Body length must be positive");
        if let Some(c) = &loco.crawler {
            anyhow::ensure!(c.freq > 0.0, "Crawler frequency must be positive");
            anyhow::ensure!(c.stride_dst_mean >= 0.0, "Stride distance must be non-negative");
        }
        if let Some(t) = &loco.turner {
            anyhow::ensure!(t.freq > 0.0, "Turner frequency must be positive");
            anyhow::ensure!(
                t.activation_range[0] <= t.activation_range[1],
                "Turner activation range must be increasing"
            );
        }
        if let Some(f) = &loco.feeder {
            anyhow::ensure!(f.freq > 0.0, "Feeder frequency must be positive");
        }
        if let Some(i) = &loco.intermitter {
            anyhow::ensure!(in_unit(i.pause_probability), "Pause probability must be in [0.0, 1.0]");
            anyhow::ensure!(i.pause_duration >= 0.0, "Pause duration must be non-negative");
            anyhow::ensure!(in_unit(i.eeb), "EEB must be in [0.0, 1.0]");
        }

        let c = &self.coupling;
        anyhow::ensure!(in_unit(c.attenuation), "Attenuation must be in [0.0, 1.0]");
        anyhow::ensure!(in_unit(c.attenuation_max), "Attenuation max must be in [0.0, 1.0]");
        anyhow::ensure!(
            c.crawler_phi_range[0] <= c.crawler_phi_range[1]
                && c.feeder_phi_range[0] <= c.feeder_phi_range[1],
            "Phase ranges must be increasing"
        );
        crate::coupling::CouplingPolicy::from_config(c).map_err(|e| anyhow::anyhow!("{e}"))?;

        Ok(())
    }

    /// Parses and validates a TOML document; missing keys take default values.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file, falling back to defaults when it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Rejected configuration");
            e
        })
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Hash of every behaviour-relevant section; equal fingerprints imply equal trajectories.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.simulation).as_bytes());
        hasher.update(format!("{:?}", self.energetics).as_bytes());
        hasher.update(format!("{:?}", self.substrate).as_bytes());
        hasher.update(format!("{:?}", self.gut).as_bytes());
        hasher.update(format!("{:?}", self.brain).as_bytes());
        hasher.update(format!("{:?}", self.locomotor).as_bytes());
        hasher.update(format!("{:?}", self.coupling).as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn flatten_into(prefix: &str, value: serde_json::Value, out: &mut BTreeMap<String, serde_json::Value>) {
    match value {
        serde_json::Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&path, child, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other);
        }
    }
}

/// Flattens a configuration into dotted keys, e.g. `energetics.hunger_gain`.
pub fn flatten(config: &SimConfig) -> anyhow::Result<BTreeMap<String, serde_json::Value>> {
    let mut out = BTreeMap::new();
    flatten_into("", serde_json::to_value(config)?, &mut out);
    Ok(out)
}

/// Rebuilds a configuration from dotted keys. Missing keys take default values.
pub fn expand(flat: &BTreeMap<String, serde_json::Value>) -> anyhow::Result<SimConfig> {
    let mut root = serde_json::Map::new();
    for (path, value) in flat {
        let mut node = &mut root;
        let mut parts = path.split('.').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                node.insert(part.to_string(), value.clone());
                break;
            }
            let child = node
                .entry(part.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            node = child
                .as_object_mut()
                .ok_or_else(|| anyhow::anyhow!("key '{path}' descends into a scalar"))?;
        }
    }
    Ok(serde_json::from_value(serde_json::Value::Object(root))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_host_dt() {
        let config = SimConfig {
            simulation: SimulationConfig {
                dt: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_integer_rate_ratio_rejected() {
        let config = SimConfig {
            simulation: SimulationConfig {
                dt: 0.7,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_hunger_gain() {
        let config = SimConfig {
            energetics: EnergeticsConfig {
                hunger_gain: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_coupling_mode() {
        let config = SimConfig {
            coupling: CouplingConfig {
                mode: "telepathic".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gut_mode_without_gut() {
        let config = SimConfig {
            energetics: EnergeticsConfig {
                use_gut: false,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let config = SimConfig::from_toml(
            r#"
            [energetics]
            phenotype = "sitter"
            hunger_gain = 0.5

            [substrate]
            kind = "cornmeal"
            quality = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.energetics.phenotype, Phenotype::Sitter);
        assert_eq!(config.energetics.hunger_gain, 0.5);
        assert_eq!(config.energetics.dt, 60.0);
        assert_eq!(config.substrate.quality, 0.5);
    }

    #[test]
    fn test_flatten_expand_roundtrip() {
        let mut config = SimConfig::default();
        config.energetics.hunger_gain = 0.3;
        config.brain.windsensor = Some(SensorConfig::windsensor());
        let flat = flatten(&config).unwrap();
        assert_eq!(flat["energetics.hunger_gain"], serde_json::json!(0.3));
        assert_eq!(expand(&flat).unwrap(), config);
    }

    #[test]
    fn test_expand_partial_keys() {
        let mut flat = BTreeMap::new();
        flat.insert("coupling.attenuation".to_string(), serde_json::json!(0.2));
        let config = expand(&flat).unwrap();
        assert_eq!(config.coupling.attenuation, 0.2);
        assert_eq!(config.coupling.mode, "phasic");
    }

    #[test]
    fn test_fingerprint_consistency() {
        let config1 = SimConfig::default();
        let mut config2 = SimConfig::default();
        assert_eq!(config1.fingerprint(), config2.fingerprint());
        config2.energetics.hunger_gain = 0.9;
        assert_ne!(config1.fingerprint(), config2.fingerprint());
    }
}
