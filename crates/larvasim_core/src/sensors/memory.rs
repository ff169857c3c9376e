use crate::config::MemoryConfig;
use larvasim_data::Stimulus;
use std::collections::BTreeMap;

/// Reward-driven adaptation of a sensor's gains.
///
/// With reward, each gain moves toward `gain_max` scaled by how strongly its
/// stimulus is currently present; without reward it relaxes back to the gain
/// it had when first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociativeMemory {
    learning_rate: f64,
    relaxation: f64,
    gain_max: f64,
    baseline: BTreeMap<String, f64>,
    rewarded_ticks: u64,
}

impl AssociativeMemory {
    #[must_use]
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            relaxation: config.relaxation,
            gain_max: config.gain_max,
            baseline: BTreeMap::new(),
            rewarded_ticks: 0,
        }
    }

    /// Adapts `gains` after a tick in which `stimulus` was sensed.
    pub fn update(&mut self, gains: &mut BTreeMap<String, f64>, stimulus: &Stimulus, reward: bool) {
        if reward {
            self.rewarded_ticks += 1;
        }
        for (id, gain) in gains.iter_mut() {
            let baseline = *self.baseline.entry(id.clone()).or_insert(*gain);
            if reward {
                let x = stimulus.get(id).copied().unwrap_or(0.0).clamp(0.0, 1.0);
                *gain += self.learning_rate * (self.gain_max * x - *gain);
            } else {
                *gain += self.relaxation * (baseline - *gain);
            }
        }
    }

    #[must_use]
    pub fn baseline(&self) -> &BTreeMap<String, f64> {
        &self.baseline
    }

    #[must_use]
    pub fn rewarded_ticks(&self) -> u64 {
        self.rewarded_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains(g: f64) -> BTreeMap<String, f64> {
        BTreeMap::from([("Odor".to_string(), g)])
    }

    #[test]
    fn test_reward_pulls_gain_toward_stimulus() {
        let mut mem = AssociativeMemory::new(&MemoryConfig::default());
        let mut g = gains(100.0);
        let stim = Stimulus::from([("Odor".to_string(), 1.0)]);
        for _ in 0..500 {
            mem.update(&mut g, &stim, true);
        }
        assert!((g["Odor"] - 300.0).abs() < 1.0);
        assert_eq!(mem.rewarded_ticks(), 500);
    }

    #[test]
    fn test_no_reward_relaxes_to_baseline() {
        let mut mem = AssociativeMemory::new(&MemoryConfig::default());
        let mut g = gains(100.0);
        let stim = Stimulus::from([("Odor".to_string(), 1.0)]);
        mem.update(&mut g, &stim, true);
        assert!(g["Odor"] > 100.0);
        for _ in 0..5000 {
            mem.update(&mut g, &stim, false);
        }
        assert!((g["Odor"] - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_absent_stimulus_unlearns_under_reward() {
        let mut mem = AssociativeMemory::new(&MemoryConfig::default());
        let mut g = gains(100.0);
        mem.update(&mut g, &Stimulus::new(), true);
        assert!(g["Odor"] < 100.0);
    }
}
