use serde::{Deserialize, Serialize};

/// Rearing substrate types with a known composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstrateKind {
    #[default]
    Standard,
    Agar,
    Sucrose,
    Cornmeal,
    PedTracker,
}

/// A substrate and its quality, the fraction of nominal nutrient content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstrateSpec {
    pub kind: SubstrateKind,
    pub quality: f64,
}

impl Default for SubstrateSpec {
    fn default() -> Self {
        Self {
            kind: SubstrateKind::Standard,
            quality: 1.0,
        }
    }
}

/// A rearing interval in hours since birth.
///
/// An open `end` means the epoch lasts until pupation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    pub start: f64,
    pub end: Option<f64>,
    pub substrate: SubstrateSpec,
}

impl Epoch {
    #[must_use]
    pub fn new(start: f64, end: Option<f64>, substrate: SubstrateSpec) -> Self {
        Self {
            start,
            end,
            substrate,
        }
    }

    /// Number of ticks of `dt_days` covered by the epoch, `None` when open-ended.
    #[must_use]
    pub fn ticks(&self, dt_days: f64) -> Option<u64> {
        self.end
            .map(|end| ((end - self.start) / 24.0 / dt_days).round().max(0.0) as u64)
    }
}

/// Feeding history replayed before the simulation starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifeHistory {
    pub epochs: Vec<Epoch>,
}

impl LifeHistory {
    /// A single open-ended epoch on one substrate, reared until pupation.
    #[must_use]
    pub fn until_pupation(substrate: SubstrateSpec) -> Self {
        Self {
            epochs: vec![Epoch::new(0.0, None, substrate)],
        }
    }

    /// Checks that epochs are ordered, non-overlapping and that only the last may be open.
    pub fn check(&self) -> Result<(), String> {
        let mut last_end = 0.0_f64;
        for (i, epoch) in self.epochs.iter().enumerate() {
            if !epoch.start.is_finite() || epoch.start < 0.0 {
                return Err(format!("epoch {i} starts at invalid time {}", epoch.start));
            }
            if epoch.start < last_end {
                return Err(format!(
                    "epoch {i} starts at {} h before previous epoch ends at {last_end} h",
                    epoch.start
                ));
            }
            if !(0.0..=1.0).contains(&epoch.substrate.quality) {
                return Err(format!(
                    "epoch {i} substrate quality {} outside [0, 1]",
                    epoch.substrate.quality
                ));
            }
            match epoch.end {
                Some(end) if end <= epoch.start => {
                    return Err(format!("epoch {i} ends at {end} h, not after its start"));
                }
                Some(end) => last_end = end,
                None if i + 1 != self.epochs.len() => {
                    return Err(format!("open-ended epoch {i} is not the last one"));
                }
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_epochs_rejected() {
        let history = LifeHistory {
            epochs: vec![
                Epoch::new(0.0, Some(10.0), SubstrateSpec::default()),
                Epoch::new(5.0, Some(20.0), SubstrateSpec::default()),
            ],
        };
        assert!(history.check().is_err());
    }

    #[test]
    fn test_open_epoch_must_be_last() {
        let history = LifeHistory {
            epochs: vec![
                Epoch::new(0.0, None, SubstrateSpec::default()),
                Epoch::new(5.0, Some(20.0), SubstrateSpec::default()),
            ],
        };
        assert!(history.check().is_err());
    }

    #[test]
    fn test_epoch_ticks() {
        let epoch = Epoch::new(0.0, Some(24.0), SubstrateSpec::default());
        assert_eq!(epoch.ticks(1.0 / 1440.0), Some(1440));
        assert_eq!(Epoch::new(0.0, None, SubstrateSpec::default()).ticks(0.1), None);
    }
}
