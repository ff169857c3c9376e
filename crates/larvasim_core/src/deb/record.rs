//! Append-only trace of the engine's public scalars.

use chrono::{DateTime, Utc};
use larvasim_data::Stage;
use serde::{Deserialize, Serialize};

/// One row per engine tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    pub age_hours: f64,
    pub stage: Stage,
    /// Wet mass, mg.
    pub mass_mg: f64,
    /// Physical length, mm.
    pub length_mm: f64,
    pub reserve: f64,
    pub reserve_density: f64,
    pub hunger: f64,
    pub pupation_buffer: f64,
    pub f: f64,
    /// Assimilation at the baseline food level, per unit structure.
    pub deb_p_a: f64,
    /// Assimilation at the supplied food level, per unit structure.
    pub sim_p_a: f64,
}

/// Stage-transition timestamps in hours since the egg was laid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub birth: Option<f64>,
    pub pupation: Option<f64>,
    pub emergence: Option<f64>,
    pub death: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergeticsRecord {
    rows: Vec<TraceRow>,
}

impl EnergeticsRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: TraceRow) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn rows(&self) -> &[TraceRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mean of the recorded functional response, `None` before the first row.
    #[must_use]
    pub fn f_mean(&self) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        Some(self.rows.iter().map(|r| r.f).sum::<f64>() / self.rows.len() as f64)
    }
}

/// Gut counters at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GutSummary {
    pub feeds: u64,
    /// Feeds per second of post-birth life.
    pub mean_feed_freq: f64,
    pub residence_minutes: f64,
    /// Ingested volume, cm³.
    pub ingested_volume: f64,
    /// Absorbed food, mol.
    pub absorbed_mol: f64,
}

/// A trace closed with its summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRecord {
    pub id: String,
    pub finalized_at: DateTime<Utc>,
    pub timeline: Timeline,
    pub hours_as_larva: f64,
    pub sim_start: f64,
    /// Replayed epochs in hours since the egg was laid.
    pub epochs: Vec<[f64; 2]>,
    pub epoch_qualities: Vec<f64>,
    /// Engine tick rate, Hz.
    pub tick_rate: f64,
    /// Feeding frequency sustaining the baseline food level, Hz.
    pub feed_freq_estimate: f64,
    pub f_mean: f64,
    pub f_deviation_mean: f64,
    pub gut: Option<GutSummary>,
    pub rows: Vec<TraceRow>,
}
