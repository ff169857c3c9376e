use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Developmental stage of the organism.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
#[archive_attr(derive(Debug, PartialEq, Eq))]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Embryo,
    Larva,
    Pupa,
    Imago,
}

impl Stage {
    /// The stage that follows this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Embryo => Some(Stage::Larva),
            Stage::Larva => Some(Stage::Pupa),
            Stage::Pupa => Some(Stage::Imago),
            Stage::Imago => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Embryo => "embryo",
            Stage::Larva => "larva",
            Stage::Pupa => "pupa",
            Stage::Imago => "imago",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Energy-budget state of one organism.
///
/// Energies are in J, structural volume in cm³, age in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct EnergeticState {
    /// Reserve `E`.
    pub reserve: f64,
    /// Structural volume `V`.
    pub structure: f64,
    /// Cumulated investment in maturity `E_H`.
    pub maturity: f64,
    /// Reproduction buffer `E_R`; during the larva stage this is the pupation buffer.
    pub reproduction_buffer: f64,
    pub age_days: f64,
    pub stage: Stage,
    pub alive: bool,
}

impl EnergeticState {
    /// A freshly laid egg with reserve `e0` and structural length `l0`.
    #[must_use]
    pub fn egg(e0: f64, l0: f64) -> Self {
        Self {
            reserve: e0,
            structure: l0.powi(3),
            maturity: 0.0,
            reproduction_buffer: 0.0,
            age_days: 0.0,
            stage: Stage::Embryo,
            alive: true,
        }
    }

    /// Structural length `L = V^(1/3)`.
    #[must_use]
    pub fn structural_length(&self) -> f64 {
        self.structure.cbrt()
    }

    #[must_use]
    pub fn age_hours(&self) -> f64 {
        self.age_days * 24.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_forward_only() {
        let mut stage = Stage::Embryo;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![Stage::Embryo, Stage::Larva, Stage::Pupa, Stage::Imago]
        );
    }

    #[test]
    fn test_egg_has_minimal_structure() {
        let egg = EnergeticState::egg(0.07, 1e-10);
        assert_eq!(egg.stage, Stage::Embryo);
        assert!(egg.alive);
        assert!((egg.structural_length() - 1e-10).abs() < 1e-20);
    }
}
