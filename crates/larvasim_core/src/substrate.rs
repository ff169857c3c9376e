//! Food substrates and their functional response.

use crate::error::{LifeError, Result};
use larvasim_data::{SubstrateKind, SubstrateSpec};

/// Compounds found in rearing media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compound {
    Glucose,
    Dextrose,
    Saccharose,
    Yeast,
    Agar,
    Cornmeal,
}

impl Compound {
    /// Molecular weight, g/mol.
    #[must_use]
    pub fn molecular_weight(self) -> f64 {
        match self {
            Compound::Glucose => 180.18,
            Compound::Dextrose => 198.17,
            Compound::Saccharose => 342.30,
            Compound::Yeast => 274.3,
            Compound::Agar => 336.33,
            Compound::Cornmeal => 359.33,
        }
    }

    /// Agar only gives the medium its texture.
    #[must_use]
    pub fn is_nutritive(self) -> bool {
        !matches!(self, Compound::Agar)
    }
}

/// Compound densities (g/cm³) of a substrate type.
#[must_use]
pub fn composition(kind: SubstrateKind) -> Vec<(Compound, f64)> {
    match kind {
        SubstrateKind::Standard => vec![
            (Compound::Glucose, 0.1),
            (Compound::Yeast, 0.05),
            (Compound::Agar, 0.016),
        ],
        SubstrateKind::Agar => vec![(Compound::Agar, 0.016)],
        SubstrateKind::Sucrose => vec![(Compound::Saccharose, 0.0171), (Compound::Agar, 0.016)],
        SubstrateKind::Cornmeal => vec![
            (Compound::Glucose, 517.0 / 17000.0),
            (Compound::Dextrose, 1033.0 / 17000.0),
            (Compound::Cornmeal, 1716.0 / 17000.0),
            (Compound::Agar, 0.016),
        ],
        SubstrateKind::PedTracker => vec![
            (Compound::Saccharose, 0.01),
            (Compound::Yeast, 0.1875),
            (Compound::Agar, 0.005),
        ],
    }
}

/// A substrate of known composition scaled by its quality.
#[derive(Debug, Clone, PartialEq)]
pub struct Substrate {
    pub spec: SubstrateSpec,
}

impl Substrate {
    pub fn new(spec: SubstrateSpec) -> Result<Self> {
        if !(0.0..=1.0).contains(&spec.quality) {
            return Err(LifeError::configuration(format!(
                "substrate quality {} outside [0, 1]",
                spec.quality
            )));
        }
        Ok(Self { spec })
    }

    /// Food density `X`, mol/cm³.
    #[must_use]
    pub fn food_density(&self) -> f64 {
        let nutritive: f64 = composition(self.spec.kind)
            .into_iter()
            .filter(|(c, _)| c.is_nutritive())
            .map(|(c, d)| d / c.molecular_weight())
            .sum();
        self.spec.quality * nutritive
    }

    /// Holling type II functional response `X / (K + X)` for half-saturation `k`.
    #[must_use]
    pub fn functional_response(&self, k: f64) -> f64 {
        functional_response(self.food_density(), k)
    }
}

/// `x / (k + x)`, zero for an empty medium.
#[must_use]
pub fn functional_response(x: f64, k: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    (x / (k + x)).clamp(0.0, 1.0)
}
