use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fitted phenotype the species parameters are taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phenotype {
    #[default]
    Default,
    /// Foraging-gene variant with longer foraging trails.
    Rover,
    /// Foraging-gene variant that stays on the food patch.
    Sitter,
}

impl FromStr for Phenotype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Phenotype::Default),
            "rover" => Ok(Phenotype::Rover),
            "sitter" => Ok(Phenotype::Sitter),
            other => Err(format!("unknown phenotype '{other}'")),
        }
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phenotype::Default => "default",
            Phenotype::Rover => "rover",
            Phenotype::Sitter => "sitter",
        };
        f.write_str(name)
    }
}

/// Primary energy-budget parameters of a species at the reference temperature.
///
/// Units follow the usual DEB conventions: energies in J, lengths in cm,
/// time in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParameters {
    /// Reference temperature (K).
    pub t_ref: f64,
    /// Arrhenius temperature (K).
    pub t_a: f64,
    /// Zoom factor; the maximum structural length in cm.
    pub z: f64,
    /// Surface-specific searching (filtering) rate, l/d.cm².
    pub f_m: f64,
    /// Digestion efficiency of food to reserve.
    pub kap_x: f64,
    /// Energy conductance, cm/d.
    pub v: f64,
    /// Allocation fraction to soma.
    pub kap: f64,
    /// Reproduction efficiency.
    pub kap_r: f64,
    /// Fraction of larval structure recycled into pupal reserve.
    pub kap_v: f64,
    /// Volume-specific somatic maintenance, J/d.cm³.
    pub p_m: f64,
    /// Surface-specific somatic maintenance, J/d.cm².
    pub p_t: f64,
    /// Maturity maintenance rate coefficient, 1/d.
    pub k_j: f64,
    /// Specific cost for structure, J/cm³.
    pub e_g: f64,
    /// Maturity at birth, J.
    pub e_hb: f64,
    /// Maturity at emergence, J.
    pub e_he: f64,
    /// Reproduction buffer density at pupation relative to its maximum.
    pub s_j: f64,
    /// Yield of reserve on food, mol/mol.
    pub y_e_x: f64,
    /// Chemical potential of reserve, J/mol.
    pub mu_e: f64,
    /// Chemical potential of structure, J/mol.
    pub mu_v: f64,
    /// Specific density of structure, g/cm³.
    pub d_v: f64,
    /// Specific density of reserve, g/cm³.
    pub d_e: f64,
    /// Molecular weight of structure, g/mol.
    pub w_v: f64,
    /// Molecular weight of reserve, g/mol.
    pub w_e: f64,
    /// Shape coefficient converting structural to physical length.
    pub del_m: f64,
}

impl Default for SpeciesParameters {
    fn default() -> Self {
        Self::preset(Phenotype::Default)
    }
}

impl SpeciesParameters {
    /// Parameter table of a fitted phenotype.
    #[must_use]
    pub fn preset(phenotype: Phenotype) -> Self {
        let base = Self {
            t_ref: 293.15,
            t_a: 8000.0,
            z: 0.25,
            f_m: 6.5,
            kap_x: 0.8,
            v: 0.03,
            kap: 0.8,
            kap_r: 0.95,
            kap_v: 0.9,
            p_m: 1500.0,
            p_t: 0.0,
            k_j: 0.002,
            e_g: 4400.0,
            e_hb: 4.0e-3,
            e_he: 0.2,
            s_j: 0.999,
            y_e_x: 0.8,
            mu_e: 550_000.0,
            mu_v: 500_000.0,
            d_v: 0.3,
            d_e: 0.3,
            w_v: 23.9,
            w_e: 23.9,
            del_m: 0.25,
        };
        match phenotype {
            Phenotype::Default => base,
            Phenotype::Rover => Self {
                f_m: 7.5,
                p_m: 1600.0,
                ..base
            },
            Phenotype::Sitter => Self {
                f_m: 5.5,
                p_m: 1400.0,
                ..base
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phenotype_parses_case_insensitively() {
        assert_eq!("Rover".parse::<Phenotype>(), Ok(Phenotype::Rover));
        assert!("beetle".parse::<Phenotype>().is_err());
    }

    #[test]
    fn test_presets_differ_only_in_feeding_traits() {
        let d = SpeciesParameters::preset(Phenotype::Default);
        let r = SpeciesParameters::preset(Phenotype::Rover);
        assert_ne!(d.f_m, r.f_m);
        assert_eq!(d.e_hb, r.e_hb);
        assert_eq!(d.z, r.z);
    }
}
