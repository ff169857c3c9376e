//! Compound parameters derived from a species table, and their per-tick scaling.

use crate::error::{LifeError, Result};
use larvasim_data::SpeciesParameters;

/// Structural length of a freshly laid egg, cm.
pub const L0: f64 = 1e-10;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Compound parameters at the reference temperature plus the Arrhenius factor.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedParameters {
    /// Maximum surface-specific assimilation rate, J/d.cm².
    pub p_am: f64,
    pub j_e_am: f64,
    pub j_x_am: f64,
    pub p_xm: f64,
    /// Half-saturation food density.
    pub half_saturation: f64,
    /// Maximum reserve density, J/cm³.
    pub e_m: f64,
    pub e_v: f64,
    pub k_m: f64,
    /// Energy investment ratio.
    pub g: f64,
    /// Maintenance ratio `k_J / k_M`.
    pub k: f64,
    /// Scaled maturity at birth.
    pub v_hb: f64,
    /// Scaled maturity at emergence.
    pub v_he: f64,
    /// Maximum structural length, cm.
    pub lm: f64,
    pub t_factor: f64,
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(LifeError::configuration(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn fraction(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(LifeError::configuration(format!(
            "{name} must lie in (0, 1), got {value}"
        )))
    }
}

impl DerivedParameters {
    /// Derives the compound parameters for body temperature `temperature` (K).
    pub fn derive(sp: &SpeciesParameters, temperature: f64) -> Result<Self> {
        positive("temperature", temperature)?;
        positive("reference temperature", sp.t_ref)?;
        positive("zoom factor", sp.z)?;
        positive("filtering rate F_m", sp.f_m)?;
        positive("energy conductance", sp.v)?;
        positive("somatic maintenance", sp.p_m)?;
        positive("cost for structure", sp.e_g)?;
        positive("maturity at birth", sp.e_hb)?;
        positive("reserve yield on food", sp.y_e_x)?;
        positive("reserve chemical potential", sp.mu_e)?;
        positive("structure density", sp.d_v)?;
        positive("shape coefficient", sp.del_m)?;
        fraction("kappa", sp.kap)?;
        fraction("kappa_V", sp.kap_v)?;
        if sp.k_j < 0.0 || sp.p_t < 0.0 {
            return Err(LifeError::configuration("maintenance rates must be non-negative"));
        }
        if sp.e_he <= sp.e_hb {
            return Err(LifeError::configuration(format!(
                "maturity at emergence ({}) must exceed maturity at birth ({})",
                sp.e_he, sp.e_hb
            )));
        }
        if !(sp.s_j > 0.0 && sp.s_j <= 1.0) {
            return Err(LifeError::configuration("s_j must lie in (0, 1]"));
        }

        let p_am = sp.z * sp.p_m / sp.kap;
        let j_e_am = p_am / sp.mu_e;
        let j_x_am = j_e_am / sp.y_e_x;
        let half_saturation = j_x_am / sp.f_m;
        positive("half-saturation constant", half_saturation)?;

        let e_m = p_am / sp.v;
        let k_m = sp.p_m / sp.e_g;
        let g = sp.e_g / (sp.kap * e_m);
        let scale = g.powi(2) * k_m.powi(3) / ((1.0 - sp.kap) * sp.v.powi(2));

        Ok(Self {
            p_am,
            j_e_am,
            j_x_am,
            p_xm: p_am / sp.kap_x,
            half_saturation,
            e_m,
            e_v: sp.mu_v * sp.d_v / sp.w_v,
            k_m,
            g,
            k: sp.k_j / k_m,
            v_hb: sp.e_hb / p_am * scale,
            v_he: sp.e_he / p_am * scale,
            lm: sp.v / (g * k_m),
            t_factor: (sp.t_a / sp.t_ref - sp.t_a / temperature).exp(),
        })
    }

    /// Converts a scaled reserve `u_E` back to energy, J.
    #[must_use]
    pub fn reserve_from_scaled(&self, sp: &SpeciesParameters, u_e: f64) -> f64 {
        u_e * sp.v.powi(2) / self.g.powi(2) / self.k_m.powi(3) * self.p_am
    }
}

/// Rate constants multiplied by one engine tick, temperature corrected.
///
/// The assimilation and reserve-turnover terms depend on the current stage:
/// surface-specific in the embryo and imago, volume-specific (relative to the
/// length at birth) during the larva stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledRates {
    /// Tick length, d.
    pub dt_days: f64,
    /// Tick length in physiological time, d.
    pub dt_eff: f64,
    pub p_m_dt: f64,
    pub p_t_dt: f64,
    pub v_dt: f64,
    pub k_j_dt: f64,
    pub f_m_dt: f64,
    pub p_am_dt: f64,
    /// Volume-specific maximum assimilation, set at birth.
    pub p_amm_dt: f64,
    /// Reserve turnover `v / L_b`, set at birth.
    pub k_e_dt: f64,
    /// Length at birth used for the volume-specific terms, cm.
    pub lb: Option<f64>,
}

impl ScaledRates {
    pub fn new(sp: &SpeciesParameters, derived: &DerivedParameters, dt_seconds: f64) -> Result<Self> {
        positive("engine dt", dt_seconds)?;
        let dt_days = dt_seconds / SECONDS_PER_DAY;
        let dt_eff = dt_days * derived.t_factor;
        Ok(Self {
            dt_days,
            dt_eff,
            p_m_dt: sp.p_m * dt_eff,
            p_t_dt: sp.p_t * dt_eff,
            v_dt: sp.v * dt_eff,
            k_j_dt: sp.k_j * dt_eff,
            f_m_dt: sp.f_m * dt_eff,
            p_am_dt: derived.p_am * dt_eff,
            p_amm_dt: 0.0,
            k_e_dt: 0.0,
            lb: None,
        })
    }

    /// Switches assimilation and turnover to the volume-specific larval form.
    pub fn enter_larva(&mut self, sp: &SpeciesParameters, derived: &DerivedParameters, lb: f64) {
        self.lb = Some(lb);
        self.k_e_dt = sp.v / lb * self.dt_eff;
        self.p_amm_dt = derived.p_am / lb * self.dt_eff;
    }

    /// Tick length in seconds.
    #[must_use]
    pub fn dt_seconds(&self) -> f64 {
        self.dt_days * SECONDS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derived() -> DerivedParameters {
        DerivedParameters::derive(&SpeciesParameters::default(), 298.15).unwrap()
    }

    #[test]
    fn test_maximum_length_equals_zoom() {
        let d = derived();
        assert!((d.lm - SpeciesParameters::default().z).abs() < 1e-12);
    }

    #[test]
    fn test_default_half_saturation() {
        let d = derived();
        assert!((d.half_saturation - 1.64e-4).abs() < 1e-6, "K = {}", d.half_saturation);
    }

    #[test]
    fn test_arrhenius_factor_is_one_at_reference() {
        let sp = SpeciesParameters::default();
        let d = DerivedParameters::derive(&sp, sp.t_ref).unwrap();
        assert!((d.t_factor - 1.0).abs() < 1e-12);
        assert!(derived().t_factor > 1.0);
    }

    #[test]
    fn test_zero_filtering_rate_rejected() {
        let sp = SpeciesParameters {
            f_m: 0.0,
            ..Default::default()
        };
        let err = DerivedParameters::derive(&sp, 298.15).unwrap_err();
        assert!(matches!(err, LifeError::Configuration(_)));
    }

    #[test]
    fn test_maturity_thresholds_ordered() {
        let sp = SpeciesParameters {
            e_he: 1e-3,
            ..Default::default()
        };
        assert!(DerivedParameters::derive(&sp, 298.15).is_err());
        let d = derived();
        assert!(d.v_hb < d.v_he);
    }

    #[test]
    fn test_scaled_rates_switch_at_birth() {
        let sp = SpeciesParameters::default();
        let d = derived();
        let mut rates = ScaledRates::new(&sp, &d, 60.0).unwrap();
        assert_eq!(rates.p_amm_dt, 0.0);
        rates.enter_larva(&sp, &d, 0.015);
        assert!((rates.p_amm_dt - d.p_am / 0.015 * rates.dt_eff).abs() < 1e-12);
        assert!((rates.dt_seconds() - 60.0).abs() < 1e-9);
    }
}
