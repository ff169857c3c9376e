//! Per-tick energy fluxes of the standard energy-budget model.
//!
//! All fluxes are energies per engine tick (J); the rate constants come
//! pre-multiplied by the tick length from [`ScaledRates`].

use super::rates::ScaledRates;
use larvasim_data::{EnergeticState, SpeciesParameters};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fluxes {
    /// Assimilation.
    pub p_a: f64,
    /// Somatic maintenance.
    pub p_s: f64,
    /// Mobilisation.
    pub p_c: f64,
    /// Growth.
    pub p_g: f64,
    /// Maturity maintenance.
    pub p_j: f64,
    /// Maturation or reproduction.
    pub p_r: f64,
}

/// Reserve mobilisation for reserve `e`, structure `v` and turnover `k_e_dt`.
#[must_use]
pub fn mobilisation(e: f64, v: f64, k_e_dt: f64, p_s: f64, sp: &SpeciesParameters) -> f64 {
    e * (sp.e_g * k_e_dt + p_s / v) / (sp.kap * e / v + sp.e_g)
}

fn kappa_rule(p_a: f64, p_s: f64, p_c: f64, p_j: f64, kap: f64) -> Fluxes {
    Fluxes {
        p_a,
        p_s,
        p_c,
        p_g: kap * p_c - p_s,
        p_j,
        p_r: (1.0 - kap) * p_c - p_j,
    }
}

/// Embryo: no assimilation, reserve turnover `v / L`, maturation.
pub fn embryo_step(state: &mut EnergeticState, sp: &SpeciesParameters, rates: &ScaledRates) -> Fluxes {
    let v = state.structure;
    let p_s = rates.p_m_dt * v + rates.p_t_dt * v.powf(2.0 / 3.0);
    let p_c = mobilisation(state.reserve, v, rates.v_dt / v.cbrt(), p_s, sp);
    let fluxes = kappa_rule(0.0, p_s, p_c, rates.k_j_dt * state.maturity, sp.kap);

    state.reserve -= fluxes.p_c;
    state.structure += fluxes.p_g / sp.e_g;
    state.maturity += fluxes.p_r;
    state.age_days += rates.dt_days;
    fluxes
}

/// Larva: volume-specific assimilation `p_a`, maturity frozen at birth, buffer filling.
pub fn larva_step(
    state: &mut EnergeticState,
    p_a: f64,
    sp: &SpeciesParameters,
    rates: &ScaledRates,
) -> Fluxes {
    let v = state.structure;
    let p_s = rates.p_m_dt * v;
    let p_c = mobilisation(state.reserve, v, rates.k_e_dt, p_s, sp);
    let fluxes = kappa_rule(p_a, p_s, p_c, rates.k_j_dt * sp.e_hb, sp.kap);

    state.reserve += fluxes.p_a - fluxes.p_c;
    state.structure += fluxes.p_g / sp.e_g;
    state.reproduction_buffer += fluxes.p_r;
    fluxes
}

/// Imago: structure is fixed, so everything mobilised beyond maintenance goes to the buffer.
pub fn imago_step(
    state: &mut EnergeticState,
    p_a: f64,
    sp: &SpeciesParameters,
    rates: &ScaledRates,
) -> Fluxes {
    let v = state.structure;
    let l = v.cbrt();
    let p_s = rates.p_m_dt * v + rates.p_t_dt * l * l;
    let p_c = mobilisation(state.reserve, v, rates.v_dt / l, p_s, sp);
    let p_j = rates.k_j_dt * sp.e_he;
    let fluxes = Fluxes {
        p_a,
        p_s,
        p_c,
        p_g: 0.0,
        p_j,
        p_r: p_c - p_s - p_j,
    };

    state.reserve += fluxes.p_a - fluxes.p_c;
    state.reproduction_buffer = (state.reproduction_buffer + fluxes.p_r).max(0.0);
    fluxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deb::rates::{DerivedParameters, L0};

    fn setup() -> (SpeciesParameters, DerivedParameters, ScaledRates) {
        let sp = SpeciesParameters::default();
        let d = DerivedParameters::derive(&sp, 298.15).unwrap();
        let rates = ScaledRates::new(&sp, &d, 60.0).unwrap();
        (sp, d, rates)
    }

    #[test]
    fn test_embryo_step_conserves_mobilised_energy() {
        let (sp, _, rates) = setup();
        // Mid-embryo, so the mobilised energy is resolvable against the reserve.
        let mut state = EnergeticState {
            reserve: 1e-3,
            structure: 1e-7,
            ..EnergeticState::egg(0.0, L0)
        };
        let before = state.clone();
        let fl = embryo_step(&mut state, &sp, &rates);
        let growth_energy = (state.structure - before.structure) * sp.e_g;
        let spent = fl.p_s + fl.p_j + growth_energy + (state.maturity - before.maturity);
        assert!((spent - fl.p_c).abs() < 1e-12);
        assert!(state.reserve < before.reserve);
        assert!(state.structure > before.structure);
        assert!(state.age_days > 0.0);
    }

    #[test]
    fn test_larva_fed_grows_and_fills_buffer() {
        let (sp, d, mut rates) = setup();
        rates.enter_larva(&sp, &d, 0.015);
        let v = 0.015_f64.powi(3);
        let mut state = EnergeticState {
            reserve: d.e_m * v,
            structure: v,
            maturity: sp.e_hb,
            ..EnergeticState::egg(0.0, L0)
        };
        let p_a = rates.p_amm_dt * v;
        let fl = larva_step(&mut state, p_a, &sp, &rates);
        assert!(fl.p_g > 0.0);
        assert!(state.structure > v);
        assert!(state.reproduction_buffer > 0.0);
    }

    #[test]
    fn test_larva_unfed_loses_reserve() {
        let (sp, d, mut rates) = setup();
        rates.enter_larva(&sp, &d, 0.015);
        let v = 0.02_f64.powi(3);
        let mut state = EnergeticState {
            reserve: 0.5 * d.e_m * v,
            structure: v,
            ..EnergeticState::egg(0.0, L0)
        };
        larva_step(&mut state, 0.0, &sp, &rates);
        assert!(state.reserve < 0.5 * d.e_m * v);
    }

    #[test]
    fn test_imago_does_not_grow() {
        let (sp, d, rates) = setup();
        let v = 0.05_f64.powi(3);
        let mut state = EnergeticState {
            reserve: d.e_m * v,
            structure: v,
            maturity: sp.e_he,
            ..EnergeticState::egg(0.0, L0)
        };
        let fl = imago_step(&mut state, rates.p_am_dt * 0.05 * 0.05, &sp, &rates);
        assert_eq!(state.structure, v);
        assert_eq!(fl.p_g, 0.0);
        assert!(state.reproduction_buffer >= 0.0);
    }
}
