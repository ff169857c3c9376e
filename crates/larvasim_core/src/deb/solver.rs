//! Stage-transition solvers.
//!
//! The engine receives a [`StageSolver`] at construction and delegates every
//! threshold search to it: egg calibration, the embryo integration to birth,
//! the larval prediction and the pupal ODE to emergence.

use super::flux::embryo_step;
use super::ode::{solve_until_event, OdeOptions};
use super::rates::{DerivedParameters, ScaledRates, L0};
use crate::error::{LifeError, Result};
use larvasim_data::{EnergeticState, SpeciesParameters};

/// Outcome of the forward embryo integration.
#[derive(Debug, Clone, PartialEq)]
pub struct Birth {
    pub steps: u64,
    /// Structural length at birth, cm.
    pub length: f64,
    /// Scaled reserve density at birth.
    pub reserve_density: f64,
}

/// Predicted larval development at a constant food level.
#[derive(Debug, Clone, PartialEq)]
pub struct LarvaPrediction {
    /// Scaled specific growth rate.
    pub rho: f64,
    pub tau_j: f64,
    /// Scaled length at pupation.
    pub lj: f64,
    pub t_j_days: f64,
    /// Maximum reproduction buffer, J.
    pub e_rm: f64,
    /// Buffer that triggers pupation, J.
    pub e_rj: f64,
    pub e_eggs: f64,
}

/// Result of integrating the pupal ODE to emergence.
#[derive(Debug, Clone, PartialEq)]
pub struct Emergence {
    pub tau_e: f64,
    /// Scaled length at emergence.
    pub le: f64,
    /// Scaled reserve at emergence.
    pub u_ee: f64,
    /// Pupal duration, d.
    pub t_e_days: f64,
}

/// Numerical strategy for the stage transitions.
pub trait StageSolver: std::fmt::Debug {
    /// Integrates an embryo state forward until maturity reaches birth.
    fn embryo(
        &self,
        state: &mut EnergeticState,
        sp: &SpeciesParameters,
        derived: &DerivedParameters,
        rates: &ScaledRates,
    ) -> Result<Birth>;

    /// Finds the egg reserve giving scaled reserve density `eb` at birth.
    fn calibrate_egg(
        &self,
        sp: &SpeciesParameters,
        derived: &DerivedParameters,
        rates: &ScaledRates,
        eb: f64,
    ) -> Result<f64>;

    /// Predicts pupation for scaled length at birth `lb` and food level `f`.
    fn larva(
        &self,
        sp: &SpeciesParameters,
        derived: &DerivedParameters,
        lb: f64,
        f: f64,
    ) -> Result<LarvaPrediction>;

    /// Integrates the pupa from scaled length `lj` and reserve density `e` at pupation.
    fn pupa(
        &self,
        sp: &SpeciesParameters,
        derived: &DerivedParameters,
        lj: f64,
        e: f64,
    ) -> Result<Emergence>;
}

/// Fixed-step forward integration from an egg to birth.
///
/// `observer` sees the state after every step. Exhausted reserve or structure,
/// or maturation coming to a halt, ends the integration as starvation; running
/// out of `max_steps` as non-convergence.
pub fn integrate_embryo<O: FnMut(&EnergeticState)>(
    state: &mut EnergeticState,
    sp: &SpeciesParameters,
    derived: &DerivedParameters,
    rates: &ScaledRates,
    max_steps: u64,
    mut observer: O,
) -> Result<Birth> {
    let mut steps = 0;
    while state.maturity < sp.e_hb {
        if steps >= max_steps {
            return Err(LifeError::non_convergence(
                "embryo integration",
                format!("maturity {:.3e} J below birth after {steps} steps", state.maturity),
            ));
        }
        let fluxes = embryo_step(state, sp, rates);
        steps += 1;
        if fluxes.p_r <= 0.0
            || state.reserve <= 0.0
            || state.structure <= L0.powi(3)
            || !state.reserve.is_finite()
        {
            return Err(LifeError::Starvation {
                age_hours: state.age_hours(),
            });
        }
        observer(state);
    }
    let length = state.structural_length();
    Ok(Birth {
        steps,
        length,
        reserve_density: state.reserve / state.structure / derived.e_m,
    })
}

/// The default solver: bounded bisection and bracket searches plus RK45.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericStageSolver {
    pub max_steps: u64,
    pub max_iterations: u32,
    pub ode: OdeOptions,
    /// Scaled time horizon of the pupal ODE.
    pub pupa_horizon: f64,
}

impl Default for NumericStageSolver {
    fn default() -> Self {
        Self {
            max_steps: 2_000_000,
            max_iterations: 200,
            ode: OdeOptions::default(),
            pupa_horizon: 1000.0,
        }
    }
}

impl NumericStageSolver {
    #[must_use]
    pub fn with_max_steps(max_steps: u64) -> Self {
        Self {
            max_steps,
            ..Self::default()
        }
    }

    /// Reserve density at birth for egg reserve `e0`, zero when the embryo starves.
    fn density_at_birth(
        &self,
        sp: &SpeciesParameters,
        derived: &DerivedParameters,
        rates: &ScaledRates,
        e0: f64,
    ) -> Result<f64> {
        let mut egg = EnergeticState::egg(e0, L0);
        match integrate_embryo(&mut egg, sp, derived, rates, self.max_steps, |_| {}) {
            Ok(birth) => Ok(birth.reserve_density),
            Err(LifeError::Starvation { .. }) => Ok(0.0),
            Err(e) => Err(e),
        }
    }
}

impl StageSolver for NumericStageSolver {
    fn embryo(
        &self,
        state: &mut EnergeticState,
        sp: &SpeciesParameters,
        derived: &DerivedParameters,
        rates: &ScaledRates,
    ) -> Result<Birth> {
        integrate_embryo(state, sp, derived, rates, self.max_steps, |_| {})
    }

    fn calibrate_egg(
        &self,
        sp: &SpeciesParameters,
        derived: &DerivedParameters,
        rates: &ScaledRates,
        eb: f64,
    ) -> Result<f64> {
        const SOLVER: &str = "egg calibration";
        let mut lo = 1e-8_f64;
        let mut hi = 1e-3_f64;
        let mut doublings = 0;
        while self.density_at_birth(sp, derived, rates, hi)? < eb {
            lo = hi;
            hi *= 2.0;
            doublings += 1;
            if doublings > 64 {
                return Err(LifeError::non_convergence(
                    SOLVER,
                    format!("no egg reserve up to {hi:.3e} J reaches e_b = {eb}"),
                ));
            }
        }
        for _ in 0..self.max_iterations {
            if (hi - lo) / hi < 1e-10 {
                return Ok(hi);
            }
            let mid = (lo * hi).sqrt();
            if self.density_at_birth(sp, derived, rates, mid)? < eb {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Err(LifeError::non_convergence(
            SOLVER,
            format!("bracket [{lo:.6e}, {hi:.6e}] after {} bisections", self.max_iterations),
        ))
    }

    fn larva(
        &self,
        sp: &SpeciesParameters,
        derived: &DerivedParameters,
        lb: f64,
        f: f64,
    ) -> Result<LarvaPrediction> {
        const SOLVER: &str = "larva prediction";
        let g = derived.g;
        if f <= lb {
            return Err(LifeError::non_convergence(
                SOLVER,
                format!("food level {f} cannot sustain growth beyond l_b = {lb:.4}"),
            ));
        }
        let c1 = f / g * (g + lb) / (f - lb);
        let c2 = derived.k * derived.v_hb / lb.powi(3);
        let rho = (f / lb - 1.0) / (f / g + 1.0);
        let v_rm = (1.0 + lb / g) / (1.0 - lb);
        let v_rj = sp.s_j * v_rm;

        let h = |tau: f64| {
            let ert = (-tau * rho).exp();
            v_rj - c1 * (1.0 - ert) + c2 * tau * ert
        };

        let mut lo = 0.0_f64;
        let mut hi = 1.0_f64;
        let mut doublings = 0;
        while h(hi) > 0.0 {
            lo = hi;
            hi *= 2.0;
            doublings += 1;
            if doublings > 64 || !hi.is_finite() {
                return Err(LifeError::non_convergence(
                    SOLVER,
                    "scaled reproduction buffer never reaches its pupation level",
                ));
            }
        }
        let mut converged = false;
        for _ in 0..self.max_iterations {
            let mid = 0.5 * (lo + hi);
            if h(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo < 1e-12 {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(LifeError::non_convergence(SOLVER, "tau_j bisection budget exhausted"));
        }

        let tau_j = 0.5 * (lo + hi);
        let lj = lb * (tau_j * rho / 3.0).exp();
        let big_lj = lj * derived.lm;
        let e_rm = v_rm * (1.0 - sp.kap) * g * derived.e_m * big_lj.powi(3);
        Ok(LarvaPrediction {
            rho,
            tau_j,
            lj,
            t_j_days: tau_j / derived.k_m / derived.t_factor,
            e_rm,
            e_rj: sp.s_j * e_rm,
            e_eggs: sp.kap_r * e_rm,
        })
    }

    fn pupa(
        &self,
        sp: &SpeciesParameters,
        derived: &DerivedParameters,
        lj: f64,
        e: f64,
    ) -> Result<Emergence> {
        let g = derived.g;
        let k = derived.k;
        let u_ej = lj.powi(3) * (sp.kap * sp.kap_v + e / g);
        let rhs = |_t: f64, y: &[f64; 3]| {
            let l = y[0];
            let u = y[1].max(1e-6);
            let denom = u + l.powi(3);
            let dl = (g * u - l.powi(4)) / denom / 3.0;
            let du = -u * l * l * (g + l) / denom;
            [dl, du, -du - k * y[2]]
        };
        let v_he = derived.v_he;
        let hit = solve_until_event(
            rhs,
            (0.0, self.pupa_horizon),
            [0.0, u_ej, 0.0],
            |_t, y| v_he - y[2],
            &self.ode,
        )?;
        Ok(Emergence {
            tau_e: hit.t,
            le: hit.y[0],
            u_ee: hit.y[1],
            t_e_days: hit.t / derived.k_m / derived.t_factor,
        })
    }
}
