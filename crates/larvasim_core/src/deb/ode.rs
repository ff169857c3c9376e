//! Adaptive Dormand–Prince RK45 integration with terminal event location.

use crate::error::{LifeError, Result};

const SOLVER: &str = "RK45";

const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
const A: [[f64; 6]; 7] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0],
    [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
];
/// Difference between the fifth- and fourth-order weights.
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdeOptions {
    pub rtol: f64,
    pub atol: f64,
    pub first_step: f64,
    pub max_steps: usize,
}

impl Default for OdeOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            first_step: 1e-3,
            max_steps: 100_000,
        }
    }
}

/// Time and state at which the event function changed sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventHit<const N: usize> {
    pub t: f64,
    pub y: [f64; N],
}

fn combine<const N: usize>(y: &[f64; N], h: f64, k: &[[f64; N]; 7], weights: &[f64]) -> [f64; N] {
    let mut out = *y;
    for (j, w) in weights.iter().enumerate() {
        if *w != 0.0 {
            for i in 0..N {
                out[i] += h * w * k[j][i];
            }
        }
    }
    out
}

/// Cubic Hermite interpolation over an accepted step.
fn hermite<const N: usize>(
    y0: &[f64; N],
    f0: &[f64; N],
    y1: &[f64; N],
    f1: &[f64; N],
    h: f64,
    theta: f64,
) -> [f64; N] {
    let t2 = theta * theta;
    let t3 = t2 * theta;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + theta;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    let mut out = [0.0; N];
    for i in 0..N {
        out[i] = h00 * y0[i] + h10 * h * f0[i] + h01 * y1[i] + h11 * h * f1[i];
    }
    out
}

/// Integrates `dy/dt = rhs(t, y)` from `y0` over `t_span` until `event(t, y)`
/// changes sign, and returns the located crossing.
///
/// Fails with [`LifeError::NonConvergence`] when the event is not reached
/// within the time span or step budget, or when the state becomes non-finite.
pub fn solve_until_event<const N: usize, F, G>(
    rhs: F,
    t_span: (f64, f64),
    y0: [f64; N],
    event: G,
    opts: &OdeOptions,
) -> Result<EventHit<N>>
where
    F: Fn(f64, &[f64; N]) -> [f64; N],
    G: Fn(f64, &[f64; N]) -> f64,
{
    let (mut t, t_end) = t_span;
    let mut y = y0;
    let mut f = rhs(t, &y);
    let mut g = event(t, &y);
    let mut h = opts.first_step.min(t_end - t);

    for _ in 0..opts.max_steps {
        if t >= t_end {
            break;
        }
        h = h.min(t_end - t);

        let mut k = [[0.0; N]; 7];
        k[0] = f;
        for s in 1..7 {
            let ys = combine(&y, h, &k, &A[s][..s]);
            k[s] = rhs(t + C[s] * h, &ys);
        }
        let y_new = combine(&y, h, &k, &A[6]);

        let mut err_sq = 0.0;
        for i in 0..N {
            let mut e = 0.0;
            for (j, ej) in E.iter().enumerate() {
                e += ej * k[j][i];
            }
            let scale = opts.atol + opts.rtol * y[i].abs().max(y_new[i].abs());
            err_sq += (h * e / scale).powi(2);
        }
        let err = (err_sq / N as f64).sqrt();

        if !err.is_finite() || y_new.iter().any(|v| !v.is_finite()) {
            return Err(LifeError::non_convergence(
                SOLVER,
                format!("non-finite state at t = {t:.4}"),
            ));
        }

        if err <= 1.0 {
            let f_new = rhs(t + h, &y_new);
            let g_new = event(t + h, &y_new);
            if g == 0.0 {
                return Ok(EventHit { t, y });
            }
            if g.signum() != g_new.signum() {
                let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
                for _ in 0..60 {
                    let mid = 0.5 * (lo + hi);
                    let ym = hermite(&y, &f, &y_new, &f_new, h, mid);
                    if event(t + mid * h, &ym).signum() == g.signum() {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                return Ok(EventHit {
                    t: t + hi * h,
                    y: hermite(&y, &f, &y_new, &f_new, h, hi),
                });
            }
            t += h;
            y = y_new;
            f = f_new;
            g = g_new;
        }

        let factor = if err == 0.0 {
            5.0
        } else {
            (0.9 * err.powf(-0.2)).clamp(0.2, 5.0)
        };
        h *= factor;
        if h < 1e-14 {
            return Err(LifeError::non_convergence(
                SOLVER,
                format!("step size underflow at t = {t:.4}"),
            ));
        }
    }

    Err(LifeError::non_convergence(
        SOLVER,
        format!("no event within t = {t_end} ({} steps)", opts.max_steps),
    ))
}
