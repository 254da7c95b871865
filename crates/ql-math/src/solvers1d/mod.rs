//! 1D root finding.
//!
//! Brent's method is the only solver needed: the Markov-functional model
//! inverts market digital prices into swap rates with it.

use ql_core::{
    errors::{Error, Result},
    fail, Real,
};

const DEFAULT_MAX_EVALUATIONS: usize = 100;

// ── Brent ─────────────────────────────────────────────────────────────────────

/// Brent's method on a bracketing interval, started from a guess.
///
/// Corresponds to `QuantLib::Brent`.
#[derive(Debug, Clone, Copy)]
pub struct Brent {
    max_evaluations: usize,
}

impl Default for Brent {
    fn default() -> Self {
        Self {
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
        }
    }
}

impl Brent {
    /// Solver that gives up after `max_evaluations` evaluations of `f`.
    pub fn new(max_evaluations: usize) -> Self {
        Self { max_evaluations }
    }

    /// Maximum number of function evaluations.
    pub fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    /// Find `x ∈ [x_min, x_max]` with `f(x) = 0` to within `accuracy` in `x`.
    ///
    /// # Errors
    /// * the interval is empty or does not contain `guess`,
    /// * `f(x_min)` and `f(x_max)` have the same sign,
    /// * [`Error::MaxEvaluations`] if no root was found in time.
    pub fn solve<F>(
        &self,
        mut f: F,
        accuracy: Real,
        guess: Real,
        x_min: Real,
        x_max: Real,
    ) -> Result<Real>
    where
        F: FnMut(Real) -> Real,
    {
        if !(x_min < x_max) {
            fail!("invalid range: x_min ({x_min}) >= x_max ({x_max})");
        }
        if !(guess >= x_min && guess <= x_max) {
            fail!("guess ({guess}) outside range [{x_min}, {x_max}]");
        }
        let accuracy = accuracy.max(Real::EPSILON);

        let mut x_lo = x_min;
        let mut x_hi = x_max;
        let mut f_lo = f(x_lo);
        if f_lo == 0.0 {
            return Ok(x_lo);
        }
        let mut f_hi = f(x_hi);
        if f_hi == 0.0 {
            return Ok(x_hi);
        }
        let mut evaluations = 2;
        if f_lo * f_hi > 0.0 {
            fail!("root not bracketed: f[{x_lo},{x_hi}] -> [{f_lo},{f_hi}]");
        }

        let mut root = guess;
        let mut f_root = f(root);
        evaluations += 1;
        let mut d: Real = 0.0;
        let mut e: Real = 0.0;

        while evaluations <= self.max_evaluations {
            if (f_root > 0.0 && f_hi > 0.0) || (f_root < 0.0 && f_hi < 0.0) {
                // rename so that root and x_hi bracket the zero
                x_hi = x_lo;
                f_hi = f_lo;
                d = root - x_lo;
                e = d;
            }
            if f_hi.abs() < f_root.abs() {
                x_lo = root;
                root = x_hi;
                x_hi = x_lo;
                f_lo = f_root;
                f_root = f_hi;
                f_hi = f_lo;
            }
            let tol = 2.0 * Real::EPSILON * root.abs() + 0.5 * accuracy;
            let x_mid = 0.5 * (x_hi - root);
            if x_mid.abs() <= tol || f_root == 0.0 {
                return Ok(root);
            }
            if e.abs() >= tol && f_lo.abs() > f_root.abs() {
                // inverse quadratic interpolation, secant when only two points
                let s = f_root / f_lo;
                let (mut p, mut q) = if x_lo == x_hi {
                    (2.0 * x_mid * s, 1.0 - s)
                } else {
                    let q = f_lo / f_hi;
                    let r = f_root / f_hi;
                    (
                        s * (2.0 * x_mid * q * (q - r) - (root - x_lo) * (r - 1.0)),
                        (q - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let min1 = 3.0 * x_mid * q - (tol * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = x_mid;
                    e = d;
                }
            } else {
                d = x_mid;
                e = d;
            }
            x_lo = root;
            f_lo = f_root;
            root += if d.abs() > tol {
                d
            } else {
                tol.copysign(x_mid)
            };
            f_root = f(root);
            evaluations += 1;
        }
        Err(Error::MaxEvaluations {
            what: "Brent solver".into(),
            evaluations: self.max_evaluations,
        })
    }
}

/// Brent's method on `[x_min, x_max]` started from the midpoint.
pub fn brent<F>(f: F, x_min: Real, x_max: Real, accuracy: Real) -> Result<Real>
where
    F: FnMut(Real) -> Real,
{
    Brent::default().solve(f, accuracy, 0.5 * (x_min + x_max), x_min, x_max)
}
