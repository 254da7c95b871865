//! Vasicek short-rate model.
//!
//! ```text
//! dr = a(b − r) dt + σ dW
//! ```
//!
//! Discount bond price: `P(t,T) = A(t,T) exp(−B(t,T) r(t))`
//!
//! where
//! * `B(t,T) = (1 − e^{−a(T−t)}) / a`
//! * `ln A(t,T) = (B − (T−t))(b − σ²/(2a²)) − σ²B²/(4a)`
//!
//! With `a = 0` the model degenerates to `dr = σ dW`, for which
//! `B = T − t` and `ln A = σ²(T−t)³/6`.

use crate::short_rate_model::{OneFactorModel, ShortRateDynamics, ShortRateModel};
use ql_core::{ensure, errors::Result, Real, Time};
use ql_processes::{OrnsteinUhlenbeckProcess, StochasticProcess1D};
use std::sync::Arc;

const ZERO_REVERSION: Real = 1e-12;

/// Vasicek short-rate model.
///
/// Parameters: `r₀` (initial short rate), `a` (mean-reversion speed),
/// `b` (long-run mean), `σ` (volatility).
///
/// Corresponds to `QuantLib::Vasicek`.
#[derive(Debug, Clone)]
pub struct Vasicek {
    r0: Real,
    a: Real,
    b: Real,
    sigma: Real,
    state: OrnsteinUhlenbeckProcess,
}

impl Vasicek {
    /// Create a new Vasicek model.
    ///
    /// # Errors
    /// Mean reversion and volatility must be non-negative.
    pub fn new(r0: Real, a: Real, b: Real, sigma: Real) -> Result<Self> {
        ensure!(a >= 0.0, "mean reversion ({a}) must be non-negative");
        ensure!(sigma >= 0.0, "volatility ({sigma}) must be non-negative");
        let state = OrnsteinUhlenbeckProcess::new(a, sigma, r0 - b, 0.0)?;
        Ok(Self {
            r0,
            a,
            b,
            sigma,
            state,
        })
    }

    /// Initial short rate.
    pub fn r0(&self) -> Real {
        self.r0
    }

    /// Mean-reversion speed.
    pub fn a(&self) -> Real {
        self.a
    }

    /// Long-run mean level.
    pub fn b(&self) -> Real {
        self.b
    }

    /// Volatility.
    pub fn sigma(&self) -> Real {
        self.sigma
    }

    /// Bond duration function `B(t, T) = (1 − e^{−a(T−t)}) / a`.
    pub fn b_function(&self, t: Time, big_t: Time) -> Real {
        let tau = big_t - t;
        if self.a < ZERO_REVERSION {
            tau
        } else {
            (1.0 - (-self.a * tau).exp()) / self.a
        }
    }

    /// Log of the `A(t,T)` function.
    fn log_a(&self, t: Time, big_t: Time) -> Real {
        let b_val = self.b_function(t, big_t);
        let tau = big_t - t;
        let sigma2 = self.sigma * self.sigma;

        if self.a < ZERO_REVERSION {
            sigma2 * tau * tau * tau / 6.0
        } else {
            let a2 = self.a * self.a;
            (b_val - tau) * (self.b - sigma2 / (2.0 * a2)) - sigma2 * b_val * b_val / (4.0 * self.a)
        }
    }
}

impl ShortRateModel for Vasicek {
    fn discount_bond(&self, t: Time, big_t: Time, rate: Real) -> Real {
        let b_val = self.b_function(t, big_t);
        (self.log_a(t, big_t) - b_val * rate).exp()
    }
}

impl OneFactorModel for Vasicek {
    fn dynamics(&self) -> Arc<dyn ShortRateDynamics> {
        Arc::new(VasicekDynamics {
            level: self.b,
            process: self.state.clone(),
        })
    }
}

/// Vasicek dynamics: `x = r − b` follows a zero-mean OU process.
#[derive(Debug)]
struct VasicekDynamics {
    level: Real,
    process: OrnsteinUhlenbeckProcess,
}

impl ShortRateDynamics for VasicekDynamics {
    fn process(&self) -> &dyn StochasticProcess1D {
        &self.process
    }

    fn variable(&self, _t: Time, r: Real) -> Real {
        r - self.level
    }

    fn short_rate(&self, _t: Time, x: Real) -> Real {
        x + self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn vasicek_discount_bond_at_zero() {
        let v = Vasicek::new(0.05, 0.1, 0.05, 0.01).unwrap();
        // P(0,0) = 1
        assert_abs_diff_eq!(v.discount_bond(0.0, 0.0, 0.05), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn vasicek_discount_bond_positive() {
        let v = Vasicek::new(0.05, 0.1, 0.05, 0.01).unwrap();
        let p = v.discount_bond(0.0, 1.0, 0.05);
        assert!(p > 0.0);
        assert!(p < 1.0);
    }

    #[test]
    fn vasicek_b_function() {
        let v = Vasicek::new(0.05, 0.1, 0.05, 0.01).unwrap();
        let b = v.b_function(0.0, 10.0);
        let expected = (1.0 - (-1.0_f64).exp()) / 0.1;
        assert_abs_diff_eq!(b, expected, epsilon = 1e-10);
    }

    #[test]
    fn deterministic_model_discounts_at_the_short_rate() {
        let v = Vasicek::new(0.04, 0.0, 0.0, 0.0).unwrap();
        for t in [0.5, 1.0, 7.0] {
            assert_abs_diff_eq!(v.discount_bond(0.0, t, 0.04), (-0.04 * t).exp(), epsilon = 1e-14);
        }
        assert_abs_diff_eq!(
            v.discount_bond(2.0, 5.0, 0.03),
            (-0.03 * 3.0_f64).exp(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn small_reversion_matches_zero_reversion_limit() {
        let sigma = 0.01;
        let limit = Vasicek::new(0.03, 0.0, 0.0, sigma).unwrap();
        let near = Vasicek::new(0.03, 1e-5, 0.0, sigma).unwrap();
        assert_abs_diff_eq!(
            limit.discount_bond(0.0, 10.0, 0.03),
            near.discount_bond(0.0, 10.0, 0.03),
            epsilon = 1e-4
        );
    }

    #[test]
    fn vasicek_dynamics() {
        let v = Vasicek::new(0.05, 0.1, 0.04, 0.01).unwrap();
        let dynamics = v.dynamics();
        let x0 = dynamics.variable(0.0, 0.05);
        assert_abs_diff_eq!(x0, 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(dynamics.process().x0(), 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(dynamics.short_rate(1.0, x0), 0.05, epsilon = 1e-15);
        // mean reverting towards x = 0
        assert_abs_diff_eq!(dynamics.process().drift_1d(0.0, x0), -0.001, epsilon = 1e-15);
        assert_abs_diff_eq!(dynamics.process().diffusion_1d(0.0, x0), 0.01, epsilon = 1e-15);
    }

    #[test]
    fn rejects_negative_parameters() {
        assert!(Vasicek::new(0.05, -0.1, 0.05, 0.01).is_err());
        assert!(Vasicek::new(0.05, 0.1, 0.05, -0.01).is_err());
    }
}
