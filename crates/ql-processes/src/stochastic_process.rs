//! `StochasticProcess1D` — base trait for one-dimensional diffusions.
//!
//! A process `dX = μ(t,X) dt + σ(t,X) dW` is described by its drift (`μ`)
//! and diffusion (`σ`).  Finite-difference grids additionally need the
//! admissible range of the state variable.

use ql_core::{Real, Time};

/// A 1-dimensional stochastic process `dX = μ(t,X) dt + σ(t,X) dW`.
///
/// Corresponds to `QuantLib::StochasticProcess1D`.
pub trait StochasticProcess1D: std::fmt::Debug + Send + Sync {
    /// Initial value of the process.
    fn x0(&self) -> Real;

    /// 1D drift `μ(t, x)`.
    fn drift_1d(&self, t: Time, x: Real) -> Real;

    /// 1D diffusion `σ(t, x)`.
    fn diffusion_1d(&self, t: Time, x: Real) -> Real;

    /// Expected value `E[x(t+Δt) | x(t) = x]`.
    fn expectation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        x + self.drift_1d(t, x) * dt
    }

    /// Standard deviation of `x(t+Δt)` given `x(t) = x`.
    fn std_deviation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        self.variance_1d(t, x, dt).sqrt()
    }

    /// Variance of `x(t+Δt)` given `x(t) = x`.
    fn variance_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        let s = self.diffusion_1d(t, x);
        s * s * dt
    }

    /// Smallest admissible value of the state variable.
    fn min_state_variable(&self) -> Real {
        Real::NEG_INFINITY
    }

    /// Largest admissible value of the state variable.
    fn max_state_variable(&self) -> Real {
        Real::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test process: dX = 0.05·dt + 0.20·dW  (constant drift & vol)
    #[derive(Debug)]
    struct ConstantProcess {
        x0: Real,
        mu: Real,
        sigma: Real,
    }

    impl StochasticProcess1D for ConstantProcess {
        fn x0(&self) -> Real {
            self.x0
        }

        fn drift_1d(&self, _t: Time, _x: Real) -> Real {
            self.mu
        }

        fn diffusion_1d(&self, _t: Time, _x: Real) -> Real {
            self.sigma
        }
    }

    #[test]
    fn euler_defaults() {
        let p = ConstantProcess { x0: 100.0, mu: 0.05, sigma: 0.20 };
        assert!((p.expectation_1d(0.0, p.x0(), 1.0) - 100.05).abs() < 1e-12);
        // σ² · Δt = 0.04 * 0.25 = 0.01
        assert!((p.variance_1d(0.0, 100.0, 0.25) - 0.01).abs() < 1e-15);
        assert!((p.std_deviation_1d(0.0, 100.0, 0.25) - 0.1).abs() < 1e-15);
    }

    #[test]
    fn unbounded_by_default() {
        let p = ConstantProcess { x0: 0.0, mu: 0.0, sigma: 1.0 };
        assert_eq!(p.min_state_variable(), Real::NEG_INFINITY);
        assert_eq!(p.max_state_variable(), Real::INFINITY);
    }
}
