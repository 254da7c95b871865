//! State process of the Markov-functional model.
//!
//! ```text
//! dx = σ(t)·e^{a t} dW,   x(0) = 0
//! ```
//!
//! with a constant reversion `a` and a piecewise-constant volatility σ(t).
//! The process is a time-changed Brownian motion: driftless, Gaussian, with
//! variance `∫ σ(s)² e^{2as} ds` integrated exactly per volatility step.

use crate::stochastic_process::StochasticProcess1D;
use ql_core::{ensure, errors::Result, Real, Time};

/// Markov-functional state process with piecewise-constant volatility.
///
/// Corresponds to `QuantLib::MfStateProcess`.
#[derive(Debug, Clone)]
pub struct MfStateProcess {
    reversion: Real,
    /// Breakpoints of the volatility steps (strictly increasing, positive).
    times: Vec<Time>,
    /// One volatility per step, `times.len() + 1` values.
    vols: Vec<Real>,
}

impl MfStateProcess {
    /// Create the process.
    ///
    /// # Errors
    /// `vols` must hold one value more than `times`; `times` must be
    /// positive and strictly increasing.
    pub fn new(reversion: Real, times: Vec<Time>, vols: Vec<Real>) -> Result<Self> {
        ensure!(
            vols.len() == times.len() + 1,
            "number of volatilities ({}) must be number of step times ({}) plus one",
            vols.len(),
            times.len()
        );
        ensure!(
            times.first().map_or(true, |&t| t > 0.0),
            "volatility step times must be positive"
        );
        ensure!(
            times.windows(2).all(|w| w[1] > w[0]),
            "volatility step times must be strictly increasing"
        );
        Ok(Self {
            reversion,
            times,
            vols,
        })
    }

    /// Mean reversion `a`.
    pub fn reversion(&self) -> Real {
        self.reversion
    }

    /// Volatility step times.
    pub fn step_times(&self) -> &[Time] {
        &self.times
    }

    /// Volatilities, one per step.
    pub fn volatilities(&self) -> &[Real] {
        &self.vols
    }

    /// Index of the volatility step containing `t`; a breakpoint belongs to
    /// the step it opens.
    fn index(&self, t: Time) -> usize {
        self.times.partition_point(|&ti| ti <= t)
    }

    /// Volatility σ(t).
    pub fn sigma(&self, t: Time) -> Real {
        self.vols[self.index(t)]
    }

    /// `∫ e^{2as} ds` over `[t0, t1]` times `σ²`.
    fn step_variance(&self, sigma: Real, t0: Time, t1: Time) -> Real {
        let a = self.reversion;
        if a.abs() < 1e-12 {
            sigma * sigma * (t1 - t0)
        } else {
            sigma * sigma / (2.0 * a) * ((2.0 * a * t1).exp() - (2.0 * a * t0).exp())
        }
    }
}

impl StochasticProcess1D for MfStateProcess {
    fn x0(&self) -> Real {
        0.0
    }

    fn drift_1d(&self, _t: Time, _x: Real) -> Real {
        0.0
    }

    fn diffusion_1d(&self, t: Time, _x: Real) -> Real {
        self.sigma(t) * (self.reversion * t).exp()
    }

    fn expectation_1d(&self, _t: Time, x: Real, _dt: Time) -> Real {
        x
    }

    fn variance_1d(&self, t: Time, _x: Real, dt: Time) -> Real {
        if dt < Real::EPSILON {
            return 0.0;
        }
        let end = t + dt;
        let i = self.index(t);
        let j = self.index(end);
        let mut v = 0.0;
        let mut from = t;
        for k in i..j {
            v += self.step_variance(self.vols[k], from, self.times[k]);
            from = self.times[k];
        }
        v + self.step_variance(self.vols[j], from, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn piecewise_lookup() {
        let p = MfStateProcess::new(0.0, vec![2.0], vec![0.01, 0.02]).unwrap();
        assert_eq!(p.sigma(1.0), 0.01);
        assert_eq!(p.sigma(2.0), 0.02);
        assert_eq!(p.sigma(3.0), 0.02);
    }

    #[test]
    fn variance_without_reversion() {
        let p = MfStateProcess::new(0.0, vec![1.0, 2.0], vec![0.1, 0.2, 0.3]).unwrap();
        let v = p.variance_1d(0.5, 0.0, 2.0);
        assert_abs_diff_eq!(v, 0.01 * 0.5 + 0.04 * 1.0 + 0.09 * 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(p.std_deviation_1d(0.0, 0.0, 1.0), 0.1, epsilon = 1e-15);
        assert_eq!(p.variance_1d(1.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn variance_with_reversion_is_additive() {
        let p = MfStateProcess::new(0.05, vec![1.5], vec![0.01, 0.015]).unwrap();
        let whole = p.variance_1d(0.0, 0.0, 4.0);
        let split = p.variance_1d(0.0, 0.0, 2.5) + p.variance_1d(2.5, 0.0, 1.5);
        assert_abs_diff_eq!(whole, split, epsilon = 1e-16);
        let a: Real = 0.05;
        let flat = 0.01f64.powi(2) / (2.0 * a) * ((2.0 * a * 1.0).exp() - 1.0);
        assert_abs_diff_eq!(p.variance_1d(0.0, 0.0, 1.0), flat, epsilon = 1e-16);
    }

    #[test]
    fn driftless() {
        let p = MfStateProcess::new(0.02, vec![], vec![0.01]).unwrap();
        assert_eq!(p.drift_1d(1.0, 0.3), 0.0);
        assert_eq!(p.expectation_1d(1.0, 0.3, 2.0), 0.3);
        assert_abs_diff_eq!(p.diffusion_1d(1.0, 0.0), 0.01 * 0.02_f64.exp(), epsilon = 1e-16);
    }

    #[test]
    fn rejects_inconsistent_steps() {
        assert!(MfStateProcess::new(0.0, vec![1.0], vec![0.01]).is_err());
        assert!(MfStateProcess::new(0.0, vec![2.0, 1.0], vec![0.01; 3]).is_err());
        assert!(MfStateProcess::new(0.0, vec![0.0], vec![0.01; 2]).is_err());
    }
}
