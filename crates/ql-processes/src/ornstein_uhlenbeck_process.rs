//! Ornstein-Uhlenbeck mean-reverting process.
//!
//! ```text
//! dX = a(b − X) dt + σ dW
//! ```
//!
//! where `a` is the speed of mean reversion, `b` is the long-run level,
//! and `σ` is the constant volatility.  This is the state process of the
//! Vasicek short-rate model.

use crate::stochastic_process::StochasticProcess1D;
use ql_core::{ensure, errors::Result, Real, Time};

/// An Ornstein-Uhlenbeck mean-reverting process.
///
/// Closed-form expectation and variance:
/// ```text
/// E[X(t+dt) | X(t)] = level + (X(t) − level) · exp(−speed · dt)
/// Var[X(t+dt) | X(t)] = σ² / (2·speed) · (1 − exp(−2·speed·dt))
/// ```
///
/// Corresponds to `QuantLib::OrnsteinUhlenbeckProcess`.
#[derive(Debug, Clone)]
pub struct OrnsteinUhlenbeckProcess {
    x0: Real,
    speed: Real,
    level: Real,
    volatility: Real,
}

impl OrnsteinUhlenbeckProcess {
    /// Create a new Ornstein-Uhlenbeck process.
    ///
    /// # Errors
    /// `speed` and `volatility` must be non-negative.
    pub fn new(speed: Real, volatility: Real, x0: Real, level: Real) -> Result<Self> {
        ensure!(
            speed >= 0.0,
            "negative mean-reversion speed ({speed}) not allowed"
        );
        ensure!(volatility >= 0.0, "negative volatility ({volatility}) not allowed");
        Ok(Self {
            x0,
            speed,
            level,
            volatility,
        })
    }

    /// Speed of mean reversion.
    pub fn speed(&self) -> Real {
        self.speed
    }

    /// Long-run level.
    pub fn level(&self) -> Real {
        self.level
    }

    /// Volatility.
    pub fn volatility(&self) -> Real {
        self.volatility
    }
}

impl StochasticProcess1D for OrnsteinUhlenbeckProcess {
    fn x0(&self) -> Real {
        self.x0
    }

    fn drift_1d(&self, _t: Time, x: Real) -> Real {
        self.speed * (self.level - x)
    }

    fn diffusion_1d(&self, _t: Time, _x: Real) -> Real {
        self.volatility
    }

    fn expectation_1d(&self, _t: Time, x: Real, dt: Time) -> Real {
        self.level + (x - self.level) * (-self.speed * dt).exp()
    }

    fn variance_1d(&self, _t: Time, _x: Real, dt: Time) -> Real {
        if self.speed < 1e-15 {
            // no mean reversion: Brownian motion
            self.volatility * self.volatility * dt
        } else {
            self.volatility * self.volatility * (1.0 - (-2.0 * self.speed * dt).exp())
                / (2.0 * self.speed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn exact_moments() {
        let p = OrnsteinUhlenbeckProcess::new(0.5, 0.1, 0.04, 0.02).unwrap();
        let e = p.expectation_1d(0.0, 0.04, 2.0);
        assert_abs_diff_eq!(e, 0.02 + 0.02 * (-1.0_f64).exp(), epsilon = 1e-15);
        let v = p.variance_1d(0.0, 0.04, 2.0);
        assert_abs_diff_eq!(v, 0.01 * (1.0 - (-2.0_f64).exp()), epsilon = 1e-15);
    }

    #[test]
    fn zero_speed_is_brownian() {
        let p = OrnsteinUhlenbeckProcess::new(0.0, 0.2, 1.0, 0.0).unwrap();
        assert_abs_diff_eq!(p.expectation_1d(0.0, 1.0, 3.0), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(p.variance_1d(0.0, 1.0, 3.0), 0.12, epsilon = 1e-15);
    }

    #[test]
    fn rejects_negative_parameters() {
        assert!(OrnsteinUhlenbeckProcess::new(-0.1, 0.1, 0.0, 0.0).is_err());
        assert!(OrnsteinUhlenbeckProcess::new(0.1, -0.1, 0.0, 0.0).is_err());
    }
}
