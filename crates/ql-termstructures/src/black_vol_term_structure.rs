//! `BlackVolTermStructure` — Black-volatility term structures.
//!
//! Provides the `BlackVolTermStructure` trait and concrete implementations:
//! * `BlackConstantVol` — a flat Black volatility surface.

use crate::term_structure::TermStructure;
use crate::volatility_term_structure::VolatilityTermStructure;
use ql_core::{ensure, errors::Result, Real, Time, Volatility};

/// A Black-volatility term structure.
///
/// Implementors must provide **exactly one** of:
/// * [`black_vol_impl`](BlackVolTermStructure::black_vol_impl) — σ(t, k)
/// * [`black_variance_impl`](BlackVolTermStructure::black_variance_impl) — σ²·t
///
/// The other is derived automatically.
///
/// Corresponds to `QuantLib::BlackVolTermStructure`.
pub trait BlackVolTermStructure: VolatilityTermStructure {
    /// Return the Black volatility for time `t` and strike `strike`.
    fn black_vol_impl(&self, t: Time, strike: Real) -> Volatility {
        if t <= 0.0 {
            return 0.0;
        }
        let var = self.black_variance_impl(t, strike);
        (var / t).sqrt()
    }

    /// Return the Black variance `σ²·t` for time `t` and strike `strike`.
    fn black_variance_impl(&self, t: Time, strike: Real) -> Real {
        let vol = self.black_vol_impl(t, strike);
        vol * vol * t
    }

    /// Black volatility for a time and strike.
    fn black_vol(&self, t: Time, strike: Real) -> Volatility {
        self.black_vol_impl(t, strike)
    }

    /// Black variance for a time and strike.
    fn black_variance(&self, t: Time, strike: Real) -> Real {
        self.black_variance_impl(t, strike)
    }

    /// Forward variance between `t1` and `t2`.
    ///
    /// # Errors
    /// `t2` must not precede `t1`; the variance must not decrease.
    fn black_forward_variance(&self, t1: Time, t2: Time, strike: Real) -> Result<Real> {
        ensure!(t2 >= t1, "forward variance: t2 ({t2}) before t1 ({t1})");
        let v1 = self.black_variance_impl(t1, strike);
        let v2 = self.black_variance_impl(t2, strike);
        ensure!(
            v2 >= v1,
            "variances must be non-decreasing: {v1} at {t1} vs {v2} at {t2}"
        );
        Ok(v2 - v1)
    }

    /// Forward volatility between `t1` and `t2`.
    fn black_forward_vol(&self, t1: Time, t2: Time, strike: Real) -> Result<Volatility> {
        if t2 == t1 {
            return Ok(self.black_vol_impl(t1, strike));
        }
        Ok((self.black_forward_variance(t1, t2, strike)? / (t2 - t1)).sqrt())
    }
}

// ── BlackConstantVol ──────────────────────────────────────────────────────────

/// A flat (constant) Black volatility surface.
///
/// `σ(t, K) = constant` for all `t > 0` and all strikes `K`.
///
/// Corresponds to `QuantLib::BlackConstantVol`.
#[derive(Debug, Clone, Copy)]
pub struct BlackConstantVol {
    volatility: Volatility,
}

impl BlackConstantVol {
    /// Create a constant Black vol surface.
    pub fn new(volatility: Volatility) -> Self {
        Self { volatility }
    }

    /// The constant volatility value.
    pub fn volatility(&self) -> Volatility {
        self.volatility
    }
}

impl TermStructure for BlackConstantVol {}

impl VolatilityTermStructure for BlackConstantVol {
    fn min_strike(&self) -> Real {
        f64::NEG_INFINITY
    }

    fn max_strike(&self) -> Real {
        f64::INFINITY
    }
}

impl BlackVolTermStructure for BlackConstantVol {
    fn black_vol_impl(&self, _t: Time, _strike: Real) -> Volatility {
        self.volatility
    }

    fn black_variance_impl(&self, t: Time, _strike: Real) -> Real {
        self.volatility * self.volatility * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn constant_vol_value() {
        let surface = BlackConstantVol::new(0.20);
        assert_abs_diff_eq!(surface.black_vol(1.0, 100.0), 0.20, epsilon = 1e-15);
        assert_abs_diff_eq!(surface.black_vol(5.0, 50.0), 0.20, epsilon = 1e-15);
        assert_abs_diff_eq!(surface.black_variance(2.0, 100.0), 0.08, epsilon = 1e-15);
    }

    #[test]
    fn forward_variance() {
        let surface = BlackConstantVol::new(0.25);
        let fv = surface.black_forward_variance(1.0, 3.0, 100.0).unwrap();
        assert_abs_diff_eq!(fv, 0.0625 * 2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(
            surface.black_forward_vol(1.0, 3.0, 100.0).unwrap(),
            0.25,
            epsilon = 1e-15
        );
        assert!(surface.black_forward_variance(3.0, 1.0, 100.0).is_err());
    }

    #[test]
    fn constant_vol_strike_range() {
        let surface = BlackConstantVol::new(0.20);
        assert!(surface.min_strike() < 0.0);
        assert!(surface.max_strike() > 1e10);
    }
}
