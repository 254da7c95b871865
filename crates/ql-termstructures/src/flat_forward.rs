//! `FlatForward` — a yield term structure with a constant forward rate.
//!
//! This is the simplest possible yield curve: a constant continuously-compounded
//! rate that applies for all maturities.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use ql_core::{DiscountFactor, Rate, Time};

/// A flat (constant) forward-rate yield term structure.
///
/// Discount factors are computed as `P(t) = exp(-r * t)`.
///
/// Corresponds to `QuantLib::FlatForward`.
#[derive(Debug, Clone, Copy)]
pub struct FlatForward {
    /// The continuously-compounded flat rate.
    rate: Rate,
}

impl FlatForward {
    /// Create a flat-forward curve from a continuously-compounded rate.
    pub fn new(rate: Rate) -> Self {
        Self { rate }
    }

    /// The continuously-compounded flat rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }
}

impl TermStructure for FlatForward {}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        (-self.rate * t).exp()
    }

    fn zero_rate_impl(&self, _t: Time) -> Rate {
        self.rate
    }

    fn forward_rate_impl(&self, _t: Time) -> Rate {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn flat_curve() {
        let c = FlatForward::new(0.03);
        assert_abs_diff_eq!(c.discount(2.0), (-0.06_f64).exp(), epsilon = 1e-15);
        assert_abs_diff_eq!(c.zero_rate(7.0), 0.03, epsilon = 1e-15);
        assert_abs_diff_eq!(c.forward_rate(1.0, 4.0), 0.03, epsilon = 1e-14);
        assert_abs_diff_eq!(c.discount(0.0), 1.0, epsilon = 1e-15);
    }
}
