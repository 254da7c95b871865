//! `YieldTermStructure` — yield / interest-rate term structures.
//!
//! This module defines the `YieldTermStructure` trait together with the three
//! fundamental quantities any yield curve must provide:
//!
//! * **discount factor** — `P(0,t)`
//! * **zero rate** — the continuously-compounded zero rate for maturity *t*
//! * **forward rate** — the instantaneous or period forward rate
//!
//! All rates are continuously compounded.

use crate::term_structure::TermStructure;
use ql_core::{DiscountFactor, Rate, Real, Time};

/// A yield (interest-rate) term structure.
///
/// Implementors must provide **exactly one** of the three low-level methods:
///
/// * [`discount_impl`](YieldTermStructure::discount_impl)
/// * [`zero_rate_impl`](YieldTermStructure::zero_rate_impl)
/// * [`forward_rate_impl`](YieldTermStructure::forward_rate_impl)
///
/// Default implementations of the other two are provided via the
/// mathematical relationships that connect them.
///
/// Corresponds to `QuantLib::YieldTermStructure`.
pub trait YieldTermStructure: TermStructure {
    // ── Low-level impl hooks (override exactly one) ──────────────────────

    /// Return the discount factor for a given time `t`.
    ///
    /// Default: computed from `zero_rate_impl`.
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        if t == 0.0 {
            return 1.0;
        }
        let r = self.zero_rate_impl(t);
        (-r * t).exp()
    }

    /// Return the continuously-compounded zero rate for time `t`.
    ///
    /// Default: computed from `discount_impl`.
    fn zero_rate_impl(&self, t: Time) -> Rate {
        if t == 0.0 {
            return self.forward_rate_impl(0.0);
        }
        let df = self.discount_impl(t);
        -df.ln() / t
    }

    /// Return the instantaneous forward rate at time `t`.
    ///
    /// Default: central difference of `ln P`.
    fn forward_rate_impl(&self, t: Time) -> Rate {
        let t1 = (t - DT / 2.0).max(0.0);
        let t2 = t1 + DT;
        let df1 = self.discount_impl(t1);
        let df2 = self.discount_impl(t2);
        (df1.ln() - df2.ln()) / (t2 - t1)
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Discount factor for a time.
    fn discount(&self, t: Time) -> DiscountFactor {
        self.discount_impl(t)
    }

    /// Continuously-compounded zero rate for time `t`.
    fn zero_rate(&self, t: Time) -> Rate {
        self.zero_rate_impl(t)
    }

    /// Continuously-compounded forward rate between `t1` and `t2`.
    ///
    /// `t1 == t2` gives the instantaneous forward rate.
    fn forward_rate(&self, t1: Time, t2: Time) -> Rate {
        if t2 == t1 {
            return self.forward_rate_impl(t1);
        }
        (self.discount_impl(t1) / self.discount_impl(t2)).ln() / (t2 - t1)
    }

    /// Forward discount factor `P(t2)/P(t1)`.
    fn discount_ratio(&self, t1: Time, t2: Time) -> DiscountFactor {
        self.discount_impl(t2) / self.discount_impl(t1)
    }
}

/// Small time step used for instantaneous forward rate computations.
const DT: Real = 1.0e-4;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Curve with `P(t) = exp(-(0.02 t + 0.005 t²))` defined through discounts only.
    #[derive(Debug)]
    struct Quadratic;

    impl TermStructure for Quadratic {}

    impl YieldTermStructure for Quadratic {
        fn discount_impl(&self, t: Time) -> DiscountFactor {
            (-(0.02 * t + 0.005 * t * t)).exp()
        }
    }

    #[test]
    fn derived_quantities_follow_from_discounts() {
        let c = Quadratic;
        assert_abs_diff_eq!(c.zero_rate(2.0), 0.02 + 0.005 * 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(c.forward_rate(1.0, 1.0), 0.02 + 0.01 * 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(
            c.forward_rate(1.0, 3.0),
            (0.02 * 2.0 + 0.005 * 8.0) / 2.0,
            epsilon = 1e-14
        );
        assert_abs_diff_eq!(
            c.discount_ratio(1.0, 3.0),
            c.discount(3.0) / c.discount(1.0),
            epsilon = 1e-15
        );
    }
}
