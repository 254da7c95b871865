//! `VolatilityTermStructure` — base trait for volatility term structures.
//!
//! Extends `TermStructure` with the strike range.

use crate::term_structure::TermStructure;
use ql_core::Real;

/// Base trait for all volatility term structures.
///
/// Corresponds to `QuantLib::VolatilityTermStructure`.
pub trait VolatilityTermStructure: TermStructure {
    /// The minimum strike for which the term structure is defined.
    fn min_strike(&self) -> Real;

    /// The maximum strike for which the term structure is defined.
    fn max_strike(&self) -> Real;
}
