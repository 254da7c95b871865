//! `TermStructure` — base trait for all term structures.
//!
//! Times are year fractions from the curve's reference point; there is no
//! date arithmetic anywhere in the workspace.

use ql_core::{ensure, errors::Result, Time};

/// Base trait for all term structures.
///
/// Corresponds to `QuantLib::TermStructure`.
pub trait TermStructure: std::fmt::Debug + Send + Sync {
    /// The latest time for which the curve can be used.
    fn max_time(&self) -> Time {
        Time::MAX
    }

    /// Check whether a time is in the valid range of the term structure.
    fn check_range_time(&self, t: Time) -> bool {
        t >= 0.0 && t <= self.max_time()
    }

    /// Fail with a precondition error if `t` is outside the valid range.
    fn check_range(&self, t: Time) -> Result<()> {
        ensure!(
            self.check_range_time(t),
            "time ({t}) is outside the curve range [0, {}]",
            self.max_time()
        );
        Ok(())
    }
}
