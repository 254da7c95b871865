//! 1D interpolation.

use ql_core::Real;

pub mod cubic;

pub use cubic::{CubicSpline, SplineBoundary};

/// A 1D interpolation function `f: R → R` defined by a set of known points.
///
/// Corresponds to `QuantLib::Interpolation`.
pub trait Interpolation1D: std::fmt::Debug {
    /// Evaluate the interpolation at `x`.
    fn operator(&self, x: Real) -> Real;

    /// Return the lower bound of the interpolation domain.
    fn x_min(&self) -> Real;

    /// Return the upper bound of the interpolation domain.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the interpolation range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }
}

/// Index `i` of the interval `[xs[i], xs[i+1]]` used to evaluate at `x`.
///
/// Points left of the grid map to the first interval, points right of it
/// to the last one.  `xs` must hold at least two sorted values.
pub(crate) fn locate(xs: &[Real], x: Real) -> usize {
    let n = xs.len();
    if x <= xs[0] {
        return 0;
    }
    if x >= xs[n - 1] {
        return n - 2;
    }
    // first index with xs[i] > x, minus one
    xs.partition_point(|&v| v <= x) - 1
}
