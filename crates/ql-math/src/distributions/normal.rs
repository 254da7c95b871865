//! Standard normal distribution.
//!
//! The cumulative distribution is evaluated through `statrs`' complementary
//! error function, which keeps full double precision in both tails.  This
//! matters for digital prices obtained by finite differences of Black
//! prices with a gap of 1e-5: a 1e-8 absolute error in Φ would already
//! show up in the third digit of the digital.

use ql_core::Real;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// The error function `erf(x) = 2/√π ∫₀ˣ e^{-t²} dt`.
#[inline]
pub fn erf(x: Real) -> Real {
    statrs::function::erf::erf(x)
}

/// The complementary error function `1 − erf(x)`.
#[inline]
pub fn erfc(x: Real) -> Real {
    statrs::function::erf::erfc(x)
}

/// The standard normal probability density `φ(x) = exp(-x²/2) / √(2π)`.
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// The standard normal cumulative distribution `Φ(x)`.
pub fn normal_cdf(x: Real) -> Real {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// The inverse standard normal CDF.
///
/// Returns `-∞`/`+∞` at 0 and 1 and `NaN` outside `[0, 1]`.
pub fn normal_cdf_inverse(p: Real) -> Real {
    if !(0.0..=1.0).contains(&p) {
        return Real::NAN;
    }
    if p == 0.0 {
        return Real::NEG_INFINITY;
    }
    if p == 1.0 {
        return Real::INFINITY;
    }
    -std::f64::consts::SQRT_2 * statrs::function::erf::erfc_inv(2.0 * p)
}
