//! # ql-math
//!
//! Numerical building blocks: the `Array`/`Matrix` newtypes over nalgebra,
//! the normal distribution (via statrs), cubic splines with accessible
//! coefficients, Gauss-Hermite quadrature and Brent root finding.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// One-dimensional arrays.
pub mod array;

/// Probability distributions.
pub mod distributions;

/// Gaussian quadratures.
pub mod integrals;

/// 1D interpolation schemes.
pub mod interpolations;

/// Two-dimensional matrices.
pub mod matrix;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::Array;
pub use distributions::{normal_cdf, normal_cdf_inverse, normal_pdf};
pub use integrals::{GaussHermiteIntegration, GaussianQuadrature};
pub use interpolations::{CubicSpline, Interpolation1D, SplineBoundary};
pub use matrix::Matrix;
pub use solvers1d::Brent;
