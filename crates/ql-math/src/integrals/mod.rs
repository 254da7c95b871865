//! Numerical integration.
//!
//! Only Gaussian quadratures are needed: the Markov-functional calibration
//! integrates the deflated zero bond against the Gaussian transition density
//! with a Gauss-Hermite rule.

pub mod gaussianquadratures;

pub use gaussianquadratures::{GaussHermiteIntegration, GaussianQuadrature};
