//! # ql-methods
//!
//! Numerical methods: the finite-difference framework used by the
//! multi-period option pricers and the short-rate swaption engine.
//!
//! # Modules
//!
//! * [`finite_differences`] — tridiagonal operators, boundary conditions,
//!   time-stepping schemes, rollback model, step conditions and grids

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Finite difference methods: operators, schemes, rollback.
pub mod finite_differences;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use finite_differences::{
    AmericanCondition, BoundaryCondition, DifferentialOperator,
    FiniteDifferenceModel, Grid, MixedScheme, Scheme, Side, StepCondition, SwaptionCondition,
    TridiagonalOperator,
};
