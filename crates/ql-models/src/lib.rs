//! # ql-models
//!
//! Interest-rate models consumed by the finite-difference engines and the
//! Markov-functional numeraire tabulation.
//!
//! ## Trait hierarchy
//!
//! ```text
//! ShortRateModel
//! └── OneFactorModel  → Vasicek (dynamics: x = r − b, Ornstein-Uhlenbeck)
//! LazyObject          → MarkovFunctional
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Infrastructure ───────────────────────────────────────────────────────
pub mod gaussian1d;
pub mod short_rate_model;

// ── One-factor short-rate models ─────────────────────────────────────────
pub mod vasicek;

// ── Markov-functional model ──────────────────────────────────────────────
pub mod markov_functional;

// ── Re-exports ───────────────────────────────────────────────────────────
pub use markov_functional::{
    Adjustments, CalibrationInstrument, CalibrationPoint, MarkovFunctional, ModelOutputs,
    ModelSettings,
};
pub use short_rate_model::{OneFactorModel, ShortRateDynamics, ShortRateModel};
pub use vasicek::Vasicek;
