//! # ql-core
//!
//! Core types and error definitions shared by every crate of the
//! finite-difference / Markov-functional workspace.
//!
//! This crate provides the foundational building blocks – type aliases, the
//! error hierarchy with its `ensure!`/`fail!` macros, and the `LazyObject`
//! caching pattern used by calibrated models.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Error types and the `ensure!` / `fail!` / `ensure_post!` macros.
pub mod errors;

/// Design patterns (lazy calculation).
pub mod patterns;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Integer type used for signed grid offsets.
pub type Integer = i32;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// A rate expressed as a decimal (e.g. 0.05 = 5 %).
pub type Rate = Real;

/// A discount factor in [0, 1].
pub type DiscountFactor = Real;

/// A volatility level expressed as a decimal.
pub type Volatility = Real;

/// A time measurement in years.
pub type Time = Real;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use errors::{Error, Result};
pub use patterns::lazy_object::{LazyObject, LazyState};
