//! # quantlib-fd
//!
//! Finite-difference PDE pricing and the Markov-functional interest-rate
//! model, written in the manner of [QuantLib](https://www.quantlib.org/).
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `ql-*` crates.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! quantlib-fd = "0.1"
//! ```
//!
//! ```rust
//! use quantlib_fd::instruments::OptionType;
//! use quantlib_fd::pricingengines::{FdAmericanOption, FdOptionParameters, MultiPeriodOption};
//!
//! let params = FdOptionParameters::new(OptionType::Put, 36.0, 40.0, 0.0, 0.06, 1.0, 0.2);
//! let results = FdAmericanOption::new(params).calculate()?;
//! assert!(results.value > 4.0 && results.value < 4.6);
//! # Ok::<(), quantlib_fd::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ql_core as core;

/// Arrays, matrices, distributions, interpolation, solvers, quadrature.
pub use ql_math as math;

/// Yield and volatility term structures.
pub use ql_termstructures as termstructures;

/// Stochastic process definitions.
pub use ql_processes as processes;

/// Short-rate and Markov-functional models.
pub use ql_models as models;

/// Finite-difference framework.
pub use ql_methods as methods;

/// Payoffs, exercise and fixed-leg schedules.
pub use ql_instruments as instruments;

/// Finite-difference pricers.
pub use ql_pricingengines as pricingengines;
