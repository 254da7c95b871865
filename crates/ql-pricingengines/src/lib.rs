//! # ql-pricingengines
//!
//! Finite-difference pricers built on `ql-methods`, together with the
//! Black-Scholes formulas they use as control variates.
//!
//! ## Pricers
//!
//! - [`FdEuropeanOption`] — plain Crank–Nicolson rollback, no control variate
//! - [`FdAmericanOption`] — early exercise after every step
//! - [`FdBermudanOption`] — exercise on a set of dates
//! - [`FdDividendOption`] — European or American exercise with cash dividends
//! - [`FdEuropeanSwaption`] — European swaption under a one-factor short-rate model
//!
//! The option pricers share the period-by-period rollback of
//! [`MultiPeriodOption::calculate`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_european_engine;
pub mod fd_american_option;
pub mod fd_bermudan_option;
pub mod fd_dividend_option;
pub mod fd_european_option;
pub mod fd_european_swaption;
pub mod fd_multi_period_option;

pub use analytic_european_engine::{
    black_scholes_merton, discounted_dividends, escrowed_dividend_black_scholes,
};
pub use fd_american_option::FdAmericanOption;
pub use fd_bermudan_option::FdBermudanOption;
pub use fd_dividend_option::FdDividendOption;
pub use fd_european_option::FdEuropeanOption;
pub use fd_european_swaption::FdEuropeanSwaption;
pub use fd_multi_period_option::{FdOptionParameters, FdSetup, MultiPeriodOption, OptionResults};
