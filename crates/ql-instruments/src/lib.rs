//! # ql-instruments
//!
//! Instrument descriptions consumed by the pricers: option payoffs,
//! exercise schedules and fixed-leg swap schedules.  All times are year
//! fractions from today.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod exercise;
pub mod payoff;
pub mod swap;

pub use exercise::{Exercise, ExerciseType};
pub use payoff::{OptionType, Payoff, PlainVanillaPayoff, StrikedPayoff};
pub use swap::{FixedLegConvention, FixedLegSchedule, SwapType};
