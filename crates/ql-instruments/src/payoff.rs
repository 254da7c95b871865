//! Option payoffs.
//!
//! Payoffs describe the terminal (or exercise) payoff of an option as a
//! function of the underlying asset price.  The finite-difference pricers
//! evaluate them on the grid to seed the value vector and to build the
//! early-exercise obstacle.

use ql_core::Real;
use std::fmt;

/// Option type (call or put).
///
/// Corresponds to `QuantLib::Option::Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    /// A call option (right to buy).
    Call,
    /// A put option (right to sell).
    Put,
}

impl OptionType {
    /// +1 for Call, −1 for Put.
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// Base trait for option payoffs.
///
/// Corresponds to `QuantLib::Payoff`.
pub trait Payoff: fmt::Debug + Send + Sync {
    /// Compute the payoff given the underlying price at exercise/expiry.
    fn value(&self, price: Real) -> Real;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> String {
        self.name().to_string()
    }
}

/// A payoff depending on a strike price.
///
/// Corresponds to `QuantLib::StrikedTypePayoff`.
pub trait StrikedPayoff: Payoff {
    /// The strike price.
    fn strike(&self) -> Real;

    /// The option type (call / put).
    fn option_type(&self) -> OptionType;
}

/// Standard "plain vanilla" European/American option payoff.
///
/// `payoff = max(φ(S − K), 0)` where `φ = +1` for Call, `−1` for Put.
///
/// Corresponds to `QuantLib::PlainVanillaPayoff`.
#[derive(Debug, Clone, Copy)]
pub struct PlainVanillaPayoff {
    /// Option type.
    pub option_type: OptionType,
    /// Strike price.
    pub strike: Real,
}

impl PlainVanillaPayoff {
    /// Create a new plain vanilla payoff.
    pub fn new(option_type: OptionType, strike: Real) -> Self {
        Self {
            option_type,
            strike,
        }
    }
}

impl Payoff for PlainVanillaPayoff {
    fn value(&self, price: Real) -> Real {
        (self.option_type.sign() * (price - self.strike)).max(0.0)
    }

    fn name(&self) -> &str {
        "Vanilla"
    }

    fn description(&self) -> String {
        format!("{} {} @ {}", self.name(), self.option_type, self.strike)
    }
}

impl StrikedPayoff for PlainVanillaPayoff {
    fn strike(&self) -> Real {
        self.strike
    }

    fn option_type(&self) -> OptionType {
        self.option_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanilla_call_and_put() {
        let call = PlainVanillaPayoff::new(OptionType::Call, 100.0);
        assert_eq!(call.value(110.0), 10.0);
        assert_eq!(call.value(90.0), 0.0);
        let put = PlainVanillaPayoff::new(OptionType::Put, 100.0);
        assert_eq!(put.value(90.0), 10.0);
        assert_eq!(put.value(110.0), 0.0);
    }

    #[test]
    fn description_mentions_type_and_strike() {
        let p = PlainVanillaPayoff::new(OptionType::Put, 95.5);
        assert_eq!(p.description(), "Vanilla Put @ 95.5");
        assert_eq!(p.strike(), 95.5);
        assert_eq!(p.option_type(), OptionType::Put);
    }
}
