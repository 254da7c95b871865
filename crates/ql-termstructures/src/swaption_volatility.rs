//! Swaption and caplet volatility structures.
//!
//! Both hand out [`SmileSection`]s: per (expiry, swap length) for
//! swaptions, per expiry for optionlets.  The constant variants return flat
//! sections without an ATM level; consumers attach the forward they
//! compute from their own curve.

use crate::smile_section::{FlatSmileSection, SmileSection, VolatilityType};
use crate::term_structure::TermStructure;
use ql_core::{Real, Time, Volatility};
use std::sync::Arc;

/// Swaption volatility cube/matrix.
///
/// Corresponds to `QuantLib::SwaptionVolatilityStructure`.
pub trait SwaptionVolatilityStructure: TermStructure {
    /// The smile for options expiring at `expiry` on swaps of length `swap_length` years.
    fn smile_section(&self, expiry: Time, swap_length: Time) -> Arc<dyn SmileSection>;

    /// Implied volatility at a single point.
    fn volatility(&self, expiry: Time, swap_length: Time, strike: Real) -> Volatility {
        self.smile_section(expiry, swap_length).volatility(strike)
    }
}

/// Caplet/floorlet volatility structure.
///
/// Corresponds to `QuantLib::OptionletVolatilityStructure`.
pub trait OptionletVolatilityStructure: TermStructure {
    /// The smile for optionlets fixing at `expiry`.
    fn smile_section(&self, expiry: Time) -> Arc<dyn SmileSection>;

    /// Implied volatility at a single point.
    fn volatility(&self, expiry: Time, strike: Real) -> Volatility {
        self.smile_section(expiry).volatility(strike)
    }
}

// ── Constant structures ───────────────────────────────────────────────────────

/// A flat swaption volatility.
///
/// Corresponds to `QuantLib::ConstantSwaptionVolatility`.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSwaptionVolatility {
    volatility: Volatility,
    vol_type: VolatilityType,
    shift: Real,
}

impl ConstantSwaptionVolatility {
    /// Log-normal flat volatility.
    pub fn new(volatility: Volatility) -> Self {
        Self {
            volatility,
            vol_type: VolatilityType::ShiftedLognormal,
            shift: 0.0,
        }
    }

    /// Set volatility type and shift.
    pub fn with_type(mut self, vol_type: VolatilityType, shift: Real) -> Self {
        self.vol_type = vol_type;
        self.shift = shift;
        self
    }
}

impl TermStructure for ConstantSwaptionVolatility {}

impl SwaptionVolatilityStructure for ConstantSwaptionVolatility {
    fn smile_section(&self, expiry: Time, _swap_length: Time) -> Arc<dyn SmileSection> {
        Arc::new(
            FlatSmileSection::new(expiry, self.volatility, None).with_type(self.vol_type, self.shift),
        )
    }
}

/// A flat caplet volatility.
///
/// Corresponds to `QuantLib::ConstantOptionletVolatility`.
#[derive(Debug, Clone, Copy)]
pub struct ConstantOptionletVolatility {
    volatility: Volatility,
    vol_type: VolatilityType,
    shift: Real,
}

impl ConstantOptionletVolatility {
    /// Log-normal flat volatility.
    pub fn new(volatility: Volatility) -> Self {
        Self {
            volatility,
            vol_type: VolatilityType::ShiftedLognormal,
            shift: 0.0,
        }
    }

    /// Set volatility type and shift.
    pub fn with_type(mut self, vol_type: VolatilityType, shift: Real) -> Self {
        self.vol_type = vol_type;
        self.shift = shift;
        self
    }
}

impl TermStructure for ConstantOptionletVolatility {}

impl OptionletVolatilityStructure for ConstantOptionletVolatility {
    fn smile_section(&self, expiry: Time) -> Arc<dyn SmileSection> {
        Arc::new(
            FlatSmileSection::new(expiry, self.volatility, None).with_type(self.vol_type, self.shift),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_swaption_vol_sections() {
        let vol = ConstantSwaptionVolatility::new(0.2).with_type(VolatilityType::ShiftedLognormal, 0.01);
        let s = vol.smile_section(2.0, 5.0);
        assert_eq!(s.exercise_time(), 2.0);
        assert_eq!(s.shift(), 0.01);
        assert_eq!(s.atm_level(), None);
        assert_eq!(vol.volatility(2.0, 5.0, 0.03), 0.2);
    }

    #[test]
    fn constant_optionlet_vol_sections() {
        let vol = ConstantOptionletVolatility::new(0.0075).with_type(VolatilityType::Normal, 0.0);
        let s = vol.smile_section(1.5);
        assert_eq!(s.volatility_type(), VolatilityType::Normal);
        assert_eq!(vol.volatility(1.5, -0.01), 0.0075);
    }
}
