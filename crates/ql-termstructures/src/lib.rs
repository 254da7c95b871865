//! # ql-termstructures
//!
//! Time-based market data: yield curves, Black volatility, smile sections
//! and swaption / caplet volatility structures.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `TermStructure` — base trait for all term structures.
pub mod term_structure;

/// `YieldTermStructure` — yield / interest-rate term structures.
pub mod yield_term_structure;

/// `FlatForward` — constant forward-rate yield curve.
pub mod flat_forward;

/// `VolatilityTermStructure` — base trait for volatility term structures.
pub mod volatility_term_structure;

/// `BlackVolTermStructure` — Black-volatility term structures and `BlackConstantVol`.
pub mod black_vol_term_structure;

/// `SmileSection` — smile interface with flat and ATM-adjusted sections.
pub mod smile_section;

/// Swaption and optionlet volatility structures.
pub mod swaption_volatility;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use black_vol_term_structure::{BlackConstantVol, BlackVolTermStructure};
pub use flat_forward::FlatForward;
pub use smile_section::{
    AtmSmileSection, FlatSmileSection, SmileOptionType, SmileSection, VolatilityType,
};
pub use swaption_volatility::{
    ConstantOptionletVolatility, ConstantSwaptionVolatility, OptionletVolatilityStructure,
    SwaptionVolatilityStructure,
};
pub use term_structure::TermStructure;
pub use volatility_term_structure::VolatilityTermStructure;
pub use yield_term_structure::YieldTermStructure;
