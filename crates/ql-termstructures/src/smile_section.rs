//! `SmileSection` — the volatility smile at a single expiry.
//!
//! A smile section represents the implied volatility smile at a single expiry
//! as a function of strike.  The base trait provides default implementations
//! for option prices, digital prices, vega and density via Black or
//! Bachelier formulas.  Pricing needs an ATM level; sections handed out by
//! volatility structures may not know it, so the Markov-functional model
//! wraps them in an [`AtmSmileSection`] carrying the model-consistent
//! forward.
//!
//! Corresponds to `QuantLib::SmileSection`.

use ql_core::{ensure, errors::Result, Real, Time, Volatility};
use ql_math::distributions::{normal_cdf, normal_pdf};
use std::sync::Arc;

/// Volatility type indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityType {
    /// Shifted log-normal (Black) volatility.
    ShiftedLognormal,
    /// Normal (Bachelier) volatility.
    Normal,
}

/// Option type for smile section pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmileOptionType {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl SmileOptionType {
    fn sign(self) -> Real {
        match self {
            SmileOptionType::Call => 1.0,
            SmileOptionType::Put => -1.0,
        }
    }
}

/// A volatility smile at a single expiry.
///
/// Corresponds to `QuantLib::SmileSection`.
pub trait SmileSection: std::fmt::Debug + Send + Sync {
    // ── Required methods ──────────────────────────────────────────────────

    /// Minimum valid strike for this smile section.
    fn min_strike(&self) -> Real;

    /// Maximum valid strike for this smile section.
    fn max_strike(&self) -> Real;

    /// ATM level (forward), if known.
    fn atm_level(&self) -> Option<Real>;

    /// Implied volatility at a given strike.
    fn volatility_impl(&self, strike: Real) -> Volatility;

    /// Time to expiry in years.
    fn exercise_time(&self) -> Time;

    // ── Provided accessors ────────────────────────────────────────────────

    /// Volatility type (default: ShiftedLognormal).
    fn volatility_type(&self) -> VolatilityType {
        VolatilityType::ShiftedLognormal
    }

    /// Shift for shifted log-normal (default: 0).
    fn shift(&self) -> Real {
        0.0
    }

    // ── Derived methods ───────────────────────────────────────────────────

    /// Implied volatility at a given strike.
    fn volatility(&self, strike: Real) -> Volatility {
        self.volatility_impl(strike)
    }

    /// Total variance σ²·T at a given strike.
    fn variance(&self, strike: Real) -> Real {
        let vol = self.volatility_impl(strike);
        vol * vol * self.exercise_time()
    }

    /// Undiscounted-times-`discount` option price.
    ///
    /// # Errors
    /// The section must provide an ATM level.
    fn option_price(&self, strike: Real, option_type: SmileOptionType, discount: Real) -> Result<Real> {
        let f = require_atm(self.atm_level())?;
        let t = self.exercise_time();
        let vol = self.volatility_impl(strike);
        let shift = self.shift();

        Ok(match self.volatility_type() {
            VolatilityType::ShiftedLognormal => {
                // a zero shifted strike has no well-defined vol, price is the forward
                let std_dev = if (strike + shift).abs() < Real::EPSILON {
                    0.2
                } else {
                    vol * t.sqrt()
                };
                black_formula(f + shift, strike + shift, std_dev, discount, option_type)
            }
            VolatilityType::Normal => {
                bachelier_formula(f, strike, vol * t.sqrt(), discount, option_type)
            }
        })
    }

    /// Digital option price via finite difference of option prices.
    ///
    /// The left strike is floored at `-shift` for shifted log-normal smiles.
    fn digital_option_price(
        &self,
        strike: Real,
        option_type: SmileOptionType,
        discount: Real,
        gap: Real,
    ) -> Result<Real> {
        let kl = (strike - gap / 2.0).max(self.strike_floor());
        let kr = kl + gap;
        let pl = self.option_price(kl, option_type, discount)?;
        let pr = self.option_price(kr, option_type, discount)?;
        Ok(option_type.sign() * (pl - pr) / gap)
    }

    /// Density derived from a second finite difference of call prices.
    fn density(&self, strike: Real, discount: Real, gap: Real) -> Result<Real> {
        let kl = (strike - gap / 2.0).max(self.strike_floor());
        let kr = kl + gap;
        let dl = self.digital_option_price(kl, SmileOptionType::Call, discount, gap)?;
        let dr = self.digital_option_price(kr, SmileOptionType::Call, discount, gap)?;
        Ok((dl - dr) / gap)
    }

    /// Vega per 1% volatility move.
    fn vega(&self, strike: Real, discount: Real) -> Result<Real> {
        let f = require_atm(self.atm_level())?;
        let t = self.exercise_time();
        let vol = self.volatility_impl(strike);
        let shift = self.shift();

        Ok(match self.volatility_type() {
            VolatilityType::ShiftedLognormal => {
                let std_dev = vol * t.sqrt();
                if std_dev < 1e-15 {
                    return Ok(0.0);
                }
                let fwd = f + shift;
                let k = strike + shift;
                let d1 = ((fwd / k).ln() + 0.5 * std_dev * std_dev) / std_dev;
                discount * fwd * normal_pdf(d1) * t.sqrt() * 0.01
            }
            VolatilityType::Normal => {
                discount * normal_pdf((f - strike) / (vol * t.sqrt())) * t.sqrt() * 0.01
            }
        })
    }

    /// Lowest strike at which prices are defined.
    fn strike_floor(&self) -> Real {
        match self.volatility_type() {
            VolatilityType::ShiftedLognormal => -self.shift(),
            VolatilityType::Normal => Real::MIN,
        }
    }
}

fn require_atm(atm: Option<Real>) -> Result<Real> {
    match atm {
        Some(f) => Ok(f),
        None => Err(ql_core::Error::Precondition(
            "smile section must provide atm level to compute option price".into(),
        )),
    }
}

// ── Black and Bachelier formulas ──────────────────────────────────────────────

/// Black formula for a call or put on a (shifted) forward.
pub fn black_formula(
    forward: Real,
    strike: Real,
    std_dev: Real,
    discount: Real,
    option_type: SmileOptionType,
) -> Real {
    let intrinsic = (option_type.sign() * (forward - strike)).max(0.0);
    if std_dev <= 0.0 || forward <= 0.0 || strike <= 0.0 {
        return discount * intrinsic;
    }
    let d1 = ((forward / strike).ln() + 0.5 * std_dev * std_dev) / std_dev;
    let d2 = d1 - std_dev;
    match option_type {
        SmileOptionType::Call => discount * (forward * normal_cdf(d1) - strike * normal_cdf(d2)),
        SmileOptionType::Put => discount * (strike * normal_cdf(-d2) - forward * normal_cdf(-d1)),
    }
}

/// Bachelier (normal) formula for a call or put.
pub fn bachelier_formula(
    forward: Real,
    strike: Real,
    std_dev: Real,
    discount: Real,
    option_type: SmileOptionType,
) -> Real {
    if std_dev <= 0.0 {
        return discount * (option_type.sign() * (forward - strike)).max(0.0);
    }
    let d = (forward - strike) / std_dev;
    match option_type {
        SmileOptionType::Call => discount * (std_dev * normal_pdf(d) + (forward - strike) * normal_cdf(d)),
        SmileOptionType::Put => discount * (std_dev * normal_pdf(d) - (forward - strike) * normal_cdf(-d)),
    }
}

// ── FlatSmileSection ──────────────────────────────────────────────────────────

/// A constant-volatility smile section.
///
/// Corresponds to `QuantLib::FlatSmileSection`.
#[derive(Debug, Clone)]
pub struct FlatSmileSection {
    exercise_time: Time,
    vol: Volatility,
    atm_level: Option<Real>,
    vol_type: VolatilityType,
    shift: Real,
}

impl FlatSmileSection {
    /// Create a flat smile section.
    pub fn new(exercise_time: Time, vol: Volatility, atm_level: Option<Real>) -> Self {
        Self {
            exercise_time,
            vol,
            atm_level,
            vol_type: VolatilityType::ShiftedLognormal,
            shift: 0.0,
        }
    }

    /// Create with volatility type and shift.
    pub fn with_type(mut self, vol_type: VolatilityType, shift: Real) -> Self {
        self.vol_type = vol_type;
        self.shift = shift;
        self
    }
}

impl SmileSection for FlatSmileSection {
    fn min_strike(&self) -> Real {
        match self.vol_type {
            VolatilityType::ShiftedLognormal => -self.shift,
            VolatilityType::Normal => Real::MIN,
        }
    }

    fn max_strike(&self) -> Real {
        Real::MAX
    }

    fn atm_level(&self) -> Option<Real> {
        self.atm_level
    }

    fn volatility_impl(&self, _strike: Real) -> Volatility {
        self.vol
    }

    fn exercise_time(&self) -> Time {
        self.exercise_time
    }

    fn volatility_type(&self) -> VolatilityType {
        self.vol_type
    }

    fn shift(&self) -> Real {
        self.shift
    }
}

// ── AtmSmileSection ───────────────────────────────────────────────────────────

/// A smile section with an overridden ATM level.
///
/// Volatilities come from the wrapped section; prices are computed around
/// the given forward.
///
/// Corresponds to `QuantLib::AtmSmileSection`.
#[derive(Debug, Clone)]
pub struct AtmSmileSection {
    source: Arc<dyn SmileSection>,
    atm: Real,
}

impl AtmSmileSection {
    /// Wrap `source`, using `atm` if given and the source's own level otherwise.
    ///
    /// # Errors
    /// Neither `atm` nor the source provides an ATM level.
    pub fn new(source: Arc<dyn SmileSection>, atm: Option<Real>) -> Result<Self> {
        let atm = atm.or_else(|| source.atm_level());
        ensure!(
            atm.is_some(),
            "atm level must be provided by source section or given in the constructor"
        );
        Ok(Self {
            atm: atm.unwrap_or_default(),
            source,
        })
    }

    /// The wrapped section.
    pub fn source(&self) -> &Arc<dyn SmileSection> {
        &self.source
    }
}

impl SmileSection for AtmSmileSection {
    fn min_strike(&self) -> Real {
        self.source.min_strike()
    }

    fn max_strike(&self) -> Real {
        self.source.max_strike()
    }

    fn atm_level(&self) -> Option<Real> {
        Some(self.atm)
    }

    fn volatility_impl(&self, strike: Real) -> Volatility {
        self.source.volatility(strike)
    }

    fn variance(&self, strike: Real) -> Real {
        self.source.variance(strike)
    }

    fn exercise_time(&self) -> Time {
        self.source.exercise_time()
    }

    fn volatility_type(&self) -> VolatilityType {
        self.source.volatility_type()
    }

    fn shift(&self) -> Real {
        self.source.shift()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
