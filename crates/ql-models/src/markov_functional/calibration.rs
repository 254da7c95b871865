//! Calibration instruments and the closure of the calibration set.
//!
//! The numeraire is tabulated on the expiries of the calibration
//! instruments.  Every payment of an instrument that falls before the next
//! tabulated time must itself be a tabulated time, otherwise its zero bond
//! could not be integrated.  The set is therefore closed first, by adding
//! instruments on the missing payment times until none is missing, and
//! frozen afterwards.

use ql_core::{ensure, errors::Result, fail, Real, Time};
use ql_instruments::FixedLegConvention;
use ql_termstructures::{OptionletVolatilityStructure, SmileSection, SwaptionVolatilityStructure};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Two times closer than this are the same date.
pub(crate) const TIME_EPSILON: Time = 1e-8;

const MAX_CLOSURE_ITERATIONS: usize = 10_000;

/// Expiry used as an ordered map key (total order on `f64`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpiryKey(pub Time);

impl Eq for ExpiryKey {}

impl PartialOrd for ExpiryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExpiryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One caplet or swaption of the calibration set.
#[derive(Debug, Clone)]
pub struct CalibrationPoint {
    /// `true` for a caplet, `false` for a swaption.
    pub is_caplet: bool,
    /// Tenor in years.
    pub tenor: Time,
    /// Payment times of the fixed leg (caplet: the single payment).
    pub payment_times: Vec<Time>,
    /// Accrual fractions, the first one starting at the expiry.
    pub year_fractions: Vec<Real>,
    /// Market annuity `Σ τ_k P(T_k)`.
    pub annuity: Real,
    /// Market ATM rate.
    pub atm: Real,
    /// Market smile carrying the ATM level.
    pub raw_smile_section: Option<Arc<dyn SmileSection>>,
    /// Smile used for the digital inversion.
    pub smile_section: Option<Arc<dyn SmileSection>>,
    /// Digital price at the lower rate bound.
    pub min_rate_digital: Real,
    /// Digital price at the upper rate bound.
    pub max_rate_digital: Real,
}

impl CalibrationPoint {
    fn new(is_caplet: bool, tenor: Time, payment_times: Vec<Time>, year_fractions: Vec<Real>) -> Self {
        Self {
            is_caplet,
            tenor,
            payment_times,
            year_fractions,
            annuity: 0.0,
            atm: 0.0,
            raw_smile_section: None,
            smile_section: None,
            min_rate_digital: 0.0,
            max_rate_digital: 0.0,
        }
    }

    /// Last payment time.
    pub fn maturity(&self) -> Time {
        self.payment_times.last().copied().unwrap_or(0.0)
    }

    /// The smile used for the digital inversion.
    ///
    /// # Errors
    /// Fails before the smiles have been updated.
    pub fn smile(&self) -> Result<&Arc<dyn SmileSection>> {
        match &self.smile_section {
            Some(s) => Ok(s),
            None => fail!("smile section of calibration point not yet set"),
        }
    }

    /// The market smile with the model ATM level.
    ///
    /// # Errors
    /// Fails before the smiles have been updated.
    pub fn raw_smile(&self) -> Result<&Arc<dyn SmileSection>> {
        match &self.raw_smile_section {
            Some(s) => Ok(s),
            None => fail!("raw smile section of calibration point not yet set"),
        }
    }
}

/// Ordered calibration set, keyed by expiry.
pub type CalibrationSet = BTreeMap<ExpiryKey, CalibrationPoint>;

/// Market instruments the model calibrates to.
#[derive(Debug, Clone)]
pub enum CalibrationInstrument {
    /// Swaptions on a fixed leg with the given conventions.
    Swaption {
        /// Swaption volatilities.
        volatility: Arc<dyn SwaptionVolatilityStructure>,
        /// Fixed-leg conventions of the underlying swaps.
        fixed_leg: FixedLegConvention,
    },
    /// Caplets on an ibor rate of the given tenor.
    Caplet {
        /// Caplet volatilities.
        volatility: Arc<dyn OptionletVolatilityStructure>,
        /// Ibor tenor in years.
        ibor_tenor: Time,
    },
}

impl CalibrationInstrument {
    fn name(&self) -> &'static str {
        match self {
            Self::Swaption { .. } => "swaption",
            Self::Caplet { .. } => "caplet",
        }
    }

    /// Market smile at `expiry` for an instrument of `tenor` years.
    pub fn smile_section(&self, expiry: Time, tenor: Time) -> Arc<dyn SmileSection> {
        match self {
            Self::Swaption { volatility, .. } => volatility.smile_section(expiry, tenor),
            Self::Caplet { volatility, .. } => volatility.smile_section(expiry),
        }
    }

    /// Build the point at `expiry`.  Caplets ignore `tenor`.
    pub fn make_point(&self, expiry: Time, tenor: Time) -> Result<CalibrationPoint> {
        match self {
            Self::Swaption { fixed_leg, .. } => {
                let schedule = fixed_leg.schedule(expiry, tenor)?;
                Ok(CalibrationPoint::new(
                    false,
                    tenor,
                    schedule.payment_times().to_vec(),
                    schedule.accruals().to_vec(),
                ))
            }
            Self::Caplet { ibor_tenor, .. } => Ok(CalibrationPoint::new(
                true,
                *ibor_tenor,
                vec![expiry + ibor_tenor],
                vec![*ibor_tenor],
            )),
        }
    }

    /// Tenor of a point added at `t` to cover payments up to `known`.
    ///
    /// Swaptions run whole months, rounded up, to `known` (less half a day);
    /// caplets keep the ibor tenor.
    fn closing_tenor(&self, t: Time, known: Time) -> Time {
        match self {
            Self::Swaption { .. } => ((known - t - 0.5 / 365.0) * 12.0).ceil().max(1.0) / 12.0,
            Self::Caplet { ibor_tenor, .. } => *ibor_tenor,
        }
    }
}

fn insert_point(
    set: &mut CalibrationSet,
    instrument: &CalibrationInstrument,
    expiry: Time,
    tenor: Time,
) -> Result<()> {
    ensure!(expiry > 0.0, "{} expiry ({expiry}) must be positive", instrument.name());
    ensure!(
        !set.keys().any(|k| (k.0 - expiry).abs() < TIME_EPSILON),
        "{} expiry ({}) occurs more than once in calibration set",
        instrument.name(),
        expiry
    );
    let point = instrument.make_point(expiry, tenor)?;
    set.insert(ExpiryKey(expiry), point);
    Ok(())
}

/// Build the closed calibration set for the user instruments.
///
/// Returns the set together with the numeraire time (the latest payment).
pub fn close_calibration_set(
    instrument: &CalibrationInstrument,
    expiries: &[Time],
    tenors: &[Time],
) -> Result<(CalibrationSet, Time)> {
    let mut set = CalibrationSet::new();
    for (i, &expiry) in expiries.iter().enumerate() {
        let tenor = tenors.get(i).copied().unwrap_or(0.0);
        insert_point(&mut set, instrument, expiry, tenor)?;
    }

    for _ in 0..MAX_CLOSURE_ITERATIONS {
        let numeraire_time = set
            .values()
            .map(CalibrationPoint::maturity)
            .fold(Real::NEG_INFINITY, Real::max);

        let mut known = numeraire_time;
        let mut missing = None;
        'scan: for (expiry, point) in set.iter().rev() {
            for &t in point.payment_times.iter().rev() {
                if t < known - TIME_EPSILON {
                    missing = Some((t, known));
                    break 'scan;
                }
            }
            known = expiry.0;
        }

        match missing {
            None => return Ok((set, numeraire_time)),
            Some((t, known)) => {
                let tenor = instrument.closing_tenor(t, known);
                tracing::debug!(expiry = t, tenor, "adding {} to calibration set", instrument.name());
                insert_point(&mut set, instrument, t, tenor)?;
            }
        }
    }
    fail!(
        "calibration set did not close after {} additions",
        MAX_CLOSURE_ITERATIONS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_termstructures::{ConstantOptionletVolatility, ConstantSwaptionVolatility};

    fn swaptions() -> CalibrationInstrument {
        CalibrationInstrument::Swaption {
            volatility: Arc::new(ConstantSwaptionVolatility::new(0.2)),
            fixed_leg: FixedLegConvention::annual(),
        }
    }

    fn expiries(set: &CalibrationSet) -> Vec<Time> {
        set.keys().map(|k| k.0).collect()
    }

    #[test]
    fn coterminal_set_is_already_closed() {
        let (set, numeraire) = close_calibration_set(&swaptions(), &[1.0, 2.0], &[2.0, 1.0]).unwrap();
        assert_eq!(expiries(&set), vec![1.0, 2.0]);
        assert_abs_diff_eq!(numeraire, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn missing_payment_times_are_added() {
        let (set, numeraire) = close_calibration_set(&swaptions(), &[1.0], &[3.0]).unwrap();
        assert_abs_diff_eq!(numeraire, 4.0, epsilon = 1e-12);
        let e = expiries(&set);
        assert_eq!(e.len(), 3);
        assert_abs_diff_eq!(e[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(e[2], 3.0, epsilon = 1e-12);
        for key in [e[1], e[2]] {
            let p = &set[&ExpiryKey(key)];
            assert_abs_diff_eq!(p.tenor, 1.0, epsilon = 1e-12);
            assert_eq!(p.payment_times.len(), 1);
        }
    }

    #[test]
    fn caplets_chain_up_to_the_numeraire() {
        let caplets = CalibrationInstrument::Caplet {
            volatility: Arc::new(ConstantOptionletVolatility::new(0.2)),
            ibor_tenor: 0.5,
        };
        let (set, numeraire) = close_calibration_set(&caplets, &[1.0, 2.0], &[]).unwrap();
        assert_abs_diff_eq!(numeraire, 2.5, epsilon = 1e-12);
        let e = expiries(&set);
        assert_eq!(e.len(), 3);
        assert_abs_diff_eq!(e[1], 1.5, epsilon = 1e-12);
        assert!(set.values().all(|p| p.is_caplet));
    }

    #[test]
    fn duplicate_expiries_are_rejected() {
        let err = close_calibration_set(&swaptions(), &[1.0, 1.0], &[1.0, 2.0]).unwrap_err();
        assert!(err.to_string().contains("occurs more than once"));
    }
}
