//! Markov-functional one-factor model.
//!
//! The numeraire `N(t, y)` is tabulated on a grid of the standardized state
//! `y` at each calibration expiry.  Going backwards from the numeraire time,
//! every slice is chosen so that digital options on the calibration rate
//! reproduce the market smile: the model digital at node `y_j` is an
//! integral of the deflated annuity over `[y_j, ∞)`, and the swap rate at
//! `y_j` is the strike at which the market digital has that price.
//!
//! Inputs are immutable after construction.  The tabulation is cached
//! through [`LazyObject`]; [`LazyObject::update`] marks it stale.

mod calibration;
mod outputs;
mod settings;

pub use calibration::{CalibrationInstrument, CalibrationPoint, CalibrationSet, ExpiryKey};
pub use outputs::ModelOutputs;
pub use settings::{Adjustments, ModelSettings};

use crate::gaussian1d::{gaussian_shifted_polynomial_integral, y_grid};
use calibration::{close_calibration_set, TIME_EPSILON};
use ql_core::{ensure, errors::Result, Error, LazyObject, LazyState, Real, Time};
use ql_instruments::{FixedLegConvention, FixedLegSchedule, OptionType, SwapType};
use ql_math::{Array, Brent, CubicSpline, GaussHermiteIntegration, Matrix};
use ql_processes::{MfStateProcess, StochasticProcess1D};
use ql_termstructures::{
    AtmSmileSection, OptionletVolatilityStructure, SmileOptionType, SmileSection,
    SwaptionVolatilityStructure, VolatilityType, YieldTermStructure,
};
use std::cell::{Cell, RefCell};
use std::f64::consts::{PI, SQRT_2};
use std::fmt;
use std::sync::Arc;

/// Payoff integrals are truncated at this many standard deviations.
const INTEGRATION_CUTOFF: Real = 100.0;

/// Floor of the deflated swap value when backing out the numeraire.
const MIN_DEFLATED_SWAP: Real = 1e-6;

/// Distance kept from the rate bounds by the initial Brent guess.
const GUESS_MARGIN: Real = 1e-5;

const DEFAULT_LOGNORMAL_MONEYNESS: [Real; 8] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 3.0];
const DEFAULT_NORMAL_MONEYNESS: [Real; 7] = [-0.02, -0.01, -0.005, 0.0, 0.005, 0.01, 0.02];

fn smile_option_type(option_type: OptionType) -> SmileOptionType {
    match option_type {
        OptionType::Call => SmileOptionType::Call,
        OptionType::Put => SmileOptionType::Put,
    }
}

/// Markov-functional model calibrated to swaptions or caplets.
pub struct MarkovFunctional {
    yts: Arc<dyn YieldTermStructure>,
    instrument: CalibrationInstrument,
    settings: ModelSettings,
    state_process: MfStateProcess,
    numeraire_time: Time,
    /// `0`, the calibration expiries and the numeraire time.
    times: Vec<Time>,
    /// Standardized state grid `j·h`, `j = -n..=n`.
    y: Array,
    /// Gauss-Hermite nodes and weights for the standard normal density.
    normal_x: Vec<Real>,
    normal_w: Vec<Real>,
    calibration_points: RefCell<CalibrationSet>,
    discrete_numeraire: RefCell<Matrix>,
    numeraire_splines: RefCell<Vec<CubicSpline>>,
    outputs: RefCell<ModelOutputs>,
    lazy: LazyState,
}

impl fmt::Debug for MarkovFunctional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkovFunctional")
            .field("numeraire_time", &self.numeraire_time)
            .field("times", &self.times)
            .field("reversion", &self.state_process.reversion())
            .field("calculated", &self.lazy.calculated.get())
            .finish_non_exhaustive()
    }
}

impl MarkovFunctional {
    /// Model calibrated to swaptions on the fixed legs `expiries[i]` into
    /// `tenors[i]` years.
    ///
    /// # Errors
    /// Mismatched or empty expiries, invalid volatility steps, duplicate
    /// expiries and invalid settings are precondition errors.
    #[allow(clippy::too_many_arguments)]
    pub fn swaption_calibrated(
        yts: Arc<dyn YieldTermStructure>,
        reversion: Real,
        volatility_step_times: Vec<Time>,
        volatilities: Vec<Real>,
        swaption_vol: Arc<dyn SwaptionVolatilityStructure>,
        expiries: &[Time],
        tenors: &[Time],
        fixed_leg: FixedLegConvention,
        settings: ModelSettings,
    ) -> Result<Self> {
        ensure!(
            expiries.len() == tenors.len(),
            "number of swaption expiries ({}) is different from number of swaption tenors ({})",
            expiries.len(),
            tenors.len()
        );
        ensure!(
            !expiries.is_empty(),
            "need at least one swaption expiry to calibrate numeraire"
        );
        ensure!(
            tenors.iter().all(|&t| t > 0.0),
            "swaption tenors must be positive"
        );
        let instrument = CalibrationInstrument::Swaption {
            volatility: swaption_vol,
            fixed_leg,
        };
        Self::build(
            yts,
            reversion,
            volatility_step_times,
            volatilities,
            instrument,
            expiries,
            tenors,
            settings,
        )
    }

    /// Model calibrated to caplets fixing at `expiries` on an ibor rate of
    /// `ibor_tenor` years.
    ///
    /// # Errors
    /// As [`swaption_calibrated`](Self::swaption_calibrated).
    #[allow(clippy::too_many_arguments)]
    pub fn caplet_calibrated(
        yts: Arc<dyn YieldTermStructure>,
        reversion: Real,
        volatility_step_times: Vec<Time>,
        volatilities: Vec<Real>,
        caplet_vol: Arc<dyn OptionletVolatilityStructure>,
        expiries: &[Time],
        ibor_tenor: Time,
        settings: ModelSettings,
    ) -> Result<Self> {
        ensure!(
            !expiries.is_empty(),
            "need at least one caplet expiry to calibrate numeraire"
        );
        ensure!(ibor_tenor > 0.0, "ibor tenor ({ibor_tenor}) must be positive");
        let instrument = CalibrationInstrument::Caplet {
            volatility: caplet_vol,
            ibor_tenor,
        };
        Self::build(
            yts,
            reversion,
            volatility_step_times,
            volatilities,
            instrument,
            expiries,
            &[],
            settings,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        yts: Arc<dyn YieldTermStructure>,
        reversion: Real,
        volatility_step_times: Vec<Time>,
        volatilities: Vec<Real>,
        instrument: CalibrationInstrument,
        expiries: &[Time],
        tenors: &[Time],
        settings: ModelSettings,
    ) -> Result<Self> {
        settings.validate()?;
        ensure!(
            volatility_step_times.first().map_or(true, |&t| t > 0.0),
            "volatility step times must be positive"
        );
        ensure!(
            volatility_step_times.windows(2).all(|w| w[1] > w[0]),
            "volatility step times must be strictly increasing"
        );
        ensure!(
            volatilities.len() == volatility_step_times.len() + 1,
            "there must be n+1 volatilities ({}) for n volatility step times ({})",
            volatilities.len(),
            volatility_step_times.len()
        );
        ensure!(
            volatilities.iter().all(|&v| v > 0.0),
            "model volatilities must be positive"
        );

        let (calibration_set, numeraire_time) =
            close_calibration_set(&instrument, expiries, tenors)?;

        let mut times = Vec::with_capacity(calibration_set.len() + 2);
        times.push(0.0);
        times.extend(calibration_set.keys().map(|k| k.0));
        times.push(numeraire_time);

        let state_process = MfStateProcess::new(reversion, volatility_step_times, volatilities)?;
        let y = y_grid(
            &state_process,
            settings.y_std_devs,
            settings.y_grid_points,
            1.0,
            0.0,
            0.0,
        );

        let gh = GaussHermiteIntegration::new(settings.gauss_hermite_points)?;
        let normal_x = gh.x().iter().map(|x| x * SQRT_2).collect();
        let normal_w = gh.w().iter().map(|w| w / PI.sqrt()).collect();

        let ones = vec![1.0; y.size()];
        let splines = times
            .iter()
            .map(|_| CubicSpline::monotonic_lagrange(y.as_slice(), &ones))
            .collect::<Result<Vec<_>>>()?;
        let discrete_numeraire = Matrix::from_fn(times.len(), y.size(), |_, _| 1.0);

        let outputs = ModelOutputs {
            dirty: true,
            settings: settings.clone(),
            expiries: calibration_set.keys().map(|k| k.0).collect(),
            tenors: calibration_set.values().map(|p| p.tenor).collect(),
            ..ModelOutputs::default()
        };

        tracing::debug!(
            calibration_points = calibration_set.len(),
            numeraire_time,
            grid_points = y.size(),
            "markov functional model set up"
        );

        Ok(Self {
            yts,
            instrument,
            settings,
            state_process,
            numeraire_time,
            times,
            y,
            normal_x,
            normal_w,
            calibration_points: RefCell::new(calibration_set),
            discrete_numeraire: RefCell::new(discrete_numeraire),
            numeraire_splines: RefCell::new(splines),
            outputs: RefCell::new(outputs),
            lazy: LazyState::new(),
        })
    }

    // ── Inspectors ───────────────────────────────────────────────────────

    /// Maturity of the terminal zero bond used as numeraire.
    pub fn numeraire_time(&self) -> Time {
        self.numeraire_time
    }

    /// `0`, the calibration expiries and the numeraire time.
    pub fn calibration_times(&self) -> &[Time] {
        &self.times
    }

    /// Standardized state grid on which the numeraire is tabulated.
    pub fn y_grid(&self) -> &Array {
        &self.y
    }

    /// Numerical settings.
    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// State process of the model.
    pub fn state_process(&self) -> &MfStateProcess {
        &self.state_process
    }

    /// Discount curve the model reprices.
    pub fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
        &self.yts
    }

    /// Copy of the tabulated (normalized) numeraire, one row per calibration
    /// time.
    pub fn discrete_numeraire(&self) -> Result<Matrix> {
        self.calculate()?;
        Ok(self.discrete_numeraire.borrow().clone())
    }

    /// Copy of the closed calibration set.
    pub fn calibration_points(&self) -> Result<CalibrationSet> {
        self.calculate()?;
        Ok(self.calibration_points.borrow().clone())
    }

    // ── Messages ─────────────────────────────────────────────────────────

    fn message(&self, text: String) {
        tracing::debug!("{text}");
        self.outputs.borrow_mut().messages.push(text);
    }

    fn warning(&self, text: String) {
        tracing::warn!("{text}");
        self.outputs.borrow_mut().messages.push(format!("WARNING: {text}"));
    }

    // ── Calibration ──────────────────────────────────────────────────────

    fn update_smiles(&self) -> Result<()> {
        self.message("updating smiles".into());
        self.outputs.borrow_mut().dirty = true;

        let mut points = self.calibration_points.borrow_mut();
        for (expiry, point) in points.iter_mut().rev() {
            let annuity: Real = point
                .payment_times
                .iter()
                .zip(&point.year_fractions)
                .map(|(&t, &tau)| tau * self.yts.discount(t))
                .sum();
            let maturity = point.maturity();
            point.annuity = annuity;
            point.atm = (self.yts.discount(expiry.0) - self.yts.discount(maturity)) / annuity;

            let market = self.instrument.smile_section(expiry.0, point.tenor);
            let raw: Arc<dyn SmileSection> =
                Arc::new(AtmSmileSection::new(market, Some(point.atm))?);
            point.raw_smile_section = Some(raw.clone());
            point.smile_section = Some(raw.clone());

            let gap = self.settings.digital_gap;
            point.min_rate_digital = raw.digital_option_price(
                self.settings.lower_rate_bound - raw.shift(),
                SmileOptionType::Call,
                annuity,
                gap,
            )?;
            point.max_rate_digital = raw.digital_option_price(
                self.settings.upper_rate_bound - raw.shift(),
                SmileOptionType::Call,
                annuity,
                gap,
            )?;
        }
        Ok(())
    }

    fn update_numeraire_tabulation(&self) -> Result<()> {
        self.message("updating numeraire tabulation".into());
        {
            let mut out = self.outputs.borrow_mut();
            out.dirty = true;
            out.adjustment_factors.clear();
            out.digitals_adjustment_factors.clear();
        }

        let s = &self.settings;
        let y = self.y.as_slice();
        let ny = y.len();
        let numeraire0 = self.yts.discount(self.numeraire_time);
        let points = self.calibration_points.borrow();

        for (idx, (expiry, point)) in (1..self.times.len() - 1).rev().zip(points.iter().rev()) {
            let t = self.times[idx];
            let normalization = self.yts.discount(t) / numeraire0;

            let mut annuities = Array::zeros(ny);
            let mut final_payments = Array::zeros(ny);
            for (&payment, &tau) in point.payment_times.iter().zip(&point.year_fractions) {
                final_payments = self.deflated_zerobond_array(payment, t, &self.y)?;
                annuities += &(&final_payments * tau);
            }

            let spline = CubicSpline::monotonic_lagrange(y, annuities.as_slice())?;
            let (ca, cb, cc) = (
                spline.a_coefficients(),
                spline.b_coefficients(),
                spline.c_coefficients(),
            );
            let shift = point.raw_smile()?.shift();

            let passes = if s.adjustments.contains(Adjustments::ADJUST_DIGITALS) {
                2
            } else {
                1
            };
            let mut correction = 1.0;
            let mut digital = 0.0;
            let mut row = Array::from_element(ny, 1.0);

            for pass in 0..passes {
                if pass == 1 {
                    correction = point.annuity / digital;
                }
                digital = 0.0;
                let mut swap_rate0 = s.upper_rate_bound / 2.0;

                for j in (0..ny).rev() {
                    let mut integral = if j == ny - 1 {
                        if s.adjustments.contains(Adjustments::NO_PAYOFF_EXTRAPOLATION) {
                            0.0
                        } else if s.adjustments.contains(Adjustments::EXTRAPOLATE_PAYOFF_FLAT) {
                            gaussian_shifted_polynomial_integral(
                                0.0,
                                0.0,
                                0.0,
                                0.0,
                                annuities[j - 1],
                                y[j - 1],
                                y[j],
                                INTEGRATION_CUTOFF,
                            )
                        } else {
                            gaussian_shifted_polynomial_integral(
                                0.0,
                                cc[j - 1],
                                cb[j - 1],
                                ca[j - 1],
                                annuities[j - 1],
                                y[j - 1],
                                y[j],
                                INTEGRATION_CUTOFF,
                            )
                        }
                    } else {
                        gaussian_shifted_polynomial_integral(
                            0.0,
                            cc[j],
                            cb[j],
                            ca[j],
                            annuities[j],
                            y[j],
                            y[j],
                            y[j + 1],
                        )
                    };

                    if integral < 0.0 {
                        self.warning(format!(
                            "integral for digital price is negative for j={j} ({integral}), reset to zero"
                        ));
                        integral = 0.0;
                    }

                    digital += integral * numeraire0 * correction;

                    let (mut swap_rate, check) = if digital >= point.min_rate_digital {
                        (s.lower_rate_bound - shift, false)
                    } else if digital <= point.max_rate_digital {
                        (s.upper_rate_bound, false)
                    } else {
                        (
                            self.solve_market_swap_rate(expiry.0, point, digital, swap_rate0, shift)?,
                            true,
                        )
                    };
                    if check && j < ny - 1 && swap_rate > swap_rate0 {
                        self.warning(format!(
                            "swap rate is decreasing in y for t={t}, j={j}: (y, swap rate) is ({}, {swap_rate}) \
                             but for j={} it is ({}, {swap_rate0}), reset rate to {swap_rate0} in node j={j}",
                            y[j],
                            j + 1,
                            y[j + 1],
                        ));
                        swap_rate = swap_rate0;
                    }
                    swap_rate0 = swap_rate;

                    let deflated_swap =
                        (swap_rate * annuities[j] + final_payments[j]).max(MIN_DEFLATED_SWAP);
                    row[j] = normalization / deflated_swap;
                }
            }

            self.store_numeraire_row(idx, &row)?;

            let yts_factor = if s.adjustments.contains(Adjustments::ADJUST_YTS) {
                let model = self.deflated_zerobond(t, 0.0, 0.0)?;
                let factor = model / normalization;
                row *= factor;
                self.store_numeraire_row(idx, &row)?;
                factor
            } else {
                1.0
            };

            let mut out = self.outputs.borrow_mut();
            out.adjustment_factors.insert(0, yts_factor);
            out.digitals_adjustment_factors.insert(0, correction);
        }

        tracing::debug!(slices = points.len(), "numeraire tabulation finished");
        Ok(())
    }

    fn store_numeraire_row(&self, idx: usize, row: &Array) -> Result<()> {
        self.discrete_numeraire.borrow_mut().set_row(idx, row);
        self.numeraire_splines.borrow_mut()[idx].update(row.as_slice())
    }

    fn point_digital_price(
        &self,
        point: &CalibrationPoint,
        option_type: OptionType,
        strike: Real,
    ) -> Result<Real> {
        point.smile()?.digital_option_price(
            strike,
            smile_option_type(option_type),
            point.annuity,
            self.settings.digital_gap,
        )
    }

    fn solve_market_swap_rate(
        &self,
        expiry: Time,
        point: &CalibrationPoint,
        digital_price: Real,
        guess: Real,
        shift: Real,
    ) -> Result<Real> {
        let s = &self.settings;
        let lower = s.lower_rate_bound - shift;
        let guess = guess
            .min(s.upper_rate_bound - GUESS_MARGIN)
            .max(lower + GUESS_MARGIN);

        let mut failure = None;
        let solution = Brent::default().solve(
            |strike| match self.point_digital_price(point, OptionType::Call, strike) {
                Ok(price) => price - digital_price,
                Err(e) => {
                    failure.get_or_insert(e);
                    Real::NAN
                }
            },
            s.market_rate_accuracy,
            guess,
            lower,
            s.upper_rate_bound,
        );
        if let Some(e) = failure {
            return Err(e);
        }
        solution.map_err(|e| match e {
            Error::MaxEvaluations { evaluations, .. } => Error::MaxEvaluations {
                what: format!(
                    "market swap rate for digital price {digital_price} at expiry {expiry}"
                ),
                evaluations,
            },
            other => other,
        })
    }

    /// Strike at which the market digital call at `expiry` costs
    /// `digital_price`, searched from `guess`.
    ///
    /// # Errors
    /// Unknown expiry, or the root search fails.
    pub fn market_swap_rate(&self, expiry: Time, digital_price: Real, guess: Real) -> Result<Real> {
        self.calculate()?;
        let points = self.calibration_points.borrow();
        let point = Self::find_point(&points, expiry)?;
        let shift = point.raw_smile()?.shift();
        self.solve_market_swap_rate(expiry, point, digital_price, guess, shift)
    }

    /// Market digital price (annuity-discounted) at `expiry`.
    pub fn market_digital_price(
        &self,
        expiry: Time,
        option_type: OptionType,
        strike: Real,
    ) -> Result<Real> {
        self.calculate()?;
        let points = self.calibration_points.borrow();
        let point = Self::find_point(&points, expiry)?;
        self.point_digital_price(point, option_type, strike)
    }

    fn find_point(points: &CalibrationSet, expiry: Time) -> Result<&CalibrationPoint> {
        points
            .iter()
            .find(|(k, _)| (k.0 - expiry).abs() < TIME_EPSILON)
            .map(|(_, p)| p)
            .ok_or_else(|| {
                Error::InvalidArgument(format!("no calibration point at expiry {expiry}"))
            })
    }

    // ── Numeraire and zero bonds ─────────────────────────────────────────

    /// Numeraire on the states `y` at time `t`.
    ///
    /// States outside the tabulated grid are clamped to its ends; between
    /// calibration times the reciprocal numeraire is interpolated linearly.
    pub fn numeraire_array(&self, t: Time, y: &Array) -> Result<Array> {
        self.calculate()?;
        let numeraire0 = self.yts.discount(self.numeraire_time);
        if t < Real::EPSILON {
            return Ok(Array::from_element(y.size(), numeraire0));
        }

        let inverse_normalization = numeraire0 / self.yts.discount(t);
        let last = self.times.len() - 1;
        let tz = t.min(self.times[last]);
        let i = self.times[..last].partition_point(|&ti| ti <= t).min(last);
        let (ta, tb) = (self.times[i - 1], self.times[i]);
        let dt = tb - ta;

        let (y_lo, y_hi) = (self.y[0], self.y[self.y.size() - 1]);
        let splines = self.numeraire_splines.borrow();
        Ok(y
            .iter()
            .map(|&yv| {
                let yv = yv.clamp(y_lo, y_hi);
                let na = splines[i - 1].value(yv);
                let nb = splines[i].value(yv);
                inverse_normalization / ((tz - ta) / nb + (tb - tz) / na) * dt
            })
            .collect())
    }

    /// Numeraire `N(t, y)`.
    pub fn numeraire(&self, t: Time, y: Real) -> Result<Real> {
        if t == 0.0 {
            return Ok(self.yts.discount(self.numeraire_time));
        }
        Ok(self.numeraire_array(t, &Array::from_element(1, y))?[0])
    }

    /// `E[1/N(T) | y(t)]` on the states `y`, by Gauss-Hermite quadrature.
    pub fn deflated_zerobond_array(&self, big_t: Time, t: Time, y: &Array) -> Result<Array> {
        self.calculate()?;
        let p = &self.state_process;
        let sd_0_t = p.std_deviation_1d(0.0, 0.0, t);
        let sd_0_big_t = p.std_deviation_1d(0.0, 0.0, big_t);
        let sd_t_big_t = p.std_deviation_1d(t, 0.0, big_t - t);

        let mut result = Array::zeros(y.size());
        for (j, &yj) in y.iter().enumerate() {
            let ya: Array = self
                .normal_x
                .iter()
                .map(|&x| (yj * sd_0_t + sd_t_big_t * x) / sd_0_big_t)
                .collect();
            let numeraire = self.numeraire_array(big_t, &ya)?;
            result[j] = self
                .normal_w
                .iter()
                .zip(numeraire.iter())
                .map(|(w, n)| w / n)
                .sum();
        }
        Ok(result)
    }

    /// `E[1/N(T) | y(t) = y]`.
    pub fn deflated_zerobond(&self, big_t: Time, t: Time, y: Real) -> Result<Real> {
        Ok(self.deflated_zerobond_array(big_t, t, &Array::from_element(1, y))?[0])
    }

    /// Zero bonds `P(t, T)` on the states `y`.
    pub fn zerobond_array(&self, big_t: Time, t: Time, y: &Array) -> Result<Array> {
        let deflated = self.deflated_zerobond_array(big_t, t, y)?;
        let numeraire = self.numeraire_array(t, y)?;
        Ok(&deflated * &numeraire)
    }

    /// Zero bond `P(t, T | y)`; the market discount factor at `t = 0`.
    pub fn zerobond(&self, big_t: Time, t: Time, y: Real) -> Result<Real> {
        if t == 0.0 {
            return Ok(self.yts.discount(big_t));
        }
        Ok(self.zerobond_array(big_t, t, &Array::from_element(1, y))?[0])
    }

    // ── Rates ────────────────────────────────────────────────────────────

    /// Simply compounded forward rate over `[fixing, fixing + tenor]` seen
    /// from `(t, y)`.
    pub fn forward_rate(&self, fixing: Time, tenor: Time, t: Time, y: Real) -> Result<Real> {
        ensure!(tenor > 0.0, "forward rate tenor ({tenor}) must be positive");
        let start = self.zerobond(fixing, t, y)?;
        let end = self.zerobond(fixing + tenor, t, y)?;
        Ok((start - end) / (tenor * end))
    }

    /// Annuity `Σ τ_k P(t, T_k | y)` of a fixed leg.
    pub fn swap_annuity(&self, schedule: &FixedLegSchedule, t: Time, y: Real) -> Result<Real> {
        schedule
            .payment_times()
            .iter()
            .zip(schedule.accruals())
            .map(|(&pay, &tau)| -> Result<Real> { Ok(tau * self.zerobond(pay, t, y)?) })
            .sum()
    }

    /// Par rate of a swap whose floating leg runs from the schedule start to
    /// its maturity.
    pub fn swap_rate(&self, schedule: &FixedLegSchedule, t: Time, y: Real) -> Result<Real> {
        let annuity = self.swap_annuity(schedule, t, y)?;
        let start = self.zerobond(schedule.start_time(), t, y)?;
        let end = self.zerobond(schedule.maturity(), t, y)?;
        Ok((start - end) / annuity)
    }

    // ── Options ──────────────────────────────────────────────────────────

    /// European swaption on `schedule` exercised at `expiry`, seen from
    /// `(t, y)`.  `Call` is the payer swaption.
    pub fn swaption_price(
        &self,
        option_type: OptionType,
        expiry: Time,
        schedule: &FixedLegSchedule,
        strike: Real,
        t: Time,
        y: Real,
    ) -> Result<Real> {
        self.calculate()?;
        ensure!(expiry >= t, "swaption expiry ({expiry}) before valuation time ({t})");
        ensure!(
            schedule.start_time() >= expiry - TIME_EPSILON,
            "swap start ({}) before swaption expiry ({expiry})",
            schedule.start_time()
        );
        let grid = self.conditional_grid(expiry, t, y);
        let mut payoff = Array::zeros(grid.size());
        for (i, &yi) in grid.iter().enumerate() {
            let annuity = self.swap_annuity(schedule, expiry, yi)?;
            let start = self.zerobond(schedule.start_time(), expiry, yi)?;
            let end = self.zerobond(schedule.maturity(), expiry, yi)?;
            let rate = (start - end) / annuity;
            payoff[i] = annuity * (option_type.sign() * (rate - strike)).max(0.0)
                / self.numeraire(expiry, yi)?;
        }
        Ok(self.integrate_payoff(option_type, &payoff)? * self.numeraire(t, y)?)
    }

    /// Caplet (`Call`) or floorlet (`Put`) fixing at `expiry` on a rate of
    /// `tenor` years, seen from `(t, y)`.
    pub fn caplet_price(
        &self,
        option_type: OptionType,
        expiry: Time,
        tenor: Time,
        strike: Real,
        t: Time,
        y: Real,
    ) -> Result<Real> {
        self.calculate()?;
        ensure!(expiry >= t, "caplet expiry ({expiry}) before valuation time ({t})");
        let grid = self.conditional_grid(expiry, t, y);
        let mut payoff = Array::zeros(grid.size());
        for (i, &yi) in grid.iter().enumerate() {
            let annuity = self.zerobond(expiry + tenor, expiry, yi)? * tenor;
            let rate = self.forward_rate(expiry, tenor, expiry, yi)?;
            payoff[i] = annuity * (option_type.sign() * (rate - strike)).max(0.0)
                / self.numeraire(expiry, yi)?;
        }
        Ok(self.integrate_payoff(option_type, &payoff)? * self.numeraire(t, y)?)
    }

    fn conditional_grid(&self, big_t: Time, t: Time, y: Real) -> Array {
        y_grid(
            &self.state_process,
            self.settings.y_std_devs,
            self.settings.y_grid_points,
            big_t,
            t,
            y,
        )
    }

    /// `∫ p(z) φ(z) dz` for deflated payoff values on the standardized grid.
    fn integrate_payoff(&self, option_type: OptionType, payoff: &Array) -> Result<Real> {
        let z = self.y.as_slice();
        let p = payoff.as_slice();
        let n = z.len();
        let spline = CubicSpline::monotonic_lagrange(z, p)?;
        let (a, b, c) = (
            spline.a_coefficients(),
            spline.b_coefficients(),
            spline.c_coefficients(),
        );

        let mut price: Real = (0..n - 1)
            .map(|i| gaussian_shifted_polynomial_integral(0.0, c[i], b[i], a[i], p[i], z[i], z[i], z[i + 1]))
            .sum();

        let adjustments = self.settings.adjustments;
        if !adjustments.contains(Adjustments::NO_PAYOFF_EXTRAPOLATION) {
            if adjustments.contains(Adjustments::EXTRAPOLATE_PAYOFF_FLAT) {
                price += gaussian_shifted_polynomial_integral(
                    0.0, 0.0, 0.0, 0.0, p[n - 2], z[n - 2], z[n - 1], INTEGRATION_CUTOFF,
                );
                price += gaussian_shifted_polynomial_integral(
                    0.0, 0.0, 0.0, 0.0, p[0], z[0], -INTEGRATION_CUTOFF, z[0],
                );
            } else {
                match option_type {
                    OptionType::Call => {
                        price += gaussian_shifted_polynomial_integral(
                            0.0,
                            c[n - 2],
                            b[n - 2],
                            a[n - 2],
                            p[n - 2],
                            z[n - 2],
                            z[n - 1],
                            INTEGRATION_CUTOFF,
                        )
                    }
                    OptionType::Put => {
                        price += gaussian_shifted_polynomial_integral(
                            0.0, c[0], b[0], a[0], p[0], z[0], -INTEGRATION_CUTOFF, z[0],
                        )
                    }
                }
            }
        }
        Ok(price)
    }

    // ── Diagnostics ──────────────────────────────────────────────────────

    /// Calibration diagnostics.
    ///
    /// Recalculates the model if needed and fills the yield curve and smile
    /// fit tables once per calculation.
    pub fn model_outputs(&self) -> Result<ModelOutputs> {
        self.calculate()?;
        if !self.outputs.borrow().dirty {
            return Ok(self.outputs.borrow().clone());
        }

        let mut market_zerorate = Vec::new();
        let mut model_zerorate = Vec::new();
        for &t in &self.times[1..self.times.len() - 1] {
            market_zerorate.push(self.yts.zero_rate(t));
            // a tiny positive time avoids the t = 0 shortcut to the market curve
            model_zerorate.push(-self.zerobond(t, 1.0e-10, 0.0)?.ln() / t);
        }

        let points = self.calibration_points.borrow().clone();
        let mut fit = SmileFit::default();
        for (expiry, point) in &points {
            self.smile_fit(expiry.0, point, &mut fit)?;
        }

        let mut out = self.outputs.borrow_mut();
        out.market_zerorate = market_zerorate;
        out.model_zerorate = model_zerorate;
        out.atm = points.values().map(|p| p.atm).collect();
        out.annuity = points.values().map(|p| p.annuity).collect();
        out.smile_strikes = fit.strikes;
        out.market_raw_call_premium = fit.market_raw_call;
        out.market_raw_put_premium = fit.market_raw_put;
        out.market_call_premium = fit.market_call;
        out.market_put_premium = fit.market_put;
        out.model_call_premium = fit.model_call;
        out.model_put_premium = fit.model_put;
        out.market_vega = fit.market_vega;
        out.dirty = false;
        Ok(out.clone())
    }

    fn smile_fit(&self, expiry: Time, point: &CalibrationPoint, fit: &mut SmileFit) -> Result<()> {
        let sec = point.smile()?;
        let raw = point.raw_smile()?;
        let shift = sec.shift();
        let normal = sec.volatility_type() == VolatilityType::Normal;
        let moneyness: Vec<Real> = if !self.settings.smile_moneyness_checkpoints.is_empty() {
            self.settings.smile_moneyness_checkpoints.clone()
        } else if normal {
            DEFAULT_NORMAL_MONEYNESS.to_vec()
        } else {
            DEFAULT_LOGNORMAL_MONEYNESS.to_vec()
        };
        let schedule = if point.is_caplet {
            None
        } else {
            Some(FixedLegSchedule::new(
                SwapType::Payer,
                1.0,
                0.0,
                expiry,
                point.payment_times.clone(),
            )?)
        };

        let mut row = SmileFitRow::default();
        for m in moneyness {
            let k = if normal {
                point.atm + m
            } else {
                m * (point.atm + shift) - shift
            };
            row.strikes.push(k);
            // raw sections may lack what is needed to price; report zero then
            row.market_raw_call
                .push(raw.option_price(k, SmileOptionType::Call, point.annuity).unwrap_or(0.0));
            row.market_raw_put
                .push(raw.option_price(k, SmileOptionType::Put, point.annuity).unwrap_or(0.0));
            row.market_call
                .push(sec.option_price(k, SmileOptionType::Call, point.annuity)?);
            row.market_put
                .push(sec.option_price(k, SmileOptionType::Put, point.annuity)?);
            let (call, put) = match &schedule {
                Some(schedule) => (
                    self.swaption_price(OptionType::Call, expiry, schedule, k, 0.0, 0.0)?,
                    self.swaption_price(OptionType::Put, expiry, schedule, k, 0.0, 0.0)?,
                ),
                None => (
                    self.caplet_price(OptionType::Call, expiry, point.tenor, k, 0.0, 0.0)?,
                    self.caplet_price(OptionType::Put, expiry, point.tenor, k, 0.0, 0.0)?,
                ),
            };
            row.model_call.push(call);
            row.model_put.push(put);
            row.market_vega.push(sec.vega(k, point.annuity)?);
        }
        fit.push(row);
        Ok(())
    }
}

#[derive(Default)]
struct SmileFitRow {
    strikes: Vec<Real>,
    market_raw_call: Vec<Real>,
    market_raw_put: Vec<Real>,
    market_call: Vec<Real>,
    market_put: Vec<Real>,
    model_call: Vec<Real>,
    model_put: Vec<Real>,
    market_vega: Vec<Real>,
}

#[derive(Default)]
struct SmileFit {
    strikes: Vec<Vec<Real>>,
    market_raw_call: Vec<Vec<Real>>,
    market_raw_put: Vec<Vec<Real>>,
    market_call: Vec<Vec<Real>>,
    market_put: Vec<Vec<Real>>,
    model_call: Vec<Vec<Real>>,
    model_put: Vec<Vec<Real>>,
    market_vega: Vec<Vec<Real>>,
}

impl SmileFit {
    fn push(&mut self, row: SmileFitRow) {
        self.strikes.push(row.strikes);
        self.market_raw_call.push(row.market_raw_call);
        self.market_raw_put.push(row.market_raw_put);
        self.market_call.push(row.market_call);
        self.market_put.push(row.market_put);
        self.model_call.push(row.model_call);
        self.model_put.push(row.model_put);
        self.market_vega.push(row.market_vega);
    }
}

impl LazyObject for MarkovFunctional {
    fn perform_calculations(&self) -> Result<()> {
        self.outputs.borrow_mut().dirty = true;
        self.update_smiles()?;
        self.update_numeraire_tabulation()
    }

    fn calculated_flag(&self) -> &Cell<bool> {
        &self.lazy.calculated
    }

    fn freeze_count(&self) -> &Cell<u32> {
        &self.lazy.freeze_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_termstructures::{ConstantSwaptionVolatility, FlatForward};

    fn model(expiries: &[Time], tenors: &[Time]) -> Result<MarkovFunctional> {
        MarkovFunctional::swaption_calibrated(
            Arc::new(FlatForward::new(0.03)),
            0.01,
            vec![],
            vec![0.01],
            Arc::new(ConstantSwaptionVolatility::new(0.005).with_type(VolatilityType::Normal, 0.0)),
            expiries,
            tenors,
            FixedLegConvention::annual(),
            ModelSettings::default().with_y_grid_points(16).with_gauss_hermite_points(16),
        )
    }

    #[test]
    fn times_bracket_the_calibration_expiries() {
        let m = model(&[1.0], &[3.0]).unwrap();
        let times = m.calibration_times();
        assert_eq!(times.len(), 5);
        assert_eq!(times[0], 0.0);
        assert_abs_diff_eq!(times[4], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.numeraire_time(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn state_grid_is_symmetric() {
        let m = model(&[1.0], &[1.0]).unwrap();
        let y = m.y_grid();
        assert_eq!(y.size(), 33);
        assert_abs_diff_eq!(y[16], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[32], 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[0], -7.0, epsilon = 1e-12);
    }

    #[test]
    fn numeraire_today_is_the_terminal_discount() {
        let m = model(&[1.0], &[1.0]).unwrap();
        assert_abs_diff_eq!(m.numeraire(0.0, 0.3).unwrap(), (-0.03_f64 * 2.0).exp(), epsilon = 1e-14);
    }

    #[test]
    fn update_marks_the_tabulation_stale() {
        let m = model(&[1.0], &[1.0]).unwrap();
        m.calculate().unwrap();
        m.update();
        assert!(!m.is_calculated());
        m.numeraire(0.5, 0.0).unwrap();
        assert!(m.is_calculated());
    }

    #[test]
    fn unknown_expiry_is_rejected() {
        let m = model(&[1.0], &[1.0]).unwrap();
        assert!(m.market_digital_price(0.7, OptionType::Call, 0.03).is_err());
        assert!(m.market_digital_price(1.0, OptionType::Call, 0.03).is_ok());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn numeraire_falls_as_the_state_rises(
                t in 0.05f64..2.5,
                y in -6.0f64..6.0,
                dy in 0.0f64..3.0,
            ) {
                let m = model(&[1.0], &[1.0]).unwrap();
                let states = Array::from_vec(vec![y, y + dy]);
                let numeraire = m.numeraire_array(t, &states).unwrap();
                prop_assert!(numeraire[0] > 0.0);
                prop_assert!(numeraire[1] <= numeraire[0] * (1.0 + 1e-12));
            }

            #[test]
            fn deflated_zerobonds_are_positive_and_decrease_with_maturity(
                t in 0.0f64..0.9,
                y in -3.0f64..3.0,
                gap in 0.05f64..0.5,
            ) {
                let m = model(&[1.0], &[1.0]).unwrap();
                let near = m.deflated_zerobond(1.0, t, y).unwrap();
                let far = m.deflated_zerobond(1.0 + gap, t, y).unwrap();
                prop_assert!(far > 0.0);
                prop_assert!(far < near);
            }
        }
    }
}
