//! Markov-functional model: calibration to flat normal and shifted
//! log-normal smiles on a flat curve.
//!
//! For a single-period calibration instrument paying at the numeraire time
//! the deflated annuity is constant, so the tabulated rate at `y = 0` is
//! the market median of the rate up to the root-finder accuracy.  Under a
//! normal smile the median is the ATM level; under a shifted log-normal
//! smile it is `(atm + s)·exp(−σ²T/2) − s`.

use approx::assert_abs_diff_eq;
use ql_core::{Error, Time};
use ql_instruments::{FixedLegConvention, FixedLegSchedule, OptionType, SwapType};
use ql_models::{Adjustments, MarkovFunctional, ModelSettings};
use ql_termstructures::{
    ConstantOptionletVolatility, ConstantSwaptionVolatility, FlatForward, VolatilityType,
    YieldTermStructure,
};
use std::sync::Arc;

const RATE: f64 = 0.03;
const NORMAL_VOL: f64 = 0.005;
const LOGNORMAL_VOL: f64 = 0.2;
const SHIFT: f64 = 0.01;

/// Route `tracing` events to the test output; `RUST_LOG=debug` shows the
/// tabulation.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn curve() -> Arc<FlatForward> {
    Arc::new(FlatForward::new(RATE))
}

fn swaption_vol() -> Arc<ConstantSwaptionVolatility> {
    Arc::new(ConstantSwaptionVolatility::new(NORMAL_VOL).with_type(VolatilityType::Normal, 0.0))
}

fn swaption_model(
    expiries: &[Time],
    tenors: &[Time],
    settings: ModelSettings,
) -> Result<MarkovFunctional, Error> {
    MarkovFunctional::swaption_calibrated(
        curve(),
        0.01,
        vec![],
        vec![0.01],
        swaption_vol(),
        expiries,
        tenors,
        FixedLegConvention::annual(),
        settings,
    )
}

fn lognormal_model(expiry: Time, settings: ModelSettings) -> Result<MarkovFunctional, Error> {
    MarkovFunctional::swaption_calibrated(
        curve(),
        0.01,
        vec![],
        vec![0.01],
        Arc::new(
            ConstantSwaptionVolatility::new(LOGNORMAL_VOL)
                .with_type(VolatilityType::ShiftedLognormal, SHIFT),
        ),
        &[expiry],
        &[1.0],
        FixedLegConvention::annual(),
        settings,
    )
}

fn atm_swap_rate(start: Time, length: Time) -> f64 {
    let yts = curve();
    let schedule =
        FixedLegSchedule::from_tenor(SwapType::Payer, 1.0, 0.0, start, length, 1).unwrap();
    schedule.fair_rate(|t| yts.discount(t))
}

// ───────────────────────── calibration ─────────────────────────

#[test]
fn tabulated_swap_rate_at_the_median_is_atm() {
    init_tracing();
    let model = swaption_model(&[1.0], &[1.0], ModelSettings::default()).unwrap();
    let schedule = FixedLegSchedule::from_tenor(SwapType::Payer, 1.0, 0.0, 1.0, 1.0, 1).unwrap();
    let model_rate = model.swap_rate(&schedule, 1.0, 0.0).unwrap();
    assert_abs_diff_eq!(model_rate, atm_swap_rate(1.0, 1.0), epsilon = 1e-6);
}

#[test]
fn atm_rate_is_repriced_on_every_expiry() {
    let settings = ModelSettings::default();
    let accuracy = settings.market_rate_accuracy;
    for expiry in [0.5, 1.0, 2.0, 5.0] {
        let model = swaption_model(&[expiry], &[1.0], settings.clone()).unwrap();
        let schedule =
            FixedLegSchedule::from_tenor(SwapType::Payer, 1.0, 0.0, expiry, 1.0, 1).unwrap();
        let model_rate = model.swap_rate(&schedule, expiry, 0.0).unwrap();
        let atm = atm_swap_rate(expiry, 1.0);
        assert!(
            (model_rate - atm).abs() <= accuracy,
            "expiry {expiry}: model {model_rate}, atm {atm}"
        );
    }
}

#[test]
fn shifted_lognormal_median_is_repriced() {
    let settings = ModelSettings::default();
    let accuracy = settings.market_rate_accuracy;
    for expiry in [1.0, 3.0] {
        let model = lognormal_model(expiry, settings.clone()).unwrap();
        let schedule =
            FixedLegSchedule::from_tenor(SwapType::Payer, 1.0, 0.0, expiry, 1.0, 1).unwrap();
        let model_rate = model.swap_rate(&schedule, expiry, 0.0).unwrap();
        let median = (atm_swap_rate(expiry, 1.0) + SHIFT)
            * (-0.5 * LOGNORMAL_VOL * LOGNORMAL_VOL * expiry).exp()
            - SHIFT;
        assert!(
            (model_rate - median).abs() <= accuracy,
            "expiry {expiry}: model {model_rate}, median {median}"
        );
    }
}

#[test]
fn shifted_lognormal_smile_fit_uses_relative_moneyness() {
    let model = lognormal_model(1.0, ModelSettings::default()).unwrap();
    let outputs = model.model_outputs().unwrap();
    let atm = outputs.atm[0];
    assert_abs_diff_eq!(atm, atm_swap_rate(1.0, 1.0), epsilon = 1e-15);
    let strikes = &outputs.smile_strikes[0];
    assert_eq!(strikes.len(), 8);
    // strike = m·(atm + s) − s
    assert_abs_diff_eq!(strikes[0], 0.25 * (atm + SHIFT) - SHIFT, epsilon = 1e-15);
    assert_abs_diff_eq!(strikes[3], atm, epsilon = 1e-15);
    assert_abs_diff_eq!(strikes[7], 3.0 * (atm + SHIFT) - SHIFT, epsilon = 1e-15);
    let atm_index = 3;
    assert_abs_diff_eq!(
        outputs.model_call_premium[0][atm_index],
        outputs.market_call_premium[0][atm_index],
        epsilon = 5e-5
    );
    assert_abs_diff_eq!(
        outputs.model_put_premium[0][atm_index],
        outputs.market_put_premium[0][atm_index],
        epsilon = 5e-5
    );
    assert!(outputs.market_vega[0].iter().all(|v| *v > 0.0));
}

#[test]
fn tabulated_swap_rate_increases_with_the_state() {
    let model = swaption_model(&[1.0], &[1.0], ModelSettings::default()).unwrap();
    let schedule = FixedLegSchedule::from_tenor(SwapType::Payer, 1.0, 0.0, 1.0, 1.0, 1).unwrap();
    let low = model.swap_rate(&schedule, 1.0, -1.0).unwrap();
    let mid = model.swap_rate(&schedule, 1.0, 0.0).unwrap();
    let high = model.swap_rate(&schedule, 1.0, 1.0).unwrap();
    assert!(low < mid && mid < high);
    // a normal smile maps one standard deviation of y to σ√T of the rate
    assert_abs_diff_eq!(high - mid, NORMAL_VOL, epsilon = 1e-5);
}

#[test]
fn caplet_calibration_reproduces_the_forward() {
    let model = MarkovFunctional::caplet_calibrated(
        curve(),
        0.01,
        vec![],
        vec![0.01],
        Arc::new(ConstantOptionletVolatility::new(NORMAL_VOL).with_type(VolatilityType::Normal, 0.0)),
        &[1.0],
        0.5,
        ModelSettings::default(),
    )
    .unwrap();
    assert_abs_diff_eq!(model.numeraire_time(), 1.5, epsilon = 1e-12);
    let yts = curve();
    let forward = (yts.discount(1.0) / yts.discount(1.5) - 1.0) / 0.5;
    let model_forward = model.forward_rate(1.0, 0.5, 1.0, 0.0).unwrap();
    assert_abs_diff_eq!(model_forward, forward, epsilon = 1e-6);
}

#[test]
fn zero_bonds_reprice_the_curve() {
    let model = swaption_model(&[1.0], &[3.0], ModelSettings::default()).unwrap();
    let outputs = model.model_outputs().unwrap();
    assert_eq!(outputs.market_zerorate.len(), 3);
    for (market, model) in outputs.market_zerorate.iter().zip(&outputs.model_zerorate) {
        assert_abs_diff_eq!(*market, RATE, epsilon = 1e-12);
        assert_abs_diff_eq!(*model, *market, epsilon = 1e-4);
    }
}

#[test]
fn yts_adjustment_tightens_the_curve_fit() {
    init_tracing();
    let settings = ModelSettings::default()
        .add_adjustment(Adjustments::ADJUST_YTS)
        .add_adjustment(Adjustments::ADJUST_DIGITALS);
    let model = swaption_model(&[1.0], &[3.0], settings).unwrap();
    let outputs = model.model_outputs().unwrap();
    for (market, model) in outputs.market_zerorate.iter().zip(&outputs.model_zerorate) {
        assert_abs_diff_eq!(*model, *market, epsilon = 1e-5);
    }
    assert_eq!(outputs.adjustment_factors.len(), 3);
    for factor in outputs
        .adjustment_factors
        .iter()
        .chain(&outputs.digitals_adjustment_factors)
    {
        assert_abs_diff_eq!(*factor, 1.0, epsilon = 1e-3);
    }
}

#[test]
fn calibration_set_is_closed_over_the_payment_times() {
    let model = swaption_model(&[1.0], &[3.0], ModelSettings::default()).unwrap();
    let times = model.calibration_times();
    assert_eq!(times.len(), 5);
    for (t, expected) in times.iter().zip([0.0, 1.0, 2.0, 3.0, 4.0]) {
        assert_abs_diff_eq!(*t, expected, epsilon = 1e-12);
    }
    let outputs = model.model_outputs().unwrap();
    assert_eq!(outputs.expiries.len(), 3);
    assert_abs_diff_eq!(outputs.tenors[0], 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(outputs.tenors[1], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(outputs.tenors[2], 1.0, epsilon = 1e-12);
}

// ───────────────────────── pricing ─────────────────────────

#[test]
fn atm_swaption_matches_the_market_premium() {
    let model = swaption_model(&[1.0], &[1.0], ModelSettings::default()).unwrap();
    let outputs = model.model_outputs().unwrap();
    // default normal checkpoints: the fourth strike is ATM
    let atm_index = 3;
    assert_abs_diff_eq!(
        outputs.smile_strikes[0][atm_index],
        outputs.atm[0],
        epsilon = 1e-15
    );
    assert_abs_diff_eq!(
        outputs.model_call_premium[0][atm_index],
        outputs.market_call_premium[0][atm_index],
        epsilon = 5e-5
    );
    assert_abs_diff_eq!(
        outputs.model_put_premium[0][atm_index],
        outputs.market_put_premium[0][atm_index],
        epsilon = 5e-5
    );
}

#[test]
fn payer_minus_receiver_is_the_forward_swap() {
    let model = swaption_model(&[1.0], &[1.0], ModelSettings::default()).unwrap();
    let schedule = FixedLegSchedule::from_tenor(SwapType::Payer, 1.0, 0.0, 1.0, 1.0, 1).unwrap();
    let strike = atm_swap_rate(1.0, 1.0) + 0.005;
    let payer = model
        .swaption_price(OptionType::Call, 1.0, &schedule, strike, 0.0, 0.0)
        .unwrap();
    let receiver = model
        .swaption_price(OptionType::Put, 1.0, &schedule, strike, 0.0, 0.0)
        .unwrap();
    let yts = curve();
    let forward_swap = yts.discount(1.0) - (1.0 + strike) * yts.discount(2.0);
    assert_abs_diff_eq!(payer - receiver, forward_swap, epsilon = 5e-5);
}

#[test]
fn market_digital_inverts_to_the_strike() {
    let model = swaption_model(&[1.0], &[1.0], ModelSettings::default()).unwrap();
    let strike = atm_swap_rate(1.0, 1.0) + 0.002;
    let digital = model
        .market_digital_price(1.0, OptionType::Call, strike)
        .unwrap();
    let implied = model.market_swap_rate(1.0, digital, 0.05).unwrap();
    assert_abs_diff_eq!(implied, strike, epsilon = 1e-6);
}

// ───────────────────────── lifecycle and diagnostics ─────────────────────────

#[test]
fn outputs_record_messages_and_render() {
    let model = swaption_model(&[1.0], &[1.0], ModelSettings::default()).unwrap();
    let outputs = model.model_outputs().unwrap();
    assert!(!outputs.dirty);
    assert!(outputs.messages.iter().any(|m| m == "updating smiles"));
    assert!(outputs
        .messages
        .iter()
        .any(|m| m == "updating numeraire tabulation"));
    let text = outputs.to_string();
    assert!(text.contains("Yield termstructure fit:"));
    assert!(text.contains("Volatility smile fit:"));
}

#[test]
fn numeraire_at_the_numeraire_time_is_one() {
    let model = swaption_model(&[1.0], &[1.0], ModelSettings::default()).unwrap();
    for y in [-2.0, 0.0, 1.5] {
        assert_abs_diff_eq!(model.numeraire(2.0, y).unwrap(), 1.0, epsilon = 1e-12);
    }
    let yts = curve();
    assert_abs_diff_eq!(
        model.zerobond(1.5, 0.0, 0.0).unwrap(),
        yts.discount(1.5),
        epsilon = 1e-15
    );
}

// ───────────────────────── preconditions ─────────────────────────

fn assert_precondition(result: Result<MarkovFunctional, Error>, fragment: &str) {
    match result {
        Err(Error::Precondition(msg)) => {
            assert!(msg.contains(fragment), "unexpected message: {msg}")
        }
        other => panic!("expected precondition error containing '{fragment}', got {other:?}"),
    }
}

#[test]
fn mismatched_expiries_and_tenors_are_rejected() {
    assert_precondition(
        swaption_model(&[1.0, 2.0], &[1.0], ModelSettings::default()),
        "number of swaption expiries (2) is different from number of swaption tenors (1)",
    );
}

#[test]
fn empty_calibration_set_is_rejected() {
    assert_precondition(
        swaption_model(&[], &[], ModelSettings::default()),
        "need at least one swaption expiry",
    );
}

#[test]
fn duplicate_expiries_are_rejected() {
    assert_precondition(
        swaption_model(&[1.0, 1.0], &[1.0, 2.0], ModelSettings::default()),
        "occurs more than once in calibration set",
    );
}

#[test]
fn volatility_steps_must_match_volatilities() {
    let result = MarkovFunctional::swaption_calibrated(
        curve(),
        0.01,
        vec![1.0, 2.0],
        vec![0.01, 0.01],
        swaption_vol(),
        &[1.0],
        &[1.0],
        FixedLegConvention::annual(),
        ModelSettings::default(),
    );
    assert_precondition(result, "there must be n+1 volatilities (2) for n volatility step times (2)");

    let result = MarkovFunctional::swaption_calibrated(
        curve(),
        0.01,
        vec![2.0, 1.0],
        vec![0.01, 0.01, 0.01],
        swaption_vol(),
        &[1.0],
        &[1.0],
        FixedLegConvention::annual(),
        ModelSettings::default(),
    );
    assert_precondition(result, "strictly increasing");
}

#[test]
fn contradictory_extrapolation_settings_are_rejected() {
    let settings = ModelSettings::default()
        .add_adjustment(Adjustments::EXTRAPOLATE_PAYOFF_FLAT)
        .add_adjustment(Adjustments::NO_PAYOFF_EXTRAPOLATION);
    assert_precondition(
        swaption_model(&[1.0], &[1.0], settings),
        "mutually exclusive",
    );
}
