//! Finite-difference option pricers against Black-Scholes and against
//! each other.

use approx::assert_abs_diff_eq;
use ql_instruments::{ExerciseType, OptionType};
use ql_pricingengines::{
    black_scholes_merton, escrowed_dividend_black_scholes, FdAmericanOption, FdBermudanOption,
    FdDividendOption, FdEuropeanOption, FdOptionParameters, MultiPeriodOption,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn atm_call() -> FdOptionParameters {
    FdOptionParameters::new(OptionType::Call, 100.0, 100.0, 0.0, 0.05, 1.0, 0.2)
}

fn itm_put() -> FdOptionParameters {
    FdOptionParameters::new(OptionType::Put, 36.0, 40.0, 0.0, 0.06, 1.0, 0.2)
}

fn black_scholes(p: &FdOptionParameters) -> f64 {
    black_scholes_merton(
        p.option_type,
        p.underlying,
        p.strike,
        p.risk_free_rate,
        p.dividend_yield,
        p.volatility,
        p.residual_time,
    )
    .0
}

// ───────────────────────── European ─────────────────────────

#[test]
fn european_price_converges_to_black_scholes() {
    init_tracing();
    let params = atm_call();
    let exact = black_scholes(&params);
    let coarse = FdEuropeanOption::new(params.with_grid_points(101).with_time_steps(100))
        .calculate()
        .unwrap();
    let fine = FdEuropeanOption::new(params.with_grid_points(401).with_time_steps(400))
        .calculate()
        .unwrap();
    let coarse_error = (coarse.value - exact).abs();
    let fine_error = (fine.value - exact).abs();
    assert!(coarse_error < 0.05, "coarse error {coarse_error}");
    assert!(fine_error < 0.01, "fine error {fine_error}");
    assert!(fine_error < coarse_error);
}

#[test]
fn european_greeks_are_close_to_black_scholes() {
    let params = atm_call().with_grid_points(201).with_time_steps(200);
    let (_, delta, gamma, ..) = black_scholes_merton(
        params.option_type,
        params.underlying,
        params.strike,
        params.risk_free_rate,
        params.dividend_yield,
        params.volatility,
        params.residual_time,
    );
    let results = FdEuropeanOption::new(params).calculate().unwrap();
    assert_abs_diff_eq!(results.delta, delta, epsilon = 5e-3);
    assert_abs_diff_eq!(results.gamma, gamma, epsilon = 1e-3);
    // Calendar-time theta of a call is negative.
    assert!(results.theta < 0.0, "theta = {}", results.theta);
}

// ───────────────────────── American ─────────────────────────

#[test]
fn american_dominates_european_on_every_node() {
    let option = FdAmericanOption::new(itm_put());
    let setup = option.initialize_model().unwrap();
    let condition = option.initialize_step_condition(&setup).unwrap();
    let mut american = setup.intrinsic_values.clone();
    let mut european = setup.intrinsic_values.clone();
    setup
        .model
        .rollback(&mut american, 1.0, 0.0, 100, Some(condition.as_ref()))
        .unwrap();
    setup.model.rollback(&mut european, 1.0, 0.0, 100, None).unwrap();
    for (i, (a, e)) in american.iter().zip(european.iter()).enumerate() {
        assert!(a >= &(e - 1e-10), "node {i}: american {a} < european {e}");
    }
}

#[test]
fn american_call_without_dividends_is_european() {
    let params = atm_call();
    let results = FdAmericanOption::new(params).calculate().unwrap();
    assert_abs_diff_eq!(results.value, black_scholes(&params), epsilon = 1e-3);
}

#[test]
fn american_put_matches_the_reference_value() {
    let params = itm_put().with_grid_points(201).with_time_steps(200);
    let results = FdAmericanOption::new(params).calculate().unwrap();
    assert_abs_diff_eq!(results.value, 4.487, epsilon = 1e-2);
    assert!(results.delta < 0.0 && results.delta > -1.0);
}

// ───────────────────────── Bermudan ─────────────────────────

#[test]
fn bermudan_with_exercise_at_expiry_only_is_european() {
    let params = itm_put();
    let results = FdBermudanOption::new(params, vec![1.0]).calculate().unwrap();
    assert_abs_diff_eq!(results.value, black_scholes(&params), epsilon = 1e-10);
}

#[test]
fn bermudan_lies_between_european_and_american() {
    init_tracing();
    let params = itm_put();
    let european = black_scholes(&params);
    let bermudan = FdBermudanOption::new(params, vec![0.25, 0.5, 0.75, 1.0])
        .calculate()
        .unwrap()
        .value;
    let american = FdAmericanOption::new(params).calculate().unwrap().value;
    assert!(european < bermudan, "european {european} >= bermudan {bermudan}");
    assert!(bermudan < american, "bermudan {bermudan} >= american {american}");
}

// ───────────────────────── dividends ─────────────────────────

#[test]
fn european_dividend_option_matches_escrowed_black_scholes() {
    let params = atm_call();
    let dividends = vec![(0.25, 2.0), (0.75, 2.0)];
    let (expected, ..) = escrowed_dividend_black_scholes(
        params.option_type,
        params.underlying,
        params.strike,
        params.risk_free_rate,
        params.dividend_yield,
        params.volatility,
        params.residual_time,
        &dividends,
    );
    let results = FdDividendOption::new(params, ExerciseType::European, dividends)
        .unwrap()
        .calculate()
        .unwrap();
    assert_abs_diff_eq!(results.value, expected, epsilon = 1e-10);
}

#[test]
fn american_dividend_call_is_worth_more_than_european() {
    let params = atm_call();
    let dividends = vec![(0.5, 5.0)];
    let european = FdDividendOption::new(params, ExerciseType::European, dividends.clone())
        .unwrap()
        .calculate()
        .unwrap();
    let american = FdDividendOption::new(params, ExerciseType::American, dividends)
        .unwrap()
        .calculate()
        .unwrap();
    assert!(
        american.value > european.value,
        "american {} <= european {}",
        american.value,
        european.value
    );
}
