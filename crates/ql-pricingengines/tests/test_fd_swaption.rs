//! Finite-difference European swaption under Vasicek.

use approx::assert_abs_diff_eq;
use ql_instruments::{FixedLegSchedule, SwapType};
use ql_models::{OneFactorModel, ShortRateModel, Vasicek};
use ql_pricingengines::FdEuropeanSwaption;
use std::sync::Arc;

const RATE: f64 = 0.05;
const EXERCISE: f64 = 1.0;

fn swap(swap_type: SwapType, fixed_rate: f64) -> FixedLegSchedule {
    FixedLegSchedule::from_tenor(swap_type, 1.0, fixed_rate, EXERCISE, 3.0, 1).unwrap()
}

fn deterministic() -> Arc<dyn OneFactorModel> {
    Arc::new(Vasicek::new(RATE, 0.0, 0.0, 0.0).unwrap())
}

// ───────────────────────── deterministic rates ─────────────────────────

#[test]
fn flat_short_rate_reproduces_the_deterministic_value() {
    let schedule = swap(SwapType::Payer, 0.04);
    let forward = schedule.value(|t| (-RATE * (t - EXERCISE)).exp());
    let expected = forward.max(0.0) * (-RATE * EXERCISE).exp();
    assert!(expected > 0.0);

    let swaption = FdEuropeanSwaption::new(deterministic(), schedule, EXERCISE).unwrap();
    let value = swaption.value(RATE, 50, 50).unwrap();
    assert_abs_diff_eq!(value, expected, epsilon = 1e-6);
}

#[test]
fn out_of_the_money_payer_is_worthless() {
    let swaption =
        FdEuropeanSwaption::new(deterministic(), swap(SwapType::Payer, 0.10), EXERCISE).unwrap();
    let value = swaption.value(RATE, 50, 50).unwrap();
    assert_abs_diff_eq!(value, 0.0, epsilon = 1e-12);
}

// ───────────────────────── stochastic rates ─────────────────────────

#[test]
fn payer_minus_receiver_is_the_forward_swap() {
    let vasicek = Vasicek::new(RATE, 0.1, 0.05, 0.01).unwrap();
    let forward_swap = swap(SwapType::Payer, 0.05).value(|t| vasicek.discount_bond(0.0, t, RATE));
    let model: Arc<dyn OneFactorModel> = Arc::new(vasicek);

    let payer =
        FdEuropeanSwaption::new(model.clone(), swap(SwapType::Payer, 0.05), EXERCISE).unwrap();
    let receiver =
        FdEuropeanSwaption::new(model, swap(SwapType::Receiver, 0.05), EXERCISE).unwrap();
    let payer_value = payer.value(RATE, 100, 101).unwrap();
    let receiver_value = receiver.value(RATE, 100, 101).unwrap();

    assert!(payer_value > 0.0 && receiver_value > 0.0);
    assert_abs_diff_eq!(payer_value - receiver_value, forward_swap, epsilon = 1e-4);
}

#[test]
fn volatility_adds_value() {
    let flat = FdEuropeanSwaption::new(deterministic(), swap(SwapType::Payer, 0.05), EXERCISE)
        .unwrap()
        .value(RATE, 50, 51)
        .unwrap();
    let model: Arc<dyn OneFactorModel> = Arc::new(Vasicek::new(RATE, 0.1, 0.05, 0.01).unwrap());
    let stochastic = FdEuropeanSwaption::new(model, swap(SwapType::Payer, 0.05), EXERCISE)
        .unwrap()
        .value(RATE, 50, 51)
        .unwrap();
    assert!(stochastic > flat + 1e-3, "stochastic {stochastic}, flat {flat}");
}
