//! Black-Scholes-Merton closed form for European options.
//!
//! Translates the formula of
//! `ql/pricingengines/vanilla/analyticeuropeanengine.hpp`.  The finite
//! difference pricers use it as the analytic half of their control
//! variate; the escrowed-dividend variant serves options on stocks
//! paying cash dividends.

use ql_core::{Real, Time};
use ql_instruments::OptionType;
use ql_math::distributions::{normal_cdf, normal_pdf};

/// Compute Black-Scholes price and Greeks for a European option.
///
/// $$C = S e^{-qT} N(d_1) - K e^{-rT} N(d_2)$$
/// $$P = K e^{-rT} N(-d_2) - S e^{-qT} N(-d_1)$$
///
/// Returns `(price, delta, gamma, vega, theta, rho)`.
pub fn black_scholes_merton(
    option_type: OptionType,
    spot: Real,
    strike: Real,
    risk_free_rate: Real,
    dividend_yield: Real,
    volatility: Real,
    time_to_expiry: Real,
) -> (Real, Real, Real, Real, Real, Real) {
    let phi = option_type.sign();
    let t = time_to_expiry;

    if t <= 0.0 {
        let intrinsic = (phi * (spot - strike)).max(0.0);
        return (intrinsic, 0.0, 0.0, 0.0, 0.0, 0.0);
    }

    let r = risk_free_rate;
    let q = dividend_yield;
    let sigma = volatility;
    let sqrt_t = t.sqrt();
    let std_dev = sigma * sqrt_t;
    let df_r = (-r * t).exp();
    let df_q = (-q * t).exp();
    let fwd = spot * ((r - q) * t).exp();

    let (d1, d2) = if std_dev > 1e-15 {
        let d1 = ((spot / strike).ln() + (r - q + 0.5 * sigma * sigma) * t) / std_dev;
        let d2 = d1 - std_dev;
        (d1, d2)
    } else {
        let big = if fwd > strike { 1e15 } else { -1e15 };
        (big, big)
    };

    let nd1 = normal_cdf(phi * d1);
    let nd2 = normal_cdf(phi * d2);
    let npd1 = normal_pdf(d1);

    // Price
    let price = phi * (spot * df_q * nd1 - strike * df_r * nd2);
    // Delta
    let delta = phi * df_q * nd1;
    // Gamma
    let gamma = if std_dev > 1e-15 {
        df_q * npd1 / (spot * std_dev)
    } else {
        0.0
    };
    // Vega (per 1.0 absolute vol, not per 1%)
    let vega = spot * df_q * npd1 * sqrt_t;
    // Theta (per year)
    let theta = {
        let term1 = -(spot * df_q * npd1 * sigma) / (2.0 * sqrt_t);
        let term2 = -phi * r * strike * df_r * nd2;
        let term3 = phi * q * spot * df_q * nd1;
        term1 + term2 + term3
    };
    // Rho (per 1.0 rate shift)
    let rho = phi * strike * t * df_r * nd2;

    (price, delta, gamma, vega, theta, rho)
}

/// Present value at the risk-free rate of the cash dividends paid up to
/// and including `time_to_expiry`.
pub fn discounted_dividends(
    dividends: &[(Time, Real)],
    risk_free_rate: Real,
    time_to_expiry: Time,
) -> Real {
    dividends
        .iter()
        .filter(|(t, _)| *t <= time_to_expiry)
        .map(|(t, amount)| amount * (-risk_free_rate * t).exp())
        .sum()
}

/// Black-Scholes price of a European option on a stock paying cash
/// dividends, with the spot reduced by the present value of the
/// dividends paid before expiry (escrowed dividend model).
///
/// Returns the same tuple as [`black_scholes_merton`].
#[allow(clippy::too_many_arguments)]
pub fn escrowed_dividend_black_scholes(
    option_type: OptionType,
    spot: Real,
    strike: Real,
    risk_free_rate: Real,
    dividend_yield: Real,
    volatility: Real,
    time_to_expiry: Real,
    dividends: &[(Time, Real)],
) -> (Real, Real, Real, Real, Real, Real) {
    let adjusted = spot - discounted_dividends(dividends, risk_free_rate, time_to_expiry);
    black_scholes_merton(
        option_type,
        adjusted,
        strike,
        risk_free_rate,
        dividend_yield,
        volatility,
        time_to_expiry,
    )
}
