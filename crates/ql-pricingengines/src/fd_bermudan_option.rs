//! Bermudan option on a log-spot grid.

use crate::analytic_european_engine::black_scholes_merton;
use crate::fd_multi_period_option::{FdOptionParameters, FdSetup, MultiPeriodOption};
use ql_core::{errors::Result, Real, Size, Time};
use ql_math::Array;

/// Option exercisable at a finite set of times.
///
/// Between exercise dates the value is rolled back as a European option;
/// on each date it is projected onto the intrinsic value.  Exercise at
/// expiry is carried by the terminal payoff.
///
/// Corresponds to `QuantLib::FdBermudanOption`.
#[derive(Debug, Clone)]
pub struct FdBermudanOption {
    params: FdOptionParameters,
    exercise_times: Vec<Time>,
}

impl FdBermudanOption {
    /// Option exercisable at `exercise_times`, which must be strictly
    /// increasing and lie in `[0, residual_time]`.
    pub fn new(params: FdOptionParameters, exercise_times: Vec<Time>) -> Self {
        Self {
            params,
            exercise_times,
        }
    }

    /// The exercise times.
    pub fn exercise_times(&self) -> &[Time] {
        &self.exercise_times
    }
}

impl MultiPeriodOption for FdBermudanOption {
    fn parameters(&self) -> &FdOptionParameters {
        &self.params
    }

    fn event_times(&self) -> &[Time] {
        &self.exercise_times
    }

    fn initialize_control_variate(&self) -> Result<Option<Real>> {
        let p = &self.params;
        let (price, ..) = black_scholes_merton(
            p.option_type,
            p.underlying,
            p.strike,
            p.risk_free_rate,
            p.dividend_yield,
            p.volatility,
            p.residual_time,
        );
        Ok(Some(price))
    }

    fn execute_intermediate_step(
        &self,
        _step: Size,
        setup: &FdSetup,
        prices: &mut Array,
        _control_prices: &mut Array,
    ) -> Result<()> {
        prices.max_assign(&setup.intrinsic_values);
        Ok(())
    }
}
