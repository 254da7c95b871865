//! American option on a log-spot grid.

use crate::analytic_european_engine::black_scholes_merton;
use crate::fd_multi_period_option::{FdOptionParameters, FdSetup, MultiPeriodOption};
use ql_core::{errors::Result, Real, Time};
use ql_methods::finite_differences::{AmericanCondition, StepCondition};

/// American option priced by Crank–Nicolson rollback with early exercise
/// enforced after every step.
///
/// Corresponds to `QuantLib::FdAmericanOption`.
#[derive(Debug, Clone)]
pub struct FdAmericanOption {
    params: FdOptionParameters,
}

impl FdAmericanOption {
    /// Option with the given contract and market data.
    pub fn new(params: FdOptionParameters) -> Self {
        Self { params }
    }
}

impl MultiPeriodOption for FdAmericanOption {
    fn parameters(&self) -> &FdOptionParameters {
        &self.params
    }

    fn event_times(&self) -> &[Time] {
        &[]
    }

    fn initialize_step_condition(&self, setup: &FdSetup) -> Option<Box<dyn StepCondition>> {
        Some(Box::new(AmericanCondition::new(
            setup.intrinsic_values.clone(),
        )))
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_instruments::OptionType;

    #[test]
    fn deep_in_the_money_put_is_worth_its_intrinsic() {
        let params = FdOptionParameters::new(OptionType::Put, 40.0, 100.0, 0.0, 0.1, 1.0, 0.2);
        let results = FdAmericanOption::new(params).calculate().unwrap();
        assert!((results.value - 60.0).abs() < 1e-2, "value = {}", results.value);
        assert!((results.delta + 1.0).abs() < 1e-6, "delta = {}", results.delta);
    }
}
