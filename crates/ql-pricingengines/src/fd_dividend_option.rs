//! Options on a stock paying discrete cash dividends.

use crate::analytic_european_engine::{discounted_dividends, escrowed_dividend_black_scholes};
use crate::fd_multi_period_option::{FdOptionParameters, FdSetup, MultiPeriodOption};
use ql_core::{ensure, errors::Result, fail, Real, Size, Time};
use ql_instruments::ExerciseType;
use ql_math::{Array, CubicSpline};
use ql_methods::finite_differences::{AmericanCondition, StepCondition};
use tracing::trace;

/// Floor on the ex-dividend spot before taking its logarithm.
const MIN_EX_DIVIDEND_SPOT: Real = 1.0e-10;

/// European or American option on a stock paying cash dividends.
///
/// The grid is laid out around the spot net of the dividends' present
/// value.  On each dividend date the values are re-read at the
/// ex-dividend spot `S − D` by cubic-spline interpolation in log spot, flat
/// beyond the grid.
///
/// Corresponds to `QuantLib::FdDividendEuropeanOption` and
/// `QuantLib::FdDividendAmericanOption`.
#[derive(Debug, Clone)]
pub struct FdDividendOption {
    params: FdOptionParameters,
    exercise: ExerciseType,
    dividend_times: Vec<Time>,
    dividend_amounts: Vec<Real>,
}

impl FdDividendOption {
    /// Option with cash `dividends` given as `(time, amount)` pairs in
    /// increasing time order.
    pub fn new(
        params: FdOptionParameters,
        exercise: ExerciseType,
        dividends: Vec<(Time, Real)>,
    ) -> Result<Self> {
        if exercise == ExerciseType::Bermudan {
            fail!("dividend options support European and American exercise only");
        }
        let center = params.underlying
            - discounted_dividends(&dividends, params.risk_free_rate, params.residual_time);
        ensure!(
            center > 0.0,
            "underlying ({}) net of discounted dividends must be positive, got {center}",
            params.underlying
        );
        let (dividend_times, dividend_amounts) = dividends.into_iter().unzip();
        Ok(Self {
            params,
            exercise,
            dividend_times,
            dividend_amounts,
        })
    }

    /// The exercise style.
    pub fn exercise(&self) -> ExerciseType {
        self.exercise
    }

    /// Dividends as `(time, amount)` pairs.
    pub fn dividends(&self) -> Vec<(Time, Real)> {
        self.dividend_times
            .iter()
            .copied()
            .zip(self.dividend_amounts.iter().copied())
            .collect()
    }

    fn shift_by_dividend(&self, grid_values: &Array, prices: &Array, dividend: Real) -> Result<Array> {
        let xs = grid_values.as_slice();
        let spline = CubicSpline::natural(xs, prices.as_slice())?;
        let (lo, hi) = (xs[0], xs[xs.len() - 1]);
        Ok(grid_values.map(|x| {
            let ex_dividend = (x.exp() - dividend).max(MIN_EX_DIVIDEND_SPOT).ln();
            spline.value(ex_dividend.clamp(lo, hi))
        }))
    }
}

impl MultiPeriodOption for FdDividendOption {
    fn parameters(&self) -> &FdOptionParameters {
        &self.params
    }

    fn event_times(&self) -> &[Time] {
        &self.dividend_times
    }

    fn grid_center(&self) -> Real {
        self.params.underlying
            - discounted_dividends(
                &self.dividends(),
                self.params.risk_free_rate,
                self.params.residual_time,
            )
    }

    fn initialize_step_condition(&self, setup: &FdSetup) -> Option<Box<dyn StepCondition>> {
        match self.exercise {
            ExerciseType::American => Some(Box::new(AmericanCondition::new(
                setup.intrinsic_values.clone(),
            ))),
            _ => None,
        }
    }

    fn initialize_control_variate(&self) -> Result<Option<Real>> {
        let p = &self.params;
        let (price, ..) = escrowed_dividend_black_scholes(
            p.option_type,
            p.underlying,
            p.strike,
            p.risk_free_rate,
            p.dividend_yield,
            p.volatility,
            p.residual_time,
            &self.dividends(),
        );
        Ok(Some(price))
    }

    fn execute_intermediate_step(
        &self,
        step: Size,
        setup: &FdSetup,
        prices: &mut Array,
        control_prices: &mut Array,
    ) -> Result<()> {
        let dividend = self.dividend_amounts[step];
        trace!(step, dividend, "dividend shift");
        let grid_values = setup.grid.values();
        *prices = self.shift_by_dividend(grid_values, prices, dividend)?;
        *control_prices = self.shift_by_dividend(grid_values, control_prices, dividend)?;
        if self.exercise == ExerciseType::American {
            prices.max_assign(&setup.intrinsic_values);
        }
        Ok(())
    }
}
