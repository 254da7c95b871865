//! Finite-difference pricing of options with intermediate events.
//!
//! Translates the orchestration of `QuantLib::FDMultiPeriodEngine`: the
//! option value is rolled back on a log-spot grid from expiry to today,
//! period by period, and at each event date (dividend, exercise date) a
//! hook modifies the value arrays.  A second array, rolled back without
//! the step condition, carries the European counterpart so that the
//! analytic price can correct the discretisation error (control variate).
//!
//! Concrete pricers implement [`MultiPeriodOption`] and override only the
//! hooks they need.

use ql_core::{ensure, errors::Result, Rate, Real, Size, Time, Volatility};
use ql_instruments::{OptionType, Payoff, PlainVanillaPayoff};
use ql_math::Array;
use ql_methods::finite_differences::{
    bsm_operator, safe_grid_points, BoundaryCondition, FiniteDifferenceModel, Grid, MixedScheme,
    Side, StepCondition, TridiagonalOperator,
};
use ql_processes::GeneralizedBlackScholesProcess;
use std::sync::Arc;
use tracing::debug;

/// Events closer than this (relative to the residual time for the first
/// date, absolute for the last) to today or to expiry fall on them.
const DATE_TOLERANCE: Time = 1.0e-6;

/// Default number of time steps per period.
pub const DEFAULT_TIME_STEPS: Size = 100;

/// Default number of grid points requested.
pub const DEFAULT_GRID_POINTS: Size = 100;

/// Contract and market data of a finite-difference option pricer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FdOptionParameters {
    /// Call or put.
    pub option_type: OptionType,
    /// Spot price of the underlying.
    pub underlying: Real,
    /// Strike.
    pub strike: Real,
    /// Continuous dividend yield.
    pub dividend_yield: Rate,
    /// Continuous risk-free rate.
    pub risk_free_rate: Rate,
    /// Time to expiry in years.
    pub residual_time: Time,
    /// Black volatility.
    pub volatility: Volatility,
    /// Time steps per period between events.
    pub time_steps: Size,
    /// Requested number of grid points, raised to a safe minimum.
    pub grid_points: Size,
}

impl FdOptionParameters {
    /// Parameters with the default numbers of time steps and grid points.
    pub fn new(
        option_type: OptionType,
        underlying: Real,
        strike: Real,
        dividend_yield: Rate,
        risk_free_rate: Rate,
        residual_time: Time,
        volatility: Volatility,
    ) -> Self {
        Self {
            option_type,
            underlying,
            strike,
            dividend_yield,
            risk_free_rate,
            residual_time,
            volatility,
            time_steps: DEFAULT_TIME_STEPS,
            grid_points: DEFAULT_GRID_POINTS,
        }
    }

    /// Set the number of time steps per period.
    pub fn with_time_steps(mut self, time_steps: Size) -> Self {
        self.time_steps = time_steps;
        self
    }

    /// Set the requested number of grid points.
    pub fn with_grid_points(mut self, grid_points: Size) -> Self {
        self.grid_points = grid_points;
        self
    }

    /// Check the parameters.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.residual_time > 0.0,
            "residual time ({}) must be positive",
            self.residual_time
        );
        ensure!(
            self.underlying > 0.0,
            "underlying ({}) must be positive",
            self.underlying
        );
        ensure!(self.strike > 0.0, "strike ({}) must be positive", self.strike);
        ensure!(
            self.volatility >= 0.0,
            "volatility ({}) must be non-negative",
            self.volatility
        );
        ensure!(self.time_steps >= 1, "at least one time step per period is needed");
        let points = safe_grid_points(self.grid_points, self.residual_time);
        ensure!(points >= 4, "at least 4 grid points are needed, got {points}");
        Ok(())
    }

    /// The vanilla payoff.
    pub fn payoff(&self) -> PlainVanillaPayoff {
        PlainVanillaPayoff::new(self.option_type, self.strike)
    }

    /// Black-Scholes process on flat curves.
    pub fn process(&self) -> Result<GeneralizedBlackScholesProcess> {
        GeneralizedBlackScholesProcess::flat(
            self.underlying,
            self.risk_free_rate,
            self.dividend_yield,
            self.volatility,
        )
    }
}

/// Price and sensitivities at the underlying spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionResults {
    /// Option value.
    pub value: Real,
    /// First derivative with respect to the spot.
    pub delta: Real,
    /// Second derivative with respect to the spot.
    pub gamma: Real,
    /// Derivative with respect to calendar time, per year.
    pub theta: Real,
}

/// Grid, intrinsic values and rollback model of one pricing run.
#[derive(Debug)]
pub struct FdSetup {
    /// Log-spot grid; its pinned node is the underlying spot.
    pub grid: Grid,
    /// Payoff on the grid.
    pub intrinsic_values: Array,
    /// Crank–Nicolson model on the Black-Scholes operator.
    pub model: FiniteDifferenceModel<TridiagonalOperator, MixedScheme<TridiagonalOperator>>,
}

/// An option priced by rolling back between event dates.
pub trait MultiPeriodOption {
    /// Contract and market data.
    fn parameters(&self) -> &FdOptionParameters;

    /// Event times, strictly increasing and non-negative.
    fn event_times(&self) -> &[Time];

    /// Spot value around which the grid is laid out.
    fn grid_center(&self) -> Real {
        self.parameters().underlying
    }

    /// Grid, intrinsic values, operator and model.
    ///
    /// The grid is sized by [`safe_grid_points`], laid out around
    /// [`grid_center`](Self::grid_center) and shifted so that the
    /// underlying spot is a node.  Neumann conditions carry the slope of
    /// the payoff at both ends.
    fn initialize_model(&self) -> Result<FdSetup> {
        let p = self.parameters();
        p.validate()?;
        let size = safe_grid_points(p.grid_points, p.residual_time);
        let grid = Grid::log_spot(self.grid_center(), p.strike, p.volatility, p.residual_time, size)?
            .anchored_at(p.underlying.ln());
        let payoff = p.payoff();
        let intrinsic_values = grid.spot_values().map(|s| payoff.value(s));
        let n = intrinsic_values.size();
        let bcs = vec![
            BoundaryCondition::neumann(intrinsic_values[1] - intrinsic_values[0], Side::Lower),
            BoundaryCondition::neumann(
                intrinsic_values[n - 1] - intrinsic_values[n - 2],
                Side::Upper,
            ),
        ];
        let operator = bsm_operator(&grid, Arc::new(p.process()?), p.residual_time)?;
        let model = FiniteDifferenceModel::new(operator, MixedScheme::crank_nicolson(bcs));
        Ok(FdSetup {
            grid,
            intrinsic_values,
            model,
        })
    }

    /// Condition applied after every step to the option prices.
    fn initialize_step_condition(&self, _setup: &FdSetup) -> Option<Box<dyn StepCondition>> {
        None
    }

    /// Analytic price of the European counterpart, or `None` to skip the
    /// control variate.
    fn initialize_control_variate(&self) -> Result<Option<Real>>;

    /// Hook run at event `step` on both the prices and the control prices.
    fn execute_intermediate_step(
        &self,
        _step: Size,
        _setup: &FdSetup,
        _prices: &mut Array,
        _control_prices: &mut Array,
    ) -> Result<()> {
        Ok(())
    }

    /// Roll back through all events and read value and Greeks at the spot.
    fn calculate(&self) -> Result<OptionResults> {
        let p = *self.parameters();
        p.validate()?;
        let events = self.event_times();
        let residual = p.residual_time;
        let n = events.len();

        if let Some(&first) = events.first() {
            ensure!(first >= 0.0, "first date ({first}) cannot be negative");
        }
        for pair in events.windows(2) {
            ensure!(
                pair[0] < pair[1],
                "dates must be in increasing order: {} is not before {}",
                pair[0],
                pair[1]
            );
        }
        if let Some(&last) = events.last() {
            ensure!(
                last <= residual + DATE_TOLERANCE,
                "event date ({last}) is after the residual time ({residual})"
            );
        }

        let first_is_zero = n > 0 && events[0] < DATE_TOLERANCE;
        let last_is_residual =
            n > usize::from(first_is_zero) && (events[n - 1] - residual).abs() < DATE_TOLERANCE;
        let first_non_zero = if first_is_zero {
            events.get(1).copied().unwrap_or(residual)
        } else {
            events.first().copied().unwrap_or(residual)
        };
        let mut dt = residual / (p.time_steps * (n + 1)) as Real;
        if first_non_zero <= dt {
            dt = first_non_zero / 2.0;
        }

        let setup = self.initialize_model()?;
        let condition = self.initialize_step_condition(&setup);
        let control_value = self.initialize_control_variate()?;
        let use_control = control_value.is_some();
        debug!(
            events = n,
            dt,
            grid_points = setup.grid.size(),
            use_control,
            "multi-period rollback"
        );

        let mut prices = setup.intrinsic_values.clone();
        let mut control = setup.intrinsic_values.clone();
        let roll = |prices: &mut Array, control: &mut Array, from: Time, to: Time, steps: Size| {
            setup
                .model
                .rollback(prices, from, to, steps, condition.as_deref())?;
            if use_control {
                setup.model.rollback(control, from, to, steps, None)?;
            }
            Ok::<(), ql_core::Error>(())
        };

        let first_index = usize::from(first_is_zero);
        let end = if last_is_residual {
            self.execute_intermediate_step(n - 1, &setup, &mut prices, &mut control)?;
            n - 1
        } else {
            n
        };
        let mut begin = residual;
        for j in (first_index..end).rev() {
            roll(&mut prices, &mut control, begin, events[j], p.time_steps)?;
            self.execute_intermediate_step(j, &setup, &mut prices, &mut control)?;
            begin = events[j];
        }
        roll(&mut prices, &mut control, begin, dt, p.time_steps)?;
        let value_at_dt = setup.grid.value_at_center(&prices)?;
        roll(&mut prices, &mut control, dt, 0.0, 1)?;
        let value_at_zero = setup.grid.value_at_center(&prices)?;
        if first_is_zero {
            self.execute_intermediate_step(0, &setup, &mut prices, &mut control)?;
        }

        let grid = &setup.grid;
        let mut value = grid.value_at_center(&prices)?;
        if let Some(analytic) = control_value {
            value += analytic - grid.value_at_center(&control)?;
        }
        Ok(OptionResults {
            value,
            delta: grid.first_derivative_at_center(&prices)?,
            gamma: grid.second_derivative_at_center(&prices)?,
            theta: (value_at_dt - value_at_zero) / dt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_core::Error;

    fn params() -> FdOptionParameters {
        FdOptionParameters::new(OptionType::Put, 100.0, 100.0, 0.0, 0.05, 1.0, 0.2)
    }

    #[derive(Debug)]
    struct WithEvents {
        params: FdOptionParameters,
        events: Vec<Time>,
    }

    impl MultiPeriodOption for WithEvents {
        fn parameters(&self) -> &FdOptionParameters {
            &self.params
        }

        fn event_times(&self) -> &[Time] {
            &self.events
        }

        fn initialize_control_variate(&self) -> Result<Option<Real>> {
            Ok(None)
        }
    }

    #[test]
    fn parameters_are_validated() {
        assert!(params().validate().is_ok());
        assert!(FdOptionParameters { residual_time: 0.0, ..params() }.validate().is_err());
        assert!(FdOptionParameters { underlying: -1.0, ..params() }.validate().is_err());
        assert!(FdOptionParameters { strike: 0.0, ..params() }.validate().is_err());
        assert!(FdOptionParameters { volatility: -0.1, ..params() }.validate().is_err());
        assert!(params().with_time_steps(0).validate().is_err());
    }

    #[test]
    fn setup_pins_the_spot() {
        let option = WithEvents {
            params: params().with_grid_points(150),
            events: vec![],
        };
        let setup = option.initialize_model().unwrap();
        assert_eq!(setup.grid.size(), 151);
        let spot = setup.grid.spot_values()[setup.grid.index()];
        assert!((spot - 100.0).abs() < 1e-9);
        let lowest = setup.grid.spot_values()[0];
        assert!((setup.intrinsic_values[0] - (100.0 - lowest)).abs() < 1e-12);
    }

    #[test]
    fn event_dates_are_checked() {
        let unordered = WithEvents {
            params: params(),
            events: vec![0.5, 0.25],
        };
        assert!(matches!(unordered.calculate(), Err(Error::Precondition(_))));
        let negative = WithEvents {
            params: params(),
            events: vec![-0.1],
        };
        assert!(matches!(negative.calculate(), Err(Error::Precondition(_))));
        let late = WithEvents {
            params: params(),
            events: vec![2.0],
        };
        assert!(late.calculate().is_err());
    }

    #[test]
    fn inert_events_do_not_move_the_price_much() {
        let plain = WithEvents {
            params: params(),
            events: vec![],
        }
        .calculate()
        .unwrap();
        let split = WithEvents {
            params: params(),
            events: vec![0.0, 0.3, 0.6, 1.0],
        }
        .calculate()
        .unwrap();
        assert!((plain.value - split.value).abs() < 1e-2);
        assert!(plain.delta < 0.0 && plain.gamma > 0.0);
    }

    #[test]
    fn events_within_the_date_tolerance_of_today_are_today() {
        let short = params().with_time_steps(20);
        let short = FdOptionParameters { residual_time: 0.1, ..short };
        let today = WithEvents {
            params: short,
            events: vec![0.0, 0.05],
        }
        .calculate()
        .unwrap();
        let almost_today = WithEvents {
            params: short,
            events: vec![5.0e-7, 0.05],
        }
        .calculate()
        .unwrap();
        assert_eq!(almost_today.value, today.value);
        assert_eq!(almost_today.theta, today.theta);
    }
}
