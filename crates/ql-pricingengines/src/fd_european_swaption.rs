//! European swaption under a one-factor short-rate model.

use ql_core::{ensure, errors::Result, Real, Size, Time};
use ql_instruments::FixedLegSchedule;
use ql_math::Array;
use ql_methods::finite_differences::{
    one_factor_operator, BoundaryCondition, FiniteDifferenceModel, Grid, MixedScheme, Side,
    StepCondition, SwaptionCondition,
};
use ql_models::OneFactorModel;
use std::sync::Arc;
use tracing::debug;

/// Half width of the state grid in standard deviations of the state
/// variable over the exercise horizon.
const GRID_STD_DEVS: Real = 5.0;

/// European swaption valued on a grid of the model's state variable.
///
/// At exercise the value on each node is the positive part of the
/// underlying swap, priced with the model's closed-form discount bonds at
/// the node's short rate; it is then rolled back to today with
/// Crank–Nicolson.
#[derive(Debug, Clone)]
pub struct FdEuropeanSwaption {
    model: Arc<dyn OneFactorModel>,
    swap: FixedLegSchedule,
    exercise_time: Time,
}

impl FdEuropeanSwaption {
    /// Swaption exercisable at `exercise_time` into `swap`, which must not
    /// start before the exercise.
    pub fn new(
        model: Arc<dyn OneFactorModel>,
        swap: FixedLegSchedule,
        exercise_time: Time,
    ) -> Result<Self> {
        ensure!(
            exercise_time > 0.0,
            "exercise time ({exercise_time}) must be positive"
        );
        ensure!(
            exercise_time <= swap.start_time(),
            "exercise time ({exercise_time}) is after the swap start ({})",
            swap.start_time()
        );
        Ok(Self {
            model,
            swap,
            exercise_time,
        })
    }

    /// The underlying swap.
    pub fn swap(&self) -> &FixedLegSchedule {
        &self.swap
    }

    /// The exercise time.
    pub fn exercise_time(&self) -> Time {
        self.exercise_time
    }

    /// Value today given the current short `rate`.
    pub fn value(&self, rate: Real, time_steps: Size, grid_points: Size) -> Result<Real> {
        ensure!(time_steps > 0, "at least one time step is needed");
        ensure!(grid_points >= 3, "at least 3 grid points are needed, got {grid_points}");
        let dynamics = self.model.dynamics();
        let x0 = dynamics.variable(0.0, rate);
        let grid = Grid::for_process(
            dynamics.process(),
            x0,
            self.exercise_time,
            grid_points,
            GRID_STD_DEVS,
        )?;
        debug!(
            x0,
            size = grid.size(),
            exercise_time = self.exercise_time,
            "swaption grid"
        );

        let bcs = vec![
            BoundaryCondition::neumann(0.0, Side::Lower),
            BoundaryCondition::neumann(0.0, Side::Upper),
        ];
        let operator = one_factor_operator(&grid, dynamics.clone())?;
        let model = FiniteDifferenceModel::new(operator, MixedScheme::crank_nicolson(bcs));

        let states = grid.values().clone();
        let bond_model = self.model.clone();
        let swap = self.swap.clone();
        let exercise = SwaptionCondition::new(grid.size(), move |i, t| {
            let r = dynamics.short_rate(t, states[i]);
            swap.value(|maturity| {
                if maturity <= t {
                    1.0
                } else {
                    bond_model.discount_bond(t, maturity, r)
                }
            })
        });

        let mut values = Array::zeros(grid.size());
        exercise.apply_to(&mut values, self.exercise_time)?;
        model.rollback(&mut values, self.exercise_time, 0.0, time_steps, None)?;
        grid.value_at_center(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_instruments::SwapType;
    use ql_models::Vasicek;

    #[test]
    fn exercise_after_the_swap_start_is_rejected() {
        let model: Arc<dyn OneFactorModel> = Arc::new(Vasicek::new(0.05, 0.1, 0.05, 0.01).unwrap());
        let swap = FixedLegSchedule::from_tenor(SwapType::Payer, 1.0, 0.05, 1.0, 2.0, 1).unwrap();
        assert!(FdEuropeanSwaption::new(model.clone(), swap.clone(), 1.5).is_err());
        assert!(FdEuropeanSwaption::new(model.clone(), swap.clone(), 0.0).is_err());
        assert!(FdEuropeanSwaption::new(model, swap, 1.0).is_ok());
    }
}
