//! Backward rollback of a value array on a fixed spatial grid.

use super::operator_traits::DifferentialOperator;
use super::schemes::Scheme;
use super::step_condition::StepCondition;
use ql_core::{ensure, errors::Result, Size, Time};
use ql_math::Array;
use tracing::debug;

/// Dates closer than this to the end of a rollback snap onto it.
const TIME_TOLERANCE: Time = 1.0e-8;

/// Generic finite-difference model: an operator, a scheme and the times
/// at which a rollback must stop.
///
/// Corresponds to `QuantLib::FiniteDifferenceModel`.
#[derive(Debug, Clone)]
pub struct FiniteDifferenceModel<L, S> {
    operator: L,
    scheme: S,
    stopping_times: Vec<Time>,
}

impl<L, S> FiniteDifferenceModel<L, S>
where
    L: DifferentialOperator,
    S: Scheme<L>,
{
    /// A model without stopping times.
    pub fn new(operator: L, scheme: S) -> Self {
        Self {
            operator,
            scheme,
            stopping_times: Vec::new(),
        }
    }

    /// Times that every rollback hits exactly; the step condition is
    /// applied at each of them.
    pub fn with_stopping_times(mut self, mut times: Vec<Time>) -> Self {
        times.sort_by(|a, b| a.total_cmp(b));
        times.dedup();
        self.stopping_times = times;
        self
    }

    /// The spatial operator.
    pub fn operator(&self) -> &L {
        &self.operator
    }

    /// The time-stepping scheme.
    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    /// The stopping times, sorted.
    pub fn stopping_times(&self) -> &[Time] {
        &self.stopping_times
    }

    /// Roll `array` back from `from` to `to` in `steps` equal steps.
    ///
    /// Stopping times inside a step split it so that they are hit
    /// exactly.  The condition, if any, is applied after every step at
    /// the time reached.
    ///
    /// # Errors
    /// `from < to`, no steps for a non-empty interval, or any failure of
    /// the scheme or the condition.  On error `array` holds the values of
    /// the last completed step.
    pub fn rollback(
        &self,
        array: &mut Array,
        from: Time,
        to: Time,
        steps: Size,
        condition: Option<&dyn StepCondition>,
    ) -> Result<()> {
        ensure!(
            from >= to,
            "trying to roll back from {from} to {to}: the end time must not be later"
        );
        if from == to {
            return Ok(());
        }
        ensure!(steps > 0, "at least one time step is needed to roll back from {from} to {to}");
        debug!(from, to, steps, size = array.size(), "rollback");

        let dt = (from - to) / steps as Time;
        let mut t = from;
        for _ in 0..steps {
            let mut now = t;
            let mut next = t - dt;
            if (to - next).abs() < TIME_TOLERANCE {
                next = to;
            }
            for &stop in self.stopping_times.iter().rev() {
                if next <= stop && stop < now {
                    self.advance(array, now, now - stop, stop, condition)?;
                    now = stop;
                }
            }
            if now > next {
                self.advance(array, now, now - next, next, condition)?;
            }
            t -= dt;
        }
        Ok(())
    }

    fn advance(
        &self,
        array: &mut Array,
        now: Time,
        dt: Time,
        reached: Time,
        condition: Option<&dyn StepCondition>,
    ) -> Result<()> {
        let values = std::mem::take(array);
        let (_, values) = self.scheme.step(&self.operator, values, now, dt)?;
        *array = values;
        if let Some(condition) = condition {
            condition.apply_to(array, reached)?;
        }
        Ok(())
    }
}
