//! Conditions applied to the value array after each time step.

use ql_core::{ensure, errors::Result, Real, Size, Time};
use ql_math::Array;
use std::fmt;

/// A condition applied to the values after every step of a rollback.
///
/// Corresponds to `QuantLib::StepCondition`.
pub trait StepCondition: fmt::Debug {
    /// Modify `array`, which holds values at time `t`.
    fn apply_to(&self, array: &mut Array, t: Time) -> Result<()>;
}

/// Early exercise against fixed intrinsic values: `a[i] = max(a[i], v[i])`.
///
/// Corresponds to `QuantLib::AmericanCondition`.
#[derive(Debug, Clone)]
pub struct AmericanCondition {
    intrinsic: Array,
}

impl AmericanCondition {
    /// Condition for the given intrinsic values on the grid.
    pub fn new(intrinsic: Array) -> Self {
        Self { intrinsic }
    }

    /// The intrinsic values.
    pub fn intrinsic_values(&self) -> &Array {
        &self.intrinsic
    }
}

impl StepCondition for AmericanCondition {
    fn apply_to(&self, array: &mut Array, _t: Time) -> Result<()> {
        ensure!(
            array.size() == self.intrinsic.size(),
            "price array size ({}) does not match intrinsic values size ({})",
            array.size(),
            self.intrinsic.size()
        );
        array.max_assign(&self.intrinsic);
        Ok(())
    }
}

/// Exercise into a time-dependent intrinsic value, `a[i] = max(a[i], f(i, t))`.
///
/// Used for swaptions, whose exercise value on node `i` is the value of
/// the underlying swap at the short rate of that node.
pub struct SwaptionCondition {
    size: Size,
    intrinsic: Box<dyn Fn(Size, Time) -> Real + Send + Sync>,
}

impl SwaptionCondition {
    /// Condition on a grid of `size` nodes.
    pub fn new<F>(size: Size, intrinsic: F) -> Self
    where
        F: Fn(Size, Time) -> Real + Send + Sync + 'static,
    {
        Self {
            size,
            intrinsic: Box::new(intrinsic),
        }
    }

    /// Intrinsic value of node `i` at time `t`.
    pub fn intrinsic_value(&self, i: Size, t: Time) -> Real {
        (self.intrinsic)(i, t)
    }
}

impl fmt::Debug for SwaptionCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwaptionCondition")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl StepCondition for SwaptionCondition {
    fn apply_to(&self, array: &mut Array, t: Time) -> Result<()> {
        ensure!(
            array.size() == self.size,
            "price array size ({}) does not match grid size ({})",
            array.size(),
            self.size
        );
        for (i, value) in array.iter_mut().enumerate() {
            *value = value.max(self.intrinsic_value(i, t));
        }
        Ok(())
    }
}

/// The condition that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCondition;

impl StepCondition for NullCondition {
    fn apply_to(&self, _array: &mut Array, _t: Time) -> Result<()> {
        Ok(())
    }
}
