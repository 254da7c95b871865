//! The interface a spatial operator offers to the time-stepping schemes.

use super::boundary_condition::BoundaryCondition;
use super::tridiagonal_operator::TridiagonalOperator;
use ql_core::{errors::Result, Real, Size, Time};
use ql_math::Array;
use std::fmt::Debug;

/// A discretised spatial operator `L` usable by the evolution schemes.
///
/// Corresponds to the operator concept required by `QuantLib::MixedScheme`.
pub trait DifferentialOperator: Clone + Debug + PartialEq {
    /// Number of grid points.
    fn size(&self) -> Size;

    /// `L·v` with boundary conditions.
    fn apply_to(&self, v: &Array) -> Result<Array>;

    /// Solution of `L·x = rhs` with boundary conditions.
    fn solve_for(&self, rhs: &Array) -> Result<Array>;

    /// Whether the coefficients change with time.
    fn is_time_dependent(&self) -> bool;

    /// The operator with its coefficients evaluated at `t`.
    fn at_time(&self, t: Time) -> Result<Self>;

    /// `I + a·L`.
    fn identity_plus_scaled(&self, a: Real) -> Self;

    /// The operator with the given boundary conditions attached.
    fn with_boundary_conditions(&self, bcs: &[BoundaryCondition]) -> Result<Self>;
}

impl DifferentialOperator for TridiagonalOperator {
    fn size(&self) -> Size {
        TridiagonalOperator::size(self)
    }

    fn apply_to(&self, v: &Array) -> Result<Array> {
        TridiagonalOperator::apply_to(self, v)
    }

    fn solve_for(&self, rhs: &Array) -> Result<Array> {
        TridiagonalOperator::solve_for(self, rhs)
    }

    fn is_time_dependent(&self) -> bool {
        TridiagonalOperator::is_time_dependent(self)
    }

    fn at_time(&self, t: Time) -> Result<Self> {
        TridiagonalOperator::at_time(self, t)
    }

    fn identity_plus_scaled(&self, a: Real) -> Self {
        TridiagonalOperator::identity_plus_scaled(self, a)
    }

    fn with_boundary_conditions(&self, bcs: &[BoundaryCondition]) -> Result<Self> {
        TridiagonalOperator::with_boundary_conditions(self, bcs)
    }
}
