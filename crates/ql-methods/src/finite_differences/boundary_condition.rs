//! Boundary conditions for tridiagonal operators.
//!
//! A boundary condition acts at four points of a time step: before and
//! after the operator is applied (explicit half) and before and after a
//! linear system is solved (implicit half).  Conditions are plain values
//! and are copied into every operator that carries them.

use super::tridiagonal_operator::TridiagonalOperator;
use ql_math::Array;
use ql_core::Real;
use std::fmt;

/// The end of the grid a boundary condition acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// First grid point.
    Lower,
    /// Last grid point.
    Upper,
}

/// A boundary condition on one end of a 1-D grid.
///
/// Corresponds to `QuantLib::BoundaryCondition` and its `NeumannBC` /
/// `DirichletBC` implementations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BoundaryCondition {
    /// No condition: the operator rows are used as they are.
    #[default]
    None,
    /// Fixed first difference: `u[1] − u[0] = value` on the lower side,
    /// `u[n−1] − u[n−2] = value` on the upper side.
    Neumann {
        /// Prescribed difference.
        value: Real,
        /// Grid end.
        side: Side,
    },
    /// Fixed value at the boundary node.
    Dirichlet {
        /// Prescribed value.
        value: Real,
        /// Grid end.
        side: Side,
    },
}

impl BoundaryCondition {
    /// Neumann condition with the given difference.
    pub fn neumann(value: Real, side: Side) -> Self {
        Self::Neumann { value, side }
    }

    /// Dirichlet condition with the given value.
    pub fn dirichlet(value: Real, side: Side) -> Self {
        Self::Dirichlet { value, side }
    }

    /// The side the condition acts on, `None` for the empty condition.
    pub fn side(&self) -> Option<Side> {
        match self {
            Self::None => None,
            Self::Neumann { side, .. } | Self::Dirichlet { side, .. } => Some(*side),
        }
    }

    /// `true` for [`BoundaryCondition::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Overwrite the boundary row of `op` before it is applied.
    pub fn apply_before_applying(&self, op: &mut TridiagonalOperator) {
        match *self {
            Self::None => {}
            Self::Neumann { side: Side::Lower, .. } => op.set_first_row(-1.0, 1.0),
            Self::Neumann { side: Side::Upper, .. } => op.set_last_row(-1.0, 1.0),
            Self::Dirichlet { side: Side::Lower, .. } => op.set_first_row(1.0, 0.0),
            Self::Dirichlet { side: Side::Upper, .. } => op.set_last_row(0.0, 1.0),
        }
    }

    /// Fix the boundary value of `u` after the operator was applied.
    pub fn apply_after_applying(&self, u: &mut Array) {
        let n = u.size();
        if n < 2 {
            return;
        }
        match *self {
            Self::None => {}
            Self::Neumann { value, side: Side::Lower } => u[0] = u[1] - value,
            Self::Neumann { value, side: Side::Upper } => u[n - 1] = u[n - 2] + value,
            Self::Dirichlet { value, side: Side::Lower } => u[0] = value,
            Self::Dirichlet { value, side: Side::Upper } => u[n - 1] = value,
        }
    }

    /// Overwrite the boundary row of `op` and the matching entry of the
    /// right-hand side before a solve.
    pub fn apply_before_solving(&self, op: &mut TridiagonalOperator, rhs: &mut Array) {
        let n = rhs.size();
        if n == 0 {
            return;
        }
        match *self {
            Self::None => {}
            Self::Neumann { value, side: Side::Lower } => {
                op.set_first_row(-1.0, 1.0);
                rhs[0] = value;
            }
            Self::Neumann { value, side: Side::Upper } => {
                op.set_last_row(-1.0, 1.0);
                rhs[n - 1] = value;
            }
            Self::Dirichlet { value, side: Side::Lower } => {
                op.set_first_row(1.0, 0.0);
                rhs[0] = value;
            }
            Self::Dirichlet { value, side: Side::Upper } => {
                op.set_last_row(0.0, 1.0);
                rhs[n - 1] = value;
            }
        }
    }

    /// Post-process the solution of a solve.  None of the provided
    /// conditions need it.
    pub fn apply_after_solving(&self, _u: &mut Array) {}
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lower => write!(f, "lower"),
            Self::Upper => write!(f, "upper"),
        }
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Neumann { value, side } => write!(f, "Neumann({value}) on {side} side"),
            Self::Dirichlet { value, side } => write!(f, "Dirichlet({value}) on {side} side"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp() -> Array {
        Array::from_slice(&[1.0, 2.0, 4.0, 7.0])
    }

    #[test]
    fn neumann_fixes_first_differences_after_applying() {
        let mut u = ramp();
        BoundaryCondition::neumann(0.5, Side::Lower).apply_after_applying(&mut u);
        BoundaryCondition::neumann(2.0, Side::Upper).apply_after_applying(&mut u);
        assert_abs_diff_eq!(u[0], 1.5, epsilon = 1e-15);
        assert_abs_diff_eq!(u[3], 6.0, epsilon = 1e-15);
    }

    #[test]
    fn dirichlet_fixes_values_after_applying() {
        let mut u = ramp();
        BoundaryCondition::dirichlet(-1.0, Side::Lower).apply_after_applying(&mut u);
        BoundaryCondition::dirichlet(9.0, Side::Upper).apply_after_applying(&mut u);
        assert_eq!(u.to_vec(), vec![-1.0, 2.0, 4.0, 9.0]);
    }

    #[test]
    fn rows_are_overwritten_before_solving() {
        let mut op = TridiagonalOperator::identity(4);
        let mut rhs = ramp();
        BoundaryCondition::neumann(0.25, Side::Lower).apply_before_solving(&mut op, &mut rhs);
        BoundaryCondition::dirichlet(3.0, Side::Upper).apply_before_solving(&mut op, &mut rhs);
        assert_eq!(op.diagonal()[0], -1.0);
        assert_eq!(op.upper_diagonal()[0], 1.0);
        assert_eq!(op.lower_diagonal()[2], 0.0);
        assert_eq!(op.diagonal()[3], 1.0);
        assert_eq!(rhs[0], 0.25);
        assert_eq!(rhs[3], 3.0);
    }

    #[test]
    fn none_is_inert() {
        let mut u = ramp();
        let mut op = TridiagonalOperator::identity(4);
        BoundaryCondition::None.apply_before_applying(&mut op);
        BoundaryCondition::None.apply_before_solving(&mut op, &mut u);
        BoundaryCondition::None.apply_after_applying(&mut u);
        assert_eq!(u, ramp());
        assert_eq!(op, TridiagonalOperator::identity(4));
        assert_eq!(BoundaryCondition::None.side(), None);
    }
}
