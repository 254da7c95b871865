//! Tridiagonal operator.
//!
//! The discretisation of a 1-D second-order differential operator on a
//! grid of `n` points is a tridiagonal matrix:
//!
//! ```text
//! | d0 a0                |
//! | b0 d1 a1             |
//! |    b1 d2 a2          |
//! |        ...           |
//! |          b(n-2) d(n-1)|
//! ```
//!
//! with `b` the band below the diagonal and `a` the band above it.  The
//! operator also carries a boundary condition for each end and, for
//! time-dependent coefficients, a [`TimeSetter`] that rebuilds the rows
//! for a given time.

use super::boundary_condition::{BoundaryCondition, Side};
use ql_core::{ensure, errors::Error, errors::Result, Real, Size, Time};
use ql_math::{Array, Matrix};
use std::fmt;
use std::sync::Arc;

/// Rebuilds the rows of an operator for a given time.
///
/// Corresponds to `QuantLib::TridiagonalOperator::TimeSetter`.
pub trait TimeSetter: fmt::Debug + Send + Sync {
    /// Set the coefficients of `op` to their values at time `t`.
    fn set_time(&self, t: Time, op: &mut TridiagonalOperator) -> Result<()>;
}

/// A tridiagonal operator with boundary conditions.
///
/// Operators have value semantics; every algebraic method returns a new
/// operator.  Results of the algebra are time-independent snapshots.
///
/// Corresponds to `QuantLib::TridiagonalOperator`.
#[derive(Debug, Clone, Default)]
pub struct TridiagonalOperator {
    lower: Array,
    diag: Array,
    upper: Array,
    lower_bc: BoundaryCondition,
    upper_bc: BoundaryCondition,
    time_setter: Option<Arc<dyn TimeSetter>>,
}

// ─── Construction ─────────────────────────────────────────────────────────────

impl TridiagonalOperator {
    /// A zero operator of the given size.  `new(0)` is the empty operator.
    pub fn new(size: Size) -> Self {
        let off = size.saturating_sub(1);
        Self {
            lower: Array::zeros(off),
            diag: Array::zeros(size),
            upper: Array::zeros(off),
            ..Self::default()
        }
    }

    /// An operator built from its three bands.
    ///
    /// # Errors
    /// `below` and `above` must be one element shorter than `diag`, and a
    /// non-empty operator needs at least three rows.
    pub fn from_bands(below: Array, diag: Array, above: Array) -> Result<Self> {
        let n = diag.size();
        ensure!(
            n == 0 || n >= 3,
            "tridiagonal operator needs at least 3 rows, got {n}"
        );
        ensure!(
            below.size() + 1 == n.max(1) && above.size() + 1 == n.max(1),
            "wrong band sizes: {} below, {} diagonal, {} above",
            below.size(),
            n,
            above.size()
        );
        Ok(Self {
            lower: below,
            diag,
            upper: above,
            ..Self::default()
        })
    }

    /// The identity operator.
    pub fn identity(size: Size) -> Self {
        let mut op = Self::new(size);
        op.diag = Array::from_element(size, 1.0);
        op
    }

    /// Number of rows.
    pub fn size(&self) -> Size {
        self.diag.size()
    }

    /// The band below the diagonal (`size − 1` entries).
    pub fn lower_diagonal(&self) -> &Array {
        &self.lower
    }

    /// The main diagonal.
    pub fn diagonal(&self) -> &Array {
        &self.diag
    }

    /// The band above the diagonal (`size − 1` entries).
    pub fn upper_diagonal(&self) -> &Array {
        &self.upper
    }

    /// Dense copy of the operator rows, boundary conditions ignored.
    pub fn to_matrix(&self) -> Matrix {
        let n = self.size();
        Matrix::from_fn(n, n, |i, j| {
            if i == j {
                self.diag[i]
            } else if i == j + 1 {
                self.lower[j]
            } else if j == i + 1 {
                self.upper[i]
            } else {
                0.0
            }
        })
    }
}

// ─── Row setters ──────────────────────────────────────────────────────────────

impl TridiagonalOperator {
    /// Set the first row `(diag, above)`.
    pub fn set_first_row(&mut self, diag: Real, above: Real) {
        if self.size() >= 2 {
            self.diag[0] = diag;
            self.upper[0] = above;
        }
    }

    /// Set the interior row `i`.
    ///
    /// # Errors
    /// `i` must lie in `[1, size − 2]`.
    pub fn set_mid_row(&mut self, i: Size, below: Real, diag: Real, above: Real) -> Result<()> {
        let n = self.size();
        ensure!(
            i >= 1 && i + 2 <= n,
            "row {i} out of range [1, {}] in set_mid_row",
            n.saturating_sub(2)
        );
        self.lower[i - 1] = below;
        self.diag[i] = diag;
        self.upper[i] = above;
        Ok(())
    }

    /// Set every interior row to the same coefficients.
    pub fn set_mid_rows(&mut self, below: Real, diag: Real, above: Real) {
        for i in 1..self.size().saturating_sub(1) {
            self.lower[i - 1] = below;
            self.diag[i] = diag;
            self.upper[i] = above;
        }
    }

    /// Set the last row `(below, diag)`.
    pub fn set_last_row(&mut self, below: Real, diag: Real) {
        let n = self.size();
        if n >= 2 {
            self.lower[n - 2] = below;
            self.diag[n - 1] = diag;
        }
    }
}

// ─── Boundary conditions ──────────────────────────────────────────────────────

impl TridiagonalOperator {
    /// Replace both boundary conditions.
    ///
    /// # Errors
    /// Each condition must be `None` or act on its own side.
    pub fn set_boundary_conditions(
        &mut self,
        lower: BoundaryCondition,
        upper: BoundaryCondition,
    ) -> Result<()> {
        ensure!(
            matches!(lower.side(), None | Some(Side::Lower)),
            "lower boundary condition acts on the upper side: {lower}"
        );
        ensure!(
            matches!(upper.side(), None | Some(Side::Upper)),
            "upper boundary condition acts on the lower side: {upper}"
        );
        self.lower_bc = lower;
        self.upper_bc = upper;
        Ok(())
    }

    /// Copy of the operator with each condition placed on its side.
    /// Sides not mentioned keep their current condition.
    ///
    /// # Errors
    /// At most one condition per side.
    pub fn with_boundary_conditions(&self, bcs: &[BoundaryCondition]) -> Result<Self> {
        let mut op = self.clone();
        let (mut seen_lower, mut seen_upper) = (false, false);
        for bc in bcs {
            match bc.side() {
                Some(Side::Lower) => {
                    ensure!(!seen_lower, "more than one boundary condition on the lower side");
                    seen_lower = true;
                    op.lower_bc = *bc;
                }
                Some(Side::Upper) => {
                    ensure!(!seen_upper, "more than one boundary condition on the upper side");
                    seen_upper = true;
                    op.upper_bc = *bc;
                }
                None => {}
            }
        }
        Ok(op)
    }

    /// The condition on the first node.
    pub fn lower_bc(&self) -> BoundaryCondition {
        self.lower_bc
    }

    /// The condition on the last node.
    pub fn upper_bc(&self) -> BoundaryCondition {
        self.upper_bc
    }
}

// ─── Application and solution ─────────────────────────────────────────────────

impl TridiagonalOperator {
    /// Plain matrix-vector product on the current rows.
    fn product(&self, v: &Array) -> Array {
        let n = self.size();
        let mut result = Array::zeros(n);
        match n {
            0 => {}
            1 => result[0] = self.diag[0] * v[0],
            _ => {
                result[0] = self.diag[0] * v[0] + self.upper[0] * v[1];
                for i in 1..n - 1 {
                    result[i] = self.lower[i - 1] * v[i - 1]
                        + self.diag[i] * v[i]
                        + self.upper[i] * v[i + 1];
                }
                result[n - 1] = self.lower[n - 2] * v[n - 2] + self.diag[n - 1] * v[n - 1];
            }
        }
        result
    }

    /// Apply the operator to `v`, honouring the boundary conditions.
    ///
    /// # Errors
    /// `v` must have the operator's size.
    pub fn apply_to(&self, v: &Array) -> Result<Array> {
        ensure!(
            v.size() == self.size(),
            "vector of the wrong size ({}) instead of {}",
            v.size(),
            self.size()
        );
        let mut op = self.clone();
        self.lower_bc.apply_before_applying(&mut op);
        self.upper_bc.apply_before_applying(&mut op);
        let mut result = op.product(v);
        self.lower_bc.apply_after_applying(&mut result);
        self.upper_bc.apply_after_applying(&mut result);
        Ok(result)
    }

    /// Solve `L·x = rhs`, honouring the boundary conditions.
    ///
    /// Thomas algorithm without pivoting.
    ///
    /// # Errors
    /// Size mismatch, or [`Error::SingularSystem`] when an elimination
    /// pivot is zero or not finite.
    pub fn solve_for(&self, rhs: &Array) -> Result<Array> {
        ensure!(
            rhs.size() == self.size(),
            "rhs vector of the wrong size ({}) instead of {}",
            rhs.size(),
            self.size()
        );
        let mut op = self.clone();
        let mut r = rhs.clone();
        self.lower_bc.apply_before_solving(&mut op, &mut r);
        self.upper_bc.apply_before_solving(&mut op, &mut r);
        let mut x = op.thomas(&r)?;
        self.lower_bc.apply_after_solving(&mut x);
        self.upper_bc.apply_after_solving(&mut x);
        Ok(x)
    }

    fn thomas(&self, rhs: &Array) -> Result<Array> {
        let n = self.size();
        let mut x = Array::zeros(n);
        if n == 0 {
            return Ok(x);
        }
        let pivot = |bet: Real, row: usize| -> Result<Real> {
            if bet == 0.0 || !bet.is_finite() {
                Err(Error::SingularSystem { row })
            } else {
                Ok(bet)
            }
        };
        let mut tmp = Array::zeros(n);
        let mut bet = pivot(self.diag[0], 0)?;
        x[0] = rhs[0] / bet;
        for j in 1..n {
            tmp[j] = self.upper[j - 1] / bet;
            bet = pivot(self.diag[j] - self.lower[j - 1] * tmp[j], j)?;
            x[j] = (rhs[j] - self.lower[j - 1] * x[j - 1]) / bet;
        }
        for j in (0..n - 1).rev() {
            x[j] -= tmp[j + 1] * x[j + 1];
        }
        Ok(x)
    }
}

// ─── Algebra ──────────────────────────────────────────────────────────────────

fn merge_boundary(
    a: BoundaryCondition,
    b: BoundaryCondition,
    verb: &str,
) -> Result<BoundaryCondition> {
    match (a.is_none(), b.is_none()) {
        (true, _) => Ok(b),
        (_, true) => Ok(a),
        _ => {
            ensure!(a == b, "{verb} operators with colliding boundary conditions");
            Ok(a)
        }
    }
}

impl TridiagonalOperator {
    fn with_bands(&self, lower: Array, diag: Array, upper: Array) -> Self {
        Self {
            lower,
            diag,
            upper,
            lower_bc: self.lower_bc,
            upper_bc: self.upper_bc,
            time_setter: None,
        }
    }

    fn combine(&self, other: &Self, sign: Real, verb: &str) -> Result<Self> {
        ensure!(
            self.size() == other.size(),
            "{verb} operators of different sizes ({} and {})",
            self.size(),
            other.size()
        );
        Ok(Self {
            lower: &self.lower + &(&other.lower * sign),
            diag: &self.diag + &(&other.diag * sign),
            upper: &self.upper + &(&other.upper * sign),
            lower_bc: merge_boundary(self.lower_bc, other.lower_bc, verb)?,
            upper_bc: merge_boundary(self.upper_bc, other.upper_bc, verb)?,
            time_setter: None,
        })
    }

    /// `−L`.
    pub fn negate(&self) -> Self {
        self.with_bands(-&self.lower, -&self.diag, -&self.upper)
    }

    /// `a·L`.
    pub fn scale(&self, a: Real) -> Self {
        self.with_bands(&self.lower * a, &self.diag * a, &self.upper * a)
    }

    /// `L / a`.
    ///
    /// # Errors
    /// `a` must be non-zero.
    pub fn divide(&self, a: Real) -> Result<Self> {
        ensure!(a != 0.0, "division of an operator by zero");
        Ok(self.with_bands(&self.lower / a, &self.diag / a, &self.upper / a))
    }

    /// `L + M`.
    ///
    /// Boundary conditions merge per side: a `None` side takes the other
    /// operand's condition; two different conditions on a side collide.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.combine(other, 1.0, "adding")
    }

    /// `L − M`, with the same boundary merge as [`add`](Self::add).
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.combine(other, -1.0, "subtracting")
    }

    /// `L + I`.
    pub fn add_identity(&self) -> Self {
        self.with_bands(self.lower.clone(), &self.diag + 1.0, self.upper.clone())
    }

    /// `L − I`.
    pub fn sub_identity(&self) -> Self {
        self.with_bands(self.lower.clone(), &self.diag - 1.0, self.upper.clone())
    }

    /// `I − L`.
    pub fn identity_minus(&self) -> Self {
        self.negate().add_identity()
    }

    /// `I + a·L`.
    pub fn identity_plus_scaled(&self, a: Real) -> Self {
        self.scale(a).add_identity()
    }
}

// ─── Time dependence ──────────────────────────────────────────────────────────

impl TridiagonalOperator {
    /// `true` when a time setter is installed.
    pub fn is_time_dependent(&self) -> bool {
        self.time_setter.is_some()
    }

    /// Install the setter that rebuilds the rows for a given time.
    pub fn set_time_setter(&mut self, setter: Arc<dyn TimeSetter>) {
        self.time_setter = Some(setter);
    }

    /// Snapshot of the operator at time `t`; `self` is left untouched.
    /// Time-independent operators return a plain copy.
    pub fn at_time(&self, t: Time) -> Result<Self> {
        let mut snapshot = self.clone();
        if let Some(setter) = &self.time_setter {
            setter.set_time(t, &mut snapshot)?;
        }
        Ok(snapshot)
    }
}

impl PartialEq for TridiagonalOperator {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower
            && self.diag == other.diag
            && self.upper == other.upper
            && self.lower_bc == other.lower_bc
            && self.upper_bc == other.upper_bc
            && self.is_time_dependent() == other.is_time_dependent()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
