//! `Array` — a one-dimensional vector of reals.
//!
//! Thin newtype around `nalgebra::DVector<f64>`.  Arrays have value
//! semantics: the state vector of a rollback, a grid, or a row of
//! tabulated numeraires is cloned when handed over, never aliased.
//!
//! Element-wise operators panic on length mismatch (as `nalgebra` does);
//! callers that take arrays from outside check sizes with `ensure!` first.

use nalgebra::DVector;
use ql_core::Real;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

/// A dynamically-sized 1D vector of `Real` values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array(DVector<Real>);

impl Array {
    /// Create a zero-filled array of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self(DVector::zeros(n))
    }

    /// Create an array filled with `value`.
    pub fn from_element(n: usize, value: Real) -> Self {
        Self(DVector::from_element(n, value))
    }

    /// Create an array from a slice.
    pub fn from_slice(data: &[Real]) -> Self {
        Self(DVector::from_column_slice(data))
    }

    /// Create an array from a `Vec`.
    pub fn from_vec(data: Vec<Real>) -> Self {
        Self(DVector::from_vec(data))
    }

    /// Create an array of length `n` with `a[i] = f(i)`.
    pub fn from_fn<F: FnMut(usize) -> Real>(n: usize, mut f: F) -> Self {
        Self(DVector::from_fn(n, |i, _| f(i)))
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the elements as a slice.
    pub fn as_slice(&self) -> &[Real] {
        self.0.as_slice()
    }

    /// Return the elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [Real] {
        self.0.as_mut_slice()
    }

    /// Copy the elements into a `Vec`.
    pub fn to_vec(&self) -> Vec<Real> {
        self.0.as_slice().to_vec()
    }

    /// First element, if any.
    pub fn front(&self) -> Option<Real> {
        self.as_slice().first().copied()
    }

    /// Last element, if any.
    pub fn back(&self) -> Option<Real> {
        self.as_slice().last().copied()
    }

    /// Dot product with another array.
    pub fn dot(&self, other: &Array) -> Real {
        self.0.dot(&other.0)
    }

    /// Euclidean (L2) norm.
    pub fn norm(&self) -> Real {
        self.0.norm()
    }

    /// Sum of all elements.
    pub fn sum(&self) -> Real {
        self.0.sum()
    }

    /// Minimum element.
    pub fn min(&self) -> Real {
        self.0.min()
    }

    /// Maximum element.
    pub fn max(&self) -> Real {
        self.0.max()
    }

    /// Apply a function element-wise, returning a new array.
    pub fn map<F: Fn(Real) -> Real>(&self, f: F) -> Self {
        Self(self.0.map(f))
    }

    /// Multiply every element by `scalar`.
    pub fn scale(&self, scalar: Real) -> Self {
        Self(&self.0 * scalar)
    }

    /// Element-wise product.
    pub fn component_mul(&self, other: &Array) -> Self {
        Self(self.0.component_mul(&other.0))
    }

    /// Element-wise maximum with `other`, in place.
    pub fn max_assign(&mut self, other: &Array) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            if *b > *a {
                *a = *b;
            }
        }
    }

    /// Element-wise absolute value.
    pub fn abs(&self) -> Self {
        self.map(|x| x.abs())
    }

    /// Iterator over elements.
    pub fn iter(&self) -> impl Iterator<Item = &Real> {
        self.0.iter()
    }

    /// Mutable iterator over elements.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Real> {
        self.0.iter_mut()
    }
}

// ── From / Into conversions ───────────────────────────────────────────────────

impl From<Vec<Real>> for Array {
    fn from(v: Vec<Real>) -> Self {
        Self::from_vec(v)
    }
}

impl From<&[Real]> for Array {
    fn from(s: &[Real]) -> Self {
        Self::from_slice(s)
    }
}

impl FromIterator<Real> for Array {
    fn from_iter<I: IntoIterator<Item = Real>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

// ── Index ─────────────────────────────────────────────────────────────────────

impl Index<usize> for Array {
    type Output = Real;
    fn index(&self, i: usize) -> &Real {
        &self.0[i]
    }
}

impl IndexMut<usize> for Array {
    fn index_mut(&mut self, i: usize) -> &mut Real {
        &mut self.0[i]
    }
}

// ── Element-wise arithmetic ───────────────────────────────────────────────────

impl Add for &Array {
    type Output = Array;
    fn add(self, rhs: &Array) -> Array {
        Array(&self.0 + &rhs.0)
    }
}

impl Add for Array {
    type Output = Array;
    fn add(self, rhs: Array) -> Array {
        Array(self.0 + rhs.0)
    }
}

impl Add<Real> for &Array {
    type Output = Array;
    fn add(self, rhs: Real) -> Array {
        Array(self.0.add_scalar(rhs))
    }
}

impl Sub for &Array {
    type Output = Array;
    fn sub(self, rhs: &Array) -> Array {
        Array(&self.0 - &rhs.0)
    }
}

impl Sub for Array {
    type Output = Array;
    fn sub(self, rhs: Array) -> Array {
        Array(self.0 - rhs.0)
    }
}

impl Sub<Real> for &Array {
    type Output = Array;
    fn sub(self, rhs: Real) -> Array {
        Array(self.0.add_scalar(-rhs))
    }
}

impl Mul<Real> for &Array {
    type Output = Array;
    fn mul(self, rhs: Real) -> Array {
        Array(&self.0 * rhs)
    }
}

impl Mul<Real> for Array {
    type Output = Array;
    fn mul(self, rhs: Real) -> Array {
        Array(self.0 * rhs)
    }
}

impl Mul<&Array> for Real {
    type Output = Array;
    fn mul(self, rhs: &Array) -> Array {
        Array(&rhs.0 * self)
    }
}

impl Mul for &Array {
    type Output = Array;
    fn mul(self, rhs: &Array) -> Array {
        self.component_mul(rhs)
    }
}

impl Div<Real> for &Array {
    type Output = Array;
    fn div(self, rhs: Real) -> Array {
        Array(&self.0 / rhs)
    }
}

impl Div<Real> for Array {
    type Output = Array;
    fn div(self, rhs: Real) -> Array {
        Array(self.0 / rhs)
    }
}

impl Neg for &Array {
    type Output = Array;
    fn neg(self) -> Array {
        Array(-&self.0)
    }
}

impl Neg for Array {
    type Output = Array;
    fn neg(self) -> Array {
        Array(-self.0)
    }
}

impl AddAssign<&Array> for Array {
    fn add_assign(&mut self, rhs: &Array) {
        self.0 += &rhs.0;
    }
}

impl SubAssign<&Array> for Array {
    fn sub_assign(&mut self, rhs: &Array) {
        self.0 -= &rhs.0;
    }
}

impl MulAssign<Real> for Array {
    fn mul_assign(&mut self, rhs: Real) {
        self.0 *= rhs;
    }
}

// ── Display ───────────────────────────────────────────────────────────────────

impl std::fmt::Display for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}
