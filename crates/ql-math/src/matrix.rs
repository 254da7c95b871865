//! `Matrix` — a two-dimensional table of reals.
//!
//! Newtype around `nalgebra::DMatrix<f64>`.  Used for tabulations indexed
//! by (time, state) and as the dense reference when checking banded
//! operators.

use crate::array::Array;
use nalgebra::DMatrix;
use ql_core::Real;
use std::ops::{Index, IndexMut};

/// A dynamically-sized 2D matrix of `Real` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix(DMatrix<Real>);

impl Matrix {
    /// Create a zero-filled `rows × cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self(DMatrix::zeros(rows, cols))
    }

    /// Create a matrix with `m[(i, j)] = f(i, j)`.
    pub fn from_fn<F: FnMut(usize, usize) -> Real>(rows: usize, cols: usize, f: F) -> Self {
        Self(DMatrix::from_fn(rows, cols, f))
    }

    /// Create from a row-major data slice.
    pub fn from_row_slice(rows: usize, cols: usize, data: &[Real]) -> Self {
        Self(DMatrix::from_row_slice(rows, cols, data))
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.0.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.0.ncols()
    }

    /// Copy of row `i`.
    pub fn row(&self, i: usize) -> Array {
        Array::from_fn(self.cols(), |j| self.0[(i, j)])
    }

    /// Overwrite row `i` with `values`.
    ///
    /// # Panics
    /// If `values` does not have `cols()` elements.
    pub fn set_row(&mut self, i: usize, values: &Array) {
        assert_eq!(values.size(), self.cols(), "row length mismatch");
        for (j, v) in values.iter().enumerate() {
            self.0[(i, j)] = *v;
        }
    }

    /// Matrix-vector product.
    pub fn mul_vec(&self, v: &Array) -> Array {
        let x = nalgebra::DVector::from_column_slice(v.as_slice());
        Array::from_slice((&self.0 * x).as_slice())
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Real;
    fn index(&self, idx: (usize, usize)) -> &Real {
        &self.0[idx]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, idx: (usize, usize)) -> &mut Real {
        &mut self.0[idx]
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.rows() {
            writeln!(f, "{}", self.row(i))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_round_trip() {
        let mut m = Matrix::zeros(2, 3);
        m.set_row(1, &Array::from_slice(&[1.0, 2.0, 3.0]));
        assert_eq!(m.row(1).to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(m.row(0).to_vec(), vec![0.0; 3]);
        assert_eq!(m[(1, 2)], 3.0);
    }

    #[test]
    fn matrix_vector_product() {
        let m = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let v = m.mul_vec(&Array::from_slice(&[1.0, 1.0]));
        assert_eq!(v.to_vec(), vec![3.0, 7.0]);
    }

    #[test]
    fn display_one_row_per_line() {
        let m = Matrix::from_fn(2, 2, |i, j| (i * 2 + j) as Real);
        assert_eq!(m.to_string(), "[0; 1]\n[2; 3]\n");
    }
}
