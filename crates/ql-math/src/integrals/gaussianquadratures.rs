//! Gaussian quadrature rules.
//!
//! Nodes and weights come from the Golub-Welsch algorithm: the nodes are
//! the eigenvalues of the Jacobi matrix of the three-term recurrence, the
//! weights are `μ₀·v₀²` for the normalised eigenvectors `v`.

use nalgebra::DMatrix;
use ql_core::{ensure, errors::Result, Real};
use std::f64::consts::PI;

/// A Gauss quadrature rule defined by nodes and weights.
///
/// Corresponds to `QuantLib::GaussianQuadrature`.
#[derive(Debug, Clone)]
pub struct GaussianQuadrature {
    x: Vec<Real>,
    w: Vec<Real>,
}

impl GaussianQuadrature {
    /// Quadrature nodes, in increasing order.
    pub fn x(&self) -> &[Real] {
        &self.x
    }

    /// Quadrature weights.
    pub fn w(&self) -> &[Real] {
        &self.w
    }

    /// Number of quadrature points.
    pub fn order(&self) -> usize {
        self.x.len()
    }

    /// Evaluate ∫ f(x) w(x) dx ≈ Σ wᵢ f(xᵢ).
    pub fn integrate<F: Fn(Real) -> Real>(&self, f: F) -> Real {
        self.x.iter().zip(self.w.iter()).map(|(&xi, &wi)| wi * f(xi)).sum()
    }
}

// ── Gauss-Hermite ─────────────────────────────────────────────────────────────

/// Gauss-Hermite quadrature (physicists' convention: weight e^{-x²}).
///
/// Corresponds to `QuantLib::GaussHermiteIntegration`.
pub struct GaussHermiteIntegration;

impl GaussHermiteIntegration {
    /// Build a Gauss-Hermite quadrature of given `order`.
    ///
    /// # Errors
    /// `order` must be positive.
    pub fn new(order: usize) -> Result<GaussianQuadrature> {
        ensure!(order > 0, "Gauss-Hermite order must be positive");
        // H_{i+1} = 2x H_i − 2i H_{i−1}  ⇒  α_i = 0, β_i = i/2
        let off: Vec<Real> = (1..order).map(|i| (i as Real / 2.0).sqrt()).collect();
        Ok(golub_welsch(&vec![0.0; order], &off, PI.sqrt()))
    }
}

fn golub_welsch(diag: &[Real], off: &[Real], mu0: Real) -> GaussianQuadrature {
    let n = diag.len();
    let jacobi = DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            diag[i]
        } else if i + 1 == j {
            off[i]
        } else if j + 1 == i {
            off[j]
        } else {
            0.0
        }
    });
    let eigen = jacobi.symmetric_eigen();

    let mut nodes: Vec<(Real, Real)> = (0..n)
        .map(|k| {
            let v0 = eigen.eigenvectors[(0, k)];
            (eigen.eigenvalues[k], mu0 * v0 * v0)
        })
        .collect();
    nodes.sort_by(|a, b| a.0.total_cmp(&b.0));

    GaussianQuadrature {
        x: nodes.iter().map(|p| p.0).collect(),
        w: nodes.iter().map(|p| p.1).collect(),
    }
}
