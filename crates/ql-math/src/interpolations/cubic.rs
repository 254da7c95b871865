//! Cubic spline interpolation with exposed polynomial coefficients.
//!
//! On each interval `[x_i, x_{i+1}]` the interpolant is
//!
//!   `f(x) = y_i + dx·(a_i + dx·(b_i + dx·c_i))`,  `dx = x − x_i`.
//!
//! The Markov-functional engine integrates these local cubics against the
//! Gaussian density in closed form, so `a`, `b`, `c` are part of the public
//! surface.  Slopes come from the classic C² spline system; the end
//! conditions are either *Lagrange* (slope of the cubic through the four
//! outermost points) or *natural* (zero second derivative).  An optional
//! Hyman filter clips slopes to keep monotone data monotone.

use ql_core::{ensure, errors::Result, Real};

use super::{locate, Interpolation1D};

/// End condition of a cubic spline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplineBoundary {
    /// Match the first derivative of the cubic through the 4 outermost points.
    Lagrange,
    /// Zero second derivative.
    Natural,
}

/// A C² cubic spline (C¹ once the monotonicity filter is active).
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<Real>,
    ys: Vec<Real>,
    a: Vec<Real>,
    b: Vec<Real>,
    c: Vec<Real>,
    monotonic: bool,
    left: SplineBoundary,
    right: SplineBoundary,
}

impl CubicSpline {
    /// Build a spline through `(xs, ys)`.
    ///
    /// # Errors
    /// Fails if fewer than two points are given, lengths differ, or `xs` is
    /// not strictly increasing.
    pub fn new(
        xs: &[Real],
        ys: &[Real],
        monotonic: bool,
        left: SplineBoundary,
        right: SplineBoundary,
    ) -> Result<Self> {
        let n = xs.len();
        ensure!(n >= 2, "cubic spline needs at least 2 points, got {n}");
        ensure!(
            ys.len() == n,
            "cubic spline: {} x values but {} y values",
            n,
            ys.len()
        );
        ensure!(
            xs.windows(2).all(|w| w[1] > w[0]),
            "cubic spline: x values must be strictly increasing"
        );
        let mut spline = Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            a: Vec::new(),
            b: Vec::new(),
            c: Vec::new(),
            monotonic,
            left,
            right,
        };
        spline.compute();
        Ok(spline)
    }

    /// Spline with Lagrange end conditions and the Hyman filter, the
    /// configuration used for numeraire and annuity tabulations.
    pub fn monotonic_lagrange(xs: &[Real], ys: &[Real]) -> Result<Self> {
        Self::new(xs, ys, true, SplineBoundary::Lagrange, SplineBoundary::Lagrange)
    }

    /// Natural spline without monotonicity filter.
    pub fn natural(xs: &[Real], ys: &[Real]) -> Result<Self> {
        Self::new(xs, ys, false, SplineBoundary::Natural, SplineBoundary::Natural)
    }

    /// Rebuild the coefficients for new ordinates on the same abscissae.
    pub fn update(&mut self, ys: &[Real]) -> Result<()> {
        ensure!(
            ys.len() == self.xs.len(),
            "cubic spline update: expected {} values, got {}",
            self.xs.len(),
            ys.len()
        );
        self.ys.copy_from_slice(ys);
        self.compute();
        Ok(())
    }

    /// Abscissae.
    pub fn x_values(&self) -> &[Real] {
        &self.xs
    }

    /// Ordinates.
    pub fn y_values(&self) -> &[Real] {
        &self.ys
    }

    /// Linear coefficients (first derivative at the left node).
    pub fn a_coefficients(&self) -> &[Real] {
        &self.a
    }

    /// Quadratic coefficients.
    pub fn b_coefficients(&self) -> &[Real] {
        &self.b
    }

    /// Cubic coefficients.
    pub fn c_coefficients(&self) -> &[Real] {
        &self.c
    }

    /// Evaluate, extrapolating with the outermost polynomial pieces.
    pub fn value(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        let dx = x - self.xs[i];
        self.ys[i] + dx * (self.a[i] + dx * (self.b[i] + dx * self.c[i]))
    }

    /// First derivative.
    pub fn derivative(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        let dx = x - self.xs[i];
        self.a[i] + dx * (2.0 * self.b[i] + 3.0 * dx * self.c[i])
    }

    fn compute(&mut self) {
        let n = self.xs.len();
        let xs = &self.xs;
        let ys = &self.ys;

        if n == 2 {
            let s = (ys[1] - ys[0]) / (xs[1] - xs[0]);
            self.a = vec![s];
            self.b = vec![0.0];
            self.c = vec![0.0];
            return;
        }

        let dx: Vec<Real> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let s: Vec<Real> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / dx[i]).collect();

        // slope system: lower/diag/upper bands and right-hand side
        let mut lower = vec![0.0; n - 1];
        let mut diag = vec![0.0; n];
        let mut upper = vec![0.0; n - 1];
        let mut rhs = vec![0.0; n];
        for i in 1..n - 1 {
            lower[i - 1] = dx[i];
            diag[i] = 2.0 * (dx[i] + dx[i - 1]);
            upper[i] = dx[i - 1];
            rhs[i] = 3.0 * (dx[i] * s[i - 1] + dx[i - 1] * s[i]);
        }
        match self.left {
            SplineBoundary::Lagrange => {
                diag[0] = 1.0;
                upper[0] = 0.0;
                let m = n.min(4);
                rhs[0] = lagrange_derivative(&xs[..m], &ys[..m], xs[0]);
            }
            SplineBoundary::Natural => {
                diag[0] = 2.0;
                upper[0] = 1.0;
                rhs[0] = 3.0 * s[0];
            }
        }
        match self.right {
            SplineBoundary::Lagrange => {
                lower[n - 2] = 0.0;
                diag[n - 1] = 1.0;
                let m = n.min(4);
                rhs[n - 1] = lagrange_derivative(&xs[n - m..], &ys[n - m..], xs[n - 1]);
            }
            SplineBoundary::Natural => {
                lower[n - 2] = 1.0;
                diag[n - 1] = 2.0;
                rhs[n - 1] = 3.0 * s[n - 2];
            }
        }

        let mut t = thomas(&lower, &diag, &upper, &rhs);

        if self.monotonic {
            hyman_filter(&mut t, &s, &dx);
        }

        self.a = Vec::with_capacity(n - 1);
        self.b = Vec::with_capacity(n - 1);
        self.c = Vec::with_capacity(n - 1);
        for i in 0..n - 1 {
            self.a.push(t[i]);
            self.b.push((3.0 * s[i] - t[i + 1] - 2.0 * t[i]) / dx[i]);
            self.c.push((t[i + 1] + t[i] - 2.0 * s[i]) / (dx[i] * dx[i]));
        }
    }
}

impl Interpolation1D for CubicSpline {
    fn operator(&self, x: Real) -> Real {
        self.value(x)
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}

/// Derivative at `x` of the interpolating polynomial through `(xs, ys)`.
fn lagrange_derivative(xs: &[Real], ys: &[Real], x: Real) -> Real {
    let m = xs.len();
    let mut result = 0.0;
    for k in 0..m {
        let mut dk = 0.0;
        for j in 0..m {
            if j == k {
                continue;
            }
            let mut term = 1.0 / (xs[k] - xs[j]);
            for l in 0..m {
                if l != k && l != j {
                    term *= (x - xs[l]) / (xs[k] - xs[l]);
                }
            }
            dk += term;
        }
        result += ys[k] * dk;
    }
    result
}

/// Thomas algorithm; the spline system is diagonally dominant.
fn thomas(lower: &[Real], diag: &[Real], upper: &[Real], rhs: &[Real]) -> Vec<Real> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut x = vec![0.0; n];
    let mut bet = diag[0];
    x[0] = rhs[0] / bet;
    for j in 1..n {
        c[j] = upper[j - 1] / bet;
        bet = diag[j] - lower[j - 1] * c[j];
        x[j] = (rhs[j] - lower[j - 1] * x[j - 1]) / bet;
    }
    for j in (0..n - 1).rev() {
        x[j] -= c[j + 1] * x[j + 1];
    }
    x
}

/// Hyman (1983) monotonicity constraint on the node slopes `t`.
fn hyman_filter(t: &mut [Real], s: &[Real], dx: &[Real]) {
    let n = t.len();
    for i in 0..n {
        let limited = if i == 0 {
            if t[0] * s[0] > 0.0 {
                t[0].signum() * t[0].abs().min((3.0 * s[0]).abs())
            } else {
                0.0
            }
        } else if i == n - 1 {
            if t[i] * s[n - 2] > 0.0 {
                t[i].signum() * t[i].abs().min((3.0 * s[n - 2]).abs())
            } else {
                0.0
            }
        } else {
            let pm = (s[i - 1] * dx[i] + s[i] * dx[i - 1]) / (dx[i - 1] + dx[i]);
            let mut big_m = 3.0 * s[i - 1].abs().min(s[i].abs()).min(pm.abs());
            if i > 1 && (s[i - 1] - s[i - 2]) * (s[i] - s[i - 1]) > 0.0 {
                let pd = (s[i - 1] * (2.0 * dx[i - 1] + dx[i - 2]) - s[i - 2] * dx[i - 1])
                    / (dx[i - 2] + dx[i - 1]);
                if pm * pd > 0.0 && pm * (s[i - 1] - s[i - 2]) > 0.0 {
                    big_m = big_m.max(1.5 * pm.abs().min(pd.abs()));
                }
            }
            if i < n - 2 && (s[i] - s[i - 1]) * (s[i + 1] - s[i]) > 0.0 {
                let pu = (s[i] * (2.0 * dx[i] + dx[i + 1]) - s[i + 1] * dx[i])
                    / (dx[i] + dx[i + 1]);
                if pm * pu > 0.0 && -pm * (s[i] - s[i - 1]) > 0.0 {
                    big_m = big_m.max(1.5 * pm.abs().min(pu.abs()));
                }
            }
            if t[i] * pm > 0.0 {
                t[i].signum() * t[i].abs().min(big_m)
            } else {
                0.0
            }
        };
        t[i] = limited;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn grid(n: usize, lo: Real, hi: Real) -> Vec<Real> {
        (0..n)
            .map(|i| lo + (hi - lo) * i as Real / (n - 1) as Real)
            .collect()
    }

    #[test]
    fn interpolates_nodes() {
        let xs = grid(7, -1.0, 2.0);
        let ys: Vec<Real> = xs.iter().map(|x| (x * 1.3).sin()).collect();
        let s = CubicSpline::natural(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            assert_abs_diff_eq!(s.value(*x), *y, epsilon = 1e-13);
        }
    }

    #[test]
    fn lagrange_spline_reproduces_cubics() {
        let f = |x: Real| 1.0 - 2.0 * x + 0.5 * x * x + 0.25 * x * x * x;
        let xs = grid(9, -2.0, 2.0);
        let ys: Vec<Real> = xs.iter().map(|&x| f(x)).collect();
        let s = CubicSpline::new(
            &xs,
            &ys,
            false,
            SplineBoundary::Lagrange,
            SplineBoundary::Lagrange,
        )
        .unwrap();
        for x in [-1.9, -0.77, 0.1, 1.33, 1.99] {
            assert_abs_diff_eq!(s.value(x), f(x), epsilon = 1e-12);
        }
        // coefficients of the first piece are the Taylor coefficients at -2
        assert_abs_diff_eq!(s.a_coefficients()[0], -2.0 + (-2.0) + 0.75 * 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.c_coefficients()[3], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn monotone_data_stays_monotone() {
        let xs = grid(6, 0.0, 5.0);
        let ys = [0.0, 0.0, 0.1, 5.0, 5.1, 5.1];
        let s = CubicSpline::monotonic_lagrange(&xs, &ys).unwrap();
        let mut prev = s.value(0.0);
        for k in 1..=500 {
            let v = s.value(5.0 * k as Real / 500.0);
            assert!(v >= prev - 1e-12, "not monotone at step {k}");
            prev = v;
        }
    }

    #[test]
    fn update_rebuilds_coefficients() {
        let xs = grid(5, 0.0, 1.0);
        let mut s = CubicSpline::natural(&xs, &[1.0; 5]).unwrap();
        assert_abs_diff_eq!(s.value(0.3), 1.0, epsilon = 1e-14);
        s.update(&[0.0, 0.25, 0.5, 0.75, 1.0]).unwrap();
        assert_abs_diff_eq!(s.value(0.3), 0.3, epsilon = 1e-14);
        assert!(s.update(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(CubicSpline::natural(&[0.0], &[1.0]).is_err());
        assert!(CubicSpline::natural(&[0.0, 0.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(CubicSpline::natural(&[0.0, 1.0], &[1.0]).is_err());
    }
}
