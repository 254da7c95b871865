//! Builders for the tridiagonal operators of concrete PDEs.
//!
//! Both operators discretise `L = −(½σ²∂xx + μ∂x − r)` on the interior
//! nodes with central differences; the first and last rows are left to
//! the boundary conditions.  Coefficients are taken from the process at
//! the time the operator is evaluated.

use super::grid::Grid;
use super::tridiagonal_operator::{TimeSetter, TridiagonalOperator};
use ql_core::{ensure, errors::Result, Real, Time};
use ql_math::Array;
use ql_models::ShortRateDynamics;
use ql_processes::{GeneralizedBlackScholesProcess, StochasticProcess1D};
use std::sync::Arc;

/// Interior row of `L` at a node with spacings `dxm` (below) and `dxp`
/// (above).
fn row(sigma: Real, drift: Real, rate: Real, dxm: Real, dxp: Real) -> (Real, Real, Real) {
    let sigma2 = sigma * sigma;
    let pd = -(sigma2 / dxm - drift) / (dxm + dxp);
    let pu = -(sigma2 / dxp + drift) / (dxm + dxp);
    let pm = sigma2 / (dxm * dxp) + rate;
    (pd, pm, pu)
}

/// Rows of the Black–Scholes operator on a log-spot grid.
#[derive(Debug)]
struct BsmTimeSetter {
    grid: Array,
    process: Arc<GeneralizedBlackScholesProcess>,
}

impl TimeSetter for BsmTimeSetter {
    fn set_time(&self, t: Time, op: &mut TridiagonalOperator) -> Result<()> {
        let rate = self.process.short_rate(t);
        let n = self.grid.size();
        for i in 1..n - 1 {
            let x = self.grid[i];
            let (pd, pm, pu) = row(
                self.process.diffusion_1d(t, x),
                self.process.drift_1d(t, x),
                rate,
                x - self.grid[i - 1],
                self.grid[i + 1] - x,
            );
            op.set_mid_row(i, pd, pm, pu)?;
        }
        Ok(())
    }
}

/// Rows of the operator for the state variable of a short-rate model,
/// discounting at the short rate of each node.
#[derive(Debug)]
struct OneFactorTimeSetter {
    grid: Array,
    dynamics: Arc<dyn ShortRateDynamics>,
}

impl TimeSetter for OneFactorTimeSetter {
    fn set_time(&self, t: Time, op: &mut TridiagonalOperator) -> Result<()> {
        let process = self.dynamics.process();
        let n = self.grid.size();
        for i in 1..n - 1 {
            let x = self.grid[i];
            let (pd, pm, pu) = row(
                process.diffusion_1d(t, x),
                process.drift_1d(t, x),
                self.dynamics.short_rate(t, x),
                x - self.grid[i - 1],
                self.grid[i + 1] - x,
            );
            op.set_mid_row(i, pd, pm, pu)?;
        }
        Ok(())
    }
}

fn time_dependent_operator(
    grid: &Grid,
    setter: Arc<dyn TimeSetter>,
    initial_time: Time,
) -> Result<TridiagonalOperator> {
    ensure!(grid.size() >= 3, "operator grid needs at least 3 points");
    let mut op = TridiagonalOperator::new(grid.size());
    op.set_time_setter(setter);
    op.at_time(initial_time)
}

/// Black–Scholes operator on a log-spot grid, in the state variable of
/// `process`, initialised at `residual_time`.
///
/// With `ν = r − q − σ²/2` and uniform spacing the rows are
/// `pd = −(σ²/dx² − ν/dx)/2`, `pm = σ²/dx² + r`, `pu = −(σ²/dx² + ν/dx)/2`.
///
/// Corresponds to `QuantLib::BSMOperator` with a time-dependent
/// `PdeBSM` setter.
pub fn bsm_operator(
    grid: &Grid,
    process: Arc<GeneralizedBlackScholesProcess>,
    residual_time: Time,
) -> Result<TridiagonalOperator> {
    let setter = BsmTimeSetter {
        grid: grid.values().clone(),
        process,
    };
    time_dependent_operator(grid, Arc::new(setter), residual_time)
}

/// Operator for the state variable of a one-factor short-rate model,
/// initialised at time zero.
///
/// Corresponds to `QuantLib::OneFactorOperator`.
pub fn one_factor_operator(
    grid: &Grid,
    dynamics: Arc<dyn ShortRateDynamics>,
) -> Result<TridiagonalOperator> {
    let setter = OneFactorTimeSetter {
        grid: grid.values().clone(),
        dynamics,
    };
    time_dependent_operator(grid, Arc::new(setter), 0.0)
}
