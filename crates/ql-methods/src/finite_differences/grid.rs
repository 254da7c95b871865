//! Uniform spatial grids.
//!
//! A grid is an increasing array of state values with constant spacing
//! and a pinned index: the node at which the price is read.  Grids in
//! log-spot coordinates report derivatives with respect to the spot.

use ql_core::{ensure, errors::Result, Real, Size, Time};
use ql_math::Array;
use ql_processes::StochasticProcess1D;
use tracing::debug;

/// Minimum number of grid points for a one-year horizon.
pub const MIN_GRID_POINTS: Size = 100;

/// Additional grid points per year beyond the first.
pub const GRID_POINTS_PER_YEAR: Size = 50;

/// Floor for the half width of a process grid.
pub const MIN_GRID_HALF_WIDTH: Real = 0.01;

/// Widening added to the standard deviation so that tiny volatilities
/// still span a useful range.
const SMALL_VOL_PADDING: Real = 0.02;

/// Number of standard deviations covered by a log-spot grid.
const LOG_SPOT_STD_DEVS: Real = 4.0;

/// The strike is kept at least this factor inside a log-spot grid.
const SAFETY_ZONE_FACTOR: Real = 1.1;

/// Number of grid points sufficient for the residual time, never fewer
/// than requested.
pub fn safe_grid_points(requested: Size, residual_time: Time) -> Size {
    let minimum = if residual_time > 1.0 {
        (MIN_GRID_POINTS as Real + (residual_time - 1.0) * GRID_POINTS_PER_YEAR as Real) as Size
    } else {
        MIN_GRID_POINTS
    };
    requested.max(minimum)
}

fn odd(size: Size) -> Size {
    if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

/// A uniform 1-D grid with a pinned centre index.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    values: Array,
    dx: Real,
    index: Size,
    center: Real,
    log_spot: bool,
}

impl Grid {
    /// `size` equally spaced values from `x_min` to `x_max`; the pinned
    /// index is the node nearest to `center`.
    ///
    /// # Errors
    /// At least three points and `x_max > x_min`.
    pub fn new(x_min: Real, x_max: Real, size: Size, center: Real) -> Result<Self> {
        ensure!(size >= 3, "grid needs at least 3 points, got {size}");
        ensure!(
            x_max > x_min,
            "grid upper bound ({x_max}) must exceed lower bound ({x_min})"
        );
        let dx = (x_max - x_min) / (size - 1) as Real;
        let values = Array::from_fn(size, |j| x_min + j as Real * dx);
        let position = ((center - x_min) / dx + 0.5).trunc();
        let index = position.clamp(0.0, (size - 1) as Real) as Size;
        Ok(Self {
            values,
            dx,
            index,
            center,
            log_spot: false,
        })
    }

    /// Grid for the state of `process`, centred on `center` and spanning
    /// `std_devs` standard deviations over `residual_time`, clipped to
    /// the admissible states of the process.
    pub fn for_process(
        process: &dyn StochasticProcess1D,
        center: Real,
        residual_time: Time,
        size: Size,
        std_devs: Real,
    ) -> Result<Self> {
        ensure!(residual_time > 0.0, "residual time ({residual_time}) must be positive");
        ensure!(std_devs > 0.0, "number of standard deviations ({std_devs}) must be positive");
        let std_dev = process.std_deviation_1d(0.0, center, residual_time);
        let half_width = (std_devs * (std_dev + SMALL_VOL_PADDING)).max(MIN_GRID_HALF_WIDTH);
        let x_min = (center - half_width).max(process.min_state_variable());
        let x_max = (center + half_width).min(process.max_state_variable());
        let size = odd(size);
        debug!(x_min, x_max, size, std_dev, "process grid");
        Self::new(x_min, x_max, size, center)
    }

    /// Log-spot grid for an option struck at `strike`.
    ///
    /// The spot range is `center_spot · exp(±4(σ√T + 0.02))`, widened
    /// symmetrically until the strike lies a factor 1.1 inside it.  An
    /// even `size` is raised by one so that the centre is a node.
    pub fn log_spot(
        center_spot: Real,
        strike: Real,
        volatility: Real,
        residual_time: Time,
        size: Size,
    ) -> Result<Self> {
        ensure!(center_spot > 0.0, "grid centre ({center_spot}) must be positive");
        ensure!(strike > 0.0, "strike ({strike}) must be positive");
        ensure!(volatility >= 0.0, "volatility ({volatility}) must be non-negative");
        ensure!(residual_time > 0.0, "residual time ({residual_time}) must be positive");

        let vol_sqrt_time = volatility * residual_time.sqrt();
        let min_max_factor = (LOG_SPOT_STD_DEVS * (vol_sqrt_time + SMALL_VOL_PADDING)).exp();
        let mut s_min = center_spot / min_max_factor;
        let mut s_max = center_spot * min_max_factor;
        if s_min > strike / SAFETY_ZONE_FACTOR {
            s_min = strike / SAFETY_ZONE_FACTOR;
            s_max = center_spot / (s_min / center_spot);
        }
        if s_max < strike * SAFETY_ZONE_FACTOR {
            s_max = strike * SAFETY_ZONE_FACTOR;
            s_min = center_spot / (s_max / center_spot);
        }
        let size = odd(size);
        debug!(s_min, s_max, size, "log-spot grid");
        let mut grid = Self::new(s_min.ln(), s_max.ln(), size, center_spot.ln())?;
        grid.log_spot = true;
        Ok(grid)
    }

    /// The same grid translated by less than half a step so that `value`
    /// falls exactly on the node nearest to it, which becomes the pinned
    /// index.
    pub fn anchored_at(&self, value: Real) -> Self {
        let x0 = self.values[0];
        let last = (self.size() - 1) as Real;
        let index = ((value - x0) / self.dx).round().clamp(0.0, last) as Size;
        let shift = value - self.values[index];
        Self {
            values: &self.values + shift,
            dx: self.dx,
            index,
            center: value,
            log_spot: self.log_spot,
        }
    }

    /// Grid values.
    pub fn values(&self) -> &Array {
        &self.values
    }

    /// Spacing.
    pub fn dx(&self) -> Real {
        self.dx
    }

    /// The pinned index.
    pub fn index(&self) -> Size {
        self.index
    }

    /// Number of nodes.
    pub fn size(&self) -> Size {
        self.values.size()
    }

    /// The requested centre.
    pub fn center(&self) -> Real {
        self.center
    }

    /// `true` for log-spot grids.
    pub fn is_log_spot(&self) -> bool {
        self.log_spot
    }

    /// `exp` of the grid values.
    pub fn spot_values(&self) -> Array {
        self.values.map(Real::exp)
    }

    fn abscissae(&self) -> Array {
        if self.log_spot {
            self.spot_values()
        } else {
            self.values.clone()
        }
    }

    fn check(&self, prices: &Array) -> Result<Size> {
        ensure!(
            prices.size() == self.size(),
            "price array size ({}) does not match grid size ({})",
            prices.size(),
            self.size()
        );
        Ok(self.index.clamp(1, self.size() - 2))
    }

    /// Price at the pinned index.
    pub fn value_at_center(&self, prices: &Array) -> Result<Real> {
        self.check(prices)?;
        Ok(prices[self.index])
    }

    /// Central first derivative at the pinned index, with respect to the
    /// spot for log-spot grids.
    pub fn first_derivative_at_center(&self, prices: &Array) -> Result<Real> {
        let j = self.check(prices)?;
        let g = self.abscissae();
        Ok((prices[j + 1] - prices[j - 1]) / (g[j + 1] - g[j - 1]))
    }

    /// Central second derivative at the pinned index, with respect to the
    /// spot for log-spot grids.
    pub fn second_derivative_at_center(&self, prices: &Array) -> Result<Real> {
        let j = self.check(prices)?;
        let g = self.abscissae();
        let delta_plus = (prices[j + 1] - prices[j]) / (g[j + 1] - g[j]);
        let delta_minus = (prices[j] - prices[j - 1]) / (g[j] - g[j - 1]);
        Ok((delta_plus - delta_minus) / (0.5 * (g[j + 1] - g[j - 1])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_processes::OrnsteinUhlenbeckProcess;

    #[test]
    fn safe_grid_points_grow_with_maturity() {
        assert_eq!(safe_grid_points(10, 0.5), 100);
        assert_eq!(safe_grid_points(100, 0.5), 100);
        assert_eq!(safe_grid_points(10, 3.0), 200);
        assert_eq!(safe_grid_points(400, 3.0), 400);
        assert_eq!(safe_grid_points(301, 1.0), 301);
        assert_eq!(safe_grid_points(10, 1.5), 125);
    }

    #[test]
    fn log_spot_grid_has_a_middle_node() {
        let grid = Grid::log_spot(100.0, 100.0, 0.2, 1.0, 100).unwrap();
        assert_eq!(grid.size(), 101);
        assert_eq!(grid.index(), 50);
    }

    #[test]
    fn uniform_grid_pins_the_nearest_node() {
        let grid = Grid::new(0.0, 1.0, 11, 0.34).unwrap();
        assert_abs_diff_eq!(grid.dx(), 0.1, epsilon = 1e-15);
        assert_eq!(grid.index(), 3);
        assert_abs_diff_eq!(grid.values()[10], 1.0, epsilon = 1e-15);
        assert_eq!(Grid::new(0.0, 1.0, 11, 5.0).unwrap().index(), 10);
        assert_eq!(Grid::new(0.0, 1.0, 11, -5.0).unwrap().index(), 0);
    }

    #[test]
    fn degenerate_grids_are_rejected() {
        assert!(Grid::new(0.0, 1.0, 2, 0.5).is_err());
        assert!(Grid::new(1.0, 1.0, 5, 1.0).is_err());
    }

    #[test]
    fn log_spot_grid_is_centred_and_contains_the_strike() {
        let grid = Grid::log_spot(100.0, 100.0, 0.2, 1.0, 101).unwrap();
        assert!(grid.is_log_spot());
        assert_eq!(grid.index(), 50);
        assert_abs_diff_eq!(grid.spot_values()[50], 100.0, epsilon = 1e-9);
        let factor = (4.0_f64 * 0.22).exp();
        assert_abs_diff_eq!(grid.spot_values()[0], 100.0 / factor, epsilon = 1e-9);

        // a far strike widens the grid around the same centre
        let grid = Grid::log_spot(100.0, 400.0, 0.1, 0.25, 101).unwrap();
        let spots = grid.spot_values();
        assert_abs_diff_eq!(spots[100], 440.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spots[0], 100.0 * 100.0 / 440.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spots[50], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn anchoring_moves_a_node_onto_the_value() {
        let grid = Grid::new(0.0, 1.0, 11, 0.5).unwrap().anchored_at(0.33);
        assert_eq!(grid.index(), 3);
        assert_abs_diff_eq!(grid.values()[3], 0.33, epsilon = 1e-15);
        assert_abs_diff_eq!(grid.dx(), 0.1, epsilon = 1e-15);
    }

    #[test]
    fn process_grid_respects_the_horizon() {
        let process = OrnsteinUhlenbeckProcess::new(0.0, 0.01, 0.0, 0.0).unwrap();
        let grid = Grid::for_process(&process, 0.0, 4.0, 50, 5.0).unwrap();
        assert_eq!(grid.size(), 51);
        assert_eq!(grid.index(), 25);
        assert_abs_diff_eq!(grid.values()[50], 5.0 * (0.02 + 0.02), epsilon = 1e-12);

        let flat = OrnsteinUhlenbeckProcess::new(0.0, 0.0, 0.0, 0.0).unwrap();
        let grid = Grid::for_process(&flat, 0.03, 1.0, 21, 0.1).unwrap();
        assert_abs_diff_eq!(grid.values()[20] - 0.03, MIN_GRID_HALF_WIDTH, epsilon = 1e-12);
    }

    #[test]
    fn derivatives_of_a_quadratic() {
        let grid = Grid::new(-1.0, 1.0, 21, 0.0).unwrap();
        let prices = grid.values().map(|x| 3.0 + 2.0 * x + 0.5 * x * x);
        assert_abs_diff_eq!(grid.value_at_center(&prices).unwrap(), 3.0, epsilon = 1e-14);
        assert_abs_diff_eq!(grid.first_derivative_at_center(&prices).unwrap(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grid.second_derivative_at_center(&prices).unwrap(), 1.0, epsilon = 1e-10);
        assert!(grid.value_at_center(&Array::zeros(3)).is_err());
    }

    #[test]
    fn log_spot_derivatives_are_in_spot_units() {
        let grid = Grid::log_spot(100.0, 100.0, 0.2, 1.0, 801).unwrap();
        let prices = grid.spot_values().map(|s| s * s);
        assert_abs_diff_eq!(grid.first_derivative_at_center(&prices).unwrap(), 200.0, epsilon = 1e-2);
        assert_abs_diff_eq!(grid.second_derivative_at_center(&prices).unwrap(), 2.0, epsilon = 1e-3);
    }
}
