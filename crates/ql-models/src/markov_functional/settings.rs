//! Numerical settings of the Markov-functional model.

use ql_core::{ensure, errors::Result, Real, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bit set of optional numeraire adjustments.
///
/// Serialised as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Adjustments(u32);

impl Adjustments {
    /// No adjustment.
    pub const NONE: Self = Self(0);
    /// Rescale digitals so that they reproduce the market annuity.
    pub const ADJUST_DIGITALS: Self = Self(1 << 0);
    /// Rescale each numeraire slice to reprice the market zero bond.
    pub const ADJUST_YTS: Self = Self(1 << 1);
    /// Extrapolate payoffs flat beyond the y-grid.
    pub const EXTRAPOLATE_PAYOFF_FLAT: Self = Self(1 << 2);
    /// Do not integrate payoffs beyond the y-grid.
    pub const NO_PAYOFF_EXTRAPOLATION: Self = Self(1 << 3);

    /// Raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// `true` if every flag of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Clear the flags of `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for Adjustments {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Adjustments {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Adjustments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::ADJUST_DIGITALS, "Digitals"),
            (Self::ADJUST_YTS, "Yts"),
            (Self::EXTRAPOLATE_PAYOFF_FLAT, "FlatPayoffExt"),
            (Self::NO_PAYOFF_EXTRAPOLATION, "NoPayoffExt"),
        ];
        for (flag, name) in names {
            if self.contains(flag) {
                write!(f, "{name} ")?;
            }
        }
        Ok(())
    }
}

/// Grid sizes, tolerances and adjustments of the numeraire tabulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Points on each side of the centre of the y-grid.
    pub y_grid_points: Size,
    /// Standard deviations covered by the y-grid.
    pub y_std_devs: Real,
    /// Order of the Gauss-Hermite rule for deflated zero bonds.
    pub gauss_hermite_points: Size,
    /// Strike gap of the finite-difference digital prices.
    pub digital_gap: Real,
    /// Accuracy of the swap-rate inversion.
    pub market_rate_accuracy: Real,
    /// Lowest swap rate the inversion may return (before the smile shift).
    pub lower_rate_bound: Real,
    /// Highest swap rate the inversion may return.
    pub upper_rate_bound: Real,
    /// Optional adjustments.
    pub adjustments: Adjustments,
    /// Moneyness values at which the smile fit is reported.
    pub smile_moneyness_checkpoints: Vec<Real>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            y_grid_points: 64,
            y_std_devs: 7.0,
            gauss_hermite_points: 32,
            digital_gap: 1e-5,
            market_rate_accuracy: 1e-7,
            lower_rate_bound: 0.0,
            upper_rate_bound: 2.0,
            adjustments: Adjustments::NONE,
            smile_moneyness_checkpoints: Vec::new(),
        }
    }
}

impl ModelSettings {
    /// Check consistency.
    ///
    /// # Errors
    /// Precondition error naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !(self.adjustments.contains(Adjustments::EXTRAPOLATE_PAYOFF_FLAT)
                && self.adjustments.contains(Adjustments::NO_PAYOFF_EXTRAPOLATION)),
            "flat payoff extrapolation and no payoff extrapolation are mutually exclusive"
        );
        ensure!(
            self.y_grid_points > 0,
            "at least one grid point ({}) for the state process discretization must be given",
            self.y_grid_points
        );
        ensure!(
            self.y_std_devs > 0.0,
            "multiple of standard deviations covered by state process discretization ({}) must be positive",
            self.y_std_devs
        );
        ensure!(
            self.gauss_hermite_points > 0,
            "number of gauss hermite integration points ({}) must be positive",
            self.gauss_hermite_points
        );
        ensure!(
            self.digital_gap > 0.0,
            "digital gap ({}) must be positive",
            self.digital_gap
        );
        ensure!(
            self.market_rate_accuracy > 0.0,
            "market rate accuracy ({}) must be positive",
            self.market_rate_accuracy
        );
        ensure!(
            self.lower_rate_bound < self.upper_rate_bound,
            "lower rate bound ({}) must be strictly less than upper rate bound ({})",
            self.lower_rate_bound,
            self.upper_rate_bound
        );
        Ok(())
    }

    /// Set the number of y-grid points per side.
    pub fn with_y_grid_points(mut self, n: Size) -> Self {
        self.y_grid_points = n;
        self
    }

    /// Set the y-grid width in standard deviations.
    pub fn with_y_std_devs(mut self, s: Real) -> Self {
        self.y_std_devs = s;
        self
    }

    /// Set the Gauss-Hermite order.
    pub fn with_gauss_hermite_points(mut self, n: Size) -> Self {
        self.gauss_hermite_points = n;
        self
    }

    /// Set the digital gap.
    pub fn with_digital_gap(mut self, d: Real) -> Self {
        self.digital_gap = d;
        self
    }

    /// Set the swap-rate inversion accuracy.
    pub fn with_market_rate_accuracy(mut self, a: Real) -> Self {
        self.market_rate_accuracy = a;
        self
    }

    /// Set the upper rate bound.
    pub fn with_upper_rate_bound(mut self, u: Real) -> Self {
        self.upper_rate_bound = u;
        self
    }

    /// Set the lower rate bound.
    pub fn with_lower_rate_bound(mut self, l: Real) -> Self {
        self.lower_rate_bound = l;
        self
    }

    /// Replace the adjustment flags.
    pub fn with_adjustments(mut self, a: Adjustments) -> Self {
        self.adjustments = a;
        self
    }

    /// Add adjustment flags.
    pub fn add_adjustment(mut self, a: Adjustments) -> Self {
        self.adjustments |= a;
        self
    }

    /// Remove adjustment flags.
    pub fn remove_adjustment(mut self, a: Adjustments) -> Self {
        self.adjustments.remove(a);
        self
    }

    /// Set the smile-fit moneyness checkpoints.
    pub fn with_smile_moneyness_checkpoints(mut self, m: Vec<Real>) -> Self {
        self.smile_moneyness_checkpoints = m;
        self
    }
}

impl fmt::Display for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid points y        : {}", self.y_grid_points)?;
        writeln!(f, "Std devs y           : {}", self.y_std_devs)?;
        writeln!(f, "Lower rate bound     : {}", self.lower_rate_bound)?;
        writeln!(f, "Upper rate bound     : {}", self.upper_rate_bound)?;
        writeln!(f, "Gauss Hermite points : {}", self.gauss_hermite_points)?;
        writeln!(f, "Digital gap          : {}", self.digital_gap)?;
        writeln!(f, "Adjustments          : {}", self.adjustments)?;
        let checkpoints: Vec<String> = self
            .smile_moneyness_checkpoints
            .iter()
            .map(|m| m.to_string())
            .collect();
        writeln!(f, "Smile moneyness checkpoints: {}", checkpoints.join(";"))
    }
}
