//! Time-stepping schemes.
//!
//! All schemes step backward in time, from `t` to `t − dt`, for the
//! evolution `∂u/∂t = L·u`:
//!
//! ```text
//! (I + θ·dt·L(t−dt)) · u(t−dt) = (I − (1−θ)·dt·L(t)) · u(t)
//! ```
//!
//! `θ = 0` is explicit Euler, `θ = ½` Crank–Nicolson and `θ = 1` implicit
//! Euler.

use super::boundary_condition::BoundaryCondition;
use super::operator_traits::DifferentialOperator;
use ql_core::{ensure, errors::Result, Real, Time};
use ql_math::Array;
use std::cell::RefCell;
use tracing::trace;

/// A backward time-stepping scheme for operators of type `L`.
pub trait Scheme<L: DifferentialOperator> {
    /// Evolve `values` from `t` to `t − dt`.
    ///
    /// Returns the operator snapshot used for the implicit half together
    /// with the evolved values.
    fn step(&self, operator: &L, values: Array, t: Time, dt: Time) -> Result<(L, Array)>;
}

#[derive(Debug, Clone)]
struct CachedParts<L> {
    base: L,
    dt: Time,
    explicit: L,
    implicit: L,
}

/// θ-weighted mix of explicit and implicit Euler.
///
/// The scheme's boundary conditions are attached to both the explicit and
/// the implicit part.  For time-independent operators both parts are
/// built once per step width and reused.
///
/// Corresponds to `QuantLib::MixedScheme`.
#[derive(Debug, Clone)]
pub struct MixedScheme<L> {
    theta: Real,
    bcs: Vec<BoundaryCondition>,
    cache: RefCell<Option<CachedParts<L>>>,
}

impl<L: DifferentialOperator> MixedScheme<L> {
    /// Scheme with weight `theta` on the implicit part.
    ///
    /// # Errors
    /// `theta` must lie in `[0, 1]`.
    pub fn new(theta: Real, bcs: Vec<BoundaryCondition>) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&theta),
            "theta ({theta}) must be in [0, 1]"
        );
        Ok(Self::with_theta(theta, bcs))
    }

    /// Explicit Euler, `θ = 0`: `u(t−dt) = (I − dt·L(t))·u(t)`.
    pub fn explicit_euler(bcs: Vec<BoundaryCondition>) -> Self {
        Self::with_theta(0.0, bcs)
    }

    /// Crank–Nicolson, `θ = ½`, second order in time.
    pub fn crank_nicolson(bcs: Vec<BoundaryCondition>) -> Self {
        Self::with_theta(0.5, bcs)
    }

    /// Fully implicit Euler, `θ = 1`.
    pub fn implicit_euler(bcs: Vec<BoundaryCondition>) -> Self {
        Self::with_theta(1.0, bcs)
    }

    fn with_theta(theta: Real, bcs: Vec<BoundaryCondition>) -> Self {
        Self {
            theta,
            bcs,
            cache: RefCell::new(None),
        }
    }

    /// Weight of the implicit part.
    pub fn theta(&self) -> Real {
        self.theta
    }

    /// Boundary conditions attached to both parts.
    pub fn boundary_conditions(&self) -> &[BoundaryCondition] {
        &self.bcs
    }

    fn explicit_part(&self, op: &L, dt: Time) -> Result<L> {
        op.identity_plus_scaled(-(1.0 - self.theta) * dt)
            .with_boundary_conditions(&self.bcs)
    }

    fn implicit_part(&self, op: &L, dt: Time) -> Result<L> {
        op.identity_plus_scaled(self.theta * dt)
            .with_boundary_conditions(&self.bcs)
    }

    fn evolve(&self, explicit: &L, implicit: &L, mut values: Array) -> Result<Array> {
        if self.theta != 1.0 {
            values = explicit.apply_to(&values)?;
        }
        if self.theta != 0.0 {
            values = implicit.solve_for(&values)?;
        }
        Ok(values)
    }
}

impl<L: DifferentialOperator> Scheme<L> for MixedScheme<L> {
    fn step(&self, operator: &L, values: Array, t: Time, dt: Time) -> Result<(L, Array)> {
        ensure!(dt > 0.0, "time step ({dt}) must be positive");
        ensure!(
            values.size() == operator.size(),
            "array size ({}) does not match operator size ({})",
            values.size(),
            operator.size()
        );

        if operator.is_time_dependent() {
            let now = operator.at_time(t)?;
            let next = operator.at_time(t - dt)?;
            let explicit = self.explicit_part(&now, dt)?;
            let implicit = self.implicit_part(&next, dt)?;
            let values = self.evolve(&explicit, &implicit, values)?;
            return Ok((next, values));
        }

        let mut cache = self.cache.borrow_mut();
        let parts = match cache.take() {
            Some(parts) if parts.dt == dt && parts.base == *operator => parts,
            _ => {
                trace!(dt, theta = self.theta, "building scheme operators");
                CachedParts {
                    base: operator.clone(),
                    dt,
                    explicit: self.explicit_part(operator, dt)?,
                    implicit: self.implicit_part(operator, dt)?,
                }
            }
        };
        let values = self.evolve(&parts.explicit, &parts.implicit, values)?;
        *cache = Some(parts);
        Ok((operator.clone(), values))
    }
}
