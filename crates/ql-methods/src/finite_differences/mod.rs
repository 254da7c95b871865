//! Finite-difference framework for 1-D backward PDEs.
//!
//! Translates the classic `ql/FiniteDifferences/` design: a tridiagonal
//! operator with boundary conditions, θ-schemes stepping it backward in
//! time, and a model that rolls a value array back between dates while
//! applying a step condition.
//!
//! # Overview
//!
//! * [`TridiagonalOperator`] — operator algebra and Thomas solver
//! * [`BoundaryCondition`] — Neumann / Dirichlet conditions
//! * [`MixedScheme`] — explicit Euler, Crank–Nicolson, implicit Euler
//! * [`FiniteDifferenceModel`] — rollback with stopping times
//! * [`StepCondition`] — American and swaption exercise
//! * [`Grid`] — uniform grids with a pinned centre
//! * [`bsm_operator`], [`one_factor_operator`] — PDE operator builders

mod boundary_condition;
mod grid;
mod model;
mod operator_traits;
mod operators;
mod schemes;
mod step_condition;
mod tridiagonal_operator;

pub use boundary_condition::{BoundaryCondition, Side};
pub use grid::{safe_grid_points, Grid, GRID_POINTS_PER_YEAR, MIN_GRID_HALF_WIDTH, MIN_GRID_POINTS};
pub use model::FiniteDifferenceModel;
pub use operator_traits::DifferentialOperator;
pub use operators::{bsm_operator, one_factor_operator};
pub use schemes::{MixedScheme, Scheme};
pub use step_condition::{AmericanCondition, NullCondition, StepCondition, SwaptionCondition};
pub use tridiagonal_operator::{TimeSetter, TridiagonalOperator};
