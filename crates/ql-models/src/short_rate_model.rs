//! Short-rate model traits.
//!
//! A one-factor short-rate model exposes its *dynamics*: a 1-D state
//! process `x` together with the maps between `x` and the short rate `r`.
//! Finite-difference engines discretise `x` and discount at `r(t, x)`.
//!
//! ```text
//! ShortRateModel
//! └── OneFactorModel ── dynamics() → ShortRateDynamics
//! ```

use ql_core::{Real, Time};
use ql_processes::StochasticProcess1D;
use std::sync::Arc;

/// State-variable view of a one-factor short-rate model.
///
/// Corresponds to `QuantLib::OneFactorModel::ShortRateDynamics`.
pub trait ShortRateDynamics: std::fmt::Debug + Send + Sync {
    /// The process followed by the state variable.
    fn process(&self) -> &dyn StochasticProcess1D;

    /// State variable `x` corresponding to short rate `r` at time `t`.
    fn variable(&self, t: Time, r: Real) -> Real;

    /// Short rate `r` corresponding to state `x` at time `t`.
    fn short_rate(&self, t: Time, x: Real) -> Real;
}

/// A general short-rate model.
///
/// Corresponds to `QuantLib::ShortRateModel`.
pub trait ShortRateModel: std::fmt::Debug + Send + Sync {
    /// Discount bond price `P(t, T)` given the short rate at `t`.
    ///
    /// For affine models this has a closed form `A(t,T) exp(-B(t,T) r)`.
    fn discount_bond(&self, t: Time, big_t: Time, rate: Real) -> Real;
}

/// A one-factor short-rate model.
///
/// Corresponds to `QuantLib::OneFactorModel`.
pub trait OneFactorModel: ShortRateModel {
    /// The model dynamics used by finite-difference engines.
    fn dynamics(&self) -> Arc<dyn ShortRateDynamics>;
}
