//! European option on a log-spot grid, without control variate.

use crate::fd_multi_period_option::{FdOptionParameters, MultiPeriodOption};
use ql_core::{errors::Result, Real, Time};

/// European option valued by plain Crank–Nicolson rollback.
///
/// The price is the raw finite-difference value, which makes this pricer
/// the reference for grid convergence against Black-Scholes.
///
/// Corresponds to `QuantLib::FdEuropean`.
#[derive(Debug, Clone)]
pub struct FdEuropeanOption {
    params: FdOptionParameters,
}

impl FdEuropeanOption {
    /// Option with the given contract and market data.
    pub fn new(params: FdOptionParameters) -> Self {
        Self { params }
    }
}

impl MultiPeriodOption for FdEuropeanOption {
    fn parameters(&self) -> &FdOptionParameters {
        &self.params
    }

    fn event_times(&self) -> &[Time] {
        &[]
    }

    fn initialize_control_variate(&self) -> Result<Option<Real>> {
        Ok(None)
    }
}
