//! Generalized Black-Scholes process in log-spot coordinates.
//!
//! `d ln S = (r(t) − q(t) − σ(t)²/2) dt + σ(t) dW`
//!
//! where `r` and `q` are instantaneous forward rates of the risk-free and
//! dividend curves and `σ` is the forward Black volatility at the spot.
//! The state variable is `x = ln S`.

use crate::stochastic_process::StochasticProcess1D;
use ql_core::{ensure, errors::Result, Real, Time, Volatility};
use ql_termstructures::{BlackConstantVol, BlackVolTermStructure, FlatForward, YieldTermStructure};
use std::sync::Arc;

/// Width of the interval over which instantaneous rates and vols are taken.
const DT: Time = 1.0e-4;

/// A generalized Black-Scholes stochastic process on the log spot.
///
/// Corresponds to `QuantLib::GeneralizedBlackScholesProcess`.
#[derive(Debug, Clone)]
pub struct GeneralizedBlackScholesProcess {
    spot: Real,
    risk_free_rate: Arc<dyn YieldTermStructure>,
    dividend_yield: Arc<dyn YieldTermStructure>,
    black_vol: Arc<dyn BlackVolTermStructure>,
}

impl GeneralizedBlackScholesProcess {
    /// Create a new process.
    ///
    /// # Errors
    /// The spot must be positive.
    pub fn new(
        spot: Real,
        risk_free_rate: Arc<dyn YieldTermStructure>,
        dividend_yield: Arc<dyn YieldTermStructure>,
        black_vol: Arc<dyn BlackVolTermStructure>,
    ) -> Result<Self> {
        ensure!(spot > 0.0, "spot must be positive, got {spot}");
        Ok(Self {
            spot,
            risk_free_rate,
            dividend_yield,
            black_vol,
        })
    }

    /// Process on flat curves: constant `r`, `q` and `σ`.
    pub fn flat(spot: Real, r: Real, q: Real, vol: Volatility) -> Result<Self> {
        Self::new(
            spot,
            Arc::new(FlatForward::new(r)),
            Arc::new(FlatForward::new(q)),
            Arc::new(BlackConstantVol::new(vol)),
        )
    }

    /// The spot price.
    pub fn spot(&self) -> Real {
        self.spot
    }

    /// The risk-free rate term structure.
    pub fn risk_free_rate(&self) -> &Arc<dyn YieldTermStructure> {
        &self.risk_free_rate
    }

    /// The dividend yield term structure.
    pub fn dividend_yield(&self) -> &Arc<dyn YieldTermStructure> {
        &self.dividend_yield
    }

    /// The Black volatility surface.
    pub fn black_volatility(&self) -> &Arc<dyn BlackVolTermStructure> {
        &self.black_vol
    }

    /// Short-horizon forward volatility at time `t` and log spot `x`.
    pub fn local_vol(&self, t: Time, x: Real) -> Volatility {
        let strike = x.exp();
        self.black_vol
            .black_forward_vol(t, t + DT, strike)
            .unwrap_or_else(|_| self.black_vol.black_vol(t, strike))
    }

    /// Instantaneous risk-free rate at `t`.
    pub fn short_rate(&self, t: Time) -> Real {
        self.risk_free_rate.forward_rate(t, t + DT)
    }

    /// Instantaneous dividend yield at `t`.
    pub fn short_dividend(&self, t: Time) -> Real {
        self.dividend_yield.forward_rate(t, t + DT)
    }
}

impl StochasticProcess1D for GeneralizedBlackScholesProcess {
    fn x0(&self) -> Real {
        self.spot.ln()
    }

    fn drift_1d(&self, t: Time, x: Real) -> Real {
        let sigma = self.local_vol(t, x);
        self.short_rate(t) - self.short_dividend(t) - 0.5 * sigma * sigma
    }

    fn diffusion_1d(&self, t: Time, x: Real) -> Real {
        self.local_vol(t, x)
    }

    fn variance_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        let k = x.exp();
        self.black_vol
            .black_forward_variance(t, t + dt, k)
            .unwrap_or_else(|_| self.black_vol.black_vol(t, k).powi(2) * dt)
    }
}
