//! # ql-processes
//!
//! One-dimensional diffusions consumed by the finite-difference grids and
//! the Markov-functional model: the Black-Scholes log-spot process, the
//! Ornstein-Uhlenbeck process and the Markov-functional state process.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod black_scholes_process;
pub mod mf_state_process;
pub mod ornstein_uhlenbeck_process;
pub mod stochastic_process;

pub use black_scholes_process::GeneralizedBlackScholesProcess;
pub use mf_state_process::MfStateProcess;
pub use ornstein_uhlenbeck_process::OrnsteinUhlenbeckProcess;
pub use stochastic_process::StochasticProcess1D;
