//! Probability distributions.
//!
//! Only the standard normal is needed by the pricing core; the error
//! function comes from `statrs`.

pub mod normal;

pub use normal::{erf, erfc, normal_cdf, normal_cdf_inverse, normal_pdf};
