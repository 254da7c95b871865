//! Helpers shared by Gaussian one-factor models.
//!
//! Models whose state variable is Gaussian price by integrating piecewise
//! cubic payoffs against the standard normal density.  The integrals have
//! closed forms in terms of `erf` and `exp`, so a spline through payoff
//! values on a `y`-grid integrates exactly.

use ql_core::{Real, Size, Time};
use ql_math::distributions::erf;
use ql_math::Array;
use ql_processes::StochasticProcess1D;
use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

const FRAC_1_SQRT_PI: Real = 0.564_189_583_547_756_3;

/// `∫_{y0}^{y1} (a y⁴ + b y³ + c y² + d y + e) φ(y) dy` with `φ` the standard
/// normal density.
#[allow(clippy::too_many_arguments)]
pub fn gaussian_polynomial_integral(
    a: Real,
    b: Real,
    c: Real,
    d: Real,
    e: Real,
    y0: Real,
    y1: Real,
) -> Real {
    let aa = 4.0 * a;
    let ba = 2.0 * SQRT_2 * b;
    let ca = 2.0 * c;
    let da = SQRT_2 * d;
    let antiderivative = |x: Real| {
        0.125 * (3.0 * aa + 2.0 * ca + 4.0 * e) * erf(x)
            - 0.25 * FRAC_1_SQRT_PI
                * (-x * x).exp()
                * (2.0 * aa * x * x * x
                    + 3.0 * aa * x
                    + 2.0 * ba * (x * x + 1.0)
                    + 2.0 * ca * x
                    + 2.0 * da)
    };
    antiderivative(y1 * FRAC_1_SQRT_2) - antiderivative(y0 * FRAC_1_SQRT_2)
}

/// `∫_{x0}^{x1} P(y − h) φ(y) dy` for the quartic
/// `P(z) = a z⁴ + b z³ + c z² + d z + e`.
///
/// With `h = y_i` and the local coefficients of a cubic spline this
/// integrates one spline segment.
#[allow(clippy::too_many_arguments)]
pub fn gaussian_shifted_polynomial_integral(
    a: Real,
    b: Real,
    c: Real,
    d: Real,
    e: Real,
    h: Real,
    x0: Real,
    x1: Real,
) -> Real {
    gaussian_polynomial_integral(
        a,
        -4.0 * a * h + b,
        6.0 * a * h * h - 3.0 * b * h + c,
        -4.0 * a * h * h * h + 3.0 * b * h * h - 2.0 * c * h + d,
        a * h * h * h * h - b * h * h * h + c * h * h - d * h + e,
        x0,
        x1,
    )
}

/// Grid of standardized states `y` at time `T`, centred on the conditional
/// mean given `y` at time `t`.
///
/// Returns `2·grid_points + 1` values
/// `(E[x_T | x_t] + sd(t,T)·j·h − E[x_T]) / sd(0,T)`, `h = std_devs / grid_points`.
/// The standard deviation of the state process must not depend on the state.
pub fn y_grid(
    process: &dyn StochasticProcess1D,
    std_devs: Real,
    grid_points: Size,
    big_t: Time,
    t: Time,
    y: Real,
) -> Array {
    let x0 = process.x0();
    let std_dev_0_big_t = process.std_deviation_1d(0.0, x0, big_t);
    let e_0_big_t = process.expectation_1d(0.0, x0, big_t);

    let (e_t_big_t, std_dev_t_big_t) = if t < Real::EPSILON {
        (e_0_big_t, std_dev_0_big_t)
    } else {
        let std_dev_0_t = process.std_deviation_1d(0.0, x0, t);
        let e_0_t = process.expectation_1d(0.0, x0, t);
        let x_t = y * std_dev_0_t + e_0_t;
        (
            process.expectation_1d(t, x_t, big_t - t),
            process.std_deviation_1d(t, x_t, big_t - t),
        )
    };

    let h = std_devs / grid_points as Real;
    let n = grid_points as isize;
    Array::from_fn(2 * grid_points + 1, |k| {
        let j = (k as isize - n) as Real;
        (e_t_big_t + std_dev_t_big_t * j * h - e_0_big_t) / std_dev_0_big_t
    })
}
