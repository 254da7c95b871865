//! Error types.
//!
//! A single `thiserror`-derived enum covers the three failure families of
//! the numerical core: violated preconditions (configuration or programmer
//! error), numerical breakdown (singular tridiagonal systems) and iterative
//! procedures that run out of evaluations.  `ensure!`, `ensure_post!` and
//! `fail!` are the shorthand used at call sites.

use thiserror::Error;

/// The top-level error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// Index out of range.
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },

    /// A tridiagonal forward elimination hit a zero pivot.
    #[error("singular tridiagonal system: zero pivot at row {row}")]
    SingularSystem {
        /// Row at which elimination broke down.
        row: usize,
    },

    /// An iterative solver exceeded its evaluation budget.
    #[error("{what}: maximum number of function evaluations ({evaluations}) exceeded")]
    MaxEvaluations {
        /// Which procedure gave up.
        what: String,
        /// Number of evaluations performed.
        evaluations: usize,
    },

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Not implemented.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// Shorthand `Result` type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure_post, errors::Error};
/// fn halve(x: f64) -> ql_core::errors::Result<f64> {
///     let result = x / 2.0;
///     ensure_post!(result.is_finite(), "result must be finite, got {result}");
///     Ok(result)
/// }
/// assert!(halve(1.0).is_ok());
/// assert!(halve(f64::INFINITY).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ql_core::{fail, errors::Error};
/// fn always_err() -> ql_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked_sqrt(x: f64) -> Result<f64> {
        crate::ensure!(x >= 0.0, "negative argument {x}");
        Ok(x.sqrt())
    }

    #[test]
    fn ensure_maps_to_precondition() {
        assert_eq!(checked_sqrt(4.0), Ok(2.0));
        assert_eq!(
            checked_sqrt(-1.0),
            Err(Error::Precondition("negative argument -1".into()))
        );
    }

    #[test]
    fn messages_render() {
        let e = Error::SingularSystem { row: 3 };
        assert_eq!(e.to_string(), "singular tridiagonal system: zero pivot at row 3");
        let e = Error::MaxEvaluations {
            what: "Brent".into(),
            evaluations: 100,
        };
        assert!(e.to_string().contains("(100)"));
    }
}
