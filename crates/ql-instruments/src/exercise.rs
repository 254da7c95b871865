//! Option exercise schedules.
//!
//! An `Exercise` defines *when* an option can be exercised, as year
//! fractions from today.

use ql_core::{ensure, errors::Result, Time};
use std::fmt;

/// Type of exercise right.
///
/// Corresponds to `QuantLib::Exercise::Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseType {
    /// Can only be exercised at expiry.
    European,
    /// Can be exercised at any time up to expiry.
    American,
    /// Can be exercised at specific times.
    Bermudan,
}

/// Exercise specification for an option.
///
/// Corresponds to `QuantLib::Exercise` and its subclasses.
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    exercise_type: ExerciseType,
    /// - European: single time (the expiry).
    /// - American: two times (earliest, latest).
    /// - Bermudan: sorted, distinct times.
    times: Vec<Time>,
}

impl Exercise {
    /// A European exercise at `expiry`.
    pub fn european(expiry: Time) -> Result<Self> {
        ensure!(expiry > 0.0, "expiry ({expiry}) must be positive");
        Ok(Self {
            exercise_type: ExerciseType::European,
            times: vec![expiry],
        })
    }

    /// An American exercise between `earliest` and `latest`.
    pub fn american(earliest: Time, latest: Time) -> Result<Self> {
        ensure!(
            earliest >= 0.0 && latest > earliest,
            "invalid American exercise window [{earliest}, {latest}]"
        );
        Ok(Self {
            exercise_type: ExerciseType::American,
            times: vec![earliest, latest],
        })
    }

    /// A Bermudan exercise on the given times (sorted and de-duplicated).
    pub fn bermudan(mut times: Vec<Time>) -> Result<Self> {
        ensure!(!times.is_empty(), "Bermudan exercise needs at least one time");
        ensure!(
            times.iter().all(|t| t.is_finite() && *t >= 0.0),
            "Bermudan exercise times must be finite and non-negative"
        );
        times.sort_by(|a, b| a.total_cmp(b));
        times.dedup();
        Ok(Self {
            exercise_type: ExerciseType::Bermudan,
            times,
        })
    }

    /// The last possible exercise time.
    pub fn last_time(&self) -> Time {
        self.times[self.times.len() - 1]
    }

    /// All exercise times.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// The type of exercise.
    pub fn exercise_type(&self) -> ExerciseType {
        self.exercise_type
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exercise_type {
            ExerciseType::European => write!(f, "European({})", self.times[0]),
            ExerciseType::American => {
                write!(f, "American({} to {})", self.times[0], self.last_time())
            }
            ExerciseType::Bermudan => write!(f, "Bermudan({} times)", self.times.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn european_exercise() {
        let ex = Exercise::european(1.5).unwrap();
        assert_eq!(ex.exercise_type(), ExerciseType::European);
        assert_eq!(ex.last_time(), 1.5);
        assert!(Exercise::european(0.0).is_err());
    }

    #[test]
    fn american_exercise() {
        let ex = Exercise::american(0.0, 2.0).unwrap();
        assert_eq!(ex.times(), &[0.0, 2.0]);
        assert_eq!(ex.to_string(), "American(0 to 2)");
        assert!(Exercise::american(1.0, 1.0).is_err());
    }

    #[test]
    fn bermudan_exercise_is_sorted() {
        let ex = Exercise::bermudan(vec![2.0, 0.5, 1.0, 0.5]).unwrap();
        assert_eq!(ex.times(), &[0.5, 1.0, 2.0]);
        assert_eq!(ex.last_time(), 2.0);
        assert!(Exercise::bermudan(vec![]).is_err());
    }
}
