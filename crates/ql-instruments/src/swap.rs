//! Fixed-leg swap schedules.
//!
//! A [`FixedLegSchedule`] carries just enough of a fixed-for-floating swap
//! to value it in a one-factor model: the fixed-leg payment times, their
//! accrual fractions, the fixed rate and the nominal.  The floating leg is
//! valued at par, so the swap value at its start date `T0` is
//! `φ·N·(1 − Σ c_k P(T0, T_k))` with `c_k = K·τ_k` and the notional added to
//! the last coupon.

use ql_core::{ensure, errors::Result, Real, Time};

/// Swap type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapType {
    /// Payer (pay fixed, receive floating).
    Payer,
    /// Receiver (receive fixed, pay floating).
    Receiver,
}

impl SwapType {
    /// +1 for Payer, −1 for Receiver.
    pub fn sign(self) -> Real {
        match self {
            SwapType::Payer => 1.0,
            SwapType::Receiver => -1.0,
        }
    }
}

/// Conventions used to generate fixed-leg schedules on the fly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLegConvention {
    /// Fixed payments per year.
    pub frequency: u32,
}

impl FixedLegConvention {
    /// Annual fixed leg.
    pub fn annual() -> Self {
        Self { frequency: 1 }
    }

    /// Semiannual fixed leg.
    pub fn semiannual() -> Self {
        Self { frequency: 2 }
    }

    /// Unit-nominal payer schedule with zero fixed rate starting at `start`
    /// and running for `length` years.  Used for annuities and swap rates,
    /// which do not depend on the rate or the nominal.
    pub fn schedule(&self, start: Time, length: Time) -> Result<FixedLegSchedule> {
        FixedLegSchedule::from_tenor(SwapType::Payer, 1.0, 0.0, start, length, self.frequency)
    }
}

impl Default for FixedLegConvention {
    fn default() -> Self {
        Self::annual()
    }
}

/// Fixed leg of a vanilla swap, in year fractions from today.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedLegSchedule {
    swap_type: SwapType,
    nominal: Real,
    fixed_rate: Real,
    start: Time,
    payment_times: Vec<Time>,
    accruals: Vec<Real>,
}

impl FixedLegSchedule {
    /// Build a schedule from explicit payment times.  Accrual fractions are
    /// the distances between consecutive times, starting at `start`.
    pub fn new(
        swap_type: SwapType,
        nominal: Real,
        fixed_rate: Real,
        start: Time,
        payment_times: Vec<Time>,
    ) -> Result<Self> {
        ensure!(!payment_times.is_empty(), "no fixed-leg payment times given");
        ensure!(start >= 0.0, "swap start ({start}) must be non-negative");
        let mut previous = start;
        let mut accruals = Vec::with_capacity(payment_times.len());
        for &t in &payment_times {
            ensure!(
                t > previous,
                "payment times must be increasing and after the start ({t} <= {previous})"
            );
            accruals.push(t - previous);
            previous = t;
        }
        Ok(Self {
            swap_type,
            nominal,
            fixed_rate,
            start,
            payment_times,
            accruals,
        })
    }

    /// Regular schedule with `frequency` payments per year.  A length that is
    /// not a whole number of periods gives a short final period.
    pub fn from_tenor(
        swap_type: SwapType,
        nominal: Real,
        fixed_rate: Real,
        start: Time,
        length: Time,
        frequency: u32,
    ) -> Result<Self> {
        ensure!(frequency > 0, "fixed-leg frequency must be positive");
        ensure!(length > 0.0, "swap length ({length}) must be positive");
        let f = Real::from(frequency);
        let periods = ((length * f) - 1.0e-8).ceil().max(1.0) as usize;
        let payment_times = (1..=periods)
            .map(|k| {
                if k == periods {
                    start + length
                } else {
                    start + k as Real / f
                }
            })
            .collect();
        Self::new(swap_type, nominal, fixed_rate, start, payment_times)
    }

    /// Same payments with a different fixed rate.
    pub fn with_fixed_rate(mut self, fixed_rate: Real) -> Self {
        self.fixed_rate = fixed_rate;
        self
    }

    /// Same payments with a different type.
    pub fn with_type(mut self, swap_type: SwapType) -> Self {
        self.swap_type = swap_type;
        self
    }

    /// Payer or receiver.
    pub fn swap_type(&self) -> SwapType {
        self.swap_type
    }

    /// Notional amount.
    pub fn nominal(&self) -> Real {
        self.nominal
    }

    /// Fixed coupon rate.
    pub fn fixed_rate(&self) -> Real {
        self.fixed_rate
    }

    /// Start of the first accrual period.
    pub fn start_time(&self) -> Time {
        self.start
    }

    /// Last payment time.
    pub fn maturity(&self) -> Time {
        self.payment_times[self.payment_times.len() - 1]
    }

    /// Fixed-leg payment times.
    pub fn payment_times(&self) -> &[Time] {
        &self.payment_times
    }

    /// Accrual year fractions, one per payment.
    pub fn accruals(&self) -> &[Real] {
        &self.accruals
    }

    /// Fixed amounts per unit nominal, `K·τ_k`, with the notional exchange
    /// added to the last one.
    pub fn coupon_amounts(&self) -> Vec<Real> {
        let n = self.accruals.len();
        self.accruals
            .iter()
            .enumerate()
            .map(|(k, tau)| {
                let c = self.fixed_rate * tau;
                if k + 1 == n {
                    c + 1.0
                } else {
                    c
                }
            })
            .collect()
    }

    /// `Σ τ_k P(T_k)` for the given discount function.
    pub fn annuity<F: Fn(Time) -> Real>(&self, discount: F) -> Real {
        self.payment_times
            .iter()
            .zip(&self.accruals)
            .map(|(&t, tau)| tau * discount(t))
            .sum()
    }

    /// Par rate `(P(T0) − P(Tn)) / annuity`.
    pub fn fair_rate<F: Fn(Time) -> Real>(&self, discount: F) -> Real {
        let annuity = self.annuity(&discount);
        (discount(self.start) - discount(self.maturity())) / annuity
    }

    /// Swap value for the given discount function, floating leg at par:
    /// `φ·N·(P(T0) − Σ c_k P(T_k))`.
    pub fn value<F: Fn(Time) -> Real>(&self, discount: F) -> Real {
        let fixed: Real = self
            .payment_times
            .iter()
            .zip(self.coupon_amounts())
            .map(|(&t, c)| c * discount(t))
            .sum();
        self.swap_type.sign() * self.nominal * (discount(self.start) - fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn regular_schedule() {
        let s = FixedLegSchedule::from_tenor(SwapType::Payer, 100.0, 0.05, 1.0, 3.0, 2).unwrap();
        assert_eq!(s.payment_times().len(), 6);
        assert_abs_diff_eq!(s.payment_times()[0], 1.5, epsilon = 1e-14);
        assert_abs_diff_eq!(s.maturity(), 4.0, epsilon = 1e-14);
        for tau in s.accruals() {
            assert_abs_diff_eq!(*tau, 0.5, epsilon = 1e-14);
        }
        let c = s.coupon_amounts();
        assert_abs_diff_eq!(c[0], 0.025, epsilon = 1e-14);
        assert_abs_diff_eq!(c[5], 1.025, epsilon = 1e-14);
    }

    #[test]
    fn short_final_period() {
        let s = FixedLegConvention::annual().schedule(0.0, 2.5).unwrap();
        assert_eq!(s.payment_times(), &[1.0, 2.0, 2.5]);
        assert_abs_diff_eq!(s.accruals()[2], 0.5, epsilon = 1e-14);
    }

    #[test]
    fn swap_at_fair_rate_is_worth_nothing() {
        let discount = |t: Time| (-0.03 * t).exp();
        let s = FixedLegSchedule::from_tenor(SwapType::Payer, 1.0, 0.0, 2.0, 5.0, 1).unwrap();
        let fair = s.fair_rate(discount);
        let at_par = s.clone().with_fixed_rate(fair);
        assert_abs_diff_eq!(at_par.value(discount), 0.0, epsilon = 1e-14);

        let payer = s.clone().with_fixed_rate(fair - 0.01);
        let receiver = payer.clone().with_type(SwapType::Receiver);
        assert!(payer.value(discount) > 0.0);
        assert_abs_diff_eq!(
            payer.value(discount) + receiver.value(discount),
            0.0,
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            payer.value(discount),
            0.01 * s.annuity(discount),
            epsilon = 1e-14
        );
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(FixedLegSchedule::new(SwapType::Payer, 1.0, 0.0, 1.0, vec![]).is_err());
        assert!(FixedLegSchedule::new(SwapType::Payer, 1.0, 0.0, 1.0, vec![0.5]).is_err());
        assert!(FixedLegSchedule::from_tenor(SwapType::Payer, 1.0, 0.0, 0.0, 1.0, 0).is_err());
    }
}
