//! Calibration trace of the Markov-functional model.

use super::settings::ModelSettings;
use ql_core::{Real, Time};
use std::fmt;

/// Diagnostics collected while tabulating the numeraire.
///
/// Per-point vectors are ordered by ascending expiry.  The smile-fit tables
/// hold one row per calibration point and one column per strike.
#[derive(Debug, Clone, Default)]
pub struct ModelOutputs {
    /// `true` until the tables below reflect the latest calculation.
    pub dirty: bool,
    /// Settings in effect.
    pub settings: ModelSettings,
    /// Calibration expiries.
    pub expiries: Vec<Time>,
    /// Calibration tenors in years.
    pub tenors: Vec<Time>,
    /// Market ATM levels.
    pub atm: Vec<Real>,
    /// Market annuities.
    pub annuity: Vec<Real>,
    /// Zero-bond adjustment factors (1 unless `ADJUST_YTS`).
    pub adjustment_factors: Vec<Real>,
    /// Digital adjustment factors (1 unless `ADJUST_DIGITALS`).
    pub digitals_adjustment_factors: Vec<Real>,
    /// Lifecycle messages and numerical warnings.
    pub messages: Vec<String>,
    /// Market continuously compounded zero rates at the expiries.
    pub market_zerorate: Vec<Real>,
    /// Model continuously compounded zero rates at the expiries.
    pub model_zerorate: Vec<Real>,
    /// Strikes of the smile fit.
    pub smile_strikes: Vec<Vec<Real>>,
    /// Call premia of the market section before ATM adjustment.
    pub market_raw_call_premium: Vec<Vec<Real>>,
    /// Put premia of the market section before ATM adjustment.
    pub market_raw_put_premium: Vec<Vec<Real>>,
    /// Call premia of the section used for calibration.
    pub market_call_premium: Vec<Vec<Real>>,
    /// Put premia of the section used for calibration.
    pub market_put_premium: Vec<Vec<Real>>,
    /// Model call premia.
    pub model_call_premium: Vec<Vec<Real>>,
    /// Model put premia.
    pub model_put_premium: Vec<Vec<Real>>,
    /// Market vega per 1% vol move.
    pub market_vega: Vec<Vec<Real>>,
}

impl fmt::Display for ModelOutputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Markov functional model trace output")?;
        writeln!(f, "Model settings")?;
        write!(f, "{}", self.settings)?;

        if self.dirty {
            return writeln!(f, "model outputs are dirty");
        }
        if self.expiries.is_empty() {
            return Ok(());
        }

        writeln!(f)?;
        writeln!(f, "Messages:")?;
        for message in &self.messages {
            writeln!(f, "{message}")?;
        }

        writeln!(f)?;
        writeln!(f, "Yield termstructure fit:")?;
        writeln!(
            f,
            "expiry;tenor;atm;annuity;digitalAdj;ytsAdj;marketzerorate;modelzerorate;diff(bp)"
        )?;
        for i in 0..self.expiries.len() {
            writeln!(
                f,
                "{};{};{:.16};{:.16};{:.16};{:.16};{:.16};{:.16};{:.16}",
                self.expiries[i],
                self.tenors[i],
                self.atm[i],
                self.annuity[i],
                self.digitals_adjustment_factors[i],
                self.adjustment_factors[i],
                self.market_zerorate[i],
                self.model_zerorate[i],
                (self.market_zerorate[i] - self.model_zerorate[i]) * 10000.0
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Volatility smile fit:")?;
        let headers: Vec<String> = self
            .expiries
            .iter()
            .zip(&self.tenors)
            .map(|(e, t)| {
                let p = format!("{e}/{t}");
                format!(
                    "strike({p});marketCallRaw({p});marketCall({p});modelCall({p});\
                     marketPutRaw({p});marketPut({p});modelPut({p});marketVega({p})"
                )
            })
            .collect();
        writeln!(f, "{}", headers.join(";"))?;
        let rows = self.smile_strikes.first().map_or(0, Vec::len);
        for j in 0..rows {
            let cells: Vec<String> = (0..self.expiries.len())
                .map(|i| {
                    format!(
                        "{};{};{};{};{};{};{};{}",
                        self.smile_strikes[i][j],
                        self.market_raw_call_premium[i][j],
                        self.market_call_premium[i][j],
                        self.model_call_premium[i][j],
                        self.market_raw_put_premium[i][j],
                        self.market_put_premium[i][j],
                        self.model_put_premium[i][j],
                        self.market_vega[i][j]
                    )
                })
                .collect();
            writeln!(f, "{}", cells.join(";"))?;
        }
        Ok(())
    }
}
