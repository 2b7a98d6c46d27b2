use tracing::debug;

use super::smoothing::{require_nonzero, Ewm};
use crate::error::Result;
use crate::models::{PriceTable, Series, SeriesIndex};

pub const RSI_COLUMN: &str = "RSI";

/// RSI: 100 - 100 / (1 + smoothed gains / smoothed losses).
///
/// Bounded to [0, 100] wherever it is defined. A window with no price change
/// at all gives 0 / 0 and stays NaN.
///
/// Two smoothing conventions are provided and they do not agree with each
/// other. [`RSI::timo`] was checked against published quotes;
/// [`RSI::xavier`] was not and is known to drift from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RSI {
    period: usize,
}

impl RSI {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Wilder-style RSI over `column`.
    ///
    /// Gains and losses are smoothed with the plain recursion and
    /// a = 1 / period (center of mass period - 1). The first value is NaN
    /// since there is no price change yet. Output is unnamed and has one
    /// value per input row.
    pub fn timo(&self, data: &PriceTable, column: &str) -> Result<Series> {
        require_nonzero("period", self.period)?;
        let values = data.column(column)?;
        debug!(period = self.period, column, len = values.len(), "computing RSI (timo)");

        let ewm = Ewm::center_of_mass((self.period - 1) as f64)?.adjust(false);
        let delta = diff(values);
        let (up, down) = split_gains_losses(&delta);

        let roll_up = ewm.mean(&up);
        let roll_down: Vec<f64> = ewm.mean(&down).into_iter().map(f64::abs).collect();

        Ok(Series::new(
            None,
            SeriesIndex::Timestamps(data.index().to_vec()),
            relative_strength(&roll_up, &roll_down),
        ))
    }

    /// RSI over Close with adjusted span smoothing.
    ///
    /// The first (undefined) price change is dropped, so the series starts at
    /// the second timestamp and is one shorter than the input. Values stay NaN
    /// until `period` changes have been seen.
    pub fn xavier(&self, data: &PriceTable) -> Result<Series> {
        require_nonzero("period", self.period)?;
        let close = data.close()?;
        debug!(period = self.period, len = close.len(), "computing RSI (xavier)");

        let ewm = Ewm::span(self.period)?.min_periods(self.period);
        let delta: Vec<f64> = diff(close).into_iter().skip(1).collect();
        let (up, down) = split_gains_losses(&delta);
        let down: Vec<f64> = down.into_iter().map(f64::abs).collect();

        let gain = ewm.mean(&up);
        let loss = ewm.mean(&down);
        let index = data.index().iter().skip(1).copied().collect();

        Ok(Series::new(
            Some(RSI_COLUMN.to_string()),
            SeriesIndex::Timestamps(index),
            relative_strength(&gain, &loss),
        ))
    }
}

impl Default for RSI {
    fn default() -> Self {
        Self::new(14)
    }
}

/// First difference; position 0 is NaN
fn diff(values: &[f64]) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    for i in 1..values.len() {
        result[i] = values[i] - values[i - 1];
    }
    result
}

/// Gains keep positive changes (losses zeroed), losses keep negative changes
/// with their sign (gains zeroed). NaN passes through both.
fn split_gains_losses(delta: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let up: Vec<f64> = delta
        .iter()
        .map(|&d| if d < 0.0 { 0.0 } else { d })
        .collect();
    let down: Vec<f64> = delta
        .iter()
        .map(|&d| if d > 0.0 { 0.0 } else { d })
        .collect();
    (up, down)
}

/// 100 - 100 / (1 + gain / loss). A zero loss is not guarded: the ratio goes
/// to infinity and RSI to 100, while 0 / 0 gives NaN.
fn relative_strength(gain: &[f64], loss: &[f64]) -> Vec<f64> {
    gain.iter()
        .zip(loss)
        .map(|(g, l)| 100.0 - 100.0 / (1.0 + g / l))
        .collect()
}
