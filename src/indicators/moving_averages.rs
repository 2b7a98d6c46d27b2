use tracing::debug;

use super::smoothing::{require_nonzero, rolling_mean, Ewm};
use crate::error::Result;
use crate::models::{Column, IndicatorTable, PriceTable, Series, SeriesIndex, CLOSE, DATES};

/// Simple Moving Average (SMA)
/// Calculates the arithmetic mean of the last N closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SMA {
    window: usize,
}

impl SMA {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Output name, e.g. "21d"
    pub fn name(&self) -> String {
        format!("{}d", self.window)
    }

    /// Calculate the SMA of the Close column
    /// Returns a series on the input timestamps, same length as input
    /// First (window - 1) values will be NaN (warmup period)
    pub fn calculate(&self, data: &PriceTable) -> Result<Series> {
        require_nonzero("window", self.window)?;
        let close = data.close()?;
        debug!(window = self.window, len = close.len(), "computing SMA");

        Ok(Series::new(
            Some(self.name()),
            SeriesIndex::Timestamps(data.index().to_vec()),
            rolling_mean(close, self.window),
        ))
    }
}

impl Default for SMA {
    fn default() -> Self {
        Self::new(21)
    }
}

/// Exponential Moving Average (EMA)
/// Weights recent prices more heavily, a = 2 / (span + 1), using adjusted
/// weights so early values are averages of the history seen so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EMA {
    span: usize,
}

impl EMA {
    pub fn new(span: usize) -> Self {
        Self { span }
    }

    pub fn span(&self) -> usize {
        self.span
    }

    pub fn name(&self) -> String {
        format!("{}d", self.span)
    }

    fn smoothing(&self) -> Result<Ewm> {
        Ewm::span(self.span)
    }

    /// EMA of the Close column on the input timestamps
    pub fn calculate(&self, data: &PriceTable) -> Result<Series> {
        let ewm = self.smoothing()?;
        let close = data.close()?;
        debug!(span = self.span, len = close.len(), "computing EMA");

        Ok(Series::new(
            Some(self.name()),
            SeriesIndex::Timestamps(data.index().to_vec()),
            ewm.mean(close),
        ))
    }

    /// Dates, Close and the EMA column, renumbered from zero
    pub fn calculate_table(&self, data: &PriceTable) -> Result<IndicatorTable> {
        let trend = self.calculate(data)?;
        let close = data.close()?;

        Ok(IndicatorTable::new(SeriesIndex::Positional(data.len()))
            .with_column(DATES, Column::Dates(data.dates()))
            .with_column(CLOSE, Column::Values(close.to_vec()))
            .with_column(self.name(), Column::Values(trend.values)))
    }

    /// Apply the same smoothing to an already derived series (e.g. MACD).
    /// The index and name of the input are kept.
    pub fn smooth(&self, series: &Series) -> Result<Series> {
        let ewm = self.smoothing()?;
        debug!(span = self.span, len = series.len(), "smoothing derived series");

        Ok(Series::new(
            series.name.clone(),
            series.index.clone(),
            ewm.mean(&series.values),
        ))
    }
}

impl Default for EMA {
    fn default() -> Self {
        Self::new(21)
    }
}
