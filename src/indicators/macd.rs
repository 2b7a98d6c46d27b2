use tracing::debug;

use super::moving_averages::EMA;
use crate::error::Result;
use crate::models::{Column, IndicatorTable, PriceTable, Series, SeriesIndex, CLOSE, DATES};

pub const MACD_COLUMN: &str = "MACD";
pub const SIGNAL_LINE_COLUMN: &str = "Signal Line";

/// Moving Average Convergence Divergence
///
/// Computed as EMA(slow) - EMA(fast), i.e. the slow (upper) average minus the
/// fast (lower) one. This is the reverse of the more common fast - slow
/// convention and is kept so values line up with existing reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MACD {
    slow_span: usize,
    fast_span: usize,
}

impl MACD {
    pub fn new(slow_span: usize, fast_span: usize) -> Self {
        Self {
            slow_span,
            fast_span,
        }
    }

    pub fn slow_span(&self) -> usize {
        self.slow_span
    }

    pub fn fast_span(&self) -> usize {
        self.fast_span
    }

    /// Raw MACD series on the input timestamps
    pub fn calculate(&self, data: &PriceTable) -> Result<Series> {
        debug!(
            slow_span = self.slow_span,
            fast_span = self.fast_span,
            len = data.len(),
            "computing MACD"
        );
        let slow = EMA::new(self.slow_span).calculate(data)?;
        let fast = EMA::new(self.fast_span).calculate(data)?;
        Ok(slow.minus(&fast, Some(MACD_COLUMN.to_string())))
    }

    /// Dates, Close and MACD, renumbered from zero
    pub fn calculate_table(&self, data: &PriceTable) -> Result<IndicatorTable> {
        let macd = self.calculate(data)?;
        let close = data.close()?;

        Ok(IndicatorTable::new(SeriesIndex::Positional(data.len()))
            .with_column(DATES, Column::Dates(data.dates()))
            .with_column(CLOSE, Column::Values(close.to_vec()))
            .with_column(MACD_COLUMN, Column::Values(macd.values)))
    }
}

impl Default for MACD {
    fn default() -> Self {
        Self::new(26, 12)
    }
}

/// MACD signal line: MACD minus an EMA of the MACD itself.
///
/// A positive signal line reads as bullish, a negative one as bearish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MACDSignalLine {
    macd: MACD,
    signal_span: usize,
}

impl MACDSignalLine {
    pub fn new(macd: MACD, signal_span: usize) -> Self {
        Self { macd, signal_span }
    }

    pub fn signal_span(&self) -> usize {
        self.signal_span
    }

    /// Name of the smoothed MACD column, e.g. "9d EMA"
    pub fn ema_column(&self) -> String {
        format!("{}d EMA", self.signal_span)
    }

    /// Dates, Close, MACD, the EMA of MACD and the signal line, renumbered
    /// from zero
    pub fn calculate(&self, data: &PriceTable) -> Result<IndicatorTable> {
        let close = data.close()?;
        let macd = self.macd.calculate(data)?;
        let macd_ema = EMA::new(self.signal_span).smooth(&macd)?;
        let signal_line = macd.minus(&macd_ema, Some(SIGNAL_LINE_COLUMN.to_string()));
        debug!(
            signal_span = self.signal_span,
            len = data.len(),
            "computed MACD signal line"
        );

        Ok(IndicatorTable::new(SeriesIndex::Positional(data.len()))
            .with_column(DATES, Column::Dates(data.dates()))
            .with_column(CLOSE, Column::Values(close.to_vec()))
            .with_column(MACD_COLUMN, Column::Values(macd.values))
            .with_column(self.ema_column(), Column::Values(macd_ema.values))
            .with_column(SIGNAL_LINE_COLUMN, Column::Values(signal_line.values)))
    }
}

impl Default for MACDSignalLine {
    fn default() -> Self {
        Self::new(MACD::default(), 9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndicatorError;
    use crate::indicators::test_support::{
        sample_closes, table_from_closes, table_without_close,
    };

    #[test]
    fn test_macd_is_slow_minus_fast() {
        let table = table_from_closes(&sample_closes());
        let macd = MACD::default().calculate(&table).unwrap();
        let slow = EMA::new(26).calculate(&table).unwrap();
        let fast = EMA::new(12).calculate(&table).unwrap();

        assert_eq!(macd.len(), table.len());
        assert_eq!(macd.name(), Some("MACD"));
        for i in 0..macd.len() {
            let expected = slow.values[i] - fast.values[i];
            assert!((macd.values[i] - expected).abs() < 1e-9, "index {}", i);
        }
    }

    #[test]
    fn test_macd_sign_on_rising_prices() {
        // The fast EMA leads a rising series, so slow - fast goes negative
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let macd = MACD::default().calculate(&table_from_closes(&prices)).unwrap();

        assert_eq!(macd.values[0], 0.0);
        assert!(macd.values[39] < 0.0);
    }

    #[test]
    fn test_macd_table() {
        let table = table_from_closes(&sample_closes());
        let result = MACD::default().calculate_table(&table).unwrap();
        let raw = MACD::default().calculate(&table).unwrap();

        assert_eq!(result.index, SeriesIndex::Positional(table.len()));
        assert_eq!(result.column_names(), vec!["Dates", "Close", "MACD"]);
        assert_eq!(result.values(MACD_COLUMN).unwrap(), raw.values());
    }

    #[test]
    fn test_signal_line_is_macd_minus_its_ema() {
        let table = table_from_closes(&sample_closes());
        let result = MACDSignalLine::default().calculate(&table).unwrap();

        assert_eq!(
            result.column_names(),
            vec!["Dates", "Close", "MACD", "9d EMA", "Signal Line"]
        );

        let macd = result.values(MACD_COLUMN).unwrap();
        let ema = result.values("9d EMA").unwrap();
        let signal = result.values(SIGNAL_LINE_COLUMN).unwrap();
        for i in 0..table.len() {
            assert!((signal[i] - (macd[i] - ema[i])).abs() < 1e-12);
        }
    }

    #[test]
    fn test_signal_line_ema_is_smoothed_macd() {
        let table = table_from_closes(&sample_closes());
        let result = MACDSignalLine::default().calculate(&table).unwrap();
        let macd = MACD::default().calculate(&table).unwrap();
        let expected = EMA::new(9).smooth(&macd).unwrap();

        assert_eq!(result.values("9d EMA").unwrap(), expected.values());
    }

    #[test]
    fn test_missing_close() {
        let table = table_without_close();
        assert!(matches!(
            MACD::default().calculate(&table),
            Err(IndicatorError::MissingColumn(_))
        ));
        assert!(matches!(
            MACD::default().calculate_table(&table),
            Err(IndicatorError::MissingColumn(_))
        ));
        assert!(matches!(
            MACDSignalLine::default().calculate(&table),
            Err(IndicatorError::MissingColumn(c)) if c == CLOSE
        ));
    }

    #[test]
    fn test_empty_input() {
        let table = table_from_closes(&[]);
        assert!(MACD::default().calculate(&table).unwrap().is_empty());
        assert!(MACD::default().calculate_table(&table).unwrap().is_empty());
        assert!(MACDSignalLine::default().calculate(&table).unwrap().is_empty());
    }

    #[test]
    fn test_zero_span_is_rejected() {
        let table = table_from_closes(&[1.0, 2.0]);
        assert!(MACD::new(0, 12).calculate(&table).is_err());
        assert!(MACDSignalLine::new(MACD::default(), 0).calculate(&table).is_err());
    }
}
