use tracing::debug;

use super::smoothing::{require_nonzero, rolling_mean};
use crate::error::Result;
use crate::models::{Column, IndicatorTable, PriceTable, Series, SeriesIndex, Signal, CLOSE};

/// Difference between the short and long averages that separates buy from sell
pub const CROSSOVER_THRESHOLD: f64 = 5.0;
pub const SIGNAL_COLUMN: &str = "Signal";

/// Short/long SMA crossover classified into buy, sell or hold per row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverageCrossover {
    short_window: usize,
    long_window: usize,
}

impl MovingAverageCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        Self {
            short_window,
            long_window,
        }
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }

    /// e.g. "5d-21d"
    pub fn difference_name(&self) -> String {
        format!("{}d-{}d", self.short_window, self.long_window)
    }

    /// Short SMA minus long SMA, each rounded to cents first
    pub fn trend_difference(&self, data: &PriceTable) -> Result<Series> {
        require_nonzero("short_window", self.short_window)?;
        require_nonzero("long_window", self.long_window)?;
        let close = data.close()?;

        let short = rolling_mean(close, self.short_window);
        let long = rolling_mean(close, self.long_window);
        let values = short
            .iter()
            .zip(&long)
            .map(|(s, l)| round_cents(*s) - round_cents(*l))
            .collect();

        Ok(Series::new(
            Some(self.difference_name()),
            SeriesIndex::Timestamps(data.index().to_vec()),
            values,
        ))
    }

    /// Close and Signal on the input timestamps
    pub fn calculate(&self, data: &PriceTable) -> Result<IndicatorTable> {
        let difference = self.trend_difference(data)?;
        let close = data.close()?;
        let signals = classify(difference.values());
        debug!(
            short_window = self.short_window,
            long_window = self.long_window,
            buys = signals.iter().filter(|s| **s == Signal::Buy).count(),
            sells = signals.iter().filter(|s| **s == Signal::Sell).count(),
            "computed moving average crossover"
        );

        Ok(IndicatorTable::new(difference.index)
            .with_column(CLOSE, Column::Values(close.to_vec()))
            .with_column(SIGNAL_COLUMN, Column::Signals(signals)))
    }
}

impl Default for MovingAverageCrossover {
    fn default() -> Self {
        Self::new(5, 21)
    }
}

/// Label every difference in two passes: everything starts as hold, rows
/// above the threshold become buy, then rows below it become sell. A
/// difference equal to the threshold, or NaN, stays hold.
pub fn classify(difference: &[f64]) -> Vec<Signal> {
    let mut signals = vec![Signal::Hold; difference.len()];

    for (signal, diff) in signals.iter_mut().zip(difference) {
        if *diff > CROSSOVER_THRESHOLD {
            *signal = Signal::Buy;
        }
    }
    for (signal, diff) in signals.iter_mut().zip(difference) {
        if *diff < CROSSOVER_THRESHOLD {
            *signal = Signal::Sell;
        }
    }

    signals
}

/// Round to 2 decimals, ties to even
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndicatorError;
    use crate::indicators::test_support::{table_from_closes, table_without_close};

    #[test]
    fn test_classify_thresholds() {
        let signals = classify(&[f64::NAN, 0.0, 4.99, 5.0, 5.01, -12.0, 40.0]);
        assert_eq!(
            signals,
            vec![
                Signal::Hold,
                Signal::Sell,
                Signal::Sell,
                Signal::Hold,
                Signal::Buy,
                Signal::Sell,
                Signal::Buy,
            ]
        );
    }

    #[test]
    fn test_round_cents_ties_to_even() {
        assert_eq!(round_cents(0.125), 0.12);
        assert_eq!(round_cents(0.375), 0.38);
        assert_eq!(round_cents(2.0), 2.0);
        assert!(round_cents(f64::NAN).is_nan());
    }

    #[test]
    fn test_crossover_table() {
        let table = table_from_closes(&[10.0, 10.0, 10.0, 10.0, 30.0, 30.0]);
        let result = MovingAverageCrossover::new(2, 4).calculate(&table).unwrap();

        // short: _, 10, 10, 10, 20, 30   long: _, _, _, 10, 15, 20
        assert_eq!(result.index, SeriesIndex::Timestamps(table.index().to_vec()));
        assert_eq!(result.column_names(), vec!["Close", "Signal"]);
        assert_eq!(result.values(CLOSE).unwrap(), table.close().unwrap());
        assert_eq!(
            result.signals(SIGNAL_COLUMN).unwrap(),
            &[
                Signal::Hold,
                Signal::Hold,
                Signal::Hold,
                Signal::Sell,
                Signal::Hold,
                Signal::Buy,
            ]
        );
    }

    #[test]
    fn test_trend_difference_rounds_each_average() {
        // short(1) = close, long(2) = pairwise mean
        let table = table_from_closes(&[10.004, 10.0]);
        let diff = MovingAverageCrossover::new(1, 2)
            .trend_difference(&table)
            .unwrap();

        assert_eq!(diff.name(), Some("1d-2d"));
        assert!(diff.values[0].is_nan());
        // 10.00 - 10.00 after rounding, not 10.0 - 10.002
        assert_eq!(diff.values[1], 0.0);
    }

    #[test]
    fn test_default_warmup_is_hold() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + 3.0 * i as f64).collect();
        let result = MovingAverageCrossover::default()
            .calculate(&table_from_closes(&closes))
            .unwrap();
        let signals = result.signals(SIGNAL_COLUMN).unwrap();

        assert!(signals[..20].iter().all(|s| *s == Signal::Hold));
        // 3/day slope: short mean leads long mean by 3 * (21 - 5) / 2 = 24
        assert!(signals[20..].iter().all(|s| *s == Signal::Buy));
    }

    #[test]
    fn test_invalid_windows() {
        let table = table_from_closes(&[1.0]);
        assert!(matches!(
            MovingAverageCrossover::new(0, 21).calculate(&table),
            Err(IndicatorError::InvalidParameter { .. })
        ));
        assert!(MovingAverageCrossover::new(5, 0).calculate(&table).is_err());
    }

    #[test]
    fn test_missing_close() {
        assert!(matches!(
            MovingAverageCrossover::default().calculate(&table_without_close()),
            Err(IndicatorError::MissingColumn(c)) if c == CLOSE
        ));
    }

    #[test]
    fn test_empty_input() {
        let table = table_from_closes(&[]);
        let result = MovingAverageCrossover::default().calculate(&table).unwrap();
        assert!(result.is_empty());
        assert!(result.signals(SIGNAL_COLUMN).unwrap().is_empty());
    }
}
