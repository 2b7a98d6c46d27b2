use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{IndicatorError, Result};

pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";
pub const VWAP: &str = "VWAP";
pub const DATES: &str = "Dates";

/// One OHLCV row as delivered by a data loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub vwap: Option<f64>,
}

/// Columnar price table indexed by strictly increasing timestamps.
///
/// Indicators only ever borrow the table; every column has exactly one value
/// per timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct PriceTable {
    index: Vec<DateTime<Utc>>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl PriceTable {
    pub fn new<I, S>(index: Vec<DateTime<Utc>>, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        if let Some(pos) = index.windows(2).position(|w| w[1] <= w[0]) {
            return Err(IndicatorError::UnorderedIndex(pos + 1));
        }

        let mut map = BTreeMap::new();
        for (name, values) in columns {
            let name = name.into();
            if values.len() != index.len() {
                return Err(IndicatorError::LengthMismatch {
                    column: name,
                    expected: index.len(),
                    actual: values.len(),
                });
            }
            map.insert(name, values);
        }

        Ok(Self {
            index,
            columns: map,
        })
    }

    /// Build an OHLCV table from rows. VWAP is only included when every bar
    /// carries one.
    pub fn from_bars(bars: &[Bar]) -> Result<Self> {
        let index = bars.iter().map(|b| b.timestamp).collect();
        let mut columns: Vec<(&str, Vec<f64>)> = vec![
            (OPEN, bars.iter().map(|b| b.open).collect()),
            (HIGH, bars.iter().map(|b| b.high).collect()),
            (LOW, bars.iter().map(|b| b.low).collect()),
            (CLOSE, bars.iter().map(|b| b.close).collect()),
            (VOLUME, bars.iter().map(|b| b.volume).collect()),
        ];

        let vwap: Option<Vec<f64>> = bars.iter().map(|b| b.vwap).collect();
        if let Some(vwap) = vwap {
            if !bars.is_empty() {
                columns.push((VWAP, vwap));
            }
        }

        Self::new(index, columns)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| IndicatorError::missing_column(name))
    }

    pub fn close(&self) -> Result<&[f64]> {
        self.column(CLOSE)
    }

    /// Calendar date (UTC) of every timestamp
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.index.iter().map(|ts| ts.date_naive()).collect()
    }

    /// Add a cumulative VWAP column derived from High, Low, Close and Volume.
    ///
    /// VWAP_t = sum(typical_i * volume_i) / sum(volume_i) over i <= t, with
    /// typical = (high + low + close) / 3. Zero cumulative volume yields NaN.
    pub fn with_vwap(mut self) -> Result<Self> {
        let high = self.column(HIGH)?;
        let low = self.column(LOW)?;
        let close = self.column(CLOSE)?;
        let volume = self.column(VOLUME)?;

        let mut pv = 0.0;
        let mut vol = 0.0;
        let vwap: Vec<f64> = (0..self.len())
            .map(|i| {
                let typical = (high[i] + low[i] + close[i]) / 3.0;
                pv += typical * volume[i];
                vol += volume[i];
                if vol == 0.0 {
                    f64::NAN
                } else {
                    pv / vol
                }
            })
            .collect();

        self.columns.insert(VWAP.to_string(), vwap);
        Ok(self)
    }
}

/// Axis of a derived series or table.
///
/// Some outputs keep the input timestamps, others are renumbered from zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum SeriesIndex {
    Timestamps(Vec<DateTime<Utc>>),
    Positional(usize),
}

impl SeriesIndex {
    pub fn len(&self) -> usize {
        match self {
            SeriesIndex::Timestamps(ts) => ts.len(),
            SeriesIndex::Positional(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A derived series. Undefined entries (warm-up, 0/0) are NaN.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: Option<String>,
    pub index: SeriesIndex,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: Option<String>, index: SeriesIndex, values: Vec<f64>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self {
            name,
            index,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Elementwise `self - other` on a shared axis, keeping this series' index.
    pub(crate) fn minus(&self, other: &Series, name: Option<String>) -> Series {
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a - b)
            .collect();
        Series::new(name, self.index.clone(), values)
    }

    /// NaN becomes `None`, for JSON presentation
    pub fn to_options(&self) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|v| if v.is_nan() { None } else { Some(*v) })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Hold => "hold",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Column {
    Dates(Vec<NaiveDate>),
    Values(Vec<f64>),
    Signals(Vec<Signal>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Dates(v) => v.len(),
            Column::Values(v) => v.len(),
            Column::Signals(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Small presentation table: named columns in insertion order over one axis.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorTable {
    pub index: SeriesIndex,
    columns: Vec<(String, Column)>,
}

impl IndicatorTable {
    pub fn new(index: SeriesIndex) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        debug_assert_eq!(column.len(), self.index.len());
        self.columns.push((name.into(), column));
        self
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| IndicatorError::missing_column(name))
    }

    pub fn values(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Values(v) => Ok(v),
            _ => Err(IndicatorError::missing_column(name)),
        }
    }

    pub fn dates(&self, name: &str) -> Result<&[NaiveDate]> {
        match self.column(name)? {
            Column::Dates(v) => Ok(v),
            _ => Err(IndicatorError::missing_column(name)),
        }
    }

    pub fn signals(&self, name: &str) -> Result<&[Signal]> {
        match self.column(name)? {
            Column::Signals(v) => Ok(v),
            _ => Err(IndicatorError::missing_column(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 6, 10, 14, 30, 0).unwrap() + Duration::days(i)
    }

    fn bar(i: i64, close: f64, volume: f64) -> Bar {
        Bar {
            timestamp: day(i),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
            vwap: None,
        }
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let result = PriceTable::new(vec![day(0), day(1)], [(CLOSE, vec![1.0])]);
        assert!(matches!(
            result,
            Err(IndicatorError::LengthMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_new_rejects_unordered_index() {
        let result = PriceTable::new(vec![day(1), day(1)], [(CLOSE, vec![1.0, 2.0])]);
        assert!(matches!(result, Err(IndicatorError::UnorderedIndex(1))));
    }

    #[test]
    fn test_missing_column() {
        let table = PriceTable::new(vec![day(0)], [(OPEN, vec![1.0])]).unwrap();
        assert!(matches!(table.close(), Err(IndicatorError::MissingColumn(c)) if c == "Close"));
    }

    #[test]
    fn test_from_bars_columns() {
        let bars = vec![bar(0, 10.0, 100.0), bar(1, 11.0, 50.0)];
        let table = PriceTable::from_bars(&bars).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.close().unwrap(), &[10.0, 11.0]);
        assert_eq!(table.column(VOLUME).unwrap(), &[100.0, 50.0]);
        // No bar carried a VWAP
        assert!(!table.has_column(VWAP));
    }

    #[test]
    fn test_from_bars_keeps_vwap_when_complete() {
        let mut bars = vec![bar(0, 10.0, 100.0), bar(1, 11.0, 50.0)];
        bars[0].vwap = Some(10.2);
        bars[1].vwap = Some(10.5);
        let table = PriceTable::from_bars(&bars).unwrap();
        assert_eq!(table.column(VWAP).unwrap(), &[10.2, 10.5]);
    }

    #[test]
    fn test_dates_truncate_timestamps() {
        let table = PriceTable::new(vec![day(0), day(1)], [(CLOSE, vec![1.0, 2.0])]).unwrap();
        let dates = table.dates();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2019, 6, 10).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2019, 6, 11).unwrap());
    }

    #[test]
    fn test_with_vwap_cumulative() {
        let bars = vec![bar(0, 10.0, 100.0), bar(1, 20.0, 300.0)];
        let table = PriceTable::from_bars(&bars).unwrap().with_vwap().unwrap();
        let vwap = table.column(VWAP).unwrap();

        // Typical price equals close here because high/low are symmetric
        assert!((vwap[0] - 10.0).abs() < 1e-12);
        assert!((vwap[1] - (10.0 * 100.0 + 20.0 * 300.0) / 400.0).abs() < 1e-12);
    }

    #[test]
    fn test_with_vwap_requires_volume() {
        let table = PriceTable::new(vec![day(0)], [(CLOSE, vec![1.0])]).unwrap();
        assert!(matches!(table.with_vwap(), Err(IndicatorError::MissingColumn(_))));
    }

    #[test]
    fn test_series_to_options() {
        let series = Series::new(
            None,
            SeriesIndex::Positional(3),
            vec![f64::NAN, 1.0, f64::INFINITY],
        );
        assert_eq!(series.to_options(), vec![None, Some(1.0), Some(f64::INFINITY)]);
    }

    #[test]
    fn test_table_typed_accessors() {
        let table = IndicatorTable::new(SeriesIndex::Positional(1))
            .with_column(CLOSE, Column::Values(vec![1.0]))
            .with_column("Signal", Column::Signals(vec![Signal::Hold]));

        assert_eq!(table.column_names(), vec!["Close", "Signal"]);
        assert_eq!(table.values(CLOSE).unwrap(), &[1.0]);
        assert_eq!(table.signals("Signal").unwrap(), &[Signal::Hold]);
        // Right name, wrong column type
        assert!(table.values("Signal").is_err());
        assert!(table.dates(DATES).is_err());
    }

    #[test]
    fn test_signal_labels() {
        assert_eq!(Signal::Buy.to_string(), "buy");
        assert_eq!(serde_json::to_string(&Signal::Sell).unwrap(), "\"sell\"");
    }
}
