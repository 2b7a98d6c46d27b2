// Technical indicators over time-indexed price tables
// Moving averages, MACD and its signal line, two RSI variants and a
// moving-average crossover signal, each a pure function of a PriceTable

pub mod error;
pub mod indicators;
pub mod models;
pub mod request;
pub mod settings;

pub use error::{IndicatorError, Result};
pub use indicators::{
    classify, Ewm, MACDSignalLine, MovingAverageCrossover, CROSSOVER_THRESHOLD, EMA, MACD, RSI,
    SMA,
};
pub use models::{Bar, Column, IndicatorTable, PriceTable, Series, SeriesIndex, Signal};
pub use request::{evaluate, parse_request, IndicatorKind, IndicatorRequest, IndicatorResponse};
pub use settings::IndicatorSettings;
