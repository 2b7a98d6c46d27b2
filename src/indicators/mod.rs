// Technical indicators module
// Pure calculation functions over a price table; nothing here keeps state

pub mod crossover;
pub mod macd;
pub mod moving_averages;
pub mod rsi;
pub mod smoothing;

pub use crossover::{classify, MovingAverageCrossover, CROSSOVER_THRESHOLD};
pub use macd::{MACDSignalLine, MACD};
pub use moving_averages::{EMA, SMA};
pub use rsi::RSI;
pub use smoothing::Ewm;
