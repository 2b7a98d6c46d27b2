use serde::{Deserialize, Serialize};

use crate::error::{IndicatorError, Result};
use crate::indicators::{MACDSignalLine, MovingAverageCrossover, EMA, MACD, RSI, SMA};

/// Default indicator parameters, plus the period bounds accepted in requests.
///
/// Every field is optional in JSON; missing ones keep their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub sma_window: usize,
    pub ema_span: usize,
    pub macd_slow_span: usize,
    pub macd_fast_span: usize,
    /// Span of the EMA taken over MACD for the signal line
    pub signal_span: usize,
    pub rsi_period: usize,
    pub crossover_short: usize,
    pub crossover_long: usize,
    /// Smallest period a request may ask for. May be 0; a zero period is
    /// then rejected by the indicator itself.
    pub min_period: usize,
    /// Largest period a request may ask for
    pub max_period: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            sma_window: 21,
            ema_span: 21,
            macd_slow_span: 26,
            macd_fast_span: 12,
            signal_span: 9,
            rsi_period: 14,
            crossover_short: 5,
            crossover_long: 21,
            min_period: 2,
            max_period: 200,
        }
    }
}

impl IndicatorSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let spans = [
            ("sma_window", self.sma_window),
            ("ema_span", self.ema_span),
            ("macd_slow_span", self.macd_slow_span),
            ("macd_fast_span", self.macd_fast_span),
            ("signal_span", self.signal_span),
            ("rsi_period", self.rsi_period),
            ("crossover_short", self.crossover_short),
            ("crossover_long", self.crossover_long),
        ];
        for (name, value) in spans {
            if value == 0 {
                return Err(IndicatorError::invalid_parameter(name, "must be at least 1"));
            }
        }

        if self.min_period > self.max_period {
            return Err(IndicatorError::invalid_parameter(
                "min_period",
                format!(
                    "{} is greater than max_period {}",
                    self.min_period, self.max_period
                ),
            ));
        }

        Ok(())
    }

    pub fn accepts_period(&self, period: usize) -> bool {
        (self.min_period..=self.max_period).contains(&period)
    }

    pub fn sma(&self) -> SMA {
        SMA::new(self.sma_window)
    }

    pub fn ema(&self) -> EMA {
        EMA::new(self.ema_span)
    }

    pub fn macd(&self) -> MACD {
        MACD::new(self.macd_slow_span, self.macd_fast_span)
    }

    pub fn signal_line(&self) -> MACDSignalLine {
        MACDSignalLine::new(self.macd(), self.signal_span)
    }

    pub fn rsi(&self) -> RSI {
        RSI::new(self.rsi_period)
    }

    pub fn crossover(&self) -> MovingAverageCrossover {
        MovingAverageCrossover::new(self.crossover_short, self.crossover_long)
    }
}
