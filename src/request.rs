use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{IndicatorError, Result};
use crate::indicators::crossover::SIGNAL_COLUMN;
use crate::indicators::macd::SIGNAL_LINE_COLUMN;
use crate::indicators::{EMA, RSI, SMA};
use crate::models::{PriceTable, Series, Signal, CLOSE};
use crate::settings::IndicatorSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Sma,
    Ema,
    Macd,
    SignalLine,
    Rsi,
    RsiXavier,
    Crossover,
}

impl IndicatorKind {
    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "sma" => Some(Self::Sma),
            "ema" => Some(Self::Ema),
            "macd" => Some(Self::Macd),
            "signal_line" => Some(Self::SignalLine),
            "rsi" | "rsi_timo" => Some(Self::Rsi),
            "rsi_xavier" => Some(Self::RsiXavier),
            "crossover" => Some(Self::Crossover),
            _ => None,
        }
    }

    fn takes_period(self) -> bool {
        matches!(self, Self::Sma | Self::Ema | Self::Rsi | Self::RsiXavier)
    }
}

/// One parsed entry of a request such as "sma_20"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorRequest {
    /// The token as written, used as the response key
    pub key: String,
    pub kind: IndicatorKind,
    pub period: Option<usize>,
}

/// Parse a comma-separated request: "sma_20,ema_12,macd,signal_line,rsi_14".
///
/// A trailing `_<number>` is the period. Unknown kinds, periods on kinds that
/// take none and periods outside the configured bounds are skipped.
pub fn parse_request(spec: &str, settings: &IndicatorSettings) -> Vec<IndicatorRequest> {
    let mut requests = Vec::new();

    for token in spec.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let (name, period) = match token.rsplit_once('_') {
            Some((name, suffix)) if suffix.chars().all(|c| c.is_ascii_digit()) => {
                match suffix.parse::<usize>() {
                    Ok(p) => (name, Some(p)),
                    Err(_) => {
                        warn!(token, "skipping indicator with unparsable period");
                        continue;
                    }
                }
            }
            _ => (token, None),
        };

        let Some(kind) = IndicatorKind::parse(name) else {
            warn!(token, "skipping unknown indicator");
            continue;
        };

        if let Some(p) = period {
            if !kind.takes_period() {
                warn!(token, "skipping indicator that takes no period");
                continue;
            }
            if !settings.accepts_period(p) {
                warn!(
                    token,
                    min = settings.min_period,
                    max = settings.max_period,
                    "skipping indicator with out-of-range period"
                );
                continue;
            }
        }

        requests.push(IndicatorRequest {
            key: token.to_string(),
            kind,
            period,
        });
    }

    requests
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorResponse {
    /// Unix seconds
    pub timestamps: Vec<i64>,
    pub prices: Vec<f64>,
    pub indicators: HashMap<String, Vec<Option<f64>>>,
    pub signals: HashMap<String, Vec<Signal>>,
}

/// Compute every indicator named in `spec` over `data`, aligned to its
/// timestamps.
///
/// Invalid settings or a missing Close column fail the whole request. A token
/// whose own parameters are rejected (for example `sma_0` when `min_period`
/// is 0) is skipped with a warning, like the tokens `parse_request` drops.
pub fn evaluate(
    data: &PriceTable,
    spec: &str,
    settings: &IndicatorSettings,
) -> Result<IndicatorResponse> {
    settings.validate()?;
    let prices = data.close()?.to_vec();
    let timestamps = data.index().iter().map(|ts| ts.timestamp()).collect();

    let mut indicators = HashMap::new();
    let mut signals = HashMap::new();

    for request in parse_request(spec, settings) {
        debug!(key = %request.key, "evaluating indicator");
        match evaluate_one(&request, data, settings) {
            Ok(Evaluated::Values(values)) => {
                indicators.insert(request.key, values);
            }
            Ok(Evaluated::Signals(values)) => {
                signals.insert(request.key, values);
            }
            Err(IndicatorError::InvalidParameter { name, reason }) => {
                warn!(
                    key = %request.key,
                    %name,
                    %reason,
                    "skipping indicator with invalid parameter"
                );
            }
            Err(err) => return Err(err),
        }
    }

    Ok(IndicatorResponse {
        timestamps,
        prices,
        indicators,
        signals,
    })
}

enum Evaluated {
    Values(Vec<Option<f64>>),
    Signals(Vec<Signal>),
}

fn evaluate_one(
    request: &IndicatorRequest,
    data: &PriceTable,
    settings: &IndicatorSettings,
) -> Result<Evaluated> {
    let values = match request.kind {
        IndicatorKind::Sma => {
            let sma = request.period.map(SMA::new).unwrap_or_else(|| settings.sma());
            sma.calculate(data)?.to_options()
        }
        IndicatorKind::Ema => {
            let ema = request.period.map(EMA::new).unwrap_or_else(|| settings.ema());
            ema.calculate(data)?.to_options()
        }
        IndicatorKind::Macd => settings.macd().calculate(data)?.to_options(),
        IndicatorKind::SignalLine => {
            let table = settings.signal_line().calculate(data)?;
            to_options(table.values(SIGNAL_LINE_COLUMN)?)
        }
        IndicatorKind::Rsi => {
            let rsi = request.period.map(RSI::new).unwrap_or_else(|| settings.rsi());
            rsi.timo(data, CLOSE)?.to_options()
        }
        IndicatorKind::RsiXavier => {
            let rsi = request.period.map(RSI::new).unwrap_or_else(|| settings.rsi());
            align_right(&rsi.xavier(data)?, data.len())
        }
        IndicatorKind::Crossover => {
            let table = settings.crossover().calculate(data)?;
            return Ok(Evaluated::Signals(table.signals(SIGNAL_COLUMN)?.to_vec()));
        }
    };

    Ok(Evaluated::Values(values))
}

fn to_options(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|v| if v.is_nan() { None } else { Some(*v) })
        .collect()
}

/// Left-pad a series that starts later than the price axis
fn align_right(series: &Series, len: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; len.saturating_sub(series.len())];
    values.extend(series.to_options());
    values
}
