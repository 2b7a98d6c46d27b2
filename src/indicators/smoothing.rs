use crate::error::{IndicatorError, Result};

pub(crate) fn require_nonzero(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(IndicatorError::invalid_parameter(name, "must be at least 1"));
    }
    Ok(())
}

/// Trailing arithmetic mean over `window` values.
/// Returns a vector of the same length as input; the first (window - 1)
/// values, and any window containing a NaN, are NaN.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];

    if window == 0 || values.len() < window {
        return result;
    }

    for i in (window - 1)..values.len() {
        let window_start = i + 1 - window;
        let sum: f64 = values[window_start..=i].iter().sum();
        result[i] = sum / window as f64;
    }

    result
}

/// Exponentially weighted mean.
///
/// With `adjust` the value at t is sum((1-a)^k * x[t-k]) / sum((1-a)^k) over
/// the observations seen so far; without it the plain recursion
/// y[t] = a * x[t] + (1 - a) * y[t-1] seeded with the first observation.
/// NaN inputs are skipped but still decay the older weights. Nothing is
/// emitted before `min_periods` observations (at least one).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ewm {
    alpha: f64,
    adjust: bool,
    min_periods: usize,
}

impl Ewm {
    /// a = 2 / (span + 1)
    pub fn span(span: usize) -> Result<Self> {
        require_nonzero("span", span)?;
        Ok(Self {
            alpha: 2.0 / (span as f64 + 1.0),
            adjust: true,
            min_periods: 0,
        })
    }

    /// a = 1 / (1 + com)
    pub fn center_of_mass(com: f64) -> Result<Self> {
        if com.is_nan() || com < 0.0 {
            return Err(IndicatorError::invalid_parameter(
                "com",
                format!("must be >= 0, got {com}"),
            ));
        }
        Ok(Self {
            alpha: 1.0 / (1.0 + com),
            adjust: true,
            min_periods: 0,
        })
    }

    pub fn adjust(mut self, adjust: bool) -> Self {
        self.adjust = adjust;
        self
    }

    pub fn min_periods(mut self, min_periods: usize) -> Self {
        self.min_periods = min_periods;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn mean(&self, values: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; values.len()];
        let Some(&first) = values.first() else {
            return result;
        };

        let min_periods = self.min_periods.max(1);
        let new_wt = if self.adjust { 1.0 } else { self.alpha };
        let decay = 1.0 - self.alpha;

        let mut weighted = first;
        let mut nobs = usize::from(!first.is_nan());
        let mut old_wt = 1.0;
        if nobs >= min_periods {
            result[0] = weighted;
        }

        for (i, &cur) in values.iter().enumerate().skip(1) {
            let is_obs = !cur.is_nan();
            nobs += usize::from(is_obs);

            if !weighted.is_nan() {
                old_wt *= decay;
                if is_obs {
                    if weighted != cur {
                        weighted = (old_wt * weighted + new_wt * cur) / (old_wt + new_wt);
                    }
                    if self.adjust {
                        old_wt += new_wt;
                    } else {
                        old_wt = 1.0;
                    }
                }
            } else if is_obs {
                weighted = cur;
            }

            if nobs >= min_periods {
                result[i] = weighted;
            }
        }

        result
    }
}
