//! Relative volume (RVOL).
//!
//! rvol[t] = volume[t] / mean(volume[t-period+1 ..= t])
//!
//! The trailing mean includes the current bar. A zero mean volume leaves the
//! value undefined (NaN) rather than infinite.
//! Lookback: period - 1.

use super::{trailing_mean, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct RelativeVolume {
    period: usize,
    name: String,
}

impl RelativeVolume {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RVOL period must be >= 1");
        Self {
            period,
            name: format!("rvol_{period}"),
        }
    }
}

impl Indicator for RelativeVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        trailing_mean(&volumes, self.period)
            .into_iter()
            .zip(&volumes)
            .map(|(mean, &volume)| {
                if mean.is_finite() && mean > 0.0 {
                    volume / mean
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}
