//! Technical indicators over daily closes.
//!
//! - SMA: arithmetic mean of the last `window` closes
//! - RSI: Wilder smoothing (alpha = 1/window) of period-over-period gains
//!   and losses, seeded with the first change
//!
//! Both are pure functions of the slice they are given. Short history
//! yields `None`, never a fabricated zero.

use serde::{Deserialize, Serialize};

use crate::config::SignalConfig;
use crate::data::PriceSeries;

/// Simple moving average of the last `window` closes.
pub fn simple_moving_average(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window {
        return None;
    }
    let tail = &closes[closes.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// Relative Strength Index using Wilder smoothing.
///
/// Needs at least `window + 1` closes. A flat series reads 50; a series
/// with gains and no losses reads 100.
pub fn rsi(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window + 1 {
        return None;
    }

    let alpha = 1.0 / window as f64;
    let mut changes = closes.windows(2).map(|w| w[1] - w[0]);

    let first = changes.next()?;
    let mut avg_gain = first.max(0.0);
    let mut avg_loss = (-first).max(0.0);

    for change in changes {
        avg_gain = (1.0 - alpha) * avg_gain + alpha * change.max(0.0);
        avg_loss = (1.0 - alpha) * avg_loss + alpha * (-change).max(0.0);
    }

    if avg_loss == 0.0 {
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Display label for an RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiLabel {
    Overbought,
    Oversold,
    Neutral,
    Bullish,
    Bearish,
}

impl RsiLabel {
    pub fn classify(rsi: f64, config: &SignalConfig) -> Self {
        if rsi >= config.rsi_overbought {
            Self::Overbought
        } else if rsi <= config.rsi_oversold {
            Self::Oversold
        } else if rsi >= config.rsi_neutral_low && rsi <= config.rsi_neutral_high {
            Self::Neutral
        } else if rsi > config.rsi_neutral_high {
            Self::Bullish
        } else {
            Self::Bearish
        }
    }
}

/// Indicator state for one symbol at the end of its series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingState {
    pub symbol: String,
    /// Latest close.
    pub price: f64,
    /// Short, medium and long SMAs over `sma_windows` (20/50/100 by default).
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma100: Option<f64>,
    /// RSI over `rsi_window`.
    pub rsi14: Option<f64>,
}

impl UnderlyingState {
    /// Compute indicators with the configured windows.
    ///
    /// Returns `None` for an empty series.
    pub fn from_series(symbol: &str, series: &PriceSeries, config: &SignalConfig) -> Option<Self> {
        let closes = series.closes();
        let price = *closes.last()?;
        let [short, medium, long] = config.sma_windows;

        Some(Self {
            symbol: symbol.to_string(),
            price,
            sma20: simple_moving_average(&closes, short),
            sma50: simple_moving_average(&closes, medium),
            sma100: simple_moving_average(&closes, long),
            rsi14: rsi(&closes, config.rsi_window),
        })
    }

    pub fn rsi_label(&self, config: &SignalConfig) -> Option<RsiLabel> {
        self.rsi14.map(|r| RsiLabel::classify(r, config))
    }

    /// Price > SMA20 > SMA50 > SMA100. `None` without full history.
    pub fn is_strong_uptrend(&self) -> Option<bool> {
        let (s20, s50, s100) = (self.sma20?, self.sma50?, self.sma100?);
        Some(self.price > s20 && s20 > s50 && s50 > s100)
    }

    /// Price below both the medium and long averages.
    pub fn is_strong_downtrend(&self) -> Option<bool> {
        Some(self.price < self.sma50? && self.price < self.sma100?)
    }

    /// Price under the short and medium averages, or the short average
    /// crossed under the medium one.
    pub fn is_weakening(&self) -> Option<bool> {
        let (sma20, sma50) = (self.sma20?, self.sma50?);
        Some((self.price < sma20 && self.price < sma50) || sma20 < sma50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn ramp(n: usize, start: f64, slope: f64) -> Vec<f64> {
        (0..n).map(|i| start + slope * i as f64).collect()
    }

    #[test]
    fn test_sma_requires_window() {
        assert_eq!(simple_moving_average(&[1.0, 2.0], 3), None);
        assert_eq!(simple_moving_average(&[1.0, 2.0, 3.0], 0), None);
        assert_eq!(simple_moving_average(&[1.0, 2.0, 3.0], 3), Some(2.0));
    }

    #[test]
    fn test_sma_on_linear_ramp() {
        // Mean of the last w points of a + b*i equals the value at the
        // window's midpoint: a + b*(n-1) - b*(w-1)/2.
        let (a, b, n) = (50.0, 0.75, 120);
        let closes = ramp(n, a, b);
        for window in [5usize, 20, 50, 100] {
            let expected = a + b * (n - 1) as f64 - b * (window - 1) as f64 / 2.0;
            assert_relative_eq!(
                simple_moving_average(&closes, window).unwrap(),
                expected,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_rsi_requires_window_plus_one() {
        let closes = ramp(14, 10.0, 0.1);
        assert_eq!(rsi(&closes, 14), None);
        assert!(rsi(&ramp(15, 10.0, 0.1), 14).is_some());
    }

    #[test]
    fn test_rsi_flat_series_is_neutral() {
        let closes = vec![42.0; 15];
        assert_eq!(rsi(&closes, 14), Some(50.0));
    }

    #[test]
    fn test_rsi_only_gains_is_100() {
        assert_eq!(rsi(&ramp(30, 10.0, 0.5), 14), Some(100.0));
    }

    #[test]
    fn test_rsi_only_losses_is_0() {
        assert_eq!(rsi(&ramp(30, 100.0, -0.5), 14), Some(0.0));
    }

    #[test]
    fn test_rsi_wilder_smoothing() {
        // Changes: +1, -1, +1 with window 2 (alpha 0.5)
        // gain: 1 -> 0.5 -> 0.75 ; loss: 0 -> 0.5 -> 0.25 ; RS = 3
        let closes = [10.0, 11.0, 10.0, 11.0];
        assert_relative_eq!(rsi(&closes, 2).unwrap(), 75.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rsi_scale_invariant_not_shift_invariant() {
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let base = rsi(&closes, 14).unwrap();

        for k in [0.01, 0.5, 3.0, 250.0] {
            let scaled: Vec<f64> = closes.iter().map(|c| c * k).collect();
            assert_relative_eq!(rsi(&scaled, 14).unwrap(), base, epsilon = 1e-9);
        }

        // A constant offset leaves every change intact; a linear drift does not.
        let drifted: Vec<f64> = closes
            .iter()
            .enumerate()
            .map(|(i, c)| c + 0.2 * i as f64)
            .collect();
        assert!((rsi(&drifted, 14).unwrap() - base).abs() > 1.0);
    }

    #[test]
    fn test_rsi_label() {
        let config = SignalConfig::default();
        assert_eq!(RsiLabel::classify(75.0, &config), RsiLabel::Overbought);
        assert_eq!(RsiLabel::classify(70.0, &config), RsiLabel::Overbought);
        assert_eq!(RsiLabel::classify(25.0, &config), RsiLabel::Oversold);
        assert_eq!(RsiLabel::classify(50.0, &config), RsiLabel::Neutral);
        assert_eq!(RsiLabel::classify(65.0, &config), RsiLabel::Bullish);
        assert_eq!(RsiLabel::classify(35.0, &config), RsiLabel::Bearish);
    }

    #[test]
    fn test_underlying_state_absent_until_history() {
        let config = SignalConfig::default();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = PriceSeries::from_closes(start, &ramp(60, 100.0, 1.0)).unwrap();

        let state = UnderlyingState::from_series("^GSPC", &series, &config).unwrap();
        assert_eq!(state.price, 159.0);
        assert!(state.sma20.is_some());
        assert!(state.sma50.is_some());
        assert_eq!(state.sma100, None);
        assert_eq!(state.rsi14, Some(100.0));
        assert_eq!(state.is_strong_uptrend(), None);
        assert_eq!(state.is_weakening(), Some(false));
    }

    #[test]
    fn test_underlying_state_trend_flags() {
        let config = SignalConfig::default();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let up = PriceSeries::from_closes(start, &ramp(120, 100.0, 0.5)).unwrap();
        let state = UnderlyingState::from_series("^GSPC", &up, &config).unwrap();
        assert_eq!(state.is_strong_uptrend(), Some(true));
        assert_eq!(state.is_strong_downtrend(), Some(false));

        let down = PriceSeries::from_closes(start, &ramp(120, 200.0, -0.5)).unwrap();
        let state = UnderlyingState::from_series("^GSPC", &down, &config).unwrap();
        assert_eq!(state.is_strong_downtrend(), Some(true));
        assert_eq!(state.is_weakening(), Some(true));
    }

    #[test]
    fn test_uptrend_needs_stacked_averages() {
        let mut state = UnderlyingState {
            symbol: "^GSPC".to_string(),
            price: 100.0,
            sma20: Some(95.0),
            sma50: Some(98.0),
            sma100: Some(90.0),
            rsi14: Some(55.0),
        };
        // Price clears every average but SMA20 sits under SMA50
        assert_eq!(state.is_strong_uptrend(), Some(false));

        state.sma50 = Some(93.0);
        assert_eq!(state.is_strong_uptrend(), Some(true));
    }

    #[test]
    fn test_empty_series_has_no_state() {
        let config = SignalConfig::default();
        assert!(UnderlyingState::from_series("SH", &PriceSeries::default(), &config).is_none());
    }
}
