//! Signal engine configuration.
//!
//! Every threshold the engine reads lives in one immutable `SignalConfig`.
//! It is loaded once at startup from TOML, validated, and then passed by
//! reference into every component. Every threshold must be present and
//! unknown keys are rejected; only the indicator windows and the ETF
//! universe have defaults. Inconsistent values are rejected at load time.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::data::OptionType;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Signal engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalConfig {
    /// VIX band edges `[t1, t2]`: below t1 green, below t2 yellow, else red.
    pub vix_bands: [f64; 2],

    /// Preferred delta band for short calls.
    pub delta_band_call: [f64; 2],
    /// Outer call band; outside it a contract is red.
    pub delta_band_call_hard: [f64; 2],
    /// Preferred delta band for short puts.
    pub delta_band_put: [f64; 2],
    /// Outer put band; outside it a contract is red.
    pub delta_band_put_hard: [f64; 2],

    /// Minimum open interest.
    pub min_oi: i64,
    /// Minimum session volume.
    pub min_volume: i64,

    /// Annualized return target (percent).
    pub return_target: f64,
    /// Annualized return below which a contract is red (percent).
    pub return_floor: f64,

    /// RSI level treated as overbought.
    pub rsi_overbought: f64,
    /// RSI level treated as oversold.
    pub rsi_oversold: f64,
    /// Lower edge of the neutral RSI zone.
    pub rsi_neutral_low: f64,
    /// Upper edge of the neutral RSI zone.
    pub rsi_neutral_high: f64,

    /// Short, medium and long SMA windows.
    #[serde(default = "default_sma_windows")]
    pub sma_windows: [usize; 3],
    /// RSI look-back.
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,

    /// Continuously compounded risk-free rate.
    pub risk_free_rate: f64,

    /// ETFs under evaluation.
    #[serde(default = "default_etfs")]
    pub etfs: Vec<String>,
    /// ETF -> index whose technicals govern it.
    #[serde(default = "default_index_proxies")]
    pub index_proxies: BTreeMap<String, String>,
    /// Target DTEs used to pick expirations.
    #[serde(default = "default_expiration_targets")]
    pub expiration_targets_dte: Vec<i64>,
}

fn default_sma_windows() -> [usize; 3] {
    [20, 50, 100]
}

fn default_rsi_window() -> usize {
    14
}

fn default_etfs() -> Vec<String> {
    ["SPXS", "SQQQ", "SH", "SDS"].iter().map(|s| s.to_string()).collect()
}

fn default_index_proxies() -> BTreeMap<String, String> {
    [
        ("SPXS", "^GSPC"),
        ("SQQQ", "^IXIC"),
        ("SH", "^GSPC"),
        ("SDS", "^GSPC"),
    ]
    .into_iter()
    .map(|(etf, index)| (etf.to_string(), index.to_string()))
    .collect()
}

fn default_expiration_targets() -> Vec<i64> {
    vec![7, 14]
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            vix_bands: [15.0, 25.0],
            delta_band_call: [0.16, 0.30],
            delta_band_call_hard: [0.10, 0.50],
            delta_band_put: [-0.30, -0.16],
            delta_band_put_hard: [-0.50, -0.10],
            min_oi: 200,
            min_volume: 20,
            return_target: 30.0,
            return_floor: 20.0,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            rsi_neutral_low: 40.0,
            rsi_neutral_high: 60.0,
            sma_windows: default_sma_windows(),
            rsi_window: default_rsi_window(),
            risk_free_rate: 0.05,
            etfs: default_etfs(),
            index_proxies: default_index_proxies(),
            expiration_targets_dte: default_expiration_targets(),
        }
    }
}

impl SignalConfig {
    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded signal config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        debug!(?config, "Signal config validated");
        Ok(config)
    }

    /// Reject inconsistent thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [t1, t2] = self.vix_bands;
        if !t1.is_finite() || !t2.is_finite() || t1 >= t2 {
            return Err(invalid("vix_bands", format!("need finite t1 < t2, got [{}, {}]", t1, t2)));
        }

        check_band("delta_band_call", self.delta_band_call, 0.0, 1.0)?;
        check_band("delta_band_call_hard", self.delta_band_call_hard, 0.0, 1.0)?;
        check_band("delta_band_put", self.delta_band_put, -1.0, 0.0)?;
        check_band("delta_band_put_hard", self.delta_band_put_hard, -1.0, 0.0)?;
        check_contains("delta_band_call_hard", self.delta_band_call_hard, self.delta_band_call)?;
        check_contains("delta_band_put_hard", self.delta_band_put_hard, self.delta_band_put)?;

        if self.min_oi < 0 {
            return Err(invalid("min_oi", "must be non-negative"));
        }
        if self.min_volume < 0 {
            return Err(invalid("min_volume", "must be non-negative"));
        }

        if !self.return_target.is_finite() {
            return Err(invalid("return_target", "must be finite"));
        }
        if !self.return_floor.is_finite() {
            return Err(invalid("return_floor", "must be finite"));
        }
        if self.return_floor < 0.0 || self.return_floor > self.return_target {
            return Err(invalid(
                "return_floor",
                format!(
                    "need 0 <= return_floor <= return_target, got {} and {}",
                    self.return_floor, self.return_target
                ),
            ));
        }

        let rsi_levels = [
            ("rsi_oversold", self.rsi_oversold),
            ("rsi_neutral_low", self.rsi_neutral_low),
            ("rsi_neutral_high", self.rsi_neutral_high),
            ("rsi_overbought", self.rsi_overbought),
        ];
        if let Some((field, value)) = rsi_levels
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < 0.0 || *v > 100.0)
        {
            return Err(invalid(*field, format!("{} outside [0, 100]", value)));
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(invalid(
                "rsi_oversold",
                format!(
                    "oversold {} must be below overbought {}",
                    self.rsi_oversold, self.rsi_overbought
                ),
            ));
        }
        if !rsi_levels.windows(2).all(|w| w[0].1 <= w[1].1) {
            return Err(invalid(
                "rsi_neutral_low",
                "need oversold <= neutral_low <= neutral_high <= overbought",
            ));
        }

        if self.sma_windows.iter().any(|w| *w == 0) {
            return Err(invalid("sma_windows", "windows must be positive"));
        }
        if self.rsi_window == 0 {
            return Err(invalid("rsi_window", "window must be positive"));
        }

        if !self.risk_free_rate.is_finite() {
            return Err(invalid("risk_free_rate", "must be finite"));
        }

        if let Some(etf) = self.index_proxies.keys().find(|etf| !self.etfs.contains(etf)) {
            return Err(invalid("index_proxies", format!("{} is not listed in etfs", etf)));
        }

        Ok(())
    }

    /// Delta band for the side being sold.
    pub fn delta_band(&self, right: OptionType) -> [f64; 2] {
        match right {
            OptionType::Call => self.delta_band_call,
            OptionType::Put => self.delta_band_put,
        }
    }

    /// Outer delta band for the side being sold.
    pub fn delta_band_hard(&self, right: OptionType) -> [f64; 2] {
        match right {
            OptionType::Call => self.delta_band_call_hard,
            OptionType::Put => self.delta_band_put_hard,
        }
    }

    /// Index whose technicals govern this ETF, if any.
    pub fn index_for(&self, etf: &str) -> Option<&str> {
        self.index_proxies.get(etf).map(String::as_str)
    }
}

fn check_band(field: &'static str, band: [f64; 2], min: f64, max: f64) -> Result<(), ConfigError> {
    let [lo, hi] = band;
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(invalid(field, format!("need finite lo <= hi, got [{}, {}]", lo, hi)));
    }
    if lo < min || hi > max {
        return Err(invalid(field, format!("band [{}, {}] outside [{}, {}]", lo, hi, min, max)));
    }
    Ok(())
}

fn check_contains(field: &'static str, outer: [f64; 2], inner: [f64; 2]) -> Result<(), ConfigError> {
    if outer[0] > inner[0] || outer[1] < inner[1] {
        return Err(invalid(
            field,
            format!("[{}, {}] must contain [{}, {}]", outer[0], outer[1], inner[0], inner[1]),
        ));
    }
    Ok(())
}
