//! Market regime classification module.
//!
//! - VIX regime: green/yellow/red from two configured band edges
//! - Technical regime: bullish/neutral/bearish from SMA trend and RSI,
//!   read per strategy side (short calls vs. cash-secured puts)

pub mod technical;
pub mod vix;

pub use technical::{classify_technical, StrategySide, TechnicalRegime};
pub use vix::{classify_vix, VixBands, VixRegime};
