//! Technical indicators module.
//!
//! SMA(20/50/100) and RSI(14) over daily closes, and the per-symbol
//! `UnderlyingState` built from them on each refresh.

pub mod technicals;

pub use technicals::{rsi, simple_moving_average, RsiLabel, UnderlyingState};
