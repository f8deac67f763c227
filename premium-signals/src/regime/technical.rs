//! Technical regime classification.
//!
//! Fuses the price-vs-SMA trend with RSI into a directional label. Which
//! label is good news depends on what is being sold:
//! - Short calls want a stalling or falling market (bearish/neutral)
//! - Short puts want a rising market or a pullback in one (bullish/neutral)
//!
//! A strong uptrend is price > SMA20 > SMA50 > SMA100.
//!
//! Rules per side (neutral band and extremes come from config):
//! - CallSell: RSI >= overbought outside a strong uptrend, or a weakening
//!   trend with RSI >= neutral_high -> Bearish; a strong uptrend with
//!   RSI < neutral_high -> Bullish
//! - PutSell: RSI <= oversold outside a strong downtrend, or a strong
//!   uptrend with RSI <= neutral_low -> Bullish; a strong downtrend with
//!   RSI < neutral_low -> Bearish
//!
//! Anything else, including missing history, is Neutral.

use serde::{Deserialize, Serialize};

use crate::config::SignalConfig;
use crate::data::OptionType;
use crate::indicators::UnderlyingState;
use crate::rules::SignalColor;

/// Which premium-selling strategy a classification is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategySide {
    /// Short calls.
    CallSell,
    /// Cash-secured puts.
    PutSell,
}

impl StrategySide {
    /// The side a short position in this contract belongs to.
    pub fn for_right(right: OptionType) -> Self {
        match right {
            OptionType::Call => Self::CallSell,
            OptionType::Put => Self::PutSell,
        }
    }
}

/// Directional technical label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TechnicalRegime {
    Bullish,
    Neutral,
    Bearish,
}

impl TechnicalRegime {
    pub fn is_favorable(&self, side: StrategySide) -> bool {
        match side {
            StrategySide::CallSell => matches!(self, Self::Bearish | Self::Neutral),
            StrategySide::PutSell => matches!(self, Self::Bullish | Self::Neutral),
        }
    }

    /// Three-colour light for index display cards.
    pub fn index_signal(&self, side: StrategySide) -> SignalColor {
        match (side, self) {
            (_, Self::Neutral) => SignalColor::Yellow,
            (StrategySide::CallSell, Self::Bearish) | (StrategySide::PutSell, Self::Bullish) => {
                SignalColor::Green
            }
            _ => SignalColor::Red,
        }
    }
}

/// Classify the technical regime of `state` for the given strategy side.
pub fn classify_technical(
    state: &UnderlyingState,
    side: StrategySide,
    config: &SignalConfig,
) -> TechnicalRegime {
    let trend = (
        state.rsi14,
        state.is_strong_uptrend(),
        state.is_strong_downtrend(),
        state.is_weakening(),
    );
    let (Some(rsi), Some(uptrend), Some(downtrend), Some(weakening)) = trend else {
        return TechnicalRegime::Neutral;
    };

    match side {
        StrategySide::CallSell => {
            if (!uptrend && rsi >= config.rsi_overbought)
                || (weakening && rsi >= config.rsi_neutral_high)
            {
                TechnicalRegime::Bearish
            } else if uptrend && rsi < config.rsi_neutral_high {
                TechnicalRegime::Bullish
            } else {
                TechnicalRegime::Neutral
            }
        }
        StrategySide::PutSell => {
            if (!downtrend && rsi <= config.rsi_oversold)
                || (uptrend && rsi <= config.rsi_neutral_low)
            {
                TechnicalRegime::Bullish
            } else if downtrend && rsi < config.rsi_neutral_low {
                TechnicalRegime::Bearish
            } else {
                TechnicalRegime::Neutral
            }
        }
    }
}
