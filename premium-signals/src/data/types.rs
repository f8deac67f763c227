//! Core data types for signal evaluation.
//!
//! These are the immutable snapshots handed over by the data provider on
//! every refresh: daily close series for underlyings and indices, and one
//! `OptionContract` per listed contract. Nothing here is mutated after
//! construction; a new refresh builds new values.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

/// Natural key of a contract. Nothing else survives across refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContractKey {
    pub symbol: String,
    pub expiration: NaiveDate,
    pub strike: Decimal,
    pub right: OptionType,
}

/// A single option quote from one data refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContract {
    /// Underlying symbol (e.g., "SQQQ")
    pub symbol: String,

    /// Option expiration date
    pub expiration: NaiveDate,

    /// Strike price
    pub strike: Decimal,

    /// Call or put
    pub right: OptionType,

    /// Bid price
    pub bid: Decimal,

    /// Ask price
    pub ask: Decimal,

    /// Last traded price
    pub last: Decimal,

    /// Implied volatility as a decimal (0.65 = 65%)
    pub implied_volatility: f64,

    /// Open interest
    pub open_interest: i64,

    /// Trading volume for the session
    pub volume: i64,
}

impl OptionContract {
    pub fn key(&self) -> ContractKey {
        ContractKey {
            symbol: self.symbol.clone(),
            expiration: self.expiration,
            strike: self.strike,
            right: self.right,
        }
    }

    /// Premium a seller would expect to collect.
    ///
    /// Uses the bid/ask midpoint when both sides are quoted, otherwise the
    /// last trade.
    pub fn mid(&self) -> Decimal {
        if self.bid > Decimal::ZERO && self.ask > Decimal::ZERO && self.ask >= self.bid {
            (self.bid + self.ask) / Decimal::TWO
        } else {
            self.last.max(Decimal::ZERO)
        }
    }

    /// Calendar days from `as_of` to expiration (negative once expired).
    pub fn dte(&self, as_of: NaiveDate) -> i64 {
        (self.expiration - as_of).num_days()
    }

    /// Time to expiry in years, floored at zero.
    pub fn time_to_expiry_years(&self, as_of: NaiveDate) -> f64 {
        self.dte(as_of).max(0) as f64 / 365.0
    }

    pub fn strike_f64(&self) -> f64 {
        self.strike.to_f64().unwrap_or(0.0)
    }

    pub fn mid_f64(&self) -> f64 {
        self.mid().to_f64().unwrap_or(0.0)
    }
}

/// Errors raised while building a price series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Timestamps not strictly increasing at index {index}: {previous} then {current}")]
    NonMonotonic {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("Invalid close {close} at index {index}")]
    InvalidClose { index: usize, close: f64 },
}

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered daily closes for one symbol.
///
/// Dates are strictly increasing and closes are positive and finite; both
/// are checked once at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for (index, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(SeriesError::InvalidClose {
                    index,
                    close: point.close,
                });
            }
            if index > 0 && points[index - 1].date >= point.date {
                return Err(SeriesError::NonMonotonic {
                    index,
                    previous: points[index - 1].date,
                    current: point.date,
                });
            }
        }
        Ok(Self { points })
    }

    /// Build a series of consecutive calendar days starting at `start`.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self, SeriesError> {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close,
            })
            .collect();
        Self::new(points)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl<'de> Deserialize<'de> for PriceSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<PricePoint>::deserialize(deserializer)?;
        Self::new(points).map_err(serde::de::Error::custom)
    }
}
