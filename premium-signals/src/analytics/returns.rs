//! Short-premium return and payoff analytics.
//!
//! - Annualized return: (premium / underlying) * (365 / DTE) * 100
//! - IV rank within a 52-week range
//! - Expiry payoff of a short option over +/-30% of spot
//! - Expiration picking against a target DTE

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::data::OptionType;
use crate::pricing::intrinsic_value;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Annualized return of a short option, in percent, rounded to 2 places.
///
/// Capital at risk is the underlying price. Any non-positive input
/// yields 0.0 rather than an error, so a dead quote simply scores badly.
pub fn annualized_return(premium: f64, underlying_price: f64, dte: i64) -> f64 {
    if !(premium > 0.0) || !(underlying_price > 0.0) || dte <= 0 {
        return 0.0;
    }
    round_to((premium / underlying_price) * (365.0 / dte as f64) * 100.0, 2)
}

/// IV rank as a percentage of the 52-week range, rounded to 1 place.
pub fn iv_rank(current_iv: f64, iv_52w_low: f64, iv_52w_high: f64) -> f64 {
    if iv_52w_high <= iv_52w_low || iv_52w_high == 0.0 {
        return 0.0;
    }
    round_to((current_iv - iv_52w_low) / (iv_52w_high - iv_52w_low) * 100.0, 1)
}

/// One row of an expiry payoff table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoffPoint {
    pub underlying_at_expiry: f64,
    pub pnl: f64,
}

/// P/L at expiration for a short option, per share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffTable {
    pub points: Vec<PayoffPoint>,
    pub breakeven: f64,
}

impl PayoffTable {
    /// Largest P/L in the table (the premium once the option expires worthless).
    pub fn max_profit(&self) -> Option<f64> {
        self.points.iter().map(|p| p.pnl).reduce(f64::max)
    }
}

/// Expiry payoff for a short option, sampled evenly over `[0.7, 1.3] * spot`.
pub fn payoff_table(
    right: OptionType,
    strike: f64,
    premium: f64,
    underlying_price: f64,
    num_points: usize,
) -> PayoffTable {
    let low = underlying_price * 0.70;
    let high = underlying_price * 1.30;
    let step = if num_points > 1 {
        (high - low) / (num_points - 1) as f64
    } else {
        0.0
    };

    let points = (0..num_points)
        .map(|i| {
            let price = low + step * i as f64;
            PayoffPoint {
                underlying_at_expiry: round_to(price, 2),
                pnl: round_to(premium - intrinsic_value(price, strike, right), 2),
            }
        })
        .collect();

    let breakeven = match right {
        OptionType::Call => strike + premium,
        OptionType::Put => strike - premium,
    };

    PayoffTable {
        points,
        breakeven: round_to(breakeven, 2),
    }
}

/// Future expiration closest to `as_of + target_dte`.
///
/// Expirations on or before `as_of` are skipped. Ties go to the first
/// listed date.
pub fn nearest_expiration(
    expirations: &[NaiveDate],
    as_of: NaiveDate,
    target_dte: i64,
) -> Option<NaiveDate> {
    let target = as_of + Duration::days(target_dte);
    expirations
        .iter()
        .copied()
        .filter(|e| *e > as_of)
        .min_by_key(|e| (*e - target).num_days().abs())
}
