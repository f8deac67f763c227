//! Options analytics module.
//!
//! Provides:
//! - Annualized return on underlying capital for short premium
//! - IV rank against a 52-week range
//! - Expiry payoff tables and breakeven
//! - Expiration selection by target DTE

pub mod returns;

pub use returns::{
    annualized_return, iv_rank, nearest_expiration, payoff_table, PayoffPoint, PayoffTable,
};
