//! Option pricing module.
//!
//! Black-Scholes price and Greeks for the contracts under evaluation, plus
//! implied-volatility recovery for quotes that arrive without one.

pub mod black_scholes;

pub use black_scholes::{intrinsic_value, price_and_greeks, BlackScholes, Greeks, PricingError, Valuation};
