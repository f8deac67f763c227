//! Black-Scholes pricing and Greeks.
//!
//! Closed-form European pricing with continuous compounding and no dividend
//! yield (the inverse ETFs we evaluate are treated as non-paying).
//!
//! Conventions:
//! - Theta: value change per calendar day (annual derivative / 365)
//! - Vega: value change per 1 vol point (annual derivative / 100)
//! - Rho: value change per 1% rate move
//!
//! Degenerate inputs follow intrinsic rules instead of dividing by zero:
//! at expiry the price is intrinsic value and delta is 0 or +/-1; with zero
//! volatility the price is the discounted-strike intrinsic value.

use std::f64::consts::{PI, SQRT_2};

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;
use thiserror::Error;

use crate::data::OptionType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Greeks for one contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

/// Model output for one contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub theoretical_price: f64,
    pub greeks: Greeks,
}

/// Intrinsic value at expiry.
pub fn intrinsic_value(spot: f64, strike: f64, right: OptionType) -> f64 {
    match right {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    }
}

/// Price and Greeks at the given risk-free rate.
pub fn price_and_greeks(
    spot: f64,
    strike: f64,
    time_to_expiry_years: f64,
    risk_free_rate: f64,
    implied_vol: f64,
    right: OptionType,
) -> Result<Valuation, PricingError> {
    BlackScholes::new(risk_free_rate).price_and_greeks(
        spot,
        strike,
        time_to_expiry_years,
        implied_vol,
        right,
    )
}

/// Black-Scholes calculator for options pricing and Greeks.
#[derive(Debug, Clone, Copy)]
pub struct BlackScholes {
    /// Risk-free interest rate
    pub rate: f64,
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self {
            rate: 0.05, // 5% risk-free rate
        }
    }
}

impl BlackScholes {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    fn check_inputs(&self, spot: f64, strike: f64, time: f64, vol: f64) -> Result<(), PricingError> {
        if !spot.is_finite() || spot <= 0.0 {
            return Err(PricingError::InvalidInput(format!("spot must be positive, got {}", spot)));
        }
        if !strike.is_finite() || strike <= 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "strike must be positive, got {}",
                strike
            )));
        }
        if !time.is_finite() || time < 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "time to expiry must be non-negative, got {}",
                time
            )));
        }
        if !vol.is_finite() || vol < 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "implied volatility must be non-negative, got {}",
                vol
            )));
        }
        if !self.rate.is_finite() {
            return Err(PricingError::InvalidInput(format!(
                "risk-free rate must be finite, got {}",
                self.rate
            )));
        }
        Ok(())
    }

    /// Calculate d1 parameter.
    fn d1(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        let numerator = (spot / strike).ln() + (self.rate + 0.5 * vol * vol) * time;
        numerator / (vol * time.sqrt())
    }

    /// Calculate d2 parameter.
    fn d2(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        self.d1(spot, strike, time, vol) - vol * time.sqrt()
    }

    /// Standard normal CDF.
    fn norm_cdf(x: f64) -> f64 {
        0.5 * erfc(-x / SQRT_2)
    }

    /// Standard normal PDF.
    fn norm_pdf(x: f64) -> f64 {
        (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
    }

    /// Theoretical price and Greeks in one pass.
    pub fn price_and_greeks(
        &self,
        spot: f64,
        strike: f64,
        time: f64,
        vol: f64,
        opt_type: OptionType,
    ) -> Result<Valuation, PricingError> {
        self.check_inputs(spot, strike, time, vol)?;

        if time == 0.0 {
            return Ok(self.expiry_valuation(spot, strike, opt_type));
        }
        if vol == 0.0 {
            return Ok(self.zero_vol_valuation(spot, strike, time, opt_type));
        }

        let sqrt_t = time.sqrt();
        let d1 = self.d1(spot, strike, time, vol);
        let d2 = d1 - vol * sqrt_t;
        let discount_r = (-self.rate * time).exp();
        let pdf_d1 = Self::norm_pdf(d1);

        let gamma = pdf_d1 / (spot * vol * sqrt_t);
        let vega = spot * pdf_d1 * sqrt_t / 100.0;
        let decay = -spot * pdf_d1 * vol / (2.0 * sqrt_t);

        let (price, delta, theta_annual, rho) = match opt_type {
            OptionType::Call => (
                spot * Self::norm_cdf(d1) - strike * discount_r * Self::norm_cdf(d2),
                Self::norm_cdf(d1),
                decay - self.rate * strike * discount_r * Self::norm_cdf(d2),
                strike * time * discount_r * Self::norm_cdf(d2) / 100.0,
            ),
            OptionType::Put => (
                strike * discount_r * Self::norm_cdf(-d2) - spot * Self::norm_cdf(-d1),
                Self::norm_cdf(d1) - 1.0,
                decay + self.rate * strike * discount_r * Self::norm_cdf(-d2),
                -strike * time * discount_r * Self::norm_cdf(-d2) / 100.0,
            ),
        };

        Ok(Valuation {
            theoretical_price: price.max(0.0),
            greeks: Greeks {
                delta,
                gamma,
                theta: theta_annual / 365.0,
                vega,
                rho,
            },
        })
    }

    fn expiry_valuation(&self, spot: f64, strike: f64, opt_type: OptionType) -> Valuation {
        let delta = match opt_type {
            OptionType::Call if spot > strike => 1.0,
            OptionType::Put if spot < strike => -1.0,
            _ => 0.0,
        };
        Valuation {
            theoretical_price: intrinsic_value(spot, strike, opt_type),
            greeks: Greeks {
                delta,
                ..Greeks::default()
            },
        }
    }

    /// Zero-vol limit: the underlying grows deterministically at the rate,
    /// so moneyness is judged against the discounted strike.
    fn zero_vol_valuation(&self, spot: f64, strike: f64, time: f64, opt_type: OptionType) -> Valuation {
        let discount_r = (-self.rate * time).exp();
        let pv_strike = strike * discount_r;
        let carry = self.rate * pv_strike;

        let (price, delta, theta_annual, rho) = match opt_type {
            OptionType::Call if spot > pv_strike => {
                (spot - pv_strike, 1.0, -carry, strike * time * discount_r / 100.0)
            }
            OptionType::Put if spot < pv_strike => {
                (pv_strike - spot, -1.0, carry, -strike * time * discount_r / 100.0)
            }
            _ => (0.0, 0.0, 0.0, 0.0),
        };

        Valuation {
            theoretical_price: price,
            greeks: Greeks {
                delta,
                gamma: 0.0,
                theta: theta_annual / 365.0,
                vega: 0.0,
                rho,
            },
        }
    }

    /// Calculate option price based on type.
    pub fn price(
        &self,
        spot: f64,
        strike: f64,
        time: f64,
        vol: f64,
        opt_type: OptionType,
    ) -> Result<f64, PricingError> {
        self.price_and_greeks(spot, strike, time, vol, opt_type)
            .map(|v| v.theoretical_price)
    }

    /// Calculate implied volatility from option price using Newton-Raphson.
    pub fn implied_vol(
        &self,
        spot: f64,
        strike: f64,
        time: f64,
        price: f64,
        opt_type: OptionType,
    ) -> Option<f64> {
        if time <= 0.0 || price <= 0.0 || spot <= 0.0 || strike <= 0.0 {
            return None;
        }

        // Initial guess using Brenner-Subrahmanyam approximation
        let mut vol = (price / spot) * (2.0 * PI / time).sqrt();
        vol = vol.clamp(0.01, 5.0);

        let max_iter = 100;
        let tolerance = 1e-6;

        for _ in 0..max_iter {
            let calc_price = self.price(spot, strike, time, vol, opt_type).ok()?;
            let diff = calc_price - price;

            if diff.abs() < tolerance {
                return Some(vol);
            }

            // Vega (not scaled)
            let vega = spot * Self::norm_pdf(self.d1(spot, strike, time, vol)) * time.sqrt();

            if vega.abs() < 1e-10 {
                break;
            }

            vol -= diff / vega;
            vol = vol.clamp(0.001, 10.0);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_black_scholes_call_price() {
        let bs = BlackScholes::new(0.05);
        // S=100, K=100, T=1, vol=0.20 is the textbook 10.4506
        let v = bs.price_and_greeks(100.0, 100.0, 1.0, 0.20, OptionType::Call).unwrap();
        assert_relative_eq!(v.theoretical_price, 10.4506, epsilon = 1e-3);
        assert_relative_eq!(v.greeks.delta, 0.6368, epsilon = 1e-3);
    }

    #[test]
    fn test_black_scholes_put_price() {
        let bs = BlackScholes::new(0.05);
        let v = bs.price_and_greeks(100.0, 100.0, 1.0, 0.20, OptionType::Put).unwrap();
        assert_relative_eq!(v.theoretical_price, 5.5735, epsilon = 1e-3);
        assert_relative_eq!(v.greeks.delta, -0.3632, epsilon = 1e-3);
    }

    #[test]
    fn test_put_call_parity() {
        let bs = BlackScholes::new(0.05);
        let (spot, strike, time, vol) = (100.0, 95.0, 0.5, 0.35);

        let call = bs.price(spot, strike, time, vol, OptionType::Call).unwrap();
        let put = bs.price(spot, strike, time, vol, OptionType::Put).unwrap();

        // C - P = S - K*e^(-rT)
        let parity_rhs = spot - strike * (-bs.rate * time).exp();
        assert_relative_eq!(call - put, parity_rhs, epsilon = 1e-9);
    }

    #[test]
    fn test_theta_is_daily_and_vega_per_point() {
        let bs = BlackScholes::new(0.05);
        let v = bs.price_and_greeks(100.0, 100.0, 1.0, 0.20, OptionType::Call).unwrap();
        // Annual theta is about -6.41, vega about 37.52
        assert_relative_eq!(v.greeks.theta, -6.414 / 365.0, epsilon = 1e-4);
        assert_relative_eq!(v.greeks.vega, 0.3752, epsilon = 1e-3);
        assert!(v.greeks.gamma > 0.0);
    }

    #[test]
    fn test_delta_bounds() {
        let bs = BlackScholes::new(0.05);
        for &spot in &[5.0, 20.0, 50.0, 100.0, 250.0] {
            for &strike in &[10.0, 50.0, 100.0] {
                for &time in &[0.0, 1.0 / 365.0, 0.1, 1.0, 3.0] {
                    for &vol in &[0.0, 0.05, 0.6, 2.0] {
                        let call = bs.price_and_greeks(spot, strike, time, vol, OptionType::Call).unwrap();
                        let put = bs.price_and_greeks(spot, strike, time, vol, OptionType::Put).unwrap();
                        assert!((0.0..=1.0).contains(&call.greeks.delta));
                        assert!((-1.0..=0.0).contains(&put.greeks.delta));
                    }
                }
            }
        }
    }

    #[test]
    fn test_expiry_is_intrinsic() {
        let bs = BlackScholes::new(0.05);
        let call = bs.price_and_greeks(12.0, 10.0, 0.0, 0.5, OptionType::Call).unwrap();
        assert_eq!(call.theoretical_price, 2.0);
        assert_eq!(call.greeks.delta, 1.0);
        assert_eq!(call.greeks.gamma, 0.0);
        assert_eq!(call.greeks.theta, 0.0);
        assert_eq!(call.greeks.vega, 0.0);

        let put = bs.price_and_greeks(12.0, 10.0, 0.0, 0.5, OptionType::Put).unwrap();
        assert_eq!(put.theoretical_price, 0.0);
        assert_eq!(put.greeks.delta, 0.0);

        let itm_put = bs.price_and_greeks(8.0, 10.0, 0.0, 0.5, OptionType::Put).unwrap();
        assert_eq!(itm_put.theoretical_price, 2.0);
        assert_eq!(itm_put.greeks.delta, -1.0);
    }

    #[test]
    fn test_converges_to_intrinsic_near_expiry() {
        let bs = BlackScholes::new(0.05);
        for &(spot, strike) in &[(12.0, 10.0), (8.0, 10.0), (100.0, 90.0), (45.0, 60.0)] {
            for right in [OptionType::Call, OptionType::Put] {
                let v = bs.price_and_greeks(spot, strike, 1e-8, 0.4, right).unwrap();
                assert_relative_eq!(
                    v.theoretical_price,
                    intrinsic_value(spot, strike, right),
                    epsilon = 1e-4
                );
            }
        }
    }

    #[test]
    fn test_zero_vol_is_discounted_intrinsic() {
        let bs = BlackScholes::new(0.05);
        let time = 0.5;
        let v = bs.price_and_greeks(110.0, 100.0, time, 0.0, OptionType::Call).unwrap();
        assert_relative_eq!(v.theoretical_price, 110.0 - 100.0 * (-0.05 * time).exp(), epsilon = 1e-12);
        assert_eq!(v.greeks.delta, 1.0);
        assert_eq!(v.greeks.gamma, 0.0);
        assert_eq!(v.greeks.vega, 0.0);

        let otm = bs.price_and_greeks(110.0, 100.0, time, 0.0, OptionType::Put).unwrap();
        assert_eq!(otm.theoretical_price, 0.0);
        assert_eq!(otm.greeks.delta, 0.0);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let bs = BlackScholes::new(0.05);
        assert!(bs.price_and_greeks(-1.0, 100.0, 0.5, 0.2, OptionType::Call).is_err());
        assert!(bs.price_and_greeks(100.0, 0.0, 0.5, 0.2, OptionType::Call).is_err());
        assert!(bs.price_and_greeks(100.0, 100.0, -0.1, 0.2, OptionType::Put).is_err());
        assert!(bs.price_and_greeks(100.0, 100.0, 0.5, -0.2, OptionType::Put).is_err());
        assert!(bs.price_and_greeks(f64::NAN, 100.0, 0.5, 0.2, OptionType::Put).is_err());
        assert!(BlackScholes::new(f64::INFINITY)
            .price_and_greeks(100.0, 100.0, 0.5, 0.2, OptionType::Put)
            .is_err());
    }

    #[test]
    fn test_free_function_matches_calculator() {
        let a = price_and_greeks(15.0, 14.0, 0.04, 0.04, 0.8, OptionType::Put).unwrap();
        let b = BlackScholes::new(0.04)
            .price_and_greeks(15.0, 14.0, 0.04, 0.8, OptionType::Put)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_implied_vol() {
        let bs = BlackScholes::new(0.05);
        let vol = 0.65;
        let price = bs.price(12.0, 11.0, 30.0 / 365.0, vol, OptionType::Put).unwrap();

        let iv = bs
            .implied_vol(12.0, 11.0, 30.0 / 365.0, price, OptionType::Put)
            .unwrap();
        assert_relative_eq!(iv, vol, epsilon = 0.001);
    }
}
