//! Signal aggregation per underlying and across the portfolio.
//!
//! Pure tally over one refresh:
//! - GREEN/YELLOW/RED counts per underlying, with green calls and puts split
//! - Best (least risky) signal per underlying; RED when it has no contracts
//! - Portfolio-wide counts and the overall best signal

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{ContractKey, OptionType};
use crate::rules::SignalColor;

/// Signal counts for one underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingSummary {
    pub symbol: String,
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
    pub green_calls: usize,
    pub green_puts: usize,
    /// Best signal present, RED if none were evaluated.
    pub best: SignalColor,
}

impl UnderlyingSummary {
    fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            green: 0,
            yellow: 0,
            red: 0,
            green_calls: 0,
            green_puts: 0,
            best: SignalColor::Red,
        }
    }

    fn record(&mut self, right: OptionType, color: SignalColor) {
        match color {
            SignalColor::Green => {
                self.green += 1;
                match right {
                    OptionType::Call => self.green_calls += 1,
                    OptionType::Put => self.green_puts += 1,
                }
            }
            SignalColor::Yellow => self.yellow += 1,
            SignalColor::Red => self.red += 1,
        }
        self.best = self.best.min(color);
    }

    pub fn total(&self) -> usize {
        self.green + self.yellow + self.red
    }

    /// Status line for the ETF card.
    pub fn status_text(&self) -> String {
        if self.green > 0 {
            format!("{} Green Calls, {} Green Puts", self.green_calls, self.green_puts)
        } else {
            "No Qualifying Contracts".to_string()
        }
    }
}

/// Aggregate view of one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    /// Configured symbols first, in configured order, then any others by name.
    pub underlyings: Vec<UnderlyingSummary>,
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
    /// Best signal across every underlying, `None` when nothing was tallied.
    pub overall_best: Option<SignalColor>,
}

impl SignalSummary {
    pub fn get(&self, symbol: &str) -> Option<&UnderlyingSummary> {
        self.underlyings.iter().find(|u| u.symbol == symbol)
    }

    pub fn total(&self) -> usize {
        self.green + self.yellow + self.red
    }
}

/// Accumulates contract signals for one refresh.
#[derive(Debug, Clone, Default)]
pub struct SignalAggregator {
    configured: Vec<String>,
    by_symbol: BTreeMap<String, UnderlyingSummary>,
}

impl SignalAggregator {
    /// Aggregator that always reports `symbols`, even with no contracts.
    pub fn new(symbols: &[String]) -> Self {
        let by_symbol = symbols
            .iter()
            .map(|s| (s.clone(), UnderlyingSummary::empty(s)))
            .collect();
        Self {
            configured: symbols.to_vec(),
            by_symbol,
        }
    }

    pub fn add(&mut self, key: &ContractKey, color: SignalColor) {
        self.by_symbol
            .entry(key.symbol.clone())
            .or_insert_with(|| UnderlyingSummary::empty(&key.symbol))
            .record(key.right, color);
    }

    pub fn finish(mut self) -> SignalSummary {
        let mut underlyings: Vec<UnderlyingSummary> = self
            .configured
            .iter()
            .filter_map(|s| self.by_symbol.remove(s))
            .collect();
        // BTreeMap drains the rest in name order
        underlyings.extend(self.by_symbol.into_values());

        let (green, yellow, red) = underlyings
            .iter()
            .fold((0, 0, 0), |(g, y, r), u| (g + u.green, y + u.yellow, r + u.red));

        let overall_best = underlyings
            .iter()
            .filter(|u| u.total() > 0)
            .map(|u| u.best)
            .min();

        SignalSummary {
            underlyings,
            green,
            yellow,
            red,
            overall_best,
        }
    }
}

/// One-shot aggregation over `(key, color)` pairs.
pub fn aggregate<'a, I>(contract_signals: I, symbols: &[String]) -> SignalSummary
where
    I: IntoIterator<Item = (&'a ContractKey, SignalColor)>,
{
    let mut aggregator = SignalAggregator::new(symbols);
    for (key, color) in contract_signals {
        aggregator.add(key, color);
    }
    aggregator.finish()
}
