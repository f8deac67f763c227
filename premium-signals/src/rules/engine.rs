//! Traffic-light rule engine.
//!
//! Rules run in a fixed order, each proposing a severity:
//! 1. Liquidity: OI or volume under the minimum -> RED
//! 2. VIX regime: RED -> RED, YELLOW caps at YELLOW
//! 3. Delta band: normal band GREEN, hard band YELLOW, outside RED
//! 4. Annualized return: target GREEN, floor YELLOW, below RED
//! 5. Technical regime: unfavorable direction caps at YELLOW
//!
//! The signal is the max over all proposals. A rule can only move the
//! outcome toward RED, never back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::signal::{RuleFinding, Signal, SignalColor};
use crate::analytics::annualized_return;
use crate::config::SignalConfig;
use crate::data::{OptionContract, OptionType};
use crate::indicators::UnderlyingState;
use crate::pricing::Greeks;
use crate::regime::{classify_technical, StrategySide, TechnicalRegime, VixRegime};

/// One check in the evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    Liquidity,
    VixRegime,
    DeltaBand,
    AnnualizedReturn,
    TechnicalRegime,
}

impl Rule {
    /// Evaluation order, strictest gate first.
    pub const ORDERED: [Rule; 5] = [
        Rule::Liquidity,
        Rule::VixRegime,
        Rule::DeltaBand,
        Rule::AnnualizedReturn,
        Rule::TechnicalRegime,
    ];

    /// Severity this rule proposes, with tooltip text when it is not GREEN.
    fn check(&self, facts: &ContractFacts, config: &SignalConfig) -> (SignalColor, Option<String>) {
        match self {
            Rule::Liquidity => {
                if facts.open_interest < config.min_oi || facts.volume < config.min_volume {
                    (
                        SignalColor::Red,
                        Some(format!(
                            "Illiquid: OI {} (min {}), volume {} (min {})",
                            facts.open_interest, config.min_oi, facts.volume, config.min_volume
                        )),
                    )
                } else {
                    (SignalColor::Green, None)
                }
            }
            Rule::VixRegime => {
                let cap = facts.vix_regime.signal_cap();
                let detail = (cap != SignalColor::Green)
                    .then(|| format!("VIX regime {}: {}", cap, facts.vix_regime.label()));
                (cap, detail)
            }
            Rule::DeltaBand => {
                let [lo, hi] = config.delta_band(facts.right);
                let [hard_lo, hard_hi] = config.delta_band_hard(facts.right);
                let delta = facts.delta;
                if delta >= lo && delta <= hi {
                    (SignalColor::Green, None)
                } else if delta >= hard_lo && delta <= hard_hi {
                    (
                        SignalColor::Yellow,
                        Some(format!("Delta {:.2} outside [{:.2}, {:.2}]", delta, lo, hi)),
                    )
                } else {
                    (
                        SignalColor::Red,
                        Some(format!(
                            "Delta {:.2} outside hard band [{:.2}, {:.2}]",
                            delta, hard_lo, hard_hi
                        )),
                    )
                }
            }
            Rule::AnnualizedReturn => {
                let ret = facts.annualized_return;
                if ret >= config.return_target {
                    (SignalColor::Green, None)
                } else if ret >= config.return_floor {
                    (
                        SignalColor::Yellow,
                        Some(format!(
                            "Return {:.1}% below target {:.1}%",
                            ret, config.return_target
                        )),
                    )
                } else {
                    (
                        SignalColor::Red,
                        Some(format!(
                            "Return {:.1}% below floor {:.1}%",
                            ret, config.return_floor
                        )),
                    )
                }
            }
            Rule::TechnicalRegime => {
                if facts.technical.is_favorable(facts.side) {
                    (SignalColor::Green, None)
                } else {
                    (
                        SignalColor::Yellow,
                        Some(format!(
                            "Technicals {:?} unfavorable for {:?}",
                            facts.technical, facts.side
                        )),
                    )
                }
            }
        }
    }
}

/// Everything the rules look at, resolved once per contract.
#[derive(Debug, Clone)]
struct ContractFacts {
    right: OptionType,
    side: StrategySide,
    delta: f64,
    open_interest: i64,
    volume: i64,
    annualized_return: f64,
    vix_regime: VixRegime,
    technical: TechnicalRegime,
}

/// Rule engine bound to one configuration and one valuation date.
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine<'a> {
    config: &'a SignalConfig,
    as_of: NaiveDate,
}

impl<'a> RuleEngine<'a> {
    pub fn new(config: &'a SignalConfig, as_of: NaiveDate) -> Self {
        Self { config, as_of }
    }

    /// Evaluate one short option.
    ///
    /// `spot` is the price of the contract's own underlying and is the
    /// capital base for the return check. `underlying_state` is whichever
    /// series governs the technical read (an index proxy or the ETF).
    pub fn evaluate(
        &self,
        contract: &OptionContract,
        greeks: &Greeks,
        spot: f64,
        underlying_state: &UnderlyingState,
        vix_regime: VixRegime,
    ) -> Signal {
        let side = StrategySide::for_right(contract.right);
        let facts = ContractFacts {
            right: contract.right,
            side,
            delta: greeks.delta,
            open_interest: contract.open_interest,
            volume: contract.volume,
            annualized_return: annualized_return(
                contract.mid_f64(),
                spot,
                contract.dte(self.as_of),
            ),
            vix_regime,
            technical: classify_technical(underlying_state, side, self.config),
        };

        let mut findings = Vec::new();
        let color = Rule::ORDERED
            .iter()
            .fold(SignalColor::Green, |current, rule| {
                let (severity, detail) = rule.check(&facts, self.config);
                if let Some(detail) = detail {
                    findings.push(RuleFinding {
                        rule: *rule,
                        severity,
                        detail,
                    });
                }
                current.worst(severity)
            });

        Signal {
            color,
            annualized_return: facts.annualized_return,
            delta: facts.delta,
            open_interest: facts.open_interest,
            volume: facts.volume,
            findings,
        }
    }
}
