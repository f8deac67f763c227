//! Traffic-light signal types.

use serde::{Deserialize, Serialize};

use super::engine::Rule;

/// Risk signal for one short option.
///
/// Ordered from least to most risky so that `max` picks the stricter one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalColor {
    Green,
    Yellow,
    Red,
}

impl SignalColor {
    /// The stricter of two signals.
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
            Self::Red => "RED",
        }
    }
}

impl std::fmt::Display for SignalColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A rule that pushed the signal off GREEN, with tooltip text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFinding {
    pub rule: Rule,
    pub severity: SignalColor,
    pub detail: String,
}

/// Evaluated signal plus the facts that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub color: SignalColor,
    /// Annualized return in percent (0.0 when not computable).
    pub annualized_return: f64,
    pub delta: f64,
    pub open_interest: i64,
    pub volume: i64,
    /// Downgrading rules, in evaluation order.
    pub findings: Vec<RuleFinding>,
}

impl Signal {
    /// Finding for a specific rule, if it downgraded.
    pub fn finding(&self, rule: Rule) -> Option<&RuleFinding> {
        self.findings.iter().find(|f| f.rule == rule)
    }
}
