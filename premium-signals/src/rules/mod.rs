//! Signal rules module.
//!
//! - `SignalColor`: GREEN < YELLOW < RED, combined with `max`
//! - `RuleEngine`: ordered, downgrade-only evaluation of one contract

pub mod engine;
pub mod signal;

pub use engine::{Rule, RuleEngine};
pub use signal::{RuleFinding, Signal, SignalColor};
