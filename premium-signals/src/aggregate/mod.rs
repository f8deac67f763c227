//! Signal aggregation module.
//!
//! Rolls per-contract signals into per-underlying counts and a
//! portfolio-wide best signal for summary display.

pub mod summary;

pub use summary::{aggregate, SignalAggregator, SignalSummary, UnderlyingSummary};
