//! Refresh pipeline module.
//!
//! Composition root: takes one fully materialized market snapshot and the
//! configuration, and returns per-contract evaluations plus the summary.

pub mod refresh;

pub use refresh::{
    run_refresh, ContractEvaluation, IndexCard, RefreshInput, RefreshReport, UnderlyingReport,
    UnderlyingSnapshot,
};
