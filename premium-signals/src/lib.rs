pub mod aggregate;
pub mod analytics;
pub mod config;
pub mod data;
pub mod indicators;
pub mod pipeline;
pub mod pricing;
pub mod regime;
pub mod rules;

// Re-export commonly used types
pub use aggregate::{aggregate, SignalAggregator, SignalSummary, UnderlyingSummary};
pub use config::{ConfigError, SignalConfig};
pub use data::{ContractKey, OptionContract, OptionType, PricePoint, PriceSeries};
pub use indicators::{rsi, simple_moving_average, UnderlyingState};
pub use pipeline::{run_refresh, ContractEvaluation, RefreshInput, RefreshReport, UnderlyingSnapshot};
pub use pricing::{price_and_greeks, BlackScholes, Greeks, PricingError, Valuation};
pub use regime::{classify_technical, classify_vix, StrategySide, TechnicalRegime, VixBands, VixRegime};
pub use rules::{Rule, RuleEngine, Signal, SignalColor};
