pub mod types;

pub use types::{ContractKey, OptionContract, OptionType, PricePoint, PriceSeries, SeriesError};
