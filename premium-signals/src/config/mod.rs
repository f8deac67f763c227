//! Configuration module.
//!
//! One immutable `SignalConfig` per process, loaded from TOML at startup.

pub mod settings;

pub use settings::{ConfigError, SignalConfig};
