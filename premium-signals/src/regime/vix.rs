//! VIX regime classification.
//!
//! Three half-open bands from two configured edges `t1 < t2`:
//! - Green: VIX < t1
//! - Yellow: t1 <= VIX < t2
//! - Red: VIX >= t2
//!
//! A level sitting exactly on an edge belongs to the riskier band.

use serde::{Deserialize, Serialize};

use crate::rules::SignalColor;

/// Volatility regime for premium selling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VixRegime {
    Green,
    Yellow,
    Red,
}

impl VixRegime {
    /// Best signal a contract can reach under this regime.
    pub fn signal_cap(&self) -> SignalColor {
        match self {
            Self::Green => SignalColor::Green,
            Self::Yellow => SignalColor::Yellow,
            Self::Red => SignalColor::Red,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Green => "Calm volatility, favorable for premium selling",
            Self::Yellow => "Elevated volatility, proceed with caution",
            Self::Red => "Extreme stress, no new short premium",
        }
    }
}

/// Band edges for the VIX classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VixBands {
    pub t1: f64,
    pub t2: f64,
}

impl VixBands {
    pub fn new(t1: f64, t2: f64) -> Self {
        Self { t1, t2 }
    }
}

impl From<[f64; 2]> for VixBands {
    fn from(edges: [f64; 2]) -> Self {
        Self::new(edges[0], edges[1])
    }
}

/// Classify a VIX level. Edges belong to the higher-risk band.
pub fn classify_vix(vix_level: f64, bands: VixBands) -> VixRegime {
    if vix_level < bands.t1 {
        VixRegime::Green
    } else if vix_level < bands.t2 {
        VixRegime::Yellow
    } else {
        // Also catches NaN: an unreadable VIX is not a calm one
        VixRegime::Red
    }
}
