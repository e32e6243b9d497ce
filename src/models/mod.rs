use serde::{Deserialize, Serialize};
use std::fmt;

pub mod product;

// Re-exports for convenience
pub use product::*;

/// Last recorded availability of a product.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// Nothing observed yet in this run.
    #[default]
    Unset,
    Unavailable,
    Available,
}

impl StockStatus {
    pub fn from_available(available: bool) -> Self {
        if available {
            StockStatus::Available
        } else {
            StockStatus::Unavailable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Unset => "unset",
            StockStatus::Unavailable => "unavailable",
            StockStatus::Available => "available",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
