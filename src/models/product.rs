use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProductConfig;
use crate::models::StockStatus;

/// Per-run tracking state for one configured product. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub name: String,
    pub identifier: String,
    pub url: String,

    pub last_status: StockStatus,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_changed: Option<DateTime<Utc>>,
}

/// Result of feeding one availability reading into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub previous: StockStatus,
    pub current: StockStatus,
}

impl Observation {
    /// First reading of the run; never alerts.
    pub fn is_baseline(&self) -> bool {
        self.previous == StockStatus::Unset
    }

    pub fn is_transition(&self) -> bool {
        !self.is_baseline() && self.previous != self.current
    }

    /// Only a set, non-available status becoming available alerts.
    pub fn should_notify(&self) -> bool {
        !self.is_baseline()
            && self.previous != StockStatus::Available
            && self.current == StockStatus::Available
    }
}

impl ProductRecord {
    pub fn new(
        name: impl Into<String>,
        identifier: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
            url: url.into(),
            last_status: StockStatus::Unset,
            last_checked: None,
            last_changed: None,
        }
    }

    /// Record a reading. The stored status always ends up equal to it.
    pub fn observe(&mut self, available: bool) -> Observation {
        let now = Utc::now();
        let observation = Observation {
            previous: self.last_status,
            current: StockStatus::from_available(available),
        };

        if observation.is_transition() {
            self.last_changed = Some(now);
        }
        self.last_status = observation.current;
        self.last_checked = Some(now);

        observation
    }
}

impl From<&ProductConfig> for ProductRecord {
    fn from(config: &ProductConfig) -> Self {
        ProductRecord::new(&config.name, &config.identifier, &config.url)
    }
}
