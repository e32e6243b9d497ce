use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::models::{ProductRecord, StockStatus};
use crate::plugins::traits::{NotifierPlugin, StockAlert, StockFetcher};
use crate::utils::error::FetchError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductOutcome {
    pub name: String,
    pub previous: StockStatus,
    pub observed: StockStatus,
    pub notified: bool,
    pub notify_error: Option<String>,
}

/// The product whose fetch aborted a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickFailure {
    pub product: String,
    pub error: FetchError,
    /// Products after the failing one that were not checked.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<ProductOutcome>,
    pub failure: Option<TickFailure>,
    pub total_time_ms: u64,
}

impl TickReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn notifications_sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.notified).count()
    }

    pub fn transitions(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.previous != StockStatus::Unset && o.previous != o.observed)
            .count()
    }
}

/// Owns the tracking records and runs the change-detection loop over them.
#[derive(Debug, Clone)]
pub struct ProductTracker {
    products: Vec<ProductRecord>,
    alert_title: String,
}

impl ProductTracker {
    pub fn new(products: Vec<ProductRecord>, alert_title: impl Into<String>) -> Self {
        Self {
            products,
            alert_title: alert_title.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let products = config.products.iter().map(ProductRecord::from).collect();
        Self::new(products, config.alert_title.clone())
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn get(&self, name: &str) -> Option<&ProductRecord> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Check every product once, in order.
    ///
    /// A fetch failure stops the tick at that product; records already
    /// updated in this tick keep their new status.
    pub async fn run_tick(
        &mut self,
        client: &Client,
        fetcher: &dyn StockFetcher,
        notifier: &dyn NotifierPlugin,
    ) -> TickReport {
        let start_time = Instant::now();
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(self.products.len());
        let mut failure = None;
        let total = self.products.len();

        for (index, product) in self.products.iter_mut().enumerate() {
            let available = match fetcher.fetch_availability(client, product).await {
                Ok(available) => available,
                Err(error) => {
                    tracing::error!(product = %product.name, "❌ Error checking stock: {}", error);
                    failure = Some(TickFailure {
                        product: product.name.clone(),
                        error,
                        skipped: total - index - 1,
                    });
                    break;
                }
            };

            let observation = product.observe(available);
            let mut outcome = ProductOutcome {
                name: product.name.clone(),
                previous: observation.previous,
                observed: observation.current,
                notified: false,
                notify_error: None,
            };

            if observation.is_baseline() {
                tracing::info!("Initial state for {}: {}", product.name, observation.current);
                outcomes.push(outcome);
                continue;
            }

            if observation.is_transition() {
                tracing::info!(
                    "{} stock changed: {} → {}",
                    product.name,
                    observation.previous,
                    observation.current
                );
            }

            if observation.should_notify() {
                tracing::info!("Sending alert for {}", product.name);
                let alert = StockAlert::new(&self.alert_title, &product.name, &product.url);
                match notifier.notify(&alert).await {
                    Ok(_) => outcome.notified = true,
                    Err(e) => {
                        tracing::error!(product = %product.name, "Failed to send alert: {}", e);
                        outcome.notify_error = Some(e.to_string());
                    }
                }
            }

            outcomes.push(outcome);
        }

        let report = TickReport {
            started_at,
            outcomes,
            failure,
            total_time_ms: start_time.elapsed().as_millis() as u64,
        };

        tracing::debug!(
            checked = report.outcomes.len(),
            notifications = report.notifications_sent(),
            complete = report.is_complete(),
            "Tick finished in {}ms",
            report.total_time_ms
        );

        report
    }
}
