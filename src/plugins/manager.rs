use std::sync::Arc;

use super::fetchers::{GraphqlFetcher, PageFetcher};
use super::notifiers::{ConsoleNotifier, DiscordNotifier};
use super::traits::{NotifierPlugin, StockFetcher};
use crate::config::{AppConfig, FetcherKind};
use crate::utils::error::AppError;

pub type FetcherHandle = Arc<dyn StockFetcher>;
pub type NotifierHandle = Arc<dyn NotifierPlugin>;

/// The fetcher and notifier the watcher runs with.
#[derive(Clone)]
pub struct PluginManager {
    fetcher: FetcherHandle,
    notifier: NotifierHandle,
}

impl PluginManager {
    pub fn new(fetcher: FetcherHandle, notifier: NotifierHandle) -> Self {
        Self { fetcher, notifier }
    }

    /// Build plugins from configuration. A dry run logs alerts instead of
    /// posting them and needs no Discord credentials.
    pub fn from_config(config: &AppConfig, dry_run: bool) -> Result<Self, AppError> {
        let fetcher: FetcherHandle = match config.fetcher.kind {
            FetcherKind::Graphql => Arc::new(GraphqlFetcher::new(
                config.fetcher.endpoint.clone(),
                config.country_code.clone(),
            )),
            FetcherKind::Page => Arc::new(PageFetcher::new(&config.fetcher.button_selector)?),
        };

        let notifier: NotifierHandle = if dry_run {
            Arc::new(ConsoleNotifier::new())
        } else {
            Arc::new(DiscordNotifier::from_config(&config.discord)?)
        };

        tracing::info!("Checking stock with {} via {}", fetcher.name(), notifier.name());

        Ok(Self::new(fetcher, notifier))
    }

    pub fn fetcher(&self) -> FetcherHandle {
        Arc::clone(&self.fetcher)
    }

    pub fn notifier(&self) -> NotifierHandle {
        Arc::clone(&self.notifier)
    }

    /// Check the notifier's credentials before the first tick.
    pub async fn verify_notifier(&self) -> Result<bool, AppError> {
        self.notifier.test_connection().await.map_err(|e| AppError::Plugin {
            plugin_type: self.notifier.plugin_type().to_string(),
            message: format!("connection test failed: {}", e),
        })
    }
}
