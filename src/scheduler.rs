use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::{AppConfig, FetcherConfig};
use crate::models::ProductRecord;
use crate::plugins::fetchers::build_client;
use crate::plugins::PluginManager;
use crate::tracker::{ProductTracker, TickFailure, TickReport};
use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub ticks_run: u64,
    pub ticks_failed: u64,
    pub notifications_sent: u64,
    pub last_tick: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Drives the tracker on a fixed interval.
pub struct StockScheduler {
    scheduler: JobScheduler,
    tracker: Arc<Mutex<ProductTracker>>,
    plugins: PluginManager,
    fetcher_config: FetcherConfig,
    interval: Duration,
    stats: Arc<RwLock<SchedulerStats>>,
}

impl StockScheduler {
    pub async fn new(
        tracker: ProductTracker,
        plugins: PluginManager,
        config: &AppConfig,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            tracker: Arc::new(Mutex::new(tracker)),
            plugins,
            fetcher_config: config.fetcher.clone(),
            interval: Duration::from_secs(config.interval_minutes * 60),
            stats: Arc::new(RwLock::new(SchedulerStats::default())),
        })
    }

    /// Run the first tick immediately, then every interval.
    pub async fn start(&mut self) -> Result<()> {
        self.run_tick_now().await;

        let tracker = Arc::clone(&self.tracker);
        let plugins = self.plugins.clone();
        let fetcher_config = self.fetcher_config.clone();
        let stats = Arc::clone(&self.stats);

        let job = Job::new_repeated_async(self.interval, move |_uuid, _l| {
            let tracker = Arc::clone(&tracker);
            let plugins = plugins.clone();
            let fetcher_config = fetcher_config.clone();
            let stats = Arc::clone(&stats);

            Box::pin(async move {
                Self::execute_tick(&tracker, &plugins, &fetcher_config, &stats).await;
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;
        tracing::info!(
            "Stock scheduler started, checking every {} minute(s)",
            self.interval.as_secs() / 60
        );
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        tracing::info!("Stock scheduler shutdown");
        Ok(())
    }

    /// Start, then keep polling until Ctrl-C.
    pub async fn run_until_ctrl_c(mut self) -> Result<()> {
        self.start().await?;
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutting down...");
        self.shutdown().await
    }

    /// Execute a tick immediately (outside of schedule)
    pub async fn run_tick_now(&self) -> Option<TickReport> {
        Self::execute_tick(&self.tracker, &self.plugins, &self.fetcher_config, &self.stats).await
    }

    pub async fn get_stats(&self) -> SchedulerStats {
        self.stats.read().await.clone()
    }

    /// Current records, in configuration order.
    pub async fn snapshot(&self) -> Vec<ProductRecord> {
        self.tracker.lock().await.products().to_vec()
    }

    async fn execute_tick(
        tracker: &Mutex<ProductTracker>,
        plugins: &PluginManager,
        fetcher_config: &FetcherConfig,
        stats: &RwLock<SchedulerStats>,
    ) -> Option<TickReport> {
        // Overlapping jobs wait here; state is only touched by one tick at a time
        let mut tracker = tracker.lock().await;

        let client = match build_client(fetcher_config) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("❌ Error checking stock: {}", e);
                Self::record_failure(stats, e.to_string()).await;
                return None;
            }
        };

        let fetcher = plugins.fetcher();
        let notifier = plugins.notifier();
        let report = tracker
            .run_tick(&client, fetcher.as_ref(), notifier.as_ref())
            .await;
        drop(client);

        let mut stats = stats.write().await;
        stats.ticks_run += 1;
        stats.last_tick = Some(report.started_at);
        stats.notifications_sent += report.notifications_sent() as u64;
        match &report.failure {
            Some(TickFailure { product, error, .. }) => {
                stats.ticks_failed += 1;
                stats.last_error = Some(format!("{}: {}", product, error));
            }
            None => stats.last_error = None,
        }

        Some(report)
    }

    async fn record_failure(stats: &RwLock<SchedulerStats>, message: String) {
        let mut stats = stats.write().await;
        stats.ticks_run += 1;
        stats.ticks_failed += 1;
        stats.last_tick = Some(Utc::now());
        stats.last_error = Some(message);
    }
}
