use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use restock_watcher::plugins::fetchers::build_client;
use restock_watcher::scheduler::StockScheduler;
use restock_watcher::{plugins::PluginManager, AppConfig, ProductTracker, TickReport};

#[derive(Parser)]
#[command(
    name = "restock-watcher",
    version,
    about = "Watch products and alert on Discord when they come back in stock"
)]
struct Cli {
    /// Extra configuration file layered over config/default and config/local
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to daily-rotated files in this directory instead of stdout
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll on the configured interval until interrupted
    Run {
        /// Log alerts instead of posting them to Discord
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a single tick and print what was observed
    Once {
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the effective configuration
    ShowConfig,
}

fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("restock_watcher=info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "restock-watcher.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref());

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Run { dry_run: false }) {
        Command::Run { dry_run } => run(config, dry_run).await,
        Command::Once { dry_run } => once(config, dry_run).await,
        Command::ShowConfig => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn run(config: AppConfig, dry_run: bool) -> Result<()> {
    info!("Starting Restock Watcher for {} product(s)...", config.products.len());

    let plugins = PluginManager::from_config(&config, dry_run)?;
    if let Err(e) = plugins.verify_notifier().await {
        error!("{}", e);
    }

    let tracker = ProductTracker::from_config(&config);
    let scheduler = StockScheduler::new(tracker, plugins, &config).await?;
    scheduler.run_until_ctrl_c().await?;

    Ok(())
}

async fn once(config: AppConfig, dry_run: bool) -> Result<()> {
    let plugins = PluginManager::from_config(&config, dry_run)?;
    let mut tracker = ProductTracker::from_config(&config);

    let client = build_client(&config.fetcher)?;
    let fetcher = plugins.fetcher();
    let notifier = plugins.notifier();
    let report = tracker
        .run_tick(&client, fetcher.as_ref(), notifier.as_ref())
        .await;

    print_report(&report);
    Ok(())
}

fn print_report(report: &TickReport) {
    for outcome in &report.outcomes {
        println!("{:<40} {}", outcome.name, outcome.observed);
    }
    if let Some(failure) = &report.failure {
        println!(
            "{:<40} error: {} ({} product(s) not checked)",
            failure.product, failure.error, failure.skipped
        );
    }
}
