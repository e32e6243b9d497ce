pub mod fetcher;
pub mod notifier;

pub use fetcher::StockFetcher;
pub use notifier::{NotifierPlugin, NotificationResult, StockAlert};
