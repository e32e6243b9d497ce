pub mod config;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod tracker;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use tracker::{ProductTracker, TickReport};
pub use utils::error::{AppError, FetchError, NotifyError};

pub type Result<T> = std::result::Result<T, AppError>;
