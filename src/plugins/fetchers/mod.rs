pub mod graphql;
pub mod page;

pub use graphql::GraphqlFetcher;
pub use page::PageFetcher;

use reqwest::Client;
use std::time::Duration;

use crate::config::FetcherConfig;
use crate::utils::error::FetchError;

/// HTTP session for a single tick: configured user agent and per-request timeout.
pub fn build_client(config: &FetcherConfig) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(FetchError::from)
}
