use async_trait::async_trait;
use reqwest::Client;

use crate::models::ProductRecord;
use crate::utils::error::FetchError;

/// Trait for implementing availability sources (GraphQL API, product page, etc.)
///
/// One call per product per tick. The client is owned by the tick and is
/// dropped when the tick ends.
#[async_trait]
pub trait StockFetcher: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    /// `true` when the product can currently be bought.
    async fn fetch_availability(
        &self,
        client: &Client,
        product: &ProductRecord,
    ) -> Result<bool, FetchError>;
}
