use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::NotifyError;

/// A product that just came back in stock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockAlert {
    pub title: String,
    pub product_name: String,
    pub url: String,
    pub detected_at: DateTime<Utc>,
}

impl StockAlert {
    pub fn new(
        title: impl Into<String>,
        product_name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            product_name: product_name.into(),
            url: url.into(),
            detected_at: Utc::now(),
        }
    }

    /// Chat message body.
    pub fn message(&self) -> String {
        format!(
            "🚨 **{}** 🚨\n**{}** is now **AVAILABLE** 🧱🔥\n{}",
            self.title, self.product_name, self.url
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
}

/// Trait for implementing notification methods (Discord bot, webhook, console)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    /// Core functionality
    async fn notify(&self, alert: &StockAlert) -> Result<NotificationResult, NotifyError>;
    async fn test_connection(&self) -> Result<bool, NotifyError>;
}
