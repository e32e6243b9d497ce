use async_trait::async_trait;

use crate::plugins::traits::{NotificationResult, NotifierPlugin, StockAlert};
use crate::utils::error::NotifyError;

/// Writes alerts to the log instead of a chat channel.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        ConsoleNotifier
    }
}

#[async_trait]
impl NotifierPlugin for ConsoleNotifier {
    fn name(&self) -> &str {
        "Console Notifier"
    }

    fn plugin_type(&self) -> &str {
        "console"
    }

    async fn notify(&self, alert: &StockAlert) -> Result<NotificationResult, NotifyError> {
        tracing::warn!(
            product = %alert.product_name,
            url = %alert.url,
            "Restock alert (dry run): {}",
            alert.message()
        );

        Ok(NotificationResult {
            success: true,
            message_id: None,
        })
    }

    async fn test_connection(&self) -> Result<bool, NotifyError> {
        Ok(true)
    }
}
