use crate::config::DiscordConfig;
use crate::plugins::traits::{NotificationResult, NotifierPlugin, StockAlert};
use crate::utils::error::NotifyError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::time::Duration;

/// Where alerts are posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscordTarget {
    /// Bot user posting into a channel through the REST API.
    Bot { token: String, channel_id: String },
    /// Channel webhook; no bot token needed.
    Webhook { url: String },
}

pub struct DiscordNotifier {
    client: Client,
    target: DiscordTarget,
    api_base: String,
    username: Option<String>,
}

impl DiscordNotifier {
    pub fn new(target: DiscordTarget, api_base: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(DiscordNotifier {
            client,
            target,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            username: None,
        })
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    /// Bot target when a token and channel are available, webhook otherwise.
    pub fn from_config(config: &DiscordConfig) -> Result<Self, NotifyError> {
        let target = match (config.bot_token(), &config.channel_id, &config.webhook_url) {
            (Some(token), Some(channel_id), _) => DiscordTarget::Bot {
                token,
                channel_id: channel_id.clone(),
            },
            (_, _, Some(url)) => DiscordTarget::Webhook { url: url.clone() },
            (None, Some(_), None) => {
                return Err(NotifyError::Config(format!(
                    "Missing bot token: set the {} environment variable",
                    config.token_env
                )));
            }
            (_, None, None) => {
                return Err(NotifyError::Config(
                    "Either discord.channel_id or discord.webhook_url is required".to_string(),
                ));
            }
        };

        Ok(Self::new(target, config.api_base.clone())?.with_username(config.username.clone()))
    }

    pub fn target(&self) -> &DiscordTarget {
        &self.target
    }

    fn create_payload(&self, alert: &StockAlert) -> Value {
        let mut payload = json!({
            "content": alert.message(),
        });

        // Only webhooks may override the display name
        if let (DiscordTarget::Webhook { .. }, Some(username)) = (&self.target, &self.username) {
            payload["username"] = json!(username);
        }

        payload
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header("Authorization", format!("Bot {}", token))
    }

    fn post_message(&self, payload: &Value) -> RequestBuilder {
        match &self.target {
            DiscordTarget::Bot { token, channel_id } => {
                let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
                self.authorized(self.client.post(url), token).json(payload)
            }
            DiscordTarget::Webhook { url } => self
                .client
                .post(url)
                .query(&[("wait", "true")])
                .json(payload),
        }
    }
}

#[async_trait]
impl NotifierPlugin for DiscordNotifier {
    fn name(&self) -> &str {
        "Discord Notifier"
    }

    fn plugin_type(&self) -> &str {
        "discord"
    }

    async fn notify(&self, alert: &StockAlert) -> Result<NotificationResult, NotifyError> {
        let payload = self.create_payload(alert);
        let response = self.post_message(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::BadStatus(status.as_u16()));
        }

        // Both endpoints echo the created message; the id is informational only
        let message_id = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("id").and_then(Value::as_str).map(str::to_string));

        tracing::debug!(product = %alert.product_name, ?message_id, "Discord alert sent");

        Ok(NotificationResult {
            success: true,
            message_id,
        })
    }

    async fn test_connection(&self) -> Result<bool, NotifyError> {
        let request = match &self.target {
            DiscordTarget::Bot { token, .. } => {
                self.authorized(self.client.get(format!("{}/users/@me", self.api_base)), token)
            }
            DiscordTarget::Webhook { url } => self.client.get(url),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::BadStatus(response.status().as_u16()));
        }

        let body: Value = response.json().await?;
        let identity = body
            .get("username")
            .or_else(|| body.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        tracing::info!("✅ Logged in to Discord as {}", identity);

        Ok(true)
    }
}
