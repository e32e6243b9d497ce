use config::{Config, Environment, File, FileFormat, FileSourceString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;
use url::Url;
use validator::Validate;

use crate::{AppError, Result};

pub const DEFAULT_GRAPHQL_ENDPOINT: &str = "https://www.lego.com/api/graphql/StockAvailability";
pub const DEFAULT_BUTTON_SELECTOR: &str = r#"button[data-test="add-to-bag"]"#;
pub const DEFAULT_TOKEN_ENV: &str = "DISCORD_BOT_TOKEN";

const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
const LOCAL_CONFIG_FILE: &str = "config/local.toml";

/// Top-level options also accepted in camelCase.
const CAMEL_CASE_KEYS: [(&str, &str); 3] = [
    ("intervalMinutes", "interval_minutes"),
    ("countryCode", "country_code"),
    ("alertTitle", "alert_title"),
];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default = "default_interval_minutes")]
    #[validate(range(min = 1, message = "interval_minutes must be greater than 0"))]
    pub interval_minutes: u64,

    #[serde(default = "default_country_code")]
    #[validate(length(equal = 2, message = "country_code must be a two-letter code"))]
    pub country_code: String,

    #[serde(default = "default_alert_title")]
    pub alert_title: String,

    #[serde(default)]
    #[validate(nested)]
    pub fetcher: FetcherConfig,

    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    #[validate(nested)]
    pub products: Vec<ProductConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// POST a GraphQL availability query per SKU.
    Graphql,
    /// GET the product page and inspect the add-to-bag button.
    Page,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FetcherConfig {
    pub kind: FetcherKind,
    pub endpoint: String,
    #[validate(length(min = 1, message = "user_agent must not be empty"))]
    pub user_agent: String,
    #[validate(range(min = 1, message = "timeout_secs must be greater than 0"))]
    pub timeout_secs: u64,
    pub button_selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Channel the bot posts restock alerts to.
    pub channel_id: Option<String>,
    /// Alternative to the bot: post through a channel webhook.
    pub webhook_url: Option<String>,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ProductConfig {
    #[validate(length(min = 1, message = "product name must not be empty"))]
    pub name: String,
    /// SKU for the GraphQL fetcher, page URL for the page fetcher.
    #[validate(length(min = 1, message = "product identifier must not be empty"))]
    pub identifier: String,
    #[validate(url(message = "product url must be a valid URL"))]
    pub url: String,
}

fn default_interval_minutes() -> u64 {
    1
}

fn default_country_code() -> String {
    "GB".to_string()
}

fn default_alert_title() -> String {
    "LEGO ALERT!".to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            kind: FetcherKind::Graphql,
            endpoint: DEFAULT_GRAPHQL_ENDPOINT.to_string(),
            user_agent: "Mozilla/5.0 (LEGOStockChecker/1.0)".to_string(),
            timeout_secs: 10,
            button_selector: DEFAULT_BUTTON_SELECTOR.to_string(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            channel_id: None,
            webhook_url: None,
            token_env: default_token_env(),
            api_base: default_api_base(),
            username: None,
        }
    }
}

impl DiscordConfig {
    /// Bot token from the configured environment variable, if set and non-empty.
    pub fn bot_token(&self) -> Option<String> {
        env::var(&self.token_env).ok().filter(|t| !t.trim().is_empty())
    }
}

impl AppConfig {
    /// Layered load: `config/default.toml`, `config/local.toml`, an optional
    /// explicit file, then `RESTOCK__*` environment variables.
    ///
    /// Later files merge into earlier ones table by table; any other value,
    /// including the product list, is replaced whole.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut merged = toml::Table::new();

        for layer in [DEFAULT_CONFIG_FILE, LOCAL_CONFIG_FILE] {
            let layer = Path::new(layer);
            if layer.exists() {
                merge_tables(&mut merged, read_layer(layer)?);
            }
        }

        if let Some(path) = path {
            merge_tables(&mut merged, read_layer(path)?);
        }

        let settings = Config::builder()
            .add_source(toml_source(&merged)?)
            .add_source(
                Environment::with_prefix("RESTOCK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load a single file with no layering or environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(toml_source(&read_layer(path)?)?)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)?;

        if self.products.is_empty() {
            return Err(AppError::Validation("At least one product must be configured".into()));
        }

        let mut seen = HashSet::new();
        for product in &self.products {
            if !seen.insert(product.name.as_str()) {
                return Err(AppError::Validation(format!(
                    "Duplicate product name: {}",
                    product.name
                )));
            }
        }

        match self.fetcher.kind {
            FetcherKind::Graphql => {
                if Url::parse(&self.fetcher.endpoint).is_err() {
                    return Err(AppError::Validation("Invalid GraphQL endpoint URL".into()));
                }
            }
            FetcherKind::Page => {
                if scraper::Selector::parse(&self.fetcher.button_selector).is_err() {
                    return Err(AppError::Validation(format!(
                        "Invalid button selector: {}",
                        self.fetcher.button_selector
                    )));
                }
                // The page fetcher requests the identifier directly
                for product in &self.products {
                    if Url::parse(&product.identifier).is_err() {
                        return Err(AppError::Validation(format!(
                            "Product {} identifier must be a page URL for the page fetcher",
                            product.name
                        )));
                    }
                }
            }
        }

        if let Some(webhook_url) = &self.discord.webhook_url {
            if Url::parse(webhook_url).is_err() {
                return Err(AppError::Validation("Invalid Discord webhook URL".into()));
            }
        }

        if Url::parse(&self.discord.api_base).is_err() {
            return Err(AppError::Validation("Invalid Discord API base URL".into()));
        }

        Ok(())
    }

    /// Effective configuration rendered as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Read one TOML layer, renaming camelCase options to their field names.
///
/// The `config` crate lowercases keys, so the camelCase spelling would never
/// reach serde. An explicit snake_case key wins.
fn read_layer(path: &Path) -> Result<toml::Table> {
    let mut table: toml::Table = fs::read_to_string(path)?.parse()?;

    for (camel, snake) in CAMEL_CASE_KEYS {
        if let Some(value) = table.remove(camel) {
            table.entry(snake).or_insert(value);
        }
    }

    Ok(table)
}

fn merge_tables(base: &mut toml::Table, layer: toml::Table) {
    for (key, value) in layer {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

fn toml_source(table: &toml::Table) -> Result<File<FileSourceString, FileFormat>> {
    Ok(File::from_str(&toml::to_string(table)?, FileFormat::Toml))
}
