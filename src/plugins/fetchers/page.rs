use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};

use crate::models::ProductRecord;
use crate::plugins::traits::StockFetcher;
use crate::utils::error::{AppError, FetchError};

/// Scrapes the product page and inspects its add-to-bag button.
///
/// Tied to the retailer's markup: a page without the button reads as
/// out of stock rather than as an error.
pub struct PageFetcher {
    selector: Selector,
}

impl PageFetcher {
    pub fn new(button_selector: &str) -> Result<Self, AppError> {
        let selector = Selector::parse(button_selector).map_err(|e| AppError::Plugin {
            plugin_type: "page".to_string(),
            message: format!("Invalid CSS selector '{}': {:?}", button_selector, e),
        })?;
        Ok(PageFetcher { selector })
    }

    /// Available iff the first matching button exists and is not disabled.
    pub fn button_available(&self, html: &str) -> bool {
        let document = Html::parse_document(html);

        match document.select(&self.selector).next() {
            Some(button) => {
                let element = button.value();
                let disabled = element.attr("disabled").is_some()
                    || element
                        .attr("aria-disabled")
                        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
                !disabled
            }
            None => false,
        }
    }
}

#[async_trait]
impl StockFetcher for PageFetcher {
    fn name(&self) -> &str {
        "Product Page Scraper"
    }

    fn plugin_type(&self) -> &str {
        "page"
    }

    async fn fetch_availability(
        &self,
        client: &Client,
        product: &ProductRecord,
    ) -> Result<bool, FetchError> {
        let response = client.get(&product.identifier).send().await?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::BadStatus(response.status().as_u16()));
        }

        let html = response.text().await?;
        let available = self.button_available(&html);

        if !available {
            tracing::debug!(product = %product.name, "Add-to-bag button missing or disabled");
        }

        Ok(available)
    }
}
