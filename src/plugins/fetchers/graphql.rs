use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::models::ProductRecord;
use crate::plugins::traits::StockFetcher;
use crate::utils::error::FetchError;

const STOCK_AVAILABILITY_QUERY: &str = r#"
query StockAvailability($sku: String!, $country: String!) {
  product(sku: $sku) {
    availability(country: $country) {
      available
      availabilityStatus
    }
  }
}
"#;

/// Availability as reported by the GraphQL API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub available: bool,
    pub status: Option<String>,
}

/// Queries the retailer's GraphQL endpoint by SKU.
pub struct GraphqlFetcher {
    endpoint: String,
    country_code: String,
}

impl GraphqlFetcher {
    pub fn new(endpoint: impl Into<String>, country_code: impl Into<String>) -> Self {
        GraphqlFetcher {
            endpoint: endpoint.into(),
            country_code: country_code.into(),
        }
    }

    fn create_payload(&self, sku: &str) -> Value {
        json!({
            "query": STOCK_AVAILABILITY_QUERY,
            "variables": {
                "sku": sku,
                "country": self.country_code,
            }
        })
    }

    /// Walk `data.product.availability`, failing on the first missing level.
    pub fn parse_availability(body: &Value) -> Result<Availability, FetchError> {
        let data = present(body, "data")?;
        let product = present(data, "product")?;
        let availability = present(product, "availability")?;

        let available = availability
            .get("available")
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                FetchError::MalformedResponse("missing boolean `available`".to_string())
            })?;
        let status = availability
            .get("availabilityStatus")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Availability { available, status })
    }
}

fn present<'a>(value: &'a Value, key: &str) -> Result<&'a Value, FetchError> {
    match value.get(key) {
        Some(inner) if !inner.is_null() => Ok(inner),
        _ => Err(FetchError::MalformedResponse(format!("missing `{}`", key))),
    }
}

#[async_trait]
impl StockFetcher for GraphqlFetcher {
    fn name(&self) -> &str {
        "GraphQL Stock API"
    }

    fn plugin_type(&self) -> &str {
        "graphql"
    }

    async fn fetch_availability(
        &self,
        client: &Client,
        product: &ProductRecord,
    ) -> Result<bool, FetchError> {
        let response = client
            .post(&self.endpoint)
            .json(&self.create_payload(&product.identifier))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::BadStatus(response.status().as_u16()));
        }

        let body: Value = response.json().await?;
        let availability = Self::parse_availability(&body)?;

        tracing::debug!(
            product = %product.name,
            sku = %product.identifier,
            status = availability.status.as_deref().unwrap_or("unknown"),
            "GraphQL availability"
        );

        Ok(availability.available)
    }
}
