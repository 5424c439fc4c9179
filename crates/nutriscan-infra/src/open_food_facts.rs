//! OpenFoodFacts product API (v0)

use nutriscan_domain::model::LookupResponse;
use nutriscan_domain::repository::NutritionLookup;
use nutriscan_types::LookupError;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_LOOKUP_BASE_URL: &str = "https://world.openfoodfacts.org";

const USER_AGENT: &str = concat!("nutriscan/", env!("CARGO_PKG_VERSION"));

/// Blocking client for `GET {base}/api/v0/product/{barcode}.json`
#[derive(Debug)]
pub struct OpenFoodFactsClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OpenFoodFactsClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, LookupError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn product_url(&self, barcode: &str) -> String {
        format!("{}/api/v0/product/{}.json", self.base_url, barcode)
    }
}

impl NutritionLookup for OpenFoodFactsClient {
    fn fetch_product(&self, barcode: &str) -> Result<LookupResponse, LookupError> {
        let url = self.product_url(barcode);
        debug!(%url, "fetching product");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(LookupError::NotFound(barcode.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Transport(format!("HTTP {} from {}", status.as_u16(), url)));
        }

        let body = response
            .text()
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        let parsed = parse_lookup_body(&body)?;

        info!(barcode, found = parsed.is_found(), "lookup complete");
        Ok(parsed)
    }
}

/// Decode a v0 product response body
pub fn parse_lookup_body(body: &str) -> Result<LookupResponse, LookupError> {
    serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_url() {
        let client = OpenFoodFactsClient::new("https://world.openfoodfacts.org/", 10).unwrap();
        assert_eq!(
            client.product_url("3017620422003"),
            "https://world.openfoodfacts.org/api/v0/product/3017620422003.json"
        );
    }

    #[test]
    fn test_parse_found_body() {
        let body = r#"{
            "code": "3017620422003",
            "status": 1,
            "status_verbose": "product found",
            "product": {
                "product_name": "Nutella",
                "brands": "Ferrero",
                "nutriments": {"energy-kcal_100g": 539, "sugars_100g": 56.3}
            }
        }"#;
        let parsed = parse_lookup_body(body).unwrap();
        assert!(parsed.is_found());
        let product = parsed.product.unwrap();
        assert_eq!(product.product_name(), "Nutella");
        assert_eq!(product.quantity(), "N/A");
    }

    #[test]
    fn test_parse_missing_body() {
        let body = r#"{"code": "0000000000000", "status": 0, "status_verbose": "product not found"}"#;
        let parsed = parse_lookup_body(body).unwrap();
        assert!(!parsed.is_found());
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(
            parse_lookup_body("<html>busy</html>"),
            Err(LookupError::Malformed(_))
        ));
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let client = OpenFoodFactsClient::new("http://127.0.0.1:9", 2).unwrap();
        assert!(matches!(
            client.fetch_product("3017620422003"),
            Err(LookupError::Transport(_))
        ));
    }

    #[test]
    #[ignore] // Requires network access
    fn test_live_lookup() {
        let client = OpenFoodFactsClient::new(DEFAULT_LOOKUP_BASE_URL, 10).unwrap();
        let response = client.fetch_product("3017620422003").unwrap();
        assert!(response.is_found());
    }
}
