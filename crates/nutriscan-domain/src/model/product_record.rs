//! Nutrition database record as returned by the lookup service
//!
//! Every field is optional on the wire. Accessors substitute the `N/A`
//! sentinel for missing or blank text so callers never have to branch.

use nutriscan_types::NOT_AVAILABLE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope of a barcode lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupResponse {
    /// `1` when the product exists
    #[serde(default)]
    pub status: Value,

    #[serde(default)]
    pub status_verbose: Option<String>,

    #[serde(default)]
    pub product: Option<ProductRecord>,
}

impl LookupResponse {
    /// True when the service reported a hit and included a product
    pub fn is_found(&self) -> bool {
        let status_ok = match &self.status {
            Value::Number(n) => n.as_i64() == Some(1) || n.as_f64() == Some(1.0),
            Value::String(s) => s.trim() == "1",
            _ => false,
        };
        status_ok && self.product.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default)]
    pub product_name: Option<String>,

    #[serde(default)]
    pub brands: Option<String>,

    #[serde(default)]
    pub quantity: Option<String>,

    #[serde(default)]
    pub ingredients_text: Option<String>,

    /// Raw nutriment mapping, keyed like `sugars_100g`
    #[serde(default)]
    pub nutriments: Map<String, Value>,

    #[serde(default)]
    pub nutriscore_grade: Option<String>,

    /// Remaining fields, searched for language-suffixed ingredient text
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn text_or_na(value: &Option<String>) -> &str {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => NOT_AVAILABLE,
    }
}

impl ProductRecord {
    pub fn product_name(&self) -> &str {
        text_or_na(&self.product_name)
    }

    pub fn brands(&self) -> &str {
        text_or_na(&self.brands)
    }

    pub fn quantity(&self) -> &str {
        text_or_na(&self.quantity)
    }

    /// Ingredient text, preferring the unsuffixed field, then English, then any
    /// other `ingredients_text_<lang>` variant in key order.
    pub fn ingredients_text(&self) -> &str {
        if let Some(s) = self.ingredients_text.as_deref().map(str::trim) {
            if !s.is_empty() {
                return s;
            }
        }

        let non_empty = |key: &str| {
            self.extra
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        if let Some(s) = non_empty("ingredients_text_en") {
            return s;
        }

        let mut suffixed: Vec<&String> = self
            .extra
            .keys()
            .filter(|k| k.starts_with("ingredients_text_"))
            .collect();
        suffixed.sort();

        suffixed
            .into_iter()
            .find_map(|k| non_empty(k))
            .unwrap_or(NOT_AVAILABLE)
    }

    /// Grade published by the database, lowercased, when it is a real letter
    pub fn reported_grade(&self) -> Option<String> {
        self.nutriscore_grade
            .as_deref()
            .and_then(nutriscan_types::NutriGrade::from_letter)
            .map(|g| g.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_found_response() {
        let json = r#"{
            "status": 1,
            "status_verbose": "product found",
            "product": {
                "product_name": "Hazelnut spread",
                "brands": "Acme",
                "quantity": "400 g",
                "ingredients_text": "Sugar, palm oil, hazelnuts 13%",
                "nutriscore_grade": "e",
                "nutriments": {"sugars_100g": 56.3, "energy-kcal_100g": 539}
            }
        }"#;

        let response: LookupResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_found());
        let product = response.product.unwrap();
        assert_eq!(product.product_name(), "Hazelnut spread");
        assert_eq!(product.brands(), "Acme");
        assert_eq!(product.quantity(), "400 g");
        assert_eq!(product.ingredients_text(), "Sugar, palm oil, hazelnuts 13%");
        assert_eq!(product.reported_grade(), Some("e".to_string()));
        assert_eq!(product.nutriments.len(), 2);
    }

    #[test]
    fn test_not_found_response() {
        let json = r#"{"status": 0, "status_verbose": "product not found", "code": "123"}"#;
        let response: LookupResponse = serde_json::from_str(json).unwrap();
        assert!(!response.is_found());
    }

    #[test]
    fn test_missing_fields_default_to_na() {
        let product: ProductRecord = serde_json::from_str(r#"{"product_name": "  "}"#).unwrap();
        assert_eq!(product.product_name(), NOT_AVAILABLE);
        assert_eq!(product.brands(), NOT_AVAILABLE);
        assert_eq!(product.quantity(), NOT_AVAILABLE);
        assert_eq!(product.ingredients_text(), NOT_AVAILABLE);
        assert_eq!(product.reported_grade(), None);
    }

    #[test]
    fn test_language_suffixed_ingredients() {
        let product: ProductRecord = serde_json::from_str(
            r#"{"ingredients_text": "", "ingredients_text_fr": "sucre", "ingredients_text_en": "sugar"}"#,
        )
        .unwrap();
        assert_eq!(product.ingredients_text(), "sugar");

        let product: ProductRecord =
            serde_json::from_str(r#"{"ingredients_text_fr": "sucre, lait"}"#).unwrap();
        assert_eq!(product.ingredients_text(), "sucre, lait");
    }

    #[test]
    fn test_unknown_reported_grade_ignored() {
        let product: ProductRecord =
            serde_json::from_str(r#"{"nutriscore_grade": "unknown"}"#).unwrap();
        assert_eq!(product.reported_grade(), None);
    }
}
