//! Ingredient health warnings and allergens

use crate::ai::prompts::build_ingredient_prompt;
use crate::ai::AiBackend;
use crate::json_extract::extract_json_from_response;
use nutriscan_domain::service::keyword_analysis;
use nutriscan_types::{IngredientAnalysis, MAX_ANALYSIS_ITEMS, NOT_AVAILABLE};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

const NO_ANALYSIS_PROVIDED: &str = "No analysis provided.";
pub const ANALYSIS_UNAVAILABLE: &str = "Ingredient analysis unavailable.";

/// Shape the model is asked to return. Any field may be null or mistyped.
#[derive(Debug, Deserialize)]
struct RawIngredientAnalysis {
    #[serde(default, deserialize_with = "lenient_strings")]
    health_warnings: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    allergens: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    analysis: Option<String>,
}

/// Null or non-array is empty; non-string elements are dropped
fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

pub struct IngredientAnalyzer<'a> {
    backend: &'a dyn AiBackend,
}

impl<'a> IngredientAnalyzer<'a> {
    pub fn new(backend: &'a dyn AiBackend) -> Self {
        Self { backend }
    }

    /// Never fails. Missing text short-circuits without calling the backend.
    pub fn analyze(&self, ingredients_text: Option<&str>) -> IngredientAnalysis {
        let text = match ingredients_text.map(str::trim) {
            Some(t) if !t.is_empty() && !t.eq_ignore_ascii_case(NOT_AVAILABLE) => t,
            _ => return IngredientAnalysis::empty(),
        };

        let response = match self.backend.send_prompt(&build_ingredient_prompt(text)) {
            Ok(r) => r,
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "ingredient analysis unavailable");
                return IngredientAnalysis::unavailable(ANALYSIS_UNAVAILABLE);
            }
        };

        match parse_ingredient_response(&response) {
            Some(analysis) => analysis,
            None => {
                debug!("ingredient response was not JSON, scanning for keywords");
                keyword_analysis(&response)
            }
        }
    }
}

/// Structured parse of a model reply, with both lists capped
pub fn parse_ingredient_response(response: &str) -> Option<IngredientAnalysis> {
    let json = extract_json_from_response(response);
    let value: Value = serde_json::from_str(&json).ok()?;
    if !value.is_object() {
        return None;
    }
    let raw: RawIngredientAnalysis = serde_json::from_value(value).ok()?;

    let analysis = raw
        .analysis
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NO_ANALYSIS_PROVIDED.to_string());

    Some(IngredientAnalysis {
        health_warnings: raw.health_warnings.into_iter().take(MAX_ANALYSIS_ITEMS).collect(),
        allergens: raw.allergens.into_iter().take(MAX_ANALYSIS_ITEMS).collect(),
        analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutriscan_domain::service::ingredient_keywords::KEYWORD_FALLBACK_ANALYSIS;
    use nutriscan_types::{AiError, NO_INGREDIENTS_ANALYSIS};
    use std::cell::Cell;

    struct ScriptedBackend {
        reply: Option<String>,
        calls: Cell<usize>,
    }

    impl ScriptedBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: Cell::new(0),
            }
        }
    }

    impl AiBackend for ScriptedBackend {
        fn send_prompt(&self, _prompt: &str) -> Result<String, AiError> {
            self.calls.set(self.calls.get() + 1);
            self.reply
                .clone()
                .ok_or_else(|| AiError::RequestFailed("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_absent_text_skips_backend() {
        let backend = ScriptedBackend::replying("{}");
        let analyzer = IngredientAnalyzer::new(&backend);

        for input in [None, Some(""), Some("   "), Some("N/A"), Some("n/a")] {
            let result = analyzer.analyze(input);
            assert_eq!(result, IngredientAnalysis::empty());
            assert_eq!(result.analysis, NO_INGREDIENTS_ANALYSIS);
        }
        assert_eq!(backend.calls.get(), 0);
    }

    #[test]
    fn test_backend_failure_reports_unavailable() {
        let backend = ScriptedBackend::failing();
        let result = IngredientAnalyzer::new(&backend).analyze(Some("sugar, milk"));
        assert!(result.health_warnings.is_empty());
        assert!(result.allergens.is_empty());
        assert_eq!(result.analysis, ANALYSIS_UNAVAILABLE);
        assert!(!result.analysis.contains("connection refused"));
        assert_eq!(backend.calls.get(), 1);
    }

    #[test]
    fn test_fenced_and_bare_json_agree() {
        let bare = r#"{"health_warnings": ["High sugar"], "allergens": ["Milk"], "analysis": "Sweet."}"#;
        let fenced = format!("```json\n{}\n```", bare);

        let from_bare = IngredientAnalyzer::new(&ScriptedBackend::replying(bare)).analyze(Some("sugar"));
        let from_fenced = IngredientAnalyzer::new(&ScriptedBackend::replying(&fenced)).analyze(Some("sugar"));

        assert_eq!(from_bare, from_fenced);
        assert_eq!(from_bare.health_warnings, vec!["High sugar"]);
        assert_eq!(from_bare.allergens, vec!["Milk"]);
        assert_eq!(from_bare.analysis, "Sweet.");
    }

    #[test]
    fn test_lists_capped_at_three() {
        let reply = r#"{"health_warnings": ["a","b","c","d","e"], "allergens": ["w","x","y","z"], "analysis": "ok"}"#;
        let result = parse_ingredient_response(reply).unwrap();
        assert_eq!(result.health_warnings, vec!["a", "b", "c"]);
        assert_eq!(result.allergens, vec!["w", "x", "y"]);
    }

    #[test]
    fn test_missing_fields_default() {
        let result = parse_ingredient_response(r#"{"allergens": ["Soy"]}"#).unwrap();
        assert!(result.health_warnings.is_empty());
        assert_eq!(result.allergens, vec!["Soy"]);
        assert_eq!(result.analysis, NO_ANALYSIS_PROVIDED);
    }

    #[test]
    fn test_null_and_mistyped_fields_kept_structured() {
        let reply = r#"{"health_warnings": ["Contains no artificial colours"], "allergens": null, "analysis": "Free of milk and gluten."}"#;
        let result = IngredientAnalyzer::new(&ScriptedBackend::replying(reply)).analyze(Some("oats, water"));
        assert_eq!(result.health_warnings, vec!["Contains no artificial colours"]);
        assert!(result.allergens.is_empty());
        assert_eq!(result.analysis, "Free of milk and gluten.");

        let result = parse_ingredient_response(r#"{"health_warnings": "none", "allergens": ["Soy", 3, null], "analysis": 7}"#).unwrap();
        assert!(result.health_warnings.is_empty());
        assert_eq!(result.allergens, vec!["Soy"]);
        assert_eq!(result.analysis, NO_ANALYSIS_PROVIDED);
    }

    #[test]
    fn test_failed_request_hides_key() {
        use crate::GeminiBackend;
        let backend = GeminiBackend::new("SECRET_KEY_123".to_string(), "gemini-2.0-flash".to_string(), 3)
            .unwrap()
            .with_base_url("http://127.0.0.1:1/v1beta/models");
        let result = IngredientAnalyzer::new(&backend).analyze(Some("sugar, milk"));
        assert_eq!(result.analysis, ANALYSIS_UNAVAILABLE);
        assert!(!result.analysis.contains("SECRET_KEY_123"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(parse_ingredient_response("[1, 2, 3]").is_none());
        assert!(parse_ingredient_response("nothing useful").is_none());
    }

    #[test]
    fn test_unstructured_reply_uses_keywords() {
        let reply = "This product has high sugar content and contains milk and peanut traces.";
        let result = IngredientAnalyzer::new(&ScriptedBackend::replying(reply)).analyze(Some("sugar, milk, peanuts"));
        assert_eq!(result.analysis, KEYWORD_FALLBACK_ANALYSIS);
        assert_eq!(result.health_warnings, vec!["High Sugar"]);
        assert!(result.allergens.iter().any(|a| a == "Milk"));
        assert!(result.allergens.iter().any(|a| a == "Peanut"));
    }
}
