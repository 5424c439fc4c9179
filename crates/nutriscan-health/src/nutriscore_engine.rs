//! Nutri-Score: model first, deterministic calculator as fallback

use crate::ai::prompts::build_nutriscore_prompt;
use crate::ai::AiBackend;
use crate::json_extract::extract_balanced_object;
use nutriscan_domain::service::NutriScoreCalculator;
use nutriscan_types::{AiError, NutriGrade, NutriScoreResult, NutrientSet, ScoreSource};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const DEFAULT_MODEL_DETAILS: &str = "Nutri-Score estimated by language model";

pub struct NutriScoreEngine<'a> {
    backend: &'a dyn AiBackend,
    fallback: &'a dyn NutriScoreCalculator,
}

impl<'a> NutriScoreEngine<'a> {
    pub fn new(backend: &'a dyn AiBackend, fallback: &'a dyn NutriScoreCalculator) -> Self {
        Self { backend, fallback }
    }

    /// Always returns a result. The fallback runs at most once, and only when
    /// the model path produced nothing usable.
    pub fn score(&self, product_name: &str, nutrients: &NutrientSet) -> NutriScoreResult {
        if !nutrients.is_well_formed() {
            return self.fallback.calculate(nutrients);
        }

        match self.model_score(product_name, nutrients) {
            Ok(result) => {
                debug!(backend = self.backend.name(), grade = ?result.grade, "model Nutri-Score accepted");
                result
            }
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "model Nutri-Score rejected, computing locally");
                self.fallback.calculate(nutrients)
            }
        }
    }

    fn model_score(&self, product_name: &str, nutrients: &NutrientSet) -> Result<NutriScoreResult, AiError> {
        let prompt = build_nutriscore_prompt(product_name, nutrients);
        let response = self.backend.send_prompt(&prompt)?;
        parse_model_nutriscore(&response)
    }
}

/// Validate a model reply.
///
/// Needs a JSON object with `nutriscore_grade` in A–E (any case, surrounding
/// whitespace ignored). The score is read from `nutriscore_score` or `score`
/// and defaults to 0.
pub fn parse_model_nutriscore(response: &str) -> Result<NutriScoreResult, AiError> {
    let span = extract_balanced_object(response)
        .ok_or_else(|| AiError::MalformedOutput("no JSON object in response".to_string()))?;

    let value: Value =
        serde_json::from_str(span).map_err(|e| AiError::MalformedOutput(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| AiError::MalformedOutput("response is not a JSON object".to_string()))?;

    let raw_grade = obj
        .get("nutriscore_grade")
        .and_then(Value::as_str)
        .ok_or_else(|| AiError::MalformedOutput("missing nutriscore_grade".to_string()))?;
    let grade = NutriGrade::from_letter(raw_grade)
        .ok_or_else(|| AiError::MalformedOutput(format!("invalid grade {:?}", raw_grade)))?;

    let details = ["explanation", "details"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_MODEL_DETAILS)
        .to_string();

    Ok(NutriScoreResult {
        grade: Some(grade),
        score: read_score(obj),
        source: ScoreSource::Model,
        details,
    })
}

fn read_score(obj: &Map<String, Value>) -> i32 {
    let value = obj.get("nutriscore_score").or_else(|| obj.get("score"));
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .map(|n| n.round() as i32)
        .unwrap_or(0)
}
