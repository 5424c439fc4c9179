//! Maps heterogeneous nutriment records onto the canonical nutrient set

use nutriscan_types::{NutrientSet, DEFAULT_SALT_TO_SODIUM_FACTOR, KCAL_TO_KJ};
use serde_json::{Map, Value};

/// Unit conversion parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizerConfig {
    pub salt_to_sodium_factor: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            salt_to_sodium_factor: DEFAULT_SALT_TO_SODIUM_FACTOR,
        }
    }
}

/// Read a nutriment as a number. Numeric strings are accepted; anything else is absent.
fn read_value(nutriments: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match nutriments.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

pub fn normalize_nutrients(nutriments: &Map<String, Value>, config: &NormalizerConfig) -> NutrientSet {
    let get = |key: &str| read_value(nutriments, key);

    // energy_100g is reported in kJ by the database
    let kj_source = get("energy-kj_100g").or_else(|| get("energy_100g"));
    let kcal_source = get("energy-kcal_100g");

    let (energy_kj, energy_kcal) = match (kj_source, kcal_source) {
        (Some(kj), Some(kcal)) => (kj, kcal),
        (Some(kj), None) => (kj, kj / KCAL_TO_KJ),
        (None, Some(kcal)) => (kcal * KCAL_TO_KJ, kcal),
        (None, None) => (0.0, 0.0),
    };

    let salt = get("salt_100g");
    let sodium = get("sodium_100g");
    let sodium_g = match (sodium, salt) {
        (Some(na), _) => na,
        (None, Some(salt)) => salt * config.salt_to_sodium_factor,
        (None, None) => 0.0,
    };

    NutrientSet {
        energy_kj,
        energy_kcal,
        fat_g: get("fat_100g").unwrap_or(0.0),
        saturated_fat_g: get("saturated-fat_100g").unwrap_or(0.0),
        sugars_g: get("sugars_100g").unwrap_or(0.0),
        carbohydrates_g: get("carbohydrates_100g").unwrap_or(0.0),
        fiber_g: get("fiber_100g").unwrap_or(0.0),
        proteins_g: get("proteins_100g").unwrap_or(0.0),
        salt_g: salt.unwrap_or(0.0),
        sodium_g,
    }
}
