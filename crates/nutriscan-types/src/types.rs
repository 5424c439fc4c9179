//! Data model shared by the scanning and assessment crates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel used for any text field the nutrition record does not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// Minimum number of digits a cleaned candidate needs to be considered a barcode
pub const DEFAULT_MIN_BARCODE_DIGITS: usize = 8;

/// Sodium mass per gram of salt
pub const DEFAULT_SALT_TO_SODIUM_FACTOR: f64 = 0.4;

/// Kilojoules per kilocalorie
pub const KCAL_TO_KJ: f64 = 4.184;

/// Cap applied to warning and allergen lists
pub const MAX_ANALYSIS_ITEMS: usize = 3;

// ============================================================================
// Barcode candidates
// ============================================================================

/// Which rendering of the input image a candidate was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Grayscale,
    AdaptiveThreshold,
    Blurred,
    Inverted,
}

impl VariantKind {
    pub fn label(&self) -> &'static str {
        match self {
            VariantKind::Grayscale => "grayscale",
            VariantKind::AdaptiveThreshold => "adaptive_threshold",
            VariantKind::Blurred => "blurred",
            VariantKind::Inverted => "inverted",
        }
    }
}

/// Decoder output before any cleaning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeCandidate {
    /// Exact decoder payload
    pub raw_value: String,
    /// Symbology tag reported by the decoder (e.g. "EAN13", "QRCODE")
    pub symbol_type: String,
    pub variant: VariantKind,
}

/// Candidate reduced to its numeric content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanCandidate {
    pub digits: String,
    pub symbol_type: String,
}

// ============================================================================
// Nutrition
// ============================================================================

/// Canonical per-100g nutrient values.
///
/// Energy is carried in both kJ and kcal, masses in grams. `sodium_g` is always
/// sodium-equivalent, derived from salt when the source lacks a sodium value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientSet {
    pub energy_kj: f64,
    pub energy_kcal: f64,
    pub fat_g: f64,
    pub saturated_fat_g: f64,
    pub sugars_g: f64,
    pub carbohydrates_g: f64,
    pub fiber_g: f64,
    pub proteins_g: f64,
    pub salt_g: f64,
    pub sodium_g: f64,
}

impl NutrientSet {
    pub fn sodium_mg(&self) -> f64 {
        self.sodium_g * 1000.0
    }

    /// True when every value is a finite number
    pub fn is_well_formed(&self) -> bool {
        [
            self.energy_kj,
            self.energy_kcal,
            self.fat_g,
            self.saturated_fat_g,
            self.sugars_g,
            self.carbohydrates_g,
            self.fiber_g,
            self.proteins_g,
            self.salt_g,
            self.sodium_g,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Nutri-Score letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutriGrade {
    A,
    B,
    C,
    D,
    E,
}

impl NutriGrade {
    pub const ALL: [NutriGrade; 5] = [
        NutriGrade::A,
        NutriGrade::B,
        NutriGrade::C,
        NutriGrade::D,
        NutriGrade::E,
    ];

    /// Parse a single letter, case-insensitively. Surrounding whitespace is ignored.
    pub fn from_letter(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Some(NutriGrade::A),
            "b" => Some(NutriGrade::B),
            "c" => Some(NutriGrade::C),
            "d" => Some(NutriGrade::D),
            "e" => Some(NutriGrade::E),
            _ => None,
        }
    }

    /// Grade thresholds for the computed score
    pub fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=-1 => NutriGrade::A,
            0..=2 => NutriGrade::B,
            3..=10 => NutriGrade::C,
            11..=18 => NutriGrade::D,
            _ => NutriGrade::E,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NutriGrade::A => "a",
            NutriGrade::B => "b",
            NutriGrade::C => "c",
            NutriGrade::D => "d",
            NutriGrade::E => "e",
        }
    }
}

impl std::fmt::Display for NutriGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_ascii_uppercase())
    }
}

/// Where a Nutri-Score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Model,
    Computed,
    Failed,
}

impl ScoreSource {
    pub fn label(&self) -> &'static str {
        match self {
            ScoreSource::Model => "model",
            ScoreSource::Computed => "computed",
            ScoreSource::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutriScoreResult {
    /// None only when `source` is `Failed`
    pub grade: Option<NutriGrade>,
    pub score: i32,
    pub source: ScoreSource,
    pub details: String,
}

impl NutriScoreResult {
    pub fn failed(details: impl Into<String>) -> Self {
        Self {
            grade: None,
            score: 0,
            source: ScoreSource::Failed,
            details: details.into(),
        }
    }
}

// ============================================================================
// Ingredients
// ============================================================================

pub const NO_INGREDIENTS_ANALYSIS: &str = "No ingredient information available.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAnalysis {
    pub health_warnings: Vec<String>,
    pub allergens: Vec<String>,
    pub analysis: String,
}

impl IngredientAnalysis {
    /// Result used when a product has no ingredient text
    pub fn empty() -> Self {
        Self::unavailable(NO_INGREDIENTS_ANALYSIS)
    }

    /// Empty lists with an explanatory summary
    pub fn unavailable(analysis: impl Into<String>) -> Self {
        Self {
            health_warnings: Vec::new(),
            allergens: Vec::new(),
            analysis: analysis.into(),
        }
    }
}

impl Default for IngredientAnalysis {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Everything known about one scanned product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReport {
    pub barcode: String,
    pub barcode_type: String,
    pub product_name: String,
    pub brands: String,
    pub quantity: String,
    pub ingredients_text: String,
    /// Grade published by the nutrition database, if any
    #[serde(default)]
    pub reported_nutriscore_grade: Option<String>,
    pub nutrients: NutrientSet,
    pub nutriscore: NutriScoreResult,
    pub ingredient_analysis: IngredientAnalysis,
    pub scanned_at: DateTime<Utc>,
}

/// Outcome of one image in a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Found,
    NoBarcode,
    NotFound,
    Error,
}

impl EntryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EntryStatus::Found => "found",
            EntryStatus::NoBarcode => "no barcode",
            EntryStatus::NotFound => "not found",
            EntryStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub image_path: String,
    pub status: EntryStatus,
    #[serde(default)]
    pub report: Option<ProductReport>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    pub entries: Vec<BatchEntry>,
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl BatchResults {
    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_from_letter_case_insensitive() {
        assert_eq!(NutriGrade::from_letter("A"), Some(NutriGrade::A));
        assert_eq!(NutriGrade::from_letter(" e "), Some(NutriGrade::E));
        assert_eq!(NutriGrade::from_letter("F"), None);
        assert_eq!(NutriGrade::from_letter("AB"), None);
        assert_eq!(NutriGrade::from_letter(""), None);
    }

    #[test]
    fn test_grade_from_score_boundaries() {
        assert_eq!(NutriGrade::from_score(-15), NutriGrade::A);
        assert_eq!(NutriGrade::from_score(-1), NutriGrade::A);
        assert_eq!(NutriGrade::from_score(0), NutriGrade::B);
        assert_eq!(NutriGrade::from_score(2), NutriGrade::B);
        assert_eq!(NutriGrade::from_score(3), NutriGrade::C);
        assert_eq!(NutriGrade::from_score(10), NutriGrade::C);
        assert_eq!(NutriGrade::from_score(11), NutriGrade::D);
        assert_eq!(NutriGrade::from_score(18), NutriGrade::D);
        assert_eq!(NutriGrade::from_score(19), NutriGrade::E);
    }

    #[test]
    fn test_grade_serializes_lowercase() {
        let json = serde_json::to_string(&NutriGrade::C).unwrap();
        assert_eq!(json, "\"c\"");
        assert_eq!(NutriGrade::C.to_string(), "C");
    }

    #[test]
    fn test_nutrient_set_well_formed() {
        let mut set = NutrientSet::default();
        assert!(set.is_well_formed());
        set.sugars_g = f64::NAN;
        assert!(!set.is_well_formed());
    }

    #[test]
    fn test_empty_ingredient_analysis() {
        let empty = IngredientAnalysis::default();
        assert!(empty.health_warnings.is_empty());
        assert!(empty.allergens.is_empty());
        assert_eq!(empty.analysis, NO_INGREDIENTS_ANALYSIS);
    }
}
