//! Domain services

pub mod ingredient_keywords;
pub mod nutrient_normalizer;
pub mod nutriscore_calculator;

pub use ingredient_keywords::{keyword_analysis, title_case, ALLERGEN_TERMS, HEALTH_WARNING_TERMS};
pub use nutrient_normalizer::{normalize_nutrients, NormalizerConfig};
pub use nutriscore_calculator::{
    calculate_simple_nutriscore, NutriScoreCalculator, NutriScorePoints, SimpleNutriScore,
};
