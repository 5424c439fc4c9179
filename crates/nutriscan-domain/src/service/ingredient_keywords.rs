//! Keyword matching over free text, used when model output has no usable structure

use nutriscan_types::{IngredientAnalysis, MAX_ANALYSIS_ITEMS};

pub const HEALTH_WARNING_TERMS: &[&str] = &[
    "palm oil",
    "high sodium",
    "artificial",
    "preservative",
    "msg",
    "trans fat",
    "high sugar",
    "processed",
];

pub const ALLERGEN_TERMS: &[&str] = &[
    "wheat",
    "gluten",
    "soy",
    "milk",
    "egg",
    "peanut",
    "tree nut",
    "fish",
    "shellfish",
    "sesame",
];

pub const KEYWORD_FALLBACK_ANALYSIS: &str =
    "Analysis extracted from an unstructured model response (best effort).";

/// Upper-case the first letter of every whitespace-separated word
pub fn title_case(term: &str) -> String {
    term.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn matching_terms(haystack: &str, terms: &[&str]) -> Vec<String> {
    terms
        .iter()
        .filter(|term| haystack.contains(*term))
        .take(MAX_ANALYSIS_ITEMS)
        .map(|term| title_case(term))
        .collect()
}

/// Substring search of both term lists over the lower-cased text
pub fn keyword_analysis(text: &str) -> IngredientAnalysis {
    let haystack = text.to_lowercase();
    IngredientAnalysis {
        health_warnings: matching_terms(&haystack, HEALTH_WARNING_TERMS),
        allergens: matching_terms(&haystack, ALLERGEN_TERMS),
        analysis: KEYWORD_FALLBACK_ANALYSIS.to_string(),
    }
}
