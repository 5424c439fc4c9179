//! Prompts for the text-generation backend
//!
//! Both prompts ask for a bare JSON object and spell out the exact keys. The
//! JSON templates use placeholders rather than example values so the model
//! does not echo them back.

use nutriscan_types::{NutrientSet, MAX_ANALYSIS_ITEMS};

/// Word limit for the ingredient summary
pub const ANALYSIS_WORD_LIMIT: usize = 50;

/// Shared scoring rubric, kept in sync with the deterministic calculator
const NUTRISCORE_RUBRIC: &str = concat!(
    "Scoring rubric (per 100 g):\n",
    "- Energy points 0-10: floor((kcal - 80) / 67)\n",
    "- Saturated fat points 0-10: floor((g - 1) / 1)\n",
    "- Sugar points 0-15: floor((g - 4.5) / 2.7)\n",
    "- Sodium points 0-20: floor((mg - 90) / 45)\n",
    "- Fiber points 0-5: floor((g - 0.9) / 0.95)\n",
    "- Protein points 0-5: floor((g - 1.6) / 1.28)\n",
    "- Score = (energy + saturated fat + sugar + sodium) - (fiber + protein)\n",
    "- Grade: A if score <= -1, B if <= 2, C if <= 10, D if <= 18, otherwise E\n",
);

pub fn build_nutriscore_prompt(product_name: &str, nutrients: &NutrientSet) -> String {
    format!(
        concat!(
            "You are a nutrition expert. Calculate the Nutri-Score of the product below ",
            "from its per-100g nutrient values.\n\n",
            "Product: {name}\n",
            "Energy: {kj:.1} kJ ({kcal:.1} kcal)\n",
            "Saturated fat: {sat:.2} g\n",
            "Sugars: {sugars:.2} g\n",
            "Sodium: {sodium:.0} mg\n",
            "Fiber: {fiber:.2} g\n",
            "Protein: {protein:.2} g\n\n",
            "{rubric}\n",
            "Respond with only this JSON object and nothing else:\n",
            "{{\"nutriscore_grade\": \"<one letter A-E>\", ",
            "\"nutriscore_score\": <integer score>, ",
            "\"explanation\": \"<one or two sentences>\"}}"
        ),
        name = product_name,
        kj = nutrients.energy_kj,
        kcal = nutrients.energy_kcal,
        sat = nutrients.saturated_fat_g,
        sugars = nutrients.sugars_g,
        sodium = nutrients.sodium_mg(),
        fiber = nutrients.fiber_g,
        protein = nutrients.proteins_g,
        rubric = NUTRISCORE_RUBRIC,
    )
}

pub fn build_ingredient_prompt(ingredients_text: &str) -> String {
    format!(
        concat!(
            "Analyze these food ingredients for health concerns and allergens.\n\n",
            "Ingredients: {ingredients}\n\n",
            "Return only a JSON object with exactly these three keys:\n",
            "{{\"health_warnings\": [\"<at most {max} short warnings>\"], ",
            "\"allergens\": [\"<at most {max} allergens>\"], ",
            "\"analysis\": \"<summary of at most {words} words>\"}}\n",
            "Do not add any text before or after the JSON."
        ),
        ingredients = ingredients_text,
        max = MAX_ANALYSIS_ITEMS,
        words = ANALYSIS_WORD_LIMIT,
    )
}
