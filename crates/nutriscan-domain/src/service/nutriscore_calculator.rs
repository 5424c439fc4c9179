//! Deterministic Nutri-Score computation from per-100g values

use nutriscan_types::{NutriGrade, NutriScoreResult, NutrientSet, ScoreSource};

/// Anything able to turn a nutrient set into a Nutri-Score without outside help
pub trait NutriScoreCalculator {
    fn calculate(&self, nutrients: &NutrientSet) -> NutriScoreResult;
}

/// The breakpoint table in `calculate_simple_nutriscore`
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleNutriScore;

impl NutriScoreCalculator for SimpleNutriScore {
    fn calculate(&self, nutrients: &NutrientSet) -> NutriScoreResult {
        calculate_simple_nutriscore(nutrients)
    }
}

/// Per-component points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NutriScorePoints {
    pub energy: i32,
    pub saturated_fat: i32,
    pub sugars: i32,
    pub sodium: i32,
    pub fiber: i32,
    pub protein: i32,
}

impl NutriScorePoints {
    pub fn from_nutrients(n: &NutrientSet) -> Self {
        Self {
            energy: points(n.energy_kcal, 80.0, 67.0, 10),
            saturated_fat: points(n.saturated_fat_g, 1.0, 1.0, 10),
            sugars: points(n.sugars_g, 4.5, 2.7, 15),
            sodium: points(n.sodium_mg(), 90.0, 45.0, 20),
            fiber: points(n.fiber_g, 0.9, 0.95, 5),
            protein: points(n.proteins_g, 1.6, 1.28, 5),
        }
    }

    pub fn negative(&self) -> i32 {
        self.energy + self.saturated_fat + self.sugars + self.sodium
    }

    pub fn positive(&self) -> i32 {
        self.fiber + self.protein
    }

    pub fn score(&self) -> i32 {
        self.negative() - self.positive()
    }
}

/// `clamp(0, max, floor((value - threshold) / step))`
fn points(value: f64, threshold: f64, step: f64, max: i32) -> i32 {
    ((value - threshold) / step).floor().clamp(0.0, max as f64) as i32
}

pub fn calculate_simple_nutriscore(nutrients: &NutrientSet) -> NutriScoreResult {
    if !nutrients.is_well_formed() {
        return NutriScoreResult::failed("Nutrient values are not numeric; no score computed");
    }

    let pts = NutriScorePoints::from_nutrients(nutrients);
    let score = pts.score();

    NutriScoreResult {
        grade: Some(NutriGrade::from_score(score)),
        score,
        source: ScoreSource::Computed,
        details: format!(
            "Computed from nutrient values: negative {} (energy {}, saturated fat {}, sugars {}, sodium {}), positive {} (fiber {}, protein {})",
            pts.negative(),
            pts.energy,
            pts.saturated_fat,
            pts.sugars,
            pts.sodium,
            pts.positive(),
            pts.fiber,
            pts.protein,
        ),
    }
}
