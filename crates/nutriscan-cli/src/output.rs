//! Output formatting module

use nutriscan_app::app::{ScanEnvelope, ScanOutcome};
use nutriscan_domain::service::NutriScorePoints;
use nutriscan_types::{NutriScoreResult, OutputFormat, ProductReport, Result, NOT_AVAILABLE};
use nutriscan_vision::BarcodeDetection;
use serde_json::json;

pub fn output_outcome(output_format: OutputFormat, outcome: ScanOutcome) -> Result<()> {
    if output_format == OutputFormat::Json {
        let envelope = ScanEnvelope::from_result(Ok(outcome));
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    match outcome {
        ScanOutcome::Found(report) => print_report(&report),
        ScanOutcome::NoBarcodeFound => {
            println!("\nNo barcode found");
            println!("================");
            println!("No readable barcode with enough digits was found in the image.");
        }
        ScanOutcome::ProductNotFound { barcode } => {
            println!("\nProduct not found");
            println!("=================");
            println!("Barcode {} is not in the nutrition database.", barcode);
        }
    }
    Ok(())
}

fn print_report(report: &ProductReport) {
    println!("\nProduct Report");
    println!("==============");
    println!("Barcode:         {} ({})", report.barcode, report.barcode_type);
    println!("Product:         {}", report.product_name);
    println!("Brands:          {}", report.brands);
    println!("Quantity:        {}", report.quantity);

    let n = &report.nutrients;
    println!("\n--- Per 100 g ---");
    println!("Energy:          {:.0} kJ / {:.0} kcal", n.energy_kj, n.energy_kcal);
    println!("Fat:             {:.1} g (saturated {:.1} g)", n.fat_g, n.saturated_fat_g);
    println!("Carbohydrates:   {:.1} g (sugars {:.1} g)", n.carbohydrates_g, n.sugars_g);
    println!("Fiber:           {:.1} g", n.fiber_g);
    println!("Protein:         {:.1} g", n.proteins_g);
    println!("Salt:            {:.2} g (sodium {:.0} mg)", n.salt_g, n.sodium_mg());
    println!("-----------------");

    print_nutriscore(&report.nutriscore);
    if let Some(ref reported) = report.reported_nutriscore_grade {
        println!("Database grade:  {}", reported.to_uppercase());
    }

    let analysis = &report.ingredient_analysis;
    println!("\nIngredients:");
    println!("{}", report.ingredients_text);
    println!("\nHealth warnings: {}", join_or_none(&analysis.health_warnings));
    println!("Allergens:       {}", join_or_none(&analysis.allergens));
    println!("\n{}", analysis.analysis);
}

fn print_nutriscore(result: &NutriScoreResult) {
    match result.grade {
        Some(grade) => println!(
            "\nNutri-Score:     {} (score {}, {})",
            grade,
            result.score,
            result.source.label()
        ),
        None => println!("\nNutri-Score:     {} ({})", NOT_AVAILABLE, result.source.label()),
    }
    println!("Details:         {}", result.details);
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

pub fn output_envelope(envelope: &ScanEnvelope) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

pub fn output_detection(output_format: OutputFormat, detection: &BarcodeDetection) -> Result<()> {
    if output_format == OutputFormat::Json {
        let value = json!({
            "candidates": detection.candidates,
            "ranked": detection.ranked,
            "selected": detection.winner(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\nDecoded Symbols");
    println!("===============");
    if detection.candidates.is_empty() {
        println!("(none)");
    }
    for c in &detection.candidates {
        println!("{:<20} {:<8} {}", c.variant.label(), c.symbol_type, c.raw_value);
    }

    println!("\nRanked Barcodes");
    println!("===============");
    for (i, c) in detection.ranked.iter().enumerate() {
        println!("{:>2}. {:<16} {}", i + 1, c.digits, c.symbol_type);
    }

    match detection.winner() {
        Some(w) => println!("\nSelected: {} ({})", w.digits, w.symbol_type),
        None => println!("\nNo barcode selected"),
    }
    Ok(())
}

pub fn output_score(
    output_format: OutputFormat,
    result: &NutriScoreResult,
    points: &NutriScorePoints,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        let value = json!({
            "grade": result.grade,
            "score": result.score,
            "source": result.source,
            "details": result.details,
            "points": {
                "energy": points.energy,
                "saturated_fat": points.saturated_fat,
                "sugars": points.sugars,
                "sodium": points.sodium,
                "fiber": points.fiber,
                "protein": points.protein,
            },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\nNutri-Score");
    println!("===========");
    println!("Energy:          {:>3}", points.energy);
    println!("Saturated fat:   {:>3}", points.saturated_fat);
    println!("Sugars:          {:>3}", points.sugars);
    println!("Sodium:          {:>3}", points.sodium);
    println!("Fiber:           {:>3}", -points.fiber);
    println!("Protein:         {:>3}", -points.protein);
    println!("-----------------");
    print_nutriscore(result);
    Ok(())
}
