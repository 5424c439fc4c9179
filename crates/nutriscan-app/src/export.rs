//! Excel export of batch results

use nutriscan_types::{BatchEntry, BatchResults, EntryStatus, Error, NutriGrade, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

const DETAIL_HEADERS: &[&str] = &[
    "File",
    "Status",
    "Barcode",
    "Type",
    "Product",
    "Brands",
    "Grade",
    "Score",
    "Source",
    "Reported Grade",
    "Warnings",
    "Allergens",
    "Message",
];

const DETAIL_WIDTHS: &[f64] = &[30.0, 12.0, 16.0, 8.0, 32.0, 20.0, 7.0, 7.0, 10.0, 10.0, 30.0, 30.0, 40.0];

fn xlsx(e: XlsxError) -> Error {
    Error::Excel(e.to_string())
}

/// Export batch results to an Excel workbook with Summary and Details sheets
pub fn export_to_excel(results: &BatchResults, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    write_summary_sheet(workbook.add_worksheet(), results)?;
    write_details_sheet(workbook.add_worksheet(), results)?;

    workbook.save(output_path).map_err(xlsx)?;
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, results: &BatchResults) -> Result<()> {
    sheet.set_name("Summary").map_err(xlsx)?;
    let bold = Format::new().set_bold();

    sheet
        .write_string_with_format(0, 0, "Nutriscan Batch Report", &bold)
        .map_err(xlsx)?;

    let rows: [(&str, String); 3] = [
        ("Started:", results.started_at.to_rfc3339()),
        ("Completed:", results.completed_at.to_rfc3339()),
        ("Images:", results.total_processed.to_string()),
    ];
    for (i, (label, value)) in rows.iter().enumerate() {
        let row = 2 + i as u32;
        sheet.write_string(row, 0, *label).map_err(xlsx)?;
        sheet.write_string(row, 1, value).map_err(xlsx)?;
    }

    sheet
        .write_string_with_format(6, 0, "Outcome", &bold)
        .map_err(xlsx)?;
    let statuses = [
        EntryStatus::Found,
        EntryStatus::NotFound,
        EntryStatus::NoBarcode,
        EntryStatus::Error,
    ];
    for (i, status) in statuses.iter().enumerate() {
        let row = 7 + i as u32;
        sheet.write_string(row, 0, status.label()).map_err(xlsx)?;
        sheet
            .write_number(row, 1, results.count(*status) as f64)
            .map_err(xlsx)?;
    }

    // Fixed A..E order so empty grades still show
    sheet
        .write_string_with_format(12, 0, "Nutri-Score", &bold)
        .map_err(xlsx)?;
    for (i, grade) in NutriGrade::ALL.iter().enumerate() {
        let row = 13 + i as u32;
        let count = results
            .entries
            .iter()
            .filter(|e| entry_grade(e) == Some(*grade))
            .count();
        sheet.write_string(row, 0, grade.to_string()).map_err(xlsx)?;
        sheet.write_number(row, 1, count as f64).map_err(xlsx)?;
    }

    sheet.set_column_width(0, 16).map_err(xlsx)?;
    sheet.set_column_width(1, 28).map_err(xlsx)?;
    Ok(())
}

fn entry_grade(entry: &BatchEntry) -> Option<NutriGrade> {
    entry.report.as_ref().and_then(|r| r.nutriscore.grade)
}

fn write_details_sheet(sheet: &mut Worksheet, results: &BatchResults) -> Result<()> {
    sheet.set_name("Details").map_err(xlsx)?;
    let bold = Format::new().set_bold();

    for (col, header) in DETAIL_HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(xlsx)?;
    }

    for (idx, entry) in results.entries.iter().enumerate() {
        let row = (idx + 1) as u32;

        let filename = Path::new(&entry.image_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&entry.image_path);
        sheet.write_string(row, 0, filename).map_err(xlsx)?;
        sheet.write_string(row, 1, entry.status.label()).map_err(xlsx)?;

        if let Some(report) = &entry.report {
            let texts = [
                (2, report.barcode.as_str()),
                (3, report.barcode_type.as_str()),
                (4, report.product_name.as_str()),
                (5, report.brands.as_str()),
                (8, report.nutriscore.source.label()),
                (9, report.reported_nutriscore_grade.as_deref().unwrap_or("")),
            ];
            for (col, text) in texts {
                sheet.write_string(row, col, text).map_err(xlsx)?;
            }

            if let Some(grade) = report.nutriscore.grade {
                sheet.write_string(row, 6, grade.to_string()).map_err(xlsx)?;
                sheet
                    .write_number(row, 7, report.nutriscore.score as f64)
                    .map_err(xlsx)?;
            }

            let analysis = &report.ingredient_analysis;
            sheet
                .write_string(row, 10, analysis.health_warnings.join(", "))
                .map_err(xlsx)?;
            sheet
                .write_string(row, 11, analysis.allergens.join(", "))
                .map_err(xlsx)?;
        }

        if let Some(message) = &entry.message {
            sheet.write_string(row, 12, message).map_err(xlsx)?;
        }
    }

    for (col, width) in DETAIL_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width).map_err(xlsx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nutriscan_types::{
        IngredientAnalysis, NutriScoreResult, NutrientSet, ProductReport, ScoreSource,
    };
    use tempfile::tempdir;

    fn report(grade: NutriGrade) -> ProductReport {
        ProductReport {
            barcode: "4006381333931".to_string(),
            barcode_type: "EAN13".to_string(),
            product_name: "Pencil Mints".to_string(),
            brands: "Stabilo".to_string(),
            quantity: "N/A".to_string(),
            ingredients_text: "sugar".to_string(),
            reported_nutriscore_grade: None,
            nutrients: NutrientSet::default(),
            nutriscore: NutriScoreResult {
                grade: Some(grade),
                score: 12,
                source: ScoreSource::Computed,
                details: String::new(),
            },
            ingredient_analysis: IngredientAnalysis {
                health_warnings: vec!["High Sugar".to_string()],
                allergens: vec![],
                analysis: "ok".to_string(),
            },
            scanned_at: Utc::now(),
        }
    }

    #[test]
    fn test_export_writes_workbook() {
        let now = Utc::now();
        let results = BatchResults {
            entries: vec![
                BatchEntry {
                    image_path: "/tmp/a.png".to_string(),
                    status: EntryStatus::Found,
                    report: Some(report(NutriGrade::D)),
                    message: None,
                },
                BatchEntry {
                    image_path: "/tmp/b.png".to_string(),
                    status: EntryStatus::NoBarcode,
                    report: None,
                    message: Some("No barcode found in image".to_string()),
                },
            ],
            total_processed: 2,
            successful: 1,
            failed: 1,
            started_at: now,
            completed_at: now,
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        export_to_excel(&results, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container
        assert!(bytes.starts_with(b"PK"));
    }
}
