//! Scan Service - barcode image to product health report
//!
//! Workflow:
//! 1. Render preprocessing variants and decode every one
//! 2. Clean and rank candidates, pick the winning barcode
//! 3. Fetch the nutrition record for that barcode
//! 4. Normalize nutrients to the canonical per-100g set
//! 5. Nutri-Score (model first, local calculator as fallback)
//! 6. Ingredient analysis (model first, keyword matching as fallback)
//!
//! Only an unreadable image or a failed lookup is an error. A miss at step 2
//! or 3 is a normal outcome, and steps 5 and 6 never fail.

use crate::config::Config;
use crate::scanner::load_image;
use chrono::Utc;
use image::DynamicImage;
use nutriscan_domain::model::ProductRecord;
use nutriscan_domain::repository::NutritionLookup;
use nutriscan_domain::service::{normalize_nutrients, NormalizerConfig, NutriScoreCalculator, SimpleNutriScore};
use nutriscan_health::{build_backend, AiBackend, IngredientAnalyzer, NutriScoreEngine};
use nutriscan_infra::OpenFoodFactsClient;
use nutriscan_types::{
    BatchEntry, EntryStatus, LookupError, ProductReport, ScanError, DEFAULT_MIN_BARCODE_DIGITS,
};
use nutriscan_vision::{detect_barcode, CompositeDecoder, SymbolDecoder};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{info, warn};

/// Symbol type recorded when the barcode was typed in rather than decoded
pub const MANUAL_SYMBOL_TYPE: &str = "MANUAL";

pub type ProgressCallback = Box<dyn Fn(&str) + Send>;

/// The external capabilities a scan needs, injected by the caller
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub decoder: &'a dyn SymbolDecoder,
    pub lookup: &'a dyn NutritionLookup,
    pub ai: &'a dyn AiBackend,
    pub calculator: &'a dyn NutriScoreCalculator,
}

/// Production collaborators built from [`Config`]
pub struct DefaultCollaborators {
    decoder: CompositeDecoder,
    lookup: OpenFoodFactsClient,
    ai: Box<dyn AiBackend>,
    calculator: SimpleNutriScore,
}

impl DefaultCollaborators {
    pub fn from_config(config: &Config) -> Result<Self, ScanError> {
        let lookup = OpenFoodFactsClient::new(&config.lookup_base_url, config.lookup_timeout_secs)
            .map_err(|e| ScanError::LookupTransport(e.to_string()))?;

        Ok(Self {
            decoder: CompositeDecoder::default(),
            lookup,
            ai: build_backend(&config.generator_config()),
            calculator: SimpleNutriScore,
        })
    }

    pub fn as_collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            decoder: &self.decoder,
            lookup: &self.lookup,
            ai: self.ai.as_ref(),
            calculator: &self.calculator,
        }
    }
}

/// Tunables for one scan
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub min_barcode_digits: usize,
    pub normalizer: NormalizerConfig,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            min_barcode_digits: DEFAULT_MIN_BARCODE_DIGITS,
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_barcode_digits: config.min_barcode_digits,
            normalizer: config.normalizer_config(),
        }
    }

    pub fn with_min_barcode_digits(mut self, digits: usize) -> Self {
        self.min_barcode_digits = digits.max(1);
        self
    }

    pub fn with_salt_to_sodium_factor(mut self, factor: f64) -> Self {
        self.normalizer.salt_to_sodium_factor = factor;
        self
    }
}

/// Non-error results of a scan
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Found(ProductReport),
    NoBarcodeFound,
    ProductNotFound { barcode: String },
}

/// Serializable result for a web or JSON front end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanEnvelope {
    Found { product: Box<ProductReport> },
    NotFound {
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        barcode: Option<String>,
    },
    Error { message: String },
}

pub const GENERIC_ERROR_MESSAGE: &str = "The image could not be processed.";

impl ScanEnvelope {
    /// Details of an error are logged, never exposed
    pub fn from_result(result: Result<ScanOutcome, ScanError>) -> Self {
        match result {
            Ok(ScanOutcome::Found(report)) => ScanEnvelope::Found {
                product: Box::new(report),
            },
            Ok(ScanOutcome::NoBarcodeFound) => ScanEnvelope::NotFound {
                reason: "No barcode found in image".to_string(),
                barcode: None,
            },
            Ok(ScanOutcome::ProductNotFound { barcode }) => ScanEnvelope::NotFound {
                reason: format!("Product {} not found in nutrition database", barcode),
                barcode: Some(barcode),
            },
            Err(e) => {
                warn!(error = %e, "scan failed");
                ScanEnvelope::Error {
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                }
            }
        }
    }
}

/// Scan one decoded image
pub fn scan_product(
    image: &DynamicImage,
    collaborators: Collaborators<'_>,
    options: &ScanOptions,
) -> Result<ScanOutcome, ScanError> {
    scan_product_with_progress(image, collaborators, options, None)
}

pub fn scan_product_with_progress(
    image: &DynamicImage,
    collaborators: Collaborators<'_>,
    options: &ScanOptions,
    progress: Option<ProgressCallback>,
) -> Result<ScanOutcome, ScanError> {
    let notify = |msg: &str| {
        if let Some(ref cb) = progress {
            cb(msg);
        }
    };

    notify("Detecting barcode...");
    let detection = detect_barcode(image, collaborators.decoder, options.min_barcode_digits)?;

    let Some(winner) = detection.winner() else {
        return Ok(ScanOutcome::NoBarcodeFound);
    };
    notify(&format!("Found {} barcode {}", winner.symbol_type, winner.digits));

    assess(&winner.digits, &winner.symbol_type, collaborators, options, &notify)
}

/// Skip imaging: look up a barcode directly and assess it
pub fn lookup_product(
    barcode: &str,
    collaborators: Collaborators<'_>,
    options: &ScanOptions,
) -> Result<ScanOutcome, ScanError> {
    let digits: String = barcode.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Ok(ScanOutcome::ProductNotFound {
            barcode: barcode.to_string(),
        });
    }
    assess(&digits, MANUAL_SYMBOL_TYPE, collaborators, options, &|_: &str| {})
}

fn assess(
    barcode: &str,
    symbol_type: &str,
    collaborators: Collaborators<'_>,
    options: &ScanOptions,
    notify: &dyn Fn(&str),
) -> Result<ScanOutcome, ScanError> {
    notify("Fetching nutrition record...");
    let response = match collaborators.lookup.fetch_product(barcode) {
        Ok(response) => response,
        Err(LookupError::NotFound(_)) => {
            info!(barcode, "product not in nutrition database");
            return Ok(ScanOutcome::ProductNotFound {
                barcode: barcode.to_string(),
            });
        }
        Err(e) => return Err(ScanError::LookupTransport(e.to_string())),
    };

    if !response.is_found() {
        info!(barcode, status = %response.status, "lookup reported no product");
        return Ok(ScanOutcome::ProductNotFound {
            barcode: barcode.to_string(),
        });
    }
    let Some(product) = response.product else {
        return Ok(ScanOutcome::ProductNotFound {
            barcode: barcode.to_string(),
        });
    };

    Ok(ScanOutcome::Found(build_report(
        barcode,
        symbol_type,
        &product,
        collaborators,
        options,
        notify,
    )))
}

fn build_report(
    barcode: &str,
    symbol_type: &str,
    product: &ProductRecord,
    collaborators: Collaborators<'_>,
    options: &ScanOptions,
    notify: &dyn Fn(&str),
) -> ProductReport {
    let nutrients = normalize_nutrients(&product.nutriments, &options.normalizer);

    notify("Scoring Nutri-Score...");
    let nutriscore = NutriScoreEngine::new(collaborators.ai, collaborators.calculator)
        .score(product.product_name(), &nutrients);

    notify("Analyzing ingredients...");
    let ingredients_text = product.ingredients_text();
    let ingredient_analysis = IngredientAnalyzer::new(collaborators.ai).analyze(Some(ingredients_text));

    info!(
        barcode,
        grade = ?nutriscore.grade,
        source = nutriscore.source.label(),
        "report complete"
    );

    ProductReport {
        barcode: barcode.to_string(),
        barcode_type: symbol_type.to_string(),
        product_name: product.product_name().to_string(),
        brands: product.brands().to_string(),
        quantity: product.quantity().to_string(),
        ingredients_text: ingredients_text.to_string(),
        reported_nutriscore_grade: product.reported_grade(),
        nutrients,
        nutriscore,
        ingredient_analysis,
        scanned_at: Utc::now(),
    }
}

/// Load and scan one file, folding every outcome into a batch entry
pub fn scan_image_file(
    path: &Path,
    collaborators: Collaborators<'_>,
    options: &ScanOptions,
) -> BatchEntry {
    let image_path = path.display().to_string();
    // A panic in a decoder costs this image only
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        load_image(path).and_then(|image| scan_product(&image, collaborators, options))
    }))
    .unwrap_or_else(|_| {
        warn!(path = %image_path, "scan panicked");
        Err(ScanError::Aborted)
    });

    let (status, report, message) = match result {
        Ok(ScanOutcome::Found(report)) => (EntryStatus::Found, Some(report), None),
        Ok(ScanOutcome::NoBarcodeFound) => (
            EntryStatus::NoBarcode,
            None,
            Some("No barcode found in image".to_string()),
        ),
        Ok(ScanOutcome::ProductNotFound { barcode }) => (
            EntryStatus::NotFound,
            None,
            Some(format!("Product {} not found", barcode)),
        ),
        Err(e) => (EntryStatus::Error, None, Some(e.to_string())),
    };

    BatchEntry {
        image_path,
        status,
        report,
        message,
    }
}
