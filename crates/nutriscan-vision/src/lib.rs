//! Vision module - barcode detection from still images
//!
//! Preprocess → extract → select: the image is rendered four ways, each
//! rendering goes through the symbol decoder, and the surviving candidates are
//! ranked to pick one barcode.

pub mod decoder;
pub mod extractor;
pub mod preprocess;
pub mod selector;

pub use decoder::{CompositeDecoder, DecodedSymbol, EanDecoder, QrDecoder, SymbolDecoder};
pub use extractor::extract_candidates;
pub use preprocess::{render_variants, RenderedVariant};
pub use selector::{clean_candidates, select_barcode};

use image::DynamicImage;
use nutriscan_types::{BarcodeCandidate, CleanCandidate, ScanError};
use tracing::info;

/// Everything the detection stage saw, plus its pick
#[derive(Debug, Clone)]
pub struct BarcodeDetection {
    pub candidates: Vec<BarcodeCandidate>,
    pub ranked: Vec<CleanCandidate>,
}

impl BarcodeDetection {
    pub fn winner(&self) -> Option<&CleanCandidate> {
        self.ranked.first()
    }
}

/// Run the full detection stage on one image.
///
/// Only an unusable image is an error; finding nothing yields an empty detection.
pub fn detect_barcode(
    image: &DynamicImage,
    decoder: &dyn SymbolDecoder,
    min_digits: usize,
) -> Result<BarcodeDetection, ScanError> {
    let variants = render_variants(image)?;
    let candidates = extract_candidates(&variants, decoder);
    let ranked = clean_candidates(&candidates, min_digits);

    match ranked.first() {
        Some(winner) => info!(
            barcode = %winner.digits,
            symbol_type = %winner.symbol_type,
            candidates = candidates.len(),
            "barcode selected"
        ),
        None => info!(candidates = candidates.len(), "no barcode candidate survived filtering"),
    }

    Ok(BarcodeDetection { candidates, ranked })
}
