//! Runs the symbol decoder over every rendered variant

use crate::decoder::SymbolDecoder;
use crate::preprocess::RenderedVariant;
use nutriscan_types::BarcodeCandidate;
use tracing::{debug, warn};

/// Decode each variant independently and concatenate the results in variant order.
///
/// A variant whose decode fails contributes no candidates. Duplicates across
/// variants are kept; the selector merges them.
pub fn extract_candidates(
    variants: &[RenderedVariant],
    decoder: &dyn SymbolDecoder,
) -> Vec<BarcodeCandidate> {
    let mut candidates = Vec::new();

    for variant in variants {
        match decoder.decode(&variant.image) {
            Ok(symbols) => {
                debug!(variant = variant.kind.label(), count = symbols.len(), "decoded variant");
                candidates.extend(symbols.into_iter().map(|s| BarcodeCandidate {
                    raw_value: String::from_utf8_lossy(&s.payload).into_owned(),
                    symbol_type: s.symbol_type,
                    variant: variant.kind,
                }));
            }
            Err(e) => {
                warn!(variant = variant.kind.label(), error = %e, "decoder failed on variant, skipping");
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecodedSymbol;
    use image::{GrayImage, Luma};
    use nutriscan_types::{DecodeError, VariantKind};

    /// Fails on any bitmap whose first pixel is 0, otherwise reports one symbol per call
    struct PixelKeyedDecoder;

    impl SymbolDecoder for PixelKeyedDecoder {
        fn decode(&self, image: &GrayImage) -> Result<Vec<DecodedSymbol>, DecodeError> {
            let first = image.get_pixel(0, 0).0[0];
            if first == 0 {
                return Err(DecodeError::Failed("boom".to_string()));
            }
            Ok(vec![DecodedSymbol {
                payload: format!("code-{}", first).into_bytes(),
                symbol_type: "EAN13".to_string(),
            }])
        }
    }

    fn variant(kind: VariantKind, value: u8) -> RenderedVariant {
        RenderedVariant {
            kind,
            image: GrayImage::from_pixel(2, 2, Luma([value])),
        }
    }

    #[test]
    fn test_failed_variant_does_not_abort() {
        let variants = vec![
            variant(VariantKind::Grayscale, 10),
            variant(VariantKind::AdaptiveThreshold, 0),
            variant(VariantKind::Blurred, 10),
            variant(VariantKind::Inverted, 30),
        ];

        let candidates = extract_candidates(&variants, &PixelKeyedDecoder);
        let values: Vec<(&str, VariantKind)> = candidates
            .iter()
            .map(|c| (c.raw_value.as_str(), c.variant))
            .collect();
        assert_eq!(
            values,
            vec![
                ("code-10", VariantKind::Grayscale),
                ("code-10", VariantKind::Blurred),
                ("code-30", VariantKind::Inverted),
            ]
        );
    }

    #[test]
    fn test_non_utf8_payload_is_lossy() {
        struct Binary;
        impl SymbolDecoder for Binary {
            fn decode(&self, _image: &GrayImage) -> Result<Vec<DecodedSymbol>, DecodeError> {
                Ok(vec![DecodedSymbol {
                    payload: vec![b'1', 0xff, b'2'],
                    symbol_type: "QRCODE".to_string(),
                }])
            }
        }

        let candidates = extract_candidates(&[variant(VariantKind::Grayscale, 1)], &Binary);
        assert_eq!(candidates[0].raw_value, "1\u{fffd}2");
    }
}
