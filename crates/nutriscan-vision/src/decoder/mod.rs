//! Symbol decoders
//!
//! A decoder takes one single-channel bitmap and reports every symbol it can
//! read. Failing on one bitmap is an `Err`; finding nothing is `Ok(vec![])`.

pub mod ean;
pub mod qr;

pub use ean::EanDecoder;
pub use qr::QrDecoder;

use image::GrayImage;
use nutriscan_types::DecodeError;
use tracing::debug;

/// One symbol read from a bitmap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSymbol {
    pub payload: Vec<u8>,
    /// Symbology tag, e.g. "EAN13", "EAN8", "QRCODE"
    pub symbol_type: String,
}

pub trait SymbolDecoder {
    fn decode(&self, image: &GrayImage) -> Result<Vec<DecodedSymbol>, DecodeError>;
}

/// Runs several decoders over the same bitmap and concatenates their symbols.
///
/// A failing member contributes nothing; the composite only fails when every
/// member failed.
pub struct CompositeDecoder {
    decoders: Vec<Box<dyn SymbolDecoder>>,
}

impl CompositeDecoder {
    pub fn new(decoders: Vec<Box<dyn SymbolDecoder>>) -> Self {
        Self { decoders }
    }
}

impl Default for CompositeDecoder {
    /// Linear retail codes first, then QR
    fn default() -> Self {
        Self::new(vec![Box::new(EanDecoder::default()), Box::new(QrDecoder)])
    }
}

impl SymbolDecoder for CompositeDecoder {
    fn decode(&self, image: &GrayImage) -> Result<Vec<DecodedSymbol>, DecodeError> {
        let mut symbols = Vec::new();
        let mut last_error = None;
        let mut any_ok = self.decoders.is_empty();

        for decoder in &self.decoders {
            match decoder.decode(image) {
                Ok(found) => {
                    any_ok = true;
                    symbols.extend(found);
                }
                Err(e) => {
                    debug!(error = %e, "decoder member failed");
                    last_error = Some(e);
                }
            }
        }

        match (any_ok, last_error) {
            (false, Some(e)) => Err(e),
            _ => Ok(symbols),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Vec<DecodedSymbol>, ()>);

    impl SymbolDecoder for Fixed {
        fn decode(&self, _image: &GrayImage) -> Result<Vec<DecodedSymbol>, DecodeError> {
            self.0
                .clone()
                .map_err(|_| DecodeError::Failed("fixed failure".to_string()))
        }
    }

    fn symbol(payload: &str) -> DecodedSymbol {
        DecodedSymbol {
            payload: payload.as_bytes().to_vec(),
            symbol_type: "EAN13".to_string(),
        }
    }

    #[test]
    fn test_composite_unions_and_ignores_failures() {
        let composite = CompositeDecoder::new(vec![
            Box::new(Fixed(Err(()))),
            Box::new(Fixed(Ok(vec![symbol("1")]))),
            Box::new(Fixed(Ok(vec![symbol("2")]))),
        ]);
        let found = composite.decode(&GrayImage::new(4, 4)).unwrap();
        assert_eq!(found, vec![symbol("1"), symbol("2")]);
    }

    #[test]
    fn test_composite_fails_when_all_fail() {
        let composite = CompositeDecoder::new(vec![Box::new(Fixed(Err(()))), Box::new(Fixed(Err(())))]);
        assert!(composite.decode(&GrayImage::new(4, 4)).is_err());
    }
}
