//! QR code reading via rqrr

use super::{DecodedSymbol, SymbolDecoder};
use image::GrayImage;
use nutriscan_types::DecodeError;
use rqrr::PreparedImage;
use tracing::debug;

pub const QR_SYMBOL_TYPE: &str = "QRCODE";

#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl SymbolDecoder for QrDecoder {
    fn decode(&self, image: &GrayImage) -> Result<Vec<DecodedSymbol>, DecodeError> {
        let (w, h) = (image.width() as usize, image.height() as usize);
        if w == 0 || h == 0 {
            return Err(DecodeError::EmptyBitmap);
        }

        let raw = image.as_raw();
        let mut prepared = PreparedImage::prepare_from_greyscale(w, h, |x, y| raw[y * w + x]);
        let grids = prepared.detect_grids();

        let mut symbols = Vec::new();
        for grid in grids {
            match grid.decode() {
                Ok((_, content)) => symbols.push(DecodedSymbol {
                    payload: content.into_bytes(),
                    symbol_type: QR_SYMBOL_TYPE.to_string(),
                }),
                Err(e) => debug!(error = ?e, "QR grid detected but not decodable"),
            }
        }

        Ok(symbols)
    }
}
