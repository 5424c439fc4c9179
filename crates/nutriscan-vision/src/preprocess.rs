//! Alternate renderings of one input image
//!
//! Each rendering targets a different capture failure: uneven lighting
//! (adaptive threshold), threshold speckle (blur), and light-on-dark print
//! (inversion). All operate on 8-bit single-channel buffers.

use image::{DynamicImage, GrayImage};
use nutriscan_types::{ScanError, VariantKind};

/// Neighbourhood size of the adaptive threshold (pixels, odd)
pub const ADAPTIVE_BLOCK_SIZE: u32 = 11;

/// Constant subtracted from the local mean
pub const ADAPTIVE_BIAS: i64 = 2;

/// One rendering of the input
#[derive(Debug, Clone)]
pub struct RenderedVariant {
    pub kind: VariantKind,
    pub image: GrayImage,
}

/// Produce the four renderings in decode-priority order:
/// grayscale, adaptive threshold, blurred threshold, inverted blur.
pub fn render_variants(image: &DynamicImage) -> Result<Vec<RenderedVariant>, ScanError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::InvalidImage(format!(
            "image has zero dimension ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let gray = image.to_luma8();
    let thresholded = adaptive_threshold_mean(&gray, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_BIAS);
    let blurred = gaussian_blur_3x3(&thresholded);
    let mut inverted = blurred.clone();
    image::imageops::invert(&mut inverted);

    Ok(vec![
        RenderedVariant {
            kind: VariantKind::Grayscale,
            image: gray,
        },
        RenderedVariant {
            kind: VariantKind::AdaptiveThreshold,
            image: thresholded,
        },
        RenderedVariant {
            kind: VariantKind::Blurred,
            image: blurred,
        },
        RenderedVariant {
            kind: VariantKind::Inverted,
            image: inverted,
        },
    ])
}

/// Binary output: 255 where the pixel is brighter than `mean(block) - bias`, else 0.
///
/// Edge pixels are replicated past the border, so every window covers
/// `block_size * block_size` samples.
pub fn adaptive_threshold_mean(gray: &GrayImage, block_size: u32, bias: i64) -> GrayImage {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let radius = (block_size / 2) as usize;
    let side = 2 * radius + 1;
    let src = gray.as_raw();
    if w == 0 || h == 0 {
        return GrayImage::new(w as u32, h as u32);
    }

    // Integral image over the replicate-padded source
    let (pw, ph) = (w + 2 * radius, h + 2 * radius);
    let iw = pw + 1;
    let mut integral = vec![0i64; iw * (ph + 1)];
    for py in 0..ph {
        let sy = py.saturating_sub(radius).min(h - 1);
        let mut row_sum = 0i64;
        for px in 0..pw {
            let sx = px.saturating_sub(radius).min(w - 1);
            row_sum += src[sy * w + sx] as i64;
            integral[(py + 1) * iw + (px + 1)] = row_sum + integral[py * iw + (px + 1)];
        }
    }

    let area = (side * side) as i64;
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        let (y0, y1) = (y, y + side);
        for x in 0..w {
            let (x0, x1) = (x, x + side);
            let sum = integral[y1 * iw + x1] - integral[y0 * iw + x1] - integral[y1 * iw + x0]
                + integral[y0 * iw + x0];
            // src > sum/area - bias, kept in integers
            let pixel = src[y * w + x] as i64;
            out[y * w + x] = if pixel * area > sum - bias * area { 255 } else { 0 };
        }
    }

    GrayImage::from_raw(w as u32, h as u32, out).unwrap_or_else(|| GrayImage::new(w as u32, h as u32))
}

/// Separable `[1, 2, 1] / 4` kernel in both directions, edge pixels replicated
pub fn gaussian_blur_3x3(gray: &GrayImage) -> GrayImage {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let src = gray.as_raw();
    let mut temp = vec![0u16; w * h];

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let l = if x >= 1 { src[idx - 1] } else { src[idx] } as u16;
            let r = if x + 1 < w { src[idx + 1] } else { src[idx] } as u16;
            temp[idx] = l + 2 * src[idx] as u16 + r;
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let u = if y >= 1 { temp[idx - w] } else { temp[idx] } as u32;
            let d = if y + 1 < h { temp[idx + w] } else { temp[idx] } as u32;
            let sum = u + 2 * temp[idx] as u32 + d;
            out[idx] = ((sum + 8) >> 4) as u8;
        }
    }

    GrayImage::from_raw(w as u32, h as u32, out).unwrap_or_else(|| GrayImage::new(w as u32, h as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_four_variants_in_order() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([200, 100, 50])));
        let variants = render_variants(&img).unwrap();
        let kinds: Vec<VariantKind> = variants.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                VariantKind::Grayscale,
                VariantKind::AdaptiveThreshold,
                VariantKind::Blurred,
                VariantKind::Inverted
            ]
        );
        for v in &variants {
            assert_eq!(v.image.dimensions(), (20, 10));
        }
    }

    #[test]
    fn test_zero_dimension_is_invalid() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 5));
        assert!(matches!(render_variants(&img), Err(ScanError::InvalidImage(_))));
    }

    #[test]
    fn test_uniform_image_thresholds_white() {
        // mean - 2 < pixel everywhere
        let gray = GrayImage::from_pixel(15, 15, Luma([90]));
        let out = adaptive_threshold_mean(&gray, 11, 2);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_dark_stripe_thresholds_black() {
        let mut gray = GrayImage::from_pixel(30, 5, Luma([220]));
        for y in 0..5 {
            for x in 14..16 {
                gray.put_pixel(x, y, Luma([20]));
            }
        }
        let out = adaptive_threshold_mean(&gray, 11, 2);
        assert_eq!(out.get_pixel(14, 2).0[0], 0);
        assert_eq!(out.get_pixel(15, 2).0[0], 0);
        assert_eq!(out.get_pixel(3, 2).0[0], 255);
        assert_eq!(out.get_pixel(27, 2).0[0], 255);
    }

    #[test]
    fn test_threshold_replicates_border() {
        // Dark left column: replicated, it fills 6 of the 11 window columns at x = 0
        let mut gray = GrayImage::from_pixel(20, 20, Luma([200]));
        for y in 0..20 {
            gray.put_pixel(0, y, Luma([0]));
        }
        let out = adaptive_threshold_mean(&gray, 11, 2);
        assert_eq!(out.get_pixel(0, 10).0[0], 0);
        // x = 1 sees 5 dark columns of 11, mean ~ 109, so 200 stays white
        assert_eq!(out.get_pixel(1, 10).0[0], 255);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_blur_preserves_uniform_and_smooths_spike() {
        let uniform = GrayImage::from_pixel(6, 6, Luma([128]));
        assert!(gaussian_blur_3x3(&uniform).pixels().all(|p| p.0[0] == 128));

        let mut spike = GrayImage::new(5, 5);
        spike.put_pixel(2, 2, Luma([255]));
        let out = gaussian_blur_3x3(&spike);
        // centre weight 4/16, edge neighbours 2/16, corners 1/16
        assert_eq!(out.get_pixel(2, 2).0[0], 64);
        assert_eq!(out.get_pixel(1, 2).0[0], 32);
        assert_eq!(out.get_pixel(1, 1).0[0], 16);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_inverted_is_complement_of_blurred() {
        let mut gray = GrayImage::from_pixel(12, 12, Luma([240]));
        gray.put_pixel(6, 6, Luma([10]));
        let variants = render_variants(&DynamicImage::ImageLuma8(gray)).unwrap();
        let blurred = &variants[2].image;
        let inverted = &variants[3].image;
        for (b, i) in blurred.pixels().zip(inverted.pixels()) {
            assert_eq!(b.0[0], 255 - i.0[0]);
        }
    }
}
