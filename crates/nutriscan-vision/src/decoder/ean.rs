//! Scanline reader for EAN-13 (including UPC-A as leading-zero EAN-13) and EAN-8
//!
//! Each sampled row is binarized at the midpoint of its own range and turned
//! into bar/space run lengths. A symbol is recognised by its run count
//! (59 for EAN-13, 43 for EAN-8), guard widths, per-digit width patterns and
//! the check digit. Rows are also read right-to-left so upside-down codes decode.

use super::{DecodedSymbol, SymbolDecoder};
use image::GrayImage;
use nutriscan_types::DecodeError;

pub const EAN13_SYMBOL_TYPE: &str = "EAN13";
pub const EAN8_SYMBOL_TYPE: &str = "EAN8";

/// Element widths (space, bar, space, bar) of the L code set.
/// R codes share these widths starting with a bar; G codes are the reverse.
const L_PATTERNS: [[f64; 4]; 10] = [
    [3.0, 2.0, 1.0, 1.0],
    [2.0, 2.0, 2.0, 1.0],
    [2.0, 1.0, 2.0, 2.0],
    [1.0, 4.0, 1.0, 1.0],
    [1.0, 1.0, 3.0, 2.0],
    [1.0, 2.0, 3.0, 1.0],
    [1.0, 1.0, 1.0, 4.0],
    [1.0, 3.0, 1.0, 2.0],
    [1.0, 2.0, 1.0, 3.0],
    [3.0, 1.0, 1.0, 2.0],
];

/// L/G sequence of the six left-half digits, indexed by the implied first digit
const FIRST_DIGIT_PARITY: [&str; 10] = [
    "LLLLLL", "LLGLGG", "LLGGLG", "LLGGGL", "LGLLGG", "LGGLLG", "LGGGLL", "LGLGLG", "LGLGGL",
    "LGGLGL",
];

const EAN13_RUNS: usize = 59;
const EAN13_MODULES: f64 = 95.0;
const EAN8_RUNS: usize = 43;
const EAN8_MODULES: f64 = 67.0;

/// Sum of absolute differences (in modules) tolerated for a digit match
const MAX_DIGIT_ERROR: f64 = 1.5;

/// Quiet zone required on both sides, in modules
const QUIET_ZONE_MODULES: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
pub struct EanDecoder {
    /// Number of rows sampled across the image height
    pub scanlines: usize,
    /// Minimum max-min intensity spread for a row to be considered
    pub min_contrast: u8,
}

impl Default for EanDecoder {
    fn default() -> Self {
        Self {
            scanlines: 24,
            min_contrast: 40,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Run {
    dark: bool,
    width: f64,
}

impl SymbolDecoder for EanDecoder {
    fn decode(&self, image: &GrayImage) -> Result<Vec<DecodedSymbol>, DecodeError> {
        let (w, h) = (image.width() as usize, image.height() as usize);
        if w == 0 || h == 0 {
            return Err(DecodeError::EmptyBitmap);
        }

        let raw = image.as_raw();
        let mut symbols: Vec<DecodedSymbol> = Vec::new();

        for y in self.sample_rows(h) {
            let row = &raw[y * w..(y + 1) * w];
            let Some(mut runs) = self.row_runs(row) else {
                continue;
            };

            let mut found = scan_runs(&runs);
            runs.reverse();
            found.extend(scan_runs(&runs));

            for symbol in found {
                if !symbols.contains(&symbol) {
                    symbols.push(symbol);
                }
            }
        }

        Ok(symbols)
    }
}

impl EanDecoder {
    fn sample_rows(&self, height: usize) -> Vec<usize> {
        let lines = self.scanlines.max(1);
        if height <= lines {
            return (0..height).collect();
        }
        let mut rows: Vec<usize> = (0..lines)
            .map(|k| ((2 * k + 1) * height) / (2 * lines))
            .collect();
        rows.dedup();
        rows
    }

    fn row_runs(&self, row: &[u8]) -> Option<Vec<Run>> {
        let lo = *row.iter().min()?;
        let hi = *row.iter().max()?;
        if hi.saturating_sub(lo) < self.min_contrast {
            return None;
        }
        let threshold = (lo as u16 + hi as u16) / 2;

        let mut runs: Vec<Run> = Vec::new();
        for &p in row {
            let dark = (p as u16) <= threshold;
            match runs.last_mut() {
                Some(run) if run.dark == dark => run.width += 1.0,
                _ => runs.push(Run { dark, width: 1.0 }),
            }
        }
        Some(runs)
    }
}

fn scan_runs(runs: &[Run]) -> Vec<DecodedSymbol> {
    let mut found = Vec::new();
    for start in 0..runs.len() {
        if !runs[start].dark {
            continue;
        }
        if let Some(code) = try_symbol(runs, start, EAN13_RUNS, EAN13_MODULES, decode_ean13) {
            found.push(DecodedSymbol {
                payload: code.into_bytes(),
                symbol_type: EAN13_SYMBOL_TYPE.to_string(),
            });
        } else if let Some(code) = try_symbol(runs, start, EAN8_RUNS, EAN8_MODULES, decode_ean8) {
            found.push(DecodedSymbol {
                payload: code.into_bytes(),
                symbol_type: EAN8_SYMBOL_TYPE.to_string(),
            });
        }
    }
    found
}

/// Bounds, quiet zone and guard checks shared by both symbologies
fn try_symbol(
    runs: &[Run],
    start: usize,
    run_count: usize,
    modules: f64,
    decode: fn(&[Run], f64) -> Option<String>,
) -> Option<String> {
    let end = start + run_count;
    if end > runs.len() {
        return None;
    }
    let segment = &runs[start..end];
    let module = segment.iter().map(|r| r.width).sum::<f64>() / modules;

    let quiet = QUIET_ZONE_MODULES * module;
    if start > 0 && runs[start - 1].width < quiet {
        return None;
    }
    if end < runs.len() && runs[end].width < quiet {
        return None;
    }

    decode(segment, module)
}

fn is_guard(runs: &[Run], module: f64) -> bool {
    runs.iter().all(|r| {
        let m = r.width / module;
        (0.4..=2.0).contains(&m)
    })
}

/// Match four element widths against the code tables.
/// Returns the digit and whether the G (reversed) set matched.
fn decode_digit(runs: &[Run], module: f64, allow_g: bool) -> Option<(u8, bool)> {
    let total: f64 = runs.iter().map(|r| r.width).sum();
    let span = total / module;
    if total <= 0.0 || !(5.0..=9.0).contains(&span) {
        return None;
    }
    let normalized: Vec<f64> = runs.iter().map(|r| r.width * 7.0 / total).collect();

    let error = |pattern: &[f64; 4], reversed: bool| -> f64 {
        (0..4)
            .map(|i| {
                let expected = if reversed { pattern[3 - i] } else { pattern[i] };
                (normalized[i] - expected).abs()
            })
            .sum()
    };

    let mut best: Option<(u8, bool, f64)> = None;
    for (digit, pattern) in L_PATTERNS.iter().enumerate() {
        let candidates: &[bool] = if allow_g { &[false, true] } else { &[false] };
        for &is_g in candidates {
            let e = error(pattern, is_g);
            if best.map_or(true, |(_, _, b)| e < b) {
                best = Some((digit as u8, is_g, e));
            }
        }
    }

    best.filter(|(_, _, e)| *e < MAX_DIGIT_ERROR)
        .map(|(digit, is_g, _)| (digit, is_g))
}

fn decode_ean13(segment: &[Run], module: f64) -> Option<String> {
    if !is_guard(&segment[0..3], module)
        || !is_guard(&segment[27..32], module)
        || !is_guard(&segment[56..59], module)
    {
        return None;
    }

    let mut digits = Vec::with_capacity(13);
    let mut parity = String::with_capacity(6);
    for d in 0..6 {
        let at = 3 + 4 * d;
        let (digit, is_g) = decode_digit(&segment[at..at + 4], module, true)?;
        parity.push(if is_g { 'G' } else { 'L' });
        digits.push(digit);
    }
    for d in 0..6 {
        let at = 32 + 4 * d;
        let (digit, _) = decode_digit(&segment[at..at + 4], module, false)?;
        digits.push(digit);
    }

    let first = FIRST_DIGIT_PARITY.iter().position(|p| *p == parity)? as u8;
    digits.insert(0, first);

    checksum_ok(&digits).then(|| digits_to_string(&digits))
}

fn decode_ean8(segment: &[Run], module: f64) -> Option<String> {
    if !is_guard(&segment[0..3], module)
        || !is_guard(&segment[19..24], module)
        || !is_guard(&segment[40..43], module)
    {
        return None;
    }

    let mut digits = Vec::with_capacity(8);
    for d in 0..4 {
        let at = 3 + 4 * d;
        let (digit, _) = decode_digit(&segment[at..at + 4], module, false)?;
        digits.push(digit);
    }
    for d in 0..4 {
        let at = 24 + 4 * d;
        let (digit, _) = decode_digit(&segment[at..at + 4], module, false)?;
        digits.push(digit);
    }

    checksum_ok(&digits).then(|| digits_to_string(&digits))
}

/// GS1 mod-10: weights 3,1,3,... from the digit left of the check digit
fn checksum_ok(digits: &[u8]) -> bool {
    let Some((&check, data)) = digits.split_last() else {
        return false;
    };
    let sum: u32 = data
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| if i % 2 == 0 { 3 * d as u32 } else { d as u32 })
        .sum();
    (10 - sum % 10) % 10 == check as u32
}

fn digits_to_string(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}
