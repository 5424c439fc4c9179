//! Candidate cleaning and ranking
//!
//! Heuristic only: no EAN/UPC check-digit validation happens here.

use nutriscan_types::{BarcodeCandidate, CleanCandidate};
use std::collections::HashSet;

/// Digits-only view of every candidate that has at least `min_digits` digits,
/// deduplicated by digits (first symbol type wins), longest first.
///
/// Ties keep decode order; `sort_by` is stable.
pub fn clean_candidates(candidates: &[BarcodeCandidate], min_digits: usize) -> Vec<CleanCandidate> {
    let mut seen = HashSet::new();
    let mut cleaned: Vec<CleanCandidate> = candidates
        .iter()
        .filter_map(|c| {
            let digits: String = c.raw_value.chars().filter(|ch| ch.is_ascii_digit()).collect();
            (digits.len() >= min_digits).then(|| CleanCandidate {
                digits,
                symbol_type: c.symbol_type.clone(),
            })
        })
        .filter(|c| seen.insert(c.digits.clone()))
        .collect();

    cleaned.sort_by(|a, b| b.digits.len().cmp(&a.digits.len()));
    cleaned
}

/// The top-ranked candidate, if any survives cleaning
pub fn select_barcode(candidates: &[BarcodeCandidate], min_digits: usize) -> Option<CleanCandidate> {
    clean_candidates(candidates, min_digits).into_iter().next()
}
