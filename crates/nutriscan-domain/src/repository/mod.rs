//! Collaborator trait for nutrition record retrieval

use crate::model::LookupResponse;
use nutriscan_types::LookupError;

/// Source of nutrition records keyed by barcode
pub trait NutritionLookup {
    /// Fetch the record for one barcode.
    ///
    /// A response with `status != 1` is a miss, not an error. `Err` is reserved
    /// for transport failures and unusable payloads.
    fn fetch_product(&self, barcode: &str) -> Result<LookupResponse, LookupError>;
}
