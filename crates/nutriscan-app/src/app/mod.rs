//! Application use cases

pub mod scan_service;

pub use scan_service::{
    lookup_product, scan_image_file, scan_product, scan_product_with_progress, Collaborators,
    DefaultCollaborators, ProgressCallback, ScanEnvelope, ScanOptions, ScanOutcome,
    GENERIC_ERROR_MESSAGE, MANUAL_SYMBOL_TYPE,
};
