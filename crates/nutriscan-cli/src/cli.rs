//! CLI definition using clap

use clap::{Parser, Subcommand};
use nutriscan_types::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nutriscan")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Product health reports from barcode photos")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Text-generation backend (gemini, none)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Model name override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging to stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a product photo and report on it
    Scan {
        /// Path to image file
        image: PathBuf,
    },

    /// Report on a barcode without an image
    Lookup {
        /// EAN/UPC digits
        barcode: String,
    },

    /// Only detect barcodes in an image; no lookup
    Decode {
        /// Path to image file
        image: PathBuf,
    },

    /// Compute a Nutri-Score locally from per-100g values
    Score {
        #[arg(long, default_value_t = 0.0)]
        kcal: f64,

        /// Saturated fat (g)
        #[arg(long, default_value_t = 0.0)]
        sat_fat: f64,

        /// Sugars (g)
        #[arg(long, default_value_t = 0.0)]
        sugars: f64,

        /// Sodium (mg)
        #[arg(long, default_value_t = 0.0)]
        sodium_mg: f64,

        /// Fiber (g)
        #[arg(long, default_value_t = 0.0)]
        fiber: f64,

        /// Protein (g)
        #[arg(long, default_value_t = 0.0)]
        protein: f64,
    },

    /// Scan every image in a folder
    Batch {
        /// Path to folder containing images
        folder: PathBuf,

        /// Output file for results (JSON)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Number of parallel scans. 0 = auto (CPU count). Uses 4 if not specified.
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
    },

    /// Export batch results to Excel
    Export {
        /// Path to JSON results file
        results: PathBuf,

        /// Output Excel file path
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set backend (gemini, none)
        #[arg(long)]
        set_backend: Option<String>,

        /// Set model
        #[arg(long)]
        set_model: Option<String>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set the minimum digit count for a barcode
        #[arg(long)]
        set_min_digits: Option<usize>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
