//! Command implementations

use crate::cli::{Cli, Commands};
use crate::output::{output_detection, output_envelope, output_outcome, output_score};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use nutriscan_app::app::{
    lookup_product, scan_image_file, scan_product_with_progress, DefaultCollaborators,
    ProgressCallback, ScanEnvelope, ScanOptions, GENERIC_ERROR_MESSAGE,
};
use nutriscan_app::config::Config;
use nutriscan_app::export::export_to_excel;
use nutriscan_app::scanner::{load_image, scan_directory, validate_image};
use nutriscan_domain::service::{calculate_simple_nutriscore, NutriScorePoints};
use nutriscan_types::{
    BatchEntry, BatchResults, EntryStatus, Error, NutrientSet, OutputFormat, Result, ScanError,
    KCAL_TO_KJ,
};
use nutriscan_vision::{detect_barcode, CompositeDecoder};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

const DEFAULT_JOBS: usize = 4;

pub fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref backend) = cli.backend {
        config.set_backend(backend)?;
    }
    if cli.model.is_some() {
        config.model = cli.model.clone();
    }

    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Scan { image } => cmd_scan(&cli, &config, image, output_format),
        Commands::Lookup { barcode } => cmd_lookup(&config, barcode, output_format),
        Commands::Decode { image } => cmd_decode(&config, image, output_format),
        Commands::Score {
            kcal,
            sat_fat,
            sugars,
            sodium_mg,
            fiber,
            protein,
        } => {
            let nutrients = NutrientSet {
                energy_kcal: *kcal,
                energy_kj: kcal * KCAL_TO_KJ,
                saturated_fat_g: *sat_fat,
                sugars_g: *sugars,
                sodium_g: sodium_mg / 1000.0,
                fiber_g: *fiber,
                proteins_g: *protein,
                ..Default::default()
            };
            cmd_score(&nutrients, output_format)
        }
        Commands::Batch {
            folder,
            output,
            jobs,
        } => {
            let jobs = match jobs.unwrap_or(DEFAULT_JOBS) {
                0 => num_cpus::get(),
                n => n,
            };
            cmd_batch(&cli, &config, folder, output.clone(), jobs, output_format)
        }
        Commands::Export { results, output } => cmd_export(results, output.clone()),
        Commands::Config {
            show,
            set_backend,
            set_model,
            set_output,
            set_min_digits,
            reset,
        } => cmd_config(
            *show,
            set_backend.clone(),
            set_model.clone(),
            *set_output,
            *set_min_digits,
            *reset,
        ),
    }
}

/// Print a failed scan and hand the error back for the exit status
fn report_failure(output_format: OutputFormat, e: ScanError) -> Result<()> {
    if output_format == OutputFormat::Json {
        output_envelope(&ScanEnvelope::Error {
            message: GENERIC_ERROR_MESSAGE.to_string(),
        })?;
    }
    Err(e.into())
}

fn cmd_scan(cli: &Cli, config: &Config, image_path: &Path, output_format: OutputFormat) -> Result<()> {
    validate_image(image_path)?;
    let image = load_image(image_path)?;

    let collaborators = DefaultCollaborators::from_config(config)?;
    let options = ScanOptions::from_config(config);

    let progress: Option<ProgressCallback> = if cli.verbose {
        Some(Box::new(|msg: &str| eprintln!("  {}", msg)))
    } else {
        None
    };

    match scan_product_with_progress(&image, collaborators.as_collaborators(), &options, progress) {
        Ok(outcome) => output_outcome(output_format, outcome),
        Err(e) => report_failure(output_format, e),
    }
}

fn cmd_lookup(config: &Config, barcode: &str, output_format: OutputFormat) -> Result<()> {
    let collaborators = DefaultCollaborators::from_config(config)?;
    let options = ScanOptions::from_config(config);

    match lookup_product(barcode, collaborators.as_collaborators(), &options) {
        Ok(outcome) => output_outcome(output_format, outcome),
        Err(e) => report_failure(output_format, e),
    }
}

fn cmd_decode(config: &Config, image_path: &Path, output_format: OutputFormat) -> Result<()> {
    validate_image(image_path)?;
    let image = load_image(image_path)?;
    let detection = detect_barcode(&image, &CompositeDecoder::default(), config.min_barcode_digits)?;
    output_detection(output_format, &detection)
}

fn cmd_score(nutrients: &NutrientSet, output_format: OutputFormat) -> Result<()> {
    let result = calculate_simple_nutriscore(nutrients);
    let points = NutriScorePoints::from_nutrients(nutrients);
    output_score(output_format, &result, &points)
}

fn cmd_batch(
    cli: &Cli,
    config: &Config,
    folder: &Path,
    output: Option<PathBuf>,
    jobs: usize,
    output_format: OutputFormat,
) -> Result<()> {
    let images = scan_directory(folder)?;

    if images.is_empty() {
        return Err(Error::FileNotFound(format!(
            "No images found in {}",
            folder.display()
        )));
    }

    let total_images = images.len();
    let jobs = jobs.clamp(1, total_images);
    if cli.verbose {
        eprintln!("Found {} images to scan with {} parallel jobs", total_images, jobs);
    }

    let pb = ProgressBar::new(total_images as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let images = Arc::new(images);
    let next_index = Arc::new(AtomicUsize::new(0));
    let started_at = Utc::now();
    let verbose = cli.verbose;

    let mut handles = Vec::with_capacity(jobs);
    for worker_id in 0..jobs {
        let images = Arc::clone(&images);
        let next_index = Arc::clone(&next_index);
        let config = config.clone();
        let pb = pb.clone();

        handles.push(thread::spawn(move || -> std::result::Result<Vec<(usize, BatchEntry)>, ScanError> {
            // Each worker owns its own clients and buffers
            let collaborators = DefaultCollaborators::from_config(&config)?;
            let options = ScanOptions::from_config(&config);
            let mut done = Vec::new();

            loop {
                let idx = next_index.fetch_add(1, Ordering::SeqCst);
                if idx >= images.len() {
                    break;
                }
                let image = &images[idx];

                if verbose {
                    let filename = image.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    pb.set_message(format!("[W{}] {}", worker_id, filename));
                }

                done.push((idx, scan_image_file(image, collaborators.as_collaborators(), &options)));
                pb.inc(1);
            }

            Ok(done)
        }));
    }

    let mut indexed = Vec::with_capacity(total_images);
    for handle in handles {
        match handle.join() {
            Ok(Ok(done)) => indexed.extend(done),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => warn!("batch worker panicked"),
        }
    }

    pb.finish_with_message("Complete");
    let completed_at = Utc::now();

    // Scan order, not completion order
    indexed.sort_by_key(|(idx, _)| *idx);
    let entries: Vec<BatchEntry> = indexed.into_iter().map(|(_, entry)| entry).collect();

    if verbose {
        for entry in entries.iter().filter(|e| e.status != EntryStatus::Found) {
            eprintln!(
                "{}: {}",
                entry.image_path,
                entry.message.as_deref().unwrap_or(entry.status.label())
            );
        }
    }

    let successful = entries.iter().filter(|e| e.status == EntryStatus::Found).count();
    let results = BatchResults {
        total_processed: entries.len(),
        successful,
        failed: entries.len() - successful,
        entries,
        started_at,
        completed_at,
    };
    info!(
        total = results.total_processed,
        successful = results.successful,
        "batch complete"
    );

    if let Some(output_path) = output {
        let content = serde_json::to_string_pretty(&results)?;
        std::fs::write(&output_path, content)?;
        println!("Results saved to: {}", output_path.display());
    } else {
        println!("\nBatch Scan Complete");
        println!("===================");
        println!("Total:      {}", results.total_processed);
        println!("Found:      {}", results.count(EntryStatus::Found));
        println!("Not found:  {}", results.count(EntryStatus::NotFound));
        println!("No barcode: {}", results.count(EntryStatus::NoBarcode));
        println!("Errors:     {}", results.count(EntryStatus::Error));
        println!(
            "Duration:   {:.1}s",
            (results.completed_at - results.started_at).num_milliseconds() as f64 / 1000.0
        );

        if output_format == OutputFormat::Json {
            let content = serde_json::to_string_pretty(&results)?;
            println!("\n{}", content);
        }
    }

    Ok(())
}

fn cmd_export(results_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let content = std::fs::read_to_string(results_path)?;
    let results: BatchResults = serde_json::from_str(&content)?;

    let output_path = output.unwrap_or_else(|| {
        let stem = results_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("results");
        results_path.with_file_name(format!("{}.xlsx", stem))
    });

    export_to_excel(&results, &output_path)?;

    println!("Exported to: {}", output_path.display());
    Ok(())
}

fn cmd_config(
    show: bool,
    set_backend: Option<String>,
    set_model: Option<String>,
    set_output: Option<OutputFormat>,
    set_min_digits: Option<usize>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(backend) = set_backend {
        config.set_backend(&backend)?;
        modified = true;
    }

    if let Some(model) = set_model {
        config.model = Some(model).filter(|m| !m.trim().is_empty());
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(digits) = set_min_digits {
        config.min_barcode_digits = digits;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}
