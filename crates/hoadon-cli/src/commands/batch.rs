//! Batch processing command for multiple receipt files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use hoadon_core::{ExtractionResult, HoadonConfig};

use super::process::{API_KEY_ENV, InputKind, OutputFormat, extract_file, format_record, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    extraction: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

impl ProcessResult {
    fn status(&self) -> &'static str {
        match &self.extraction {
            Some(extraction) if extraction.record.error.is_some() => "ocr_failed",
            Some(_) => "success",
            None => "error",
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = Arc::new(load_config(config_path)?);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| InputKind::from_path(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
    overall_pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files",
        )?
        .progress_chars("=>-"),
    );

    // Each file runs on the blocking pool; the semaphore caps concurrent OCR calls
    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let api_key = std::env::var(API_KEY_ENV).ok();

    let mut handles = Vec::with_capacity(files.len());
    for path in &files {
        let permits = Arc::clone(&permits);
        let config = Arc::clone(&config);
        let api_key = api_key.clone();
        let path = path.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let file_start = Instant::now();
            let result = tokio::task::spawn_blocking(move || {
                process_single_file(&path, &config, api_key)
            })
            .await?;
            Ok::<_, anyhow::Error>((result, file_start.elapsed().as_millis() as u64))
        }));
    }

    let mut results = Vec::with_capacity(files.len());
    for (path, handle) in files.into_iter().zip(handles) {
        let (result, processing_time_ms) = handle.await??;

        match result {
            Ok(extraction) => {
                results.push(ProcessResult {
                    path,
                    extraction: Some(extraction),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        extraction: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            let Some(extraction) = &result.extraction else {
                continue;
            };
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("receipt");
            let output_path =
                output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            fs::write(&output_path, format_record(&extraction.record, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.status() == "success").count();
    let ocr_failed = results.iter().filter(|r| r.status() == "ocr_failed").count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} without OCR text, {} failed",
        style(successful).green(),
        style(ocr_failed).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    config: &HoadonConfig,
    api_key: Option<String>,
) -> anyhow::Result<ExtractionResult> {
    debug!("Processing {}", path.display());
    extract_file(path, config, api_key)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "invoice_number",
        "date",
        "seller_name",
        "subtotal",
        "vat",
        "total",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        if let Some(extraction) = &result.extraction {
            let record = &extraction.record;
            wtr.write_record([
                filename,
                result.status().to_string(),
                record.invoice_number.clone(),
                record.date.clone(),
                record.seller_name.clone().unwrap_or_default(),
                record.subtotal.to_string(),
                record.vat.to_string(),
                record.total.to_string(),
                extraction.warnings.len().to_string(),
                result.processing_time_ms.to_string(),
                record.error.map(|e| e.to_string()).unwrap_or_default(),
            ])?;
        } else {
            wtr.write_record([
                filename,
                result.status().to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                result.processing_time_ms.to_string(),
                result.error.clone().unwrap_or_default(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
