//! Process command - extract data from a single receipt file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use hoadon_core::invoice::rules::format_vnd;
use hoadon_core::{
    ExtractionResult, HoadonConfig, InvoiceRecord, PlainTextBackend, RawOcrResult, ReceiptParser,
    classify, create_backend,
};

use super::config::default_config_path;

/// Environment variable holding the Google Cloud Vision API key.
pub const API_KEY_ENV: &str = "GOOGLE_CLOUD_VISION_API_KEY";

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (image, recognized .txt, or OCR block .json)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print extraction warnings and timing to stderr
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// How an input file is turned into OCR blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Already-recognized UTF-8 text.
    Text,
    /// JSON array of OCR text blocks.
    OcrJson,
    /// Image sent to the configured OCR backend.
    Image,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "txt" => Some(InputKind::Text),
            "json" => Some(InputKind::OcrJson),
            "png" | "jpg" | "jpeg" | "webp" | "gif" | "bmp" | "tif" | "tiff" => {
                Some(InputKind::Image)
            }
            _ => None,
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if InputKind::from_path(&args.input).is_none() {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {msg}",
    )?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Extracting receipt data...");

    // OCR backends block on network I/O
    let input = args.input.clone();
    let api_key = std::env::var(API_KEY_ENV).ok();
    let result =
        tokio::task::spawn_blocking(move || extract_file(&input, &config, api_key)).await??;

    pb.finish_and_clear();

    let output = format_record(&result.record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_warnings {
        for warning in &result.warnings {
            eprintln!("{} {}", style("!").yellow(), warning);
        }
        eprintln!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Load the configuration from `config_path`, else the default location if
/// a file exists there, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<HoadonConfig> {
    if let Some(path) = config_path {
        return Ok(HoadonConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(HoadonConfig::from_file(&default_path)?)
    } else {
        Ok(HoadonConfig::default())
    }
}

/// Recognize and parse one input file. Blocking.
///
/// OCR failures do not fail the call: they yield the default record marked
/// `OCR_NOT_CONFIGURED`. Only unreadable JSON block files and unsupported
/// extensions are errors.
pub fn extract_file(
    path: &Path,
    config: &HoadonConfig,
    api_key: Option<String>,
) -> anyhow::Result<ExtractionResult> {
    let parser = ReceiptParser::with_config(config.extraction.clone());
    let kind = InputKind::from_path(path)
        .ok_or_else(|| anyhow::anyhow!("Unsupported file format: {}", path.display()))?;

    let result = match kind {
        InputKind::Text => parser.parse_image(&PlainTextBackend::new(), path),
        InputKind::OcrJson => {
            let content = fs::read_to_string(path)?;
            let raw: RawOcrResult = serde_json::from_str(&content)?;
            parser.parse(&raw)
        }
        InputKind::Image => match create_backend(&config.ocr, api_key) {
            Ok(backend) => {
                debug!("Using {} OCR backend", backend.name());
                parser.parse_image(backend.as_ref(), path)
            }
            Err(e) => {
                warn!("OCR backend unavailable: {}", e);
                let mut result = parser.parse(&RawOcrResult::default());
                result.warnings.push(format!("OCR backend unavailable: {}", e));
                result
            }
        },
    };

    Ok(result)
}

pub fn format_record(record: &InvoiceRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(std::slice::from_ref(record)),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

/// One CSV row per record.
pub fn format_csv(records: &[InvoiceRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "invoice_number",
        "date",
        "seller_name",
        "seller_phone",
        "seller_address",
        "subtotal",
        "vat",
        "total",
        "item_count",
        "error",
    ])?;

    for record in records {
        wtr.write_record([
            record.invoice_number.clone(),
            record.date.clone(),
            record.seller_name.clone().unwrap_or_default(),
            record.seller_phone.clone().unwrap_or_default(),
            record.seller_address.clone().unwrap_or_default(),
            record.subtotal.to_string(),
            record.vat.to_string(),
            record.total.to_string(),
            record.items.len().to_string(),
            record.error.map(|e| e.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_text(record: &InvoiceRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Receipt: {}\n", record.invoice_number));
    output.push_str(&format!("Date: {}\n", record.date));
    if let Some(error) = record.error {
        output.push_str(&format!("OCR error: {}\n", error));
    }
    output.push('\n');

    output.push_str("Seller:\n");
    output.push_str(&format!(
        "  {}\n",
        record.seller_name.as_deref().unwrap_or("-")
    ));
    if let Some(phone) = &record.seller_phone {
        output.push_str(&format!("  Phone: {}\n", phone));
    }
    if let Some(address) = &record.seller_address {
        output.push_str(&format!("  Address: {}\n", address));
    }
    output.push('\n');

    if !record.items.is_empty() {
        output.push_str("Items:\n");
        for item in &record.items {
            let category = classify(&item.name).category;
            output.push_str(&format!(
                "  {} {} x {} = {} [{}]\n",
                item.name,
                item.quantity,
                format_vnd(item.unit_price),
                format_vnd(item.amount),
                category
            ));
        }
        output.push('\n');
    }

    output.push_str("Summary:\n");
    output.push_str(&format!("  Subtotal: {} VND\n", format_vnd(record.subtotal)));
    output.push_str(&format!("  VAT:      {} VND\n", format_vnd(record.vat)));
    output.push_str(&format!("  Total:    {} VND\n", format_vnd(record.total)));

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> InvoiceRecord {
        ReceiptParser::new()
            .parse_text("Cửa hàng ABC\nHD040334\n12/05/2024\nTổng tiền hàng: 63,325\nVAT: 5,066\nTổng Cộng: 68,391")
            .record
    }

    #[test]
    fn test_input_kind() {
        assert_eq!(InputKind::from_path(Path::new("a.TXT")), Some(InputKind::Text));
        assert_eq!(InputKind::from_path(Path::new("a.json")), Some(InputKind::OcrJson));
        assert_eq!(InputKind::from_path(Path::new("a.jpeg")), Some(InputKind::Image));
        assert_eq!(InputKind::from_path(Path::new("a.pdf")), None);
        assert_eq!(InputKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_format_text() {
        let text = format_text(&record());
        assert!(text.contains("Receipt: HD040334"));
        assert!(text.contains("Total:    68.391 VND"));
        assert!(!text.contains("OCR error"));
    }

    #[test]
    fn test_format_csv() {
        let csv = format_csv(&[record()]).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("invoice_number,date,"));
        assert!(lines.next().unwrap().starts_with("HD040334,2024-05-12,Cửa hàng ABC,"));
    }

    #[test]
    fn test_image_without_key_is_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        fs::write(&path, b"not really an image").unwrap();

        let result = extract_file(&path, &HoadonConfig::default(), None).unwrap();
        assert_eq!(
            result.record.error,
            Some(hoadon_core::OcrFailure::NotConfigured)
        );
        assert!(result.warnings.iter().any(|w| w.contains("unavailable")));
    }
}
