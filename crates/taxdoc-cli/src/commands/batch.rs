//! Batch processing command for multiple documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use taxdoc_core::{
    BackendReporter, DocumentHint, GatewayConfig, DocumentProcessor, KeywordEnhancer, OcrMethod, ParsedDocument,
    ProcessedDocument, ProcessingReport,
};

use super::load_config;
use super::output::{render, OutputFormat};

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

    /// Document type applied to every file
    #[arg(short = 't', long = "type", default_value = "auto")]
    doc_type: DocumentHint,

    /// OCR engine
    #[arg(long, default_value = "auto")]
    ocr: OcrMethod,

    /// Annotate bank statement transactions
    #[arg(long)]
    enhance: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Send every result to the configured backend
    #[arg(long, requires = "user_id")]
    report: bool,

    /// User the reports belong to
    #[arg(long)]
    user_id: Option<String>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    document: Option<ProcessedDocument>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let jobs = args.jobs.max(1);

    let handle = load_config(config_path)?;
    let mut tuned = GatewayConfig::clone(&handle.snapshot());
    tuned.ocr.worker_threads = jobs;
    let config = handle.replace(tuned)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            config
                .files
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
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

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut processor = DocumentProcessor::from_config(Arc::clone(&config));
    if args.enhance {
        processor = processor.with_enhancer(Arc::new(KeywordEnhancer));
    }
    let processor = Arc::new(processor);
    let permits = Arc::new(Semaphore::new(jobs));

    let mut tasks = JoinSet::new();
    for (index, path) in files.into_iter().enumerate() {
        let processor = Arc::clone(&processor);
        let permits = Arc::clone(&permits);
        let (hint, method) = (args.doc_type, args.ocr);

        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let file_start = Instant::now();
            let outcome = processor.process_file(&path, hint, method).await;
            let processing_time_ms = file_start.elapsed().as_millis() as u64;

            let result = match outcome {
                Ok(document) => ProcessResult {
                    path,
                    document: Some(document),
                    error: None,
                    processing_time_ms,
                },
                Err(e) => ProcessResult {
                    path,
                    document: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                },
            };
            (index, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        overall_pb.inc(1);

        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                overall_pb.abandon();
                anyhow::bail!("Processing failed: {}", error_msg);
            }
        }
        results.push((index, result));
    }
    results.sort_by_key(|(index, _)| *index);
    let results: Vec<ProcessResult> = results.into_iter().map(|(_, r)| r).collect();

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.document.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(document) = &result.document {
                write_output(output_dir, &result.path, document, args.format)?;
            }
        }
    }

    if args.report {
        let reporter = BackendReporter::new(&config.backend);
        if reporter.is_enabled() {
            let user_id = args.user_id.as_deref().unwrap_or_default();
            for result in &results {
                let report = match (&result.document, &result.error) {
                    (Some(document), _) => ProcessingReport::succeeded(document.clone()),
                    (None, error) => ProcessingReport::failed(
                        error.clone().unwrap_or_else(|| "unknown error".to_string()),
                    ),
                };
                reporter.send(user_id, &report).await;
            }
        } else {
            warn!("No backend URL configured, reports skipped");
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

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
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

fn write_output(
    output_dir: &Path,
    source: &Path,
    document: &ProcessedDocument,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let output_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)?,
        format => render(&document.analysis, Some(&document.ocr_result), format)?,
    };

    fs::write(&output_path, content)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "document_type",
        "method_used",
        "ocr_confidence",
        "parse_confidence",
        "invoice_number",
        "total_amount",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let elapsed = result.processing_time_ms.to_string();

        match &result.document {
            Some(document) => {
                let data = document.analysis.processed_data.as_ref();
                let (invoice_number, total_amount) = match data {
                    Some(ParsedDocument::Invoice(invoice)) => (
                        invoice.invoice_number.clone().unwrap_or_default(),
                        invoice.total_amount.map(|a| a.to_string()).unwrap_or_default(),
                    ),
                    _ => (String::new(), String::new()),
                };
                let parse_confidence = data
                    .map(|d| format!("{:.2}", d.confidence()))
                    .unwrap_or_default();

                wtr.write_record([
                    filename,
                    "success",
                    document.analysis.document_type.as_str(),
                    document.ocr_result.method_used.to_string().as_str(),
                    format!("{:.2}", document.ocr_result.confidence).as_str(),
                    parse_confidence.as_str(),
                    invoice_number.as_str(),
                    total_amount.as_str(),
                    elapsed.as_str(),
                    "",
                ])?;
            }
            None => {
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    elapsed.as_str(),
                    result.error.as_deref().unwrap_or(""),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
