//! Process command - extract data from a single document.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use taxdoc_core::{
    BackendReporter, DocumentHint, DocumentProcessor, KeywordEnhancer, OcrMethod,
    ProcessingReport,
};

use super::load_config;
use super::output::{render, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Document type (auto, bank_statement, invoice, gst_notice, other)
    #[arg(short = 't', long = "type", default_value = "auto")]
    doc_type: DocumentHint,

    /// OCR engine (auto, azure, google_vision, easyocr, tesseract)
    #[arg(long, default_value = "auto")]
    ocr: OcrMethod,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Annotate bank statement transactions
    #[arg(long)]
    enhance: bool,

    /// Send the result to the configured backend
    #[arg(long, requires = "user_id")]
    report: bool,

    /// User the report belongs to
    #[arg(long)]
    user_id: Option<String>,

    /// Show OCR and extraction confidence scores
    #[arg(long)]
    show_confidence: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?.snapshot();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Probing OCR engines...");

    let mut processor = DocumentProcessor::from_config(Arc::clone(&config));
    if args.enhance {
        processor = processor.with_enhancer(Arc::new(KeywordEnhancer));
    }
    debug!("OCR engines: {:?}", processor.ocr().service().registry().available());

    pb.set_message("Extracting text...");
    let outcome = processor
        .process_file(&args.input, args.doc_type, args.ocr)
        .await;
    pb.finish_and_clear();

    if args.report {
        let reporter = BackendReporter::new(&config.backend);
        let report = match &outcome {
            Ok(document) => ProcessingReport::succeeded(document.clone()),
            Err(e) => ProcessingReport::failed(e.to_string()),
        };
        let user_id = args.user_id.as_deref().unwrap_or_default();
        match reporter.try_send(user_id, &report).await {
            Ok(true) => eprintln!("{} Result sent to backend", style("✓").green()),
            Ok(false) => eprintln!(
                "{} No backend URL configured, report skipped",
                style("ℹ").blue()
            ),
            Err(e) => eprintln!("{} {}", style("⚠").yellow(), e),
        }
    }

    let document = outcome?;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&document)?,
        format => render(&document.analysis, Some(&document.ocr_result), format)?,
    };

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

    if args.show_confidence {
        println!();
        println!(
            "{} OCR: {} ({:.1}%)",
            style("ℹ").blue(),
            document.ocr_result.method_used,
            document.ocr_result.confidence * 100.0
        );
        if let Some(data) = &document.analysis.processed_data {
            println!(
                "{} Extraction confidence: {:.1}%",
                style("ℹ").blue(),
                data.confidence() * 100.0
            );
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
