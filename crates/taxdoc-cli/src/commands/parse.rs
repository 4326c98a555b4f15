//! Parse command - run detection and extraction on already-recognised text.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::info;

use taxdoc_core::{DocumentHint, DocumentProcessor, KeywordEnhancer};

use super::load_config;
use super::output::{render, OutputFormat};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Text file to parse ("-" reads stdin)
    #[arg(required = true)]
    input: PathBuf,

    /// Document type (auto, bank_statement, invoice, gst_notice, other)
    #[arg(short = 't', long = "type", default_value = "auto")]
    doc_type: DocumentHint,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Annotate bank statement transactions
    #[arg(long)]
    enhance: bool,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?.snapshot();

    let text = if args.input.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(&args.input)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.input.display(), e))?
    };
    info!("Parsing {} characters", text.len());

    let mut processor = DocumentProcessor::without_ocr(config);
    if args.enhance {
        processor = processor.with_enhancer(Arc::new(KeywordEnhancer));
    }

    let analysis = processor.process_text(&text, args.doc_type);
    let output = render(&analysis, None, args.format)?;

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

    Ok(())
}
