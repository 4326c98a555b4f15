//! Engines command - report which OCR engines this host can use.

use clap::Args;
use console::style;
use serde::Serialize;

use taxdoc_core::ocr::EngineRegistry;
use taxdoc_core::pdf::is_pdftoppm_available;
use taxdoc_core::Engine;

use super::load_config;

/// Arguments for the engines command.
#[derive(Args)]
pub struct EnginesArgs {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct EngineStatus {
    engine: Engine,
    enabled: bool,
    available: bool,
}

#[derive(Serialize)]
struct EngineReport {
    engines: Vec<EngineStatus>,
    pdftoppm: bool,
    complexity_threshold: f64,
}

pub async fn run(args: EnginesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?.snapshot();
    let registry = EngineRegistry::probe(&config.ocr);

    let report = EngineReport {
        engines: Engine::PRIORITY
            .iter()
            .map(|&engine| EngineStatus {
                engine,
                enabled: config.ocr.enabled_engines.contains(&engine),
                available: registry.contains(engine),
            })
            .collect(),
        pdftoppm: is_pdftoppm_available(&config.pdf.pdftoppm_command),
        complexity_threshold: config.ocr.complexity_threshold,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("OCR engines (priority order):");
    for status in &report.engines {
        let state = if status.available {
            style("available").green()
        } else if status.enabled {
            style("unavailable").red()
        } else {
            style("disabled").yellow()
        };
        println!("  {:<14} {}", status.engine.as_str(), state);
    }

    println!();
    let pdftoppm = if report.pdftoppm {
        style("available").green()
    } else {
        style("unavailable").yellow()
    };
    println!("pdftoppm:            {}", pdftoppm);
    println!("Complexity threshold: {}", report.complexity_threshold);

    if registry.is_empty() {
        println!();
        println!(
            "{} No OCR engine is available; image documents will return no text.",
            style("⚠").yellow()
        );
    }

    Ok(())
}
