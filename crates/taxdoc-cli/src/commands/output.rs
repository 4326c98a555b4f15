//! Rendering of parse results as JSON, CSV or plain text.

use taxdoc_core::pipeline::DocumentAnalysis;
use taxdoc_core::{BankStatementResult, InvoiceResult, OcrResult, ParsedDocument};

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

/// Render an analysis; `ocr` adds the OCR line to text output.
pub fn render(
    analysis: &DocumentAnalysis,
    ocr: Option<&OcrResult>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(analysis)?),
        OutputFormat::Csv => format_csv(analysis),
        OutputFormat::Text => Ok(format_text(analysis, ocr)),
    }
}

fn format_csv(analysis: &DocumentAnalysis) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    match &analysis.processed_data {
        Some(ParsedDocument::BankStatement(statement)) => {
            wtr.write_record(["date", "description", "amount", "direction", "category", "confidence"])?;
            for t in &statement.transactions {
                wtr.write_record([
                    t.date.as_deref().unwrap_or(""),
                    t.description.as_str(),
                    t.amount.map(|a| a.to_string()).unwrap_or_default().as_str(),
                    t.direction.as_str(),
                    t.category.as_str(),
                    format!("{:.2}", t.confidence).as_str(),
                ])?;
            }
        }
        Some(ParsedDocument::Invoice(invoice)) => {
            wtr.write_record([
                "invoice_number",
                "date",
                "vendor_name",
                "vendor_gstin",
                "total_amount",
                "tax_amount",
                "confidence",
            ])?;
            wtr.write_record([
                invoice.invoice_number.as_deref().unwrap_or(""),
                invoice.date.as_deref().unwrap_or(""),
                invoice.vendor_name.as_deref().unwrap_or(""),
                invoice.vendor_gstin.as_deref().unwrap_or(""),
                invoice.total_amount.map(|a| a.to_string()).unwrap_or_default().as_str(),
                invoice.tax_amount.map(|a| a.to_string()).unwrap_or_default().as_str(),
                format!("{:.2}", invoice.confidence).as_str(),
            ])?;
        }
        None => {
            wtr.write_record(["document_type"])?;
            wtr.write_record([analysis.document_type.as_str()])?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(analysis: &DocumentAnalysis, ocr: Option<&OcrResult>) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document type: {}\n", analysis.document_type));
    if let Some(ocr) = ocr {
        output.push_str(&format!(
            "Text source: {} ({:.1}% confidence, {:.2}s)\n",
            ocr.method_used,
            ocr.confidence * 100.0,
            ocr.processing_time
        ));
    }
    output.push('\n');

    match &analysis.processed_data {
        Some(ParsedDocument::BankStatement(statement)) => format_statement(&mut output, statement),
        Some(ParsedDocument::Invoice(invoice)) => format_invoice(&mut output, invoice),
        None => output.push_str("No structured data for this document type.\n"),
    }

    if let Some(enhanced) = &analysis.enhanced_data {
        let summary = &enhanced.ai_summary;
        output.push_str("\nEnhancement:\n");
        output.push_str(&format!("  Business expenses: {}\n", summary.total_business_expenses));
        output.push_str(&format!("  GST applicable:    {}\n", summary.gst_applicable_amount));
        output.push_str(&format!("  Categories:        {}\n", summary.categories_found.join(", ")));
    }

    output
}

fn format_statement(output: &mut String, statement: &BankStatementResult) {
    for (key, value) in &statement.account_details {
        output.push_str(&format!("{}: {}\n", key, value));
    }
    if !statement.account_details.is_empty() {
        output.push('\n');
    }

    output.push_str(&format!("Transactions: {}\n", statement.summary.total_transactions));
    for t in &statement.transactions {
        output.push_str(&format!(
            "  {:<12} {:<40} {:>12} {:<6} {}\n",
            t.date.as_deref().unwrap_or("-"),
            t.description,
            t.amount.map(|a| a.to_string()).unwrap_or_default(),
            t.direction.as_str(),
            t.category
        ));
    }

    let summary = &statement.summary;
    output.push('\n');
    output.push_str("Summary:\n");
    output.push_str(&format!("  Debits:  {}\n", summary.total_debits));
    output.push_str(&format!("  Credits: {}\n", summary.total_credits));
    output.push_str(&format!("  Net:     {}\n", summary.net_amount));
    if let (Some(start), Some(end)) = (summary.period_start, summary.period_end) {
        output.push_str(&format!("  Period:  {} to {}\n", start, end));
    }
    output.push_str(&format!(
        "\nParsing confidence: {:.1}%\n",
        statement.parsing_confidence * 100.0
    ));
}

fn format_invoice(output: &mut String, invoice: &InvoiceResult) {
    let field = |value: Option<&str>| value.unwrap_or("-").to_string();

    output.push_str(&format!("Invoice: {}\n", field(invoice.invoice_number.as_deref())));
    output.push_str(&format!("Date:    {}\n", field(invoice.date.as_deref())));
    output.push_str(&format!("Vendor:  {}\n", field(invoice.vendor_name.as_deref())));
    if let Some(gstin) = &invoice.vendor_gstin {
        let status = match invoice.vendor_gstin_valid {
            Some(true) => "valid",
            Some(false) => "invalid checksum",
            None => "unchecked",
        };
        output.push_str(&format!("GSTIN:   {} ({})\n", gstin, status));
    }
    output.push('\n');

    if !invoice.line_items.is_empty() {
        output.push_str("Line items:\n");
        for item in &invoice.line_items {
            output.push_str(&format!("  {} x{}  {}\n", item.description, item.quantity, item.amount));
        }
        output.push('\n');
    }

    let total = invoice.total_amount.map(|a| a.to_string());
    let tax = invoice.tax_amount.map(|a| a.to_string());
    output.push_str(&format!("Total: {}\n", field(total.as_deref())));
    output.push_str(&format!("Tax:   {}\n", field(tax.as_deref())));
    output.push_str(&format!("\nConfidence: {:.1}%\n", invoice.confidence * 100.0));
}
