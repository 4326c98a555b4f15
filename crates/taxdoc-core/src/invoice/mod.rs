//! Invoice field extraction module.

mod parser;

pub use parser::{extract_invoice_number, extract_tax, extract_total, extract_vendor_name, InvoiceParser};
