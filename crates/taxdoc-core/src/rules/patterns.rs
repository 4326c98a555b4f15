//! Common regex patterns for bank statement and invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Optional separator, currency prefix and number that follow a money label.
const MONEY_TAIL: &str =
    r"[ \t]*(?:[:\-][ \t]*)?(?:(?:₹|\bRs\b\.?|\bINR\b)[ \t]*)?([0-9][0-9,]*(?:\.[0-9]+)?)";

fn labelled_money(label: &str) -> Regex {
    Regex::new(&format!(r"(?i){}{}", label, MONEY_TAIL)).unwrap()
}

lazy_static! {
    // Dates, in the order they are tried
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b"
    ).unwrap();

    pub static ref DATE_DAY_MONTH: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?[ \t]+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?[ \t]+(\d{2,4})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[/-](\d{1,2})[/-](\d{1,2})\b"
    ).unwrap();

    // Statement line amounts, in the order they are tried
    pub static ref AMOUNT_RUPEE: Regex = Regex::new(
        r"₹\s*([0-9,]+\.?[0-9]*)"
    ).unwrap();

    pub static ref AMOUNT_RS: Regex = Regex::new(
        r"(?i)\brs\.?\s*([0-9,]+\.?[0-9]*)"
    ).unwrap();

    pub static ref AMOUNT_DECIMAL: Regex = Regex::new(
        r"\b([0-9][0-9,]*\.[0-9]{2})\b"
    ).unwrap();

    pub static ref AMOUNT_INTEGER: Regex = Regex::new(
        r"\b([0-9][0-9,]*)\b"
    ).unwrap();

    // Anything amount-shaped, removed from descriptions
    pub static ref AMOUNT_SHAPED: Regex = Regex::new(
        r"(?i)(?:₹|\brs\.?)?[ \t]*\b[0-9][0-9,]*(?:\.[0-9]+)?\b"
    ).unwrap();

    pub static ref DEBIT_CREDIT_MARKER: Regex = Regex::new(
        r"(?i)\b(?:dr|cr)\b\.?"
    ).unwrap();

    // Statement metadata
    pub static ref ACCOUNT_NUMBER: Regex = Regex::new(
        r"(?i)\b(?:account|a/c|acct)[ \t]*(?:no\.?|number|num|#)[ \t]*[:.\-]?[ \t]*([0-9Xx*]{4,})"
    ).unwrap();

    pub static ref BANK_KNOWN: Regex = Regex::new(
        r"(?i)\b(hdfc|icici|sbi|axis|kotak|pnb|bob|canara)\b"
    ).unwrap();

    pub static ref BANK_GENERIC: Regex = Regex::new(
        r"\b((?:[A-Z][A-Za-z&.]*[ \t]+){1,4}(?:BANK|Bank))\b"
    ).unwrap();

    pub static ref STATEMENT_PERIOD: Regex = Regex::new(
        r"(?im)\bstatement[ \t]+period[ \t]*:?[ \t]*(.+?)[ \t]*$"
    ).unwrap();

    // Invoice numbers, in priority order
    pub static ref INVOICE_NUMBER_PATTERNS: Vec<Regex> = vec![
        Regex::new(
            r"(?i)\binvoice[ \t]*(?:no\.?|number|num|#)?[ \t]*[:#.\-]?[ \t]*([A-Za-z0-9/\-]*\d[A-Za-z0-9/\-]*)"
        ).unwrap(),
        Regex::new(
            r"(?i)\binv\b\.?[ \t]*(?:no\.?|number|#)?[ \t]*[:#\-]?[ \t]*([A-Za-z0-9/\-]*\d[A-Za-z0-9/\-]*)"
        ).unwrap(),
        Regex::new(
            r"(?i)\bbill\b[ \t]*(?:no\.?|number|#)?[ \t]*[:#.\-]?[ \t]*([A-Za-z0-9/\-]*\d[A-Za-z0-9/\-]*)"
        ).unwrap(),
    ];

    // Vendor labels, in priority order
    pub static ref VENDOR_PATTERNS: Vec<Regex> = vec![
        Regex::new(
            r"(?i)\bfrom[ \t]*:?[ \t]*([A-Za-z][A-Za-z0-9 \t&.,'()\-]*?)[ \t]*(?:\bgst|\btax|\r|\n|$)"
        ).unwrap(),
        Regex::new(
            r"(?i)\bvendor(?:[ \t]+name)?[ \t]*:?[ \t]*([A-Za-z][A-Za-z0-9 \t&.,'()\-]*?)[ \t]*(?:\bgst|\btax|\r|\n|$)"
        ).unwrap(),
        Regex::new(
            r"(?i)\bbill[ \t]+to[ \t]*:?[ \t]*([A-Za-z][A-Za-z0-9 \t&.,'()\-]*?)[ \t]*(?:\bgst|\btax|\r|\n|$)"
        ).unwrap(),
    ];

    pub static ref GSTIN_LABELLED: Regex = Regex::new(
        r"(?i)\bgstin\b[ \t]*(?:no\.?|number)?[ \t]*[:\-]?[ \t]*([A-Z0-9]{15})\b"
    ).unwrap();

    pub static ref GSTIN_FORMAT: Regex = Regex::new(
        r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$"
    ).unwrap();

    // Invoice totals, in priority order
    pub static ref TOTAL_PATTERNS: Vec<Regex> = vec![
        labelled_money(r"\bgrand[ \t]+total\b"),
        labelled_money(r"\btotal[ \t]+amount\b"),
        labelled_money(r"\bamount[ \t]+payable\b"),
        labelled_money(r"\bnet[ \t]+payable\b"),
    ];

    /// Plain `total`; group 1 is set when the label is actually a sub total.
    pub static ref TOTAL_PLAIN: Regex = Regex::new(&format!(
        r"(?i)\b(sub[ \t\-]*)?total\b{}",
        MONEY_TAIL
    )).unwrap();

    /// Tax labels with an optional rate; every match is summed.
    pub static ref TAX_AMOUNT: Regex = Regex::new(
        r"(?i)\b(?:[csi]?gst|tax)\b[ \t]*(?:\(?[ \t]*@?[ \t]*[0-9.]+[ \t]*%[ \t]*\)?)?[ \t]*(?:[:\-][ \t]*)?(?:(?:₹|\bRs\b\.?|\bINR\b)[ \t]*)?([0-9][0-9,]*(?:\.[0-9]+)?)(?:[^%0-9]|$)"
    ).unwrap();

    /// A digit sequence followed by a currency marker.
    pub static ref LINE_ITEM: Regex = Regex::new(
        r"(?i)\d+(?:\.\d+)?[ \t]*(?:₹|\brs\b\.?|\binr\b)"
    ).unwrap();
}
