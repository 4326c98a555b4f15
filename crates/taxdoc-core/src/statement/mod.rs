//! Bank statement parsing.

mod line;
mod parser;

pub use line::{classify_direction, clean_description, parse_transaction_line};
pub use parser::{extract_account_details, parsing_confidence, summarize, StatementParser};
