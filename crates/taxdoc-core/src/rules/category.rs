//! Deterministic keyword categories for transaction descriptions.

/// Category used when no keyword matches.
pub const MISCELLANEOUS: &str = "miscellaneous";

/// Ordered keyword table; the first category with a matching keyword wins.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("food", &["restaurant", "food", "cafe", "hotel", "dining", "swiggy", "zomato"]),
    ("fuel", &["petrol", "diesel", "fuel", "gas", "hp", "ioc", "bpcl"]),
    ("utilities", &["electricity", "water", "gas", "phone", "internet", "broadband"]),
    ("transport", &["uber", "ola", "taxi", "metro", "bus", "auto"]),
    ("shopping", &["amazon", "flipkart", "mall", "store", "purchase"]),
    ("medical", &["hospital", "pharmacy", "doctor", "medical", "clinic"]),
    ("education", &["school", "college", "university", "course", "training"]),
    ("entertainment", &["movie", "cinema", "netflix", "spotify", "game"]),
];

/// Categorize a cleaned transaction description.
///
/// Keywords are plain substrings of the lower-cased description.
pub fn categorize(description: &str) -> &'static str {
    let desc = description.to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| desc.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(MISCELLANEOUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_examples() {
        assert_eq!(categorize("Payment to Swiggy"), "food");
        assert_eq!(categorize("Petrol Pump Payment"), "fuel");
        assert_eq!(categorize("Unknown Payment"), "miscellaneous");
        assert_eq!(categorize("ATM Withdrawal"), "miscellaneous");
    }

    #[test]
    fn test_table_order_decides_overlaps() {
        // "gas" is listed under both fuel and utilities
        assert_eq!(categorize("Indane Gas refill"), "fuel");
        assert_eq!(categorize("NETFLIX SUBSCRIPTION"), "entertainment");
        assert_eq!(categorize("Apollo Pharmacy"), "medical");
    }
}
