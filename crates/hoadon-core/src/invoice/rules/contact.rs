//! Seller contact fields: phone number and address.

use super::patterns::{
    ADDRESS_KEYWORDS, ADDRESS_LABEL, PHONE_INTL, PHONE_LOCAL, PHONE_SHAPE, TAX_ID,
};
use super::{ExtractionMatch, FieldExtractor};

/// Vietnamese phone-number extractor (`+84`, `84` or leading `0`).
///
/// Seller tax codes share the 10-digit shape and are masked first.
pub struct PhoneExtractor;

impl PhoneExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PhoneExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PhoneExtractor {
    type Output = String;

    fn extract(&self, line: &str) -> Option<ExtractionMatch<String>> {
        let line = TAX_ID.replace_all(line, " ");
        for (rule, pattern) in [("international", &*PHONE_INTL), ("local", &*PHONE_LOCAL)] {
            for m in pattern.find_iter(&line) {
                let phone = strip_phone_separators(m.as_str());
                if PHONE_SHAPE.is_match(&phone) {
                    return Some(ExtractionMatch::new(phone, rule, m.as_str()));
                }
            }
        }
        None
    }
}

/// Remove spaces, dots and hyphens between digit groups.
pub fn strip_phone_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-') && !c.is_whitespace())
        .collect()
}

/// Address-line extractor; the leading label is stripped.
pub struct AddressExtractor;

impl AddressExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AddressExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AddressExtractor {
    type Output = String;

    fn applies_to(&self, line_lower: &str) -> bool {
        ADDRESS_KEYWORDS.iter().any(|kw| line_lower.contains(kw))
    }

    fn extract(&self, line: &str) -> Option<ExtractionMatch<String>> {
        if !self.applies_to(&line.to_lowercase()) {
            return None;
        }

        let address = ADDRESS_LABEL.replace(line.trim(), "");
        let address = address.trim();
        if address.chars().count() <= 5 {
            return None;
        }

        Some(ExtractionMatch::new(address.to_string(), "address_keyword", line))
    }
}
