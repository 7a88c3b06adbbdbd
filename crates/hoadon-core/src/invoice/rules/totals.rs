//! Subtotal, VAT and total extraction.
//!
//! Each field has a fixed cascade of keyword-anchored tiers, tried in order:
//! comma-grouped, dot-grouped, bare digits, any number. Every candidate is
//! normalized and must fall inside the field's plausibility window; a rejected
//! candidate moves on to the next tier. When all tiers fail, the whole line is
//! scanned for a plausible amount.

use regex::Regex;

use crate::models::config::AmountWindow;

use super::amounts::normalize_amount;
use super::patterns::{
    AMOUNT_LINE_PREFIX, COMMA_GROUPED, CURRENCY_SUFFIX, DOT_GROUPED, LOOSE_NUMBER, PART_SPLIT,
    PERCENT_TOKEN, PLAIN_RUN, SUBTOTAL_BARE, SUBTOTAL_COMMA, SUBTOTAL_DOT, SUBTOTAL_GENERIC,
    TAX_ID, TOTAL_BARE, TOTAL_COMMA, TOTAL_DOT, TOTAL_GENERIC, VAT_BARE, VAT_COMMA, VAT_DOT,
    VAT_GENERIC,
};
use super::{ExtractionMatch, FieldExtractor};

/// Monetary field handled by an [`AmountExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    Subtotal,
    Vat,
    Total,
}

impl AmountField {
    pub fn name(&self) -> &'static str {
        match self {
            AmountField::Subtotal => "subtotal",
            AmountField::Vat => "vat",
            AmountField::Total => "total",
        }
    }
}

/// Tier that produced an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountRule {
    /// `68,391`
    CommaGrouped,
    /// `68.391`
    DotGrouped,
    /// `68391`
    BareDigits,
    /// Any digit run with separators directly after the keyword.
    Generic,
    /// Keyword-free scan of the whole line.
    LineScan,
}

impl AmountRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountRule::CommaGrouped => "comma_grouped",
            AmountRule::DotGrouped => "dot_grouped",
            AmountRule::BareDigits => "bare_digits",
            AmountRule::Generic => "generic",
            AmountRule::LineScan => "line_scan",
        }
    }
}

/// Keyword-gated amount extractor for one field.
#[derive(Debug, Clone)]
pub struct AmountExtractor {
    field: AmountField,
    window: AmountWindow,
}

impl AmountExtractor {
    pub fn new(field: AmountField, window: AmountWindow) -> Self {
        Self { field, window }
    }

    /// "Tổng tiền hàng" lines.
    pub fn subtotal(window: AmountWindow) -> Self {
        Self::new(AmountField::Subtotal, window)
    }

    /// "VAT"/"Thuế" lines that are not totals.
    pub fn vat(window: AmountWindow) -> Self {
        Self::new(AmountField::Vat, window)
    }

    /// "Tổng cộng" lines.
    pub fn total(window: AmountWindow) -> Self {
        Self::new(AmountField::Total, window)
    }

    pub fn field(&self) -> AmountField {
        self.field
    }

    pub fn window(&self) -> AmountWindow {
        self.window
    }

    fn tiers(&self) -> [(AmountRule, &'static Regex); 4] {
        match self.field {
            AmountField::Subtotal => [
                (AmountRule::CommaGrouped, &*SUBTOTAL_COMMA),
                (AmountRule::DotGrouped, &*SUBTOTAL_DOT),
                (AmountRule::BareDigits, &*SUBTOTAL_BARE),
                (AmountRule::Generic, &*SUBTOTAL_GENERIC),
            ],
            AmountField::Vat => [
                (AmountRule::CommaGrouped, &*VAT_COMMA),
                (AmountRule::DotGrouped, &*VAT_DOT),
                (AmountRule::BareDigits, &*VAT_BARE),
                (AmountRule::Generic, &*VAT_GENERIC),
            ],
            AmountField::Total => [
                (AmountRule::CommaGrouped, &*TOTAL_COMMA),
                (AmountRule::DotGrouped, &*TOTAL_DOT),
                (AmountRule::BareDigits, &*TOTAL_BARE),
                (AmountRule::Generic, &*TOTAL_GENERIC),
            ],
        }
    }

    /// Run the tier cascade, returning the amount and the tier that fired.
    pub fn extract_amount(&self, line: &str) -> Option<(f64, AmountRule)> {
        for (rule, pattern) in self.tiers() {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let Some(group) = caps.get(1) else {
                continue;
            };
            if followed_by_percent(line, group.end()) {
                continue;
            }
            let amount = normalize_amount(group.as_str());
            if self.window.accepts(amount) {
                return Some((amount, rule));
            }
        }

        let amount = amount_from_line(line, self.window);
        (amount > 0.0).then_some((amount, AmountRule::LineScan))
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = f64;

    fn applies_to(&self, line_lower: &str) -> bool {
        match self.field {
            AmountField::Subtotal => line_lower.contains("tổng tiền hàng"),
            AmountField::Vat => is_vat_line(line_lower),
            AmountField::Total => line_lower.contains("tổng cộng"),
        }
    }

    fn extract(&self, line: &str) -> Option<ExtractionMatch<f64>> {
        if !self.applies_to(&line.to_lowercase()) {
            return None;
        }
        self.extract_amount(line)
            .map(|(amount, rule)| ExtractionMatch::new(amount, rule.as_str(), line))
    }
}

/// VAT keyword without "tổng", on a line that is not the seller's tax code.
pub fn is_vat_line(line_lower: &str) -> bool {
    (line_lower.contains("vat") || line_lower.contains("thuế"))
        && !line_lower.contains("tổng")
        && !TAX_ID.is_match(line_lower)
}

fn followed_by_percent(line: &str, end: usize) -> bool {
    line[end..].trim_start().starts_with('%')
}

/// Keyword-free scan of an amount line. Returns the first plausible
/// comma-grouped, then dot-grouped number, then the largest plausible plain
/// digit run, then the first plausible loose number; `0.0` if none qualifies.
/// Percent rates are removed before scanning.
pub fn amount_from_line(line: &str, window: AmountWindow) -> f64 {
    let stripped = AMOUNT_LINE_PREFIX.replace(line.trim(), "");
    let stripped = CURRENCY_SUFFIX.replace(&stripped, "");
    let cleaned = PERCENT_TOKEN.replace_all(stripped.trim(), " ");

    for pattern in [&*COMMA_GROUPED, &*DOT_GROUPED] {
        let found = pattern
            .find_iter(&cleaned)
            .map(|m| normalize_amount(m.as_str()))
            .find(|amount| window.accepts(*amount));
        if let Some(amount) = found {
            return amount;
        }
    }

    let largest_plain = PLAIN_RUN
        .find_iter(&cleaned)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|amount| window.accepts(*amount))
        .reduce(f64::max);
    if let Some(amount) = largest_plain {
        return amount;
    }

    PART_SPLIT
        .split(&cleaned)
        .filter_map(|part| LOOSE_NUMBER.find(part))
        .map(|m| normalize_amount(m.as_str()))
        .find(|amount| window.accepts(*amount))
        .unwrap_or(0.0)
}
