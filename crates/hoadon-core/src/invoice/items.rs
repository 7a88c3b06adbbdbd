//! Line-item segmentation.
//!
//! Receipts carry no table structure once they go through OCR, so items are
//! found positionally: after the header block and before the first totals
//! keyword, every line that ends in a number is treated as a purchase.

use crate::models::invoice::LineItem;

use super::rules::amounts_in_line;
use super::rules::patterns::{
    EQUALS_SIGN, ITEM_NAME_NOISE, ITEM_ORDINAL_PREFIX, ITEM_SECTION_STOPWORDS, ITEM_STOPWORDS,
    ITEM_TRAILING_AMOUNT, LEADING_DATE, LEADING_PHONE, NUMBER_TOKEN, QUANTITY_MARKER,
    TOTALS_KEYWORDS, WHITESPACE_RUN,
};

/// Shortest line considered as an item.
const MIN_ITEM_LINE_CHARS: usize = 5;

/// Shortest item name kept after numbers are stripped.
const MIN_ITEM_NAME_CHARS: usize = 2;

/// Parse the items region of a receipt.
///
/// The first `header_lines` raw lines are skipped; the region ends at the
/// first line carrying a totals keyword.
pub fn segment_items(lines: &[&str], header_lines: usize) -> Vec<LineItem> {
    let mut items = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() || index < header_lines {
            continue;
        }

        let lower = line.to_lowercase();
        if TOTALS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            break;
        }

        if let Some(item) = parse_item_line(line) {
            items.push(item);
        }
    }

    items
}

/// Parse one line as `name [qty x] [unit_price] amount`.
pub fn parse_item_line(line: &str) -> Option<LineItem> {
    let line = line.trim();
    if line.chars().count() < MIN_ITEM_LINE_CHARS
        || LEADING_DATE.is_match(line)
        || LEADING_PHONE.is_match(line)
        || ITEM_STOPWORDS.is_match(line)
    {
        return None;
    }

    let quantity = QUANTITY_MARKER
        .captures(line)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|qty| *qty > 0.0)
        .unwrap_or(1.0);

    // The `<qty> x` token is dropped before counting numeric tokens, so the
    // second-to-last token is a price and never the quantity
    let priced = QUANTITY_MARKER.replace(line, " ");
    let amounts = amounts_in_line(&priced);
    let amount = *amounts.last()?;
    let unit_price = match amounts.len() {
        n if n >= 2 => amounts[n - 2],
        _ => amount / quantity,
    };

    let name = NUMBER_TOKEN.replace_all(&priced, " ");
    let name = EQUALS_SIGN.replace_all(&name, " ");
    let name = WHITESPACE_RUN.replace_all(name.trim(), " ");
    let name = ITEM_NAME_NOISE.replace(&name, "");
    let name = name.trim();

    if name.chars().count() < MIN_ITEM_NAME_CHARS {
        return None;
    }

    Some(LineItem {
        name: name.to_string(),
        quantity,
        unit_price,
        amount,
    })
}

/// Whole-text item scan used when the positional segmenter finds nothing.
///
/// Header and totals lines are skipped until the first item-looking line;
/// after that, the next header or totals line ends the scan.
pub fn scan_items(full_text: &str) -> Vec<LineItem> {
    let mut items = Vec::new();
    let mut in_items = false;

    for line in full_text.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if ITEM_SECTION_STOPWORDS.is_match(line) {
            if in_items {
                break;
            }
            continue;
        }

        if looks_like_item(line) {
            in_items = true;
            if let Some(item) = parse_item_line(line) {
                items.push(item);
            }
        }
    }

    items
}

fn looks_like_item(line: &str) -> bool {
    if ITEM_ORDINAL_PREFIX.is_match(line)
        || QUANTITY_MARKER.is_match(line)
        || ITEM_TRAILING_AMOUNT.is_match(line)
    {
        return true;
    }

    line.chars().count() > MIN_ITEM_LINE_CHARS
        && line.chars().any(|c| c.is_ascii_digit())
        && !LEADING_DATE.is_match(line)
        && !LEADING_PHONE.is_match(line)
}
