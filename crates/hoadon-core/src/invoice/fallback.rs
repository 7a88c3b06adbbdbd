//! Whole-text safety net for fields the line pass could not resolve.
//!
//! These extractors look at the full OCR text (and at the concatenation of
//! every OCR block) with looser patterns. They trade precision for recall and
//! only run for fields that are still empty.

use crate::models::config::ExtractionConfig;
use crate::models::invoice::LineItem;

use super::items::scan_items;
use super::rules::patterns::{
    ADDRESS_KEYWORDS, ADDRESS_LABEL, INVOICE_LABELED_ANY, INVOICE_LETTER_CODE,
    INVOICE_PREFIXED_CODE, INVOICE_PREFIXED_SUFFIX, ITEM_SECTION_STOPWORDS, LEADING_CODE,
    LEADING_DATE, LEADING_DIGIT, LEADING_PHONE, LOOSE_NUMBER, PHONE_BARE, PHONE_SHAPE_LOOSE,
    SELLER_FALLBACK_STOPWORDS, SUBTOTAL_ANY, TAX_ID, TOTAL_ANY, VAT_ANY,
};
use super::rules::{
    DateExtractor, FieldExtractor, InvoiceNumberExtractor, PhoneExtractor, amounts_in_line,
    is_vat_line, normalize_amount,
};

/// Totals at or above this are treated as parsing errors.
const TOTAL_CEILING: f64 = 1_000_000_000.0;

/// Range for the last-resort "largest number on the receipt" total guess.
const TOTAL_GUESS_MIN: f64 = 10_000.0;
const TOTAL_GUESS_MAX: f64 = 10_000_000.0;

/// Shortest whole-text receipt number accepted.
const MIN_INVOICE_NUMBER_CHARS: usize = 6;

/// Shortest line considered by the address heuristic.
const MIN_ADDRESS_LINE_CHARS: usize = 10;

/// Whole-text extractors over one OCR result.
pub struct WholeTextFallback<'a> {
    full_text: &'a str,
    combined: &'a str,
    config: &'a ExtractionConfig,
}

impl<'a> WholeTextFallback<'a> {
    /// `full_text` is the first OCR block; `combined` joins every block.
    pub fn new(full_text: &'a str, combined: &'a str, config: &'a ExtractionConfig) -> Self {
        Self {
            full_text,
            combined,
            config,
        }
    }

    fn lines(&self) -> impl Iterator<Item = &'a str> {
        self.full_text.split('\n').map(str::trim)
    }

    /// Line rules over the leading lines, then looser code patterns over the
    /// combined text.
    pub fn invoice_number(&self) -> Option<String> {
        let extractor = InvoiceNumberExtractor::new();
        let by_line = self
            .lines()
            .take(self.config.invoice_scan_lines)
            .find_map(|line| extractor.extract(line));
        if let Some(m) = by_line {
            return Some(m.value);
        }

        for pattern in [
            &*INVOICE_PREFIXED_CODE,
            &*INVOICE_LETTER_CODE,
            &*INVOICE_PREFIXED_SUFFIX,
            &*INVOICE_LABELED_ANY,
        ] {
            let found = pattern.captures_iter(self.combined).find_map(|caps| {
                let candidate = caps[1].trim();
                let plausible = !PHONE_SHAPE_LOOSE.is_match(candidate)
                    && candidate.chars().count() >= MIN_INVOICE_NUMBER_CHARS
                    && candidate.chars().any(|c| c.is_ascii_digit());
                plausible.then(|| candidate.to_string())
            });
            if found.is_some() {
                return found;
            }
        }

        None
    }

    /// First valid `D/M/Y` date anywhere in the combined text.
    pub fn date(&self) -> Option<String> {
        DateExtractor::new().extract(self.combined).map(|m| m.value)
    }

    /// First plausible business name among the leading lines.
    pub fn seller_name(&self) -> Option<String> {
        self.lines()
            .take(self.config.seller_fallback_lines)
            .find(|line| {
                line.chars().count() > 2
                    && !LEADING_DIGIT.is_match(line)
                    && !LEADING_DATE.is_match(line)
                    && !LEADING_PHONE.is_match(line)
                    && !SELLER_FALLBACK_STOPWORDS.is_match(line)
                    && !LEADING_CODE.is_match(line)
            })
            .map(str::to_string)
    }

    /// Phone anywhere in the combined text; a bare 10-11 digit run is the
    /// last resort.
    pub fn phone(&self) -> Option<String> {
        if let Some(m) = PhoneExtractor::new().extract(self.combined) {
            return Some(m.value);
        }
        let text = TAX_ID.replace_all(self.combined, " ");
        PHONE_BARE.find(&text).map(|m| m.as_str().to_string())
    }

    /// Address keyword line, or a longer line mixing digits and letters.
    pub fn address(&self) -> Option<String> {
        let phones = PhoneExtractor::new();

        self.lines()
            .take(self.config.address_fallback_lines)
            .find(|line| {
                if line.chars().count() <= MIN_ADDRESS_LINE_CHARS {
                    return false;
                }
                let lower = line.to_lowercase();
                if ADDRESS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                    return true;
                }
                line.chars().any(|c| c.is_ascii_digit())
                    && line.chars().any(char::is_alphabetic)
                    && !ITEM_SECTION_STOPWORDS.is_match(line)
                    && !LEADING_DATE.is_match(line)
                    && !LEADING_CODE.is_match(line)
                    && phones.extract(line).is_none()
            })
            .map(|line| ADDRESS_LABEL.replace(line, "").trim().to_string())
    }

    /// First amount above the minimum on a "tiền hàng" line, then any
    /// subtotal-labelled number in the combined text.
    pub fn subtotal(&self) -> Option<f64> {
        let min = self.config.amount_window.min;

        let by_line = self
            .lines()
            .filter(|line| line.to_lowercase().contains("tiền hàng"))
            .flat_map(amounts_in_line)
            .find(|amount| *amount > min);
        if by_line.is_some() {
            return by_line;
        }

        SUBTOTAL_ANY
            .captures_iter(self.combined)
            .map(|caps| normalize_amount(&caps[1]))
            .find(|amount| *amount > min)
    }

    /// First small amount on a VAT line, then any VAT-labelled number.
    pub fn vat(&self) -> Option<f64> {
        let max = self.config.vat_scan_max;

        let by_line = self
            .lines()
            .filter(|line| is_vat_line(&line.to_lowercase()))
            .flat_map(amounts_in_line)
            .find(|amount| *amount > 0.0 && *amount < max);
        if by_line.is_some() {
            return by_line;
        }

        let text = TAX_ID.replace_all(self.combined, " ");
        VAT_ANY
            .captures_iter(&text)
            .filter(|caps| {
                caps.get(0)
                    .is_some_and(|m| !text[m.end()..].trim_start().starts_with('%'))
            })
            .map(|caps| normalize_amount(&caps[1]))
            .find(|amount| *amount > 0.0)
    }

    /// Largest plausible amount on total-labelled text; failing that, the
    /// largest mid-range number on the whole receipt.
    pub fn total(&self) -> Option<f64> {
        let min = self.config.amount_window.min;

        let labelled = TOTAL_ANY
            .captures_iter(self.combined)
            .map(|caps| normalize_amount(&caps[1]));
        let on_total_lines = self
            .lines()
            .filter(|line| line.to_lowercase().contains("tổng"))
            .flat_map(amounts_in_line);

        let best = labelled
            .chain(on_total_lines)
            .filter(|amount| *amount > min && *amount < TOTAL_CEILING)
            .reduce(f64::max);
        if best.is_some() {
            return best;
        }

        LOOSE_NUMBER
            .find_iter(self.combined)
            .map(|m| normalize_amount(m.as_str()))
            .filter(|amount| (TOTAL_GUESS_MIN..=TOTAL_GUESS_MAX).contains(amount))
            .reduce(f64::max)
    }

    /// Items found by the whole-text scanner.
    pub fn items(&self) -> Vec<LineItem> {
        scan_items(self.full_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback<'a>(text: &'a str, config: &'a ExtractionConfig) -> WholeTextFallback<'a> {
        WholeTextFallback::new(text, text, config)
    }

    #[test]
    fn test_invoice_number_prefers_line_rules() {
        let config = ExtractionConfig::default();
        let text = "Cửa hàng ABC\nSố phiếu: HD040334\nINV 20240512";
        assert_eq!(fallback(text, &config).invoice_number().as_deref(), Some("HD040334"));
    }

    #[test]
    fn test_invoice_number_from_combined_text() {
        let config = ExtractionConfig::default();

        let text = "Receipt: AB-123-456 Cửa hàng";
        assert_eq!(fallback(text, &config).invoice_number().as_deref(), Some("AB-123-456"));

        // Phone-shaped runs are never receipt numbers
        let text = "Hotline 0987654321";
        assert_eq!(fallback(text, &config).invoice_number(), None);
    }

    #[test]
    fn test_date_and_phone() {
        let config = ExtractionConfig::default();
        let text = "ABC Mart\nNgày 05.06.2024\nLiên hệ +84 912 345 678";
        let fb = fallback(text, &config);
        assert_eq!(fb.date().as_deref(), Some("2024-06-05"));
        assert_eq!(fb.phone().as_deref(), Some("+84912345678"));
    }

    #[test]
    fn test_seller_skips_labels_and_codes() {
        let config = ExtractionConfig::default();
        let text = "HÓA ĐƠN BÁN LẺ\n123 Lê Lợi\nHD040334\nSiêu thị Mini Mart\nTổng cộng: 50,000";
        assert_eq!(
            fallback(text, &config).seller_name().as_deref(),
            Some("Siêu thị Mini Mart")
        );
    }

    #[test]
    fn test_address_heuristics() {
        let config = ExtractionConfig::default();

        let text = "Mini Mart\nĐịa chỉ: 45 Nguyễn Huệ, Quận 1\nĐT: 0987654321";
        assert_eq!(
            fallback(text, &config).address().as_deref(),
            Some("45 Nguyễn Huệ, Quận 1")
        );

        let text = "Mini Mart\nĐT: 0987654321\nTổng tiền hàng 50000\n45 Nguyen Hue Q1";
        assert_eq!(
            fallback(text, &config).address().as_deref(),
            Some("45 Nguyen Hue Q1")
        );
    }

    #[test]
    fn test_amount_fallbacks() {
        let config = ExtractionConfig::default();
        let text = "Tiền hàng 63.325\nThuế (8%) 5.066\nTổng thanh toán 68.391\nTiền khách đưa 100.000";
        let fb = fallback(text, &config);

        assert_eq!(fb.subtotal(), Some(63_325.0));
        assert_eq!(fb.vat(), Some(5_066.0));
        assert_eq!(fb.total(), Some(68_391.0));
    }

    #[test]
    fn test_tax_code_is_not_vat_or_phone() {
        let config = ExtractionConfig::default();

        let text = "Mini Mart\nMã số thuế: 0301234567\nTiền hàng 63.325\nThuế 5.066";
        let fb = fallback(text, &config);
        assert_eq!(fb.vat(), Some(5_066.0));
        assert_eq!(fb.phone(), None);

        let text = "Mini Mart\nMST: 0301234567 Thuế 5.066";
        assert_eq!(fallback(text, &config).vat(), Some(5_066.0));
    }

    #[test]
    fn test_vat_scan_max_bounds_fallback_only() {
        use crate::invoice::rules::{AmountExtractor, AmountRule};

        let config = ExtractionConfig::default();
        let line = "VAT khoản 1500000 đồng";

        assert_eq!(
            AmountExtractor::vat(config.vat_window).extract_amount(line),
            Some((1_500_000.0, AmountRule::LineScan))
        );
        assert_eq!(fallback(line, &config).vat(), None);
    }

    #[test]
    fn test_total_guess_without_keywords() {
        let config = ExtractionConfig::default();
        let text = "Mini Mart\nCà phê 25.000\nBánh 40.000\nKhách 2";
        assert_eq!(fallback(text, &config).total(), Some(40_000.0));
        assert_eq!(fallback("no numbers", &config).total(), None);
    }
}
