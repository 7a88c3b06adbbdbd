//! Common regex patterns for Vietnamese receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Keywords that mark an address line.
pub const ADDRESS_KEYWORDS: &[&str] = &[
    "địa chỉ", "address", "đường", "phố", "phường", "quận", "huyện", "street", "ward", "district",
];

/// Keywords that close the items region.
pub const TOTALS_KEYWORDS: &[&str] = &["tổng tiền hàng", "vat", "thuế", "tổng cộng"];

lazy_static! {
    // Receipt numbers (HD040334, HĐ040334, "HD: 040334", "Phiếu HD040334")
    pub static ref INVOICE_HD: Regex = Regex::new(
        r"(?i)\b(HD\d{6,})\b"
    ).unwrap();

    pub static ref INVOICE_HD_VI: Regex = Regex::new(
        r"(?i)\b(HĐ\d{6,})\b"
    ).unwrap();

    pub static ref INVOICE_HD_LABELED: Regex = Regex::new(
        r"(?i)(?:HD|HĐ)[\s:]*(\d{6,})"
    ).unwrap();

    pub static ref INVOICE_RECEIPT_LABELED: Regex = Regex::new(
        r"(?i)(?:phiếu|hóa\s*đơn|bill|receipt)[\s#:\-]*([A-Z]{2}\d{6,})"
    ).unwrap();

    // Looser receipt numbers for the whole-text fallback
    pub static ref INVOICE_PREFIXED_CODE: Regex = Regex::new(
        r"(?i)\b((?:HD|HĐ|INV|BILL)[\s:]*[A-Z0-9]{6,})\b"
    ).unwrap();

    pub static ref INVOICE_LETTER_CODE: Regex = Regex::new(
        r"(?i)\b([A-Z]{2}\d{6,})\b"
    ).unwrap();

    pub static ref INVOICE_PREFIXED_SUFFIX: Regex = Regex::new(
        r"(?i)(?:HD|HĐ|INV|BILL)[\s:]*([A-Z0-9]{6,})"
    ).unwrap();

    pub static ref INVOICE_LABELED_ANY: Regex = Regex::new(
        r"(?i)(?:phiếu|hóa\s*đơn|biên\s*lai|receipt|bill)[\s#:\-]*([A-Z0-9\-]{6,})"
    ).unwrap();

    // Phone shapes used to reject receipt-number candidates
    pub static ref PHONE_SHAPE: Regex = Regex::new(
        r"^(?:\+84|84|0)\d{9,10}$"
    ).unwrap();

    pub static ref PHONE_SHAPE_LOOSE: Regex = Regex::new(
        r"^(?:\+84|84|0)?\d{9,11}$"
    ).unwrap();

    // Phone numbers; digit groups may be split by spaces, dots or hyphens.
    // Callers still check the digit count after stripping separators.
    pub static ref PHONE_INTL: Regex = Regex::new(
        r"(?:\+84|\b84)[\s\-]?\d{2,3}[\s.\-]?\d{3}[\s.\-]?\d{3,4}\b"
    ).unwrap();

    pub static ref PHONE_LOCAL: Regex = Regex::new(
        r"\b0\d{2,3}[\s.\-]?\d{3}[\s.\-]?\d{3,4}\b"
    ).unwrap();

    pub static ref PHONE_BARE: Regex = Regex::new(
        r"\b\d{10,11}\b"
    ).unwrap();

    // Dates: D/M/Y with 1-2 digit day/month and 2 or 4 digit year
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4}|\d{2})\b"
    ).unwrap();

    // Seller-line rejections
    pub static ref LEADING_DIGIT: Regex = Regex::new(r"^\d").unwrap();

    pub static ref LEADING_DATE: Regex = Regex::new(r"^\d{1,2}[/\-.]\d{1,2}").unwrap();

    pub static ref LEADING_PHONE: Regex = Regex::new(r"^\+?\d{8,}").unwrap();

    pub static ref SELLER_STOPWORDS: Regex = Regex::new(
        r"(?i)(phiếu|hóa\s*đơn|bill|receipt|địa\s*chỉ|address)"
    ).unwrap();

    pub static ref SELLER_FALLBACK_STOPWORDS: Regex = Regex::new(
        r"(?i)(phiếu|hóa\s*đơn|biên\s*lai|receipt|date|ngày|địa\s*chỉ|address|phone|điện\s*thoại|tổng|total|cộng|tiền|vat|thuế)"
    ).unwrap();

    pub static ref LEADING_CODE: Regex = Regex::new(r"^[A-Z]{2}\d+").unwrap();

    // Address label prefix
    pub static ref ADDRESS_LABEL: Regex = Regex::new(
        r"(?i)^(?:địa\s*chỉ|address)\s*[:\-]?\s*"
    ).unwrap();

    // Number tokens; a trailing % marks a rate, not an amount
    pub static ref NUMBER_TOKEN: Regex = Regex::new(
        r"\d+(?:[.,]\d+)*(?:\s?%)?"
    ).unwrap();

    pub static ref COMMA_GROUPED: Regex = Regex::new(
        r"\d{1,3}(?:,\d{3})+"
    ).unwrap();

    pub static ref DOT_GROUPED: Regex = Regex::new(
        r"\d{1,3}(?:\.\d{3})+"
    ).unwrap();

    pub static ref PLAIN_RUN: Regex = Regex::new(r"\d{4,8}").unwrap();

    pub static ref LOOSE_NUMBER: Regex = Regex::new(r"[\d,.]{4,}").unwrap();

    pub static ref PART_SPLIT: Regex = Regex::new(r"[\s:]+").unwrap();

    // Keyword prefix/suffix stripped before scanning an amount line
    pub static ref AMOUNT_LINE_PREFIX: Regex = Regex::new(
        r"(?i)^\s*(?:tổng\s*cộng|tổng\s*tiền\s*hàng|thuế\s*gtgt|vat|thuế)[\s:]*"
    ).unwrap();

    pub static ref CURRENCY_SUFFIX: Regex = Regex::new(
        r"(?i)\s*(?:vnđ|vnd|đ|dong)\s*$"
    ).unwrap();

    // Item lines
    pub static ref QUANTITY_MARKER: Regex = Regex::new(
        r"(?i)\b(\d+(?:\.\d+)?)\s*[x×]\s*"
    ).unwrap();

    pub static ref ITEM_STOPWORDS: Regex = Regex::new(
        r"(?i)(phiếu|hóa\s*đơn|bill|receipt|tổng|vat|thuế)"
    ).unwrap();

    pub static ref ITEM_SECTION_STOPWORDS: Regex = Regex::new(
        r"(?i)(tổng|total|cộng|tiền|vat|thuế|phiếu|hóa\s*đơn|bill|receipt)"
    ).unwrap();

    pub static ref ITEM_ORDINAL_PREFIX: Regex = Regex::new(r"^\d+\.?\s+").unwrap();

    pub static ref ITEM_TRAILING_AMOUNT: Regex = Regex::new(r"\d+[\s,.]+\d+\s*$").unwrap();

    pub static ref ITEM_NAME_NOISE: Regex = Regex::new(r"^[\d.\s\-]+").unwrap();

    pub static ref EQUALS_SIGN: Regex = Regex::new(r"\s*=\s*").unwrap();

    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    // Keyword-anchored amount tiers, one family per field. Each tier is
    // boundary-terminated so a longer run falls through to the next tier.
    pub static ref SUBTOTAL_COMMA: Regex = Regex::new(
        r"(?i)tổng\s*tiền\s*hàng[\s:]*(\d{1,3}(?:,\d{3})+)(?:\D|$)"
    ).unwrap();

    pub static ref SUBTOTAL_DOT: Regex = Regex::new(
        r"(?i)tổng\s*tiền\s*hàng[\s:]*(\d{1,3}(?:\.\d{3})+)(?:\D|$)"
    ).unwrap();

    pub static ref SUBTOTAL_BARE: Regex = Regex::new(
        r"(?i)tổng\s*tiền\s*hàng[\s:]*(\d{4,6})(?:\D|$)"
    ).unwrap();

    pub static ref SUBTOTAL_GENERIC: Regex = Regex::new(
        r"(?i)tổng\s*tiền\s*hàng[\s:]*(\d[\d,.]*)"
    ).unwrap();

    pub static ref VAT_COMMA: Regex = Regex::new(
        r"(?i)(?:thuế\s*gtgt|thuế\s*vat|vat|thuế)(?:\s*\(?\s*\d{1,2}(?:[.,]\d+)?\s*%\s*\)?)?[\s:]*(\d{1,3}(?:,\d{3})+)(?:\D|$)"
    ).unwrap();

    pub static ref VAT_DOT: Regex = Regex::new(
        r"(?i)(?:thuế\s*gtgt|thuế\s*vat|vat|thuế)(?:\s*\(?\s*\d{1,2}(?:[.,]\d+)?\s*%\s*\)?)?[\s:]*(\d{1,3}(?:\.\d{3})+)(?:\D|$)"
    ).unwrap();

    pub static ref VAT_BARE: Regex = Regex::new(
        r"(?i)(?:thuế\s*gtgt|thuế\s*vat|vat|thuế)(?:\s*\(?\s*\d{1,2}(?:[.,]\d+)?\s*%\s*\)?)?[\s:]*(\d{3,6})(?:\D|$)"
    ).unwrap();

    pub static ref VAT_GENERIC: Regex = Regex::new(
        r"(?i)(?:thuế\s*gtgt|thuế\s*vat|vat|thuế)(?:\s*\(?\s*\d{1,2}(?:[.,]\d+)?\s*%\s*\)?)?[\s:]*(\d[\d,.]*)"
    ).unwrap();

    pub static ref TOTAL_COMMA: Regex = Regex::new(
        r"(?i)tổng\s*cộng[\s:]*(\d{1,3}(?:,\d{3})+)(?:\D|$)"
    ).unwrap();

    pub static ref TOTAL_DOT: Regex = Regex::new(
        r"(?i)tổng\s*cộng[\s:]*(\d{1,3}(?:\.\d{3})+)(?:\D|$)"
    ).unwrap();

    pub static ref TOTAL_BARE: Regex = Regex::new(
        r"(?i)tổng\s*cộng[\s:]*(\d{4,6})(?:\D|$)"
    ).unwrap();

    pub static ref TOTAL_GENERIC: Regex = Regex::new(
        r"(?i)tổng\s*cộng[\s:]*(\d[\d,.]*)"
    ).unwrap();

    pub static ref PERCENT_TOKEN: Regex = Regex::new(
        r"\d+(?:[.,]\d+)?\s?%"
    ).unwrap();

    // Seller tax code ("Mã số thuế: 0301234567-001", "MST 0301234567")
    pub static ref TAX_ID: Regex = Regex::new(
        r"(?i)(?:mã\s*số\s*thuế|\bmst\b)\s*[:.]?\s*\d[\d .\-]*"
    ).unwrap();

    // Whole-text amount patterns
    pub static ref SUBTOTAL_ANY: Regex = Regex::new(
        r"(?i)(?:tổng\s*tiền\s*hàng|tiền\s*hàng|subtotal|tổng\s*trước\s*thuế)[\s:]*(\d[\d,.]*)"
    ).unwrap();

    pub static ref VAT_ANY: Regex = Regex::new(
        r"(?i)(?:vat|thuế\s*gtgt|thuế\s*vat|thuế)(?:\s*\(?\s*\d{1,2}(?:[.,]\d+)?\s*%\s*\)?)?[\s:]*(\d[\d,.]*)"
    ).unwrap();

    pub static ref TOTAL_ANY: Regex = Regex::new(
        r"(?i)(?:tổng\s*cộng|cộng\s*tiền|thành\s*tiền|grand\s*total|tổng|total)[^\d\n]{0,20}(\d[\d,.]*)"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_patterns_allow_grouping() {
        assert!(PHONE_LOCAL.is_match("ĐT: 0987 654 321"));
        assert!(PHONE_LOCAL.is_match("0987654321"));
        assert!(PHONE_INTL.is_match("+84 987 654 321"));
        assert!(!PHONE_LOCAL.is_match("HD040334"));
        assert!(!PHONE_LOCAL.is_match("01.05.2024 10:30"));
    }

    #[test]
    fn test_number_token_keeps_percent() {
        let tokens: Vec<&str> = NUMBER_TOKEN
            .find_iter("VAT 8%: 5,066")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(tokens, vec!["8%", "5,066"]);
    }

    #[test]
    fn test_date_pattern() {
        let caps = DATE_DMY.captures("Ngày 12/05/2024 10:30").unwrap();
        assert_eq!(&caps[1], "12");
        assert_eq!(&caps[2], "05");
        assert_eq!(&caps[3], "2024");
        assert!(!DATE_DMY.is_match("68.391"));
    }
}
