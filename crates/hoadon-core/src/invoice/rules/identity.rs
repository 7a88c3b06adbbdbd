//! Receipt identity fields: receipt number, date and seller name.

use chrono::NaiveDate;
use regex::Regex;

use super::patterns::{
    DATE_DMY, INVOICE_HD, INVOICE_HD_LABELED, INVOICE_HD_VI, INVOICE_RECEIPT_LABELED,
    LEADING_DATE, LEADING_PHONE, PHONE_SHAPE, SELLER_STOPWORDS,
};
use super::{ExtractionMatch, FieldExtractor};

/// Receipt-number extractor.
///
/// Rules are tried most specific first; a candidate shaped like a Vietnamese
/// phone number is rejected and the next rule is tried.
pub struct InvoiceNumberExtractor {
    rules: Vec<(&'static str, &'static Regex)>,
}

impl InvoiceNumberExtractor {
    pub fn new() -> Self {
        Self {
            rules: vec![
                ("hd_code", &*INVOICE_HD),
                ("hd_code_vi", &*INVOICE_HD_VI),
                ("hd_labeled", &*INVOICE_HD_LABELED),
                ("receipt_labeled", &*INVOICE_RECEIPT_LABELED),
            ],
        }
    }
}

impl Default for InvoiceNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = String;

    fn extract(&self, line: &str) -> Option<ExtractionMatch<String>> {
        for (rule, pattern) in &self.rules {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let candidate = caps[1].trim();
            if is_phone_shaped(candidate) {
                continue;
            }
            return Some(ExtractionMatch::new(candidate.to_string(), *rule, &caps[0]));
        }
        None
    }
}

/// `0`/`84`/`+84` followed by 9-10 digits.
pub fn is_phone_shaped(candidate: &str) -> bool {
    PHONE_SHAPE.is_match(candidate)
}

/// Date extractor for `D/M/Y` (also `-` and `.`), normalized to ISO-8601.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = String;

    fn extract(&self, line: &str) -> Option<ExtractionMatch<String>> {
        DATE_DMY.captures_iter(line).find_map(|caps| {
            let date = parse_dmy(&caps[1], &caps[2], &caps[3])?;
            Some(ExtractionMatch::new(
                date.format("%Y-%m-%d").to_string(),
                "dmy",
                &caps[0],
            ))
        })
    }
}

/// Build a calendar date from day, month and a 2- or 4-digit year.
pub fn parse_dmy(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = if year.len() == 2 {
        2000 + year.parse::<i32>().ok()?
    } else {
        year.parse().ok()?
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Seller-name qualifier. The caller restricts it to the header lines.
pub struct SellerExtractor;

impl SellerExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SellerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for SellerExtractor {
    type Output = String;

    fn extract(&self, line: &str) -> Option<ExtractionMatch<String>> {
        let line = line.trim();
        let length = line.chars().count();

        if !(3..=100).contains(&length)
            || is_pure_number(line)
            || LEADING_DATE.is_match(line)
            || LEADING_PHONE.is_match(line)
            || SELLER_STOPWORDS.is_match(line)
            || !line.chars().any(char::is_alphabetic)
        {
            return None;
        }

        Some(ExtractionMatch::new(line.to_string(), "header_line", line))
    }
}

fn is_pure_number(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | ' ' | '-' | '+'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_number_rules() {
        let extractor = InvoiceNumberExtractor::new();

        let m = extractor.extract("HD040334").unwrap();
        assert_eq!(m.value, "HD040334");
        assert_eq!(m.rule, "hd_code");

        let m = extractor.extract("Số: HĐ123456").unwrap();
        assert_eq!(m.value, "HĐ123456");

        let m = extractor.extract("HD: 040334").unwrap();
        assert_eq!(m.value, "040334");
        assert_eq!(m.rule, "hd_labeled");

        let m = extractor.extract("Phiếu #AB1234567").unwrap();
        assert_eq!(m.value, "AB1234567");
        assert_eq!(m.rule, "receipt_labeled");
    }

    #[test]
    fn test_invoice_number_rejects_phone() {
        let extractor = InvoiceNumberExtractor::new();
        assert!(extractor.extract("0987654321").is_none());
        assert!(extractor.extract("HD: 0987654321").is_none());
        assert!(extractor.extract("Cửa hàng ABC").is_none());
    }

    #[test]
    fn test_phone_shape() {
        assert!(is_phone_shaped("0987654321"));
        assert!(is_phone_shaped("+84987654321"));
        assert!(is_phone_shaped("84987654321"));
        assert!(!is_phone_shaped("040334"));
        assert!(!is_phone_shaped("HD040334"));
    }

    #[test]
    fn test_date_extraction() {
        let extractor = DateExtractor::new();

        assert_eq!(extractor.extract("12/05/2024").unwrap().value, "2024-05-12");
        assert_eq!(extractor.extract("Ngày: 1/5/24 10:30").unwrap().value, "2024-05-01");
        assert_eq!(extractor.extract("12-05-2024").unwrap().value, "2024-05-12");
        assert!(extractor.extract("Tổng Cộng: 68,391").is_none());
    }

    #[test]
    fn test_date_skips_impossible_dates() {
        let extractor = DateExtractor::new();
        assert!(extractor.extract("31/02/2024").is_none());
        assert_eq!(
            extractor.extract("45/13/2024 in 03/04/2024").unwrap().value,
            "2024-04-03"
        );
    }

    #[test]
    fn test_seller_qualification() {
        let extractor = SellerExtractor::new();

        assert_eq!(extractor.extract("Cửa hàng ABC").unwrap().value, "Cửa hàng ABC");
        assert_eq!(extractor.extract("7-Eleven").unwrap().value, "7-Eleven");
        assert!(extractor.extract("12345").is_none());
        assert!(extractor.extract("12/05/2024").is_none());
        assert!(extractor.extract("0987654321").is_none());
        assert!(extractor.extract("Hóa đơn bán lẻ").is_none());
        assert!(extractor.extract("Địa chỉ: 12 Lê Lợi").is_none());
        assert!(extractor.extract("ab").is_none());
        assert!(extractor.extract(&"x".repeat(101)).is_none());
    }
}
