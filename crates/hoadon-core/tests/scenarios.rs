use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;

use hoadon_core::invoice::rules::normalize_amount;
use hoadon_core::{ExtractionConfig, OcrFailure, RawOcrResult, ReceiptExtractor, ReceiptParser};

fn clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 20)
        .unwrap()
        .and_hms_opt(14, 5, 9)
        .unwrap()
}

fn blocks(lines: &[&str]) -> RawOcrResult {
    RawOcrResult::from_text(lines.join("\n"))
}

const SCENARIO_A: [&str; 6] = [
    "Cửa hàng ABC",
    "HD040334",
    "12/05/2024",
    "Tổng tiền hàng: 63,325",
    "VAT: 5,066",
    "Tổng Cộng: 68,391",
];

#[test]
fn complete_receipt() {
    let record = ReceiptParser::new()
        .parse_at(&blocks(&SCENARIO_A), clock())
        .record;

    assert_eq!(record.invoice_number, "HD040334");
    assert_eq!(record.date, "2024-05-12");
    assert_eq!(record.subtotal, 63_325.0);
    assert_eq!(record.vat, 5_066.0);
    assert_eq!(record.total, 68_391.0);
    assert_eq!(record.seller_name.as_deref(), Some("Cửa hàng ABC"));
    assert_eq!(record.error, None);
}

#[test]
fn zero_total_is_derived() {
    let mut lines = SCENARIO_A.to_vec();
    lines[5] = "Tổng Cộng: 0";

    let record = ReceiptParser::new().parse_at(&blocks(&lines), clock()).record;
    assert_eq!(record.subtotal, 63_325.0);
    assert_eq!(record.vat, 5_066.0);
    assert_eq!(record.total, 68_391.0);
}

#[test]
fn absent_total_is_derived() {
    let record = ReceiptParser::new()
        .parse_at(&blocks(&SCENARIO_A[..5]), clock())
        .record;
    assert_eq!(record.total, 68_391.0);
}

#[test]
fn empty_ocr_output() {
    let record = ReceiptParser::new()
        .parse_at(&RawOcrResult::default(), clock())
        .record;

    assert_eq!(record.error, Some(OcrFailure::NotConfigured));
    assert_eq!(record.total, 0.0);
    assert_eq!(record.subtotal, 0.0);
    assert_eq!(record.seller_name.as_deref(), Some("Unknown"));
    assert_eq!(record.invoice_number, "INV20240520140509");
    assert_eq!(record.date, "2024-05-20");
    assert!(record.items.is_empty());

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["error"], "OCR_NOT_CONFIGURED");
}

#[test]
fn first_receipt_number_wins() {
    let lines = [
        "Cửa hàng ABC",
        "HD040334",
        "HD999999",
        "Tổng Cộng: 68,391",
    ];
    let record = ReceiptParser::new().parse_at(&blocks(&lines), clock()).record;
    assert_eq!(record.invoice_number, "HD040334");
}

#[test]
fn first_subtotal_and_vat_win() {
    let lines = [
        "Cửa hàng ABC",
        "Tổng tiền hàng: 63,325",
        "VAT: 5,066",
        "Tổng tiền hàng: 10,000",
        "VAT: 800",
        "Tổng Cộng: 68,391",
    ];
    let record = ReceiptParser::new().parse_at(&blocks(&lines), clock()).record;
    assert_eq!(record.subtotal, 63_325.0);
    assert_eq!(record.vat, 5_066.0);
    assert_eq!(record.total, 68_391.0);
}

#[test]
fn first_date_wins() {
    let lines = [
        "Cửa hàng ABC",
        "12/05/2024",
        "Ngày in: 13/05/2024",
        "Tổng Cộng: 68,391",
    ];
    let record = ReceiptParser::new().parse_at(&blocks(&lines), clock()).record;
    assert_eq!(record.date, "2024-05-12");
}

#[test]
fn first_phone_wins() {
    let lines = [
        "Cửa hàng ABC",
        "ĐT: 0987654321",
        "Hotline: 0912345678",
        "Tổng Cộng: 68,391",
    ];
    let record = ReceiptParser::new().parse_at(&blocks(&lines), clock()).record;
    assert_eq!(record.seller_phone.as_deref(), Some("0987654321"));
}

#[test]
fn tax_code_header_is_not_vat() {
    let lines = [
        "Cửa hàng ABC",
        "Mã số thuế: 0301234567",
        "HD040334",
        "12/05/2024",
        "Tổng tiền hàng: 63,325",
        "VAT: 5,066",
        "Tổng Cộng: 68,391",
    ];
    let record = ReceiptParser::new().parse_at(&blocks(&lines), clock()).record;
    assert_eq!(record.vat, 5_066.0);
    assert_eq!(record.subtotal, 63_325.0);
    assert_eq!(record.total, 68_391.0);
    assert_eq!(record.invoice_number, "HD040334");
    assert_eq!(record.seller_phone, None);
}

#[test]
fn last_grand_total_wins() {
    let lines = [
        "Cửa hàng ABC",
        "Tổng tiền hàng: 63,325",
        "Tổng cộng: 50,000",
        "VAT: 5,066",
        "Tổng Cộng: 68,391",
    ];
    let record = ReceiptParser::new().parse_at(&blocks(&lines), clock()).record;
    assert_eq!(record.total, 68_391.0);
}

#[test]
fn unparseable_later_total_keeps_earlier_one() {
    let lines = [
        "Cửa hàng ABC",
        "Tổng tiền hàng: 63,325",
        "Tổng Cộng: 68,391",
        "Tổng cộng số lượng: 3",
    ];
    let record = ReceiptParser::new().parse_at(&blocks(&lines), clock()).record;
    assert_eq!(record.total, 68_391.0);
}

#[test]
fn phone_is_not_a_receipt_number() {
    let lines = ["Cửa hàng ABC", "0987654321", "Tổng Cộng: 68,391"];
    let record = ReceiptParser::new().parse_at(&blocks(&lines), clock()).record;

    assert_eq!(record.invoice_number, "INV20240520140509");
    assert_eq!(record.seller_phone.as_deref(), Some("0987654321"));
}

#[test]
fn implausible_total_is_rejected() {
    let lines = [
        "Cửa hàng ABC",
        "Tổng tiền hàng: 63,325",
        "VAT: 5,066",
        "Tổng Cộng: 500",
    ];
    let record = ReceiptParser::new().parse_at(&blocks(&lines), clock()).record;
    assert_eq!(record.total, 68_391.0);
}

#[test]
fn total_below_subtotal_is_repaired() {
    let lines = [
        "Cửa hàng ABC",
        "Tổng tiền hàng: 63,325",
        "VAT: 5,066",
        "Tổng Cộng: 6,339",
    ];
    let result = ReceiptParser::new().parse_at(&blocks(&lines), clock());
    assert_eq!(result.record.total, 68_391.0);
    assert!(result.record.total >= result.record.subtotal);
}

#[test]
fn decomposed_diacritics_still_match() {
    let text = "Cu\u{031b}\u{0309}a ha\u{0300}ng ABC\nHD040334\nT\u{006f}\u{0302}\u{0309}ng co\u{0323}\u{0302}ng: 68,391";
    let record = ReceiptParser::new()
        .parse_at(&RawOcrResult::from_text(text), clock())
        .record;
    assert_eq!(record.total, 68_391.0);
    assert_eq!(record.seller_name.as_deref(), Some("Cửa hàng ABC"));
}

#[test]
fn custom_plausibility_window() {
    let mut config = ExtractionConfig::default();
    config.amount_window.min = 100.0;

    let lines = ["Quán nước", "Tổng Cộng: 500"];
    let record = ReceiptParser::with_config(config)
        .parse_at(&blocks(&lines), clock())
        .record;
    assert_eq!(record.total, 500.0);
}

#[test]
fn extractor_trait_returns_record() {
    let parser = ReceiptParser::new();
    let record = parser.extract_from_text(&SCENARIO_A.join("\n"));
    assert_eq!(record.total, 68_391.0);
    assert_eq!(parser.extract(&blocks(&SCENARIO_A)), record);
}

#[test]
fn normalizer_contract() {
    assert_eq!(normalize_amount("68,391"), 68_391.0);
    assert_eq!(normalize_amount("68.391"), 68_391.0);
    assert_eq!(normalize_amount("68.391,50"), 68_391.50);
    assert_eq!(normalize_amount("1,234,567"), 1_234_567.0);
    assert_eq!(normalize_amount(""), 0.0);
    assert_eq!(normalize_amount("abc"), 0.0);
    assert_eq!(normalize_amount("12345678901234"), 78_901_234.0);
}
