use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RECEIPT: &str = "Cửa hàng ABC\nHD040334\n12/05/2024\nTổng tiền hàng: 63,325\nVAT: 5,066\nTổng Cộng: 68,391\n";

fn hoadon(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hoadon").unwrap();
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env_remove("GOOGLE_CLOUD_VISION_API_KEY");
    cmd
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("receipt.txt"), RECEIPT).unwrap();
    dir
}

#[test]
fn process_text_receipt_as_json() {
    let dir = workspace();

    hoadon(dir.path())
        .args(["process", "receipt.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"invoice_number\": \"HD040334\""))
        .stdout(predicate::str::contains("\"date\": \"2024-05-12\""))
        .stdout(predicate::str::contains("\"total\": 68391.0"))
        .stdout(predicate::str::contains("\"error\"").not());
}

#[test]
fn process_text_summary_lists_amounts() {
    let dir = workspace();

    hoadon(dir.path())
        .args(["process", "receipt.txt", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Receipt: HD040334"))
        .stdout(predicate::str::contains("Subtotal: 63.325 VND"))
        .stdout(predicate::str::contains("Total:    68.391 VND"));
}

#[test]
fn process_writes_csv_file() {
    let dir = workspace();

    hoadon(dir.path())
        .args(["process", "receipt.txt", "-f", "csv", "-o", "out.csv"])
        .assert()
        .success();

    let csv = fs::read_to_string(dir.path().join("out.csv")).unwrap();
    assert!(csv.starts_with("invoice_number,date,"));
    assert!(csv.contains("HD040334,2024-05-12,Cửa hàng ABC"));
}

#[test]
fn process_missing_input_fails() {
    let dir = workspace();

    hoadon(dir.path())
        .args(["process", "nope.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_unsupported_extension_fails() {
    let dir = workspace();
    fs::write(dir.path().join("receipt.pdf"), "%PDF").unwrap();

    hoadon(dir.path())
        .args(["process", "receipt.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn empty_block_list_yields_default_record() {
    let dir = workspace();
    fs::write(dir.path().join("blocks.json"), "[]").unwrap();

    hoadon(dir.path())
        .args(["process", "blocks.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"error\": \"OCR_NOT_CONFIGURED\""))
        .stdout(predicate::str::contains("\"seller_name\": \"Unknown\""))
        .stdout(predicate::str::contains("\"total\": 0.0"));
}

#[test]
fn image_without_api_key_yields_default_record() {
    let dir = workspace();
    fs::write(dir.path().join("receipt.png"), [0x89, b'P', b'N', b'G']).unwrap();

    hoadon(dir.path())
        .args(["process", "receipt.png", "--show-warnings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OCR_NOT_CONFIGURED"))
        .stderr(predicate::str::contains("OCR backend unavailable"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = workspace();
    fs::write(
        dir.path().join("second.txt"),
        "Quán Cơm\nTổng tiền hàng: 50.000\nThuế: 4.000\n",
    )
    .unwrap();
    let pattern = format!("{}/*.txt", dir.path().display());

    hoadon(dir.path())
        .args(["batch", &pattern, "-o", "out", "--summary", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    let out = dir.path().join("out");
    assert!(out.join("receipt.json").exists());
    assert!(out.join("second.json").exists());

    let second = fs::read_to_string(out.join("second.json")).unwrap();
    assert!(second.contains("\"total\": 54000.0"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
    assert!(summary.contains("receipt.txt,success,HD040334"));
}

#[test]
fn batch_without_matches_fails() {
    let dir = workspace();
    let pattern = format!("{}/*.png", dir.path().display());

    hoadon(dir.path())
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn classify_descriptions() {
    let dir = workspace();

    hoadon(dir.path())
        .args(["classify", "Tiền điện tháng 5", "Cà phê sữa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tiền điện tháng 5: utilities"))
        .stdout(predicate::str::contains("Cà phê sữa: other"));
}

#[test]
fn classify_as_json() {
    let dir = workspace();

    hoadon(dir.path())
        .args(["classify", "--json", "Nguyên liệu làm bánh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"category\": \"materials\""))
        .stdout(predicate::str::contains("\"is_deductible\": true"));
}

#[test]
fn config_init_set_get() {
    let dir = workspace();
    let config = dir.path().join("config.json");
    let config = config.to_str().unwrap();

    hoadon(dir.path())
        .args(["config", "init", "--output", config])
        .assert()
        .success();

    hoadon(dir.path())
        .args(["config", "init", "--output", config])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    hoadon(dir.path())
        .args(["-c", config, "config", "set", "ocr.backend", "plain_text"])
        .assert()
        .success();

    hoadon(dir.path())
        .args(["-c", config, "config", "get", "ocr.backend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"plain_text\""));

    hoadon(dir.path())
        .args(["-c", config, "config", "get", "extraction.amount_window.min"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1000.0"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let dir = workspace();
    let config = dir.path().join("config.json");
    let config = config.to_str().unwrap();

    hoadon(dir.path())
        .args(["-c", config, "config", "set", "extraction.nonsense", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}
