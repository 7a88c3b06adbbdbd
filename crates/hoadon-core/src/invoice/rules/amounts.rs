//! Amount normalization for Vietnamese receipts.
//!
//! OCR output mixes Vietnamese grouping (`68.391`, `68,391`) with Western
//! decimals (`68,391.50`) and occasionally glues neighbouring numbers into one
//! long digit run. [`normalize_amount`] resolves both into a single value.

use tracing::warn;

use super::patterns::NUMBER_TOKEN;

/// Digit count above which a token is assumed to be several numbers glued together.
pub const MAX_AMOUNT_DIGITS: usize = 10;

/// Digits kept when a glued run has no separator to split on.
pub const KEPT_TAIL_DIGITS: usize = 8;

/// Convert a raw numeric token into a monetary value.
///
/// Never fails: anything unparseable, zero, or negative yields `0.0`.
pub fn normalize_amount(token: &str) -> f64 {
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return 0.0;
    }

    let candidate = split_concatenated(&cleaned);
    let numeric = resolve_separators(&candidate);

    match numeric.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

/// Anti-concatenation guard: keep the trailing plausible amount of an
/// over-long run.
fn split_concatenated(cleaned: &str) -> String {
    let digit_count = cleaned.chars().filter(|c| c.is_ascii_digit()).count();
    if digit_count <= MAX_AMOUNT_DIGITS {
        return cleaned.to_string();
    }

    if cleaned.contains(['.', ',']) {
        let reasonable = cleaned
            .split(['.', ','])
            .rev()
            .find(|part| (4..=KEPT_TAIL_DIGITS).contains(&part.len()));
        if let Some(part) = reasonable {
            warn!("Multiple numbers glued in '{}', keeping '{}'", cleaned, part);
            return part.to_string();
        }
    }

    let digits: Vec<char> = cleaned.chars().filter(|c| c.is_ascii_digit()).collect();
    let tail: String = digits[digits.len() - KEPT_TAIL_DIGITS..].iter().collect();
    warn!("Suspiciously long number '{}', keeping last digits '{}'", cleaned, tail);
    tail
}

/// Decide which separators group thousands and which marks decimals,
/// returning a plain `digits[.digits]` string.
fn resolve_separators(s: &str) -> String {
    let dots = s.matches('.').count();
    let commas = s.matches(',').count();

    match (dots, commas) {
        (0, 0) => s.to_string(),
        (1, 1) => {
            let dot_pos = s.find('.').unwrap_or(0);
            let comma_pos = s.find(',').unwrap_or(0);
            if dot_pos < comma_pos {
                // 68.391,50
                s.replace('.', "").replace(',', ".")
            } else {
                // 68,391.50
                s.replace(',', "")
            }
        }
        (_, 0) => resolve_single_separator(s, '.'),
        (0, _) => resolve_single_separator(s, ','),
        _ => {
            let parts: Vec<&str> = s.split(['.', ',']).collect();
            join_groups(&parts)
        }
    }
}

/// Rules for a token that uses only one kind of separator.
fn resolve_single_separator(s: &str, sep: char) -> String {
    let parts: Vec<&str> = s.split(sep).collect();

    if parts.len() == 2 {
        let suffix = parts[1].len();
        return if suffix <= 2 {
            format!("{}.{}", parts[0], parts[1])
        } else {
            // Exactly three digits is the Vietnamese thousands group; longer
            // suffixes are treated the same way.
            parts.concat()
        };
    }

    join_groups(&parts)
}

/// A final group of at most two digits is a decimal fraction; otherwise every
/// separator groups thousands.
fn join_groups(parts: &[&str]) -> String {
    match parts.split_last() {
        Some((last, head)) if !head.is_empty() && last.len() <= 2 => {
            format!("{}.{}", head.concat(), last)
        }
        _ => parts.concat(),
    }
}

/// Every positive amount on a line, in order. Percent tokens are rates and
/// are skipped.
pub fn amounts_in_line(line: &str) -> Vec<f64> {
    numeric_tokens(line)
        .into_iter()
        .map(normalize_amount)
        .filter(|amount| *amount > 0.0)
        .collect()
}

/// Numeric tokens of a line (digits with inner separators), excluding rates.
pub fn numeric_tokens(line: &str) -> Vec<&str> {
    NUMBER_TOKEN
        .find_iter(line)
        .map(|m| m.as_str())
        .filter(|token| !token.ends_with('%'))
        .collect()
}

/// Format an amount with Vietnamese dot grouping (68391 -> "68.391").
pub fn format_vnd(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.abs().to_string();
    let chars: Vec<char> = digits.chars().collect();

    let mut formatted = String::new();
    if rounded < 0 {
        formatted.push('-');
    }
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }
    formatted
}
