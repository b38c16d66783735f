//! Cell value coercion.
//!
//! Spreadsheet cells arrive as text. Each mapped cell is coerced to its
//! field's [`ValueType`] and kept as a [`FieldValue`] so a failed coercion
//! stays visible next to the raw text instead of turning into a silent NaN.

use roster_model::{CoercedValue, FieldValue, ValueType};

/// Strips trailing unit letters and quote marks (`4.52s`, `32in`, `30"`, `85%`).
fn strip_unit_suffix(text: &str) -> &str {
    text.trim_end_matches(|ch: char| ch.is_ascii_alphabetic() || matches!(ch, '"' | '%' | '\''))
        .trim_end()
}

/// True for `1,234` and `12,345,678`: a 1-3 digit lead group followed by
/// groups of exactly three digits.
fn is_grouped_thousands(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let mut groups = digits.split(',');
    let all_digits = |group: &str| group.bytes().all(|b| b.is_ascii_digit());
    let lead_ok = groups
        .next()
        .is_some_and(|lead| (1..=3).contains(&lead.len()) && all_digits(lead));
    lead_ok && digits.contains(',') && groups.all(|group| group.len() == 3 && all_digits(group))
}

/// Parses a measurement typed by a human.
///
/// Accepts thousands separators (`1,234`), a decimal comma (`4,52`),
/// doubled dots (`4..5`) and a trailing unit. Returns `None` for anything
/// that is not a finite number.
pub fn clean_number(raw: &str) -> Option<f64> {
    let lowered = raw.trim().to_ascii_lowercase();
    let mut text = strip_unit_suffix(&lowered).to_string();
    if text.is_empty() {
        return None;
    }
    if !text.contains('.') {
        if is_grouped_thousands(&text) {
            text = text.replace(',', "");
        } else if text.matches(',').count() == 1 {
            text = text.replace(',', ".");
        }
    }
    while text.contains("..") {
        text = text.replace("..", ".");
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses text that is a number and nothing else: an optional sign, digits
/// and at most one dot. Units, letters and separators are rejected.
pub fn parse_plain_number(raw: &str) -> Option<f64> {
    let text = raw.trim();
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let has_digit = unsigned.bytes().any(|b| b.is_ascii_digit());
    let only_digits_and_dot = unsigned.bytes().all(|b| b.is_ascii_digit() || b == b'.');
    if !has_digit || !only_digits_and_dot || unsigned.matches('.').count() > 1 {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Whole numbers only. A leading `#` is allowed (`#12`); suffixes are not,
/// so `12A` is an error rather than `12`.
fn coerce_integer(raw: &str) -> Result<i64, String> {
    let text = raw.trim().trim_start_matches('#').trim();
    let value = parse_plain_number(text).ok_or_else(|| format!("'{raw}' is not a whole number"))?;
    if value.fract() != 0.0 {
        return Err(format!("'{raw}' is not a whole number"));
    }
    if value.abs() > i64::MAX as f64 {
        return Err(format!("'{raw}' is out of range"));
    }
    Ok(value as i64)
}

/// Coerces one non-empty cell.
pub fn coerce(raw: &str, value_type: ValueType) -> FieldValue {
    let trimmed = raw.trim();
    match value_type {
        ValueType::Text => FieldValue::ok(trimmed, CoercedValue::Text(trimmed.to_string())),
        ValueType::Integer => match coerce_integer(trimmed) {
            Ok(value) => FieldValue::ok(trimmed, CoercedValue::Integer(value)),
            Err(message) => FieldValue::failed(trimmed, message),
        },
        ValueType::Number => match clean_number(trimmed) {
            Some(value) => FieldValue::ok(trimmed, CoercedValue::Number(value)),
            None => FieldValue::failed(trimmed, format!("'{trimmed}' is not a number")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_human_measurements() {
        assert_eq!(clean_number("4.52s"), Some(4.52));
        assert_eq!(clean_number(" 32 in "), Some(32.0));
        assert_eq!(clean_number("85%"), Some(85.0));
        assert_eq!(clean_number("30\""), Some(30.0));
        assert_eq!(clean_number("4,52"), Some(4.52));
        assert_eq!(clean_number("4..5"), Some(4.5));
        assert_eq!(clean_number("-3"), Some(-3.0));
        assert_eq!(clean_number("DNF"), None);
        assert_eq!(clean_number("nan"), None);
        assert_eq!(clean_number("1,234,5"), None);
        assert_eq!(clean_number(""), None);
    }

    #[test]
    fn thousands_separators_are_not_decimal_commas() {
        assert_eq!(clean_number("1,234"), Some(1234.0));
        assert_eq!(clean_number("1,234,567"), Some(1_234_567.0));
        assert_eq!(clean_number("-12,500 pts"), Some(-12_500.0));
        assert_eq!(clean_number("4,52"), Some(4.52));
        assert_eq!(clean_number("0,5"), Some(0.5));
        assert_eq!(clean_number("1234,567"), Some(1234.567));
        assert_eq!(
            coerce("1,234", ValueType::Number).coerced,
            Some(CoercedValue::Number(1234.0))
        );
    }

    #[test]
    fn plain_numbers_reject_suffixes() {
        assert_eq!(parse_plain_number(" 12 "), Some(12.0));
        assert_eq!(parse_plain_number("-4.5"), Some(-4.5));
        assert_eq!(parse_plain_number("12A"), None);
        assert_eq!(parse_plain_number("12s"), None);
        assert_eq!(parse_plain_number("1.2.3"), None);
        assert_eq!(parse_plain_number("."), None);
        assert_eq!(parse_plain_number(""), None);
    }

    #[test]
    fn integers_reject_fractions() {
        assert_eq!(
            coerce("12.0", ValueType::Integer).coerced,
            Some(CoercedValue::Integer(12))
        );
        let failed = coerce("12.5", ValueType::Integer);
        assert!(!failed.is_valid());
        assert_eq!(failed.raw, "12.5");
        assert!(failed.coercion_error.is_some());
    }

    #[test]
    fn integers_reject_lettered_suffixes() {
        assert_eq!(
            coerce("#12", ValueType::Integer).coerced,
            Some(CoercedValue::Integer(12))
        );
        let lettered = coerce("12A", ValueType::Integer);
        assert!(!lettered.is_valid());
        assert_eq!(lettered.raw, "12A");
    }

    #[test]
    fn text_is_trimmed() {
        let value = coerce("  U12 ", ValueType::Text);
        assert_eq!(value.raw, "U12");
        assert_eq!(value.coerced, Some(CoercedValue::Text("U12".to_string())));
    }
}
