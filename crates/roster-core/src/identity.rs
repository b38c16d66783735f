//! Row identity resolution and stable record ids.
//!
//! A row is identified by its external id when it carries one. Otherwise the
//! identity is the composite of first name, last name and number. The age
//! group is never part of the key, so the same athlete may appear in several
//! groups, and two athletes sharing a name with no number collide.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::trace;
use unicode_normalization::UnicodeNormalization;

use roster_model::{ImportRow, RowIdentity};

use crate::redact::redact_value;
use crate::value::parse_plain_number;

/// Stands in for an absent number so blank numbers never compare equal to
/// an empty string. Present numbers carry [`NUMBER_PREFIX`], so no jersey
/// number can spell the sentinel.
pub const NO_NUMBER: &str = "nonum";

/// Marks a present number inside identity keys and stable ids.
pub const NUMBER_PREFIX: &str = "n=";

/// Hex characters kept from the digest of a stable id.
pub const STABLE_ID_LEN: usize = 20;

/// Schema keys the resolver reads identity values from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityKeys {
    pub first_name: String,
    pub last_name: String,
    /// A single name column split into first and last name.
    pub full_name: String,
    pub number: String,
    pub external_id: String,
    /// Shown in duplicate explanations only; never part of the key.
    pub group: String,
}

impl Default for IdentityKeys {
    fn default() -> Self {
        Self {
            first_name: "first_name".to_string(),
            last_name: "last_name".to_string(),
            full_name: "full_name".to_string(),
            number: "number".to_string(),
            external_id: "external_id".to_string(),
            group: "age_group".to_string(),
        }
    }
}

fn is_invisible(ch: char) -> bool {
    matches!(
        ch,
        '\u{feff}' | '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{2060}' | '\u{00ad}'
    )
}

/// Case-insensitive, trimmed, NFC form of a name with inner whitespace collapsed.
pub fn normalize_name(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|ch| !is_invisible(*ch)).nfc().collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Canonical number text: `12`, `12.0` and `#12` all become `12`.
///
/// Returns `None` for blank input. Values that are not plain numbers are kept
/// as trimmed lowercase text, so `12A` and `12B` stay distinct.
pub fn normalize_number(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|ch| !is_invisible(*ch)).collect();
    let trimmed = cleaned.trim().trim_start_matches('#').trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse_plain_number(trimmed) {
        Some(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            Some(format!("{}", value as i64))
        }
        Some(value) => Some(value.to_string()),
        None => Some(trimmed.to_lowercase()),
    }
}

/// Escapes the separators used inside identity keys and stable ids.
fn escape_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for ch in part.chars() {
        if matches!(ch, '\\' | '|' | ':') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn number_part(number: Option<&str>) -> String {
    number
        .and_then(normalize_number)
        .map_or_else(|| NO_NUMBER.to_string(), |number| format!("{NUMBER_PREFIX}{number}"))
}

pub fn composite_key(first_name: &str, last_name: &str, number: Option<&str>) -> String {
    format!(
        "name:{}|{}|{}",
        escape_part(&normalize_name(first_name)),
        escape_part(&normalize_name(last_name)),
        escape_part(&number_part(number))
    )
}

pub fn external_key(value: &str) -> String {
    format!("ext:{}", normalize_name(value))
}

fn hash_parts(parts: &[&str]) -> String {
    let escaped: Vec<String> = parts.iter().map(|part| escape_part(part)).collect();
    let mut hasher = Sha256::new();
    hasher.update(escaped.join(":").as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(STABLE_ID_LEN);
    id
}

/// Deterministic storage id for an athlete in an event.
///
/// Re-importing the same roster converges on the same id, whatever the case
/// of the names or the formatting of the number.
pub fn generate_stable_id(
    event_id: &str,
    first_name: &str,
    last_name: &str,
    number: Option<&str>,
) -> String {
    hash_parts(&[
        event_id,
        &normalize_name(first_name),
        &normalize_name(last_name),
        &number_part(number),
    ])
}

/// Stable id for a resolved identity.
pub fn stable_id_for(event_id: &str, identity: &RowIdentity) -> String {
    match identity {
        RowIdentity::ExternalId { value, .. } => {
            hash_parts(&[event_id, "ext", &normalize_name(value)])
        }
        RowIdentity::Composite {
            first_name,
            last_name,
            number,
            ..
        } => generate_stable_id(event_id, first_name, last_name, number.as_deref()),
    }
}

/// Derives a [`RowIdentity`] from mapped rows.
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    keys: IdentityKeys,
}

impl IdentityResolver {
    pub fn new(keys: IdentityKeys) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &IdentityKeys {
        &self.keys
    }

    fn value<'r>(&self, row: &'r ImportRow, key: &str) -> Option<&'r str> {
        row.raw(key).map(str::trim).filter(|value| !value.is_empty())
    }

    /// Resolves the identity of one row.
    ///
    /// Returns `None` when the row has neither an external id nor both names.
    pub fn resolve(&self, row: &ImportRow) -> Option<RowIdentity> {
        if let Some(value) = self.value(row, &self.keys.external_id) {
            trace!(row = row.line, external_id = redact_value(value), "identity by external id");
            return Some(RowIdentity::ExternalId {
                value: value.to_string(),
                identity_key: external_key(value),
            });
        }

        let first = self.value(row, &self.keys.first_name)?;
        let last = self.value(row, &self.keys.last_name)?;
        let number = self.value(row, &self.keys.number);
        let identity_key = composite_key(first, last, number);
        trace!(row = row.line, key = redact_value(&identity_key), "identity by name");
        Some(RowIdentity::Composite {
            first_name: normalize_name(first),
            last_name: normalize_name(last),
            number: number.and_then(normalize_number),
            identity_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use roster_model::{CoercedValue, FieldValue};

    use super::*;

    fn row(values: &[(&str, &str)]) -> ImportRow {
        let mut row = ImportRow::new(2);
        for (key, value) in values {
            row.insert(*key, FieldValue::ok(*value, CoercedValue::Text((*value).to_string())));
        }
        row
    }

    #[test]
    fn names_fold_case_space_and_invisibles() {
        assert_eq!(normalize_name("  Mary\u{200b}  Ann "), "mary ann");
        assert_eq!(normalize_name("JOSE\u{301}"), normalize_name("jos\u{e9}"));
    }

    #[test]
    fn numbers_drop_formatting() {
        assert_eq!(normalize_number("12.0").as_deref(), Some("12"));
        assert_eq!(normalize_number("#7").as_deref(), Some("7"));
        assert_eq!(normalize_number(" 07 ").as_deref(), Some("7"));
        assert_eq!(normalize_number("12.5").as_deref(), Some("12.5"));
        assert_eq!(normalize_number("A1").as_deref(), Some("a1"));
        assert_eq!(normalize_number("  "), None);
    }

    #[test]
    fn lettered_numbers_stay_distinct() {
        assert_eq!(normalize_number("12A").as_deref(), Some("12a"));
        assert_eq!(normalize_number("12s").as_deref(), Some("12s"));
        assert_ne!(
            composite_key("Ann", "Lee", Some("12A")),
            composite_key("Ann", "Lee", Some("12B"))
        );
        assert_ne!(
            composite_key("Ann", "Lee", Some("12A")),
            composite_key("Ann", "Lee", Some("12"))
        );
        assert_ne!(
            generate_stable_id("evt", "Ann", "Lee", Some("12A")),
            generate_stable_id("evt", "Ann", "Lee", Some("12B"))
        );
    }

    #[test]
    fn keys_cannot_be_spoofed_by_separators_or_sentinel() {
        assert_ne!(
            composite_key("Ann", "Lee", Some("nonum")),
            composite_key("Ann", "Lee", None)
        );
        assert_ne!(
            generate_stable_id("evt", "Ann", "Lee", Some("nonum")),
            generate_stable_id("evt", "Ann", "Lee", None)
        );
        assert_ne!(
            composite_key("a|b", "c", None),
            composite_key("a", "b|c", None)
        );
        assert_ne!(
            generate_stable_id("evt", "a:b", "c", None),
            generate_stable_id("evt", "a", "b:c", None)
        );
        assert_eq!(composite_key("a|b", "c", None), "name:a\\|b|c|nonum");
    }

    #[test]
    fn absent_number_uses_sentinel() {
        assert_eq!(composite_key("Ann", "Lee", None), "name:ann|lee|nonum");
        assert_eq!(composite_key("Ann", "Lee", Some("")), "name:ann|lee|nonum");
        assert_ne!(
            composite_key("Ann", "Lee", None),
            composite_key("Bo", "Lee", None)
        );
    }

    #[test]
    fn external_id_takes_priority() {
        let resolver = IdentityResolver::default();
        let identity = resolver
            .resolve(&row(&[("first_name", "Ann"), ("external_id", " B-17 ")]))
            .expect("identity");
        assert_eq!(identity.identity_key(), "ext:b-17");

        let composite = resolver
            .resolve(&row(&[("first_name", "Ann"), ("last_name", "Lee"), ("number", "9.0")]))
            .expect("identity");
        assert_eq!(composite.identity_key(), "name:ann|lee|n=9");
        assert!(composite.has_number());

        assert!(resolver.resolve(&row(&[("first_name", "Ann")])).is_none());
    }

    #[test]
    fn stable_id_ignores_case_and_number_format() {
        let canonical = generate_stable_id("evt", "Jane", "Doe", Some("12"));
        assert_eq!(canonical.len(), STABLE_ID_LEN);
        assert_eq!(canonical, generate_stable_id("evt", "jane", "DOE", Some("12.0")));
        assert_ne!(canonical, generate_stable_id("other", "Jane", "Doe", Some("12")));
        assert_ne!(canonical, generate_stable_id("evt", "Jane", "Doe", None));
    }
}
