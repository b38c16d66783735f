//! Header normalization.
//!
//! Two strictness levels: [`normalize`] keeps word boundaries so headers can
//! be compared token by token, [`normalize_aggressive`] removes bracketed
//! units, filler words and every separator so that `Bench Press (lbs)` and
//! `bench-press` compare equal. Bracketed text that is not a unit is kept:
//! `Agility (Cones)` and `Agility (Ladder)` are different drills.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Tokens that carry no meaning in a drill header.
const FILLER_TOKENS: &[&str] = &["drill", "test", "score"];

/// Bracket contents treated as a unit of measure.
const UNIT_TOKENS: &[&str] = &[
    "s", "sec", "secs", "second", "seconds", "ms", "min", "mins", "minutes", "m", "cm", "mm",
    "meters", "metres", "in", "inch", "inches", "ft", "feet", "yd", "yds", "yards", "kg", "lb",
    "lbs", "pounds", "mph", "kph", "km/h", "m/s", "%", "pct", "percent", "pts", "points", "reps",
    "level", "lvl", "#", "no",
];

/// Byte-order mark and zero-width characters that survive spreadsheet exports.
fn is_invisible(ch: char) -> bool {
    matches!(
        ch,
        '\u{feff}' | '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{2060}' | '\u{00ad}'
    )
}

/// Removes invisible characters and folds diacritics (`ü` becomes `u`).
pub fn fold(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !is_invisible(*ch))
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect()
}

/// Standard normalization.
///
/// Lowercases, reads `#` as the word `number`, collapses every run of
/// whitespace and punctuation into one space, and trims.
pub fn normalize(header: &str) -> String {
    let folded = fold(header).replace('#', " number ").to_lowercase();
    collapse(&folded)
}

fn collapse(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Aggressive normalization.
///
/// Strips bracketed units such as `(sec)` or `[%]`, drops filler tokens,
/// then removes every remaining non-alphanumeric character.
pub fn normalize_aggressive(header: &str) -> String {
    let without_units = strip_bracketed_units(header);
    normalize(&without_units)
        .split(' ')
        .filter(|token| !FILLER_TOKENS.contains(token))
        .collect()
}

fn is_unit(content: &str) -> bool {
    let content = content.trim().trim_end_matches('.').to_lowercase();
    content.is_empty() || UNIT_TOKENS.contains(&content.as_str())
}

/// Removes `(...)` and `[...]` groups whose content is a unit. Other groups
/// keep their text; the brackets become separators.
fn strip_bracketed_units(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find(['(', '[']) {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find([')', ']']) else {
            out.push(' ');
            rest = after;
            continue;
        };
        let content = &after[..close];
        if !is_unit(content) {
            out.push(' ');
            out.push_str(content);
        }
        out.push(' ');
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}
