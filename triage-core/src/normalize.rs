//! Diacritic stripping applied to issue text before any pattern runs.

use unicode_normalization::UnicodeNormalization;

/// Range of the Unicode "Combining Diacritical Marks" block.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Decompose `text` (NFD) and drop every combining diacritical mark, so that
/// "café" and "cafe" are matched by the same pattern.
pub fn normalize(text: &str) -> String {
    text.nfd().filter(|c| !COMBINING_MARKS.contains(c)).collect()
}

/// Normalize optional issue text. Absent text stays absent: there is nothing
/// to test, which is different from testing an empty string.
pub fn normalize_opt(text: Option<&str>) -> Option<String> {
    text.map(normalize)
}
