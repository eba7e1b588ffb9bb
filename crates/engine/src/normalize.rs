//! String normalization for feed values.
//!
//! The feed hands over free-text fields straight from package manifests:
//! over-long identifiers, padded whitespace, duplicated author lists and
//! the occasional mojibake. Everything that reaches the store passes
//! through here first.

use std::collections::HashSet;

/// Column cap for identifiers, author names and tag names.
pub const MAX_NAME_LEN: usize = 128;
/// Column cap for version strings and version ranges.
pub const MAX_VERSION_LEN: usize = 50;

// Decoders substitute U+FFFD for byte sequences they can't make sense of;
// a name containing one is feed corruption, not data.
const REPLACEMENT: char = '\u{FFFD}';

/// Trim, then truncate to at most `max_chars` characters.
///
/// Truncation counts `char`s so a multi-byte code point is never split.
pub fn normalize(value: &str, max_chars: usize) -> String {
    let trimmed = value.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((boundary, _)) => trimmed[..boundary].to_string(),
        None => trimmed.to_string(),
    }
}

/// Split a comma-separated author field into normalized, deduplicated names.
pub fn split_authors(raw: &str) -> Vec<String> {
    collect_names(raw.split(','))
}

/// Split a whitespace-separated tag field into normalized, deduplicated names.
pub fn split_tags(raw: &str) -> Vec<String> {
    collect_names(raw.split_whitespace())
}

/// Shared filter pipeline: normalize each part, drop empty and corrupted
/// entries, deduplicate case-insensitively keeping the first-seen casing.
fn collect_names<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for part in parts {
        let name = normalize(part, MAX_NAME_LEN);
        if name.is_empty() || name.contains(REPLACEMENT) {
            continue;
        }
        if seen.insert(name.to_lowercase()) {
            names.push(name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  padded  ", 128, "padded")]
    #[case("short", 128, "short")]
    #[case("", 128, "")]
    #[case("   ", 128, "")]
    fn test_normalize_trims(#[case] input: &str, #[case] max: usize, #[case] expected: &str) {
        assert_eq!(normalize(input, max), expected);
    }

    #[test]
    fn test_normalize_truncates_identifier_to_128() {
        let long = "x".repeat(140);
        assert_eq!(normalize(&long, MAX_NAME_LEN).chars().count(), 128);
    }

    #[test]
    fn test_normalize_truncates_version_to_50() {
        let long = "1.0.0-".to_string() + &"beta".repeat(20);
        assert_eq!(long.len(), 86);
        assert_eq!(normalize(&long, MAX_VERSION_LEN).chars().count(), 50);
    }

    #[test]
    fn test_normalize_counts_chars_not_bytes() {
        let value = "é".repeat(10);
        let normalized = normalize(&value, 4);
        assert_eq!(normalized.chars().count(), 4);
        assert_eq!(normalized, "éééé");
    }

    #[test]
    fn test_authors_dedup_is_case_insensitive() {
        // First-seen casing wins.
        assert_eq!(split_authors("A, a, B"), vec!["A", "B"]);
        assert_eq!(split_authors("ada, ADA, Ada Lovelace"), vec!["ada", "Ada Lovelace"]);
    }

    #[test]
    fn test_authors_drop_empty_and_corrupted() {
        assert_eq!(split_authors("Ada, , \u{FFFD}broken, Brian"), vec!["Ada", "Brian"]);
        assert!(split_authors("").is_empty());
        assert!(split_authors(", ,").is_empty());
    }

    #[test]
    fn test_tags_split_on_whitespace() {
        assert_eq!(split_tags("json  net\tJSON\nserializer"), vec!["json", "net", "serializer"]);
    }

    #[test]
    fn test_names_are_truncated() {
        let long = format!("{}, Brian", "a".repeat(200));
        let authors = split_authors(&long);
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].chars().count(), 128);
    }
}
