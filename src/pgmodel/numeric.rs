//! Locale-aware numeric parsing
//!
//! The source site renders numbers in the session language's locale:
//! Swedish pages group thousands with spaces (or non-breaking variants)
//! and mark decimals with a comma, English pages group with commas and
//! mark decimals with a dot. Both "2 448" (sv-se) and "2,448" (en-us)
//! denote the integer 2448.

use std::sync::LazyLock;

use regex::Regex;

use crate::session::Language;

fn group_separators(language: Language) -> &'static [char] {
    match language {
        Language::SvSe => &[' ', '\u{a0}', '\u{202f}', '.'],
        Language::EnUs => &[','],
    }
}

fn decimal_separator(language: Language) -> char {
    match language {
        Language::SvSe => ',',
        Language::EnUs => '.',
    }
}

/// Parse an integer rendered in `language`'s locale.
///
/// Returns `None` when the text contains a decimal separator or anything
/// besides digits and group separators.
pub fn parse_integer(text: &str, language: Language) -> Option<u32> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits: String = trimmed
        .chars()
        .filter(|c| !group_separators(language).contains(c))
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse a decimal number rendered in `language`'s locale.
pub fn parse_decimal(text: &str, language: Language) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let ungrouped: String = trimmed
        .chars()
        .filter(|c| !group_separators(language).contains(c))
        .collect();
    let normalized = ungrouped.replace(decimal_separator(language), ".");
    if normalized.is_empty()
        || normalized.matches('.').count() > 1
        || !normalized.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return None;
    }
    normalized.parse().ok()
}

/// Find the first numeric run inside free-form text and parse it as an
/// integer in `language`'s locale. Used for figures embedded in prose,
/// e.g. "Publik: 2 448".
pub fn integer_in(text: &str, language: Language) -> Option<u32> {
    static RUN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new("[0-9][0-9\\s.,\u{a0}\u{202f}]*").expect("static pattern"));
    let found = RUN.find(text)?;
    let run = found
        .as_str()
        .trim_end_matches(|c: char| !c.is_ascii_digit());
    parse_integer(run, language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locales_agree_on_the_same_figure() {
        assert_eq!(parse_integer("2 448", Language::SvSe), Some(2448));
        assert_eq!(parse_integer("2\u{a0}448", Language::SvSe), Some(2448));
        assert_eq!(parse_integer("2,448", Language::EnUs), Some(2448));
        assert_eq!(parse_integer("2448", Language::SvSe), Some(2448));
        assert_eq!(parse_integer("2448", Language::EnUs), Some(2448));
    }

    #[test]
    fn decimal_separator_rejects_integer_parse() {
        assert_eq!(parse_integer("2,13", Language::SvSe), None);
        assert_eq!(parse_integer("2.13", Language::EnUs), None);
        assert_eq!(parse_integer("figure", Language::EnUs), None);
        assert_eq!(parse_integer("", Language::SvSe), None);
    }

    #[test]
    fn decimals_parse_per_locale() {
        assert_eq!(parse_decimal("2,13", Language::SvSe), Some(2.13));
        assert_eq!(parse_decimal("2.13", Language::EnUs), Some(2.13));
        assert_eq!(parse_decimal("1 024,5", Language::SvSe), Some(1024.5));
        assert_eq!(parse_decimal("1,024.5", Language::EnUs), Some(1024.5));
        assert_eq!(parse_decimal("1.2.3", Language::EnUs), None);
    }

    #[test]
    fn integer_in_extracts_from_prose() {
        assert_eq!(integer_in("Publik: 2 448 personer", Language::SvSe), Some(2448));
        assert_eq!(integer_in("Attendance: 2,448.", Language::EnUs), Some(2448));
        assert_eq!(integer_in("no figure here", Language::EnUs), None);
    }
}
