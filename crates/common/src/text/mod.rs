//! Text normalization for keyword matching
//!
//! Titles and questions are compared after lower-casing, removing
//! diacritics (NFD decomposition minus combining marks) and collapsing
//! whitespace, so "Minh Mạng" and "minh mang" match.

use regex_lite::Regex;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

fn whitespace() -> &'static Regex {
    static WS: OnceLock<Regex> = OnceLock::new();
    WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Remove diacritics, keeping base letters.
pub fn strip_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Lower-case, strip accents and collapse whitespace.
pub fn normalize_for_match(text: &str) -> String {
    let lowered = strip_accents(&text.to_lowercase());
    whitespace().replace_all(&lowered, " ").trim().to_string()
}

/// Whitespace tokens of the normalized text.
pub fn match_tokens(text: &str) -> Vec<String> {
    normalize_for_match(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Number of tokens that occur as substrings of an already-normalized haystack.
pub fn count_token_hits(tokens: &[String], normalized_haystack: &str) -> usize {
    tokens
        .iter()
        .filter(|tok| normalized_haystack.contains(tok.as_str()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_vietnamese_accents() {
        assert_eq!(strip_accents("Minh Mạng"), "Minh Mang");
        assert_eq!(strip_accents("Thừa Thiên Huế"), "Thua Thien Hue");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_for_match("  Cha của\tMinh   Mạng "), "cha cua minh mang");
    }

    #[test]
    fn test_match_tokens() {
        let tokens = match_tokens("Cha của Minh Mạng là ai?");
        assert_eq!(tokens, vec!["cha", "cua", "minh", "mang", "la", "ai?"]);
    }

    #[test]
    fn test_count_token_hits() {
        let tokens = match_tokens("Cha của Minh Mạng là ai?");
        assert_eq!(count_token_hits(&tokens, &normalize_for_match("Minh Mạng")), 2);
        assert_eq!(count_token_hits(&tokens, &normalize_for_match("Gia Long")), 0);
    }
}
