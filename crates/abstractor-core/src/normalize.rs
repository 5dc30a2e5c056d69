use once_cell::sync::Lazy;
use regex::Regex;

/// Expand common typographic ligatures found in PDF text.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Rejoin words broken across lines by hyphenation: a hyphen immediately
/// followed by a line break and a lowercase letter is a broken word.
fn fix_hyphenation(text: &str) -> String {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)-\r?\n[ \t]*([a-z])").unwrap());
    RE.replace_all(text, "$1$2").into_owned()
}

/// Strip layout artifacts from raw extracted text.
///
/// Expands ligatures, rejoins hyphenation line breaks, drops non-printable
/// characters, and collapses all whitespace runs (including newlines) to
/// single spaces. Pure and total: always returns a value, possibly empty.
pub fn normalize(raw: &str) -> String {
    let text = expand_ligatures(raw);
    let text = fix_hyphenation(&text);
    let text: String = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Safely truncate a string at a UTF-8 boundary.
pub fn safe_truncate(s: &str, max_bytes: usize) -> &str {
    &s[..floor_char_boundary(s, max_bytes)]
}

/// Largest char boundary at or below `i`.
pub(crate) fn floor_char_boundary(s: &str, i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    let mut i = i;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_ligatures() {
        assert_eq!(expand_ligatures("ﬁnding ﬂow"), "finding flow");
        assert_eq!(expand_ligatures("eﬃcient oﬄine"), "efficient offline");
        assert_eq!(expand_ligatures("no ligatures here"), "no ligatures here");
    }

    #[test]
    fn test_normalize_rejoins_hyphenation() {
        assert_eq!(normalize("detec-\ntion"), "detection");
        assert_eq!(normalize("classi-\n  fication works"), "classification works");
    }

    #[test]
    fn test_normalize_keeps_hyphen_before_uppercase() {
        // Line break after a hyphen followed by an uppercase letter is not
        // a syllable break (e.g., list items like "GPT-\nNeo")
        assert_eq!(normalize("GPT-\nNeo"), "GPT- Neo");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("hello   \n\n  world\t!"), "hello world !");
        assert_eq!(normalize("  leading and trailing  "), "leading and trailing");
    }

    #[test]
    fn test_normalize_strips_non_printable() {
        assert_eq!(normalize("a\u{0}b\u{7}c"), "abc");
    }

    #[test]
    fn test_normalize_empty_and_whitespace_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n \t "), "");
    }

    #[test]
    fn test_safe_truncate_ascii() {
        assert_eq!(safe_truncate("hello", 3), "hel");
        assert_eq!(safe_truncate("hello", 10), "hello");
    }

    #[test]
    fn test_safe_truncate_utf8_boundary() {
        // 'é' is two bytes; cutting inside it must back off
        let s = "héllo";
        assert_eq!(safe_truncate(s, 2), "h");
        assert_eq!(safe_truncate(s, 3), "hé");
    }
}
