//! Boundary tables derived from the configuration.
//!
//! These are the regex fragments every synthesized pattern is assembled from.
//! HTML special characters are deliberately excluded from word characters so
//! pattern construction never tries to align on raw angle brackets or
//! ampersands inside markup; those are boundaries or entity prefixes instead.

use crate::config::Config;

/// Matches one character entity, e.g. `&amp;` or `&#233;`.
const ENTITY_PATTERN: &str = r"&[\w#]+;";

/// Regex fragments marking word/non-word transitions, HTML-aware.
#[derive(Debug, Clone)]
pub struct Bounds {
    /// Valid left context for a match: buffer start, tag end, entity,
    /// whitespace, non-word character, or an ignorable leading character.
    pub start_bound: String,
    /// Valid right context for a match.
    pub end_bound: String,
    /// Separator between phrase words in plain text.
    pub plain_phrase_bound: String,
    /// Separator between phrase words in markup, tolerating entity whitespace.
    pub html_phrase_bound: String,
    /// `word_characters` with `<`, `>`, `&` removed; used inside wildcards.
    pub html_safe_wordchars: String,
}

impl Bounds {
    pub fn from_config(cfg: &Config) -> Self {
        let wc = &cfg.word_characters;
        let ws = &cfg.whitespace;
        let ifc = &cfg.ignore_first_char;
        let ilc = &cfg.ignore_last_char;

        let mut start_parts = vec![
            r"\A".to_string(),
            ">".to_string(),
            ENTITY_PATTERN.to_string(),
            format!("(?:{ws})"),
            format!("[^{wc}]"),
        ];
        if !ifc.is_empty() {
            start_parts.push(format!("[{ifc}]"));
        }

        let mut end_parts = vec![
            r"\z".to_string(),
            "<".to_string(),
            "&".to_string(),
            format!("(?:{ws})"),
            format!("[^{wc}]"),
        ];
        if !ilc.is_empty() {
            end_parts.push(format!("[{ilc}]"));
        }

        let mut plain_phrase_bound = String::new();
        if !ilc.is_empty() {
            plain_phrase_bound.push_str(&format!("[{ilc}]*"));
        }
        plain_phrase_bound.push_str(&format!(r"(?:\s|[^{wc}])"));
        if !ifc.is_empty() {
            plain_phrase_bound.push_str(&format!("[{ifc}]?"));
        }

        let mut html_phrase_bound = String::new();
        if !ifc.is_empty() {
            html_phrase_bound.push_str(&format!("[{ifc}]*"));
        }
        html_phrase_bound.push_str(&format!("(?:(?:{ws})|[^{wc}])"));
        if !ilc.is_empty() {
            html_phrase_bound.push_str(&format!("[{ilc}]?"));
        }

        Self {
            start_bound: format!("(?:{})", start_parts.join("|")),
            end_bound: format!("(?:{})", end_parts.join("|")),
            plain_phrase_bound,
            html_phrase_bound,
            html_safe_wordchars: html_safe(wc),
        }
    }
}

/// Strip `<`, `>`, `&` from a character-class body.
fn html_safe(class_body: &str) -> String {
    class_body.chars().filter(|c| !matches!(c, '<' | '>' | '&')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn bounds() -> Bounds {
        Bounds::from_config(&Config::default())
    }

    #[test]
    fn test_all_fragments_compile() {
        let b = bounds();
        for pat in [
            &b.start_bound,
            &b.end_bound,
            &b.plain_phrase_bound,
            &b.html_phrase_bound,
        ] {
            assert!(Regex::new(pat).is_ok(), "fragment failed to compile: {pat}");
        }
        assert!(Regex::new(&format!("[{}]", b.html_safe_wordchars)).is_ok());
    }

    #[test]
    fn test_start_bound_accepts_tag_end_and_entity() {
        let b = bounds();
        let re = Regex::new(&b.start_bound).unwrap();
        assert!(re.is_match(">"));
        assert!(re.is_match("&nbsp;"));
        assert!(re.is_match(" "));
        assert!(re.is_match(""));
    }

    #[test]
    fn test_end_bound_accepts_tag_start() {
        let b = bounds();
        let re = Regex::new(&b.end_bound).unwrap();
        assert!(re.is_match("<"));
        assert!(re.is_match("&"));
        assert!(re.is_match("."));
    }

    #[test]
    fn test_plain_phrase_bound_matches_space_and_punct() {
        let b = bounds();
        let re = Regex::new(&format!(r"\A(?:{})\z", b.plain_phrase_bound)).unwrap();
        assert!(re.is_match(" "));
        assert!(re.is_match(","));
        assert!(!re.is_match("ab"));
    }

    #[test]
    fn test_html_safe_strips_markup_chars() {
        assert_eq!(html_safe(r"\w<>&'"), r"\w'");
        assert_eq!(html_safe(r"\w'\-"), r"\w'\-");
    }
}
