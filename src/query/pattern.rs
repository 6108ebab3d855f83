//! Regex synthesis.
//!
//! Every term gets two compiled patterns: a *plain* one for raw text and an
//! *HTML-aware* one that tolerates tags and character entities interleaved
//! with the matched characters. Both are assembled from the boundary
//! fragments in [`Bounds`], character by character, so each piece can be
//! tested in isolation.

use crate::config::Config;
use crate::error::Result;
use crate::text::bounds::Bounds;
use crate::text::entities::entity_for;
use regex::{Regex, RegexBuilder};

/// The compiled matcher pair for one term.
///
/// Both patterns capture three groups: leading boundary, the matched term,
/// trailing boundary, so a highlighter can re-emit the context verbatim.
#[derive(Debug, Clone)]
pub struct RegexPair {
    /// Matches the term in plain text.
    pub plain: Regex,
    /// Matches the term with markup and entity encodings interleaved.
    pub html: Regex,
}

pub(crate) fn build_pair(term_text: &str, bounds: &Bounds, cfg: &Config) -> Result<RegexPair> {
    let plain_pattern = format!(
        r"(\A|{bound})({body})(\z|{bound})",
        bound = bounds.plain_phrase_bound,
        body = plain_body(term_text, bounds, cfg),
    );
    let html_pattern = format!(
        "({start})({body})({end})",
        start = bounds.start_bound,
        body = html_body(term_text, bounds, cfg),
        end = bounds.end_bound,
    );
    Ok(RegexPair {
        plain: compile(&plain_pattern, cfg)?,
        html: compile(&html_pattern, cfg)?,
    })
}

fn compile(pattern: &str, cfg: &Config) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(cfg.ignore_case)
        .dot_matches_new_line(true)
        .build()?)
}

/// Escaped term text with the wildcard expanded and every interior space
/// replaced by the plain phrase bound.
fn plain_body(text: &str, bounds: &Bounds, cfg: &Config) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if c == cfg.wildcard {
            out.push_str(&format!("[{}]*", bounds.html_safe_wordchars));
        } else if c == ' ' {
            out.push_str(&bounds.plain_phrase_bound);
        } else {
            out.push_str(&regex::escape(&c.to_string()));
        }
    }
    out
}

/// Character-by-character HTML body: each character may appear literally or
/// as a named/numeric entity, with any number of tags between consecutive
/// characters.
fn html_body(text: &str, bounds: &Bounds, cfg: &Config) -> String {
    let tag_gap = format!("(?:{})*", cfg.tag_re);
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            out.push_str(&bounds.html_phrase_bound);
            out.push_str(&tag_gap);
            continue;
        }
        if c == cfg.wildcard {
            out.push_str(&format!("[{}]*", bounds.html_safe_wordchars));
        } else {
            out.push_str(&char_alternation(c));
        }
        if i + 1 < chars.len() {
            out.push_str(&tag_gap);
        }
    }
    out
}

/// `(?i:literal|&name;|&#dec;|&#xhex;)` for one character.
fn char_alternation(c: char) -> String {
    let mut alts = vec![regex::escape(&c.to_string())];
    if let Some(name) = entity_for(c) {
        alts.push(format!("&{name};"));
    }
    alts.push(format!("&#0*{};", c as u32));
    alts.push(format!("&#x0*{:x};", c as u32));
    format!("(?i:{})", alts.join("|"))
}

/// Matcher for one word in isolation (used for token and phrase-word
/// checks): the whole token must match, wildcard expanded.
pub(crate) fn anchored_word(word: &str, bounds: &Bounds, cfg: &Config) -> Result<Regex> {
    let mut body = String::new();
    for c in word.chars() {
        if c == cfg.wildcard {
            body.push_str(&format!("[{}]*", bounds.html_safe_wordchars));
        } else {
            body.push_str(&regex::escape(&c.to_string()));
        }
    }
    Ok(RegexBuilder::new(&format!(r"\A(?:{body})\z"))
        .case_insensitive(cfg.ignore_case)
        .build()?)
}
