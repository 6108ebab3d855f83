//! Snippet extraction.
//!
//! Given a compiled [`Query`] and a source buffer, selects up to `occur`
//! token windows around matches, optionally aligned to sentence boundaries,
//! and renders them as verbatim source slices joined by an ellipsis marker.

use crate::query::Query;
use crate::text::tokenizer::TokenList;
use memchr::memchr3;
use serde::{Deserialize, Serialize};

/// Marker placed between non-adjacent windows.
pub const ELLIPSIS: &str = " ... ";

/// Tunables for one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetOptions {
    /// Maximum number of windows to return.
    pub occur: usize,
    /// Half-width of each window, in tokens.
    pub context: usize,
    /// Extend windows outward to sentence boundaries.
    pub as_sentences: bool,
    /// Skip the `max_chars` budget entirely.
    pub ignore_length: bool,
    /// Total character budget across all windows.
    pub max_chars: usize,
    /// When no match is found, show a leading excerpt instead of nothing.
    pub show: bool,
    /// Count every matching token of a phrase as its own position instead of
    /// one position per phrase occurrence.
    pub treat_phrases_as_singles: bool,
}

impl Default for SnippetOptions {
    fn default() -> Self {
        Self {
            occur: 3,
            context: 8,
            as_sentences: false,
            ignore_length: false,
            max_chars: 300,
            show: true,
            treat_phrases_as_singles: false,
        }
    }
}

/// Snippet extractor bound to a compiled query.
pub struct Snipper<'a> {
    query: &'a Query,
    opts: SnippetOptions,
}

impl<'a> Snipper<'a> {
    pub fn new(query: &'a Query) -> Self {
        Self {
            query,
            opts: SnippetOptions::default(),
        }
    }

    pub fn with_options(query: &'a Query, opts: SnippetOptions) -> Self {
        Self { query, opts }
    }

    pub fn options(&self) -> &SnippetOptions {
        &self.opts
    }

    /// Extract a snippet from `text`.
    ///
    /// Returns the empty string when the query has no terms, the buffer has
    /// no tokens, or nothing matched and `show` is off.
    pub fn snip(&self, text: &str) -> String {
        if self.query.is_empty() {
            return String::new();
        }
        let tokens = TokenList::new(text, self.query);
        if tokens.is_empty() {
            return String::new();
        }

        let positions = tokens.match_positions(self.opts.treat_phrases_as_singles);
        if positions.is_empty() {
            if self.opts.show {
                return self.leading_excerpt(&tokens);
            }
            return String::new();
        }

        let picks = spread_picks(&positions, self.opts.occur, self.opts.context);
        let mut windows = Vec::with_capacity(picks.len());
        for pos in picks {
            let Ok((mut start, mut end)) = tokens.window_bounds(pos, self.opts.context) else {
                continue;
            };
            if self.opts.as_sentences {
                (start, end) = self.extend_to_sentences(&tokens, start, end);
            }
            windows.push((start, end));
        }
        merge_windows(&mut windows);

        self.render(&tokens, &windows)
    }

    /// Widen a window until the surrounding gap text carries a sentence
    /// terminator, without crossing more than `context` extra tokens.
    fn extend_to_sentences(&self, tokens: &TokenList, start: usize, end: usize) -> (usize, usize) {
        let text = tokens.source();
        let max_extra = self.opts.context;

        let mut s = start;
        let mut steps = 0;
        while s > 0 && steps < max_extra {
            let gap = gap_text(text, tokens, s - 1, s);
            if has_sentence_break(gap) {
                break;
            }
            s -= 1;
            steps += 1;
        }

        let mut e = end;
        steps = 0;
        while e + 1 < tokens.len() && steps < max_extra {
            let gap = gap_text(text, tokens, e, e + 1);
            if has_sentence_break(gap) {
                break;
            }
            e += 1;
            steps += 1;
        }

        (s, e)
    }

    /// Fallback for `show` without a match: the front of the buffer, cut at
    /// a token boundary within the character budget.
    fn leading_excerpt(&self, tokens: &TokenList) -> String {
        let text = tokens.source();
        if self.opts.ignore_length || text.chars().count() <= self.opts.max_chars {
            return text.to_string();
        }

        let mut cut = 0;
        for tok in tokens.tokens() {
            if text[..tok.end].chars().count() > self.opts.max_chars {
                break;
            }
            cut = tok.end;
        }
        let mut out = text[..cut].to_string();
        out.push_str(" ...");
        out
    }

    fn render(&self, tokens: &TokenList, windows: &[(usize, usize)]) -> String {
        let text = tokens.source();
        let budget = if self.opts.ignore_length {
            usize::MAX
        } else {
            self.opts.max_chars
        };

        let mut out = String::new();
        let mut used = 0usize;
        let mut truncated = false;
        let mut last_end_byte = text.len();

        for (i, &(s, e)) in windows.iter().enumerate() {
            let (Some(first), Some(last)) = (tokens.get(s), tokens.get(e)) else {
                continue;
            };
            let slice = &text[first.start..last.end];
            let sep = if i == 0 {
                if first.start > 0 {
                    "... "
                } else {
                    ""
                }
            } else {
                ELLIPSIS
            };

            let slice_chars = slice.chars().count();
            if used + slice_chars <= budget {
                out.push_str(sep);
                out.push_str(slice);
                used += slice_chars;
                last_end_byte = last.end;
                continue;
            }

            // Over budget: keep whole tokens while they fit, then stop.
            let remaining = budget.saturating_sub(used);
            let mut cut = None;
            for pos in s..=e {
                let Some(tok) = tokens.get(pos) else { break };
                if text[first.start..tok.end].chars().count() > remaining {
                    break;
                }
                cut = Some(tok.end);
            }
            if let Some(cut) = cut {
                out.push_str(sep);
                out.push_str(&text[first.start..cut]);
                last_end_byte = cut;
            }
            truncated = true;
            break;
        }

        if out.is_empty() {
            return out;
        }
        if truncated || last_end_byte < text.len() {
            out.push_str(" ...");
        }
        out
    }
}

/// Greedy position spread: take the first match, then skip forward until at
/// least `context` tokens past the previous pick.
fn spread_picks(positions: &[usize], occur: usize, context: usize) -> Vec<usize> {
    let mut picks = Vec::new();
    let mut last: Option<usize> = None;
    for &p in positions {
        if picks.len() >= occur {
            break;
        }
        if let Some(lp) = last {
            if p - lp < context.max(1) {
                continue;
            }
        }
        picks.push(p);
        last = Some(p);
    }
    picks
}

/// Merge overlapping or adjacent token-index windows in place.
fn merge_windows(windows: &mut Vec<(usize, usize)>) {
    windows.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(windows.len());
    for &(s, e) in windows.iter() {
        match merged.last_mut() {
            Some((_, prev_end)) if s <= *prev_end + 1 => {
                *prev_end = (*prev_end).max(e);
            }
            _ => merged.push((s, e)),
        }
    }
    *windows = merged;
}

fn gap_text<'t>(text: &'t str, tokens: &TokenList, left: usize, right: usize) -> &'t str {
    let from = tokens.get(left).map(|t| t.end).unwrap_or(0);
    let to = tokens.get(right).map(|t| t.start).unwrap_or(text.len());
    &text[from..to]
}

/// Whether a gap between tokens contains `.`, `!`, or `?` followed by
/// whitespace.
fn has_sentence_break(gap: &str) -> bool {
    let bytes = gap.as_bytes();
    let mut i = 0;
    while let Some(off) = memchr3(b'.', b'!', b'?', &bytes[i..]) {
        let idx = i + off;
        if bytes.get(idx + 1).map(|b| b.is_ascii_whitespace()).unwrap_or(false) {
            return true;
        }
        i = idx + 1;
    }
    false
}
