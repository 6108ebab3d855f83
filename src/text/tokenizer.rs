//! Token lists over a source buffer.
//!
//! A [`TokenList`] is the bridge between a compiled [`Query`] and the
//! snippet extractor: every maximal run of word characters becomes a
//! [`Token`] with its original byte span, flagged `is_match` against the
//! query's terms. Tokens borrow the buffer; nothing is copied.

use crate::error::{Error, Result};
use crate::query::{Query, TermMatcher};

/// A maximal run of word characters, with byte offsets into the source.
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Index of this token in the list.
    pub pos: usize,
    /// Whether this token is covered by any query term.
    pub is_match: bool,
}

/// Ordered tokens with O(1) positional access.
#[derive(Debug)]
pub struct TokenList<'a> {
    src: &'a str,
    tokens: Vec<Token<'a>>,
    /// Positions matching a single-word term.
    word_positions: Vec<usize>,
    /// Inclusive position spans of complete phrase occurrences.
    phrase_spans: Vec<(usize, usize)>,
}

impl<'a> TokenList<'a> {
    /// Tokenize `src` and mark matches against `query`.
    pub fn new(src: &'a str, query: &Query) -> Self {
        let mut tokens: Vec<Token<'a>> = query
            .token_re()
            .find_iter(src)
            .enumerate()
            .map(|(pos, m)| Token {
                text: m.as_str(),
                start: m.start(),
                end: m.end(),
                pos,
                is_match: false,
            })
            .collect();

        let mut word_positions = Vec::new();
        let mut phrase_spans = Vec::new();

        for matcher in query.matchers() {
            match matcher {
                TermMatcher::Word { plain } => {
                    for tok in tokens.iter_mut() {
                        if plain.is_match(tok.text) {
                            if !tok.is_match {
                                word_positions.push(tok.pos);
                            }
                            tok.is_match = true;
                        }
                    }
                }
                TermMatcher::Phrase { words, max_gap } => {
                    for start in 0..tokens.len() {
                        if let Some(hit) = match_phrase_at(&tokens, start, words, *max_gap) {
                            let last = hit.last().copied().unwrap_or(start);
                            for &p in &hit {
                                tokens[p].is_match = true;
                            }
                            phrase_spans.push((start, last));
                        }
                    }
                }
            }
        }

        word_positions.sort_unstable();
        word_positions.dedup();
        phrase_spans.sort_unstable();
        phrase_spans.dedup();

        Self {
            src,
            tokens,
            word_positions,
            phrase_spans,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<&Token<'a>> {
        self.tokens.get(pos)
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    /// The source buffer the tokens borrow from.
    pub fn source(&self) -> &'a str {
        self.src
    }

    /// Positions of all tokens flagged `is_match`, in order.
    pub fn iter_matches(&self) -> impl Iterator<Item = usize> + '_ {
        self.tokens.iter().filter(|t| t.is_match).map(|t| t.pos)
    }

    /// Match positions for window selection.
    ///
    /// With `treat_phrases_as_singles`, every matching token counts on its
    /// own; otherwise a phrase occurrence contributes a single position (its
    /// first token).
    pub fn match_positions(&self, treat_phrases_as_singles: bool) -> Vec<usize> {
        if treat_phrases_as_singles {
            return self.iter_matches().collect();
        }
        let mut positions = self.word_positions.clone();
        positions.extend(self.phrase_spans.iter().map(|(start, _)| *start));
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    /// The token window of half-width `size` around `pos`, shrunk so both
    /// ends land on match tokens (clamped to `pos` itself when no other
    /// match exists on that side).
    pub fn get_window(&self, pos: usize, size: usize) -> Result<&[Token<'a>]> {
        let (start, end) = self.window_bounds(pos, size)?;
        Ok(&self.tokens[start..=end])
    }

    /// Like [`get_window`](Self::get_window) but returning the inclusive
    /// position bounds.
    pub fn window_bounds(&self, pos: usize, size: usize) -> Result<(usize, usize)> {
        let len = self.tokens.len();
        if pos >= len {
            return Err(Error::OutOfRange { index: pos, len });
        }

        let mut start = pos.saturating_sub(size);
        while start < pos && !self.tokens[start].is_match {
            start += 1;
        }
        let mut end = (pos + size).min(len - 1);
        while end > pos && !self.tokens[end].is_match {
            end -= 1;
        }
        Ok((start, end))
    }

    /// Join all token texts with `joiner`.
    pub fn to_string(&self, joiner: &str) -> String {
        let mut out = String::new();
        for (i, tok) in self.tokens.iter().enumerate() {
            if i > 0 {
                out.push_str(joiner);
            }
            out.push_str(tok.text);
        }
        out
    }
}

/// Try to match a phrase starting at token `start`. Consecutive phrase words
/// may be separated by up to `max_gap` token positions. Returns the matched
/// positions on success.
fn match_phrase_at(
    tokens: &[Token<'_>],
    start: usize,
    words: &[regex::Regex],
    max_gap: usize,
) -> Option<Vec<usize>> {
    let first = words.first()?;
    if !first.is_match(tokens[start].text) {
        return None;
    }
    let mut positions = vec![start];
    let mut prev = start;

    for word in &words[1..] {
        let mut found = None;
        for cand in prev + 1..=(prev + max_gap).min(tokens.len().saturating_sub(1)) {
            if word.is_match(tokens[cand].text) {
                found = Some(cand);
                break;
            }
        }
        match found {
            Some(p) => {
                positions.push(p);
                prev = p;
            }
            None => return None,
        }
    }
    Some(positions)
}
