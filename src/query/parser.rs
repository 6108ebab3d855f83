//! Boolean query parser.
//!
//! Consumes the raw query string and produces a [`ParseTree`]: three ordered
//! bucket lists keyed by `+` (required), `-` (excluded), and neutral. A
//! clause is `[+|-]? (field ':')? (phrase | word | '(' sub-query ')')`, with
//! the configured AND/OR/NOT words joining clauses and an optional `~N`
//! proximity suffix on phrases.

use crate::config::Config;
use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

/// Parsed query tree. Bucket order is the order clauses appeared in.
#[derive(Debug, Clone, Default)]
pub struct ParseTree {
    /// Clauses a document must satisfy (`+` prefix or AND).
    pub required: Vec<Clause>,
    /// Clauses a document must not satisfy (`-` prefix or NOT).
    pub excluded: Vec<Clause>,
    /// Neutral clauses (bare or OR-joined).
    pub optional: Vec<Clause>,
}

impl ParseTree {
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.excluded.is_empty() && self.optional.is_empty()
    }
}

/// One leaf or nested group.
#[derive(Debug, Clone)]
pub struct Clause {
    /// Field prefix, e.g. `color` in `color:brown`.
    pub field: Option<String>,
    pub value: ClauseValue,
    /// Proximity window from a `"…"~N` suffix.
    pub proximity: Option<u32>,
    /// Byte offset of the clause in the original query, used to restore
    /// first-occurrence order across buckets.
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub enum ClauseValue {
    Word(String),
    Phrase(String),
    Group(ParseTree),
}

#[derive(Clone, Copy, PartialEq)]
enum Bucket {
    Required,
    Excluded,
    Optional,
}

#[derive(Clone, Copy)]
enum OpKind {
    And,
    Or,
    Not,
}

/// Compiled operator-word patterns, anchored to a whole word.
pub(crate) struct OperatorWords {
    and: Regex,
    or: Regex,
    not: Regex,
}

impl OperatorWords {
    pub(crate) fn compile(cfg: &Config) -> Result<Self> {
        Ok(Self {
            and: anchored(&cfg.and_word)?,
            or: anchored(&cfg.or_word)?,
            not: anchored(&cfg.not_word)?,
        })
    }

    fn kind(&self, word: &str) -> Option<OpKind> {
        if self.and.is_match(word) {
            Some(OpKind::And)
        } else if self.or.is_match(word) {
            Some(OpKind::Or)
        } else if self.not.is_match(word) {
            Some(OpKind::Not)
        } else {
            None
        }
    }

    /// Whether `word` is any Boolean operator word.
    pub(crate) fn is_operator(&self, word: &str) -> bool {
        self.kind(word).is_some()
    }
}

fn anchored(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(&format!(r"\A(?:{pattern})\z"))
        .case_insensitive(true)
        .build()?)
}

/// Parse a raw query string into a tree.
pub fn parse_query(input: &str, cfg: &Config) -> Result<ParseTree> {
    let ops = OperatorWords::compile(cfg)?;
    let mut parser = Parser {
        input,
        pos: 0,
        cfg,
        ops: &ops,
    };
    parser.parse_tree(None)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    cfg: &'a Config,
    ops: &'a OperatorWords,
}

impl<'a> Parser<'a> {
    /// Parse clauses until end of input, or until `)` when inside a group.
    /// `group_open` is the byte offset of the enclosing `(`, if any.
    fn parse_tree(&mut self, group_open: Option<usize>) -> Result<ParseTree> {
        let mut tree = ParseTree::default();
        let mut pending_op: Option<(Bucket, usize)> = None;

        loop {
            self.skip_whitespace();

            if self.is_eof() {
                if let Some((_, op_offset)) = pending_op {
                    return Err(self.err(op_offset, "trailing operator"));
                }
                if let Some(open) = group_open {
                    return Err(self.err(open, "unbalanced parenthesis"));
                }
                break;
            }

            if self.peek_char() == Some(')') {
                if group_open.is_none() {
                    return Err(self.err(self.pos, "unmatched `)`"));
                }
                if let Some((_, op_offset)) = pending_op {
                    return Err(self.err(op_offset, "trailing operator"));
                }
                break;
            }

            // A bare word matching an operator pattern joins the next clause.
            if let Some((kind, word_end)) = self.peek_operator() {
                if pending_op.is_some() {
                    return Err(self.err(self.pos, "consecutive operators"));
                }
                let bucket = match kind {
                    OpKind::And => Bucket::Required,
                    OpKind::Or => Bucket::Optional,
                    OpKind::Not => Bucket::Excluded,
                };
                pending_op = Some((bucket, self.pos));
                self.pos = word_end;
                continue;
            }

            let (clause, prefix) = self.parse_clause()?;
            let bucket = prefix
                .or(pending_op.take().map(|(b, _)| b))
                .unwrap_or(Bucket::Optional);
            match bucket {
                Bucket::Required => tree.required.push(clause),
                Bucket::Excluded => tree.excluded.push(clause),
                Bucket::Optional => tree.optional.push(clause),
            }
        }

        Ok(tree)
    }

    /// Parse one clause; returns it with the bucket forced by a `+`/`-`
    /// prefix, if present.
    fn parse_clause(&mut self) -> Result<(Clause, Option<Bucket>)> {
        let offset = self.pos;

        let prefix = if self.consume_char('+') {
            Some(Bucket::Required)
        } else if self.consume_char('-') {
            Some(Bucket::Excluded)
        } else {
            None
        };

        let field = self.parse_field_prefix();

        if self.is_eof() {
            return Err(self.err(offset, "expected a term"));
        }

        if self.consume_char('(') {
            let open = self.pos - 1;
            let sub = self.parse_tree(Some(open))?;
            self.consume_char(')');
            return Ok((
                Clause {
                    field,
                    value: ClauseValue::Group(sub),
                    proximity: None,
                    offset,
                },
                prefix,
            ));
        }

        if self.peek_char() == Some(self.cfg.phrase_delim) {
            let (text, proximity) = self.parse_phrase()?;
            return Ok((
                Clause {
                    field,
                    value: ClauseValue::Phrase(text),
                    proximity,
                    offset,
                },
                prefix,
            ));
        }

        let word = self.take_word();
        if word.is_empty() {
            return Err(self.err(offset, "expected a term"));
        }
        Ok((
            Clause {
                field,
                value: ClauseValue::Word(word),
                proximity: None,
                offset,
            },
            prefix,
        ))
    }

    /// Consume `ident:` if the cursor sits on a field prefix.
    fn parse_field_prefix(&mut self) -> Option<String> {
        let start = self.pos;
        let rest = self.remaining();
        let ident_len = rest
            .char_indices()
            .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);

        if ident_len == 0 || !rest[ident_len..].starts_with(':') {
            return None;
        }
        // `foo:` followed by whitespace or end is not a prefix; let the word
        // lexer pick it up verbatim.
        let after = &rest[ident_len + 1..];
        if after.is_empty() || after.starts_with(char::is_whitespace) {
            return None;
        }

        self.pos = start + ident_len + 1;
        Some(rest[..ident_len].to_string())
    }

    /// Parse a delimited phrase and an optional `~N` proximity suffix.
    fn parse_phrase(&mut self) -> Result<(String, Option<u32>)> {
        let open = self.pos;
        self.advance(); // opening delimiter

        let start = self.pos;
        while !self.is_eof() && self.peek_char() != Some(self.cfg.phrase_delim) {
            self.advance();
        }
        if self.is_eof() {
            return Err(self.err(open, "unbalanced phrase delimiter"));
        }
        let text = self.input[start..self.pos].to_string();
        self.advance(); // closing delimiter

        let proximity = if self.consume_char('~') {
            let digits_start = self.pos;
            while self.peek_char().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.advance();
            }
            if self.pos == digits_start {
                return Err(self.err(digits_start, "expected digits after `~`"));
            }
            self.input[digits_start..self.pos].parse::<u32>().ok()
        } else {
            None
        };

        Ok((text, proximity))
    }

    /// If the next whitespace-delimited word is an operator word, return its
    /// kind and end offset without consuming.
    fn peek_operator(&self) -> Option<(OpKind, usize)> {
        let rest = self.remaining();
        let word_len = rest
            .char_indices()
            .take_while(|(_, c)| {
                !c.is_whitespace() && *c != '(' && *c != ')' && *c != self.cfg.phrase_delim
            })
            .last()
            .map(|(i, c)| i + c.len_utf8())?;
        let word = &rest[..word_len];
        self.ops.kind(word).map(|k| (k, self.pos + word_len))
    }

    /// Consume a bare word: everything up to whitespace or a delimiter.
    fn take_word(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == '(' || c == ')' || c == self.cfg.phrase_delim {
                break;
            }
            self.advance();
        }
        self.input[start..self.pos].to_string()
    }

    fn err(&self, offset: usize, message: &str) -> Error {
        Error::InvalidQuery {
            offset,
            message: message.to_string(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map(|c| c.is_whitespace()).unwrap_or(false) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> ParseTree {
        parse_query(input, &Config::default()).unwrap()
    }

    fn word(clause: &Clause) -> &str {
        match &clause.value {
            ClauseValue::Word(w) => w,
            other => panic!("expected word, got {other:?}"),
        }
    }

    #[test]
    fn test_single_word_is_neutral() {
        let t = parse("hello");
        assert_eq!(t.optional.len(), 1);
        assert_eq!(word(&t.optional[0]), "hello");
        assert!(t.required.is_empty());
    }

    #[test]
    fn test_plus_minus_prefixes() {
        let t = parse("+jumped -quickly ran");
        assert_eq!(word(&t.required[0]), "jumped");
        assert_eq!(word(&t.excluded[0]), "quickly");
        assert_eq!(word(&t.optional[0]), "ran");
    }

    #[test]
    fn test_and_buckets_next_clause() {
        let t = parse("foo and bar");
        assert_eq!(t.optional.len(), 1);
        assert_eq!(t.required.len(), 1);
        assert_eq!(word(&t.required[0]), "bar");
    }

    #[test]
    fn test_not_excludes_next_clause() {
        let t = parse("foo NOT bar");
        assert_eq!(word(&t.excluded[0]), "bar");
    }

    #[test]
    fn test_or_stays_neutral() {
        let t = parse("foo OR bar");
        assert_eq!(t.optional.len(), 2);
    }

    #[test]
    fn test_operator_word_prefix_is_not_operator() {
        let t = parse("android");
        assert_eq!(word(&t.optional[0]), "android");
    }

    #[test]
    fn test_field_prefix() {
        let t = parse("color:brown fox");
        assert_eq!(t.optional[0].field.as_deref(), Some("color"));
        assert_eq!(word(&t.optional[0]), "brown");
        assert!(t.optional[1].field.is_none());
    }

    #[test]
    fn test_phrase() {
        let t = parse("\"over the lazy dog\"");
        match &t.optional[0].value {
            ClauseValue::Phrase(p) => assert_eq!(p, "over the lazy dog"),
            other => panic!("expected phrase, got {other:?}"),
        }
    }

    #[test]
    fn test_phrase_proximity() {
        let t = parse("\"live united\"~5");
        assert_eq!(t.optional[0].proximity, Some(5));
    }

    #[test]
    fn test_field_phrase() {
        let t = parse("title:\"brown fox\"");
        assert_eq!(t.optional[0].field.as_deref(), Some("title"));
        assert!(matches!(&t.optional[0].value, ClauseValue::Phrase(p) if p == "brown fox"));
    }

    #[test]
    fn test_group() {
        let t = parse("+(foo bar) baz");
        assert_eq!(t.required.len(), 1);
        match &t.required[0].value {
            ClauseValue::Group(sub) => assert_eq!(sub.optional.len(), 2),
            other => panic!("expected group, got {other:?}"),
        }
        assert_eq!(word(&t.optional[0]), "baz");
    }

    #[test]
    fn test_unbalanced_quote_reports_offset() {
        let err = parse_query("foo \"bar", &Config::default()).unwrap_err();
        match err {
            Error::InvalidQuery { offset, .. } => assert_eq!(offset, 4),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_trailing_operator_fails() {
        assert!(parse_query("foo and", &Config::default()).is_err());
    }

    #[test]
    fn test_unmatched_close_paren_fails() {
        assert!(parse_query("foo)", &Config::default()).is_err());
    }

    #[test]
    fn test_unbalanced_open_paren_fails() {
        assert!(parse_query("(foo bar", &Config::default()).is_err());
    }

    #[test]
    fn test_proximity_without_digits_fails() {
        assert!(parse_query("\"a b\"~x", &Config::default()).is_err());
    }

    #[test]
    fn test_empty_input_is_empty_tree() {
        assert!(parse("").is_empty());
        assert!(parse("   ").is_empty());
    }

    #[test]
    fn test_dangling_field_prefix_is_a_word() {
        let t = parse("color: fox");
        assert!(t.optional[0].field.is_none());
        assert_eq!(word(&t.optional[0]), "color:");
    }

    #[test]
    fn test_clause_offsets_increase() {
        let t = parse("alpha +beta gamma");
        assert_eq!(t.optional[0].offset, 0);
        assert_eq!(t.required[0].offset, 6);
        assert_eq!(t.optional[1].offset, 12);
    }
}
