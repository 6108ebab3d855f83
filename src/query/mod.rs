//! Query compilation: parse → extract terms → synthesize matchers.

pub mod parser;
pub mod pattern;
pub mod terms;

pub use parser::{parse_query, Clause, ClauseValue, ParseTree};
pub use pattern::RegexPair;
pub use terms::Term;

use crate::config::Config;
use crate::error::Result;
use crate::query::parser::OperatorWords;
use crate::query::terms::TermExtractor;
use crate::text::bounds::Bounds;
use crate::text::decode::decode;
use ahash::AHashMap;
use regex::Regex;

/// Per-term matcher used by the token list.
#[derive(Debug)]
pub(crate) enum TermMatcher {
    /// Single word: the plain pattern applied to an isolated token.
    Word { plain: Regex },
    /// Phrase: one anchored pattern per word, consecutive words within
    /// `max_gap` positions.
    Phrase { words: Vec<Regex>, max_gap: usize },
}

/// A compiled, immutable query.
///
/// Holds the ordered terms, a regex pair per term, the original input, and
/// the parse tree for introspection. Freely shareable across threads.
#[derive(Debug)]
pub struct Query {
    terms: Vec<Term>,
    pairs: AHashMap<String, RegexPair>,
    matchers: Vec<TermMatcher>,
    token_re: Regex,
    original: String,
    tree: ParseTree,
    lossy_decode: bool,
}

impl Query {
    /// Compile a query string against a configuration.
    pub fn compile(input: &str, cfg: &Config) -> Result<Self> {
        Self::compile_inner(input, cfg, false)
    }

    /// Compile raw bytes, transcoding from the configured charset first.
    pub fn compile_bytes(bytes: &[u8], cfg: &Config) -> Result<Self> {
        let (text, lossy) = decode(bytes, &cfg.charset)?;
        Self::compile_inner(&text, cfg, lossy)
    }

    fn compile_inner(input: &str, cfg: &Config, lossy_decode: bool) -> Result<Self> {
        cfg.validate()?;

        let tree = parse_query(input, cfg)?;
        let ops = OperatorWords::compile(cfg)?;
        let terms = TermExtractor::new(cfg, &ops)?.extract(&tree)?;

        let bounds = Bounds::from_config(cfg);
        let mut pairs = AHashMap::with_capacity(terms.len());
        let mut matchers = Vec::with_capacity(terms.len());

        for term in &terms {
            let pair = pattern::build_pair(&term.text, &bounds, cfg)?;
            let matcher = if term.is_phrase {
                let words = term
                    .text
                    .split(' ')
                    .map(|w| pattern::anchored_word(w, &bounds, cfg))
                    .collect::<Result<Vec<_>>>()?;
                TermMatcher::Phrase {
                    words,
                    max_gap: term.proximity.map(|n| n.max(1) as usize).unwrap_or(1),
                }
            } else {
                TermMatcher::Word {
                    plain: pair.plain.clone(),
                }
            };
            pairs.insert(term.text.clone(), pair);
            matchers.push(matcher);
        }

        let token_re = Regex::new(&format!("[{}]+", cfg.word_characters))?;

        Ok(Self {
            terms,
            pairs,
            matchers,
            token_re,
            original: input.to_string(),
            tree,
            lossy_decode,
        })
    }

    /// Terms in first-occurrence order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// The matcher pair for a term emitted by this query.
    pub fn regex_for(&self, term: &str) -> Option<&RegexPair> {
        self.pairs.get(term)
    }

    /// The query string as given.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The parse tree, for introspection.
    pub fn tree(&self) -> &ParseTree {
        &self.tree
    }

    /// Whether no terms survived extraction.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether transcoding the input replaced invalid sequences.
    pub fn had_decode_errors(&self) -> bool {
        self.lossy_decode
    }

    /// Whether any term's plain pattern matches `text`.
    pub fn matches_plain(&self, text: &str) -> bool {
        self.terms
            .iter()
            .any(|t| self.pairs[&t.text].plain.is_match(text))
    }

    /// Whether any term's HTML-aware pattern matches `text`.
    pub fn matches_html(&self, text: &str) -> bool {
        self.terms
            .iter()
            .any(|t| self.pairs[&t.text].html.is_match(text))
    }

    pub(crate) fn token_re(&self) -> &Regex {
        &self.token_re
    }

    pub(crate) fn matchers(&self) -> &[TermMatcher] {
        &self.matchers
    }
}
