//! Term extraction.
//!
//! Walks the parse tree and emits the ordered, normalized list of terms the
//! matchers are built from: stopwords and operator words removed outside
//! phrases, wildcard forms deduplicated, stems reduced to wildcarded
//! prefixes, everything NFC-normalized.

use crate::config::{Config, Stemmer};
use crate::error::{Error, Result};
use crate::query::parser::{Clause, ClauseValue, OperatorWords, ParseTree};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// A normalized single word or multi-word phrase derived from a user query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// NFC UTF-8, lowercased iff `ignore_case`, no ignorable edge
    /// characters; phrase words are separated by single spaces.
    pub text: String,
    /// Whether the words of this term must appear as a sequence.
    pub is_phrase: bool,
    /// Whether `text` contains the wildcard character.
    pub has_wildcard: bool,
    /// First-occurrence rank in the original query.
    pub order: u32,
    /// Allowed gap between phrase words, from a `~N` suffix.
    pub proximity: Option<u32>,
}

/// Everything needed to turn tree leaves into terms. Built once per compile.
pub(crate) struct TermExtractor<'a> {
    cfg: &'a Config,
    ops: &'a OperatorWords,
    token_re: Regex,
    strip_leading: Option<Regex>,
    strip_trailing: Option<Regex>,
    uri_re: Regex,
}

/// A term before ordering and dedup.
struct RawTerm {
    text: String,
    is_phrase: bool,
    proximity: Option<u32>,
}

impl<'a> TermExtractor<'a> {
    pub(crate) fn new(cfg: &'a Config, ops: &'a OperatorWords) -> Result<Self> {
        let wc = &cfg.word_characters;
        let wildcard = regex::escape(&cfg.wildcard.to_string());
        let token_re = Regex::new(&format!("[{wc}]+{wildcard}?"))?;
        let strip_leading = match cfg.ignore_first_char.as_str() {
            "" => None,
            class => Some(Regex::new(&format!(r"\A[{class}]+"))?),
        };
        let strip_trailing = match cfg.ignore_last_char.as_str() {
            "" => None,
            class => Some(Regex::new(&format!(r"[{class}]+\z"))?),
        };
        let uri_re = Regex::new(&format!(r"[{wc}][@.\\][{wc}]"))?;

        Ok(Self {
            cfg,
            ops,
            token_re,
            strip_leading,
            strip_trailing,
            uri_re,
        })
    }

    /// Extract the ordered term list from a parse tree.
    pub(crate) fn extract(&self, tree: &ParseTree) -> Result<Vec<Term>> {
        let mut leaves = Vec::new();
        collect_leaves(tree, None, &mut leaves);
        leaves.sort_by_key(|(clause, _)| clause.offset);

        let mut raw = Vec::new();
        for (clause, inherited_field) in leaves {
            self.process_leaf(clause, inherited_field, &mut raw);
        }

        self.drop_subsumed(&mut raw)?;

        if let Some(stemmer) = &self.cfg.stemmer {
            for term in &mut raw {
                self.stem_term(term, stemmer)?;
            }
        }

        // Duplicates keep their first position.
        let mut seen = ahash::AHashSet::new();
        let mut terms = Vec::new();
        for t in raw {
            if !seen.insert(t.text.clone()) {
                continue;
            }
            let has_wildcard = t.text.contains(self.cfg.wildcard);
            terms.push(Term {
                text: t.text,
                is_phrase: t.is_phrase,
                has_wildcard,
                order: terms.len() as u32,
                proximity: t.proximity,
            });
        }
        Ok(terms)
    }

    fn process_leaf(&self, clause: &Clause, inherited_field: Option<&str>, out: &mut Vec<RawTerm>) {
        let field = clause.field.as_deref().or(inherited_field);
        if let Some(f) = field {
            if self.cfg.ignore_fields.contains(f) {
                return;
            }
        }

        let (value, quoted) = match &clause.value {
            ClauseValue::Word(w) => (w.as_str(), false),
            ClauseValue::Phrase(p) => (p.as_str(), true),
            ClauseValue::Group(_) => return,
        };

        let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return;
        }
        let normalized: String = if self.cfg.ignore_case {
            collapsed.to_lowercase()
        } else {
            collapsed
        }
        .nfc()
        .collect();

        let phrase_like = quoted
            || normalized.contains(' ')
            || (self.cfg.treat_uris_like_phrases && self.uri_re.is_match(&normalized));

        let words: Vec<String> = self
            .token_re
            .find_iter(&normalized)
            .map(|m| self.strip_edges(m.as_str()))
            .filter(|w| !w.is_empty())
            .collect();

        if phrase_like {
            // Phrases preserve their interior, stopwords included.
            match words.len() {
                0 => {}
                1 => out.push(RawTerm {
                    text: words.into_iter().next().unwrap(),
                    is_phrase: false,
                    proximity: None,
                }),
                _ => out.push(RawTerm {
                    text: words.join(" "),
                    is_phrase: true,
                    proximity: clause.proximity,
                }),
            }
        } else {
            for word in words {
                if self.cfg.stopwords.contains(&word.to_lowercase()) {
                    continue;
                }
                if self.ops.is_operator(&word) {
                    continue;
                }
                out.push(RawTerm {
                    text: word,
                    is_phrase: false,
                    proximity: None,
                });
            }
        }
    }

    fn strip_edges(&self, token: &str) -> String {
        let mut s = token;
        if let Some(re) = &self.strip_leading {
            if let Some(m) = re.find(s) {
                s = &s[m.end()..];
            }
        }
        if let Some(re) = &self.strip_trailing {
            if let Some(m) = re.find(s) {
                s = &s[..m.start()];
            }
        }
        s.to_string()
    }

    /// A wildcard term subsumes every term its pattern fully matches:
    /// `foo*` absorbs both `foo` and `food`.
    fn drop_subsumed(&self, raw: &mut Vec<RawTerm>) -> Result<()> {
        let wildcard = self.cfg.wildcard;
        let mut matchers = Vec::new();
        for t in raw.iter() {
            if !t.is_phrase && t.text.contains(wildcard) {
                matchers.push(self.word_matcher(&t.text)?);
            }
        }
        if matchers.is_empty() {
            return Ok(());
        }
        raw.retain(|t| {
            if t.is_phrase || t.text.contains(wildcard) {
                return true;
            }
            !matchers.iter().any(|re| re.is_match(&t.text))
        });
        Ok(())
    }

    /// Anchored pattern for one word with the wildcard expanded.
    fn word_matcher(&self, word: &str) -> Result<Regex> {
        let mut body = String::new();
        for c in word.chars() {
            if c == self.cfg.wildcard {
                body.push_str(&format!("[{}]*", self.cfg.word_characters));
            } else {
                body.push_str(&regex::escape(&c.to_string()));
            }
        }
        Ok(RegexBuilder::new(&format!(r"\A(?:{body})\z"))
            .case_insensitive(self.cfg.ignore_case)
            .build()?)
    }

    /// Replace each stemmable word with `common_prefix(word, stem)` plus the
    /// wildcard. Words already carrying a wildcard are left alone.
    fn stem_term(&self, term: &mut RawTerm, stemmer: &Stemmer) -> Result<()> {
        let wildcard = self.cfg.wildcard;

        let mut words = Vec::new();
        for word in term.text.split(' ') {
            if word.contains(wildcard) {
                words.push(word.to_string());
                continue;
            }
            let stem = (**stemmer)(word);
            if stem.is_empty() {
                return Err(Error::StemmerFailure {
                    word: word.to_string(),
                });
            }
            if stem == word {
                words.push(word.to_string());
            } else {
                let mut prefixed = common_prefix(word, &stem);
                prefixed.push(wildcard);
                words.push(prefixed);
            }
        }
        term.text = words.join(" ");
        Ok(())
    }
}

/// Depth-first leaf collection over the `+` and neutral buckets, carrying
/// the nearest enclosing field prefix down into groups.
fn collect_leaves<'t>(
    tree: &'t ParseTree,
    field: Option<&'t str>,
    out: &mut Vec<(&'t Clause, Option<&'t str>)>,
) {
    for clause in tree.required.iter().chain(tree.optional.iter()) {
        let clause_field = clause.field.as_deref().or(field);
        match &clause.value {
            ClauseValue::Group(sub) => collect_leaves(sub, clause_field, out),
            _ => out.push((clause, clause_field)),
        }
    }
}

fn common_prefix(a: &str, b: &str) -> String {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse_query;
    use std::sync::Arc;

    fn extract_with(cfg: &Config, query: &str) -> Vec<Term> {
        let tree = parse_query(query, cfg).unwrap();
        let ops = OperatorWords::compile(cfg).unwrap();
        TermExtractor::new(cfg, &ops).unwrap().extract(&tree).unwrap()
    }

    fn texts(terms: &[Term]) -> Vec<&str> {
        terms.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_stopwords_dropped_outside_phrases() {
        let mut cfg = Config::default();
        cfg.stopwords.insert("the".to_string());
        let terms = extract_with(&cfg, "the quick");
        assert_eq!(texts(&terms), vec!["quick"]);
    }

    #[test]
    fn test_stopwords_kept_inside_phrases() {
        let mut cfg = Config::default();
        cfg.stopwords.insert("the".to_string());
        let terms = extract_with(&cfg, "\"over the lazy dog\"");
        assert_eq!(texts(&terms), vec!["over the lazy dog"]);
        assert!(terms[0].is_phrase);
    }

    #[test]
    fn test_excluded_bucket_is_skipped() {
        let terms = extract_with(&Config::default(), "+jumped +ran -quickly");
        assert_eq!(texts(&terms), vec!["jumped", "ran"]);
    }

    #[test]
    fn test_operator_words_never_become_terms() {
        let terms = extract_with(&Config::default(), "+jumped and +ran");
        assert_eq!(texts(&terms), vec!["jumped", "ran"]);
    }

    #[test]
    fn test_wildcard_subsumes_matching_literals() {
        let terms = extract_with(&Config::default(), "foo* food foo bar");
        assert_eq!(texts(&terms), vec!["foo*", "bar"]);
        assert!(terms[0].has_wildcard);
    }

    #[test]
    fn test_lowercased_when_ignore_case() {
        let terms = extract_with(&Config::default(), "QuIcK");
        assert_eq!(texts(&terms), vec!["quick"]);
    }

    #[test]
    fn test_case_preserved_when_sensitive() {
        let mut cfg = Config::default();
        cfg.ignore_case = false;
        let terms = extract_with(&cfg, "QuIcK");
        assert_eq!(texts(&terms), vec!["QuIcK"]);
    }

    #[test]
    fn test_edge_chars_stripped() {
        let terms = extract_with(&Config::default(), "'quoted'");
        assert_eq!(texts(&terms), vec!["quoted"]);
    }

    #[test]
    fn test_ignored_field_discarded() {
        let mut cfg = Config::default();
        cfg.ignore_fields.insert("site".to_string());
        let terms = extract_with(&cfg, "site:example fox");
        assert_eq!(texts(&terms), vec!["fox"]);
    }

    #[test]
    fn test_field_value_kept_when_not_ignored() {
        let terms = extract_with(&Config::default(), "color:brown fox");
        assert_eq!(texts(&terms), vec!["brown", "fox"]);
    }

    #[test]
    fn test_uri_upgraded_to_phrase() {
        let mut cfg = Config::default();
        cfg.treat_uris_like_phrases = true;
        let terms = extract_with(&cfg, "user@example.com");
        assert_eq!(terms.len(), 1);
        assert!(terms[0].is_phrase);
        assert_eq!(terms[0].text, "user example com");
    }

    #[test]
    fn test_quoted_single_word_is_not_phrase() {
        let terms = extract_with(&Config::default(), "\"solo\"");
        assert_eq!(texts(&terms), vec!["solo"]);
        assert!(!terms[0].is_phrase);
    }

    #[test]
    fn test_proximity_carried_on_phrase() {
        let terms = extract_with(&Config::default(), "\"live united\"~5");
        assert_eq!(terms[0].proximity, Some(5));
    }

    #[test]
    fn test_order_is_first_occurrence() {
        let terms = extract_with(&Config::default(), "zebra +apple mango");
        let orders: Vec<u32> = terms.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(texts(&terms), vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let terms = extract_with(&Config::default(), "fox brown fox");
        assert_eq!(texts(&terms), vec!["fox", "brown"]);
    }

    #[test]
    fn test_stemming_produces_wildcard_prefix() {
        let mut cfg = Config::default();
        cfg.stemmer = Some(Arc::new(|w: &str| w.trim_end_matches("ing").to_string()));
        let terms = extract_with(&cfg, "running");
        assert_eq!(texts(&terms), vec!["runn*"]);
        assert!(terms[0].has_wildcard);
    }

    #[test]
    fn test_stemming_noop_when_stem_equal() {
        let mut cfg = Config::default();
        cfg.stemmer = Some(Arc::new(|w: &str| w.to_string()));
        let terms = extract_with(&cfg, "running");
        assert_eq!(texts(&terms), vec!["running"]);
    }

    #[test]
    fn test_stemming_empty_prefix_is_bare_wildcard() {
        let mut cfg = Config::default();
        cfg.stemmer = Some(Arc::new(|_: &str| "zzz".to_string()));
        let terms = extract_with(&cfg, "abc");
        assert_eq!(texts(&terms), vec!["*"]);
    }

    #[test]
    fn test_stemmer_empty_output_fails() {
        let mut cfg = Config::default();
        cfg.stemmer = Some(Arc::new(|_: &str| String::new()));
        let tree = parse_query("abc", &cfg).unwrap();
        let ops = OperatorWords::compile(&cfg).unwrap();
        let result = TermExtractor::new(&cfg, &ops).unwrap().extract(&tree);
        assert!(matches!(result, Err(Error::StemmerFailure { .. })));
    }

    #[test]
    fn test_whitespace_runs_collapse_in_phrases() {
        let terms = extract_with(&Config::default(), "\"brown   fox\"");
        assert_eq!(texts(&terms), vec!["brown fox"]);
    }

    #[test]
    fn test_only_ignorable_chars_discarded() {
        let terms = extract_with(&Config::default(), "''' fox");
        assert_eq!(texts(&terms), vec!["fox"]);
    }
}
