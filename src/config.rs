//! Library configuration.
//!
//! A [`Config`] is built once, validated, and then shared read-only by every
//! query compiled against it. Locale-derived defaults are captured at
//! construction; the process locale is never touched afterwards.

use crate::error::{Error, Result};
use ahash::AHashSet;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// A user-supplied stemming function.
///
/// Must be deterministic, must not panic, and must return a non-empty string
/// for any non-empty input. The compiler wraps its output with common-prefix
/// extraction rather than using the stem verbatim.
pub type Stemmer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Immutable configuration for query compilation and snippet extraction.
#[derive(Clone)]
pub struct Config {
    /// Locale string the defaults were derived from, e.g. `en_US.UTF-8`.
    pub locale: String,
    /// Two-letter language code parsed from `locale`.
    pub lang: String,
    /// Source encoding label; inputs are transcoded from this to UTF-8.
    pub charset: String,
    /// Lowercased words ignored outside phrases.
    pub stopwords: AHashSet<String>,
    /// Character standing for zero or more word characters at a word's end.
    pub wildcard: char,
    /// Regex class body defining what belongs inside a term.
    pub word_characters: String,
    /// Class body of characters stripped from the front of a term.
    pub ignore_first_char: String,
    /// Class body of characters stripped from the back of a term.
    pub ignore_last_char: String,
    /// Pattern recognized as the AND operator (whole word, case-insensitive).
    pub and_word: String,
    /// Pattern recognized as the OR operator.
    pub or_word: String,
    /// Pattern recognized as the NOT operator.
    pub not_word: String,
    /// Quote character grouping a phrase.
    pub phrase_delim: char,
    /// Lowercase queries and match case-insensitively.
    pub ignore_case: bool,
    /// Field names whose values are discarded during term extraction.
    pub ignore_fields: AHashSet<String>,
    /// Upgrade bare terms containing `@` or `.` between word characters to phrases.
    pub treat_uris_like_phrases: bool,
    /// Optional stemming function applied to every term word.
    pub stemmer: Option<Stemmer>,
    /// Pattern matching one HTML tag.
    pub tag_re: String,
    /// Pattern matching one whitespace unit, including HTML-entity forms.
    pub whitespace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_locale("en_US.UTF-8")
    }
}

impl Config {
    /// Build a configuration with defaults derived from the given locale.
    ///
    /// `lang` is the part before the first `_` or `.`; `charset` is the part
    /// after the first `.` (falling back to UTF-8).
    pub fn from_locale(locale: &str) -> Self {
        let lang = locale
            .split(['_', '.'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("en")
            .to_ascii_lowercase();
        let charset = locale
            .split_once('.')
            .map(|(_, cs)| cs.to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "UTF-8".to_string());

        Self {
            locale: locale.to_string(),
            lang,
            charset,
            stopwords: AHashSet::new(),
            wildcard: '*',
            word_characters: r"\w'\-".to_string(),
            ignore_first_char: r"'\-".to_string(),
            ignore_last_char: r"'\-".to_string(),
            and_word: "and".to_string(),
            or_word: "or".to_string(),
            not_word: "not".to_string(),
            phrase_delim: '"',
            ignore_case: true,
            ignore_fields: AHashSet::new(),
            treat_uris_like_phrases: false,
            stemmer: None,
            tag_re: "<[^>]+>".to_string(),
            whitespace: r"\s|\x{A0}|&nbsp;|&#0*32;|&#0*160;|&#x0*20;|&#x0*[Aa]0;".to_string(),
        }
    }

    /// Check every option for internal consistency.
    ///
    /// Called by [`crate::Query::compile`]; callers constructing a `Config`
    /// by hand can also invoke it directly to fail fast.
    pub fn validate(&self) -> Result<()> {
        if self.word_characters.is_empty() {
            return Err(Error::InvalidConfig {
                field: "word_characters",
                message: "must not be empty".to_string(),
            });
        }
        let word_class = compile_class("word_characters", &self.word_characters)?;

        if self.wildcard.is_whitespace() {
            return Err(Error::InvalidConfig {
                field: "wildcard",
                message: "must not be a whitespace character".to_string(),
            });
        }
        if self.wildcard == self.phrase_delim {
            return Err(Error::InvalidConfig {
                field: "wildcard",
                message: "must differ from phrase_delim".to_string(),
            });
        }
        if word_class.is_match(&self.wildcard.to_string()) {
            return Err(Error::InvalidConfig {
                field: "wildcard",
                message: "must not be a word character".to_string(),
            });
        }

        if !self.ignore_first_char.is_empty() {
            compile_class("ignore_first_char", &self.ignore_first_char)?;
        }
        if !self.ignore_last_char.is_empty() {
            compile_class("ignore_last_char", &self.ignore_last_char)?;
        }

        compile_pattern("tag_re", &self.tag_re)?;
        compile_pattern("whitespace", &self.whitespace)?;
        compile_pattern("and_word", &self.and_word)?;
        compile_pattern("or_word", &self.or_word)?;
        compile_pattern("not_word", &self.not_word)?;

        if encoding_rs::Encoding::for_label(self.charset.as_bytes()).is_none() {
            return Err(Error::InvalidConfig {
                field: "charset",
                message: format!("unknown encoding label `{}`", self.charset),
            });
        }

        Ok(())
    }
}

fn compile_class(field: &'static str, body: &str) -> Result<Regex> {
    Regex::new(&format!("[{body}]")).map_err(|e| Error::InvalidConfig {
        field,
        message: format!("not a valid character class: {e}"),
    })
}

fn compile_pattern(field: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidConfig {
        field,
        message: format!("not a valid pattern: {e}"),
    })
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("locale", &self.locale)
            .field("lang", &self.lang)
            .field("charset", &self.charset)
            .field("stopwords", &self.stopwords)
            .field("wildcard", &self.wildcard)
            .field("word_characters", &self.word_characters)
            .field("ignore_first_char", &self.ignore_first_char)
            .field("ignore_last_char", &self.ignore_last_char)
            .field("and_word", &self.and_word)
            .field("or_word", &self.or_word)
            .field("not_word", &self.not_word)
            .field("phrase_delim", &self.phrase_delim)
            .field("ignore_case", &self.ignore_case)
            .field("ignore_fields", &self.ignore_fields)
            .field("treat_uris_like_phrases", &self.treat_uris_like_phrases)
            .field("stemmer", &self.stemmer.as_ref().map(|_| "<fn>"))
            .field("tag_re", &self.tag_re)
            .field("whitespace", &self.whitespace)
            .finish()
    }
}
