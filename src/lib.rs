//! # textsnip - query-aware match and snippet engine
//!
//! textsnip compiles a user-written Boolean search query into matchers that
//! locate terms inside arbitrary source text (including text with inline
//! HTML markup) and extracts contextually relevant snippets around the
//! matches. It sits between a search index, which says *which* documents
//! matched, and a presentation layer, which highlights matches and shows
//! excerpts to a reader.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`config`] - Recognized options, locale capture, validation
//! - [`query`] - Boolean parsing, term extraction, regex synthesis
//! - [`text`] - Boundary tables, entity lookup, transcoding, token lists
//! - [`snippet`] - Window selection and snippet rendering
//! - [`error`] - Typed errors
//!
//! ## Quick Start
//!
//! ```
//! use textsnip::{Config, Query, Snipper};
//!
//! let mut cfg = Config::default();
//! cfg.stopwords.insert("the".to_string());
//!
//! let query = Query::compile("+quick \"lazy dog\"", &cfg).unwrap();
//! assert_eq!(query.terms().len(), 2);
//!
//! // Locate terms in markup without being fooled by tags:
//! let pair = query.regex_for("lazy dog").unwrap();
//! assert!(pair.html.is_match("a <b>lazy</b> dog"));
//!
//! // Pull an excerpt around the matches:
//! let text = "The quick brown fox jumped over the lazy dog at dawn.";
//! let snippet = Snipper::new(&query).snip(text);
//! assert!(snippet.contains("quick"));
//! ```
//!
//! ## Matching model
//!
//! Every term gets two compiled patterns: a *plain* regex for raw text and
//! an *HTML-aware* regex that tolerates tags and character entities between
//! the matched characters. Phrases match as token sequences, optionally with
//! a proximity gap (`"live united"~5`). A compiled [`Query`] is immutable
//! and shareable across threads; token lists borrow the source buffer and
//! never copy it.

pub mod config;
pub mod error;
pub mod query;
pub mod snippet;
pub mod text;

pub use config::{Config, Stemmer};
pub use error::{Error, Result};
pub use query::{parse_query, ParseTree, Query, RegexPair, Term};
pub use snippet::{Snipper, SnippetOptions, ELLIPSIS};
pub use text::{Token, TokenList};
