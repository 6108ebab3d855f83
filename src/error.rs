//! Error types for query compilation and token access.

/// Errors surfaced during configuration validation and query compilation.
///
/// Match and snippet operations on a successfully compiled [`crate::Query`]
/// never fail; they degrade to empty results instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Boolean parser could not consume the input.
    #[error("invalid query at byte {offset}: {message}")]
    InvalidQuery { offset: usize, message: String },

    /// A configuration option has an unusable value.
    #[error("invalid config option `{field}`: {message}")]
    InvalidConfig { field: &'static str, message: String },

    /// Transcoding from the declared charset failed irrecoverably.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A token index fell outside the token list.
    #[error("token index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    /// The user-supplied stemmer returned an empty stem.
    #[error("stemmer returned an empty stem for `{word}`")]
    StemmerFailure { word: String },

    /// A synthesized pattern failed to compile.
    #[error("pattern compilation failed: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
