//! Transcoding from the configured source charset to UTF-8.

use crate::error::{Error, Result};
use encoding_rs::Encoding;
use std::borrow::Cow;

/// Decode `bytes` from `charset` into UTF-8.
///
/// Invalid sequences are replaced with U+FFFD; the returned flag is `true`
/// when any replacement happened so callers can record the diagnostic.
/// Fails only when the charset label itself is unknown.
pub fn decode<'a>(bytes: &'a [u8], charset: &str) -> Result<(Cow<'a, str>, bool)> {
    let encoding = Encoding::for_label(charset.as_bytes())
        .ok_or_else(|| Error::Encoding(format!("unknown encoding label `{charset}`")))?;
    let (text, _, had_errors) = encoding.decode(bytes);
    Ok((text, had_errors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        let (text, lossy) = decode("naïve".as_bytes(), "UTF-8").unwrap();
        assert_eq!(text, "naïve");
        assert!(!lossy);
    }

    #[test]
    fn test_latin1_transcodes() {
        // "café" in ISO-8859-1
        let bytes = [0x63, 0x61, 0x66, 0xE9];
        let (text, lossy) = decode(&bytes, "ISO-8859-1").unwrap();
        assert_eq!(text, "café");
        assert!(!lossy);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let bytes = [b'a', 0xFF, b'b'];
        let (text, lossy) = decode(&bytes, "UTF-8").unwrap();
        assert!(lossy);
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_unknown_label_fails() {
        assert!(decode(b"x", "no-such-charset").is_err());
    }
}
