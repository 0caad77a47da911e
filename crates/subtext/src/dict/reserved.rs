//! # Reserved Tokens
//!
//! Fixed low-index symbols required to occupy a stable prefix of every
//! dictionary. Downstream components address PAD/EOS/UNK by these indices.

use crate::errors::{Result, SubtextError};
use crate::escape::escape_token;

/// Escape-marker placeholder holding index 0.
pub const ESC: &str = "<ESC>";

/// Padding symbol.
pub const PAD: &str = "<PAD>_";

/// End-of-sentence symbol.
pub const EOS: &str = "<EOS>_";

/// Unknown-word fallback symbol.
pub const UNK: &str = "<UNK>_";

/// The universal reserved prefix every dictionary starts with.
pub const RESERVED_TOKENS: [&str; 4] = [ESC, PAD, EOS, UNK];

/// Index of [`PAD`].
pub const PAD_ID: usize = 1;

/// Index of [`EOS`].
pub const EOS_ID: usize = 2;

/// Index of [`UNK`].
pub const UNK_ID: usize = 3;

/// The raw (unescaped) language tag for multilingual corpora.
pub fn language_tag(lang: &str) -> String {
    format!("[[{lang}]]")
}

/// The raw (unescaped) "do-not-translate" placeholder with the given slot.
pub fn dnt_placeholder(slot: usize) -> String {
    format!("${{DNT{slot}}}")
}

/// Assemble a full reserved-token list from custom tokens.
///
/// Custom tokens are escaped (without an alphabet) so that they are valid
/// dictionary symbols, then appended after the universal prefix.
pub fn reserved_with_custom<I>(custom_tokens: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut reserved: Vec<String> = RESERVED_TOKENS.iter().map(|t| t.to_string()).collect();
    reserved.extend(
        custom_tokens
            .into_iter()
            .map(|t| escape_token(t.as_ref(), None)),
    );
    reserved
}

/// Validate that [`RESERVED_TOKENS`] is a literal prefix of `reserved`.
///
/// There is not complete freedom in replacing the universal prefix; the
/// stable PAD/EOS/UNK indices depend on it.
pub fn validate_reserved_prefix<S: AsRef<str>>(reserved: &[S]) -> Result<()> {
    for (index, default) in RESERVED_TOKENS.iter().enumerate() {
        let found = reserved.get(index).map(AsRef::as_ref).unwrap_or("");
        if found != *default {
            return Err(SubtextError::ReservedPrefix {
                found: found.to_string(),
                index,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_indices() {
        assert_eq!(RESERVED_TOKENS[PAD_ID], PAD);
        assert_eq!(RESERVED_TOKENS[EOS_ID], EOS);
        assert_eq!(RESERVED_TOKENS[UNK_ID], UNK);
    }

    #[test]
    fn test_language_tag() {
        assert_eq!(language_tag("en"), "[[en]]");
        assert_eq!(dnt_placeholder(3), "${DNT3}");
    }

    #[test]
    fn test_reserved_with_custom() {
        let reserved = reserved_with_custom(["[[it]]", "${DNT0}"]);
        assert_eq!(&reserved[..4], &RESERVED_TOKENS.map(String::from));
        // Custom tokens are escaped and sentinel-terminated.
        assert_eq!(reserved[4], "[[it]]_");
        assert_eq!(reserved[5], "${DNT0}_");
    }

    #[test]
    fn test_validate_reserved_prefix() {
        let good = reserved_with_custom(["[[de]]"]);
        assert!(validate_reserved_prefix(&good).is_ok());

        let short = vec![ESC.to_string(), PAD.to_string()];
        assert!(matches!(
            validate_reserved_prefix(&short),
            Err(crate::errors::SubtextError::ReservedPrefix { index: 2, .. })
        ));

        let reordered = vec![
            PAD.to_string(),
            ESC.to_string(),
            EOS.to_string(),
            UNK.to_string(),
        ];
        assert!(validate_reserved_prefix(&reordered).is_err());
    }
}
