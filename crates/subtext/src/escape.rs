//! # Reversible Token Escaping
//!
//! Escaping rewrites an arbitrary token so that it can be expressed as a
//! concatenation of dictionary subtokens. The trailing `_` sentinel marks the
//! token boundary, which is what makes concatenated subtoken lists invertible.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::alphabet::Alphabet;

/// The token-boundary sentinel appended by [`escape_token`].
pub const SENTINEL: char = '_';

/// Characters every alphabet must contain for escaping to be closed.
pub const ESCAPE_CHARS: &str = "\\_u;0123456789";

/// Substitute for numeric escapes that do not name a valid code point.
pub const INVALID_CHAR: char = '\u{3013}';

static UNESCAPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\u|\\\\|\\([0-9]+);").expect("unescape pattern must compile"));

/// Escape away underscores and out-of-alphabet characters and append `_`.
///
/// `\` becomes `\\` and `_` becomes `\u`. When an alphabet is supplied, every
/// character outside it (and `\n`, always) is rewritten as `\<codepoint>;`.
///
/// ## Arguments
/// * `token` - the raw token.
/// * `alphabet` - the guaranteed-encodable character set, if any.
///
/// ## Returns
/// The escaped token, always ending in the sentinel.
pub fn escape_token(
    token: &str,
    alphabet: Option<&Alphabet>,
) -> String {
    let mut escaped = String::with_capacity(token.len() + 1);

    for c in token.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            SENTINEL => escaped.push_str("\\u"),
            c => match alphabet {
                Some(alphabet) if !alphabet.contains(c) || c == '\n' => {
                    escaped.push('\\');
                    escaped.push_str(&(c as u32).to_string());
                    escaped.push(';');
                }
                _ => escaped.push(c),
            },
        }
    }

    escaped.push(SENTINEL);
    escaped
}

/// Inverse of [`escape_token`].
///
/// A single trailing sentinel is trimmed if present; `\u`, `\\` and
/// `\<digits>;` sequences are rewritten back. A numeric escape that does not
/// name a valid code point degrades to [`INVALID_CHAR`] rather than failing.
pub fn unescape_token(escaped: &str) -> String {
    let trimmed = escaped.strip_suffix(SENTINEL).unwrap_or(escaped);

    UNESCAPE_REGEX
        .replace_all(trimmed, |caps: &Captures<'_>| match caps.get(1) {
            None => {
                if &caps[0] == "\\u" {
                    String::from(SENTINEL)
                } else {
                    String::from('\\')
                }
            }
            Some(digits) => digits
                .as_str()
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(INVALID_CHAR)
                .to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain() {
        assert_eq!(escape_token("abc", None), "abc_");
        assert_eq!(escape_token("", None), "_");
    }

    #[test]
    fn test_escape_specials() {
        assert_eq!(escape_token("under_score", None), "under\\uscore_");
        assert_eq!(escape_token("back\\slash", None), "back\\\\slash_");
    }

    #[test]
    fn test_escape_against_alphabet() {
        let alphabet = Alphabet::from_tokens(["abc"]);

        assert_eq!(escape_token("abc", Some(&alphabet)), "abc_");
        // 'd' (100) is outside the alphabet.
        assert_eq!(escape_token("abd", Some(&alphabet)), "ab\\100;_");
        // newline is always escaped, even though the escape digits are in
        // every alphabet.
        assert_eq!(escape_token("a\nb", Some(&alphabet)), "a\\10;b_");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_token("abc_"), "abc");
        assert_eq!(unescape_token("under\\uscore_"), "under_score");
        assert_eq!(unescape_token("back\\\\slash_"), "back\\slash");
        assert_eq!(unescape_token("ab\\100;_"), "abd");
        // Missing sentinel is tolerated.
        assert_eq!(unescape_token("abc"), "abc");
    }

    #[test]
    fn test_unescape_invalid_codepoint() {
        // Lone surrogate.
        assert_eq!(unescape_token("\\55296;_"), INVALID_CHAR.to_string());
        // Larger than any code point.
        assert_eq!(unescape_token("\\99999999999;_"), INVALID_CHAR.to_string());
    }

    #[test]
    fn test_round_trip_with_alphabet() {
        let alphabet = Alphabet::from_tokens(["héllo", "wörld", "a_b"]);

        for token in ["héllo", "wörld", "a_b", "h_ö", "", "42;"] {
            let escaped = escape_token(token, Some(&alphabet));
            assert_eq!(unescape_token(&escaped), token, "token {token:?}");
        }
    }

    #[test]
    fn test_round_trip_not_stable_across_alphabets() {
        // The same token escaped against two different alphabet snapshots
        // yields different escaped forms; only the escape/unescape pair for a
        // single snapshot round-trips.
        let wide = Alphabet::from_tokens(["touché"]);
        let narrow = Alphabet::from_tokens(["touch"]);

        let escaped_wide = escape_token("touché", Some(&wide));
        let escaped_narrow = escape_token("touché", Some(&narrow));

        assert_ne!(escaped_wide, escaped_narrow);
        assert_eq!(unescape_token(&escaped_wide), "touché");
        assert_eq!(unescape_token(&escaped_narrow), "touché");
    }
}
