//! # Guaranteed-Encodable Character Set

use crate::escape::ESCAPE_CHARS;
use crate::types::WCHashSet;

/// The character set underlying escaping and fallback behavior.
///
/// An alphabet always contains the escape characters, so escaping any token
/// against it yields a string composed only of alphabet characters. Every
/// character that can appear in a learned subtoken must be in the alphabet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alphabet {
    chars: WCHashSet<char>,
}

impl Alphabet {
    /// Build an alphabet from the characters of the given tokens.
    ///
    /// The fixed escape characters are always included.
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut chars: WCHashSet<char> = ESCAPE_CHARS.chars().collect();
        for token in tokens {
            chars.extend(token.as_ref().chars());
        }
        Self { chars }
    }

    /// Check whether a character is in the alphabet.
    pub fn contains(
        &self,
        c: char,
    ) -> bool {
        self.chars.contains(&c)
    }

    /// The number of characters in the alphabet.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Check if the alphabet is empty; never true for constructed alphabets.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The alphabet characters in code-point order.
    ///
    /// Hash-set iteration order is not stable; callers that seed symbol
    /// tables from the alphabet use this to stay deterministic.
    pub fn sorted_chars(&self) -> Vec<char> {
        let mut chars: Vec<char> = self.chars.iter().copied().collect();
        chars.sort_unstable();
        chars
    }
}
