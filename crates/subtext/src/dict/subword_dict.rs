//! # Frozen Subword Dictionary

use compact_str::CompactString;

use crate::alphabet::Alphabet;
use crate::dict::reserved::{EOS_ID, PAD_ID, UNK, UNK_ID};
use crate::dict::segment::greedy_segment;
use crate::errors::{Result, SubtextError};
use crate::escape::{SENTINEL, escape_token, unescape_token};
use crate::types::{WCHashMap, hash_map_with_capacity};

/// The immutable learned artifact: an ordered sequence of unique subtoken
/// symbols, where position defines the 0-based index.
///
/// A dictionary is produced by a learner or loaded from a dictionary file,
/// and is frozen from then on: there are no mutating operations. The reserved
/// prefix (`<ESC>`, `<PAD>_`, `<EOS>_`, `<UNK>_`, plus any custom tokens)
/// occupies the low indices.
///
/// Empty symbols are padding placeholders; they hold an index but are never
/// matched by segmentation.
#[derive(Debug, Clone)]
pub struct SubwordDictionary {
    symbols: Vec<CompactString>,
    indices: WCHashMap<CompactString, usize>,
    alphabet: Alphabet,

    // The longest symbol in chars; bounds the greedy matcher's lookahead.
    max_subtoken_len: usize,
}

impl SubwordDictionary {
    /// Freeze a dictionary from an ordered symbol list.
    ///
    /// The alphabet is derived from the characters of the symbols themselves;
    /// this is the loader path, where the corpus the symbols were learned
    /// from is no longer available.
    ///
    /// ## Arguments
    /// * `symbols` - the ordered symbol list; empty entries are padding.
    ///
    /// ## Returns
    /// The frozen dictionary, or [`SubtextError::EmptyDictionary`].
    pub fn from_symbols<I>(symbols: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<CompactString>,
    {
        let symbols: Vec<CompactString> = symbols.into_iter().map(Into::into).collect();
        let alphabet = Alphabet::from_tokens(&symbols);
        Self::from_symbols_with_alphabet(symbols, alphabet)
    }

    /// Freeze a dictionary from an ordered symbol list and a fixed alphabet.
    ///
    /// This is the builder path: the learner supplies the alphabet it derived
    /// from the full token-count table, which also covers characters of
    /// low-count tokens excluded from subtoken accounting.
    pub fn from_symbols_with_alphabet<I>(
        symbols: I,
        alphabet: Alphabet,
    ) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<CompactString>,
    {
        let symbols: Vec<CompactString> = symbols.into_iter().map(Into::into).collect();
        if symbols.is_empty() {
            return Err(SubtextError::EmptyDictionary);
        }

        let mut indices = hash_map_with_capacity(symbols.len());
        for (index, symbol) in symbols.iter().enumerate() {
            if !symbol.is_empty() {
                indices.insert(symbol.clone(), index);
            }
        }

        let max_subtoken_len = symbols.iter().map(|s| s.chars().count()).max().unwrap_or(0);

        Ok(Self {
            symbols,
            indices,
            alphabet,
            max_subtoken_len,
        })
    }

    /// The number of symbols, padding placeholders included.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if the dictionary is empty; never true once frozen.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterate the symbols in index order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(CompactString::as_str)
    }

    /// The fixed alphabet words are escaped against before segmentation.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The longest symbol length, in characters.
    pub fn max_subtoken_len(&self) -> usize {
        self.max_subtoken_len
    }

    /// The symbol at `index`.
    ///
    /// ## Returns
    /// The symbol, or [`SubtextError::IndexOutOfRange`]; never a default.
    pub fn symbol(
        &self,
        index: usize,
    ) -> Result<&str> {
        self.symbols
            .get(index)
            .map(CompactString::as_str)
            .ok_or(SubtextError::IndexOutOfRange {
                index,
                len: self.symbols.len(),
            })
    }

    /// The index of `symbol`.
    ///
    /// ## Returns
    /// The index, or [`SubtextError::UnknownSymbol`]; never a default.
    pub fn index(
        &self,
        symbol: &str,
    ) -> Result<usize> {
        self.indices
            .get(symbol)
            .copied()
            .ok_or_else(|| SubtextError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }

    /// Check whether `symbol` is in the dictionary.
    pub fn contains(
        &self,
        symbol: &str,
    ) -> bool {
        self.indices.contains_key(symbol)
    }

    /// Decompose a single word into subtoken symbols.
    ///
    /// The word is escaped against the frozen alphabet, then greedily matched
    /// longest-first against the symbol table. A word with a character
    /// outside the alphabet cannot be decomposed and degrades to a single
    /// [`UNK`] symbol; this is a vocabulary-coverage gap, not a failure.
    pub fn subtokens_of_word(
        &self,
        word: &str,
    ) -> Vec<CompactString> {
        let escaped = escape_token(word, Some(&self.alphabet));
        match greedy_segment(&escaped, self.max_subtoken_len, |s| self.contains(s)) {
            Some(subtokens) => subtokens.into_iter().map(CompactString::from).collect(),
            None => {
                log::debug!("no decomposition for {word:?}, emitting {UNK}");
                vec![CompactString::from(UNK)]
            }
        }
    }

    /// The surface forms for an id sequence, stopping at EOS, skipping PAD.
    pub fn surface_tokens(
        &self,
        ids: &[usize],
    ) -> Result<Vec<&str>> {
        let mut surfaces = Vec::with_capacity(ids.len());
        for &id in ids {
            if id == EOS_ID {
                break;
            }
            if id == PAD_ID {
                continue;
            }
            surfaces.push(self.symbol(id)?);
        }
        Ok(surfaces)
    }

    /// Reconstruct text from a subtoken-id sequence.
    ///
    /// Surfaces are concatenated, split on the sentinel, unescaped fragment
    /// by fragment, and joined with single spaces. Empty fragments are
    /// dropped, so decoding normalizes whitespace.
    pub fn decode_string(
        &self,
        ids: &[usize],
    ) -> Result<String> {
        let concatenated: String = self.surface_tokens(ids)?.concat();

        let mut words = Vec::new();
        for fragment in concatenated.split(SENTINEL) {
            if fragment.is_empty() {
                continue;
            }
            let unescaped = unescape_token(fragment);
            if !unescaped.is_empty() {
                words.push(unescaped);
            }
        }

        Ok(words.join(" "))
    }

    /// Map a subtoken-id sequence to word-level positions.
    ///
    /// Walks the sequence, stopping at EOS and skipping PAD. A subtoken that
    /// is exactly the sentinel attaches to the previous word when that word
    /// is already closed (and emits nothing), a subtoken ending in the
    /// sentinel closes the current word and advances the counter, and any
    /// other subtoken is a mid-word continuation that does not advance.
    /// Padding placeholder ids carry no surface and are read as UNK.
    ///
    /// Alignment downstream depends on this positional fidelity.
    pub fn word_positions(
        &self,
        ids: &[usize],
    ) -> Result<Vec<usize>> {
        let mut norm: Vec<usize> = Vec::with_capacity(ids.len());
        for &id in ids {
            let id = if self.symbol(id)?.is_empty() { UNK_ID } else { id };
            norm.push(id);
        }

        let mut positions = Vec::new();
        let mut word = 0;

        for (j, &id) in norm.iter().enumerate() {
            if id == EOS_ID {
                break;
            }
            if id == PAD_ID {
                continue;
            }

            let symbol = self.symbol(id)?;
            if symbol == "_" {
                let closed = j == 0 || self.symbol(norm[j - 1])?.ends_with(SENTINEL);
                if closed {
                    continue;
                }
            }

            positions.push(word);
            if symbol.ends_with(SENTINEL) {
                word += 1;
            }
        }

        Ok(positions)
    }

    /// Consume the dictionary and pad it to a multiple of `padding_factor`
    /// with empty placeholder symbols.
    ///
    /// Placeholders hold indices for downstream tensor-shape alignment but
    /// are never matchable by the tokenizer.
    pub fn padded_to_multiple(
        self,
        padding_factor: usize,
    ) -> Self {
        let Self {
            mut symbols,
            indices,
            alphabet,
            max_subtoken_len,
        } = self;

        if padding_factor > 1 {
            while symbols.len() % padding_factor != 0 {
                symbols.push(CompactString::default());
            }
        }

        Self {
            symbols,
            indices,
            alphabet,
            max_subtoken_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::reserved::{EOS, PAD, RESERVED_TOKENS};

    fn test_dict() -> SubwordDictionary {
        let mut symbols: Vec<String> = RESERVED_TOKENS.iter().map(|t| t.to_string()).collect();
        for s in ["hello_", "world_", "wor", "ld_", "he", "llo_", "_"] {
            symbols.push(s.to_string());
        }
        for c in "abcdefghijklmnopqrstuvwxyz\\;0123456789".chars() {
            symbols.push(c.to_string());
        }
        SubwordDictionary::from_symbols(symbols).unwrap()
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            SubwordDictionary::from_symbols(Vec::<String>::new()),
            Err(SubtextError::EmptyDictionary)
        ));
    }

    #[test]
    fn test_index_and_symbol() {
        let dict = test_dict();

        assert_eq!(dict.symbol(1).unwrap(), PAD);
        assert_eq!(dict.index("hello_").unwrap(), 4);
        assert_eq!(dict.symbol(4).unwrap(), "hello_");

        assert!(matches!(
            dict.index("nope"),
            Err(SubtextError::UnknownSymbol { .. })
        ));
        assert!(matches!(
            dict.symbol(10_000),
            Err(SubtextError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_subtokens_of_word() {
        let dict = test_dict();

        assert_eq!(dict.subtokens_of_word("hello"), vec!["hello_"]);
        assert_eq!(dict.subtokens_of_word("world"), vec!["world_"]);
        // Greedy: "he" beats single chars, "hello" alone is not a symbol, and
        // "world_" is matched whole once the scan reaches it.
        assert_eq!(
            dict.subtokens_of_word("helloworld"),
            vec!["he", "l", "l", "o", "world_"]
        );
    }

    #[test]
    fn test_unknown_char_degrades_to_unk() {
        // Loaded dictionaries can have alphabet characters with no single-char
        // symbol ('Ω' below); such words have no decomposition at all.
        let tiny = SubwordDictionary::from_symbols_with_alphabet(
            vec!["a".to_string()],
            Alphabet::from_tokens(["aΩ"]),
        )
        .unwrap();
        assert_eq!(tiny.subtokens_of_word("Ω"), vec![UNK]);
    }

    #[test]
    fn test_decode_string() {
        let dict = test_dict();

        let ids = vec![
            dict.index("hello_").unwrap(),
            dict.index("wor").unwrap(),
            dict.index("ld_").unwrap(),
        ];
        assert_eq!(dict.decode_string(&ids).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_stops_at_eos_skips_pad() {
        let dict = test_dict();

        let ids = vec![
            dict.index("hello_").unwrap(),
            dict.index(PAD).unwrap(),
            dict.index("world_").unwrap(),
            dict.index(EOS).unwrap(),
            dict.index("he").unwrap(),
        ];
        assert_eq!(dict.decode_string(&ids).unwrap(), "hello world");
    }

    #[test]
    fn test_word_positions() {
        let dict = test_dict();
        let id = |s: &str| dict.index(s).unwrap();

        // "hello world" as [hello_, wor, ld_] -> positions [0, 1, 1].
        let ids = vec![id("hello_"), id("wor"), id("ld_")];
        assert_eq!(dict.word_positions(&ids).unwrap(), vec![0, 1, 1]);

        // PAD is skipped, EOS stops the walk.
        let ids = vec![id("hello_"), id(PAD), id("world_"), id(EOS), id("he")];
        assert_eq!(dict.word_positions(&ids).unwrap(), vec![0, 1]);

        // A bare sentinel closing an open word advances the counter; a bare
        // sentinel after a closed word emits nothing.
        let ids = vec![id("he"), id("_"), id("hello_"), id("_")];
        assert_eq!(dict.word_positions(&ids).unwrap(), vec![0, 0, 1]);

        // A bare sentinel at the start emits nothing.
        let ids = vec![id("_"), id("hello_")];
        assert_eq!(dict.word_positions(&ids).unwrap(), vec![0]);
    }

    #[test]
    fn test_word_positions_padding_symbol_reads_as_unk() {
        let dict = test_dict().padded_to_multiple(8);
        let last = dict.len() - 1;
        assert_eq!(dict.symbol(last).unwrap(), "");

        // The placeholder is read as UNK ("<UNK>_"), which closes a word.
        let ids = vec![last, dict.index("hello_").unwrap()];
        assert_eq!(dict.word_positions(&ids).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_padded_to_multiple() {
        let dict = test_dict();
        let len = dict.len();
        let padded = dict.padded_to_multiple(8);

        assert_eq!(padded.len() % 8, 0);
        assert!(padded.len() >= len);
        assert!(!padded.contains(""));

        // Already-aligned dictionaries are unchanged.
        let len = padded.len();
        assert_eq!(padded.padded_to_multiple(8).len(), len);
    }
}
