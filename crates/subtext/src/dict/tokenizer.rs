//! # Cached Tokenize Context

use std::num::NonZeroUsize;
use std::sync::Arc;

use compact_str::CompactString;
use lru::LruCache;

use crate::dict::subword_dict::SubwordDictionary;

/// Default bound for the per-context word cache.
pub const TOKENIZE_CACHE_SIZE: usize = 1 << 20;

/// A tokenize context over a shared frozen dictionary.
///
/// Word decomposition is memoized in a bounded LRU cache keyed by the raw
/// word. Contexts are cheap to construct and are not shared between workers;
/// each worker owns its own cache over the same `Arc`'d dictionary, which
/// preserves the "load the dictionary once per worker" property without any
/// global state.
pub struct SubwordTokenizer {
    dict: Arc<SubwordDictionary>,
    cache: LruCache<CompactString, Vec<CompactString>>,
}

impl SubwordTokenizer {
    /// Create a context with the default cache bound.
    pub fn new(dict: Arc<SubwordDictionary>) -> Self {
        Self::with_cache_size(dict, TOKENIZE_CACHE_SIZE)
    }

    /// Create a context with a custom cache bound.
    pub fn with_cache_size(
        dict: Arc<SubwordDictionary>,
        cache_size: usize,
    ) -> Self {
        let cache_size = NonZeroUsize::new(cache_size.max(1)).expect("cache size is nonzero");
        Self {
            dict,
            cache: LruCache::new(cache_size),
        }
    }

    /// The shared dictionary.
    pub fn dictionary(&self) -> &Arc<SubwordDictionary> {
        &self.dict
    }

    /// Tokenize whitespace-pre-tokenized text into subtoken symbols.
    ///
    /// Repeated calls with identical input yield identical output.
    pub fn tokenize(
        &mut self,
        text: &str,
    ) -> Vec<CompactString> {
        let mut subtokens = Vec::new();
        for word in text.split_whitespace() {
            if let Some(hit) = self.cache.get(word) {
                subtokens.extend(hit.iter().cloned());
                continue;
            }
            let decomposed = self.dict.subtokens_of_word(word);
            subtokens.extend(decomposed.iter().cloned());
            self.cache.put(CompactString::from(word), decomposed);
        }
        subtokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::reserved::RESERVED_TOKENS;

    fn test_dict() -> Arc<SubwordDictionary> {
        let mut symbols: Vec<String> = RESERVED_TOKENS.iter().map(|t| t.to_string()).collect();
        for s in ["hello_", "world_"] {
            symbols.push(s.to_string());
        }
        for c in "abcdefghijklmnopqrstuvwxyz\\;0123456789".chars() {
            symbols.push(c.to_string());
        }
        symbols.push("_".to_string());
        Arc::new(SubwordDictionary::from_symbols(symbols).unwrap())
    }

    #[test]
    fn test_tokenize() {
        let mut tokenizer = SubwordTokenizer::new(test_dict());

        assert_eq!(tokenizer.tokenize("hello world"), vec!["hello_", "world_"]);
        // Whitespace is normalized away by splitting.
        assert_eq!(
            tokenizer.tokenize("  hello\tworld "),
            vec!["hello_", "world_"]
        );
        assert!(tokenizer.tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_deterministic_through_cache() {
        let mut tokenizer = SubwordTokenizer::with_cache_size(test_dict(), 2);

        let first = tokenizer.tokenize("hello world hello");
        // "hello" is now cached; the second call must agree with the first.
        let second = tokenizer.tokenize("hello world hello");
        assert_eq!(first, second);

        // Evict "hello" by touching other words, then re-tokenize.
        tokenizer.tokenize("ab cd ef");
        assert_eq!(tokenizer.tokenize("hello world hello"), first);
    }

    #[test]
    fn test_decode_of_tokenize_round_trip() {
        let dict = test_dict();
        let mut tokenizer = SubwordTokenizer::new(dict.clone());

        for text in ["hello world", "hello hello hello", "ab 12"] {
            let subtokens = tokenizer.tokenize(text);
            let ids: Vec<usize> = subtokens
                .iter()
                .map(|s| dict.index(s).unwrap())
                .collect();
            assert_eq!(dict.decode_string(&ids).unwrap(), text);
        }
    }
}
