//! # Subword Learner
//!
//! Iterative greedy-merge construction of a subtoken vocabulary from a
//! token-count table. Each iteration re-segments every token with the current
//! symbol table and counts every substring that starts on a segment boundary;
//! adjacent small subtokens thereby vote larger subtokens into the next
//! table.

use compact_str::CompactString;

use subtext::Alphabet;
use subtext::dict::reserved::RESERVED_TOKENS;
use subtext::dict::{SubwordDictionary, greedy_segment};
use subtext::errors::Result;
use subtext::escape::escape_token;
use subtext::types::{CountType, WCHashMap, WCHashSet, hash_map_with_capacity};

use crate::token_counter::TokenCounts;

/// Options for [`SubwordLearner`].
#[derive(Debug, Clone)]
pub struct SubwordLearnerOptions<C: CountType = u64> {
    /// Discard candidate subtokens with aggregated counts below this.
    pub min_count: C,

    /// How many refinement iterations to run.
    pub num_iterations: usize,

    /// Tokens below this count are used for alphabet generation only and are
    /// excluded from subtoken-frequency accounting; useful for very large
    /// corpora.
    pub count_threshold: Option<C>,

    /// The dictionary's reserved prefix. Must start with the universal
    /// [`RESERVED_TOKENS`] prefix.
    pub reserved_tokens: Vec<String>,
}

impl<C: CountType> Default for SubwordLearnerOptions<C> {
    fn default() -> Self {
        Self {
            min_count: C::one(),
            num_iterations: 2,
            count_threshold: None,
            reserved_tokens: RESERVED_TOKENS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl<C: CountType> SubwordLearnerOptions<C> {
    /// Sets the minimum candidate count; values below 1 are clamped to 1.
    pub fn with_min_count(
        self,
        min_count: C,
    ) -> Self {
        Self { min_count, ..self }
    }

    /// Sets the number of refinement iterations.
    pub fn with_num_iterations(
        self,
        num_iterations: usize,
    ) -> Self {
        Self {
            num_iterations,
            ..self
        }
    }

    /// Sets the alphabet-only count threshold.
    pub fn with_count_threshold(
        self,
        count_threshold: Option<C>,
    ) -> Self {
        Self {
            count_threshold,
            ..self
        }
    }

    /// Sets the reserved-token list.
    pub fn with_reserved_tokens(
        self,
        reserved_tokens: Vec<String>,
    ) -> Self {
        Self {
            reserved_tokens,
            ..self
        }
    }

    /// Initializes a [`SubwordLearner`] from these options.
    ///
    /// ## Returns
    /// The learner, or a validation error when the reserved list does not
    /// start with the universal prefix.
    pub fn init(self) -> Result<SubwordLearner<C>> {
        SubwordLearner::new(self)
    }
}

// The in-progress symbol table; rebuilt every iteration, frozen at the end.
struct SymbolTable {
    symbols: Vec<CompactString>,
    lookup: WCHashSet<CompactString>,
    max_len: usize,
}

impl SymbolTable {
    fn from_symbols(symbols: Vec<CompactString>) -> Self {
        let lookup: WCHashSet<CompactString> =
            symbols.iter().filter(|s| !s.is_empty()).cloned().collect();
        let max_len = symbols.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        Self {
            symbols,
            lookup,
            max_len,
        }
    }

    fn contains(
        &self,
        symbol: &str,
    ) -> bool {
        self.lookup.contains(symbol)
    }
}

/// Learns a subtoken vocabulary from token counts.
///
/// Learning is a pure function of `(token counts, options)`: identical inputs
/// always yield an identical dictionary.
pub struct SubwordLearner<C: CountType = u64> {
    /// Learner options.
    pub options: SubwordLearnerOptions<C>,
}

impl<C: CountType> SubwordLearner<C> {
    /// Initializes a [`SubwordLearner`], validating the reserved prefix
    /// before any learning begins.
    pub fn new(options: SubwordLearnerOptions<C>) -> Result<Self> {
        subtext::dict::reserved::validate_reserved_prefix(&options.reserved_tokens)?;
        Ok(Self { options })
    }

    /// Learn a dictionary from a token-count table.
    pub fn learn(
        &self,
        token_counts: &TokenCounts<C>,
    ) -> Result<SubwordDictionary> {
        let options = &self.options;
        let min_count = options.min_count.max(C::one());
        let reserved: Vec<CompactString> = options
            .reserved_tokens
            .iter()
            .map(CompactString::from)
            .collect();

        // The alphabet must include reserved-token characters, or encoding
        // can fail on them later.
        let alphabet = Alphabet::from_tokens(
            token_counts
                .keys()
                .map(CompactString::as_str)
                .chain(options.reserved_tokens.iter().map(String::as_str)),
        );

        // Bootstrap with the single characters plus the reserved tokens.
        let mut bootstrap: Vec<CompactString> = alphabet
            .sorted_chars()
            .into_iter()
            .map(|c| CompactString::from(c.to_string()))
            .collect();
        bootstrap.extend(reserved.iter().cloned());
        let mut table = SymbolTable::from_symbols(bootstrap);

        for iteration in 0..options.num_iterations {
            let subtoken_counts = self.count_boundary_substrings(token_counts, &alphabet, &table);
            let accepted = accept_candidates(subtoken_counts, min_count, &alphabet);

            let mut symbols: Vec<CompactString> = reserved.clone();
            symbols.extend(accepted);
            table = SymbolTable::from_symbols(symbols);

            log::info!(
                "iteration {} END, vocab_size = {}",
                iteration + 1,
                table.symbols.len()
            );
        }

        SubwordDictionary::from_symbols_with_alphabet(table.symbols, alphabet)
    }

    // Segment every counted token with the current table and accumulate the
    // token's count under every substring that starts on a segment boundary.
    fn count_boundary_substrings(
        &self,
        token_counts: &TokenCounts<C>,
        alphabet: &Alphabet,
        table: &SymbolTable,
    ) -> WCHashMap<CompactString, C> {
        let mut subtoken_counts: WCHashMap<CompactString, C> =
            hash_map_with_capacity(token_counts.len());

        for (token, &count) in token_counts {
            if let Some(threshold) = self.options.count_threshold {
                if count < threshold {
                    continue;
                }
            }

            let escaped = escape_token(token, Some(alphabet));
            let subtokens = greedy_segment(&escaped, table.max_len, |s| table.contains(s))
                .expect("escaped tokens are always segmentable against the alphabet");

            let mut bounds: Vec<usize> = escaped.char_indices().map(|(i, _)| i).collect();
            bounds.push(escaped.len());
            let token_len = bounds.len() - 1;

            let mut start = 0;
            for subtoken in subtokens {
                for end in start + 1..=token_len {
                    let candidate = &escaped[bounds[start]..bounds[end]];
                    *subtoken_counts
                        .entry(CompactString::from(candidate))
                        .or_default() += count;
                }
                start += subtoken.chars().count();
            }
        }

        subtoken_counts
    }
}

// Accept candidates longest-to-shortest, subtracting each accepted count from
// its proper prefixes so overlapping substrings are not double counted.
// Alphabet characters are always kept regardless of count.
fn accept_candidates<C: CountType>(
    mut subtoken_counts: WCHashMap<CompactString, C>,
    min_count: C,
    alphabet: &Alphabet,
) -> Vec<CompactString> {
    // Candidate strings grouped by length in chars.
    let mut by_length: Vec<Vec<CompactString>> = Vec::new();
    for (subtoken, &count) in &subtoken_counts {
        if count >= min_count {
            let len = subtoken.chars().count();
            while by_length.len() <= len {
                by_length.push(Vec::new());
            }
            by_length[len].push(subtoken.clone());
        }
    }

    let mut accepted: Vec<(C, CompactString)> = Vec::new();
    for len in (1..by_length.len()).rev() {
        for subtoken in &by_length[len] {
            // Counts shrink as longer candidates are accepted; re-check.
            let count = subtoken_counts
                .get(subtoken)
                .copied()
                .unwrap_or_else(C::zero);
            if count < min_count {
                continue;
            }

            let is_alphabet_char =
                len == 1 && alphabet.contains(subtoken.chars().next().expect("len == 1"));
            if !is_alphabet_char {
                accepted.push((count, subtoken.clone()));
            }

            let bounds: Vec<usize> = subtoken.char_indices().map(|(i, _)| i).collect();
            for prefix_len in 1..len {
                let prefix = &subtoken[..bounds[prefix_len]];
                if let Some(entry) = subtoken_counts.get_mut(prefix) {
                    *entry = if *entry > count {
                        *entry - count
                    } else {
                        C::zero()
                    };
                }
            }
        }
    }

    // Alphabet characters are included explicitly to guarantee that every
    // string stays encodable.
    accepted.extend(alphabet.sorted_chars().into_iter().map(|c| {
        let s = CompactString::from(c.to_string());
        let count = subtoken_counts.get(&s).copied().unwrap_or_else(C::zero);
        (count, s)
    }));

    // Count descending; ties break lexicographically so that identical
    // inputs always produce identical symbol order.
    accepted.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    accepted.into_iter().map(|(_, subtoken)| subtoken).collect()
}
