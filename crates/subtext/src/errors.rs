//! # Error Types

/// Errors from subtext operations.
#[derive(Debug, thiserror::Error)]
pub enum SubtextError {
    /// The universal reserved tokens are not a prefix of the requested list.
    #[error("reserved tokens must start with the universal prefix; found '{found}' at index {index}")]
    ReservedPrefix {
        /// The offending token.
        found: String,
        /// Its position in the requested list.
        index: usize,
    },

    /// Symbol lookup failed.
    #[error("unknown symbol '{symbol}'")]
    UnknownSymbol {
        /// The symbol that was looked up.
        symbol: String,
    },

    /// Index lookup failed.
    #[error("invalid id {index} for dictionary of size {len}")]
    IndexOutOfRange {
        /// The index that was looked up.
        index: usize,
        /// The dictionary size.
        len: usize,
    },

    /// A dictionary was built or loaded with no symbols.
    #[error("dictionary has no symbols")]
    EmptyDictionary,

    /// Parallel corpus files do not line up.
    #[error("parallel corpus mismatch: {0}")]
    CorpusMismatch(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Parse error (count cache, decode-length artifact, etc.)
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type for subtext operations.
pub type Result<T> = core::result::Result<T, SubtextError>;
