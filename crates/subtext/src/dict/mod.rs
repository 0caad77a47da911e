//! # Subword Dictionary
//!
//! The learned artifact of vocabulary construction: an ordered, indexed
//! subtoken list with a cached greedy tokenizer and an exact detokenizer.
//!
//! See:
//! * [`SubwordDictionary`] - the frozen symbol table.
//! * [`SubwordTokenizer`] - a per-worker tokenize context with a bounded cache.
//! * [`io`] - the quoted-line dictionary file format.

pub mod io;
pub mod reserved;
mod segment;
mod subword_dict;
mod tokenizer;

pub use segment::greedy_segment;
pub use subword_dict::SubwordDictionary;
pub use tokenizer::{SubwordTokenizer, TOKENIZE_CACHE_SIZE};
