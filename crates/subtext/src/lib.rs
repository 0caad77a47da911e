//! # `subtext` Subword Vocabulary Runtime
//!
//! The runtime half of a subword vocabulary engine for machine translation
//! pipelines: reversible character escaping, the frozen [`dict::SubwordDictionary`]
//! with its cached greedy tokenizer and exact detokenizer, sequence-ratio
//! statistics, and the on-disk dictionary and decode-length formats.
//!
//! Vocabulary construction (token counting, the greedy-merge learner, and the
//! target-size search) lives in the companion `subtext-training` crate.
//!
//! See:
//! * [`escape`] for the reversible escaping scheme and its sentinel.
//! * [`alphabet`] for the guaranteed-encodable character set.
//! * [`dict`] for the frozen dictionary, tokenize contexts, and file IO.
//! * [`stats`] for length-ratio aggregation and the decode-length artifact.
//!
//! ## Crate Features
//!
//! #### feature: ``ahash``
//!
//! This swaps all HashMap/HashSet implementations for ``ahash``; which is a
//! performance win on many/(most?) modern CPUs.
//!
//! This is done by the ``types::WCHash{*}`` type alias machinery.
#![warn(missing_docs, unused)]

pub mod alphabet;
pub mod dict;
pub mod errors;
pub mod escape;
pub mod stats;
pub mod types;

pub use alphabet::Alphabet;
pub use dict::{SubwordDictionary, SubwordTokenizer};
pub use errors::{Result, SubtextError};
