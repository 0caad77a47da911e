//! # Subword Vocabulary Construction for `subtext`
//!
//! The build-time half of the engine: it turns raw parallel corpora into a
//! frozen [`subtext::SubwordDictionary`] and encoded training data.
//!
//! Control flow: [`token_counter`] collects word frequencies (with a
//! resumable on-disk cache), [`size_search`] runs [`learner`] candidates in
//! parallel until a dictionary lands within 1% of the target vocabulary
//! size, and [`corpus_encoder`] applies the persisted dictionary to the
//! corpora while collecting decode-length statistics.
#![warn(missing_docs, unused)]

pub mod corpus;
pub mod corpus_encoder;
pub mod learner;
pub mod size_search;
pub mod token_counter;

pub use corpus_encoder::{CorpusEncoder, CorpusEncoderOptions, DirectionOutcome};
pub use learner::{SubwordLearner, SubwordLearnerOptions};
pub use size_search::{SizeSearch, SizeSearchOptions};
pub use token_counter::{TokenCounter, TokenCounts};
