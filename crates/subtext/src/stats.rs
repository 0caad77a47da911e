//! # Sequence Statistics
//!
//! Streaming aggregation of token-length ratios, and the decode-length
//! artifact derived from them. At inference time the modal ratio and its
//! standard deviation bound generation length for a language direction.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SubtextError};
use crate::types::WCHashMap;

/// File name of the persisted decode-length artifact.
pub const DECODE_LENGTHS_FILE: &str = "decode_lengths.json";

/// A streaming aggregator over a sequence of ratio observations.
///
/// Holds the running sum, sum of squares, count, and a histogram of values
/// truncated to one decimal. The count must be > 0 before any derived
/// statistic is read.
#[derive(Debug, Clone, Default)]
pub struct SequenceStats {
    sum: f64,
    sum2: f64,
    count: u64,

    // Histogram keys are the observation scaled by 10 and truncated.
    histogram: WCHashMap<i64, u64>,
}

impl SequenceStats {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation.
    pub fn add(
        &mut self,
        value: f64,
    ) {
        self.sum += value;
        self.sum2 += value * value;
        self.count += 1;

        let bucket = (value * 10.0) as i64;
        *self.histogram.entry(bucket).or_default() += 1;
    }

    /// The number of observations.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// Check if no observations were recorded.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The arithmetic mean.
    pub fn mean(&self) -> f64 {
        assert!(self.count > 0, "no observations recorded");
        self.sum / self.count as f64
    }

    /// The population standard deviation.
    pub fn std_dev(&self) -> f64 {
        let mean = self.mean();
        ((self.sum2 / self.count as f64) - mean * mean).max(0.0).sqrt()
    }

    /// The most frequent one-decimal bucket.
    ///
    /// Ties break toward the smaller bucket, keeping repeated runs over the
    /// same corpus deterministic.
    pub fn modal_value(&self) -> f64 {
        assert!(self.count > 0, "no observations recorded");
        let (&bucket, _) = self
            .histogram
            .iter()
            .max_by_key(|&(&bucket, &count)| (count, core::cmp::Reverse(bucket)))
            .expect("histogram is non-empty");
        bucket as f64 / 10.0
    }
}

/// The decode-length heuristic artifact.
///
/// Maps a `"<src>__<tgt>"` direction to its `(modal_ratio, std_dev)` pair of
/// target/source token-length ratios, one entry per direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeLengths {
    lengths: BTreeMap<String, (f64, f64)>,
}

impl DecodeLengths {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// The direction key for a language pair.
    pub fn direction_key(
        src_lang: &str,
        tgt_lang: &str,
    ) -> String {
        format!("{src_lang}__{tgt_lang}")
    }

    /// Record the statistics for a direction.
    pub fn insert(
        &mut self,
        src_lang: &str,
        tgt_lang: &str,
        stats: &SequenceStats,
    ) {
        self.lengths.insert(
            Self::direction_key(src_lang, tgt_lang),
            (stats.modal_value(), stats.std_dev()),
        );
    }

    /// Look up the `(modal_ratio, std_dev)` pair for a direction.
    pub fn get(
        &self,
        src_lang: &str,
        tgt_lang: &str,
    ) -> Option<(f64, f64)> {
        self.lengths
            .get(&Self::direction_key(src_lang, tgt_lang))
            .copied()
    }

    /// The number of recorded directions.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Check if no direction was recorded.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Persist the mapping alongside encoded corpora.
    pub fn save_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| SubtextError::Parse(e.to_string()))
    }

    /// Load a previously persisted mapping.
    pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| SubtextError::Parse(e.to_string()))
    }
}
