//! # Vocabulary Size Search
//!
//! Finds the minimum candidate count whose learned dictionary lands within
//! 1% of a target vocabulary size: a doubling phase brackets the threshold
//! with waves of parallel learner runs, a bisection phase closes in on it,
//! and a final padding phase aligns the size for downstream tensor shapes.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use subtext::dict::SubwordDictionary;
use subtext::dict::reserved::reserved_with_custom;
use subtext::errors::Result;

use crate::learner::SubwordLearnerOptions;
use crate::token_counter::{TokenCounts, collect_or_load_token_counts};

/// First min-count guess of the doubling phase.
pub const INITIAL_MIN_COUNT: u64 = 16_000;

// Refinement iterations for bracketing probes and bisection probes.
const WAVE_ITERATIONS: usize = 2;
const BISECT_ITERATIONS: usize = 4;

/// Options for [`SizeSearch`].
#[derive(Debug, Clone)]
pub struct SizeSearchOptions {
    /// The vocabulary size to approximate.
    pub target_size: usize,

    /// Parallel learner candidates per search wave.
    pub threads: usize,

    /// Custom reserved tokens (language tags, placeholders) appended after
    /// the universal prefix.
    pub custom_tokens: Vec<String>,

    /// Pad the final size to a multiple of this.
    pub padding_factor: usize,

    /// Alphabet-only count threshold passed through to the learner.
    pub count_threshold: Option<u64>,
}

impl SizeSearchOptions {
    /// Create options for a target size with the default settings.
    pub fn new(target_size: usize) -> Self {
        Self {
            target_size,
            threads: 2,
            custom_tokens: Vec::new(),
            padding_factor: 8,
            count_threshold: None,
        }
    }

    /// Sets the number of parallel candidates per wave.
    pub fn with_threads(
        self,
        threads: usize,
    ) -> Self {
        Self { threads, ..self }
    }

    /// Sets the custom reserved tokens.
    pub fn with_custom_tokens(
        self,
        custom_tokens: Vec<String>,
    ) -> Self {
        Self {
            custom_tokens,
            ..self
        }
    }

    /// Sets the padding factor.
    pub fn with_padding_factor(
        self,
        padding_factor: usize,
    ) -> Self {
        Self {
            padding_factor,
            ..self
        }
    }

    /// Sets the alphabet-only count threshold.
    pub fn with_count_threshold(
        self,
        count_threshold: Option<u64>,
    ) -> Self {
        Self {
            count_threshold,
            ..self
        }
    }

    /// Initializes a [`SizeSearch`] from these options.
    pub fn init(self) -> SizeSearch {
        SizeSearch::new(self)
    }
}

/// Searches for the dictionary closest to a target vocabulary size.
pub struct SizeSearch {
    /// Search options.
    pub options: SizeSearchOptions,
}

impl SizeSearch {
    /// Create a search from options.
    pub fn new(options: SizeSearchOptions) -> Self {
        Self { options }
    }

    /// Build a dictionary from corpus files, caching token counts in the
    /// working directory so an interrupted build resumes without recounting.
    pub fn build(
        &self,
        files: &[PathBuf],
        work_dir: &Path,
    ) -> Result<SubwordDictionary> {
        let token_counts = collect_or_load_token_counts(files, work_dir)?;
        self.search(&token_counts)
    }

    /// Run the full search against a token-count table.
    pub fn search(
        &self,
        token_counts: &TokenCounts,
    ) -> Result<SubwordDictionary> {
        let reserved = reserved_with_custom(&self.options.custom_tokens);

        // Phase A: bracket the min count with doubling waves.
        let mut guess = INITIAL_MIN_COUNT;
        let bracket = loop {
            match self.run_wave(guess, token_counts, &reserved)? {
                Some(bracket) => break bracket,
                None => {
                    guess <<= self.options.threads.max(1);
                }
            }
        };

        let lo = if bracket == INITIAL_MIN_COUNT {
            1
        } else {
            bracket / 2
        };

        // Phase B: bisect inside the bracket.
        log::info!("generating vocabulary: min = {lo}, max = {bracket}");
        let dict = self.bisect(token_counts, &reserved, lo, bracket)?;

        // Phase C: pad to the required multiple.
        Ok(dict.padded_to_multiple(self.options.padding_factor))
    }

    fn learner_options(
        &self,
        min_count: u64,
        num_iterations: usize,
        reserved: &[String],
    ) -> SubwordLearnerOptions {
        SubwordLearnerOptions::default()
            .with_min_count(min_count)
            .with_num_iterations(num_iterations)
            .with_count_threshold(self.options.count_threshold)
            .with_reserved_tokens(reserved.to_vec())
    }

    // Runs one synchronous wave of learner candidates at `guess * 2^i`.
    //
    // Returns the first (smallest) candidate whose dictionary is not larger
    // than the target, or `None` when every candidate overshoots.
    fn run_wave(
        &self,
        guess: u64,
        token_counts: &TokenCounts,
        reserved: &[String],
    ) -> Result<Option<u64>> {
        let candidates: Vec<u64> = (0..self.options.threads.max(1))
            .map(|i| guess << i)
            .collect();

        log::info!("vocabulary bracket wave with candidates = {candidates:?}");

        let results: Vec<(u64, usize)> = candidates
            .par_iter()
            .map(|&min_count| {
                let dict = self
                    .learner_options(min_count, WAVE_ITERATIONS, reserved)
                    .init()?
                    .learn(token_counts)?;
                Ok((min_count, dict.len()))
            })
            .collect::<Result<_>>()?;

        for &(min_count, size) in &results {
            if size <= self.options.target_size {
                return Ok(Some(min_count));
            }
        }

        let &(last_min_count, last_size) = results.last().expect("wave has candidates");
        log::info!(
            "bracket wave failed with last_min_count = {last_min_count}, last_size = {last_size}"
        );
        Ok(None)
    }

    // Recursive bisection; the interval shrinks every step, so recursion
    // depth is logarithmic in the bracket.
    fn bisect(
        &self,
        token_counts: &TokenCounts,
        reserved: &[String],
        lo: u64,
        hi: u64,
    ) -> Result<SubwordDictionary> {
        let target = self.options.target_size;
        let mid = (lo + hi) / 2;

        log::info!("trying min_count {mid}");
        let dict = self
            .learner_options(mid, BISECT_ITERATIONS, reserved)
            .init()?
            .learn(token_counts)?;

        // Being within 1% of the target size is ok; and when lo meets hi or
        // the midpoint bottoms out, we can't do any better than this.
        let is_ok = dict.len().abs_diff(target) * 100 < target;
        if is_ok || lo >= hi || mid < 2 {
            return Ok(dict);
        }

        let other = if dict.len() > target {
            self.bisect(token_counts, reserved, mid + 1, hi)?
        } else {
            self.bisect(token_counts, reserved, lo, mid - 1)?
        };

        if other.len().abs_diff(target) < dict.len().abs_diff(target) {
            Ok(other)
        } else {
            Ok(dict)
        }
    }
}
