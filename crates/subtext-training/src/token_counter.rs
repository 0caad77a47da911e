//! # Token Counter
//!
//! Parallel word-frequency collection over a corpus, with a resumable
//! on-disk cache.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use rayon::prelude::*;

use subtext::errors::{Result, SubtextError};
use subtext::types::{CountType, WCHashMap, hash_map_with_capacity};

/// File name of the token-count cache inside a working directory.
pub const TOKEN_COUNTS_FILE: &str = "token_counts.dict";

/// A word -> occurrence-count table.
pub type TokenCounts<C = u64> = WCHashMap<CompactString, C>;

/// Accumulates word counts from whitespace-pre-tokenized text.
///
/// # Parameters
/// * `C` - the type used to store counts.
pub struct TokenCounter<C: CountType = u64> {
    counts: TokenCounts<C>,
}

impl<C: CountType> Default for TokenCounter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CountType> TokenCounter<C> {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self {
            counts: hash_map_with_capacity(100_000),
        }
    }

    /// Update counts inplace from a line of text.
    pub fn update_from_text<S: AsRef<str>>(
        &mut self,
        text: S,
    ) {
        for word in text.as_ref().split_whitespace() {
            *self.counts.entry(word.into()).or_default() += C::one();
        }
    }

    /// Update counts inplace from a sample iterator.
    pub fn update_from_samples<I>(
        &mut self,
        samples: I,
    ) where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for sample in samples {
            self.update_from_text(sample);
        }
    }

    /// Update counts inplace from a file.
    pub fn update_from_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            self.update_from_text(line?);
        }
        Ok(())
    }

    /// Release the counts and return them.
    pub fn release(self) -> TokenCounts<C> {
        self.counts
    }
}

/// Merge `other` into `counts` by addition.
///
/// Addition is commutative, so repeated merges yield the same table
/// regardless of worker scheduling or file order.
pub fn merge_counts<C: CountType>(
    counts: &mut TokenCounts<C>,
    other: TokenCounts<C>,
) {
    for (word, count) in other {
        *counts.entry(word).or_default() += count;
    }
}

/// Collect merged token counts over a set of files, one worker per file.
pub fn collect_token_counts<C: CountType>(files: &[PathBuf]) -> Result<TokenCounts<C>> {
    log::info!("collecting token counts over {} files", files.len());

    let per_file: Vec<TokenCounts<C>> = files
        .par_iter()
        .map(|path| {
            let mut counter = TokenCounter::new();
            counter.update_from_file(path)?;
            Ok(counter.release())
        })
        .collect::<Result<_>>()?;

    let mut counts = TokenCounts::default();
    for file_counts in per_file {
        merge_counts(&mut counts, file_counts);
    }

    log::info!("collected counts for {} distinct tokens", counts.len());
    Ok(counts)
}

/// Collect token counts, reusing the working directory's cache when present.
///
/// An existing cache file is trusted without any freshness check against the
/// current corpus; a stale working directory must be cleared by the caller.
/// No locking is performed, so concurrent builds sharing one working
/// directory are unsupported.
pub fn collect_or_load_token_counts<C: CountType>(
    files: &[PathBuf],
    work_dir: &Path,
) -> Result<TokenCounts<C>> {
    let cache_path = work_dir.join(TOKEN_COUNTS_FILE);

    if cache_path.is_file() {
        log::info!("reusing token-count cache {}", cache_path.display());
        return load_token_counts(&cache_path);
    }

    let counts = collect_token_counts(files)?;
    save_token_counts(&counts, &cache_path)?;
    Ok(counts)
}

/// Load a token-count cache file; lines of the form `<count> <token>`.
pub fn load_token_counts<C, P>(path: P) -> Result<TokenCounts<C>>
where
    C: CountType,
    P: AsRef<Path>,
{
    let reader = BufReader::new(File::open(path)?);
    read_token_counts(reader)
}

/// Read a token-count table from a [`BufRead`] stream.
pub fn read_token_counts<C, R>(reader: R) -> Result<TokenCounts<C>>
where
    C: CountType,
    R: BufRead,
{
    let mut counts = TokenCounts::default();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (count, token) = line
            .split_once(' ')
            .ok_or_else(|| SubtextError::Parse(format!("malformed count line: {line:?}")))?;
        let count = count
            .parse::<u64>()
            .ok()
            .and_then(C::from_u64)
            .ok_or_else(|| SubtextError::Parse(format!("malformed count in line: {line:?}")))?;

        counts.insert(token.into(), count);
    }

    Ok(counts)
}

/// Save a token-count table to a cache file.
pub fn save_token_counts<C, P>(
    counts: &TokenCounts<C>,
    path: P,
) -> Result<()>
where
    C: CountType,
    P: AsRef<Path>,
{
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write_token_counts(counts, &mut writer)
}

/// Write a token-count table to a [`Write`] writer.
pub fn write_token_counts<C, W>(
    counts: &TokenCounts<C>,
    writer: &mut W,
) -> Result<()>
where
    C: CountType,
    W: Write,
{
    for (token, count) in counts {
        writeln!(writer, "{} {}", count.to_u64().unwrap_or(0), token)?;
    }
    writer.flush()?;
    Ok(())
}
