//! # Parallel Corpus Encoder
//!
//! Applies a frozen dictionary to parallel corpora in fixed-size batches
//! over a worker pool, collecting the length-ratio statistics the decoder
//! later uses to bound generation length.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use compact_str::CompactString;
use rayon::prelude::*;

use subtext::dict::reserved::language_tag;
use subtext::dict::{SubwordDictionary, SubwordTokenizer};
use subtext::errors::{Result, SubtextError};
use subtext::escape::{SENTINEL, escape_token};
use subtext::stats::SequenceStats;
use subtext::types::WCHashSet;

use crate::corpus::LangPair;

/// Factor symbol for a subtoken that closes a word.
pub const FACTOR_WORD_END: &str = "W";

/// Factor symbol for a mid-word continuation subtoken.
pub const FACTOR_CONTINUATION: &str = "C";

/// Options for [`CorpusEncoder`].
#[derive(Debug, Clone)]
pub struct CorpusEncoderOptions {
    /// The directed language pairs being produced; decides multilingual
    /// tagging and bidirectional duplication.
    pub langs: Vec<LangPair>,

    /// Emit a factor stream aligned with the source output.
    pub with_factors: bool,

    /// Lines per worker batch; `None` selects `worker threads x 100`.
    pub batch_size: Option<usize>,
}

impl CorpusEncoderOptions {
    /// Create options for a directed language-pair list.
    pub fn new(langs: Vec<LangPair>) -> Self {
        Self {
            langs,
            with_factors: false,
            batch_size: None,
        }
    }

    /// Sets factor-stream generation.
    pub fn with_factors(
        self,
        with_factors: bool,
    ) -> Self {
        Self {
            with_factors,
            ..self
        }
    }

    /// Sets the batch size.
    pub fn with_batch_size(
        self,
        batch_size: Option<usize>,
    ) -> Self {
        Self { batch_size, ..self }
    }

    /// Initializes a [`CorpusEncoder`] over a frozen dictionary.
    pub fn init(
        self,
        dict: Arc<SubwordDictionary>,
    ) -> CorpusEncoder {
        CorpusEncoder::new(dict, self)
    }
}

/// Per-direction encode results.
#[derive(Debug, Default)]
pub struct DirectionOutcome {
    /// Forward (target-length / source-length) ratio statistics.
    pub forward: SequenceStats,

    /// Backward (source-length / target-length) ratio statistics.
    pub backward: SequenceStats,

    /// Pairs written to the outputs.
    pub written: u64,

    /// Pairs dropped because one side tokenized to an empty sequence.
    /// Dropping is a data-loss policy, not an error.
    pub dropped: u64,
}

// What a worker hands back for one line pair.
struct EncodedPair {
    src_text: String,
    tgt_text: String,
    src_len: usize,
    tgt_len: usize,
    src_factors: Option<String>,
    tgt_factors: Option<String>,
}

/// Applies a frozen dictionary to parallel corpora.
///
/// Every worker owns a [`SubwordTokenizer`] context constructed once per
/// worker, so the dictionary is shared but the caches are not.
pub struct CorpusEncoder {
    dict: Arc<SubwordDictionary>,

    /// Encoder options.
    pub options: CorpusEncoderOptions,

    target_langs: WCHashSet<String>,
}

impl CorpusEncoder {
    /// Create an encoder over a frozen dictionary.
    pub fn new(
        dict: Arc<SubwordDictionary>,
        options: CorpusEncoderOptions,
    ) -> Self {
        let target_langs: WCHashSet<String> =
            options.langs.iter().map(|(_, tgt)| tgt.clone()).collect();
        Self {
            dict,
            options,
            target_langs,
        }
    }

    fn batch_size(&self) -> usize {
        self.options
            .batch_size
            .unwrap_or_else(|| rayon::current_num_threads().max(1) * 100)
    }

    fn is_bidirectional(
        &self,
        src_lang: &str,
        tgt_lang: &str,
    ) -> bool {
        let fwd = (src_lang.to_string(), tgt_lang.to_string());
        let bwd = (tgt_lang.to_string(), src_lang.to_string());
        self.options.langs.contains(&fwd) && self.options.langs.contains(&bwd)
    }

    // The "[[lang]]_ " prefix, present only for multilingual target sets.
    fn tag_prefix(
        &self,
        lang: &str,
    ) -> Option<String> {
        if self.target_langs.len() > 1 {
            Some(format!("{} ", escape_token(&language_tag(lang), None)))
        } else {
            None
        }
    }

    /// Encode the aligned file lists of one direction.
    ///
    /// Output order matches input order; batches preserve per-item ordering
    /// and batches are written in sequence. A pair whose either side
    /// tokenizes to an empty sequence is dropped from all outputs, silently,
    /// and surfaces only in the outcome counters.
    pub fn encode_files(
        &self,
        src_lang: &str,
        tgt_lang: &str,
        in_src_files: &[PathBuf],
        in_tgt_files: &[PathBuf],
        out_src: &mut dyn Write,
        out_tgt: &mut dyn Write,
        out_factor: Option<&mut dyn Write>,
    ) -> Result<DirectionOutcome> {
        if in_src_files.len() != in_tgt_files.len() {
            return Err(SubtextError::CorpusMismatch(format!(
                "{} source files vs {} target files",
                in_src_files.len(),
                in_tgt_files.len()
            )));
        }

        let src_prefix = self.tag_prefix(tgt_lang);
        let tgt_prefix = self.tag_prefix(src_lang);
        let bidirectional = self.is_bidirectional(src_lang, tgt_lang);
        let with_factors = self.options.with_factors;
        let batch_size = self.batch_size();

        // The factor stream exists only when factor generation is enabled.
        let mut out_factor = if with_factors { out_factor } else { None };

        let mut outcome = DirectionOutcome::default();

        for (src_path, tgt_path) in in_src_files.iter().zip(in_tgt_files) {
            log::info!(
                "encoding {} / {}",
                src_path.display(),
                tgt_path.display()
            );

            let mut src_lines = BufReader::new(File::open(src_path)?).lines();
            let mut tgt_lines = BufReader::new(File::open(tgt_path)?).lines();

            loop {
                let mut batch: Vec<(String, String)> = Vec::with_capacity(batch_size);
                for (src_line, tgt_line) in
                    src_lines.by_ref().zip(tgt_lines.by_ref()).take(batch_size)
                {
                    batch.push((src_line?, tgt_line?));
                }
                if batch.is_empty() {
                    break;
                }

                let encoded: Vec<Option<EncodedPair>> = batch
                    .par_iter()
                    .map_init(
                        || SubwordTokenizer::new(self.dict.clone()),
                        |tokenizer, (src_line, tgt_line)| {
                            encode_pair(
                                tokenizer,
                                src_line,
                                tgt_line,
                                with_factors,
                                with_factors && bidirectional,
                            )
                        },
                    )
                    .collect();

                for pair in encoded {
                    let Some(pair) = pair else {
                        outcome.dropped += 1;
                        continue;
                    };

                    outcome
                        .forward
                        .add(pair.tgt_len as f64 / pair.src_len as f64);
                    outcome
                        .backward
                        .add(pair.src_len as f64 / pair.tgt_len as f64);
                    outcome.written += 1;

                    write_side(out_src, &src_prefix, &pair.src_text)?;
                    writeln!(out_tgt, "{}", pair.tgt_text)?;
                    if let Some(writer) = out_factor.as_mut() {
                        let factors = pair.src_factors.as_deref().unwrap_or_default();
                        write_factor_side(&mut **writer, &src_prefix, factors)?;
                    }

                    if bidirectional {
                        write_side(out_src, &tgt_prefix, &pair.tgt_text)?;
                        writeln!(out_tgt, "{}", pair.src_text)?;
                        if let Some(writer) = out_factor.as_mut() {
                            let factors = pair.tgt_factors.as_deref().unwrap_or_default();
                            write_factor_side(&mut **writer, &tgt_prefix, factors)?;
                        }
                        outcome.written += 1;
                    }
                }
            }
        }

        Ok(outcome)
    }
}

fn encode_pair(
    tokenizer: &mut SubwordTokenizer,
    src_line: &str,
    tgt_line: &str,
    src_factors: bool,
    tgt_factors: bool,
) -> Option<EncodedPair> {
    let src_tokens = tokenizer.tokenize(src_line);
    let tgt_tokens = tokenizer.tokenize(tgt_line);

    if src_tokens.is_empty() || tgt_tokens.is_empty() {
        return None;
    }

    Some(EncodedPair {
        src_text: src_tokens.join(" "),
        tgt_text: tgt_tokens.join(" "),
        src_len: src_tokens.len(),
        tgt_len: tgt_tokens.len(),
        src_factors: src_factors.then(|| factor_line(&src_tokens)),
        tgt_factors: tgt_factors.then(|| factor_line(&tgt_tokens)),
    })
}

// One factor symbol per source subtoken, by subword position.
fn factor_line(tokens: &[CompactString]) -> String {
    let factors: Vec<&str> = tokens
        .iter()
        .map(|token| {
            if token.ends_with(SENTINEL) {
                FACTOR_WORD_END
            } else {
                FACTOR_CONTINUATION
            }
        })
        .collect();
    factors.join(" ")
}

fn write_side(
    writer: &mut dyn Write,
    prefix: &Option<String>,
    text: &str,
) -> Result<()> {
    if let Some(prefix) = prefix {
        writer.write_all(prefix.as_bytes())?;
    }
    writeln!(writer, "{text}")?;
    Ok(())
}

// Prepended language tags carry the word-end marker.
fn write_factor_side(
    writer: &mut dyn Write,
    prefix: &Option<String>,
    factors: &str,
) -> Result<()> {
    if prefix.is_some() {
        writer.write_all(FACTOR_WORD_END.as_bytes())?;
        writer.write_all(b" ")?;
    }
    writeln!(writer, "{factors}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::parse_lang_pairs;
    use crate::learner::SubwordLearnerOptions;
    use crate::token_counter::TokenCounter;
    use std::fs;

    fn train_dict(samples: &[&str]) -> Arc<SubwordDictionary> {
        let mut counter: TokenCounter<u64> = TokenCounter::new();
        counter.update_from_samples(samples);

        let dict = SubwordLearnerOptions::default()
            .with_min_count(1)
            .init()
            .unwrap()
            .learn(&counter.release())
            .unwrap();
        Arc::new(dict)
    }

    fn encode_to_strings(
        encoder: &CorpusEncoder,
        src_lang: &str,
        tgt_lang: &str,
        src_data: &str,
        tgt_data: &str,
    ) -> (String, String, String, DirectionOutcome) {
        let dir = tempdir::TempDir::new("encoder_test").unwrap();
        let src_path = dir.path().join(format!("corpus.{src_lang}"));
        let tgt_path = dir.path().join(format!("corpus.{tgt_lang}"));
        fs::write(&src_path, src_data).unwrap();
        fs::write(&tgt_path, tgt_data).unwrap();

        let mut out_src = Vec::new();
        let mut out_tgt = Vec::new();
        let mut out_factor = Vec::new();

        let outcome = encoder
            .encode_files(
                src_lang,
                tgt_lang,
                &[src_path],
                &[tgt_path],
                &mut out_src,
                &mut out_tgt,
                Some(&mut out_factor as &mut dyn Write),
            )
            .unwrap();

        (
            String::from_utf8(out_src).unwrap(),
            String::from_utf8(out_tgt).unwrap(),
            String::from_utf8(out_factor).unwrap(),
            outcome,
        )
    }

    #[test]
    fn test_encode_preserves_line_order() {
        let dict = train_dict(&["hello world", "ciao mondo"]);
        let langs = parse_lang_pairs("en:it").unwrap();
        let encoder = CorpusEncoderOptions::new(langs)
            .with_batch_size(Some(1))
            .init(dict);

        let (src, tgt, _, outcome) = encode_to_strings(
            &encoder,
            "en",
            "it",
            "hello world\nworld hello\nhello\n",
            "ciao mondo\nmondo ciao\nciao\n",
        );

        let src_lines: Vec<&str> = src.lines().collect();
        assert_eq!(src_lines.len(), 3);
        assert_eq!(src_lines[0], "hello_ world_");
        assert_eq!(src_lines[1], "world_ hello_");
        assert_eq!(src_lines[2], "hello_");
        assert_eq!(tgt.lines().count(), 3);
        assert_eq!(outcome.written, 3);
        assert_eq!(outcome.dropped, 0);

        // Single target language: no tag prefixes.
        assert!(!src.contains("[["));
    }

    #[test]
    fn test_empty_pair_dropped_everywhere() {
        let dict = train_dict(&["hello world", "ciao mondo"]);
        let langs = parse_lang_pairs("en:it").unwrap();
        let encoder = CorpusEncoderOptions::new(langs).with_factors(true).init(dict);

        let (src, tgt, factor, outcome) = encode_to_strings(
            &encoder,
            "en",
            "it",
            "hello\n\nworld\n",
            "ciao\nmondo\nmondo\n",
        );

        assert_eq!(outcome.written, 2);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(src.lines().count(), 2);
        assert_eq!(tgt.lines().count(), 2);
        assert_eq!(factor.lines().count(), 2);
    }

    #[test]
    fn test_multilingual_tags_and_bidirectional() {
        let dict = train_dict(&["hello world", "ciao mondo", "hallo welt"]);
        let langs = parse_lang_pairs("en:it,it:en,en:de").unwrap();
        let encoder = CorpusEncoderOptions::new(langs).init(dict);

        let (src, tgt, _, outcome) =
            encode_to_strings(&encoder, "en", "it", "hello\n", "ciao\n");

        // Bidirectional pair: the swapped direction is appended.
        assert_eq!(outcome.written, 2);
        let src_lines: Vec<&str> = src.lines().collect();
        assert_eq!(src_lines[0], "[[it]]_ hello_");
        assert_eq!(src_lines[1], "[[en]]_ ciao_");
        let tgt_lines: Vec<&str> = tgt.lines().collect();
        assert_eq!(tgt_lines[0], "ciao_");
        assert_eq!(tgt_lines[1], "hello_");
    }

    #[test]
    fn test_factor_stream_alignment() {
        let dict = train_dict(&["hello world", "ciao mondo", "hallo welt"]);
        let langs = parse_lang_pairs("en:it,en:de").unwrap();
        let encoder = CorpusEncoderOptions::new(langs).with_factors(true).init(dict);

        let (src, _, factor, _) =
            encode_to_strings(&encoder, "en", "it", "hello world\n", "ciao\n");

        let src_tokens = src.lines().next().unwrap().split(' ').count();
        let factor_tokens = factor.lines().next().unwrap().split(' ').count();
        assert_eq!(src_tokens, factor_tokens);

        // Tag and whole words all close with the sentinel.
        assert_eq!(factor.lines().next().unwrap(), "W W W");
    }

    #[test]
    fn test_length_ratio_stats() {
        let dict = train_dict(&["hello world", "ciao"]);
        let langs = parse_lang_pairs("en:it").unwrap();
        let encoder = CorpusEncoderOptions::new(langs).init(dict);

        let (_, _, _, outcome) =
            encode_to_strings(&encoder, "en", "it", "hello world\n", "ciao\n");

        // Two source subtokens, one target subtoken.
        assert_eq!(outcome.forward.len(), 1);
        assert!((outcome.forward.mean() - 0.5).abs() < 1e-12);
        assert!((outcome.backward.mean() - 2.0).abs() < 1e-12);
    }
}
