use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use subtext::dict::io::load_dictionary_path;
use subtext::stats::{DECODE_LENGTHS_FILE, DecodeLengths, SequenceStats};
use subtext_training::corpus::{collect_parallel_files, parse_lang_pairs};
use subtext_training::corpus_encoder::CorpusEncoderOptions;

use crate::logging::LogArgs;

/// Args for the encode command.
#[derive(clap::Args, Debug)]
pub struct EncodeArgs {
    /// The language pair list, encoded as <s1>:<t1>[,<sn>:<tn>]
    /// (i.e. en:it,it:en,en:fr).
    pub lang_pairs: String,

    /// The learned dictionary file.
    pub vocabulary: PathBuf,

    /// The destination folder.
    pub output_path: PathBuf,

    /// The paths to the tokenized corpora.
    #[arg(required = true)]
    pub input_paths: Vec<PathBuf>,

    /// Output name prefix for the encoded corpora.
    #[arg(long, default_value = "train")]
    pub name: String,

    /// Generate a factor stream aligned with the source output.
    #[arg(long, default_value_t = false)]
    pub with_factors: bool,

    /// Lines per worker batch (default is worker threads x 100).
    #[arg(long)]
    pub batch_size: Option<usize>,

    #[clap(flatten)]
    pub logging: LogArgs,
}

impl EncodeArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        self.logging.setup_logging(3)?;

        let dict = Arc::new(load_dictionary_path(&self.vocabulary)?);
        log::info!(
            "loaded dictionary with {} symbols from {}",
            dict.len(),
            self.vocabulary.display()
        );

        let langs = parse_lang_pairs(&self.lang_pairs)?;
        let encoder = CorpusEncoderOptions::new(langs.clone())
            .with_factors(self.with_factors)
            .with_batch_size(self.batch_size)
            .init(dict);

        fs::create_dir_all(&self.output_path)?;
        let mut out_src = BufWriter::new(File::create(
            self.output_path.join(format!("{}.sl", self.name)),
        )?);
        let mut out_tgt = BufWriter::new(File::create(
            self.output_path.join(format!("{}.tl", self.name)),
        )?);
        let mut out_factor = if self.with_factors {
            Some(BufWriter::new(File::create(
                self.output_path.join(format!("{}.factor", self.name)),
            )?))
        } else {
            None
        };

        let mut decode_lengths = DecodeLengths::new();
        let mut covered: Vec<(String, String)> = Vec::new();

        // Language pairs are processed sequentially, never interleaved; the
        // swapped direction of a bidirectional pair is emitted by the
        // encoder itself, so each undirected pair is read once.
        for (src_lang, tgt_lang) in &langs {
            let mut pair = [src_lang.clone(), tgt_lang.clone()];
            pair.sort();
            let [a, b] = pair;
            if covered.contains(&(a.clone(), b.clone())) {
                continue;
            }
            covered.push((a, b));

            let (src_files, tgt_files) =
                collect_parallel_files(src_lang, tgt_lang, &self.input_paths)?;

            let outcome = encoder.encode_files(
                src_lang,
                tgt_lang,
                &src_files,
                &tgt_files,
                &mut out_src,
                &mut out_tgt,
                out_factor
                    .as_mut()
                    .map(|writer| writer as &mut dyn std::io::Write),
            )?;

            log::info!(
                "{src_lang} > {tgt_lang}: {} pairs written, {} dropped",
                outcome.written,
                outcome.dropped
            );

            record_direction(&mut decode_lengths, src_lang, tgt_lang, &outcome.forward);
            record_direction(&mut decode_lengths, tgt_lang, src_lang, &outcome.backward);
        }

        out_src.flush()?;
        out_tgt.flush()?;
        if let Some(writer) = out_factor.as_mut() {
            writer.flush()?;
        }

        decode_lengths.save_path(self.output_path.join(DECODE_LENGTHS_FILE))?;

        Ok(())
    }
}

fn record_direction(
    decode_lengths: &mut DecodeLengths,
    src_lang: &str,
    tgt_lang: &str,
    stats: &SequenceStats,
) {
    if stats.is_empty() {
        log::warn!("no pairs survived encoding for {src_lang} > {tgt_lang}");
        return;
    }
    decode_lengths.insert(src_lang, tgt_lang, stats);
}
