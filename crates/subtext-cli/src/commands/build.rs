use std::fs;
use std::path::PathBuf;

use subtext::dict::io::count_symbols_path;
use subtext::dict::reserved::{dnt_placeholder, language_tag};
use subtext_training::corpus::{collect_parallel_files, mono_pairs, parse_lang_pairs};
use subtext_training::size_search::SizeSearchOptions;

use crate::logging::LogArgs;

/// File name of the learned dictionary inside the output directory.
pub const VOCAB_FILE: &str = "model.vcb";

// Do-not-translate placeholder slots reserved in every dictionary.
const DNT_SLOTS: usize = 10;

/// Args for the build command.
#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// The language pair list, encoded as <s1>:<t1>[,<sn>:<tn>]
    /// (i.e. en:it,it:en,en:fr).
    pub lang_pairs: String,

    /// The destination folder.
    pub output_path: PathBuf,

    /// The paths to the tokenized training corpora.
    #[arg(required = true)]
    pub input_paths: Vec<PathBuf>,

    /// The vocabulary size to approximate.
    #[arg(short = 's', long, default_value = "32768")]
    pub voc_size: usize,

    /// The number of threads used to find the bounds for vocabulary creation.
    #[arg(short = 'T', long, default_value = "2")]
    pub threads: usize,

    /// All tokens with a count less than this threshold will be used only
    /// for alphabet generation, useful for very large corpora.
    #[arg(long)]
    pub count_threshold: Option<u64>,

    /// Pad the dictionary size to be a multiple of N.
    #[arg(long, default_value = "8")]
    pub padding_factor: usize,

    /// Use the specified dictionary instead of re-learning one from scratch.
    #[arg(long, value_name = "VOCABULARY_PATH")]
    pub vocabulary: Option<PathBuf>,

    /// The working directory for temporary files (default is the os temp
    /// folder). Keeping it between runs reuses the token-count cache.
    #[arg(short = 'w', long, value_name = "WORKING_DIR")]
    pub working_dir: Option<PathBuf>,

    #[clap(flatten)]
    pub logging: LogArgs,
}

impl BuildArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        self.logging.setup_logging(3)?;

        fs::create_dir_all(&self.output_path)?;
        let vocab_path = self.output_path.join(VOCAB_FILE);

        if let Some(existing) = &self.vocabulary {
            log::info!("reusing dictionary {}", existing.display());
            fs::copy(existing, &vocab_path)?;
            return Ok(());
        }

        let langs = parse_lang_pairs(&self.lang_pairs)?;
        let target_langs: std::collections::BTreeSet<&str> =
            langs.iter().map(|(_, tgt)| tgt.as_str()).collect();

        let mut custom_tokens = Vec::new();
        if target_langs.len() > 1 {
            custom_tokens.extend(target_langs.iter().map(|lang| language_tag(lang)));
        }
        custom_tokens.extend((0..DNT_SLOTS).map(dnt_placeholder));

        let mut all_files = Vec::new();
        for (src_lang, tgt_lang) in mono_pairs(&langs) {
            let (src_files, tgt_files) =
                collect_parallel_files(&src_lang, &tgt_lang, &self.input_paths)?;
            all_files.extend(src_files);
            all_files.extend(tgt_files);
        }

        let work_dir = self
            .working_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        fs::create_dir_all(&work_dir)?;

        let dict = SizeSearchOptions::new(self.voc_size)
            .with_threads(self.threads)
            .with_custom_tokens(custom_tokens)
            .with_padding_factor(self.padding_factor)
            .with_count_threshold(self.count_threshold)
            .init()
            .build(&all_files, &work_dir)?;

        subtext::dict::io::save_dictionary_path(&dict, &vocab_path)?;
        log::info!(
            "saved dictionary with {} symbols to {}",
            count_symbols_path(&vocab_path)?,
            vocab_path.display()
        );

        Ok(())
    }
}
