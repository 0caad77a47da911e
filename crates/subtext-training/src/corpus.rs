//! # Parallel Corpus Layout
//!
//! Corpora are stored as file pairs `<name>.<src_lang>` / `<name>.<tgt_lang>`
//! holding one whitespace-pre-tokenized sentence per line.

use std::path::{Path, PathBuf};

use subtext::errors::{Result, SubtextError};

/// A directed language pair.
pub type LangPair = (String, String);

/// Parse a language-pair list of the form `<s1>:<t1>[,<s2>:<t2>...]`.
pub fn parse_lang_pairs(spec: &str) -> Result<Vec<LangPair>> {
    let mut pairs = Vec::new();
    for part in spec.split(',') {
        let (src, tgt) = part
            .split_once(':')
            .ok_or_else(|| SubtextError::Parse(format!("malformed language pair: {part:?}")))?;
        if src.is_empty() || tgt.is_empty() {
            return Err(SubtextError::Parse(format!(
                "malformed language pair: {part:?}"
            )));
        }
        pairs.push((src.to_string(), tgt.to_string()));
    }
    Ok(pairs)
}

/// The undirected pair set covered by a directed pair list, each pair in
/// sorted order; `en:it,it:en` covers the single `(en, it)` corpus.
pub fn mono_pairs(pairs: &[LangPair]) -> Vec<LangPair> {
    let mut mono: Vec<LangPair> = Vec::new();
    for (src, tgt) in pairs {
        let pair = if src <= tgt {
            (src.clone(), tgt.clone())
        } else {
            (tgt.clone(), src.clone())
        };
        if !mono.contains(&pair) {
            mono.push(pair);
        }
    }
    mono
}

/// Collect the aligned `<name>.<src>` / `<name>.<tgt>` file pairs under the
/// given directories, sorted by name for reproducible ordering.
pub fn collect_parallel_files<P: AsRef<Path>>(
    src_lang: &str,
    tgt_lang: &str,
    dirs: &[P],
) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let src_suffix = format!(".{src_lang}");
    let tgt_suffix = format!(".{tgt_lang}");

    let mut src_files = Vec::new();
    let mut tgt_files = Vec::new();

    for dir in dirs {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .map(|entry| Ok(entry?.path()))
            .collect::<Result<_>>()?;
        entries.sort();

        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stem) = name.strip_suffix(&src_suffix) else {
                continue;
            };

            let tgt_path = path.with_file_name(format!("{stem}{tgt_suffix}"));
            if !tgt_path.is_file() {
                return Err(SubtextError::CorpusMismatch(format!(
                    "missing target file for {}",
                    path.display()
                )));
            }

            src_files.push(path);
            tgt_files.push(tgt_path);
        }
    }

    Ok((src_files, tgt_files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_lang_pairs() {
        let pairs = parse_lang_pairs("en:it,it:en,en:fr").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("en".to_string(), "it".to_string()),
                ("it".to_string(), "en".to_string()),
                ("en".to_string(), "fr".to_string()),
            ]
        );

        assert!(parse_lang_pairs("en").is_err());
        assert!(parse_lang_pairs("en:").is_err());
    }

    #[test]
    fn test_mono_pairs() {
        let pairs = parse_lang_pairs("it:en,en:it,en:fr").unwrap();
        assert_eq!(
            mono_pairs(&pairs),
            vec![
                ("en".to_string(), "it".to_string()),
                ("en".to_string(), "fr".to_string()),
            ]
        );
    }

    #[test]
    fn test_collect_parallel_files() {
        tempdir::TempDir::new("corpus_test")
            .and_then(|dir| {
                fs::write(dir.path().join("europarl.en"), "hello\n")?;
                fs::write(dir.path().join("europarl.it"), "ciao\n")?;
                fs::write(dir.path().join("news.en"), "world\n")?;
                fs::write(dir.path().join("news.it"), "mondo\n")?;
                fs::write(dir.path().join("unrelated.txt"), "-\n")?;

                let (src, tgt) = collect_parallel_files("en", "it", &[dir.path()]).unwrap();
                assert_eq!(src.len(), 2);
                assert_eq!(tgt.len(), 2);
                assert!(src[0].ends_with("europarl.en"));
                assert!(tgt[0].ends_with("europarl.it"));
                assert!(src[1].ends_with("news.en"));

                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_collect_missing_target_is_error() {
        tempdir::TempDir::new("corpus_test")
            .and_then(|dir| {
                fs::write(dir.path().join("solo.en"), "hello\n")?;
                let result = collect_parallel_files("en", "it", &[dir.path()]);
                assert!(matches!(result, Err(SubtextError::CorpusMismatch(_))));
                Ok(())
            })
            .unwrap();
    }
}
