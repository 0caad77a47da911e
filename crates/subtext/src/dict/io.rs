//! # Dictionary File IO
//!
//! UTF-8 text, one symbol per line, each wrapped in single quotes (`'sym'`);
//! line order defines the 0-based index, and an empty padding placeholder is
//! written as `''`. The loader strips a single layer of matching quotes and
//! tolerates their absence.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::dict::subword_dict::SubwordDictionary;
use crate::errors::Result;

/// Save a dictionary to a file.
pub fn save_dictionary_path<P: AsRef<Path>>(
    dict: &SubwordDictionary,
    path: P,
) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write_dictionary(dict, &mut writer)
}

/// Write a dictionary to a [`Write`] writer.
pub fn write_dictionary<W: Write>(
    dict: &SubwordDictionary,
    writer: &mut W,
) -> Result<()> {
    for symbol in dict.symbols() {
        writeln!(writer, "'{symbol}'")?;
    }
    writer.flush()?;
    Ok(())
}

/// Load a dictionary from a file.
pub fn load_dictionary_path<P: AsRef<Path>>(path: P) -> Result<SubwordDictionary> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    read_dictionary(reader)
}

/// Read a dictionary from a [`BufRead`] stream.
pub fn read_dictionary<R: BufRead>(reader: R) -> Result<SubwordDictionary> {
    let mut symbols = Vec::new();
    for line in reader.lines() {
        symbols.push(unquote(line?.trim()).to_string());
    }
    SubwordDictionary::from_symbols(symbols)
}

/// Count the symbols in a dictionary file without materializing it.
pub fn count_symbols_path<P: AsRef<Path>>(path: P) -> Result<usize> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut size = 0;
    for line in reader.lines() {
        line?;
        size += 1;
    }
    Ok(size)
}

// Some dictionary files wrap symbols in quotes, but others don't.
fn unquote(line: &str) -> &str {
    for quote in ['\'', '"'] {
        if line.len() >= 2 && line.starts_with(quote) && line.ends_with(quote) {
            return &line[1..line.len() - 1];
        }
    }
    line
}
