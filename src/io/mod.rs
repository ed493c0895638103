//! File-level input/output helpers.

pub mod export;

use std::fs;
use std::io;
use std::path::Path;

/// Reads a phrase-list file: one phrase per line, blank lines skipped.
///
/// Used for the exclusion and EV-rate phrase lists.
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be read.
pub fn read_phrase_file(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
