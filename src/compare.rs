use std::io::{self, BufRead};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::files;

/// Outcome of comparing the MD values of two response files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonResult {
    /// MD values that had a counterpart in the expected file.
    pub total_compared: usize,
    /// Number of mismatches, including missing or extra digests.
    pub mismatches: usize,
    /// Zero-based MD positions that did not match.
    pub mismatch_positions: Vec<usize>,
}

impl ComparisonResult {
    /// is_match reports whether every digest matched.
    pub fn is_match(&self) -> bool {
        self.mismatches == 0
    }

    fn record(&mut self, position: usize) {
        self.mismatches += 1;
        self.mismatch_positions.push(position);
    }
}

/// md_value returns the trimmed value of an `MD =` or `MD=` line.
pub fn md_value(line: &str) -> Option<&str> {
    if !(line.starts_with("MD =") || line.starts_with("MD=")) {
        return None;
    }
    line.split_once('=').map(|(_, value)| value.trim())
}

fn next_digest<I>(lines: &mut I) -> io::Result<Option<String>>
where
    I: Iterator<Item = io::Result<String>>,
{
    for line in lines {
        if let Some(value) = md_value(&line?) {
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

/// compare_readers walks the MD lines of `output` in order and matches each
/// one against the next MD line of `expected`.
///
/// A digest without counterpart counts as one mismatch and ends the walk.
/// Leftover expected digests add one more mismatch.
pub fn compare_readers<A: BufRead, B: BufRead>(
    output: A,
    expected: B,
    output_name: &str,
) -> Result<ComparisonResult> {
    let mut expected = expected.lines();
    let mut result = ComparisonResult::default();
    let mut position = 0;
    let mut exhausted = false;

    for line in output.lines() {
        let line = line?;
        let Some(actual) = md_value(&line) else {
            continue;
        };

        match next_digest(&mut expected)? {
            Some(want) => {
                result.total_compared += 1;
                if want != actual {
                    debug!(position, got = actual, want = %want, "MD mismatch");
                    result.record(position);
                }
            }
            None => {
                warn!(position, "expected file has fewer MD values");
                result.record(position);
                position += 1;
                exhausted = true;
                break;
            }
        }
        position += 1;
    }

    if position == 0 {
        return Err(Error::NoDigestsFound(output_name.to_string()));
    }

    if !exhausted && next_digest(&mut expected)?.is_some() {
        warn!(position, "expected file has more MD values");
        result.record(position);
    }

    Ok(result)
}

/// compare_files compares the response file `output` against `expected`.
pub fn compare_files(output: &Path, expected: &Path) -> Result<ComparisonResult> {
    let out = files::open_request(output)?;
    let exp = files::open_request(expected)?;
    compare_readers(out, exp, &output.display().to_string())
}
