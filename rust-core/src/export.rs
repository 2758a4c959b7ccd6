//! Getting extracted text out: plain-text export and search.

use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::error::{PipelineError, Result};
use crate::queue::QueuedFile;

/// Name of the file written by [`write_combined`].
pub const COMBINED_EXPORT_NAME: &str = "combined-text.txt";

static EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[^/.]+$").expect("extension pattern is valid"));

/// `scan.final.png` becomes `scan.final.txt`. Only a trailing `.ext` with at
/// least one character is dropped, so `.hidden` becomes `.txt`.
pub fn export_file_name(name: &str) -> String {
    format!("{}.txt", EXTENSION.replace(name, ""))
}

/// Writes a completed file's text to `dir` and returns the written path.
pub fn write_text(dir: &Path, file: &QueuedFile) -> Result<PathBuf> {
    let result = file.result.as_ref().ok_or_else(|| {
        PipelineError::Other(anyhow::anyhow!("{} has no extracted text yet", file.name))
    })?;

    let path = dir.join(export_file_name(&file.name));
    std::fs::write(&path, &result.text)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(file = %file.id, path = %path.display(), "exported text");
    Ok(path)
}

/// Text of every file with a result, each under a `=== name ===` header,
/// separated by blank lines. Files without a result are left out.
pub fn combined_text<'a>(files: impl IntoIterator<Item = &'a QueuedFile>) -> String {
    files
        .into_iter()
        .filter_map(|file| {
            let result = file.result.as_ref()?;
            Some(format!("=== {} ===\n{}", file.name, result.text))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Writes [`combined_text`] to `dir/combined-text.txt` and returns the path.
pub fn write_combined<'a>(
    dir: &Path,
    files: impl IntoIterator<Item = &'a QueuedFile>,
) -> Result<PathBuf> {
    let path = dir.join(COMBINED_EXPORT_NAME);
    std::fs::write(&path, combined_text(files))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "exported combined text");
    Ok(path)
}

/// Byte ranges of every case-insensitive occurrence of `term` in `text`.
/// A blank term matches nothing.
pub fn find_matches(text: &str, term: &str) -> Vec<Range<usize>> {
    if term.trim().is_empty() {
        return Vec::new();
    }
    match RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern.find_iter(text).map(|m| m.range()).collect(),
        Err(err) => {
            tracing::warn!(error = %err, "search term could not be compiled");
            Vec::new()
        }
    }
}

/// Wraps every match of `term` in `open` / `close` markers.
pub fn highlight(text: &str, term: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in find_matches(text, term) {
        out.push_str(&text[cursor..range.start]);
        out.push_str(open);
        out.push_str(&text[range.clone()]);
        out.push_str(close);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}
