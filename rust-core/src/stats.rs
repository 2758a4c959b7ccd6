//! Derived statistics for extracted text.

use serde::{Deserialize, Serialize};

use crate::queue::QueuedFile;

/// Whitespace-delimited, non-empty tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Length of the text in characters, untrimmed.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Final text of one file together with its derived counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub word_count: usize,
    pub char_count: usize,
}

impl FileResult {
    /// Computes the counts once, from the finalized text.
    pub fn new(text: String, confidence: Option<f32>) -> Self {
        Self {
            word_count: word_count(&text),
            char_count: char_count(&text),
            text,
            confidence,
        }
    }
}

/// Totals shown above the list of completed files.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultTotals {
    pub files: usize,
    pub words: usize,
    pub chars: usize,
    /// Files without a confidence count as 0.
    pub average_confidence: f32,
}

impl ResultTotals {
    pub fn from_files<'a>(files: impl IntoIterator<Item = &'a QueuedFile>) -> Self {
        let mut totals = ResultTotals::default();
        let mut confidence_sum = 0.0f32;

        for file in files {
            totals.files += 1;
            if let Some(result) = &file.result {
                totals.words += result.word_count;
                totals.chars += result.char_count;
                confidence_sum += result.confidence.unwrap_or(0.0);
            }
        }

        if totals.files > 0 {
            totals.average_confidence = confidence_sum / totals.files as f32;
        }
        totals
    }
}
