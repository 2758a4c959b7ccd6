//! Heuristic check on a PDF page's text layer.
//!
//! This is not a confidence score. It only rejects text layers that are empty,
//! very short, or mostly symbols, which usually means the page is a scan.

use once_cell::sync::Lazy;
use regex::Regex;

/// The trimmed text must be strictly longer than this many characters.
pub const MIN_TEXT_CHARS: usize = 10;
/// Length of the shortest run of ASCII letters that must appear.
pub const MIN_LETTER_RUN: usize = 3;
/// The text must contain strictly more word characters (`[A-Za-z0-9_]`) than this.
pub const MIN_WORD_CHARS: usize = 20;

static LETTER_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("[a-zA-Z]{{{MIN_LETTER_RUN},}}")).expect("letter run pattern is valid")
});

static WORD_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_]").expect("word character pattern is valid"));

/// Whether a text layer is good enough to skip recognition.
pub fn has_good_text(text: &str) -> bool {
    text.chars().count() > MIN_TEXT_CHARS
        && LETTER_RUN.is_match(text)
        && WORD_CHAR.find_iter(text).count() > MIN_WORD_CHARS
}
