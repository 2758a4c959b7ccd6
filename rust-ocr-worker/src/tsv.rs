//! Parsing of Tesseract's `tsv` report.
//!
//! Each row is `level page block par line word left top width height conf text`.
//! Only level-5 rows carry words; the structural rows above them report a
//! confidence of -1.

use crate::engine::Recognition;

const WORD_LEVEL: u32 = 5;
const COLUMNS: usize = 12;

#[derive(PartialEq, Clone, Copy)]
struct Position {
    page: u32,
    block: u32,
    paragraph: u32,
    line: u32,
}

/// Rebuilds plain text from a TSV report and averages the word confidences.
///
/// Words on one line are joined by a space, lines by a newline and
/// paragraphs or blocks by a blank line.
pub(crate) fn parse_tsv(report: &str) -> Recognition {
    let mut text = String::new();
    let mut last: Option<Position> = None;
    let mut confidence_sum = 0.0f64;
    let mut confidence_count = 0usize;

    for row in report.lines() {
        let cols: Vec<&str> = row.splitn(COLUMNS, '\t').collect();
        if cols.len() < COLUMNS {
            continue;
        }
        // Header row fails to parse here.
        let Ok(level) = cols[0].parse::<u32>() else {
            continue;
        };
        if level != WORD_LEVEL {
            continue;
        }

        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        let position = Position {
            page: cols[1].parse().unwrap_or(0),
            block: cols[2].parse().unwrap_or(0),
            paragraph: cols[3].parse().unwrap_or(0),
            line: cols[4].parse().unwrap_or(0),
        };

        if let Some(prev) = last {
            if prev.page != position.page
                || prev.block != position.block
                || prev.paragraph != position.paragraph
            {
                text.push_str("\n\n");
            } else if prev.line != position.line {
                text.push('\n');
            } else {
                text.push(' ');
            }
        }
        text.push_str(word);
        last = Some(position);

        if let Ok(conf) = cols[10].trim().parse::<f64>() {
            if conf >= 0.0 {
                confidence_sum += conf;
                confidence_count += 1;
            }
        }
    }

    if !text.is_empty() {
        text.push('\n');
    }

    let confidence = if confidence_count > 0 {
        (confidence_sum / confidence_count as f64) as f32
    } else {
        0.0
    };

    Recognition { text, confidence }
}
