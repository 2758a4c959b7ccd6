//! Per-page decision between the PDF text layer and recognition.

use anyhow::{Context, Result};
use lectern_ocr_worker::RecognitionEngine;

use crate::document::Document;
use crate::quality::has_good_text;
use crate::settings::Settings;

/// Scale factor pages are rasterized at before recognition.
pub const RASTER_SCALE: f32 = 2.0;

/// Text produced for one PDF page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub text: String,
    /// Present only when the page went through recognition.
    pub confidence: Option<f32>,
}

/// Text substituted for a page that could not be processed.
pub fn page_placeholder(number: usize) -> String {
    format!("[Error processing page {number}]")
}

/// Produces the text of page `number` (1-based).
///
/// The text layer is used when it passes [`has_good_text`] and either
/// recognition fallback is off or the text is longer than
/// `settings.confidence_threshold` characters. Otherwise the page is
/// rasterized and recognized when fallback is on, or the text layer is used
/// as-is when it is off.
///
/// Never fails: any error while loading, reading, rendering or recognizing
/// the page yields [`page_placeholder`] instead.
pub fn resolve_page(
    document: &dyn Document,
    number: usize,
    settings: &Settings,
    engine: &mut dyn RecognitionEngine,
) -> PageOutcome {
    match try_resolve_page(document, number, settings, engine) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(page = number, error = %format!("{err:#}"), "page failed, using placeholder");
            PageOutcome {
                text: page_placeholder(number),
                confidence: None,
            }
        }
    }
}

fn try_resolve_page(
    document: &dyn Document,
    number: usize,
    settings: &Settings,
    engine: &mut dyn RecognitionEngine,
) -> Result<PageOutcome> {
    let page = document.page(number)?;
    let layer = page
        .text_layer()
        .with_context(|| format!("Failed to extract text layer of page {number}"))?;
    let direct = layer.trim();

    // The threshold is a percentage in the UI but is compared to a character
    // count here.
    let long_enough = direct.chars().count() as f32 > settings.confidence_threshold;

    if has_good_text(direct) && (!settings.ocr_fallback || long_enough) {
        tracing::debug!(page = number, "using text layer");
        return Ok(PageOutcome {
            text: direct.to_string(),
            confidence: None,
        });
    }

    if settings.ocr_fallback {
        let image = page
            .rasterize(RASTER_SCALE)
            .with_context(|| format!("Failed to rasterize page {number}"))?;
        let recognition = engine
            .recognize(&image, &mut |_| {})
            .with_context(|| format!("Failed to recognize page {number}"))?;
        tracing::debug!(page = number, confidence = recognition.confidence, "recognized page");
        return Ok(PageOutcome {
            text: recognition.text,
            confidence: Some(recognition.confidence),
        });
    }

    Ok(PageOutcome {
        text: direct.to_string(),
        confidence: None,
    })
}
