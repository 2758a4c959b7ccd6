//! Drives a single file from raw bytes to combined text.

use anyhow::Context;
use lectern_ocr_worker::RecognitionEngine;

use crate::cancel::CancelToken;
use crate::document::DocumentReader;
use crate::page::{resolve_page, PageOutcome};
use crate::queue::{FileKind, FileUpdate, QueuedFile};
use crate::settings::Settings;
use crate::stats::FileResult;

/// Text used when no page of a document yielded anything.
pub const NO_TEXT_SENTINEL: &str = "[No text could be extracted]";

/// Combined text of a file and the confidence behind it, before counting.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub text: String,
    pub confidence: Option<f32>,
}

impl Extraction {
    pub fn into_result(self) -> FileResult {
        FileResult::new(self.text, self.confidence)
    }
}

/// Position within a PDF, reported before and after each page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfProgress {
    /// Fraction of pages done, in `[0, 1]`.
    pub fraction: f32,
    pub current_page: Option<usize>,
    pub page_count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("processing cancelled")]
    Cancelled,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Recognizes one image. Text and confidence come back from the engine
/// untouched; engine progress is forwarded as a fraction.
pub fn process_image(
    bytes: &[u8],
    engine: &mut dyn RecognitionEngine,
    on_progress: &mut dyn FnMut(f32),
) -> anyhow::Result<Extraction> {
    let recognition = engine
        .recognize(bytes, on_progress)
        .context("Failed to recognize image")?;

    Ok(Extraction {
        text: recognition.text,
        confidence: Some(recognition.confidence),
    })
}

/// Extracts every page of a PDF in order.
///
/// A failing page is replaced by a placeholder and never aborts the
/// document. Only opening the document, or cancellation between pages,
/// fails the whole file.
pub fn process_pdf(
    bytes: &[u8],
    settings: &Settings,
    engine: &mut dyn RecognitionEngine,
    reader: &dyn DocumentReader,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(PdfProgress),
) -> Result<Extraction, ProcessError> {
    let document = reader.open(bytes).context("Failed to open PDF document")?;
    let page_count = document.page_count();
    tracing::debug!(page_count, "opened PDF");

    on_progress(PdfProgress {
        fraction: 0.0,
        current_page: None,
        page_count,
    });

    let mut pages = PageAccumulator::new(settings.page_breaks);

    for number in 1..=page_count {
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        on_progress(PdfProgress {
            fraction: (number - 1) as f32 / page_count as f32,
            current_page: Some(number),
            page_count,
        });

        let outcome = resolve_page(&*document, number, settings, engine);
        pages.push(number, outcome);

        on_progress(PdfProgress {
            fraction: number as f32 / page_count as f32,
            current_page: Some(number),
            page_count,
        });
    }

    Ok(pages.finish())
}

/// Runs the image or PDF path for `file`, translating progress into
/// [`FileUpdate`]s, and computes the final counts.
pub fn process_file(
    file: &QueuedFile,
    settings: &Settings,
    engine: &mut dyn RecognitionEngine,
    reader: &dyn DocumentReader,
    cancel: &CancelToken,
    on_update: &mut dyn FnMut(FileUpdate),
) -> Result<FileResult, ProcessError> {
    let extraction = match file.kind {
        FileKind::Image => process_image(&file.bytes, engine, &mut |fraction| {
            on_update(FileUpdate::progress(fraction * 100.0))
        })?,
        FileKind::Pdf => process_pdf(
            &file.bytes,
            settings,
            engine,
            reader,
            cancel,
            &mut |p: PdfProgress| {
                on_update(FileUpdate::pages(
                    p.fraction * 100.0,
                    p.current_page,
                    p.page_count,
                ))
            },
        )?,
    };

    Ok(extraction.into_result())
}

/// Collects page texts and the confidence of recognized pages.
struct PageAccumulator {
    page_breaks: bool,
    texts: Vec<String>,
    confidence_sum: f32,
    confidence_count: usize,
}

impl PageAccumulator {
    fn new(page_breaks: bool) -> Self {
        Self {
            page_breaks,
            texts: Vec::new(),
            confidence_sum: 0.0,
            confidence_count: 0,
        }
    }

    fn push(&mut self, number: usize, outcome: PageOutcome) {
        if let Some(confidence) = outcome.confidence {
            self.confidence_sum += confidence;
            self.confidence_count += 1;
        }

        if outcome.text.trim().is_empty() {
            return;
        }

        let text = if self.page_breaks {
            format!("\n--- Page {number} ---\n{}", outcome.text)
        } else {
            outcome.text
        };
        self.texts.push(text);
    }

    fn finish(self) -> Extraction {
        let combined = self.texts.join("\n").trim().to_string();
        let confidence = (self.confidence_count > 0)
            .then(|| self.confidence_sum / self.confidence_count as f32);

        Extraction {
            text: if combined.is_empty() {
                NO_TEXT_SENTINEL.to_string()
            } else {
                combined
            },
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEngine, FakePage, FakeReader};

    const PROSE: &str = "Lorem ipsum dolor sit amet consectetur";
    const MORE_PROSE: &str = "Sed do eiusmod tempor incididunt ut labore";

    fn no_fallback(page_breaks: bool) -> Settings {
        Settings {
            ocr_fallback: false,
            page_breaks,
            ..Settings::default()
        }
    }

    fn run_pdf(
        reader: &FakeReader,
        settings: &Settings,
        engine: &mut FakeEngine,
    ) -> (Result<Extraction, ProcessError>, Vec<PdfProgress>) {
        let mut progress = Vec::new();
        let result = process_pdf(
            b"%PDF",
            settings,
            engine,
            reader,
            &CancelToken::new(),
            &mut |p| progress.push(p),
        );
        (result, progress)
    }

    #[test]
    fn image_passes_engine_output_through() {
        let mut engine = FakeEngine::default()
            .respond(b"img", "hello world", 92.0)
            .with_progress(&[0.25, 0.5]);
        let mut seen = Vec::new();

        let extraction = process_image(b"img", &mut engine, &mut |f| seen.push(f)).unwrap();
        assert_eq!(extraction.text, "hello world");
        assert_eq!(extraction.confidence, Some(92.0));
        assert_eq!(seen, vec![0.25, 0.5]);

        let result = extraction.into_result();
        assert_eq!((result.word_count, result.char_count), (2, 11));
    }

    #[test]
    fn image_engine_failure_is_reported() {
        let mut engine = FakeEngine::default();
        let err = process_image(b"img", &mut engine, &mut |_| {}).unwrap_err();
        assert!(format!("{err:#}").starts_with("Failed to recognize image"));
    }

    #[test]
    fn text_layer_pages_carry_no_confidence() {
        let reader = FakeReader::new(vec![FakePage::text(PROSE), FakePage::text(MORE_PROSE)]);
        let mut engine = FakeEngine::default();

        let (result, _) = run_pdf(&reader, &no_fallback(true), &mut engine);
        let extraction = result.unwrap();
        assert_eq!(
            extraction.text,
            format!("--- Page 1 ---\n{PROSE}\n\n--- Page 2 ---\n{MORE_PROSE}")
        );
        assert_eq!(extraction.confidence, None);
        assert_eq!(engine.calls(), 0);

        let (result, _) = run_pdf(&reader, &no_fallback(false), &mut engine);
        assert_eq!(result.unwrap().text, format!("{PROSE}\n{MORE_PROSE}"));
    }

    #[test]
    fn blank_second_page_is_dropped() {
        let reader = FakeReader::new(vec![FakePage::text(PROSE), FakePage::text("   ")]);
        let mut engine = FakeEngine::default();

        let (result, _) = run_pdf(&reader, &no_fallback(true), &mut engine);
        let extraction = result.unwrap();
        assert_eq!(extraction.text, format!("--- Page 1 ---\n{PROSE}"));
        assert!(!extraction.text.contains("Page 2"));
        assert_eq!(extraction.confidence, None);
    }

    #[test]
    fn confidence_averages_recognized_pages_only() {
        let reader = FakeReader::new(vec![
            FakePage::text(""),
            FakePage::text(PROSE),
            FakePage::text(""),
        ]);
        let mut engine = FakeEngine::default()
            .respond(b"raster-1", "first scan", 90.0)
            .respond(b"raster-2", "second scan", 70.0)
            .respond(b"raster-3", "third scan", 50.0);
        let settings = Settings {
            page_breaks: false,
            confidence_threshold: 10.0,
            ..Settings::default()
        };

        let (result, _) = run_pdf(&reader, &settings, &mut engine);
        let extraction = result.unwrap();
        assert_eq!(extraction.text, format!("first scan\n{PROSE}\nthird scan"));
        assert_eq!(extraction.confidence, Some(70.0));
        assert_eq!(engine.calls(), 2);
    }

    #[test]
    fn failing_page_gets_placeholder_and_others_continue() {
        let mut pages: Vec<FakePage> = (0..5).map(|_| FakePage::text("")).collect();
        pages[2] = FakePage::raster_failure("");
        let reader = FakeReader::new(pages);
        let mut engine = FakeEngine::default();
        for n in [1, 2, 4, 5] {
            engine = engine.respond(format!("raster-{n}").as_bytes(), &format!("text {n}"), 80.0);
        }

        let (result, _) = run_pdf(&reader, &Settings::default(), &mut engine);
        let extraction = result.unwrap();
        assert!(extraction.text.contains("[Error processing page 3]"));
        for n in [1, 2, 4, 5] {
            assert!(extraction.text.contains(&format!("--- Page {n} ---\ntext {n}")));
        }
        assert_eq!(extraction.confidence, Some(80.0));
    }

    #[test]
    fn missing_page_is_a_page_level_failure() {
        let reader = FakeReader::new(vec![FakePage::missing(), FakePage::text(PROSE)]);
        let (result, _) = run_pdf(&reader, &no_fallback(false), &mut FakeEngine::default());
        assert_eq!(
            result.unwrap().text,
            format!("[Error processing page 1]\n{PROSE}")
        );
    }

    #[test]
    fn empty_document_yields_sentinel() {
        let reader = FakeReader::new(vec![FakePage::text(" "), FakePage::text("")]);
        let (result, _) = run_pdf(&reader, &no_fallback(true), &mut FakeEngine::default());
        let extraction = result.unwrap();
        assert_eq!(extraction.text, NO_TEXT_SENTINEL);
        assert_eq!(extraction.confidence, None);

        let (result, progress) = run_pdf(&FakeReader::new(vec![]), &no_fallback(true), &mut FakeEngine::default());
        assert_eq!(result.unwrap().text, NO_TEXT_SENTINEL);
        assert_eq!(progress.len(), 1);
    }

    #[test]
    fn progress_brackets_every_page() {
        let reader = FakeReader::new(vec![FakePage::text(PROSE), FakePage::text(PROSE)]);
        let (_, progress) = run_pdf(&reader, &no_fallback(true), &mut FakeEngine::default());

        let fractions: Vec<f32> = progress.iter().map(|p| p.fraction).collect();
        assert_eq!(fractions, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        let pages: Vec<Option<usize>> = progress.iter().map(|p| p.current_page).collect();
        assert_eq!(pages, vec![None, Some(1), Some(1), Some(2), Some(2)]);
        assert!(progress.iter().all(|p| p.page_count == 2));
    }

    #[test]
    fn unreadable_pdf_fails_the_file() {
        let (result, _) = run_pdf(&FakeReader::broken(), &Settings::default(), &mut FakeEngine::default());
        let err = result.unwrap_err();
        assert!(matches!(err, ProcessError::Failed(_)));
        assert!(format!("{err:#}").contains("Failed to open PDF document"));
    }

    #[test]
    fn cancellation_stops_between_pages() {
        let reader = FakeReader::new(vec![FakePage::text(PROSE), FakePage::text(PROSE)]);
        let cancel = CancelToken::new();
        let mut progress = Vec::new();

        let result = process_pdf(
            b"%PDF",
            &no_fallback(true),
            &mut FakeEngine::default(),
            &reader,
            &cancel,
            &mut |p| {
                if p.current_page == Some(1) && p.fraction == 0.5 {
                    cancel.cancel();
                }
                progress.push(p);
            },
        );

        assert!(matches!(result, Err(ProcessError::Cancelled)));
        assert!(progress.iter().all(|p| p.current_page != Some(2)));
    }
}
