//! # Lectern Core
//!
//! Text extraction for batches of images and PDFs.
//!
//! Files are queued as [`QueuedFile`]s and handed to an [`Orchestrator`],
//! which initializes one recognition engine for the whole batch and walks
//! the files strictly in order:
//!
//! - images go straight to the engine;
//! - PDFs are read page by page, using the embedded text layer when it looks
//!   usable and falling back to rasterizing and recognizing the page
//!   otherwise.
//!
//! Every state change is reported through a synchronous update callback as
//! a [`FileUpdate`]. A failing page becomes a placeholder, a failing file is
//! marked as errored, and only a failure to start the engine aborts a batch.
//!
//! The recognition engine and the PDF library are reached through traits
//! ([`lectern_ocr_worker::EngineFactory`], [`DocumentReader`]); the default
//! backends are Tesseract and Pdfium.

pub mod batch;
pub mod cancel;
pub mod document;
pub mod error;
pub mod export;
mod logging;
pub mod page;
pub mod pdfium;
pub mod processor;
pub mod quality;
pub mod queue;
pub mod relay;
pub mod settings;
pub mod stats;

#[cfg(feature = "python")]
mod python;

#[cfg(test)]
mod test_support;

pub use batch::{BatchSummary, Orchestrator};
pub use cancel::CancelToken;
pub use document::{Document, DocumentReader, Page};
pub use error::PipelineError;
pub use logging::{init_logging, LOG_ENV};
pub use page::PageOutcome;
pub use pdfium::PdfiumReader;
pub use queue::{FileId, FileKind, FileStatus, FileUpdate, Queue, QueuedFile};
pub use relay::UpdateRelay;
pub use settings::Settings;
pub use stats::{FileResult, ResultTotals};
