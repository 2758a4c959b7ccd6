//! # Lectern OCR Worker
//!
//! The recognition side of Lectern. Defines the capability the extraction
//! pipeline relies on ([`EngineFactory`] / [`RecognitionEngine`]) and ships a
//! backend that drives the `tesseract` command-line utility.
//!
//! The pipeline never assumes more than the traits below: initialize an engine
//! for a language tag, recognize encoded image bytes into text plus a mean
//! confidence, and terminate the engine once the batch is over.

mod encode;
mod engine;
mod error;
mod tesseract;
mod tsv;

pub use encode::{encode_rgba_png, normalize_to_png};
pub use engine::{EngineFactory, Recognition, RecognitionEngine};
pub use error::EngineError;
pub use tesseract::{Tesseract, TesseractConfig, TesseractEngine, TESSERACT_ENV};
