use thiserror::Error;

/// Failures surfaced by a recognition engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(
        "Tesseract process failed to start ({binary}). Please ensure 'tesseract-ocr' is installed and in your PATH: {source}"
    )]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("language '{0}' is not installed for the recognition engine")]
    LanguageUnavailable(String),

    #[error("invalid image data: {0}")]
    InvalidImage(#[source] image::ImageError),

    #[error("Tesseract execution failed with error: {0}")]
    Execution(String),

    #[error("recognition engine has already been terminated")]
    Terminated,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
