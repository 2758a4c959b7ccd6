//! Per-batch processing settings.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Language tags offered to users, with display names.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("eng", "English"),
    ("spa", "Spanish"),
    ("fra", "French"),
    ("deu", "German"),
    ("ita", "Italian"),
    ("por", "Portuguese"),
    ("rus", "Russian"),
    ("jpn", "Japanese"),
    ("chi_sim", "Chinese (Simplified)"),
    ("chi_tra", "Chinese (Traditional)"),
    ("ara", "Arabic"),
    ("kor", "Korean"),
];

/// Snapshot of the options one batch runs with.
///
/// Deserializes from the camelCase JSON the UI keeps (`language`,
/// `ocrFallback`, `pageBreaks`, `confidenceThreshold`); missing keys take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Recognition engine language tag, e.g. `eng` or `eng+fra`.
    pub language: String,
    /// Rasterize and recognize PDF pages whose text layer is unusable.
    pub ocr_fallback: bool,
    /// Prefix each PDF page's text with a `--- Page N ---` marker.
    pub page_breaks: bool,
    /// 0 to 100. Also used as a minimum text-layer length, see
    /// [`crate::page::resolve_page`].
    pub confidence_threshold: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            ocr_fallback: true,
            page_breaks: true,
            confidence_threshold: 70.0,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(PipelineError::InvalidSettings(
                "language must not be empty".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(PipelineError::InvalidSettings(format!(
                "confidenceThreshold must be within 0..=100, got {}",
                self.confidence_threshold
            )));
        }
        Ok(())
    }

    /// Display name for the configured language, if it is a known tag.
    pub fn language_name(&self) -> Option<&'static str> {
        SUPPORTED_LANGUAGES
            .iter()
            .find(|(code, _)| *code == self.language)
            .map(|(_, name)| *name)
    }
}
