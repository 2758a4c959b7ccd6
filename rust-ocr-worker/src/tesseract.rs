//! Recognition backed by the external `tesseract` binary.

use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::encode::normalize_to_png;
use crate::engine::{EngineFactory, Recognition, RecognitionEngine};
use crate::error::EngineError;
use crate::tsv::parse_tsv;

/// Environment variable overriding the path of the `tesseract` binary.
pub const TESSERACT_ENV: &str = "LECTERN_TESSERACT";

/// How the `tesseract` process is launched.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    pub binary: PathBuf,
    /// Forwarded as `--psm`. Tesseract picks its own default when unset.
    pub page_segmentation_mode: Option<u8>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            page_segmentation_mode: None,
        }
    }
}

impl TesseractConfig {
    /// Default configuration, with the binary taken from `LECTERN_TESSERACT`
    /// when that variable is set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(binary) = std::env::var_os(TESSERACT_ENV).filter(|v| !v.is_empty()) {
            config.binary = PathBuf::from(binary);
        }
        config
    }

    fn command(&self) -> Command {
        Command::new(&self.binary)
    }

    fn binary_name(&self) -> String {
        self.binary.display().to_string()
    }
}

/// Factory for [`TesseractEngine`]s.
///
/// Initialization is where a missing binary or an uninstalled language is
/// detected, so a batch fails up front instead of once per file.
#[derive(Debug, Clone, Default)]
pub struct Tesseract {
    config: TesseractConfig,
}

impl Tesseract {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    /// Lists the language packs the binary reports as installed.
    pub fn installed_languages(&self) -> Result<Vec<String>, EngineError> {
        let output = self
            .config
            .command()
            .arg("--list-langs")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| EngineError::Spawn {
                binary: self.config.binary_name(),
                source,
            })?;

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Execution(err_msg.trim().to_string()));
        }

        // Older releases print the list on stderr.
        let mut listing = String::from_utf8_lossy(&output.stdout).into_owned();
        listing.push('\n');
        listing.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(parse_language_list(&listing))
    }
}

impl EngineFactory for Tesseract {
    type Engine = TesseractEngine;

    fn initialize(&self, language: &str) -> Result<TesseractEngine, EngineError> {
        let installed = self.installed_languages()?;
        if let Some(missing) = missing_language(language, &installed) {
            return Err(EngineError::LanguageUnavailable(missing.to_string()));
        }

        tracing::debug!(language, binary = %self.config.binary_name(), "tesseract engine ready");

        Ok(TesseractEngine {
            config: self.config.clone(),
            language: language.to_string(),
            terminated: false,
        })
    }
}

/// First part of a `+`-joined language code that is blank or not installed.
fn missing_language<'a>(requested: &'a str, installed: &[String]) -> Option<&'a str> {
    requested
        .split('+')
        .map(str::trim)
        .find(|lang| lang.is_empty() || !installed.iter().any(|i| i == lang))
}

fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .map(str::to_string)
        .collect()
}

/// A recognition engine that spawns one `tesseract` process per image.
#[derive(Debug)]
pub struct TesseractEngine {
    config: TesseractConfig,
    language: String,
    terminated: bool,
}

impl TesseractEngine {
    pub fn language(&self) -> &str {
        &self.language
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
        ];
        if let Some(psm) = self.config.page_segmentation_mode {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        args.push("tsv".to_string());
        args
    }
}

impl RecognitionEngine for TesseractEngine {
    /// Normalizes the image to PNG, pipes it to a spawned `tesseract` process
    /// via stdin and parses the TSV report written to stdout.
    ///
    /// The CLI offers no progress reporting, so `progress` is never called.
    fn recognize(
        &mut self,
        image: &[u8],
        _progress: &mut dyn FnMut(f32),
    ) -> Result<Recognition, EngineError> {
        if self.terminated {
            return Err(EngineError::Terminated);
        }

        let png_data = normalize_to_png(image)?;

        let mut child = self
            .config
            .command()
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                binary: self.config.binary_name(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&png_data)
                .context("Failed to pipe PNG data to Tesseract stdin")?;
        }

        let output = child
            .wait_with_output()
            .context("Failed to wait for Tesseract process execution")?;

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Execution(err_msg.trim().to_string()));
        }

        let recognition = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        tracing::trace!(
            language = %self.language,
            chars = recognition.text.len(),
            confidence = recognition.confidence,
            "tesseract recognition finished"
        );
        Ok(recognition)
    }

    fn terminate(&mut self) -> Result<(), EngineError> {
        if self.terminated {
            return Err(EngineError::Terminated);
        }
        self.terminated = true;
        Ok(())
    }
}
