//! Python bindings for driving batches from a desktop UI.

use lectern_ocr_worker::{Tesseract, TesseractConfig};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::batch::Orchestrator;
use crate::cancel::CancelToken;
use crate::error::PipelineError;
use crate::logging::init_logging;
use crate::pdfium::PdfiumReader;
use crate::queue::{Queue, QueuedFile};
use crate::relay::UpdateRelay;
use crate::settings::{Settings, SUPPORTED_LANGUAGES};

fn to_py_err(err: PipelineError) -> PyErr {
    match err {
        PipelineError::InvalidSettings(_)
        | PipelineError::UnsupportedFile(_)
        | PipelineError::Serde(_) => PyValueError::new_err(err.to_string()),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// Cooperative cancellation handle for `process_paths`.
///
/// Cancelling stops the batch between files and between PDF pages; the file
/// being recognized when it fires is reported as `cancelled`.
#[pyclass(name = "CancelToken")]
#[derive(Clone, Default)]
struct PyCancelToken(CancelToken);

#[pymethods]
impl PyCancelToken {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    fn cancel(&self) {
        self.0.cancel();
    }

    #[getter]
    fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Extracts text from the given image and PDF paths.
///
/// Files are processed in the order given, so the n-th distinct file id seen
/// by `on_update` belongs to `paths[n]`.
///
/// Args:
///     paths (list[str]): JPG, PNG or PDF files.
///     settings_json (str | None): camelCase settings; defaults when None.
///     on_update (Callable[[str, str], None]): Called with the file id and a
///         JSON object holding the changed fields.
///     cancel (CancelToken | None): Cancels the batch when set, e.g. from
///         `on_update` or another thread.
///
/// Returns:
///     str: JSON batch summary with completed/failed/cancelled counts.
///
/// Raises:
///     ValueError: Invalid settings or an unsupported file.
///     RuntimeError: The engine or the PDF library could not be loaded.
///     Exception: The first exception raised by `on_update`, after the batch
///         has been cancelled and the engine released.
#[pyfunction]
#[pyo3(signature = (paths, settings_json, on_update, cancel=None))]
fn process_paths(
    paths: Vec<String>,
    settings_json: Option<String>,
    on_update: &Bound<'_, PyAny>,
    cancel: Option<PyRef<'_, PyCancelToken>>,
) -> PyResult<String> {
    let settings = match settings_json {
        Some(json) => Settings::from_json(&json).map_err(to_py_err)?,
        None => Settings::default(),
    };

    let mut queue = Queue::new();
    for path in &paths {
        queue.add(QueuedFile::from_path(path).map_err(to_py_err)?);
    }
    let pending = queue.pending();

    let reader =
        PdfiumReader::new().map_err(|e| PyRuntimeError::new_err(format!("{e:#}")))?;
    let orchestrator = Orchestrator::new(Tesseract::new(TesseractConfig::from_env()), reader);

    let cancel = cancel.map(|token| token.0.clone()).unwrap_or_default();
    let mut relay = UpdateRelay::new(cancel.clone(), |id: String, payload: String| {
        on_update.call1((id, payload)).map(drop)
    });

    let summary = orchestrator.process_files(&pending, &settings, &cancel, |id, update| {
        relay.send(id, &update)
    });
    relay.finish()?;
    let summary = summary.map_err(to_py_err)?;

    serde_json::to_string(&summary).map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

/// Returns the offered (code, display name) language pairs.
#[pyfunction]
fn supported_languages() -> Vec<(&'static str, &'static str)> {
    SUPPORTED_LANGUAGES.to_vec()
}

#[pymodule]
fn lectern_core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    init_logging();
    m.add_function(wrap_pyfunction!(process_paths, m)?)?;
    m.add_function(wrap_pyfunction!(supported_languages, m)?)?;
    m.add_class::<PyCancelToken>()?;
    Ok(())
}
