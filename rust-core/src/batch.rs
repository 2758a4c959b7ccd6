//! Sequential batch processing with one shared recognition engine.

use lectern_ocr_worker::{EngineError, EngineFactory, RecognitionEngine};
use serde::Serialize;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::document::DocumentReader;
use crate::error::{PipelineError, Result};
use crate::processor::{process_file, ProcessError};
use crate::queue::{FileId, FileStatus, FileUpdate, QueuedFile};
use crate::settings::Settings;

/// How a batch ended, file by file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Files passed in that were not pending.
    pub skipped: usize,
}

/// Owns the batch's engine and terminates it exactly once: explicitly via
/// [`EngineGuard::release`], or on drop if the batch unwinds.
struct EngineGuard<E: RecognitionEngine> {
    engine: E,
    released: bool,
}

impl<E: RecognitionEngine> EngineGuard<E> {
    fn acquire<F>(factory: &F, language: &str) -> Result<Self>
    where
        F: EngineFactory<Engine = E>,
    {
        let engine = factory
            .initialize(language)
            .map_err(|source| PipelineError::EngineInit {
                language: language.to_string(),
                source,
            })?;
        Ok(Self {
            engine,
            released: false,
        })
    }

    fn release(mut self) -> std::result::Result<(), EngineError> {
        self.released = true;
        self.engine.terminate()
    }
}

impl<E: RecognitionEngine> Drop for EngineGuard<E> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.engine.terminate() {
            warn!(error = %err, "failed to release recognition engine");
        }
    }
}

/// Keeps one file's reported progress within `[0, 100]` and non-decreasing.
#[derive(Default)]
struct ProgressGate {
    last: f32,
}

impl ProgressGate {
    fn filter(&mut self, mut update: FileUpdate) -> FileUpdate {
        if let Some(percent) = update.progress {
            let percent = percent.clamp(0.0, 100.0).max(self.last);
            self.last = percent;
            update.progress = Some(percent);
        }
        update
    }
}

/// Runs batches of queued files through the image and PDF paths.
///
/// Files are processed strictly one after another, in input order. All state
/// changes are reported through the update callback, synchronously and in
/// order: every update for a file is emitted before the next file starts.
pub struct Orchestrator<F, R> {
    factory: F,
    reader: R,
}

impl<F, R> Orchestrator<F, R>
where
    F: EngineFactory,
    R: DocumentReader,
{
    pub fn new(factory: F, reader: R) -> Self {
        Self { factory, reader }
    }

    /// Processes every pending file in `files`.
    ///
    /// Each file gets `processing` with progress 0, then exactly one terminal
    /// update: `completed` with its result and progress 100, `error` with a
    /// message and progress 0, or `cancelled`. A failing file never stops the
    /// files after it.
    ///
    /// `cancel` applies to this call only. When it is already set, every
    /// pending file is marked `cancelled` and no engine is started.
    ///
    /// Returns an error only when the engine cannot be initialized (no file is
    /// touched in that case) or cannot be released after the last file.
    pub fn process_files<U>(
        &self,
        files: &[QueuedFile],
        settings: &Settings,
        cancel: &CancelToken,
        mut on_update: U,
    ) -> Result<BatchSummary>
    where
        U: FnMut(&FileId, FileUpdate),
    {
        settings.validate()?;

        let mut summary = BatchSummary::default();
        let mut runnable = Vec::with_capacity(files.len());
        for file in files {
            if file.status == FileStatus::Pending {
                runnable.push(file);
            } else {
                warn!(file = %file.id, status = ?file.status, "skipping file that is not pending");
                summary.skipped += 1;
            }
        }

        if runnable.is_empty() {
            return Ok(summary);
        }

        let span = tracing::info_span!("batch", files = runnable.len(), language = %settings.language);
        let _entered = span.enter();

        if cancel.is_cancelled() {
            for file in &runnable {
                on_update(&file.id, FileUpdate::cancelled());
                summary.cancelled += 1;
            }
            info!("batch cancelled before start");
            return Ok(summary);
        }

        let mut guard = EngineGuard::acquire(&self.factory, &settings.language)?;
        info!("recognition engine initialized");

        for (index, file) in runnable.iter().enumerate() {
            if cancel.is_cancelled() {
                for rest in &runnable[index..] {
                    on_update(&rest.id, FileUpdate::cancelled());
                    summary.cancelled += 1;
                }
                info!(remaining = runnable.len() - index, "batch cancelled");
                break;
            }

            match self.process_one(file, settings, &mut guard.engine, cancel, &mut on_update) {
                FileStatus::Completed => summary.completed += 1,
                FileStatus::Cancelled => summary.cancelled += 1,
                _ => summary.failed += 1,
            }
        }

        guard.release().map_err(PipelineError::EngineRelease)?;

        info!(
            completed = summary.completed,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "batch finished"
        );
        Ok(summary)
    }

    /// Runs one file and emits its updates. Returns the terminal status.
    fn process_one<U>(
        &self,
        file: &QueuedFile,
        settings: &Settings,
        engine: &mut F::Engine,
        cancel: &CancelToken,
        on_update: &mut U,
    ) -> FileStatus
    where
        U: FnMut(&FileId, FileUpdate),
    {
        on_update(&file.id, FileUpdate::processing());

        let mut gate = ProgressGate::default();
        let result = process_file(
            file,
            settings,
            engine,
            &self.reader,
            cancel,
            &mut |update| on_update(&file.id, gate.filter(update)),
        );

        match result {
            Ok(result) => {
                info!(
                    file = %file.id,
                    name = %file.name,
                    words = result.word_count,
                    confidence = ?result.confidence,
                    "file completed"
                );
                on_update(&file.id, FileUpdate::completed(result));
                FileStatus::Completed
            }
            Err(ProcessError::Cancelled) => {
                info!(file = %file.id, name = %file.name, "file cancelled");
                on_update(&file.id, FileUpdate::cancelled());
                FileStatus::Cancelled
            }
            Err(ProcessError::Failed(err)) => {
                let message = format!("{err:#}");
                warn!(file = %file.id, name = %file.name, error = %message, "file failed");
                on_update(&file.id, FileUpdate::failed(message));
                FileStatus::Error
            }
        }
    }
}
