//! Files waiting for, undergoing, or done with extraction.
//!
//! A [`QueuedFile`] is only ever changed by applying a [`FileUpdate`], the same
//! message the orchestrator hands to its update callback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::stats::FileResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    pub fn new() -> Self {
        FileId(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Pdf,
}

impl FileKind {
    /// Anything that is not `image/*` is treated as a PDF.
    pub fn from_mime(mime: &str) -> Self {
        if mime.trim().to_ascii_lowercase().starts_with("image/") {
            FileKind::Image
        } else {
            FileKind::Pdf
        }
    }

    /// Maps the accepted extensions (`jpg`, `jpeg`, `png`, `pdf`).
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" => Some(FileKind::Image),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }

    /// Guesses the kind from the leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(FileKind::Pdf);
        }
        image::guess_format(bytes).ok().map(|_| FileKind::Image)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Error,
    Cancelled,
}

impl FileStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FileStatus::Completed | FileStatus::Error | FileStatus::Cancelled
        )
    }

    /// Statuses only move forward: pending, processing, then one terminal
    /// status. A file that never started may go straight to cancelled.
    pub fn can_transition_to(self, next: FileStatus) -> bool {
        use FileStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Processing)
                | (Processing, Completed)
                | (Processing, Error)
                | (Processing, Cancelled)
        )
    }
}

/// Partial update of a [`QueuedFile`]. Absent fields leave the file as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FileStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<FileResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileUpdate {
    pub fn processing() -> Self {
        Self {
            status: Some(FileStatus::Processing),
            progress: Some(0.0),
            ..Self::default()
        }
    }

    pub fn progress(percent: f32) -> Self {
        Self {
            progress: Some(percent),
            ..Self::default()
        }
    }

    pub fn pages(percent: f32, current_page: Option<usize>, page_count: usize) -> Self {
        Self {
            progress: Some(percent),
            current_page,
            page_count: (page_count > 0).then_some(page_count),
            ..Self::default()
        }
    }

    pub fn completed(result: FileResult) -> Self {
        Self {
            status: Some(FileStatus::Completed),
            progress: Some(100.0),
            result: Some(result),
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(FileStatus::Error),
            progress: Some(0.0),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: Some(FileStatus::Cancelled),
            ..Self::default()
        }
    }
}

/// One input file and its extraction state.
#[derive(Clone)]
pub struct QueuedFile {
    pub id: FileId,
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub kind: FileKind,
    pub size: u64,
    pub status: FileStatus,
    pub progress: f32,
    pub current_page: Option<usize>,
    pub page_count: Option<usize>,
    pub result: Option<FileResult>,
    pub error: Option<String>,
}

impl fmt::Debug for QueuedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("status", &self.status)
            .field("progress", &self.progress)
            .field("current_page", &self.current_page)
            .field("page_count", &self.page_count)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl QueuedFile {
    pub fn new(name: impl Into<String>, kind: FileKind, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            id: FileId::new(),
            name: name.into(),
            size: bytes.len() as u64,
            bytes,
            kind,
            status: FileStatus::Pending,
            progress: 0.0,
            current_page: None,
            page_count: None,
            result: None,
            error: None,
        }
    }

    /// Builds a file from an upload. The MIME type decides the kind when the
    /// caller has one; otherwise the content, then the file name, are used.
    pub fn from_bytes(
        name: impl Into<String>,
        mime: Option<&str>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Self> {
        let name = name.into();
        let bytes = bytes.into();
        let kind = mime
            .map(FileKind::from_mime)
            .or_else(|| FileKind::sniff(&bytes))
            .or_else(|| FileKind::from_extension(Path::new(&name)))
            .ok_or_else(|| PipelineError::UnsupportedFile(name.clone()))?;
        Ok(Self::new(name, kind, bytes))
    }

    /// Reads a JPG, PNG or PDF from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let kind = FileKind::from_extension(path)
            .ok_or_else(|| PipelineError::UnsupportedFile(name.clone()))?;
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::new(name, kind, bytes))
    }

    /// Merges `update` into the file, refusing backward status moves.
    pub fn apply(&mut self, update: &FileUpdate) -> Result<()> {
        if let Some(next) = update.status {
            if !self.status.can_transition_to(next) {
                return Err(PipelineError::InvalidTransition {
                    id: self.id,
                    from: self.status,
                    to: next,
                });
            }
            self.status = next;
        }
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if update.current_page.is_some() {
            self.current_page = update.current_page;
        }
        if update.page_count.is_some() {
            self.page_count = update.page_count;
        }
        if let Some(result) = &update.result {
            self.result = Some(result.clone());
        }
        if let Some(error) = &update.error {
            self.error = Some(error.clone());
        }
        Ok(())
    }
}

/// Ordered collection of files known to the UI.
#[derive(Debug, Default)]
pub struct Queue {
    files: Vec<QueuedFile>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: QueuedFile) -> FileId {
        let id = file.id;
        self.files.push(file);
        id
    }

    pub fn files(&self) -> &[QueuedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, id: &FileId) -> Option<&QueuedFile> {
        self.files.iter().find(|f| f.id == *id)
    }

    pub fn apply(&mut self, id: &FileId, update: &FileUpdate) -> Result<()> {
        self.files
            .iter_mut()
            .find(|f| f.id == *id)
            .ok_or(PipelineError::UnknownFile(*id))?
            .apply(update)
    }

    /// Snapshot of the files still waiting to be processed. Bytes are shared,
    /// not copied.
    pub fn pending(&self) -> Vec<QueuedFile> {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Pending)
            .cloned()
            .collect()
    }

    pub fn processing(&self) -> impl Iterator<Item = &QueuedFile> {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Processing)
    }

    pub fn completed(&self) -> impl Iterator<Item = &QueuedFile> {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Completed)
    }

    pub fn remove(&mut self, id: &FileId) -> Option<QueuedFile> {
        let index = self.files.iter().position(|f| f.id == *id)?;
        Some(self.files.remove(index))
    }

    /// Drops completed files and returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.files.len();
        self.files.retain(|f| f.status != FileStatus::Completed);
        before - self.files.len()
    }

    /// Mean progress of the files currently processing.
    pub fn overall_progress(&self) -> Option<f32> {
        let (sum, count) = self
            .processing()
            .fold((0.0f32, 0usize), |(sum, count), f| (sum + f.progress, count + 1));
        (count > 0).then(|| sum / count as f32)
    }

    /// The file that is partway through processing, if any.
    pub fn current(&self) -> Option<&QueuedFile> {
        self.files
            .iter()
            .find(|f| f.progress > 0.0 && f.progress < 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> QueuedFile {
        QueuedFile::new(name, FileKind::Pdf, b"%PDF-1.7".to_vec())
    }

    #[test]
    fn kind_from_mime_and_extension() {
        assert_eq!(FileKind::from_mime("image/png"), FileKind::Image);
        assert_eq!(FileKind::from_mime("application/pdf"), FileKind::Pdf);
        assert_eq!(
            FileKind::from_extension(Path::new("scan.JPEG")),
            Some(FileKind::Image)
        );
        assert_eq!(
            FileKind::from_extension(Path::new("doc.pdf")),
            Some(FileKind::Pdf)
        );
        assert_eq!(FileKind::from_extension(Path::new("notes.txt")), None);
        assert_eq!(FileKind::from_extension(Path::new("noext")), None);
    }

    #[test]
    fn sniffs_content() {
        assert_eq!(FileKind::sniff(b"%PDF-1.4\n..."), Some(FileKind::Pdf));
        assert_eq!(
            FileKind::sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            Some(FileKind::Image)
        );
        assert_eq!(FileKind::sniff(b"plain text"), None);
    }

    #[test]
    fn from_bytes_rejects_unknown_content() {
        let err = QueuedFile::from_bytes("notes.txt", None, b"hello".to_vec()).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFile(_)));

        let file = QueuedFile::from_bytes("upload", Some("image/jpeg"), b"x".to_vec()).unwrap();
        assert_eq!(file.kind, FileKind::Image);
        assert_eq!(file.size, 1);
    }

    #[test]
    fn from_path_reads_accepted_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let file = QueuedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.kind, FileKind::Pdf);
        assert_eq!(&file.bytes[..], b"%PDF-1.7");

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"hi").unwrap();
        assert!(QueuedFile::from_path(&txt).is_err());
    }

    #[test]
    fn statuses_never_move_backwards() {
        let mut file = pdf("a.pdf");
        file.apply(&FileUpdate::processing()).unwrap();
        file.apply(&FileUpdate::failed("boom")).unwrap();
        assert_eq!(file.status, FileStatus::Error);
        assert_eq!(file.error.as_deref(), Some("boom"));

        let err = file.apply(&FileUpdate::processing()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTransition { .. }));
        assert!(!FileStatus::Completed.can_transition_to(FileStatus::Error));
        assert!(FileStatus::Pending.can_transition_to(FileStatus::Cancelled));
    }

    #[test]
    fn queue_tracks_progress_and_clears_completed() {
        let mut queue = Queue::new();
        let a = queue.add(pdf("a.pdf"));
        let b = queue.add(pdf("b.pdf"));
        assert_eq!(queue.pending().len(), 2);

        queue.apply(&a, &FileUpdate::processing()).unwrap();
        queue.apply(&a, &FileUpdate::pages(50.0, Some(2), 4)).unwrap();
        assert_eq!(queue.overall_progress(), Some(50.0));
        assert_eq!(queue.current().map(|f| f.id), Some(a));
        assert_eq!(queue.get(&a).and_then(|f| f.page_count), Some(4));

        let result = FileResult::new("done".to_string(), None);
        queue.apply(&a, &FileUpdate::completed(result)).unwrap();
        assert_eq!(queue.completed().count(), 1);
        assert_eq!(queue.overall_progress(), None);

        assert_eq!(queue.clear_completed(), 1);
        assert_eq!(queue.len(), 1);
        assert!(queue.remove(&b).is_some());
        assert!(queue.is_empty());
        assert!(matches!(
            queue.apply(&b, &FileUpdate::progress(1.0)),
            Err(PipelineError::UnknownFile(_))
        ));
    }

    #[test]
    fn update_serializes_only_present_fields() {
        let json = serde_json::to_value(FileUpdate::pages(25.0, Some(1), 4)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"progress": 25.0, "currentPage": 1, "pageCount": 4})
        );
    }
}
