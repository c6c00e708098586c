//! On-disk storage for uploaded documents.
//!
//! Documents are written verbatim to `<uploads_dir>/<task_id>_<filename>` as they stream in, so a
//! large upload never has to be held in memory. The size limit is checked per chunk and a write
//! that fails (or is abandoned) removes its partial file.

use std::path::{Path, PathBuf};

use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::config::{LimitsConfig, StorageConfig};
use crate::errors::{Error, Result};
use crate::types::TaskId;

/// A document that has been fully written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub task_id: TaskId,
    /// Sanitized original filename
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    storage: StorageConfig,
    limits: LimitsConfig,
}

impl UploadStore {
    pub fn new(storage: StorageConfig, limits: LimitsConfig) -> Self {
        Self { storage, limits }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.storage.uploads_dir
    }

    pub fn exports_dir(&self) -> &Path {
        &self.storage.exports_dir
    }

    /// Create every directory the service writes to. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub async fn ensure_layout(&self) -> std::io::Result<()> {
        for dir in [
            &self.storage.uploads_dir,
            &self.storage.exports_dir,
            &self.storage.logs_dir,
            &self.storage.temp_dir,
            &self.storage.models_dir,
        ] {
            fs::create_dir_all(dir).await?;
            debug!(dir = %dir.display(), "Ensured directory");
        }
        Ok(())
    }

    /// Check a client supplied filename and return the name it will be stored under.
    pub fn accept_filename(&self, raw: Option<&str>) -> Result<String> {
        let raw = raw.ok_or_else(|| Error::BadRequest {
            message: "Uploaded file has no filename".to_string(),
        })?;
        let filename = sanitize_filename(raw).ok_or_else(|| Error::BadRequest {
            message: format!("Invalid filename '{raw}'"),
        })?;
        validate_extension(&filename, &self.limits.allowed_formats)?;
        Ok(filename)
    }

    /// Open the destination file for a new document.
    pub async fn create(&self, task_id: TaskId, filename: &str) -> Result<PendingUpload> {
        let path = self.storage.uploads_dir.join(format!("{task_id}_{filename}"));
        let file = fs::File::create(&path).await?;

        debug!(task_id = %task_id, path = %path.display(), "Opened upload destination");

        Ok(PendingUpload {
            task_id,
            filename: filename.to_string(),
            path,
            file: Some(file),
            written: 0,
            max_file_size: self.limits.max_file_size,
            finished: false,
        })
    }

    /// Best-effort removal of a stored document that will not be analyzed.
    pub async fn discard(&self, upload: &StoredUpload) {
        match fs::remove_file(&upload.path).await {
            Ok(()) => debug!(task_id = %upload.task_id, "Discarded stored document"),
            Err(e) => warn!(task_id = %upload.task_id, error = %e, "Failed to discard stored document"),
        }
    }
}

/// A document being streamed to disk. Dropping it before [`PendingUpload::finish`] deletes the
/// partial file.
#[derive(Debug)]
pub struct PendingUpload {
    task_id: TaskId,
    filename: String,
    path: PathBuf,
    file: Option<fs::File>,
    written: u64,
    max_file_size: u64,
    finished: bool,
}

impl PendingUpload {
    pub fn written(&self) -> u64 {
        self.written
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let total = self.written + chunk.len() as u64;
        if total > self.max_file_size {
            warn!(
                task_id = %self.task_id,
                total_size = total,
                max_file_size = self.max_file_size,
                "File size limit exceeded, aborting upload"
            );
            return Err(Error::PayloadTooLarge {
                message: format!(
                    "File size exceeds maximum allowed size of {} bytes ({} MB)",
                    self.max_file_size,
                    self.max_file_size / (1024 * 1024)
                ),
            });
        }

        let file = self.file.as_mut().ok_or_else(|| Error::Internal {
            operation: "write to a closed upload".to_string(),
        })?;
        file.write_all(chunk).await?;
        self.written = total;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StoredUpload> {
        if self.written == 0 {
            return Err(Error::BadRequest {
                message: "File cannot be empty".to_string(),
            });
        }

        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        self.finished = true;

        info!(
            task_id = %self.task_id,
            filename = %self.filename,
            size_bytes = self.written,
            "Stored uploaded document"
        );

        Ok(StoredUpload {
            task_id: self.task_id,
            filename: std::mem::take(&mut self.filename),
            path: std::mem::take(&mut self.path),
            size_bytes: self.written,
        })
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Close the handle before unlinking so removal also works on Windows
        drop(self.file.take());
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove partial upload");
            }
        } else {
            debug!(path = %self.path.display(), "Removed partial upload");
        }
    }
}

/// Reduce a client supplied filename to a safe single path component.
///
/// Directory parts are dropped and characters outside `[A-Za-z0-9._ -]` become `_`.
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().to_string();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return None;
    }
    Some(cleaned)
}

/// Lowercased extension with its leading dot, e.g. `.pdf`
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

pub fn validate_extension(filename: &str, allowed: &[String]) -> Result<()> {
    let extension = extension_of(filename).unwrap_or_else(|| "(none)".to_string());
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&extension)) {
        return Ok(());
    }
    Err(Error::UnsupportedMediaType {
        extension,
        allowed: allowed.join(", "),
    })
}
