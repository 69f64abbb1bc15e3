use std::path::{Path, PathBuf};

use bytes::Bytes;
use common::error::AppError;
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::utils::{has_pdf_extension, is_plain_file_name, pdf_text};

/// A document received from a caller, not yet written to disk.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Locations of the two documents of the current comparison round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPair {
    pub reference: PathBuf,
    pub actual: PathBuf,
}

/// Owns the staging directory holding the reference and actual documents.
///
/// Every call to [`DocumentIngestion::stage`] wipes the directory first, so at
/// most one pair of documents is staged at a time. The directory is not
/// locked; callers serialise comparison rounds themselves.
#[derive(Debug, Clone)]
pub struct DocumentIngestion {
    base_dir: PathBuf,
}

impl DocumentIngestion {
    pub async fn new(base_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).await?;
        info!(path = %base_dir.display(), "Staging directory ready");
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Deletes every file in the staging directory. The first failure aborts.
    pub async fn clear(&self) -> Result<(), AppError> {
        self.delete_existing_files().await.map_err(|err| {
            error!(error = %err, "Error in deleting existing files");
            AppError::staging("An error occurred while deleting existing files", err)
        })
    }

    async fn delete_existing_files(&self) -> std::io::Result<()> {
        let mut entries = match fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err),
            };
            if file_type.is_dir() {
                warn!(path = %path.display(), "Skipping directory in staging area");
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => info!(path = %path.display(), "File deleted"),
                // Removed by someone else between listing and deletion.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "File already gone");
                }
                Err(err) => return Err(err),
            }
        }

        info!("Existing files deleted successfully");
        Ok(())
    }

    /// Replaces the staged documents with a new reference/actual pair.
    pub async fn stage(
        &self,
        reference: UploadedFile,
        actual: UploadedFile,
    ) -> Result<StagedPair, AppError> {
        self.clear().await?;

        for upload in [&reference, &actual] {
            validate_upload(upload).map_err(|err| {
                error!(file = %upload.file_name, error = %err, "Error in saving uploaded files");
                err
            })?;
        }

        let reference_path = self.write_upload(&reference).await?;
        info!(file = %reference_path.display(), "Reference file saved successfully");

        let actual_path = self.write_upload(&actual).await?;
        info!(file = %actual_path.display(), "Actual file saved successfully");

        Ok(StagedPair {
            reference: reference_path,
            actual: actual_path,
        })
    }

    async fn write_upload(&self, upload: &UploadedFile) -> Result<PathBuf, AppError> {
        let path = self.base_dir.join(&upload.file_name);
        fs::write(&path, &upload.bytes).await.map_err(|err| {
            error!(file = %path.display(), error = %err, "Error in saving uploaded files");
            AppError::staging("An error occurred while saving uploaded files", err)
        })?;
        Ok(path)
    }

    /// Staged PDFs sorted by file name.
    pub async fn staged_files(&self) -> Result<Vec<PathBuf>, AppError> {
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|err| AppError::staging("An error occurred while listing staged files", err))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| AppError::staging("An error occurred while listing staged files", err))?
        {
            let path = entry.path();
            let is_file = entry
                .file_type()
                .await
                .map_err(|err| AppError::staging("An error occurred while listing staged files", err))?
                .is_file();
            let is_pdf = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(has_pdf_extension);

            if is_file && is_pdf {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Concatenates the text of every staged PDF, each section labelled with its file name.
    pub async fn combine(&self) -> Result<String, AppError> {
        let files = self.staged_files().await?;

        let mut doc_parts = Vec::with_capacity(files.len());
        for path in &files {
            let content = pdf_text::extract_text(path).await.map_err(|err| {
                error!(file = %path.display(), error = %err, "Error combining documents");
                err
            })?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            doc_parts.push(format!("Document: {file_name}\n{content}"));
        }

        info!(count = doc_parts.len(), "Documents combined");
        Ok(doc_parts.join("\n\n"))
    }
}

fn validate_upload(upload: &UploadedFile) -> Result<(), AppError> {
    if !is_plain_file_name(&upload.file_name) {
        return Err(AppError::Validation(format!(
            "Invalid file name: {}",
            upload.file_name
        )));
    }

    if !has_pdf_extension(&upload.file_name) {
        return Err(AppError::Validation("Only PDF files are allowed".into()));
    }

    Ok(())
}
