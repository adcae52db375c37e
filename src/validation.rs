//! Pre-upload validation of a selected batch.

use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::{AppError, AppResult};
use crate::sanitize::sanitize;

/// Name of the server's staging folder; no upload may claim it.
pub const RESERVED_NAME: &str = ".upload";

/// Where the bytes of a pending file come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// A file the user picked, before any check ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub size: u64,
    pub source: FileSource,
}

impl PendingFile {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), size: bytes.len() as u64, source: FileSource::Memory(bytes) }
    }

    /// Reads name and size of a local file without loading its contents.
    pub async fn from_path(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let meta = tokio::fs::metadata(&path).await?;
        if !meta.is_file() {
            return Err(AppError::IoError(format!("not a regular file: {}", path.display())));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, size: meta.len(), source: FileSource::Path(path) })
    }
}

/// A validated file together with the name the server will store it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub file: PendingFile,
    pub sanitized_name: String,
}

/// Files accepted for upload, in selection order. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatch {
    entries: Vec<BatchEntry>,
}

impl UploadBatch {
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.file.size).sum()
    }
}

/// Why a batch was refused before any transfer started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Invalid filename: .upload")]
    ReservedName { raw: String },
    #[error("File already exists: {raw}")]
    NameCollision { raw: String, sanitized: String },
    #[error("Duplicate file in selection: {raw}")]
    DuplicateInBatch { raw: String, sanitized: String },
}

/// Checks every file of a selection and builds the batch.
///
/// The first offending file rejects the whole selection; nothing is uploaded
/// partially. `known` is the last listed server-side name set, so the check
/// is a shortcut only. The server still answers `409` for late collisions.
pub fn validate(files: Vec<PendingFile>, known: &HashSet<String>) -> Result<UploadBatch, Rejection> {
    let mut seen: HashSet<String> = HashSet::with_capacity(files.len());
    let mut entries = Vec::with_capacity(files.len());

    for file in files {
        let sanitized_name = sanitize(&file.name);
        if sanitized_name == RESERVED_NAME {
            return Err(Rejection::ReservedName { raw: file.name });
        }
        if known.contains(&sanitized_name) {
            return Err(Rejection::NameCollision { raw: file.name, sanitized: sanitized_name });
        }
        if !seen.insert(sanitized_name.clone()) {
            return Err(Rejection::DuplicateInBatch { raw: file.name, sanitized: sanitized_name });
        }
        entries.push(BatchEntry { file, sanitized_name });
    }

    Ok(UploadBatch { entries })
}
