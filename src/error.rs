use std::error::Error;
use std::fmt;

use crate::validation::Rejection;

/// The primary error type for the client.
///
/// Remote failures are caught where they happen and end up either in the log
/// or in a transient notice; this enum carries them to that point.
#[derive(Debug)]
pub enum AppError {
    /// The `/config/` document could not be fetched or decoded.
    ConfigUnavailable(String),
    /// The list endpoint failed. The previous listing stays on screen.
    ListFetchFailed(String),
    /// The batch was refused before any transfer.
    ValidationRejected(Rejection),
    /// The server answered `409` for a file.
    UploadConflict { name: String },
    /// The server answered any other non-success status for a file.
    UploadFailed { name: String, status: u16 },
    /// No response at all for a file.
    UploadTransportError { name: String, message: String },
    /// Removing a file failed.
    DeleteFailed { name: String, reason: String },
    /// The server is in readonly mode and the action mutates state.
    ReadonlyMode,
    /// Local settings are invalid.
    InvalidSettings(String),
    /// For errors related to local I/O (reading upload sources).
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ConfigUnavailable(msg) => write!(f, "Server config unavailable: {}", msg),
            AppError::ListFetchFailed(msg) => write!(f, "File list fetch failed: {}", msg),
            AppError::ValidationRejected(r) => write!(f, "Upload rejected: {}", r),
            AppError::UploadConflict { name } => write!(f, "Upload conflict: {} already exists", name),
            AppError::UploadFailed { name, status } => {
                write!(f, "Upload of {} failed with HTTP {}", name, status)
            }
            AppError::UploadTransportError { name, message } => {
                write!(f, "Upload of {} failed: {}", name, message)
            }
            AppError::DeleteFailed { name, reason } => write!(f, "Delete of {} failed: {}", name, reason),
            AppError::ReadonlyMode => write!(f, "Server is in readonly mode"),
            AppError::InvalidSettings(msg) => write!(f, "Invalid settings: {}", msg),
            AppError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::ValidationRejected(r) => Some(r),
            _ => None,
        }
    }
}

impl AppError {
    /// Text shown in the transient status line for this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationRejected(r) => r.to_string(),
            AppError::UploadConflict { name } => format!("File already exists: {}", name),
            AppError::UploadFailed { name, .. } => format!("Upload failed: {}", name),
            AppError::UploadTransportError { .. } => "Network or server error during upload.".to_string(),
            AppError::DeleteFailed { .. } => "Delete failed".to_string(),
            AppError::ReadonlyMode => "Server is in readonly mode".to_string(),
            AppError::ConfigUnavailable(_) => "Server not reachable".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<Rejection> for AppError {
    fn from(r: Rejection) -> Self {
        AppError::ValidationRejected(r)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(format!("{}: {}", err.kind(), err))
    }
}

/// A type alias for `Result<T, AppError>`, used throughout the crate.
pub type AppResult<T> = Result<T, AppError>;
