#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::io;

    use crate::error::AppError;
    use crate::validation::Rejection;

    #[test]
    fn test_display() {
        let err = AppError::UploadFailed { name: "a.txt".into(), status: 500 };
        assert_eq!(err.to_string(), "Upload of a.txt failed with HTTP 500");

        let err = AppError::ListFetchFailed("HTTP 502".into());
        assert_eq!(err.to_string(), "File list fetch failed: HTTP 502");

        let err = AppError::ValidationRejected(Rejection::ReservedName { raw: ".upload".into() });
        assert_eq!(err.to_string(), "Upload rejected: Invalid filename: .upload");
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AppError::UploadConflict { name: "a.txt".into() }.user_message(),
            "File already exists: a.txt"
        );
        assert_eq!(AppError::UploadFailed { name: "a.txt".into(), status: 403 }.user_message(), "Upload failed: a.txt");
        assert_eq!(
            AppError::UploadTransportError { name: "a.txt".into(), message: "reset".into() }.user_message(),
            "Network or server error during upload."
        );
        assert_eq!(
            AppError::DeleteFailed { name: "a.txt".into(), reason: "HTTP 404".into() }.user_message(),
            "Delete failed"
        );
        assert_eq!(AppError::ConfigUnavailable("timeout".into()).user_message(), "Server not reachable");
        assert_eq!(
            AppError::from(Rejection::DuplicateInBatch { raw: "a.txt".into(), sanitized: "a.txt".into() })
                .user_message(),
            "Duplicate file in selection: a.txt"
        );
    }

    #[test]
    fn test_conversions_and_source() {
        let err = AppError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, AppError::IoError(ref msg) if msg.contains("gone")));
        assert!(err.source().is_none());

        let err = AppError::InvalidSettings("server.config_path must not be empty".into());
        assert_eq!(err.to_string(), "Invalid settings: server.config_path must not be empty");
        assert!(err.source().is_none());

        let err = AppError::from(Rejection::ReservedName { raw: ".upload".into() });
        assert!(err.source().is_some());
    }
}
