//! Error types module
//!
//! Every way an upload can fail is a variant of [`UploadError`]. Client-caused
//! failures carry the message that is shown to the uploader verbatim; server-caused
//! failures carry the underlying I/O error, which is logged but never sent back.

use std::io;

use serde::Serialize;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected uploads worth noticing
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details must stay server-side
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Flat classification of [`UploadError`], used for metrics and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    NoFileUploaded,
    EmptyName,
    NameTooLong,
    ForbiddenCharacters,
    ReservedName,
    PathTraversal,
    FileTooLarge,
    FileTooSmall,
    UnsupportedType,
    InvalidDeclaredType,
    ContentTypeMismatch,
    ExtensionContentMismatch,
    HashingFailed,
    FailedToCreateDirectory,
    FailedToSaveFile,
    UnexpectedIOError,
}

impl ErrorKind {
    /// Client-caused kinds are rejected with 400 before any disk I/O happens.
    pub fn is_client_error(self) -> bool {
        !matches!(
            self,
            ErrorKind::HashingFailed
                | ErrorKind::FailedToCreateDirectory
                | ErrorKind::FailedToSaveFile
                | ErrorKind::UnexpectedIOError
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded.")]
    NoFileUploaded,

    #[error("File must have a name.")]
    EmptyName,

    #[error("Filename is too long.")]
    NameTooLong { length: usize, max: usize },

    #[error("Filename contains forbidden characters.")]
    ForbiddenCharacters,

    #[error("Filename is reserved by the system.")]
    ReservedName { stem: String },

    #[error("Invalid filename path.")]
    PathTraversal,

    #[error("File size exceeds maximum allowed size of {limit_mb:.1}MB.")]
    FileTooLarge { size: u64, limit_mb: f64 },

    #[error("File is too small or empty.")]
    FileTooSmall { size: u64, min: u64 },

    #[error("File type not supported. Allowed types: {allowed}")]
    UnsupportedType { extension: String, allowed: String },

    #[error("Invalid file content type.")]
    InvalidDeclaredType { content_type: String },

    #[error("File content does not match allowed types.")]
    ContentTypeMismatch { detected: String },

    #[error("File extension does not match file content.")]
    ExtensionContentMismatch { detected: String, extension: String },

    #[error("Failed to hash uploaded content: {0}")]
    HashingFailed(#[source] io::Error),

    #[error("Failed to create upload directory {path}: {source}")]
    FailedToCreateDirectory {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FailedToSaveFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Unexpected I/O error: {0}")]
    UnexpectedIo(#[source] io::Error),
}

impl UploadError {
    /// Build a `FileTooLarge` error; the message reports the configured limit in MB.
    pub fn file_too_large(size: u64, max_bytes: u64) -> Self {
        UploadError::FileTooLarge {
            size,
            limit_mb: max_bytes as f64 / (1024.0 * 1024.0),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::NoFileUploaded => ErrorKind::NoFileUploaded,
            UploadError::EmptyName => ErrorKind::EmptyName,
            UploadError::NameTooLong { .. } => ErrorKind::NameTooLong,
            UploadError::ForbiddenCharacters => ErrorKind::ForbiddenCharacters,
            UploadError::ReservedName { .. } => ErrorKind::ReservedName,
            UploadError::PathTraversal => ErrorKind::PathTraversal,
            UploadError::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            UploadError::FileTooSmall { .. } => ErrorKind::FileTooSmall,
            UploadError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            UploadError::InvalidDeclaredType { .. } => ErrorKind::InvalidDeclaredType,
            UploadError::ContentTypeMismatch { .. } => ErrorKind::ContentTypeMismatch,
            UploadError::ExtensionContentMismatch { .. } => ErrorKind::ExtensionContentMismatch,
            UploadError::HashingFailed(_) => ErrorKind::HashingFailed,
            UploadError::FailedToCreateDirectory { .. } => ErrorKind::FailedToCreateDirectory,
            UploadError::FailedToSaveFile { .. } => ErrorKind::FailedToSaveFile,
            UploadError::UnexpectedIo(_) => ErrorKind::UnexpectedIOError,
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();
        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl From<io::Error> for UploadError {
    fn from(err: io::Error) -> Self {
        UploadError::UnexpectedIo(err)
    }
}

/// Static metadata for each kind: (http_status, error_code, sensitive, log_level).
fn static_metadata(kind: ErrorKind) -> (u16, &'static str, bool, LogLevel) {
    match kind {
        ErrorKind::NoFileUploaded => (400, "NO_FILE_UPLOADED", false, LogLevel::Warn),
        ErrorKind::EmptyName => (400, "EMPTY_NAME", false, LogLevel::Warn),
        ErrorKind::NameTooLong => (400, "NAME_TOO_LONG", false, LogLevel::Warn),
        ErrorKind::ForbiddenCharacters => (400, "FORBIDDEN_CHARACTERS", false, LogLevel::Warn),
        ErrorKind::ReservedName => (400, "RESERVED_NAME", false, LogLevel::Warn),
        ErrorKind::PathTraversal => (400, "PATH_TRAVERSAL", false, LogLevel::Warn),
        ErrorKind::FileTooLarge => (400, "FILE_TOO_LARGE", false, LogLevel::Warn),
        ErrorKind::FileTooSmall => (400, "FILE_TOO_SMALL", false, LogLevel::Warn),
        ErrorKind::UnsupportedType => (400, "UNSUPPORTED_TYPE", false, LogLevel::Warn),
        ErrorKind::InvalidDeclaredType => (400, "INVALID_DECLARED_TYPE", false, LogLevel::Warn),
        ErrorKind::ContentTypeMismatch => (400, "CONTENT_TYPE_MISMATCH", false, LogLevel::Warn),
        ErrorKind::ExtensionContentMismatch => {
            (400, "EXTENSION_CONTENT_MISMATCH", false, LogLevel::Warn)
        }
        ErrorKind::HashingFailed => (500, "HASHING_FAILED", true, LogLevel::Error),
        ErrorKind::FailedToCreateDirectory => {
            (500, "FAILED_TO_CREATE_DIRECTORY", true, LogLevel::Error)
        }
        ErrorKind::FailedToSaveFile => (500, "FAILED_TO_SAVE_FILE", true, LogLevel::Error),
        ErrorKind::UnexpectedIOError => (500, "UNEXPECTED_IO_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for UploadError {
    fn http_status_code(&self) -> u16 {
        static_metadata(self.kind()).0
    }

    fn error_code(&self) -> &'static str {
        static_metadata(self.kind()).1
    }

    fn is_sensitive(&self) -> bool {
        static_metadata(self.kind()).2
    }

    fn log_level(&self) -> LogLevel {
        static_metadata(self.kind()).3
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::HashingFailed(_) => "Failed to process uploaded file.".to_string(),
            UploadError::FailedToCreateDirectory { .. } => {
                "Failed to create upload directory.".to_string()
            }
            UploadError::FailedToSaveFile { .. } => "Failed to save uploaded file.".to_string(),
            UploadError::UnexpectedIo(_) => "An unexpected error occurred.".to_string(),
            other => other.to_string(),
        }
    }
}
