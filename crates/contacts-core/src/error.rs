//! Error handling
//!
//! Provides typed errors for the address book, the vCard codec and the
//! editor round trip, with descriptive messages and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or persisting contacts
#[derive(Error, Debug)]
pub enum StoreError {
    /// File or directory not found (when expected to exist)
    #[error("Not found: '{path}'")]
    NotFound { path: PathBuf },

    /// The address book path exists but is not a directory
    #[error("Not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read file or directory
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write or remove file
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A card file could not be decoded
    #[error("Invalid vCard in '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// A query matched no contacts
    #[error("No match for '{query}'")]
    NoMatch { query: String },
}

impl StoreError {
    /// Create an error from a failed read with path context
    ///
    /// Classifies the error based on its kind (permission, missing, ...).
    pub fn from_read(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StoreError::NotFound { path },
            _ => StoreError::ReadError {
                path,
                source: error,
            },
        }
    }

    /// Create an error from a failed write with path context
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StoreError::NotFound { path },
            // StorageFull is not stable on all toolchains, check the message too
            _ if is_disk_full_error(&error) => StoreError::DiskFull {
                path,
                source: error,
            },
            _ => StoreError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Check if this error is recoverable by the user
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::DiskFull { .. }
                | StoreError::PermissionDenied { .. }
                | StoreError::Decode { .. }
                | StoreError::NoMatch { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::DiskFull { .. } => Some("Free up disk space and try again."),
            StoreError::PermissionDenied { .. } => {
                Some("Check file and directory permissions of the address book.")
            }
            StoreError::NotADirectory { .. } => {
                Some("Point 'addressbook' in the configuration to a directory.")
            }
            StoreError::Decode { .. } => {
                Some("Fix or move the broken card file; no contacts are listed until then.")
            }
            StoreError::NoMatch { .. } => Some("Try a shorter search term or fewer categories."),
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from decoding a vCard
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("card is not valid UTF-8")]
    InvalidUtf8,

    #[error("missing BEGIN:VCARD")]
    MissingBegin,

    #[error("missing END:VCARD")]
    MissingEnd,

    #[error("malformed content line {line}: '{content}'")]
    MalformedLine { line: usize, content: String },
}

/// Errors from the editor round trip
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Failed to create temp file: {0}")]
    TempFile(#[source] io::Error),

    #[error("Failed to write temp file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Editor failed: {0}")]
    Editor(#[source] io::Error),

    #[error("Failed to read edited file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
