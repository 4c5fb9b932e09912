//! Error types shared by the scanner, the relocator and the CLI.

use crate::config::ConfigError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single file could not be moved during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveFailureReason {
    /// Insufficient permission to create the category folder or move the file.
    PermissionDenied,
    /// The file is locked or busy in another process.
    FileInUse,
    /// Any other I/O error, carrying the raw error text.
    Other(String),
}

impl fmt::Display for MoveFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::FileInUse => write!(f, "file in use by another process"),
            Self::Other(message) => write!(f, "{}", message),
        }
    }
}

/// A file that was left in place, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveFailure {
    pub file_name: String,
    pub reason: MoveFailureReason,
}

impl fmt::Display for MoveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- {}: {}", self.file_name, self.reason)
    }
}

/// Renders one line per failure.
fn render_failures(failures: &[MoveFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Error)]
pub enum SortError {
    #[error("Permission denied while reading directory: {}", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Error accessing directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not enough disk space to move '{file}' ({moved} file(s) moved before stopping)")]
    DiskFull {
        file: String,
        moved: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Some files could not be moved:\n{}", render_failures(.failures))]
    MoveFailures {
        failures: Vec<MoveFailure>,
        moved: usize,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

pub type SortResult<T> = std::result::Result<T, SortError>;

impl SortError {
    /// Maps an enumeration-time I/O error for `path` onto the fatal variants.
    pub(crate) fn from_enumeration(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MoveFailures { .. } => 2,
            Self::PermissionDenied { .. } => 3,
            Self::DiskFull { .. } => 4,
            Self::Config(_) => 5,
            Self::Usage(_) => 64,
            Self::Io { .. } | Self::Json(_) => 1,
        }
    }
}
