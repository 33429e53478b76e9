//! Error types for the APK inspector.
//!
//! Every variant except [`InspectError::Usage`] is a soft failure: the
//! inspector absorbs it at the strategy boundary, logs it, and moves on to
//! the next strategy. Only usage errors reach the process boundary.

use std::time::Duration;

use thiserror::Error;

/// Message used when no APK path was supplied.
pub const MISSING_PATH_MESSAGE: &str = "APK path required";

/// Message used when the supplied APK path does not name an existing file.
pub const FILE_NOT_FOUND_MESSAGE: &str = "APK file not found";

/// Primary error type for the APK inspector.
#[derive(Debug, Error)]
pub enum InspectError {
    /// Invalid invocation: missing path or nonexistent file.
    #[error("{message}")]
    Usage { message: String },

    /// IO error during file or subprocess operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The badging tool could not be located.
    #[error("Badging tool not found: {tool}")]
    ToolUnavailable { tool: String },

    /// The badging tool ran but exited unsuccessfully or produced no output.
    #[error("Badging tool {tool} failed: {reason}")]
    ToolFailed { tool: String, reason: String },

    /// The badging tool did not finish within the configured timeout.
    #[error("Badging tool {tool} timed out after {timeout:?}")]
    ToolTimedOut { tool: String, timeout: Duration },

    /// The input is not a readable ZIP container.
    #[error("Archive unreadable: {0}")]
    ArchiveUnreadable(#[from] zip::result::ZipError),

    /// The archive has no manifest entry.
    #[error("Archive has no {entry} entry")]
    EntryMissing { entry: String },

    /// The manifest entry exceeds the configured size cap.
    #[error("Manifest entry too large: {size} bytes exceeds limit of {limit}")]
    ManifestTooLarge { size: u64, limit: u64 },

    /// No binary XML decoder is available in this configuration.
    #[error("Binary XML decoder unavailable")]
    DecoderUnavailable,

    /// The binary XML document is structurally invalid.
    #[error("Binary XML decode error at offset {offset}: {message}")]
    Decode { offset: usize, message: String },

    /// Truncated data when reading.
    #[error("Truncated data at offset {offset}: expected {expected} bytes, got {actual}")]
    TruncatedData {
        offset: usize,
        expected: usize,
        actual: usize,
    },
}

impl InspectError {
    /// Build a usage error with the given message.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Build a decode error at the given offset.
    pub fn decode(offset: usize, message: impl Into<String>) -> Self {
        Self::Decode {
            offset,
            message: message.into(),
        }
    }

    /// Whether this error belongs at the process boundary.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }
}

/// Result type alias for inspector operations.
pub type Result<T> = std::result::Result<T, InspectError>;
