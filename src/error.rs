//! Error types for the edgequake-doc2pptx library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`DeckError`]: **Fatal** for one input file. Extraction, the LLM call,
//!   outline validation or rendering failed, so no deck is written for that
//!   file. Returned as `Err(DeckError)` from the top-level `generate*`
//!   functions and recorded per file by the batch coordinator.
//!
//! * [`ExportError`]: **Non-fatal**. The PPTX is already on disk; only a
//!   secondary PDF/HTML artifact could not be produced. Stored inside
//!   [`crate::output::ExportOutcome`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doc2pptx library.
#[derive(Debug, Error)]
pub enum DeckError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The file extension is not one of the recognized source formats.
    #[error("Unsupported format '{extension}' for '{path}'\nRun with --formats to list supported extensions.")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Input file exceeds the configured size ceiling.
    #[error("Input file '{path}' is too large: {size_mb:.1} MB (max: {max_mb} MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: f64,
        max_mb: u64,
    },

    /// The file exists but could not be read or parsed.
    #[error("Failed to read '{path}': {detail}")]
    ReadError { path: PathBuf, detail: String },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The provider is missing credentials or a required endpoint.
    #[error("Provider '{provider}' is not configured.\n{hint}")]
    ConfigurationError { provider: String, hint: String },

    /// No backend is registered under the requested name.
    #[error("Unknown provider '{name}'\nAvailable: {available}")]
    UnknownProvider { name: String, available: String },

    /// The provider call failed permanently or exhausted its retries.
    #[error("Provider '{provider}' failed after {attempts} attempt(s): {detail}")]
    ProviderError {
        provider: String,
        attempts: u32,
        detail: String,
    },

    /// The model answered, but not with a valid outline.
    #[error("Model response is not a valid outline: {detail}\nResponse preview: {preview}")]
    OutlineParseError { detail: String, preview: String },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// No theme is registered under the requested name.
    #[error("Unknown theme '{name}'\nAvailable: {available}")]
    UnknownTheme { name: String, available: String },

    /// A slide payload could not be laid out.
    #[error("Failed to render slide {slide} ('{title}'): {detail}")]
    RenderError {
        slide: usize,
        title: String,
        detail: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output presentation.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A batch was given more inputs than the configured ceiling.
    #[error("Batch of {count} files exceeds the limit of {max}\nSplit the input list or raise max_batch_files.")]
    BatchLimitExceeded { count: usize, max: usize },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeckError {
    /// The taxonomy tag for this error, as recorded in batch summaries.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeckError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            DeckError::FileNotFound { .. }
            | DeckError::FileTooLarge { .. }
            | DeckError::ReadError { .. } => ErrorKind::ReadError,
            DeckError::ConfigurationError { .. } | DeckError::UnknownProvider { .. } => {
                ErrorKind::ConfigurationError
            }
            DeckError::ProviderError { .. } => ErrorKind::ProviderError,
            DeckError::OutlineParseError { .. } => ErrorKind::OutlineParseError,
            DeckError::UnknownTheme { .. } | DeckError::RenderError { .. } => {
                ErrorKind::RenderError
            }
            DeckError::OutputWriteFailed { .. } => ErrorKind::WriteError,
            DeckError::InvalidConfig(_) | DeckError::BatchLimitExceeded { .. } => {
                ErrorKind::InvalidConfig
            }
            DeckError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Stable, serializable error category.
///
/// `Display` prints the category name, e.g. `UnsupportedFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnsupportedFormat,
    ReadError,
    ConfigurationError,
    ProviderError,
    OutlineParseError,
    RenderError,
    ExportUnavailable,
    WriteError,
    InvalidConfig,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A non-fatal failure producing a secondary artifact.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum ExportError {
    /// The external dependency for this format is not installed.
    #[error("{format} export unavailable: {detail}")]
    Unavailable { format: String, detail: String },

    /// The export ran but did not produce a file.
    #[error("{format} export failed: {detail}")]
    Failed { format: String, detail: String },
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::Unavailable { .. } => ErrorKind::ExportUnavailable,
            ExportError::Failed { .. } => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = DeckError::UnsupportedFormat {
            path: PathBuf::from("notes.xyz"),
            extension: ".xyz".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".xyz"), "got: {msg}");
        assert!(msg.contains("--formats"));
    }

    #[test]
    fn kind_names_match_taxonomy() {
        let e = DeckError::UnsupportedFormat {
            path: PathBuf::from("a.bin"),
            extension: ".bin".into(),
        };
        assert_eq!(e.kind().to_string(), "UnsupportedFormat");

        let e = DeckError::FileTooLarge {
            path: PathBuf::from("big.pdf"),
            size_mb: 80.0,
            max_mb: 50,
        };
        assert_eq!(e.kind(), ErrorKind::ReadError);

        let e = DeckError::OutlineParseError {
            detail: "expected value".into(),
            preview: "hello".into(),
        };
        assert_eq!(e.kind().to_string(), "OutlineParseError");
    }

    #[test]
    fn configuration_error_carries_hint() {
        let e = DeckError::ConfigurationError {
            provider: "deepseek".into(),
            hint: "Set DEEPSEEK_API_KEY".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("deepseek"));
        assert!(msg.contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn batch_limit_display() {
        let e = DeckError::BatchLimitExceeded { count: 60, max: 50 };
        assert!(e.to_string().contains("60"));
        assert!(e.to_string().contains("50"));
    }

    #[test]
    fn export_unavailable_kind() {
        let e = ExportError::Unavailable {
            format: "pdf".into(),
            detail: "soffice not found".into(),
        };
        assert_eq!(e.kind(), ErrorKind::ExportUnavailable);
        assert!(e.to_string().contains("soffice"));
    }
}
