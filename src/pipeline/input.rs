//! Input validation: map a path to a source format before anything is read.
//!
//! The extension decides the reader, so an unrecognized extension fails with
//! `UnsupportedFormat` even when the file exists. Existence, permission and
//! size are checked next so readers only ever see files they can open.

use crate::error::DeckError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Recognized source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Text,
    Markdown,
    Python,
    Json,
    Csv,
    Xml,
    Html,
    Pdf,
    Docx,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 9] = [
        SourceFormat::Text,
        SourceFormat::Markdown,
        SourceFormat::Python,
        SourceFormat::Json,
        SourceFormat::Csv,
        SourceFormat::Xml,
        SourceFormat::Html,
        SourceFormat::Pdf,
        SourceFormat::Docx,
    ];

    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let format = match ext.as_str() {
            "txt" => SourceFormat::Text,
            "md" | "markdown" => SourceFormat::Markdown,
            "py" => SourceFormat::Python,
            "json" => SourceFormat::Json,
            "csv" => SourceFormat::Csv,
            "xml" => SourceFormat::Xml,
            "html" | "htm" => SourceFormat::Html,
            "pdf" => SourceFormat::Pdf,
            "docx" => SourceFormat::Docx,
            _ => return None,
        };
        Some(format)
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            SourceFormat::Text => &[".txt"],
            SourceFormat::Markdown => &[".md", ".markdown"],
            SourceFormat::Python => &[".py"],
            SourceFormat::Json => &[".json"],
            SourceFormat::Csv => &[".csv"],
            SourceFormat::Xml => &[".xml"],
            SourceFormat::Html => &[".html", ".htm"],
            SourceFormat::Pdf => &[".pdf"],
            SourceFormat::Docx => &[".docx"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SourceFormat::Text => "Plain text",
            SourceFormat::Markdown => "Markdown document",
            SourceFormat::Python => "Python source code",
            SourceFormat::Json => "JSON data (pretty-printed)",
            SourceFormat::Csv => "CSV table (also charted)",
            SourceFormat::Xml => "XML document (flattened)",
            SourceFormat::Html => "HTML page (tags stripped)",
            SourceFormat::Pdf => "PDF document (text and images)",
            SourceFormat::Docx => "Word document (text, tables, images)",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceFormat::Text => "text",
            SourceFormat::Markdown => "markdown",
            SourceFormat::Python => "python",
            SourceFormat::Json => "json",
            SourceFormat::Csv => "csv",
            SourceFormat::Xml => "xml",
            SourceFormat::Html => "html",
            SourceFormat::Pdf => "pdf",
            SourceFormat::Docx => "docx",
        };
        f.write_str(s)
    }
}

/// `(extension, description)` rows for `--formats`.
pub fn list_formats() -> Vec<(&'static str, &'static str)> {
    SourceFormat::ALL
        .iter()
        .flat_map(|f| f.extensions().iter().map(move |ext| (*ext, f.description())))
        .collect()
}

/// Validate a local input and detect its format.
pub fn resolve_local(path: &Path, max_file_size_mb: u64) -> Result<SourceFormat, DeckError> {
    let format = SourceFormat::from_path(path).ok_or_else(|| DeckError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_else(|| "(none)".to_string()),
    })?;

    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DeckError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(DeckError::ReadError {
                path: path.to_path_buf(),
                detail: e.to_string(),
            });
        }
    };

    if !metadata.is_file() {
        return Err(DeckError::ReadError {
            path: path.to_path_buf(),
            detail: "not a regular file".into(),
        });
    }

    let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
    if size_mb > max_file_size_mb as f64 {
        return Err(DeckError::FileTooLarge {
            path: path.to_path_buf(),
            size_mb,
            max_mb: max_file_size_mb,
        });
    }

    if let Err(e) = std::fs::File::open(path) {
        return Err(DeckError::ReadError {
            path: path.to_path_buf(),
            detail: e.to_string(),
        });
    }

    debug!("Resolved {} input: {}", format, path.display());
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_formats_case_insensitively() {
        assert_eq!(SourceFormat::from_path(Path::new("a.PDF")), Some(SourceFormat::Pdf));
        assert_eq!(SourceFormat::from_path(Path::new("x/y.Md")), Some(SourceFormat::Markdown));
        assert_eq!(SourceFormat::from_path(Path::new("page.htm")), Some(SourceFormat::Html));
        assert_eq!(SourceFormat::from_path(Path::new("data.xlsx")), None);
        assert_eq!(SourceFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn unsupported_extension_wins_over_missing_file() {
        let err = resolve_local(Path::new("/definitely/missing.xyz"), 50).unwrap_err();
        assert!(matches!(err, DeckError::UnsupportedFormat { ref extension, .. } if extension == ".xyz"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_local(Path::new("/definitely/missing.txt"), 50).unwrap_err();
        assert!(matches!(err, DeckError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("folder.md");
        std::fs::create_dir(&path).unwrap();
        let err = resolve_local(&path, 50).unwrap_err();
        assert!(matches!(err, DeckError::ReadError { .. }));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, vec![b'a'; 2 * 1024 * 1024]).unwrap();
        let err = resolve_local(&path, 1).unwrap_err();
        assert!(matches!(err, DeckError::FileTooLarge { max_mb: 1, .. }));
    }

    #[test]
    fn format_listing_covers_every_extension() {
        let exts: Vec<_> = list_formats().into_iter().map(|(e, _)| e).collect();
        for e in [".txt", ".md", ".py", ".json", ".csv", ".xml", ".html", ".pdf", ".docx"] {
            assert!(exts.contains(&e), "missing {e}");
        }
    }
}
