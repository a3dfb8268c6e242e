//! Result types returned by the generation entry points.

use crate::error::ExportError;
use crate::export::ExportFormat;
use crate::outline::SlideKind;
use crate::pipeline::input::SourceFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of one requested secondary export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub format: ExportFormat,
    /// Written file, when the export succeeded.
    pub path: Option<PathBuf>,
    pub error: Option<ExportError>,
}

impl ExportOutcome {
    pub fn from_result(format: ExportFormat, result: Result<PathBuf, ExportError>) -> Self {
        match result {
            Ok(path) => Self {
                format,
                path: Some(path),
                error: None,
            },
            Err(e) => Self {
                format,
                path: None,
                error: Some(e),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Counters and timings for one generated deck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Backend name, e.g. `"deepseek"`.
    pub provider: String,
    pub model: String,
    /// Provider attempts including the successful one.
    pub attempts: u32,
    /// Characters in the extracted text before truncation.
    pub source_chars: usize,
    /// Characters actually sent in the prompt.
    pub prompt_chars: usize,
    pub truncated: bool,
    /// Token usage as reported by the provider.
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub images_used: usize,
    pub tables_used: usize,
    pub llm_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// A `.pptx` written to disk, plus any secondary exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub input: PathBuf,
    pub format: SourceFormat,
    /// Deck title taken from the outline.
    pub title: String,
    pub output_path: PathBuf,
    /// Variant of every slide, in deck order.
    pub slide_kinds: Vec<SlideKind>,
    pub exports: Vec<ExportOutcome>,
    pub stats: GenerationStats,
}

impl GenerationOutput {
    pub fn slide_count(&self) -> usize {
        self.slide_kinds.len()
    }

    /// Requested exports that did not produce a file.
    pub fn failed_exports(&self) -> impl Iterator<Item = &ExportOutcome> {
        self.exports.iter().filter(|e| !e.succeeded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_outcome_from_result() {
        let ok = ExportOutcome::from_result(ExportFormat::Html, Ok(PathBuf::from("a.html")));
        assert!(ok.succeeded());
        let err = ExportOutcome::from_result(
            ExportFormat::Pdf,
            Err(ExportError::Unavailable {
                format: "pdf".into(),
                detail: "no soffice".into(),
            }),
        );
        assert!(!err.succeeded());
        assert!(err.path.is_none());
    }

    #[test]
    fn output_serializes_kinds_and_exports() {
        let out = GenerationOutput {
            input: "notes.md".into(),
            format: SourceFormat::Markdown,
            title: "Notes".into(),
            output_path: "notes.pptx".into(),
            slide_kinds: vec![SlideKind::Title, SlideKind::ThankYou],
            exports: vec![ExportOutcome::from_result(
                ExportFormat::Pdf,
                Err(ExportError::Failed {
                    format: "pdf".into(),
                    detail: "exit 1".into(),
                }),
            )],
            stats: GenerationStats::default(),
        };
        assert_eq!(out.slide_count(), 2);
        assert_eq!(out.failed_exports().count(), 1);
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("\"thank_you\""));
        assert!(json.contains("\"pdf\""));
    }
}
