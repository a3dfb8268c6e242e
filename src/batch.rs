//! Batch runs: one full pipeline per input file, in input order.
//!
//! A failing file is recorded and the run moves on. Only two things stop a
//! batch before its first file: more inputs than `max_batch_files`, and a
//! backend that cannot be constructed (unknown provider, missing key).

use crate::config::GenerationConfig;
use crate::convert::{derive_output_path, generate_with_backend, resolve_backend};
use crate::error::{DeckError, ErrorKind};
use crate::output::{ExportOutcome, GenerationOutput};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// How the files of a batch are scheduled.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicy {
    /// One file at a time, in input order.
    #[default]
    Sequential,
}

/// Why one file of a batch failed.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome for one input of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub input: PathBuf,
    pub output_path: Option<PathBuf>,
    pub slide_count: usize,
    pub exports: Vec<ExportOutcome>,
    pub duration_ms: u64,
    pub failure: Option<FileFailure>,
}

impl BatchResult {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    fn from_outcome(input: &Path, outcome: Result<GenerationOutput, DeckError>, duration_ms: u64) -> Self {
        match outcome {
            Ok(out) => Self {
                input: input.to_path_buf(),
                output_path: Some(out.output_path.clone()),
                slide_count: out.slide_count(),
                exports: out.exports,
                duration_ms,
                failure: None,
            },
            Err(e) => Self {
                input: input.to_path_buf(),
                output_path: None,
                slide_count: 0,
                exports: Vec::new(),
                duration_ms,
                failure: Some(FileFailure {
                    kind: e.kind(),
                    message: e.to_string(),
                }),
            },
        }
    }
}

/// Aggregated result of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub results: Vec<BatchResult>,
    pub total_duration_ms: u64,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Failed inputs with their failure, in input order.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &FileFailure)> {
        self.results
            .iter()
            .filter_map(|r| r.failure.as_ref().map(|f| (r.input.as_path(), f)))
    }

    pub fn to_json(&self) -> Result<String, DeckError> {
        serde_json::to_string_pretty(self).map_err(|e| DeckError::Internal(format!("summary serialization: {e}")))
    }
}

/// Output path for `input` inside `output_dir`, or beside the input.
pub fn batch_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    match (output_dir, input.file_stem()) {
        (Some(dir), Some(stem)) => {
            let mut name = stem.to_os_string();
            name.push(".pptx");
            dir.join(name)
        }
        _ => derive_output_path(input, None),
    }
}

/// `candidate`, or `<stem>-N.pptx` (N from 2) when an earlier file of the
/// same batch already claimed that path.
fn claim_output_path(candidate: PathBuf, claimed: &mut HashSet<PathBuf>) -> PathBuf {
    if claimed.insert(candidate.clone()) {
        return candidate;
    }
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut n = 2usize;
    loop {
        let next = candidate.with_file_name(format!("{stem}-{n}.pptx"));
        if claimed.insert(next.clone()) {
            return next;
        }
        n += 1;
    }
}

/// Run the pipeline over every input.
///
/// # Errors
/// [`DeckError::BatchLimitExceeded`] when there are more inputs than
/// `config.max_batch_files`, or a backend construction error. Per-file
/// errors never surface here; they are in the returned summary.
pub async fn run_batch<P: AsRef<Path>>(
    inputs: &[P],
    output_dir: Option<&Path>,
    config: &GenerationConfig,
) -> Result<BatchSummary, DeckError> {
    if inputs.len() > config.max_batch_files {
        return Err(DeckError::BatchLimitExceeded {
            count: inputs.len(),
            max: config.max_batch_files,
        });
    }
    let backend = resolve_backend(config)?;
    let start = Instant::now();
    let total = inputs.len();
    info!("Batch of {} file(s), policy {:?}", total, config.execution);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut results = Vec::with_capacity(total);
    let mut claimed = HashSet::new();
    match config.execution {
        ExecutionPolicy::Sequential => {
            for (i, input) in inputs.iter().enumerate() {
                let input = input.as_ref();
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_start(i + 1, total, input);
                }
                let file_start = Instant::now();
                let out_path = claim_output_path(batch_output_path(input, output_dir), &mut claimed);
                let outcome = generate_with_backend(&backend, input, Some(out_path.as_path()), config).await;
                if let Err(ref e) = outcome {
                    warn!("[{}/{}] {} failed: {}", i + 1, total, input.display(), e);
                }
                let result = BatchResult::from_outcome(input, outcome, file_start.elapsed().as_millis() as u64);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_finish(i + 1, total, result.succeeded());
                }
                results.push(result);
            }
        }
    }

    let summary = BatchSummary {
        results,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Batch complete: {} succeeded, {} failed",
        summary.succeeded(),
        summary.failed()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(summary.succeeded(), summary.failed());
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_uses_stem() {
        assert_eq!(
            batch_output_path(Path::new("in/report.docx"), Some(Path::new("out"))),
            PathBuf::from("out/report.pptx")
        );
        assert_eq!(
            batch_output_path(Path::new("in/report.docx"), None),
            PathBuf::from("in/report.pptx")
        );
    }

    #[test]
    fn repeated_stems_get_numbered_paths() {
        let mut claimed = HashSet::new();
        let out = Some(Path::new("out"));
        let paths: Vec<_> = ["a/report.pdf", "b/report.docx", "c/report.md", "c/summary.md"]
            .iter()
            .map(|p| claim_output_path(batch_output_path(Path::new(p), out), &mut claimed))
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("out/report.pptx"),
                PathBuf::from("out/report-2.pptx"),
                PathBuf::from("out/report-3.pptx"),
                PathBuf::from("out/summary.pptx"),
            ]
        );
    }

    #[tokio::test]
    async fn too_many_inputs_fail_up_front() {
        let config = GenerationConfig::builder().max_batch_files(2).build().unwrap();
        let inputs = ["a.txt", "b.txt", "c.txt"];
        let err = run_batch(&inputs, None, &config).await.unwrap_err();
        assert!(matches!(err, DeckError::BatchLimitExceeded { count: 3, max: 2 }), "{err:?}");
    }

    #[test]
    fn summary_counts_and_json() {
        let summary = BatchSummary {
            results: vec![
                BatchResult::from_outcome(
                    Path::new("a.xyz"),
                    Err(DeckError::UnsupportedFormat {
                        path: "a.xyz".into(),
                        extension: "xyz".into(),
                    }),
                    1,
                ),
                BatchResult {
                    input: "b.md".into(),
                    output_path: Some("b.pptx".into()),
                    slide_count: 4,
                    exports: Vec::new(),
                    duration_ms: 5,
                    failure: None,
                },
            ],
            total_duration_ms: 6,
        };
        assert_eq!((summary.succeeded(), summary.failed()), (1, 1));
        let (path, failure) = summary.failures().next().unwrap();
        assert_eq!(path, Path::new("a.xyz"));
        assert_eq!(failure.kind, ErrorKind::UnsupportedFormat);
        let json = summary.to_json().unwrap();
        assert!(json.contains("\"UnsupportedFormat\""));
    }
}
