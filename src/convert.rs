//! Top-level generation entry points.
//!
//! [`generate`] runs extraction, the outline request, planning and rendering
//! and returns the deck in memory. [`generate_to_file`] additionally writes
//! the `.pptx` atomically and runs the requested exports. Every stage is
//! awaited in order; nothing overlaps.

use crate::config::GenerationConfig;
use crate::error::DeckError;
use crate::export;
use crate::output::{GenerationOutput, GenerationStats};
use crate::pipeline::extract::{self, SourceDocument};
use crate::pipeline::{llm, plan};
use crate::progress::Stage;
use crate::providers::{self, LLMProvider};
use crate::render::{self, Presentation};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A rendered deck that has not been written anywhere yet.
#[derive(Debug)]
pub struct GeneratedDeck {
    pub presentation: Presentation,
    pub source: SourceDocument,
    pub stats: GenerationStats,
}

/// Generate a deck for `input` without touching the output directory.
///
/// # Errors
/// Any [`DeckError`] from extraction, the provider, the outline contract or
/// rendering. Missing credentials fail before the file is read.
pub async fn generate(
    input: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GeneratedDeck, DeckError> {
    let backend = resolve_backend(config)?;
    build_deck(&backend, input.as_ref(), config).await
}

/// Generate a deck and write it to `output` (or the derived path).
///
/// The `.pptx` is written to a temporary sibling and renamed into place, so
/// a failed run never leaves a partial file. Export failures are recorded in
/// [`GenerationOutput::exports`] and do not fail the call.
pub async fn generate_to_file(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, DeckError> {
    let backend = resolve_backend(config)?;
    generate_with_backend(&backend, input.as_ref(), output, config).await
}

/// Synchronous wrapper around [`generate_to_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, DeckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DeckError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_to_file(input, output, config))
}

/// Generate a deck from in-memory document bytes.
///
/// `extension` picks the reader (`"pdf"`, `"docx"`, `"md"`, ...). The bytes
/// are written to a managed [`tempfile`] that is removed on return.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doc2pptx::{generate_from_bytes, GenerationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("minutes.docx")?;
/// let deck = generate_from_bytes(&bytes, "docx", &GenerationConfig::default()).await?;
/// std::fs::write("minutes.pptx", deck.presentation.to_pptx_bytes()?)?;
/// # Ok(())
/// # }
/// ```
pub async fn generate_from_bytes(
    bytes: &[u8],
    extension: &str,
    config: &GenerationConfig,
) -> Result<GeneratedDeck, DeckError> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut tmp = tempfile::Builder::new()
        .prefix("doc2pptx-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| DeckError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| DeckError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `generate` returns
    generate(tmp.path(), config).await
}

/// The backend a run will use: the injected one, else the named provider.
pub fn resolve_backend(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, DeckError> {
    if let Some(ref backend) = config.provider {
        return Ok(Arc::clone(backend));
    }
    providers::create_backend(config)
}

/// `explicit` with a `.pptx` suffix, or `input` with its extension replaced.
pub fn derive_output_path(input: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => {
            let is_pptx = p
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pptx"));
            if is_pptx {
                p.to_path_buf()
            } else {
                let mut s = p.as_os_str().to_os_string();
                s.push(".pptx");
                PathBuf::from(s)
            }
        }
        None => input.with_extension("pptx"),
    }
}

/// Full pipeline for one file with an already resolved backend.
pub(crate) async fn generate_with_backend(
    backend: &Arc<dyn LLMProvider>,
    input: &Path,
    output: Option<&Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, DeckError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(input);
    }
    let result = write_deck(backend, input, output, config).await;
    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(out) => cb.on_generation_complete(input, out.slide_count()),
            Err(e) => cb.on_generation_error(input, &e.to_string()),
        }
    }
    result
}

async fn write_deck(
    backend: &Arc<dyn LLMProvider>,
    input: &Path,
    output: Option<&Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, DeckError> {
    let total_start = Instant::now();
    let GeneratedDeck {
        presentation,
        source,
        mut stats,
    } = build_deck(backend, input, config).await?;

    // ── Step 5: Write the deck ───────────────────────────────────────────
    let output_path = derive_output_path(input, output);
    let bytes = presentation.to_pptx_bytes()?;
    write_atomic(&output_path, &bytes).await?;
    info!(
        "Wrote {} ({} slides, {} bytes)",
        output_path.display(),
        presentation.len(),
        bytes.len()
    );

    // ── Step 6: Secondary exports ────────────────────────────────────────
    let exports = if config.exports.is_empty() {
        Vec::new()
    } else {
        notify_stage(config, input, Stage::Exporting);
        export::run_exports(&presentation, &output_path, &config.exports, &config.pdf_converter).await
    };

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(GenerationOutput {
        input: input.to_path_buf(),
        format: source.format,
        title: presentation.title().to_string(),
        output_path,
        slide_kinds: presentation.slide_kinds(),
        exports,
        stats,
    })
}

async fn build_deck(
    backend: &Arc<dyn LLMProvider>,
    input: &Path,
    config: &GenerationConfig,
) -> Result<GeneratedDeck, DeckError> {
    let total_start = Instant::now();
    let theme = config.resolved_theme()?;
    info!("Generating deck for {}", input.display());

    // ── Step 1: Extract ──────────────────────────────────────────────────
    notify_stage(config, input, Stage::Extracting);
    let source = extract::extract(input, config).await?;
    debug!(
        "{}: {} chars ({} original), {} asset(s)",
        source.file_name(),
        source.text.chars().count(),
        source.original_chars,
        source.assets.len()
    );

    // ── Step 2: Outline ──────────────────────────────────────────────────
    notify_stage(config, input, Stage::Prompting);
    let response = llm::generate_outline(backend, &source.text, &source.file_name(), config).await?;

    // ── Step 3: Plan ─────────────────────────────────────────────────────
    notify_stage(config, input, Stage::Rendering);
    let render_start = Instant::now();
    let specs = plan::plan_deck(&response.outline, &source.assets, config);

    // ── Step 4: Render ───────────────────────────────────────────────────
    let presentation = render::render_deck(response.outline.title(), specs, theme)?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let kinds = presentation.slide_kinds();
    let stats = GenerationStats {
        provider: providers::backend_label(config, backend.as_ref()),
        model: backend.model().to_string(),
        attempts: response.attempts,
        source_chars: source.original_chars,
        prompt_chars: source.text.chars().count(),
        truncated: source.truncated,
        input_tokens: response.input_tokens,
        output_tokens: response.output_tokens,
        images_used: kinds.iter().filter(|k| **k == crate::outline::SlideKind::Image).count(),
        tables_used: source.tables().count(),
        llm_duration_ms: response.duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    Ok(GeneratedDeck {
        presentation,
        source,
        stats,
    })
}

fn notify_stage(config: &GenerationConfig, input: &Path, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage(input, stage);
    }
}

/// Write `bytes` to a temporary sibling of `path`, then rename it into place.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DeckError> {
    let write_err = |e: std::io::Error| DeckError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pptx.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_derivation() {
        assert_eq!(
            derive_output_path(Path::new("docs/report.pdf"), None),
            PathBuf::from("docs/report.pptx")
        );
        assert_eq!(
            derive_output_path(Path::new("a.md"), Some(Path::new("out/deck"))),
            PathBuf::from("out/deck.pptx")
        );
        assert_eq!(
            derive_output_path(Path::new("a.md"), Some(Path::new("deck.PPTX"))),
            PathBuf::from("deck.PPTX")
        );
        assert_eq!(
            derive_output_path(Path::new("a.md"), Some(Path::new("deck.v2"))),
            PathBuf::from("deck.v2.pptx")
        );
    }

    #[tokio::test]
    async fn atomic_write_creates_parent_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deck.pptx");
        write_atomic(&path, b"PK").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"PK");
        assert!(!dir.path().join("nested/deck.pptx.tmp").exists());
    }

    #[test]
    fn unknown_provider_is_rejected_before_reading() {
        let config = GenerationConfig::builder().provider_name("nope").build();
        match config {
            Err(DeckError::UnknownProvider { .. }) => {}
            Ok(config) => {
                let err = resolve_backend(&config).err().unwrap();
                assert!(matches!(err, DeckError::UnknownProvider { .. }), "{err:?}");
            }
            Err(other) => panic!("unexpected {other:?}"),
        }
    }
}
