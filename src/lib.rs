//! # edgequake-doc2pptx
//!
//! Turn documents into PowerPoint decks using an LLM-generated outline.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document (.txt .md .py .json .csv .xml .html .pdf .docx)
//!  │
//!  ├─ 1. Extract   text + tables + images (PDF/DOCX on spawn_blocking)
//!  ├─ 2. Outline   one LLM call, JSON contract, bounded retry with backoff
//!  ├─ 3. Plan      ordered rule classifier picks each slide's variant
//!  ├─ 4. Render    themed OOXML slides, native charts, notes
//!  ├─ 5. Write     .pptx via temp file + rename
//!  └─ 6. Export    optional PDF (office converter) / self-contained HTML
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2pptx::{generate_to_file, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads DEEPSEEK_API_KEY
//!     let config = GenerationConfig::builder()
//!         .provider_name("deepseek")
//!         .theme("modern")
//!         .build()?;
//!     let out = generate_to_file("report.pdf", None, &config).await?;
//!     println!("{} slides → {}", out.slide_count(), out.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Providers
//!
//! | Name | Default model | Credential |
//! |------|---------------|------------|
//! | `deepseek`  | `deepseek-chat` | `DEEPSEEK_API_KEY` |
//! | `openai`    | `gpt-4o` | `OPENAI_API_KEY` |
//! | `anthropic` | `claude-3-5-sonnet-20241022` | `ANTHROPIC_API_KEY` |
//! | `ollama`    | `llama3.1` | local endpoint (`OLLAMA_HOST`) |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2pptx` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ```toml
//! edgequake-doc2pptx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod classify;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod outline;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod providers;
pub mod render;
pub mod theme;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{run_batch, BatchResult, BatchSummary, ExecutionPolicy, FileFailure};
pub use classify::classify;
pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use convert::{
    derive_output_path, generate, generate_from_bytes, generate_sync, generate_to_file, GeneratedDeck,
};
pub use error::{DeckError, ErrorKind, ExportError};
pub use export::ExportFormat;
pub use outline::{SlideKind, SlideSpec};
pub use output::{ExportOutcome, GenerationOutput, GenerationStats};
pub use pipeline::extract::{extract, SourceDocument};
pub use pipeline::input::{list_formats, SourceFormat};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use providers::{list_providers, LLMProvider};
pub use render::{render_deck, Presentation};
pub use theme::{list_themes, Theme};
