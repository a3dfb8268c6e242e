//! Progress-callback trait for coarse pipeline milestones.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to be told
//! when each stage of a file starts, when a provider attempt is made, and how
//! each file of a batch ends. There is no token-level streaming.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2pptx::{GenerationConfig, GenerationProgressCallback, Stage};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl GenerationProgressCallback for Printer {
//!     fn on_stage(&self, input: &Path, stage: Stage) {
//!         eprintln!("{}: {}", input.display(), stage);
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Pipeline stage of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Prompting,
    Rendering,
    Exporting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Extracting => "extracting content",
            Stage::Prompting => "generating outline",
            Stage::Rendering => "rendering slides",
            Stage::Exporting => "exporting",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline at coarse milestones.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Calls arrive from one task at a time.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once before extraction of a file begins.
    fn on_generation_start(&self, input: &Path) {
        let _ = input;
    }

    /// Called when a file enters a new stage.
    fn on_stage(&self, input: &Path, stage: Stage) {
        let _ = (input, stage);
    }

    /// Called before each provider request.
    ///
    /// # Arguments
    /// * `attempt`      — 1-indexed attempt number
    /// * `max_attempts` — first attempt plus configured retries
    fn on_provider_attempt(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }

    /// Called when the deck for a file has been written.
    fn on_generation_complete(&self, input: &Path, slide_count: usize) {
        let _ = (input, slide_count);
    }

    /// Called when a file fails.
    fn on_generation_error(&self, input: &Path, error: &str) {
        let _ = (input, error);
    }

    /// Called once before the first file of a batch.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before each file of a batch.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position in the batch
    fn on_file_start(&self, index: usize, total_files: usize, input: &Path) {
        let _ = (index, total_files, input);
    }

    /// Called after each file of a batch, successful or not.
    fn on_file_finish(&self, index: usize, total_files: usize, succeeded: bool) {
        let _ = (index, total_files, succeeded);
    }

    /// Called once after the last file of a batch.
    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        let _ = (succeeded, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
