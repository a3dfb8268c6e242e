//! Configuration types for document-to-deck generation.
//!
//! All behaviour is controlled through [`GenerationConfig`], built via its
//! [`GenerationConfigBuilder`]. One struct is shared by single-file runs and
//! by every file of a batch, so a batch never mixes themes or providers.

use crate::batch::ExecutionPolicy;
use crate::error::DeckError;
use crate::export::ExportFormat;
use crate::progress::ProgressCallback;
use crate::providers::{LLMProvider, ProviderKind};
use crate::theme::{self, Theme};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_PROVIDER: &str = "deepseek";

/// Configuration for a generation run.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2pptx::{ExportFormat, GenerationConfig};
///
/// let config = GenerationConfig::builder()
///     .provider_name("anthropic")
///     .theme("modern")
///     .export(ExportFormat::Html)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Backend factory key. Default: `"deepseek"`.
    pub provider_name: String,

    /// Pre-constructed backend. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Model override; `None` uses the backend's default model.
    pub model: Option<String>,

    /// Ollama endpoint; `None` falls back to `OLLAMA_HOST`, then localhost.
    pub ollama_url: Option<String>,

    /// Theme name. Default: `"professional"`.
    pub theme: String,

    /// Characters of extracted text sent to the model. Default: 100 000.
    ///
    /// Longer text is cut and marked as truncated; it is never rejected.
    pub max_input_chars: usize,

    /// Input files larger than this are refused with `FileTooLarge`. Default: 50.
    pub max_file_size_mb: u64,

    /// Pull raster images out of PDF and DOCX sources. Default: true.
    pub extract_images: bool,

    /// Upper bound on image slides per deck. Default: 20.
    pub max_images: usize,

    /// Images narrower or shorter than this (pixels) are dropped. Default: 100.
    pub min_image_px: u32,

    /// Body rows rendered per table slide. Default: 12.
    pub table_max_rows: usize,

    /// Categories plotted per chart. Default: 10.
    pub chart_max_rows: usize,

    /// Maximum files accepted by one batch run. Default: 50.
    pub max_batch_files: usize,

    /// Formats that may be requested. Default: PDF and HTML.
    pub enabled_exports: Vec<ExportFormat>,

    /// Formats produced after the PPTX is written. Default: none.
    pub exports: Vec<ExportFormat>,

    /// Document converter used for PDF export. Default: `"soffice"`.
    pub pdf_converter: String,

    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,

    /// Completion token ceiling. Default: 8192.
    pub max_tokens: usize,

    /// Retries after the first provider attempt. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per retry. Default: 1000.
    pub retry_backoff_ms: u64,

    /// Per-request timeout in seconds. Default: 300.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses the built-in outline prompt.
    pub system_prompt: Option<String>,

    /// Insert an agenda slide when the outline has two or more sections. Default: true.
    pub include_agenda: bool,

    /// Close the deck with a thank-you slide. Default: true.
    pub include_thank_you: bool,

    /// How a batch schedules its files. Default: sequential.
    pub execution: ExecutionPolicy,

    /// Milestone notifications; `None` means silent.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            provider: None,
            model: None,
            ollama_url: None,
            theme: theme::DEFAULT_THEME.to_string(),
            max_input_chars: 100_000,
            max_file_size_mb: 50,
            extract_images: true,
            max_images: 20,
            min_image_px: 100,
            table_max_rows: 12,
            chart_max_rows: 10,
            max_batch_files: 50,
            enabled_exports: vec![ExportFormat::Pdf, ExportFormat::Html],
            exports: Vec::new(),
            pdf_converter: "soffice".to_string(),
            temperature: 0.7,
            max_tokens: 8192,
            max_retries: 3,
            retry_backoff_ms: 1000,
            api_timeout_secs: 300,
            system_prompt: None,
            include_agenda: true,
            include_thank_you: true,
            execution: ExecutionPolicy::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("model", &self.model)
            .field("theme", &self.theme)
            .field("max_input_chars", &self.max_input_chars)
            .field("extract_images", &self.extract_images)
            .field("max_images", &self.max_images)
            .field("chart_max_rows", &self.chart_max_rows)
            .field("max_batch_files", &self.max_batch_files)
            .field("exports", &self.exports)
            .field("max_retries", &self.max_retries)
            .field("execution", &self.execution)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The selected theme. Validated by [`GenerationConfigBuilder::build`].
    pub fn resolved_theme(&self) -> Result<&'static Theme, DeckError> {
        theme::find_theme(&self.theme)
    }

    /// First attempt plus retries.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn ollama_url(mut self, url: impl Into<String>) -> Self {
        self.config.ollama_url = Some(url.into());
        self
    }

    pub fn theme(mut self, name: impl Into<String>) -> Self {
        self.config.theme = name.into();
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn max_file_size_mb(mut self, mb: u64) -> Self {
        self.config.max_file_size_mb = mb;
        self
    }

    pub fn extract_images(mut self, v: bool) -> Self {
        self.config.extract_images = v;
        self
    }

    pub fn max_images(mut self, n: usize) -> Self {
        self.config.max_images = n;
        self
    }

    pub fn min_image_px(mut self, px: u32) -> Self {
        self.config.min_image_px = px;
        self
    }

    pub fn table_max_rows(mut self, n: usize) -> Self {
        self.config.table_max_rows = n.max(1);
        self
    }

    pub fn chart_max_rows(mut self, n: usize) -> Self {
        self.config.chart_max_rows = n.max(1);
        self
    }

    pub fn max_batch_files(mut self, n: usize) -> Self {
        self.config.max_batch_files = n;
        self
    }

    pub fn enabled_exports(mut self, formats: Vec<ExportFormat>) -> Self {
        self.config.enabled_exports = formats;
        self
    }

    /// Request one more export format. Duplicates are ignored.
    pub fn export(mut self, format: ExportFormat) -> Self {
        if !self.config.exports.contains(&format) {
            self.config.exports.push(format);
        }
        self
    }

    pub fn exports(mut self, formats: Vec<ExportFormat>) -> Self {
        self.config.exports.clear();
        for f in formats {
            self = self.export(f);
        }
        self
    }

    pub fn pdf_converter(mut self, program: impl Into<String>) -> Self {
        self.config.pdf_converter = program.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn include_agenda(mut self, v: bool) -> Self {
        self.config.include_agenda = v;
        self
    }

    pub fn include_thank_you(mut self, v: bool) -> Self {
        self.config.include_thank_you = v;
        self
    }

    pub fn execution(mut self, policy: ExecutionPolicy) -> Self {
        self.config.execution = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, DeckError> {
        let c = &self.config;
        theme::find_theme(&c.theme)?;
        if c.provider.is_none() {
            c.provider_name.parse::<ProviderKind>()?;
        }
        if c.max_input_chars < 100 {
            return Err(DeckError::InvalidConfig(format!(
                "max_input_chars must be ≥ 100, got {}",
                c.max_input_chars
            )));
        }
        if c.max_file_size_mb == 0 {
            return Err(DeckError::InvalidConfig(
                "max_file_size_mb must be ≥ 1".into(),
            ));
        }
        if c.max_batch_files == 0 {
            return Err(DeckError::InvalidConfig(
                "max_batch_files must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(DeckError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(DeckError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if let Some(f) = c.exports.iter().find(|f| !c.enabled_exports.contains(f)) {
            return Err(DeckError::InvalidConfig(format!(
                "export format '{f}' is not enabled"
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = GenerationConfig::builder().build().unwrap();
        assert_eq!(c.provider_name, "deepseek");
        assert_eq!(c.theme, "professional");
        assert_eq!(c.max_attempts(), 4);
        assert!(c.exports.is_empty());
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let err = GenerationConfig::builder().theme("neon").build().unwrap_err();
        assert!(matches!(err, DeckError::UnknownTheme { .. }));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = GenerationConfig::builder()
            .provider_name("gemini")
            .build()
            .unwrap_err();
        assert!(matches!(err, DeckError::UnknownProvider { .. }));
    }

    #[test]
    fn disabled_export_is_rejected() {
        let err = GenerationConfig::builder()
            .enabled_exports(vec![ExportFormat::Html])
            .export(ExportFormat::Pdf)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("pdf"), "got: {err}");
    }

    #[test]
    fn duplicate_exports_collapse() {
        let c = GenerationConfig::builder()
            .exports(vec![ExportFormat::Html, ExportFormat::Html, ExportFormat::Pdf])
            .build()
            .unwrap();
        assert_eq!(c.exports, vec![ExportFormat::Html, ExportFormat::Pdf]);
    }

    #[test]
    fn zero_batch_cap_is_rejected() {
        assert!(GenerationConfig::builder().max_batch_files(0).build().is_err());
    }

    #[test]
    fn debug_hides_provider() {
        let dbg = format!("{:?}", GenerationConfig::default());
        assert!(dbg.contains("provider_name"));
        assert!(dbg.contains("None"));
    }
}
