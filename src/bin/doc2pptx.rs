//! CLI binary for edgequake-doc2pptx.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_doc2pptx::{
    derive_output_path, generate_to_file, list_formats, list_providers, list_themes, run_batch,
    BatchSummary, ExportFormat, GenerationConfig, GenerationOutput, GenerationProgressCallback,
    ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner for single files, counter bar for batches.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn file_label(input: &Path) -> String {
        input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string())
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, input: &Path) {
        self.bar.set_prefix(Self::file_label(input));
    }

    fn on_stage(&self, _input: &Path, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_provider_attempt(&self, attempt: u32, max_attempts: u32) {
        if attempt > 1 {
            self.bar.println(format!(
                "  {} provider retry {attempt}/{max_attempts}",
                cyan("↻")
            ));
        }
    }

    fn on_generation_error(&self, input: &Path, error: &str) {
        let first = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            Self::file_label(input),
            red(first)
        ));
    }

    fn on_generation_complete(&self, input: &Path, slide_count: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            Self::file_label(input),
            dim(&format!("{slide_count} slides"))
        ));
    }

    fn on_batch_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
    }

    fn on_file_finish(&self, _index: usize, _total_files: usize, _succeeded: bool) {
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a PDF next to itself (report.pptx)
  doc2pptx report.pdf

  # Explicit output, theme and provider
  doc2pptx notes.md deck.pptx --theme dark --provider openai

  # Also export PDF and HTML
  doc2pptx report.docx --export pdf,html

  # Batch into a directory
  doc2pptx --batch a.pdf b.docx c.csv -o decks/

  # Machine-readable summary
  doc2pptx --batch *.md --json > summary.json

ENVIRONMENT VARIABLES:
  DEEPSEEK_API_KEY     DeepSeek API key (default provider)
  OPENAI_API_KEY       OpenAI API key
  ANTHROPIC_API_KEY    Anthropic API key
  OLLAMA_HOST          Ollama endpoint (default http://localhost:11434)
  DOC2PPTX_PROVIDER    Default provider
  DOC2PPTX_THEME       Default theme
  DOC2PPTX_MODEL       Model override
  RUST_LOG             Log filter (overrides --verbose)
"#;

/// Convert documents into PowerPoint presentations using an LLM outline.
#[derive(Parser, Debug)]
#[command(
    name = "doc2pptx",
    version,
    about = "Convert documents into PowerPoint presentations using LLMs",
    long_about = "Convert text, Markdown, code, JSON, CSV, XML, HTML, PDF and DOCX files into \
themed PowerPoint decks. The document is summarised into a slide outline by an LLM \
(DeepSeek, OpenAI, Anthropic or a local Ollama server) and rendered with native tables, \
charts, images and speaker notes.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input file(s). Without --batch a second path is the output file.
    #[arg(value_name = "INPUT")]
    paths: Vec<PathBuf>,

    /// Visual theme.
    #[arg(short, long, env = "DOC2PPTX_THEME", default_value = "professional")]
    theme: String,

    /// LLM provider: deepseek, openai, anthropic, ollama.
    #[arg(short, long, env = "DOC2PPTX_PROVIDER", default_value = "deepseek")]
    provider: String,

    /// Model override for the selected provider.
    #[arg(short, long, env = "DOC2PPTX_MODEL")]
    model: Option<String>,

    /// Ollama endpoint (falls back to OLLAMA_HOST).
    #[arg(long)]
    ollama_url: Option<String>,

    /// Secondary exports: pdf, html (comma separated, repeatable).
    #[arg(long, value_delimiter = ',')]
    export: Vec<ExportFormat>,

    /// Treat every path as an input and continue past failures.
    #[arg(long)]
    batch: bool,

    /// Directory for batch outputs (default: beside each input).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// List LLM providers and exit.
    #[arg(long)]
    providers: bool,

    /// List themes and exit.
    #[arg(long)]
    themes: bool,

    /// List supported input formats and exit.
    #[arg(long)]
    formats: bool,

    /// Prompt for input, output, theme and provider.
    #[arg(short, long)]
    interactive: bool,

    /// Per-file character cap sent to the LLM.
    #[arg(long)]
    max_chars: Option<usize>,

    /// Skip image extraction from PDF and DOCX sources.
    #[arg(long)]
    no_images: bool,

    /// Do not add an agenda slide.
    #[arg(long)]
    no_agenda: bool,

    /// Retries after the first provider attempt.
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Per-call provider timeout in seconds.
    #[arg(long, default_value_t = 300)]
    api_timeout: u64,

    /// Print a JSON summary on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Listing modes ────────────────────────────────────────────────────
    if cli.providers || cli.themes || cli.formats {
        print_listings(&cli)?;
        return Ok(());
    }

    // ── Interactive mode ─────────────────────────────────────────────────
    if cli.interactive {
        interactive(&mut cli)?;
    }

    if cli.paths.is_empty() {
        bail!("No input file given. Run with --help for usage.");
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Batch ────────────────────────────────────────────────────────────
    if cli.batch {
        let summary = run_batch(&cli.paths, cli.output_dir.as_deref(), &config)
            .await
            .context("Batch could not start")?;
        if cli.json {
            println!("{}", summary.to_json()?);
        } else if !cli.quiet {
            print_batch_summary(&summary);
        }
        return Ok(());
    }

    // ── Single file ──────────────────────────────────────────────────────
    let (input, output) = match cli.paths.as_slice() {
        [input] => (input.clone(), None),
        [input, output] => (input.clone(), Some(output.clone())),
        _ => bail!("Expected <input> [output]; use --batch for several inputs"),
    };
    let out = generate_to_file(&input, output.as_deref(), &config)
        .await
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&out).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_single_summary(&out);
    }
    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .provider_name(cli.provider.as_str())
        .theme(cli.theme.as_str())
        .exports(cli.export.clone())
        .extract_images(!cli.no_images)
        .include_agenda(!cli.no_agenda)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }
    if let Some(ref url) = cli.ollama_url {
        builder = builder.ollama_url(url.as_str());
    }
    if let Some(n) = cli.max_chars {
        builder = builder.max_input_chars(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_listings(cli: &Cli) -> Result<()> {
    if cli.json {
        let mut doc = serde_json::Map::new();
        if cli.providers {
            doc.insert("providers".into(), serde_json::to_value(list_providers())?);
        }
        if cli.themes {
            doc.insert("themes".into(), serde_json::to_value(list_themes())?);
        }
        if cli.formats {
            let formats: Vec<_> = list_formats()
                .into_iter()
                .map(|(ext, desc)| serde_json::json!({ "extension": ext, "description": desc }))
                .collect();
            doc.insert("formats".into(), serde_json::Value::Array(formats));
        }
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    if cli.providers {
        println!("{}", bold("Providers"));
        for p in list_providers() {
            let key = p.env_var.unwrap_or("(local endpoint)");
            println!("  {:<10} {:<28} {:<20} {}", cyan(p.name), p.default_model, key, dim(p.description));
        }
    }
    if cli.themes {
        println!("{}", bold("Themes"));
        for t in list_themes() {
            println!("  {:<14} {}", cyan(t.name), t.description);
        }
    }
    if cli.formats {
        println!("{}", bold("Input formats"));
        for (ext, desc) in list_formats() {
            println!("  {:<10} {}", cyan(ext), desc);
        }
    }
    Ok(())
}

fn print_single_summary(out: &GenerationOutput) {
    eprintln!(
        "{}  {} slides  {}ms  →  {}",
        green("✔"),
        out.slide_count(),
        out.stats.total_duration_ms,
        bold(&out.output_path.display().to_string()),
    );
    if out.stats.truncated {
        eprintln!(
            "   {}",
            dim(&format!("input truncated from {} characters", out.stats.source_chars))
        );
    }
    for e in &out.exports {
        match (&e.path, &e.error) {
            (Some(p), _) => eprintln!("   {} {}  {}", green("✓"), e.format, p.display()),
            (None, Some(err)) => eprintln!("   {} {}", cyan("⚠"), err),
            (None, None) => {}
        }
    }
}

fn print_batch_summary(summary: &BatchSummary) {
    let mark = if summary.failed() == 0 { green("✔") } else { cyan("⚠") };
    eprintln!(
        "{}  {}/{} files converted  {}ms",
        mark,
        bold(&summary.succeeded().to_string()),
        summary.total(),
        summary.total_duration_ms,
    );
    for r in summary.results.iter().filter(|r| r.succeeded()) {
        if let Some(ref p) = r.output_path {
            eprintln!("   {} {}  {}", green("✓"), p.display(), dim(&format!("{} slides", r.slide_count)));
        }
        for e in r.exports.iter().filter(|e| !e.succeeded()) {
            if let Some(ref err) = e.error {
                eprintln!("     {} {}", cyan("⚠"), err);
            }
        }
    }
    for (input, failure) in summary.failures() {
        let first = failure.message.lines().next().unwrap_or_default();
        eprintln!("   {} {}  [{}] {}", red("✗"), input.display(), failure.kind, first);
    }
}

// ── Interactive prompts ──────────────────────────────────────────────────────

fn ask(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut stderr = io::stderr();
    match default {
        Some(d) => write!(stderr, "{} [{}]: ", bold(prompt), dim(d))?,
        None => write!(stderr, "{}: ", bold(prompt))?,
    }
    stderr.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("Failed to read from stdin")?;
    let answer = line.trim();
    Ok(if answer.is_empty() {
        default.unwrap_or_default().to_string()
    } else {
        answer.to_string()
    })
}

fn interactive(cli: &mut Cli) -> Result<()> {
    let input = ask("Input file", cli.paths.first().and_then(|p| p.to_str()))?;
    if input.is_empty() {
        bail!("An input file is required");
    }
    let input = PathBuf::from(input);
    let default_out = derive_output_path(&input, None);
    let output = ask("Output file", default_out.to_str())?;
    let themes: Vec<&str> = list_themes().iter().map(|t| t.name).collect();
    eprintln!("  {}", dim(&format!("themes: {}", themes.join(", "))));
    cli.theme = ask("Theme", Some(cli.theme.as_str()))?;
    let providers: Vec<&str> = list_providers().iter().map(|p| p.name).collect();
    eprintln!("  {}", dim(&format!("providers: {}", providers.join(", "))));
    cli.provider = ask("Provider", Some(cli.provider.as_str()))?;

    eprintln!();
    eprintln!("  {}  {}", dim("input   "), input.display());
    eprintln!("  {}  {}", dim("output  "), output);
    eprintln!("  {}  {}", dim("theme   "), cli.theme);
    eprintln!("  {}  {}", dim("provider"), cli.provider);
    let confirm = ask("Proceed? (y/n)", Some("y"))?;
    if !matches!(confirm.to_ascii_lowercase().as_str(), "y" | "yes") {
        bail!("Cancelled");
    }

    cli.batch = false;
    cli.paths = vec![input, PathBuf::from(output)];
    Ok(())
}
