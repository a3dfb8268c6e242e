//! Content extraction: turn a source file into prompt text plus assets.
//!
//! Each format has one reader returning [`Extracted`]. Readers are blocking
//! and run on `spawn_blocking`; the async [`extract`] entry point validates
//! the input, dispatches on [`SourceFormat`], cleans the text and applies the
//! character cap. Oversized text is truncated, never rejected.

use crate::config::GenerationConfig;
use crate::error::DeckError;
use crate::pipeline::images::{self, ImageAsset};
use crate::pipeline::input::{self, SourceFormat};
use crate::pipeline::{docx, pdf, postprocess};
use crate::prompts::TRUNCATION_MARKER;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// CSV rows rendered into the prompt text.
pub const CSV_TEXT_ROWS: usize = 1000;

/// A header row plus body rows discovered in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularBlock {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Where the block came from, e.g. the file name or `Table 2`.
    pub caption: String,
}

/// Structured content found next to the text.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedAsset {
    Image(ImageAsset),
    Table(TabularBlock),
}

/// A source file after extraction. Immutable once built.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub format: SourceFormat,
    /// Cleaned text, capped at `max_input_chars` plus the truncation marker.
    pub text: String,
    /// Characters before truncation.
    pub original_chars: usize,
    pub truncated: bool,
    pub assets: Vec<ExtractedAsset>,
}

impl SourceDocument {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageAsset> {
        self.assets.iter().filter_map(|a| match a {
            ExtractedAsset::Image(img) => Some(img),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TabularBlock> {
        self.assets.iter().filter_map(|a| match a {
            ExtractedAsset::Table(t) => Some(t),
            _ => None,
        })
    }
}

/// Reader output before cleanup and capping.
#[derive(Debug, Default)]
pub struct Extracted {
    pub text: String,
    pub tables: Vec<TabularBlock>,
    pub images: Vec<ImageAsset>,
}

impl Extracted {
    fn text(text: String) -> Self {
        Self {
            text,
            ..Default::default()
        }
    }
}

/// Options readers need, copied out of the config for `spawn_blocking`.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub extract_images: bool,
    /// Rows kept in a CSV tabular asset.
    pub max_table_rows: usize,
}

/// Extract a source document.
pub async fn extract(path: &Path, config: &GenerationConfig) -> Result<SourceDocument, DeckError> {
    let format = input::resolve_local(path, config.max_file_size_mb)?;
    let opts = ReadOptions {
        extract_images: config.extract_images,
        max_table_rows: config.chart_max_rows,
    };

    let owned = path.to_path_buf();
    let extracted = tokio::task::spawn_blocking(move || read_blocking(&owned, format, opts))
        .await
        .map_err(|e| DeckError::Internal(format!("Extraction task panicked: {e}")))?
        .map_err(|detail| DeckError::ReadError {
            path: path.to_path_buf(),
            detail,
        })?;

    Ok(assemble(path, format, extracted, config))
}

/// Read a file synchronously with the reader for `format`.
pub fn read_blocking(path: &Path, format: SourceFormat, opts: ReadOptions) -> Result<Extracted, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let caption = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match format {
        SourceFormat::Text | SourceFormat::Markdown | SourceFormat::Python => {
            Ok(Extracted::text(decode_text(&bytes)))
        }
        SourceFormat::Json => read_json(&decode_text(&bytes)).map(Extracted::text),
        SourceFormat::Csv => read_csv(&decode_text(&bytes), &caption, opts.max_table_rows),
        SourceFormat::Xml => read_xml(&decode_text(&bytes)).map(Extracted::text),
        SourceFormat::Html => Ok(Extracted::text(read_html(&decode_text(&bytes)))),
        SourceFormat::Pdf => pdf::read_pdf(&bytes, opts),
        SourceFormat::Docx => docx::read_docx(&bytes, opts),
    }
}

fn assemble(path: &Path, format: SourceFormat, extracted: Extracted, config: &GenerationConfig) -> SourceDocument {
    let cleaned = postprocess::clean_text(&extracted.text);
    let original_chars = cleaned.chars().count();
    let (kept, truncated) = postprocess::truncate_chars(&cleaned, config.max_input_chars);
    let mut text = kept.to_string();
    if truncated {
        warn!(
            "{}: {} chars exceeds cap of {}, truncating",
            path.display(),
            original_chars,
            config.max_input_chars
        );
        text.push_str(TRUNCATION_MARKER);
    }

    let found_images = extracted.images.len();
    let images = images::filter_images(extracted.images, config.min_image_px, config.max_images);
    let kept_images = images.len();
    let mut assets: Vec<ExtractedAsset> = extracted
        .tables
        .into_iter()
        .filter(|t| !t.headers.is_empty() && !t.rows.is_empty())
        .map(ExtractedAsset::Table)
        .collect();
    assets.extend(images.into_iter().map(ExtractedAsset::Image));

    info!(
        "Extracted {} chars from {} ({}), {} asset(s), {} image(s) dropped",
        original_chars,
        path.display(),
        format,
        assets.len(),
        found_images - kept_images
    );

    SourceDocument {
        path: path.to_path_buf(),
        format,
        text,
        original_chars,
        truncated,
        assets,
    }
}

// ── Plain text ───────────────────────────────────────────────────────────

/// UTF-8 (BOM stripped), falling back to Windows-1252.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            debug!("Input is not UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

// ── JSON ─────────────────────────────────────────────────────────────────

fn read_json(text: &str) -> Result<String, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?;
    serde_json::to_string_pretty(&value).map_err(|e| e.to_string())
}

// ── CSV ──────────────────────────────────────────────────────────────────

fn read_csv(text: &str, caption: &str, max_table_rows: usize) -> Result<Extracted, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("invalid CSV header: {e}"))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut out = format!("Columns: {}\n{}\n", headers.join(", "), "-".repeat(50));
    let mut table_rows = Vec::new();
    let mut total = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| format!("invalid CSV row: {e}"))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        total += 1;
        if total <= CSV_TEXT_ROWS {
            let cells: Vec<String> = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| format!("{h}: {v}"))
                .collect();
            out.push_str(&format!("Row {}: {}\n", total, cells.join(" | ")));
        }
        if table_rows.len() < max_table_rows {
            table_rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
    }
    if total > CSV_TEXT_ROWS {
        out.push_str(&format!("\n... and {} more rows\n", total - CSV_TEXT_ROWS));
    }

    let tables = if headers.is_empty() || table_rows.is_empty() {
        Vec::new()
    } else {
        vec![TabularBlock {
            headers,
            rows: table_rows,
            caption: caption.to_string(),
        }]
    };

    Ok(Extracted {
        text: out,
        tables,
        images: Vec::new(),
    })
}

// ── XML ──────────────────────────────────────────────────────────────────

fn read_xml(text: &str) -> Result<String, String> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)
        .map_err(|e| format!("invalid XML: {e}"))?;
    let mut out = String::new();
    flatten_xml(doc.root_element(), 0, &mut out);
    Ok(out)
}

fn flatten_xml(node: roxmltree::Node<'_, '_>, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let tag = node.tag_name().name();
    let own_text: String = node
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect::<String>()
        .trim()
        .to_string();

    if !own_text.is_empty() {
        out.push_str(&format!("{indent}{tag}: {own_text}\n"));
    } else {
        let attrs: Vec<String> = node
            .attributes()
            .map(|a| format!("{}={}", a.name(), a.value()))
            .collect();
        if attrs.is_empty() {
            out.push_str(&format!("{indent}{tag}\n"));
        } else {
            out.push_str(&format!("{indent}{tag} ({})\n", attrs.join(", ")));
        }
    }

    for child in node.children().filter(|c| c.is_element()) {
        flatten_xml(child, depth + 1, out);
    }
}

// ── HTML ─────────────────────────────────────────────────────────────────

static RE_SCRIPT_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style|noscript)\b.*?</(script|style|noscript)\s*>").unwrap());
static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h[1-6]\b[^>]*>(.*?)</h[1-6]\s*>").unwrap());
static RE_LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<li\b[^>]*>(.*?)</li\s*>").unwrap());
static RE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(p|div|br|tr|section|article|header|footer|ul|ol|table|blockquote|pre)\b[^>]*>").unwrap()
});
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{A0}]+").unwrap());

fn read_html(html: &str) -> String {
    let s = RE_SCRIPT_STYLE.replace_all(html, "");
    let s = RE_COMMENT.replace_all(&s, "");
    let s = RE_HEADING.replace_all(&s, "\n## $1\n");
    let s = RE_LIST_ITEM.replace_all(&s, "\n• $1\n");
    let s = RE_BLOCK.replace_all(&s, "\n");
    let s = RE_TAG.replace_all(&s, "");
    let s = decode_entities(&s);

    s.lines()
        .map(|line| RE_SPACES.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
