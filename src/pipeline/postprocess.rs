//! Post-processing: deterministic text cleanup on both sides of the model.
//!
//! Two concerns live here:
//!
//! - **Response cleanup.** Models wrap JSON in code fences or surround it with
//!   prose despite being told not to. [`strip_code_fences`] and
//!   [`outermost_object`] recover the JSON before the outline contract is
//!   checked.
//! - **Extracted text cleanup.** Readers for different formats produce
//!   different line endings and stray invisible characters. [`clean_text`]
//!   normalises them so the prompt is stable across formats.
//!
//! Each rule is a pure `&str → String` pass and is tested on its own.

use once_cell::sync::Lazy;
use regex::Regex;

/// Normalise extracted document text before it is prompted.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Trim the whole text
pub fn clean_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Response: strip code fences ──────────────────────────────────────────────

static RE_FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\n?(.*?)```").unwrap());

/// Return the body of the first fenced block, or the trimmed input if there
/// is none. Input that already starts with `{` is left alone so fences inside
/// JSON strings survive.
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }
    match RE_FENCED.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

// ── Response: locate the outermost object ────────────────────────────────────

/// The span from the first `{` to the last `}`, if any.
pub fn outermost_object(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    (end > start).then(|| &input[start..=end])
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
///
/// Returns the kept prefix and whether anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}
