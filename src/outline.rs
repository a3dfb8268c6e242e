//! The outline contract and the slide model built from it.
//!
//! A model response goes through two shapes:
//!
//! 1. [`RawOutline`]: the JSON the model returned, validated by
//!    [`parse_outline`]. Anything that is not an object with a non-empty
//!    `slides` array of well-typed slide objects is an
//!    [`DeckError::OutlineParseError`].
//! 2. [`SlideSpec`]: one planned slide. Its kind is derived from its payload
//!    variant, so a spec can never carry a payload of the wrong shape.

use crate::error::DeckError;
use crate::pipeline::images::ImageAsset;
use crate::pipeline::postprocess;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

pub const DEFAULT_TITLE: &str = "Generated Presentation";
const PREVIEW_CHARS: usize = 300;

// ── Contract ─────────────────────────────────────────────────────────────

/// The outline exactly as the model described it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOutline {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub slides: Vec<RawSlide>,
}

impl RawOutline {
    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
    }
}

/// One slide object of the outline. Every field is optional; types are not.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSlide {
    #[serde(deserialize_with = "text")]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "lines")]
    pub content: Vec<String>,
    pub notes: Option<String>,
    pub left_title: Option<String>,
    #[serde(deserialize_with = "lines")]
    pub left: Vec<String>,
    pub right_title: Option<String>,
    #[serde(deserialize_with = "lines")]
    pub right: Vec<String>,
    pub code: Option<String>,
    pub language: Option<String>,
    #[serde(deserialize_with = "lines")]
    pub headers: Vec<String>,
    #[serde(deserialize_with = "rows")]
    pub rows: Vec<Vec<String>>,
    #[serde(deserialize_with = "lines")]
    pub categories: Vec<String>,
    pub series: Vec<RawSeries>,
    pub chart_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSeries {
    #[serde(deserialize_with = "text")]
    pub name: String,
    pub values: Vec<Value>,
}

/// Cell text for strings, numbers and booleans; `None` for anything nested.
pub(crate) fn cell_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(String::new()),
        v => cell_text(&v).ok_or_else(|| serde::de::Error::custom("expected a string")),
    }
}

/// A string (split on newlines) or an array of scalars.
fn lines<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(s.lines().map(str::to_string).collect()),
        Value::Array(items) => items
            .iter()
            .map(|v| cell_text(v).ok_or_else(|| serde::de::Error::custom("expected a list of strings")))
            .collect(),
        _ => Err(serde::de::Error::custom("expected a string or a list of strings")),
    }
}

fn rows<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<String>>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(rows) => rows
            .iter()
            .map(|row| match row {
                Value::Array(cells) => cells
                    .iter()
                    .map(|c| cell_text(c).ok_or_else(|| serde::de::Error::custom("table cell must be a scalar")))
                    .collect(),
                _ => Err(serde::de::Error::custom("each table row must be an array")),
            })
            .collect(),
        _ => Err(serde::de::Error::custom("rows must be an array of arrays")),
    }
}

/// Parse and validate a model response against the outline contract.
///
/// Code fences are stripped first. If the remainder is not JSON, the
/// outermost `{ ... }` span is tried before giving up.
pub fn parse_outline(response: &str) -> Result<RawOutline, DeckError> {
    let cleaned = postprocess::strip_code_fences(response);

    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(v) => v,
        Err(first) => postprocess::outermost_object(response)
            .and_then(|span| serde_json::from_str(span).ok())
            .ok_or_else(|| contract_error(format!("not JSON ({first})"), response))?,
    };

    let Some(object) = value.as_object() else {
        return Err(contract_error("top level is not a JSON object", response));
    };
    match object.get("slides") {
        Some(Value::Array(items)) if items.is_empty() => {
            return Err(contract_error("'slides' is empty", response));
        }
        Some(Value::Array(items)) => {
            if let Some(i) = items.iter().position(|s| !s.is_object()) {
                return Err(contract_error(
                    format!("slide {} is not an object", i + 1),
                    response,
                ));
            }
        }
        Some(_) => return Err(contract_error("'slides' is not an array", response)),
        None => return Err(contract_error("missing 'slides' array", response)),
    }

    serde_json::from_value(value).map_err(|e| contract_error(e.to_string(), response))
}

fn contract_error(detail: impl Into<String>, response: &str) -> DeckError {
    let mut preview: String = response.chars().take(PREVIEW_CHARS).collect();
    if response.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    DeckError::OutlineParseError {
        detail: detail.into(),
        preview,
    }
}

// ── Slide model ──────────────────────────────────────────────────────────

/// Slide variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Title,
    Content,
    Section,
    Comparison,
    Code,
    Table,
    Chart,
    Agenda,
    ThankYou,
    Image,
}

impl SlideKind {
    /// Parse an outline `type` value. `None` for unknown names.
    pub fn from_declared(name: &str) -> Option<Self> {
        let kind = match name.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "title" => SlideKind::Title,
            "content" | "bullets" => SlideKind::Content,
            "section" | "divider" => SlideKind::Section,
            "comparison" | "two_column" => SlideKind::Comparison,
            "code" => SlideKind::Code,
            "table" => SlideKind::Table,
            "chart" => SlideKind::Chart,
            "agenda" => SlideKind::Agenda,
            "thank_you" | "thanks" => SlideKind::ThankYou,
            "image" => SlideKind::Image,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for SlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlideKind::Title => "title",
            SlideKind::Content => "content",
            SlideKind::Section => "section",
            SlideKind::Comparison => "comparison",
            SlideKind::Code => "code",
            SlideKind::Table => "table",
            SlideKind::Chart => "chart",
            SlideKind::Agenda => "agenda",
            SlideKind::ThankYou => "thank-you",
            SlideKind::Image => "image",
        };
        f.write_str(s)
    }
}

/// One bullet line with its nesting level (0–2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bullet {
    pub text: String,
    pub level: u8,
}

impl Bullet {
    pub const MAX_LEVEL: u8 = 2;

    /// Derive the level from leading spaces (two per level) and strip a
    /// leading `- `, `• ` or `* ` marker.
    pub fn parse(line: &str) -> Option<Bullet> {
        let stripped = line.trim_start();
        let indent = line.len() - stripped.len();
        let text = ["- ", "• ", "* "]
            .iter()
            .find_map(|m| stripped.strip_prefix(m))
            .unwrap_or(stripped)
            .trim();
        if text.is_empty() {
            return None;
        }
        let level = (indent / 2).min(Self::MAX_LEVEL as usize) as u8;
        Some(Bullet {
            text: text.to_string(),
            level,
        })
    }

    pub fn parse_all<S: AsRef<str>>(lines: &[S]) -> Vec<Bullet> {
        lines.iter().filter_map(|l| Bullet::parse(l.as_ref())).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartShape {
    Bar,
    Line,
    Pie,
}

impl ChartShape {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bar" | "column" => Some(ChartShape::Bar),
            "line" => Some(ChartShape::Line),
            "pie" => Some(ChartShape::Pie),
            _ => None,
        }
    }
}

impl fmt::Display for ChartShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartShape::Bar => "bar",
            ChartShape::Line => "line",
            ChartShape::Pie => "pie",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub shape: ChartShape,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Variant-specific slide content.
#[derive(Debug, Clone, PartialEq)]
pub enum SlidePayload {
    Title {
        subtitle: String,
    },
    Content {
        bullets: Vec<Bullet>,
    },
    Section {
        subtitle: Option<String>,
    },
    Comparison {
        left_title: String,
        left: Vec<Bullet>,
        right_title: String,
        right: Vec<Bullet>,
    },
    Code {
        code: String,
        language: Option<String>,
    },
    Table(TableData),
    Chart(ChartData),
    Agenda {
        items: Vec<String>,
    },
    ThankYou {
        subtitle: String,
    },
    Image(ImageAsset),
}

/// One planned slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideSpec {
    pub title: String,
    pub notes: Option<String>,
    pub payload: SlidePayload,
}

impl SlideSpec {
    pub fn new(title: impl Into<String>, payload: SlidePayload) -> Self {
        Self {
            title: title.into(),
            notes: None,
            payload,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }

    pub fn kind(&self) -> SlideKind {
        match &self.payload {
            SlidePayload::Title { .. } => SlideKind::Title,
            SlidePayload::Content { .. } => SlideKind::Content,
            SlidePayload::Section { .. } => SlideKind::Section,
            SlidePayload::Comparison { .. } => SlideKind::Comparison,
            SlidePayload::Code { .. } => SlideKind::Code,
            SlidePayload::Table(_) => SlideKind::Table,
            SlidePayload::Chart(_) => SlideKind::Chart,
            SlidePayload::Agenda { .. } => SlideKind::Agenda,
            SlidePayload::ThankYou { .. } => SlideKind::ThankYou,
            SlidePayload::Image(_) => SlideKind::Image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_parse_error(response: &str) {
        match parse_outline(response) {
            Err(DeckError::OutlineParseError { .. }) => {}
            other => panic!("expected OutlineParseError for {response:?}, got {other:?}"),
        }
    }

    #[test]
    fn parses_plain_json() {
        let o = parse_outline(r#"{"title":"Rust","slides":[{"title":"Intro","content":["a","b"]}]}"#).unwrap();
        assert_eq!(o.title(), "Rust");
        assert_eq!(o.slides.len(), 1);
        assert_eq!(o.slides[0].content, vec!["a", "b"]);
    }

    #[test]
    fn parses_fenced_json() {
        let o = parse_outline("```json\n{\"slides\":[{\"title\":\"A\"}]}\n```").unwrap();
        assert_eq!(o.title(), DEFAULT_TITLE);
        assert_eq!(o.slides[0].title, "A");
    }

    #[test]
    fn recovers_object_from_prose() {
        let o = parse_outline("Sure! Here it is:\n{\"slides\":[{\"title\":\"A\"}]}\nEnjoy.").unwrap();
        assert_eq!(o.slides.len(), 1);
    }

    #[test]
    fn content_may_be_a_string() {
        let o = parse_outline(r#"{"slides":[{"title":"A","content":"one\ntwo"}]}"#).unwrap();
        assert_eq!(o.slides[0].content, vec!["one", "two"]);
    }

    #[test]
    fn numeric_cells_become_text() {
        let o = parse_outline(r#"{"slides":[{"title":"T","headers":["k","v"],"rows":[["a",1],["b",2.5]]}]}"#).unwrap();
        assert_eq!(o.slides[0].rows[1], vec!["b", "2.5"]);
    }

    #[test]
    fn malformed_responses_are_rejected() {
        assert_parse_error("I could not do that.");
        assert_parse_error("[1, 2, 3]");
        assert_parse_error(r#"{"title": "no slides"}"#);
        assert_parse_error(r#"{"slides": []}"#);
        assert_parse_error(r#"{"slides": "three"}"#);
        assert_parse_error(r#"{"slides": ["just a string"]}"#);
        assert_parse_error(r#"{"slides": [{"title": {"nested": true}}]}"#);
        assert_parse_error(r#"{"slides": [{"title": "T", "rows": [1, 2]}]}"#);
    }

    #[test]
    fn parse_error_preview_is_bounded() {
        let long = "x".repeat(2000);
        match parse_outline(&long) {
            Err(DeckError::OutlineParseError { preview, .. }) => {
                assert!(preview.len() <= PREVIEW_CHARS + 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bullet_levels_and_markers() {
        assert_eq!(Bullet::parse("- top").unwrap(), Bullet { text: "top".into(), level: 0 });
        assert_eq!(Bullet::parse("  - sub").unwrap().level, 1);
        assert_eq!(Bullet::parse("      * deep").unwrap().level, 2);
        assert_eq!(Bullet::parse("• dot").unwrap().text, "dot");
        assert!(Bullet::parse("   ").is_none());
    }

    #[test]
    fn kind_follows_payload() {
        let s = SlideSpec::new("S", SlidePayload::Section { subtitle: None });
        assert_eq!(s.kind(), SlideKind::Section);
        let s = SlideSpec::new("T", SlidePayload::Agenda { items: vec![] });
        assert_eq!(s.kind(), SlideKind::Agenda);
    }

    #[test]
    fn declared_kind_names() {
        assert_eq!(SlideKind::from_declared("Comparison"), Some(SlideKind::Comparison));
        assert_eq!(SlideKind::from_declared("thank-you"), Some(SlideKind::ThankYou));
        assert_eq!(SlideKind::from_declared("mystery"), None);
    }
}
