//! Slide classification: pick a slide kind for one outline slide.
//!
//! Classification is an ordered list of rules; the first rule that fires
//! decides the kind. Literal markers (`Section:`, `Agenda`) outrank the
//! declared `type`, which outranks content-shape heuristics (code fences,
//! delimited rows, contrast keywords). Nothing here depends on discovery
//! order or on any state outside the slide, so the same slide always gets
//! the same kind.
//!
//! ```text
//! section-marker ▶ agenda-marker ▶ declared-type ▶ code ▶ tabular ▶ contrast ▶ content
//! ```

use crate::outline::{ChartShape, RawSlide, SlideKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Cells longer than this many words are prose, not table cells.
const MAX_CELL_WORDS: usize = 6;

/// Single-series charts with at most this many points are drawn as pies.
const PIE_MAX_POINTS: usize = 5;

type Rule = fn(&RawSlide) -> Option<SlideKind>;

/// The classification rules in precedence order.
const RULES: [(&str, Rule); 6] = [
    ("section-marker", section_marker),
    ("agenda-marker", agenda_marker),
    ("declared-type", declared_type),
    ("code", code_shape),
    ("tabular", tabular_shape),
    ("contrast", contrast_shape),
];

/// Classify an outline slide.
pub fn classify(slide: &RawSlide) -> SlideKind {
    classify_with_rule(slide).0
}

/// Classify an outline slide and name the rule that decided it.
pub fn classify_with_rule(slide: &RawSlide) -> (SlideKind, &'static str) {
    RULES
        .iter()
        .find_map(|(name, rule)| rule(slide).map(|kind| (kind, *name)))
        .unwrap_or((SlideKind::Content, "default"))
}

/// Classify free text: the first line is the title, the rest is content.
pub fn classify_text(text: &str) -> SlideKind {
    let mut lines = text.lines();
    let slide = RawSlide {
        title: lines.next().unwrap_or_default().trim().to_string(),
        content: lines.map(str::to_string).collect(),
        ..Default::default()
    };
    classify(&slide)
}

/// Chart kind for a tabular block: all value columns numeric makes a chart.
pub fn classify_tabular(headers: &[String], rows: &[Vec<String>]) -> SlideKind {
    if !rows.is_empty() && value_columns_numeric(headers.len(), rows) {
        SlideKind::Chart
    } else {
        SlideKind::Table
    }
}

/// Pick a chart shape: the explicit name when valid, otherwise pie for one
/// short series, line for several series, bar for the rest.
pub fn choose_chart_shape(explicit: Option<&str>, series_count: usize, points: usize) -> ChartShape {
    if let Some(shape) = explicit.and_then(ChartShape::from_name) {
        return shape;
    }
    match series_count {
        1 if points <= PIE_MAX_POINTS => ChartShape::Pie,
        n if n > 1 => ChartShape::Line,
        _ => ChartShape::Bar,
    }
}

// ── Rule 1: literal `Section:` marker ────────────────────────────────────

fn section_marker(slide: &RawSlide) -> Option<SlideKind> {
    let first_line = slide.content.iter().find(|l| !l.trim().is_empty());
    (strip_section_marker(&slide.title).is_some()
        || first_line.is_some_and(|l| strip_section_marker(l).is_some()))
    .then_some(SlideKind::Section)
}

/// The text after a leading `Section:` (case-insensitive), trimmed.
pub fn strip_section_marker(text: &str) -> Option<&str> {
    let t = text.trim();
    let prefix = t.get(..8)?;
    prefix
        .eq_ignore_ascii_case("section:")
        .then(|| t[8..].trim())
}

// ── Rule 2: literal `Agenda` marker ──────────────────────────────────────

fn agenda_marker(slide: &RawSlide) -> Option<SlideKind> {
    let t = slide.title.trim();
    t.get(..6)
        .is_some_and(|p| p.eq_ignore_ascii_case("agenda"))
        .then_some(SlideKind::Agenda)
}

// ── Rule 3: declared type ────────────────────────────────────────────────

fn declared_type(slide: &RawSlide) -> Option<SlideKind> {
    let kind = SlideKind::from_declared(slide.kind.as_deref()?)?;
    match kind {
        SlideKind::Content | SlideKind::Title | SlideKind::ThankYou => None,
        other => Some(other),
    }
}

// ── Rule 4: code ─────────────────────────────────────────────────────────

static RE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```([A-Za-z0-9_+#-]*)[ \t]*\n(.*?)\n?```").unwrap());

fn code_shape(slide: &RawSlide) -> Option<SlideKind> {
    let has_field = slide.code.as_deref().is_some_and(|c| !c.trim().is_empty());
    (has_field || slide.content.iter().any(|l| l.contains("```"))).then_some(SlideKind::Code)
}

/// The first fenced block in `lines` as `(code, language)`.
pub fn extract_fenced_code(lines: &[String]) -> Option<(String, Option<String>)> {
    let joined = lines.join("\n");
    let caps = RE_FENCE.captures(&joined)?;
    let lang = caps.get(1).map(|m| m.as_str()).filter(|l| !l.is_empty());
    Some((caps[2].to_string(), lang.map(str::to_string)))
}

// ── Rule 5: delimited rows → chart or table ──────────────────────────────

fn tabular_shape(slide: &RawSlide) -> Option<SlideKind> {
    if !slide.categories.is_empty() && !slide.series.is_empty() {
        return Some(SlideKind::Chart);
    }
    if !slide.rows.is_empty() {
        return Some(classify_tabular(&slide.headers, &slide.rows));
    }
    let grid = parse_delimited(&slide.content)?;
    let grid = split_header(grid);
    Some(classify_tabular(&grid.headers, &grid.rows))
}

/// Delimited rows with an optional header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Empty when the first row already carries numbers.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Split `lines` into cells when at least two of them share one delimiter
/// (pipe, tab or comma) and the same column count of two or more.
pub fn parse_delimited(lines: &[String]) -> Option<Vec<Vec<String>>> {
    let lines: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !is_markdown_rule(l))
        .collect();
    if lines.len() < 2 {
        return None;
    }

    ['|', '\t', ','].into_iter().find_map(|delim| {
        let rows: Vec<Vec<String>> = lines
            .iter()
            .map(|l| split_row(l, delim))
            .collect::<Option<_>>()?;
        let width = rows[0].len();
        let consistent = width >= 2
            && rows.iter().all(|r| r.len() == width)
            && rows
                .iter()
                .flatten()
                .all(|c| c.split_whitespace().count() <= MAX_CELL_WORDS);
        consistent.then_some(rows)
    })
}

fn split_row(line: &str, delim: char) -> Option<Vec<String>> {
    if !line.contains(delim) {
        return None;
    }
    let line = if delim == '|' {
        line.trim_matches('|')
    } else {
        line
    };
    Some(line.split(delim).map(|c| c.trim().to_string()).collect())
}

fn is_markdown_rule(line: &str) -> bool {
    line.contains('-') && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '+'))
}

/// Treat the first row as a header unless its value cells are numeric.
pub fn split_header(mut rows: Vec<Vec<String>>) -> Grid {
    let first_is_data = rows
        .first()
        .is_some_and(|r| r.len() > 1 && r[1..].iter().all(|c| parse_number(c).is_some()));
    if first_is_data || rows.len() < 2 {
        return Grid {
            headers: Vec::new(),
            rows,
        };
    }
    let headers = rows.remove(0);
    Grid { headers, rows }
}

fn value_columns_numeric(width: usize, rows: &[Vec<String>]) -> bool {
    let width = if width > 0 { width } else { rows[0].len() };
    width >= 2
        && rows.iter().all(|r| {
            r.len() >= 2
                && r.iter()
                    .take(width)
                    .skip(1)
                    .all(|c| parse_number(c).is_some())
        })
}

/// Parse a numeric cell, tolerating currency signs, `%` and thousands
/// separators.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '%' | ',' | '_' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ── Rule 6: contrast ─────────────────────────────────────────────────────

static RE_CONTRAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(vs\.?|versus|compared to|comparison|comparing|pros and cons)(\s|$)").unwrap()
});
static RE_CONTRAST_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)\s+(?:vs\.?|versus|compared to)\s+(.+)$").unwrap());

fn contrast_shape(slide: &RawSlide) -> Option<SlideKind> {
    let has_columns = !slide.left.is_empty() || !slide.right.is_empty();
    (has_columns || RE_CONTRAST.is_match(&slide.title)).then_some(SlideKind::Comparison)
}

/// Split `"A vs B"` into its two sides.
pub fn split_contrast_title(title: &str) -> Option<(String, String)> {
    let caps = RE_CONTRAST_SPLIT.captures(title.trim())?;
    Some((caps[1].trim().to_string(), caps[2].trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(title: &str, content: &[&str]) -> RawSlide {
        RawSlide {
            title: title.into(),
            content: content.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn section_marker_beats_plain_content() {
        assert_eq!(classify_text("Section: Overview"), SlideKind::Section);
        assert_eq!(classify_text("section: lower case"), SlideKind::Section);
        assert_eq!(classify_text("Overview\nSection: Part Two"), SlideKind::Section);
        assert_eq!(classify_text("Sections of the report"), SlideKind::Content);
    }

    #[test]
    fn agenda_marker() {
        assert_eq!(classify(&slide("Agenda", &["Intro", "Plan"])), SlideKind::Agenda);
        assert_eq!(classify(&slide("agenda for today", &[])), SlideKind::Agenda);
    }

    #[test]
    fn csv_rows_with_numeric_columns_make_a_chart() {
        let s = slide("Sales", &["Quarter,Revenue,Cost", "Q1,100,80", "Q2,120,90"]);
        assert_eq!(classify_with_rule(&s), (SlideKind::Chart, "tabular"));
    }

    #[test]
    fn text_cells_make_a_table() {
        let s = slide("Team", &["Name | Role", "Ana | Lead", "Bo | Engineer"]);
        assert_eq!(classify(&s), SlideKind::Table);
    }

    #[test]
    fn markdown_table_rule_is_ignored() {
        let s = slide("Team", &["| Name | Score |", "|---|---|", "| Ana | 9 |", "| Bo | 7 |"]);
        assert_eq!(classify(&s), SlideKind::Chart);
    }

    #[test]
    fn prose_with_commas_is_not_tabular() {
        let s = slide(
            "Notes",
            &[
                "We shipped the first release on time, which surprised most of the team",
                "Support volume dropped, and the on-call rotation finally got quiet again",
            ],
        );
        assert_eq!(classify(&s), SlideKind::Content);
    }

    #[test]
    fn code_fence_and_code_field() {
        let s = slide("Example", &["```rust", "fn main() {}", "```"]);
        assert_eq!(classify(&s), SlideKind::Code);
        let s = RawSlide {
            title: "Snippet".into(),
            code: Some("print(1)".into()),
            ..Default::default()
        };
        assert_eq!(classify(&s), SlideKind::Code);
    }

    #[test]
    fn contrast_keywords() {
        assert_eq!(classify(&slide("Rust vs Go", &["fast"])), SlideKind::Comparison);
        assert_eq!(classify(&slide("Pros and cons", &[])), SlideKind::Comparison);
        assert_eq!(classify(&slide("Canvas basics", &[])), SlideKind::Content);
        assert_eq!(
            split_contrast_title("Rust versus Go"),
            Some(("Rust".into(), "Go".into()))
        );
    }

    #[test]
    fn declared_type_is_used_unless_it_is_the_default() {
        let mut s = slide("Numbers", &["plain text"]);
        s.kind = Some("table".into());
        assert_eq!(classify_with_rule(&s), (SlideKind::Table, "declared-type"));
        s.kind = Some("content".into());
        assert_eq!(classify(&s), SlideKind::Content);
    }

    #[test]
    fn markers_outrank_declared_type_and_shape() {
        let mut s = slide("Section: Results", &["a,1", "b,2"]);
        s.kind = Some("chart".into());
        assert_eq!(classify_with_rule(&s), (SlideKind::Section, "section-marker"));

        let s = slide("Agenda vs reality", &["```", "x", "```"]);
        assert_eq!(classify(&s), SlideKind::Agenda);
    }

    #[test]
    fn classification_is_deterministic() {
        let s = slide("Q1 vs Q2", &["Region,Q1,Q2", "EU,10,12", "US,20,25"]);
        let first = classify_with_rule(&s);
        for _ in 0..10 {
            assert_eq!(classify_with_rule(&s), first);
        }
        assert_eq!(first.0, SlideKind::Chart);
    }

    #[test]
    fn header_detection() {
        let rows = parse_delimited(&["a,1".to_string(), "b,2".to_string()]).unwrap();
        assert!(split_header(rows).headers.is_empty());
        let rows = parse_delimited(&["k,v".to_string(), "b,2".to_string()]).unwrap();
        assert_eq!(split_header(rows).headers, vec!["k", "v"]);
    }

    #[test]
    fn chart_shape_selection() {
        assert_eq!(choose_chart_shape(Some("line"), 1, 3), ChartShape::Line);
        assert_eq!(choose_chart_shape(Some("donut"), 1, 3), ChartShape::Pie);
        assert_eq!(choose_chart_shape(None, 1, 5), ChartShape::Pie);
        assert_eq!(choose_chart_shape(None, 1, 6), ChartShape::Bar);
        assert_eq!(choose_chart_shape(None, 2, 3), ChartShape::Line);
    }

    #[test]
    fn numbers_tolerate_units() {
        assert_eq!(parse_number("$1,200"), Some(1200.0));
        assert_eq!(parse_number("12.5%"), Some(12.5));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number(""), None);
    }
}
