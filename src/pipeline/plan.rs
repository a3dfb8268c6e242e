//! Deck planning: turn a validated outline into the ordered slide list.
//!
//! Every outline slide is classified ([`crate::classify`]) and its payload is
//! built for that kind. A slide whose payload cannot be built falls back to a
//! bullet slide; a bullet slide with nothing on it is dropped. The planner
//! then adds the structural slides around the outline:
//!
//! ```text
//! title ▶ [agenda] ▶ outline slides ▶ table/chart assets ▶ image assets ▶ [thank you]
//! ```

use crate::classify::{self, Grid};
use crate::config::GenerationConfig;
use crate::outline::{
    Bullet, ChartData, RawOutline, RawSeries, RawSlide, Series, SlideKind, SlidePayload,
    SlideSpec, TableData,
};
use crate::pipeline::extract::{ExtractedAsset, TabularBlock};
use tracing::debug;

pub const DEFAULT_SUBTITLE: &str = "Generated by doc2pptx";
pub const AGENDA_TITLE: &str = "Agenda";
pub const THANK_YOU_TITLE: &str = "Thank You";
pub const THANK_YOU_SUBTITLE: &str = "Questions & Discussion";

/// Sections needed before an agenda slide is generated.
const AGENDA_MIN_SECTIONS: usize = 2;

/// Plan the full deck for one document.
pub fn plan_deck(
    outline: &RawOutline,
    assets: &[ExtractedAsset],
    config: &GenerationConfig,
) -> Vec<SlideSpec> {
    let title = outline.title();
    let subtitle = outline
        .subtitle
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUBTITLE);

    let mut body: Vec<SlideSpec> = outline
        .slides
        .iter()
        .filter_map(|raw| plan_slide(raw, config))
        .collect();

    let mut deck = vec![SlideSpec::new(
        title,
        SlidePayload::Title {
            subtitle: subtitle.to_string(),
        },
    )];

    if config.include_agenda && !body.iter().any(|s| s.kind() == SlideKind::Agenda) {
        let sections: Vec<String> = body
            .iter()
            .filter(|s| s.kind() == SlideKind::Section)
            .map(|s| s.title.clone())
            .collect();
        if sections.len() >= AGENDA_MIN_SECTIONS {
            deck.push(SlideSpec::new(
                AGENDA_TITLE,
                SlidePayload::Agenda { items: sections },
            ));
        }
    }

    deck.append(&mut body);

    let tables = assets.iter().filter_map(|a| match a {
        ExtractedAsset::Table(t) => Some(t),
        _ => None,
    });
    deck.extend(tables.filter_map(|t| plan_table_asset(t, config)));

    let images = assets.iter().filter_map(|a| match a {
        ExtractedAsset::Image(img) => Some(img),
        _ => None,
    });
    for (i, img) in images.enumerate() {
        let title = match img.page {
            Some(page) => format!("Figure {} (page {})", i + 1, page),
            None => format!("Figure {}", i + 1),
        };
        deck.push(SlideSpec::new(title, SlidePayload::Image(img.clone())));
    }

    if config.include_thank_you {
        deck.push(SlideSpec::new(
            THANK_YOU_TITLE,
            SlidePayload::ThankYou {
                subtitle: THANK_YOU_SUBTITLE.to_string(),
            },
        ));
    }

    debug!("Planned {} slide(s) for '{}'", deck.len(), title);
    deck
}

/// Classify one outline slide and build its payload.
///
/// Returns `None` for a bullet slide with no bullets.
pub fn plan_slide(raw: &RawSlide, config: &GenerationConfig) -> Option<SlideSpec> {
    let (kind, rule) = classify::classify_with_rule(raw);
    debug!("'{}' classified as {} by {}", raw.title, kind, rule);

    let spec = match build_payload(raw, kind, config) {
        Some((title, payload)) => SlideSpec::new(title, payload),
        None => {
            if kind != SlideKind::Content {
                debug!("'{}': no usable {} payload, using bullets", raw.title, kind);
            }
            let bullets = Bullet::parse_all(&raw.content);
            if bullets.is_empty() {
                debug!("Dropping empty slide '{}'", raw.title);
                return None;
            }
            SlideSpec::new(raw.title.trim(), SlidePayload::Content { bullets })
        }
    };
    Some(spec.with_notes(raw.notes.clone()))
}

fn build_payload(
    raw: &RawSlide,
    kind: SlideKind,
    config: &GenerationConfig,
) -> Option<(String, SlidePayload)> {
    let title = raw.title.trim().to_string();
    match kind {
        SlideKind::Section => Some(section_payload(raw)),
        SlideKind::Agenda => {
            let items: Vec<String> = Bullet::parse_all(&raw.content)
                .into_iter()
                .map(|b| b.text)
                .collect();
            (!items.is_empty()).then(|| (title, SlidePayload::Agenda { items }))
        }
        SlideKind::Comparison => comparison_payload(raw).map(|p| (title, p)),
        SlideKind::Code => code_payload(raw).map(|p| (title, p)),
        SlideKind::Table => table_payload(raw, config.table_max_rows)
            .map(|t| (title, SlidePayload::Table(t))),
        SlideKind::Chart => chart_payload(raw, config.chart_max_rows)
            .map(|c| (title, SlidePayload::Chart(c))),
        SlideKind::Content
        | SlideKind::Title
        | SlideKind::ThankYou
        | SlideKind::Image => None,
    }
}

fn section_payload(raw: &RawSlide) -> (String, SlidePayload) {
    let lines: Vec<&str> = raw
        .content
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let (title, rest) = match classify::strip_section_marker(&raw.title) {
        Some(t) => (t.to_string(), &lines[..]),
        None => match lines.split_first() {
            Some((first, rest)) if classify::strip_section_marker(first).is_some() => (
                classify::strip_section_marker(first).unwrap_or_default().to_string(),
                rest,
            ),
            _ => (raw.title.trim().to_string(), &lines[..]),
        },
    };
    let title = if title.is_empty() {
        raw.title.trim().to_string()
    } else {
        title
    };
    let subtitle = rest
        .first()
        .and_then(|l| Bullet::parse(l))
        .map(|b| b.text);
    (title, SlidePayload::Section { subtitle })
}

fn comparison_payload(raw: &RawSlide) -> Option<SlidePayload> {
    let (left, right) = if !raw.left.is_empty() || !raw.right.is_empty() {
        (Bullet::parse_all(&raw.left), Bullet::parse_all(&raw.right))
    } else {
        let mut bullets = Bullet::parse_all(&raw.content);
        let right = bullets.split_off(bullets.len().div_ceil(2));
        (bullets, right)
    };
    if left.is_empty() && right.is_empty() {
        return None;
    }

    let (split_left, split_right) = classify::split_contrast_title(&raw.title).unwrap_or_default();
    let column_title = |field: &Option<String>, fallback: String| {
        field
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or(fallback)
    };
    Some(SlidePayload::Comparison {
        left_title: column_title(&raw.left_title, split_left),
        left,
        right_title: column_title(&raw.right_title, split_right),
        right,
    })
}

fn code_payload(raw: &RawSlide) -> Option<SlidePayload> {
    let (code, fence_lang) = match raw.code.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(code) => (code.to_string(), None),
        None => classify::extract_fenced_code(&raw.content)?,
    };
    let code = code.trim_end().to_string();
    if code.trim().is_empty() {
        return None;
    }
    let language = raw
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .or(fence_lang);
    Some(SlidePayload::Code { code, language })
}

/// Headers and rows from the structured fields, else from delimited content.
fn slide_grid(raw: &RawSlide) -> Option<Grid> {
    if !raw.rows.is_empty() {
        return Some(Grid {
            headers: raw.headers.clone(),
            rows: raw.rows.clone(),
        });
    }
    classify::parse_delimited(&raw.content).map(classify::split_header)
}

fn table_payload(raw: &RawSlide, max_rows: usize) -> Option<TableData> {
    let grid = slide_grid(raw)?;
    build_table(grid.headers, grid.rows, max_rows)
}

/// Normalise a header row plus body rows into a rectangular table.
///
/// Missing headers are synthesised; rows are padded or cut to the header
/// width and capped at `max_rows`.
pub fn build_table(headers: Vec<String>, rows: Vec<Vec<String>>, max_rows: usize) -> Option<TableData> {
    let width = if headers.is_empty() {
        rows.iter().map(Vec::len).max().unwrap_or(0)
    } else {
        headers.len()
    };
    if width == 0 || rows.is_empty() {
        return None;
    }
    let headers = if headers.is_empty() {
        (1..=width).map(|i| format!("Column {i}")).collect()
    } else {
        headers
    };
    let rows = rows
        .into_iter()
        .take(max_rows)
        .map(|mut r| {
            r.resize(width, String::new());
            r
        })
        .collect();
    Some(TableData { headers, rows })
}

fn chart_payload(raw: &RawSlide, max_rows: usize) -> Option<ChartData> {
    if !raw.categories.is_empty() && !raw.series.is_empty() {
        return chart_from_series(&raw.categories, &raw.series, raw.chart_type.as_deref(), max_rows);
    }
    let grid = slide_grid(raw)?;
    build_chart(&grid.headers, &grid.rows, raw.chart_type.as_deref(), max_rows)
}

fn chart_from_series(
    categories: &[String],
    series: &[RawSeries],
    explicit: Option<&str>,
    max_rows: usize,
) -> Option<ChartData> {
    let categories: Vec<String> = categories.iter().take(max_rows).cloned().collect();
    let series: Vec<Series> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let mut values: Vec<f64> = s
                .values
                .iter()
                .take(categories.len())
                .map(coerce_value)
                .collect();
            values.resize(categories.len(), 0.0);
            let name = if s.name.trim().is_empty() {
                format!("Series {}", i + 1)
            } else {
                s.name.trim().to_string()
            };
            Series { name, values }
        })
        .collect();
    if categories.is_empty() || series.is_empty() {
        return None;
    }
    let shape = classify::choose_chart_shape(explicit, series.len(), categories.len());
    Some(ChartData {
        shape,
        categories,
        series,
    })
}

fn coerce_value(v: &serde_json::Value) -> f64 {
    match v {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => classify::parse_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Build chart data from a grid: the first column holds categories, every
/// further column is one series. Non-numeric cells plot as zero.
pub fn build_chart(
    headers: &[String],
    rows: &[Vec<String>],
    explicit: Option<&str>,
    max_rows: usize,
) -> Option<ChartData> {
    let width = if headers.is_empty() {
        rows.first().map(Vec::len).unwrap_or(0)
    } else {
        headers.len()
    };
    if width < 2 {
        return None;
    }
    let rows: Vec<&Vec<String>> = rows.iter().filter(|r| !r.is_empty()).take(max_rows).collect();
    if rows.is_empty() {
        return None;
    }

    let categories = rows.iter().map(|r| r[0].clone()).collect();
    let series: Vec<Series> = (1..width)
        .map(|col| Series {
            name: headers
                .get(col)
                .map(|h| h.trim())
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Series {col}")),
            values: rows
                .iter()
                .map(|r| r.get(col).and_then(|c| classify::parse_number(c)).unwrap_or(0.0))
                .collect(),
        })
        .collect();

    let shape = classify::choose_chart_shape(explicit, series.len(), rows.len());
    Some(ChartData {
        shape,
        categories,
        series,
    })
}

fn plan_table_asset(block: &TabularBlock, config: &GenerationConfig) -> Option<SlideSpec> {
    let title = if block.caption.is_empty() {
        "Data".to_string()
    } else {
        block.caption.clone()
    };
    match classify::classify_tabular(&block.headers, &block.rows) {
        SlideKind::Chart => build_chart(&block.headers, &block.rows, None, config.chart_max_rows)
            .map(|c| SlideSpec::new(title, SlidePayload::Chart(c))),
        _ => build_table(block.headers.clone(), block.rows.clone(), config.table_max_rows)
            .map(|t| SlideSpec::new(title, SlidePayload::Table(t))),
    }
}
