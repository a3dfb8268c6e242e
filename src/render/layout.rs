//! Per-kind slide layouts.
//!
//! Each slide is drawn on the blank layout with absolutely positioned
//! shapes: text boxes, filled rectangles, pictures, table and chart frames.
//! All colours and fonts come from the [`Theme`]; nothing is inherited from
//! master placeholders, so a deck looks the same in every viewer.

use crate::outline::{Bullet, ChartData, SlidePayload, SlideSpec, TableData};
use crate::render::xml::{escape, inches, Rect, NS_A, NS_C, NS_P, NS_R, XML_DECL};
use crate::theme::Theme;

const CODE_FONT: &str = "Consolas";
const CODE_SIZE: u32 = 14;
const TABLE_ROW_HEIGHT: f64 = 0.42;
const BULLET_MARKERS: [&str; 3] = ["•", "–", "▪"];

// ── Validation ───────────────────────────────────────────────────────────

/// Reject payloads that cannot be laid out.
pub fn validate(payload: &SlidePayload) -> Result<(), String> {
    match payload {
        SlidePayload::Comparison { left, right, .. } if left.is_empty() && right.is_empty() => {
            Err("comparison has no items in either column".into())
        }
        SlidePayload::Code { code, .. } if code.trim().is_empty() => Err("code block is empty".into()),
        SlidePayload::Agenda { items } if items.is_empty() => Err("agenda has no items".into()),
        SlidePayload::Table(t) => validate_table(t),
        SlidePayload::Chart(c) => validate_chart(c),
        SlidePayload::Image(img) if img.bytes.is_empty() || img.width == 0 || img.height == 0 => {
            Err(format!("image '{}' has no pixels", img.name))
        }
        _ => Ok(()),
    }
}

fn validate_table(t: &TableData) -> Result<(), String> {
    if t.headers.is_empty() {
        return Err("table has no header row".into());
    }
    if let Some((i, row)) = t.rows.iter().enumerate().find(|(_, r)| r.len() != t.headers.len()) {
        return Err(format!(
            "table row {} has {} cells, expected {}",
            i + 1,
            row.len(),
            t.headers.len()
        ));
    }
    Ok(())
}

fn validate_chart(c: &ChartData) -> Result<(), String> {
    if c.categories.is_empty() {
        return Err("chart has no categories".into());
    }
    if c.series.is_empty() {
        return Err("chart has no series".into());
    }
    if let Some(s) = c.series.iter().find(|s| s.values.len() != c.categories.len()) {
        return Err(format!(
            "series '{}' has {} values for {} categories",
            s.name,
            s.values.len(),
            c.categories.len()
        ));
    }
    if c.series.iter().flat_map(|s| &s.values).any(|v| !v.is_finite()) {
        return Err("chart values must be finite".into());
    }
    Ok(())
}

// ── Text ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    None,
    Char(&'static str),
    Numbered,
}

#[derive(Debug, Clone)]
struct Para<'a> {
    text: String,
    size: u32,
    color: &'a str,
    font: &'a str,
    bold: bool,
    level: u8,
    marker: Marker,
    align: Align,
    space_before: u32,
}

impl<'a> Para<'a> {
    fn plain(text: impl Into<String>, size: u32, color: &'a str, font: &'a str) -> Self {
        Self {
            text: text.into(),
            size,
            color,
            font,
            bold: false,
            level: 0,
            marker: Marker::None,
            align: Align::Left,
            space_before: 0,
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    fn spaced(mut self, points: u32) -> Self {
        self.space_before = points;
        self
    }

    fn to_xml(&self) -> String {
        let mut x = String::from("<a:p><a:pPr");
        if self.align == Align::Center {
            x.push_str(r#" algn="ctr""#);
        }
        match self.marker {
            Marker::None => {}
            Marker::Char(_) | Marker::Numbered => {
                let indent = 342_900;
                let mar_l = indent + i64::from(self.level) * 457_200;
                x.push_str(&format!(r#" marL="{mar_l}" indent="-{indent}""#));
                if self.level > 0 {
                    x.push_str(&format!(r#" lvl="{}""#, self.level));
                }
            }
        }
        x.push('>');
        if self.space_before > 0 {
            x.push_str(&format!(
                r#"<a:spcBef><a:spcPts val="{}"/></a:spcBef>"#,
                self.space_before * 100
            ));
        }
        match self.marker {
            Marker::None => x.push_str("<a:buNone/>"),
            Marker::Char(c) => x.push_str(&format!(
                r#"<a:buClr><a:srgbClr val="{}"/></a:buClr><a:buFont typeface="Arial"/><a:buChar char="{}"/>"#,
                self.color, c
            )),
            Marker::Numbered => x.push_str(r#"<a:buFont typeface="+mj-lt"/><a:buAutoNum type="arabicPeriod"/>"#),
        }
        x.push_str("</a:pPr>");

        let rpr_attrs = format!(
            r#"lang="en-US" sz="{}"{} dirty="0""#,
            self.size * 100,
            if self.bold { r#" b="1""# } else { "" }
        );
        if self.text.is_empty() {
            x.push_str(&format!("<a:endParaRPr {rpr_attrs}/>"));
        } else {
            x.push_str(&format!(
                r#"<a:r><a:rPr {rpr_attrs}><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="{}"/><a:cs typeface="{}"/></a:rPr><a:t>{}</a:t></a:r>"#,
                self.color,
                escape(self.font),
                escape(self.font),
                escape(&self.text)
            ));
        }
        x.push_str("</a:p>");
        x
    }
}

// ── Shape tree ───────────────────────────────────────────────────────────

/// Accumulates the shapes of one slide. Shape ids start at 2; id 1 is the
/// group shape of the tree itself.
struct ShapeTree {
    xml: String,
    next_id: u32,
}

impl ShapeTree {
    fn new() -> Self {
        Self {
            xml: String::with_capacity(4096),
            next_id: 2,
        }
    }

    fn id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn rect(&mut self, r: Rect, fill: &str) {
        let id = self.id();
        self.xml.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Rectangle {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm>{}</a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="{fill}"/></a:solidFill><a:ln><a:noFill/></a:ln></p:spPr></p:sp>"#,
            r.xfrm_children()
        ));
    }

    fn text_box(&mut self, name: &str, r: Rect, paras: &[Para<'_>], anchor: Anchor, fill: Option<&str>) {
        let id = self.id();
        let fill_xml = match fill {
            Some(c) => format!(r#"<a:solidFill><a:srgbClr val="{c}"/></a:solidFill>"#),
            None => "<a:noFill/>".to_string(),
        };
        let anchor = match anchor {
            Anchor::Top => "t",
            Anchor::Middle => "ctr",
            Anchor::Bottom => "b",
        };
        let inset = if fill.is_some() { 182_880 } else { 91_440 };
        self.xml.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{} {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm>{}</a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom>{fill_xml}</p:spPr><p:txBody><a:bodyPr wrap="square" lIns="{inset}" tIns="{inset}" rIns="{inset}" bIns="{inset}" anchor="{anchor}" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#,
            escape(name),
            r.xfrm_children()
        ));
        if paras.is_empty() {
            self.xml.push_str(r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
        }
        for p in paras {
            self.xml.push_str(&p.to_xml());
        }
        self.xml.push_str("</p:txBody></p:sp>");
    }

    fn picture(&mut self, r: Rect, rel_id: &str, descr: &str) {
        let id = self.id();
        self.xml.push_str(&format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}" descr="{}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm>{}</a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
            escape(descr),
            r.xfrm_children()
        ));
    }

    fn chart(&mut self, r: Rect, rel_id: &str) {
        let id = self.id();
        self.xml.push_str(&format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Chart {id}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm>{}</p:xfrm><a:graphic><a:graphicData uri="{NS_C}"><c:chart xmlns:c="{NS_C}" r:id="{rel_id}"/></a:graphicData></a:graphic></p:graphicFrame>"#,
            r.xfrm_children()
        ));
    }

    fn table(&mut self, r: Rect, table: &TableData, theme: &Theme) {
        let id = self.id();
        let cols = table.headers.len().max(1) as i64;
        let col_w = r.w / cols;
        let row_h = inches(TABLE_ROW_HEIGHT);
        let n_rows = table.rows.len() as i64 + 1;
        let size = if cols > 4 { 12 } else { 14 };
        let band = blend(theme.background, theme.text, 0.08);

        self.xml.push_str(&format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Table {id}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr firstRow="1" bandRow="1"/><a:tblGrid>"#,
            r.x,
            r.y,
            col_w * cols,
            row_h * n_rows
        ));
        for _ in 0..cols {
            self.xml.push_str(&format!(r#"<a:gridCol w="{col_w}"/>"#));
        }
        self.xml.push_str("</a:tblGrid>");

        let header = table_row(&table.headers, row_h, size, theme.on_accent, theme.primary, theme, true);
        self.xml.push_str(&header);
        for (i, row) in table.rows.iter().enumerate() {
            let fill = if i % 2 == 1 { band.as_str() } else { theme.background };
            self.xml.push_str(&table_row(row, row_h, size, theme.text, fill, theme, false));
        }
        self.xml.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
    }

    fn into_slide_xml(self, background: &str) -> String {
        format!(
            r#"{XML_DECL}<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="{background}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
            self.xml
        )
    }
}

fn table_row(cells: &[String], row_h: i64, size: u32, color: &str, fill: &str, theme: &Theme, bold: bool) -> String {
    let mut x = format!(r#"<a:tr h="{row_h}">"#);
    for cell in cells {
        let mut p = Para::plain(cell.as_str(), size, color, theme.body_font);
        if bold {
            p = p.bold();
        }
        x.push_str(&format!(
            r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/>{}</a:txBody><a:tcPr marL="91440" marR="91440" marT="45720" marB="45720" anchor="ctr"><a:solidFill><a:srgbClr val="{fill}"/></a:solidFill></a:tcPr></a:tc>"#,
            p.to_xml()
        ));
    }
    x.push_str("</a:tr>");
    x
}

/// Mix two `RRGGBB` colours; `t` is the share of `b`.
pub fn blend(a: &str, b: &str, t: f64) -> String {
    let channel = |hex: &str, i: usize| u8::from_str_radix(hex.get(i..i + 2).unwrap_or("00"), 16).unwrap_or(0);
    (0..3)
        .map(|k| {
            let (ca, cb) = (channel(a, k * 2) as f64, channel(b, k * 2) as f64);
            format!("{:02X}", (ca + (cb - ca) * t).round() as u8)
        })
        .collect()
}

// ── Layouts ──────────────────────────────────────────────────────────────

/// Body area below the title on content-style slides.
fn body_rect() -> Rect {
    Rect::inches(0.6, 1.6, 12.13, 5.4)
}

fn bullet_paras<'a>(bullets: &[Bullet], theme: &'a Theme, base_size: u32) -> Vec<Para<'a>> {
    bullets
        .iter()
        .map(|b| {
            let size = base_size.saturating_sub(2 * u32::from(b.level)).max(10);
            let mut p = Para::plain(b.text.clone(), size, theme.text, theme.body_font).spaced(6);
            p.level = b.level;
            p.marker = Marker::Char(BULLET_MARKERS[usize::from(b.level.min(Bullet::MAX_LEVEL))]);
            p
        })
        .collect()
}

fn header(tree: &mut ShapeTree, title: &str, theme: &Theme) {
    let p = Para::plain(title, theme.title_size, theme.primary, theme.title_font).bold();
    tree.text_box("Title", Rect::inches(0.6, 0.3, 12.13, 1.05), &[p], Anchor::Bottom, None);
    tree.rect(Rect::inches(0.6, 1.38, 1.6, 0.06), theme.accent);
}

/// Full-bleed slide with a centred title and optional subtitle.
fn banner(tree: &mut ShapeTree, title: &str, subtitle: Option<&str>, fill: &str, theme: &Theme, title_size: u32) {
    tree.rect(Rect::full_slide(), fill);
    let p = Para::plain(title, title_size, theme.on_accent, theme.title_font)
        .bold()
        .centered();
    tree.text_box("Title", Rect::inches(0.9, 2.0, 11.53, 1.7), &[p], Anchor::Bottom, None);
    tree.rect(Rect::inches(5.87, 3.82, 1.6, 0.06), theme.on_accent);
    if let Some(sub) = subtitle.filter(|s| !s.is_empty()) {
        let p = Para::plain(sub, theme.subtitle_size, theme.on_accent, theme.body_font).centered();
        tree.text_box("Subtitle", Rect::inches(0.9, 4.0, 11.53, 1.2), &[p], Anchor::Top, None);
    }
}

/// Slide XML for `spec`. `media_rel` is the relationship id of the slide's
/// picture or chart part, when it has one.
pub fn slide_xml(spec: &SlideSpec, theme: &Theme, media_rel: Option<&str>) -> Result<String, String> {
    validate(&spec.payload)?;
    let mut tree = ShapeTree::new();

    match &spec.payload {
        SlidePayload::Title { subtitle } => {
            banner(&mut tree, &spec.title, Some(subtitle), theme.primary, theme, theme.title_size + 8);
        }
        SlidePayload::ThankYou { subtitle } => {
            banner(&mut tree, &spec.title, Some(subtitle), theme.primary, theme, theme.title_size + 6);
        }
        SlidePayload::Section { subtitle } => {
            banner(&mut tree, &spec.title, subtitle.as_deref(), theme.accent, theme, theme.title_size + 4);
        }
        SlidePayload::Content { bullets } => {
            header(&mut tree, &spec.title, theme);
            let paras = bullet_paras(bullets, theme, theme.bullet_size);
            tree.text_box("Content", body_rect(), &paras, Anchor::Top, None);
        }
        SlidePayload::Agenda { items } => {
            header(&mut tree, &spec.title, theme);
            let paras: Vec<Para<'_>> = items
                .iter()
                .map(|item| {
                    let mut p = Para::plain(item.as_str(), theme.bullet_size + 2, theme.text, theme.body_font).spaced(12);
                    p.marker = Marker::Numbered;
                    p
                })
                .collect();
            tree.text_box("Agenda", body_rect(), &paras, Anchor::Top, None);
        }
        SlidePayload::Comparison {
            left_title,
            left,
            right_title,
            right,
        } => {
            header(&mut tree, &spec.title, theme);
            let size = theme.bullet_size.saturating_sub(2).max(12);
            for (x, heading, items) in [(0.6, left_title, left), (6.83, right_title, right)] {
                let mut top = 1.6;
                if !heading.is_empty() {
                    let p = Para::plain(heading.as_str(), theme.bullet_size + 2, theme.on_accent, theme.title_font).bold();
                    tree.text_box("Column Heading", Rect::inches(x, top, 5.9, 0.6), &[p], Anchor::Middle, Some(theme.secondary));
                    top += 0.75;
                }
                let paras = bullet_paras(items, theme, size);
                tree.text_box("Column", Rect::inches(x, top, 5.9, 7.0 - top), &paras, Anchor::Top, None);
            }
            tree.rect(Rect::inches(6.65, 1.7, 0.03, 5.1), theme.secondary);
        }
        SlidePayload::Code { code, language } => {
            header(&mut tree, &spec.title, theme);
            let fill = blend(theme.background, theme.text, 0.07);
            let paras: Vec<Para<'_>> = code
                .lines()
                .map(|line| Para::plain(line.replace('\t', "    "), CODE_SIZE, theme.text, CODE_FONT))
                .collect();
            tree.text_box("Code", Rect::inches(0.6, 1.6, 12.13, 5.2), &paras, Anchor::Top, Some(fill.as_str()));
            if let Some(lang) = language {
                let p = Para::plain(lang.as_str(), 12, theme.secondary, theme.body_font);
                tree.text_box("Language", Rect::inches(0.6, 6.85, 4.0, 0.4), &[p], Anchor::Top, None);
            }
        }
        SlidePayload::Table(table) => {
            header(&mut tree, &spec.title, theme);
            tree.table(body_rect(), table, theme);
        }
        SlidePayload::Chart(_) => {
            header(&mut tree, &spec.title, theme);
            let rel = media_rel.ok_or("chart part is missing")?;
            tree.chart(body_rect(), rel);
        }
        SlidePayload::Image(img) => {
            header(&mut tree, &spec.title, theme);
            let rel = media_rel.ok_or("image part is missing")?;
            tree.picture(body_rect().fit(img.width, img.height), rel, &img.name);
        }
    }

    Ok(tree.into_slide_xml(theme.background))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{ChartShape, Series};
    use crate::theme::find_theme;

    fn theme() -> &'static Theme {
        find_theme("professional").unwrap()
    }

    #[test]
    fn content_slide_has_bullets_and_levels() {
        let spec = SlideSpec::new(
            "Plan & Scope",
            SlidePayload::Content {
                bullets: Bullet::parse_all(&["Ship", "  - Beta <soon>"]),
            },
        );
        let xml = slide_xml(&spec, theme(), None).unwrap();
        assert!(xml.contains("Plan &amp; Scope"));
        assert!(xml.contains("Beta &lt;soon&gt;"));
        assert!(xml.contains(r#"lvl="1""#));
        assert!(xml.contains(r#"<a:buChar char="•"/>"#));
        assert!(xml.contains(r#"<p:cNvPr id="2""#));
    }

    #[test]
    fn table_slide_has_grid_and_header_fill() {
        let spec = SlideSpec::new(
            "Team",
            SlidePayload::Table(TableData {
                headers: vec!["Name".into(), "Role".into()],
                rows: vec![vec!["Ana".into(), "Lead".into()], vec!["Bo".into(), "Dev".into()]],
            }),
        );
        let xml = slide_xml(&spec, theme(), None).unwrap();
        assert_eq!(xml.matches("<a:gridCol").count(), 2);
        assert_eq!(xml.matches("<a:tr ").count(), 3);
        assert!(xml.contains(theme().primary));
    }

    #[test]
    fn ragged_table_is_rejected() {
        let payload = SlidePayload::Table(TableData {
            headers: vec!["A".into(), "B".into()],
            rows: vec![vec!["1".into()]],
        });
        let err = validate(&payload).unwrap_err();
        assert!(err.contains("row 1"), "{err}");
    }

    #[test]
    fn chart_validation() {
        let mut chart = ChartData {
            shape: ChartShape::Bar,
            categories: vec!["a".into(), "b".into()],
            series: vec![Series { name: "s".into(), values: vec![1.0] }],
        };
        assert!(validate(&SlidePayload::Chart(chart.clone())).is_err());
        chart.series[0].values.push(2.0);
        assert!(validate(&SlidePayload::Chart(chart.clone())).is_ok());
        chart.series.clear();
        assert!(validate(&SlidePayload::Chart(chart)).is_err());
    }

    #[test]
    fn chart_slide_needs_its_part() {
        let spec = SlideSpec::new(
            "Sales",
            SlidePayload::Chart(ChartData {
                shape: ChartShape::Pie,
                categories: vec!["a".into()],
                series: vec![Series { name: "s".into(), values: vec![1.0] }],
            }),
        );
        assert!(slide_xml(&spec, theme(), None).is_err());
        let xml = slide_xml(&spec, theme(), Some("rId2")).unwrap();
        assert!(xml.contains(r#"<c:chart xmlns:c="#));
        assert!(xml.contains(r#"r:id="rId2""#));
    }

    #[test]
    fn section_uses_accent_fill() {
        let spec = SlideSpec::new("Results", SlidePayload::Section { subtitle: None });
        let xml = slide_xml(&spec, theme(), None).unwrap();
        assert!(xml.contains(&format!(r#"<a:srgbClr val="{}"/>"#, theme().accent)));
        assert!(!xml.contains("Subtitle"));
    }

    #[test]
    fn code_uses_monospace() {
        let spec = SlideSpec::new(
            "Example",
            SlidePayload::Code {
                code: "fn main() {\n\tprintln!(\"hi\");\n}".into(),
                language: Some("rust".into()),
            },
        );
        let xml = slide_xml(&spec, theme(), None).unwrap();
        assert!(xml.contains(r#"typeface="Consolas""#));
        assert!(xml.contains("    println!(&quot;hi&quot;);"));
        assert!(xml.contains(">rust<"));
    }

    #[test]
    fn blend_mixes_channels() {
        assert_eq!(blend("000000", "FFFFFF", 0.5), "808080");
        assert_eq!(blend("FFFFFF", "262626", 0.0), "FFFFFF");
    }
}
