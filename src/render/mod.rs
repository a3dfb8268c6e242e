//! Slide rendering: planned [`SlideSpec`]s in, `.pptx` bytes out.
//!
//! [`Presentation`] is append-only. Each [`Presentation::push`] lays out one
//! slide against the deck theme and either appends the finished slide or
//! returns [`DeckError::RenderError`] leaving the deck untouched.
//! [`Presentation::to_pptx_bytes`] zips the result into an OOXML package.

pub mod chart;
pub mod layout;
mod package;
pub mod xml;

use crate::error::DeckError;
use crate::outline::{SlideKind, SlidePayload, SlideSpec};
use crate::theme::Theme;
use tracing::debug;
use xml::{Relationship, REL_CHART, REL_IMAGE, REL_NOTES_SLIDE, REL_SLIDE_LAYOUT};

/// A chart part owned by one slide.
#[derive(Debug, Clone)]
pub struct ChartPart {
    /// File name under `ppt/charts/`.
    pub name: String,
    pub xml: String,
}

/// One laid-out slide with its relationships.
#[derive(Debug, Clone)]
pub struct RenderedSlide {
    pub spec: SlideSpec,
    pub xml: String,
    pub rels: Vec<Relationship>,
    /// File name under `ppt/media/` for image slides.
    pub media: Option<String>,
    pub chart: Option<ChartPart>,
}

impl RenderedSlide {
    pub fn kind(&self) -> SlideKind {
        self.spec.kind()
    }
}

/// Ordered slides sharing one theme.
#[derive(Debug, Clone)]
pub struct Presentation {
    title: String,
    theme: &'static Theme,
    slides: Vec<RenderedSlide>,
    images: usize,
    charts: usize,
}

impl Presentation {
    pub fn new(title: impl Into<String>, theme: &'static Theme) -> Self {
        Self {
            title: title.into(),
            theme,
            slides: Vec::new(),
            images: 0,
            charts: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn theme(&self) -> &'static Theme {
        self.theme
    }

    pub fn slides(&self) -> &[RenderedSlide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slide_kinds(&self) -> Vec<SlideKind> {
        self.slides.iter().map(RenderedSlide::kind).collect()
    }

    /// Lay out `spec` and append it as the next slide.
    pub fn push(&mut self, spec: SlideSpec) -> Result<(), DeckError> {
        let number = self.slides.len() + 1;
        let mut rels = vec![Relationship::new(
            1,
            REL_SLIDE_LAYOUT,
            "../slideLayouts/slideLayout1.xml",
        )];
        let mut media = None;
        let mut chart = None;

        match &spec.payload {
            SlidePayload::Image(img) => {
                let name = format!("image{}.{}", self.images + 1, img.kind.extension());
                rels.push(Relationship::new(2, REL_IMAGE, format!("../media/{name}")));
                media = Some(name);
            }
            SlidePayload::Chart(data) => {
                let name = format!("chart{}.xml", self.charts + 1);
                rels.push(Relationship::new(2, REL_CHART, format!("../charts/{name}")));
                chart = Some(ChartPart {
                    name,
                    xml: chart::chart_xml(data, self.theme),
                });
            }
            _ => {}
        }
        let part_rel = (rels.len() > 1).then(|| rels[1].id.clone());
        if spec.notes.is_some() {
            rels.push(Relationship::new(
                rels.len() + 1,
                REL_NOTES_SLIDE,
                format!("../notesSlides/notesSlide{number}.xml"),
            ));
        }

        let xml = layout::slide_xml(&spec, self.theme, part_rel.as_deref()).map_err(|detail| {
            DeckError::RenderError {
                slide: number,
                title: spec.title.clone(),
                detail,
            }
        })?;

        debug!(slide = number, kind = %spec.kind(), "Rendered slide");
        if media.is_some() {
            self.images += 1;
        }
        if chart.is_some() {
            self.charts += 1;
        }
        self.slides.push(RenderedSlide {
            spec,
            xml,
            rels,
            media,
            chart,
        });
        Ok(())
    }

    /// Zip the deck into `.pptx` bytes.
    pub fn to_pptx_bytes(&self) -> Result<Vec<u8>, DeckError> {
        package::write_package(self).map_err(|e| DeckError::Internal(format!("PPTX packaging failed: {e}")))
    }
}

/// Render every spec in order. Fails on the first slide that cannot be laid out.
pub fn render_deck(
    title: &str,
    specs: Vec<SlideSpec>,
    theme: &'static Theme,
) -> Result<Presentation, DeckError> {
    let mut pres = Presentation::new(title, theme);
    for spec in specs {
        pres.push(spec)?;
    }
    Ok(pres)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{Bullet, ChartData, ChartShape, Series, TableData};
    use crate::pipeline::images::{tests::solid_png, ImageAsset};
    use crate::theme::find_theme;
    use std::io::{Cursor, Read};

    fn theme() -> &'static Theme {
        find_theme("modern").unwrap()
    }

    fn sample_specs() -> Vec<SlideSpec> {
        let image = ImageAsset::from_encoded(solid_png(160, 120), "page1.png", Some(1)).unwrap();
        vec![
            SlideSpec::new("Deck", SlidePayload::Title { subtitle: "Sub".into() }),
            SlideSpec::new(
                "Points",
                SlidePayload::Content {
                    bullets: Bullet::parse_all(&["One", "Two"]),
                },
            )
            .with_notes(Some("Say hello".into())),
            SlideSpec::new(
                "Sales",
                SlidePayload::Chart(ChartData {
                    shape: ChartShape::Bar,
                    categories: vec!["Q1".into(), "Q2".into(), "Q3".into()],
                    series: vec![Series { name: "EU".into(), values: vec![1.0, 2.0, 3.0] }],
                }),
            ),
            SlideSpec::new("Figure 1 (page 1)", SlidePayload::Image(image)),
        ]
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn package_contains_every_part() {
        let pres = render_deck("Deck", sample_specs(), theme()).unwrap();
        let bytes = pres.to_pptx_bytes().unwrap();
        let names = package::entry_names(&bytes);
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide4.xml",
            "ppt/notesSlides/notesSlide2.xml",
            "ppt/charts/chart1.xml",
            "ppt/media/image1.png",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert!(!names.iter().any(|n| n == "ppt/notesSlides/notesSlide1.xml"));

        let types = read_entry(&bytes, "[Content_Types].xml");
        assert!(types.contains("/ppt/charts/chart1.xml"));
        assert!(types.contains("/ppt/slides/slide4.xml"));
        let notes = read_entry(&bytes, "ppt/notesSlides/notesSlide2.xml");
        assert!(notes.contains("Say hello"));
    }

    #[test]
    fn slide_relationships_point_at_parts() {
        let pres = render_deck("Deck", sample_specs(), theme()).unwrap();
        let bytes = pres.to_pptx_bytes().unwrap();
        let chart_rels = read_entry(&bytes, "ppt/slides/_rels/slide3.xml.rels");
        assert!(chart_rels.contains(r#"Id="rId2""#));
        assert!(chart_rels.contains("../charts/chart1.xml"));
        let notes_rels = read_entry(&bytes, "ppt/slides/_rels/slide2.xml.rels");
        assert!(notes_rels.contains("../notesSlides/notesSlide2.xml"));
        let image_slide = read_entry(&bytes, "ppt/slides/slide4.xml");
        assert!(image_slide.contains(r#"r:embed="rId2""#));
    }

    #[test]
    fn failed_slide_leaves_deck_untouched() {
        let mut pres = Presentation::new("Deck", theme());
        pres.push(SlideSpec::new("Ok", SlidePayload::Section { subtitle: None })).unwrap();
        let bad = SlideSpec::new(
            "Broken",
            SlidePayload::Table(TableData {
                headers: vec!["A".into(), "B".into()],
                rows: vec![vec!["only one".into()]],
            }),
        );
        let err = pres.push(bad).unwrap_err();
        match err {
            DeckError::RenderError { slide, title, .. } => {
                assert_eq!(slide, 2);
                assert_eq!(title, "Broken");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(pres.len(), 1);
        assert_eq!(pres.slide_kinds(), vec![SlideKind::Section]);
    }
}
