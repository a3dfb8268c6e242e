//! OOXML package assembly: every part of a `.pptx`, zipped.
//!
//! Part layout:
//!
//! ```text
//! [Content_Types].xml            _rels/.rels
//! docProps/{core,app}.xml
//! ppt/presentation.xml           ppt/_rels/presentation.xml.rels
//! ppt/{presProps,viewProps,tableStyles}.xml
//! ppt/slideMasters/slideMaster1.xml   ppt/slideLayouts/slideLayout1.xml
//! ppt/theme/theme1.xml (slides)  ppt/theme/theme2.xml (notes)
//! ppt/notesMasters/notesMaster1.xml
//! ppt/slides/slideN.xml          ppt/notesSlides/notesSlideN.xml
//! ppt/charts/chartN.xml          ppt/media/imageN.{png,jpeg}
//! ```
//!
//! `presentation.xml.rels` ids are fixed: rId1 master, rId2 theme, rId3-5
//! properties, rId6 notes master, rId7 onward the slides in order.

use crate::outline::SlidePayload;
use crate::render::xml::{
    escape, relationships_xml, Relationship, NOTES_HEIGHT, NOTES_WIDTH, NS_A, NS_P, NS_R,
    REL_CORE_PROPS, REL_EXTENDED_PROPS, REL_NOTES_MASTER, REL_OFFICE_DOCUMENT, REL_PRES_PROPS,
    REL_SLIDE, REL_SLIDE_LAYOUT, REL_SLIDE_MASTER, REL_TABLE_STYLES, REL_THEME, REL_VIEW_PROPS,
    SLIDE_HEIGHT, SLIDE_WIDTH, XML_DECL,
};
use crate::render::Presentation;
use crate::theme::Theme;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const FIRST_SLIDE_REL: usize = 7;
const FIRST_SLIDE_ID: usize = 256;

const CT_PRESENTATION: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_SLIDE_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_SLIDE_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_NOTES_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
const CT_NOTES_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
const CT_PRES_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
const CT_VIEW_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
const CT_TABLE_STYLES: &str = "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_APP: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// Zip every part of `pres` into an in-memory `.pptx`.
pub fn write_package(pres: &Presentation) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, data: &[u8]| -> zip::result::ZipResult<()> {
        zip.start_file(name, opts)?;
        zip.write_all(data)?;
        Ok(())
    };

    put(&mut zip, "[Content_Types].xml", content_types(pres).as_bytes())?;
    put(
        &mut zip,
        "_rels/.rels",
        relationships_xml(&[
            Relationship::new(1, REL_OFFICE_DOCUMENT, "ppt/presentation.xml"),
            Relationship::new(2, REL_CORE_PROPS, "docProps/core.xml"),
            Relationship::new(3, REL_EXTENDED_PROPS, "docProps/app.xml"),
        ])
        .as_bytes(),
    )?;
    put(&mut zip, "docProps/core.xml", core_props(pres.title()).as_bytes())?;
    put(&mut zip, "docProps/app.xml", app_props(pres.len()).as_bytes())?;

    put(&mut zip, "ppt/presentation.xml", presentation_xml(pres.len()).as_bytes())?;
    put(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        presentation_rels(pres.len()).as_bytes(),
    )?;
    put(&mut zip, "ppt/presProps.xml", PRES_PROPS.as_bytes())?;
    put(&mut zip, "ppt/viewProps.xml", VIEW_PROPS.as_bytes())?;
    put(&mut zip, "ppt/tableStyles.xml", TABLE_STYLES.as_bytes())?;

    put(&mut zip, "ppt/slideMasters/slideMaster1.xml", slide_master(pres.theme()).as_bytes())?;
    put(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships_xml(&[
            Relationship::new(1, REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
            Relationship::new(2, REL_THEME, "../theme/theme1.xml"),
        ])
        .as_bytes(),
    )?;
    put(&mut zip, "ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT.as_bytes())?;
    put(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        relationships_xml(&[Relationship::new(1, REL_SLIDE_MASTER, "../slideMasters/slideMaster1.xml")])
            .as_bytes(),
    )?;
    put(&mut zip, "ppt/theme/theme1.xml", theme_xml(pres.theme(), "Deck").as_bytes())?;
    put(&mut zip, "ppt/theme/theme2.xml", theme_xml(pres.theme(), "Notes").as_bytes())?;
    put(&mut zip, "ppt/notesMasters/notesMaster1.xml", notes_master().as_bytes())?;
    put(
        &mut zip,
        "ppt/notesMasters/_rels/notesMaster1.xml.rels",
        relationships_xml(&[Relationship::new(1, REL_THEME, "../theme/theme2.xml")]).as_bytes(),
    )?;

    for (i, slide) in pres.slides().iter().enumerate() {
        let n = i + 1;
        put(&mut zip, &format!("ppt/slides/slide{n}.xml"), slide.xml.as_bytes())?;
        put(
            &mut zip,
            &format!("ppt/slides/_rels/slide{n}.xml.rels"),
            relationships_xml(&slide.rels).as_bytes(),
        )?;
        if let Some(notes) = &slide.spec.notes {
            put(&mut zip, &format!("ppt/notesSlides/notesSlide{n}.xml"), notes_slide(notes).as_bytes())?;
            put(
                &mut zip,
                &format!("ppt/notesSlides/_rels/notesSlide{n}.xml.rels"),
                relationships_xml(&[
                    Relationship::new(1, REL_NOTES_MASTER, "../notesMasters/notesMaster1.xml"),
                    Relationship::new(2, REL_SLIDE, format!("../slides/slide{n}.xml")),
                ])
                .as_bytes(),
            )?;
        }
        if let Some(chart) = &slide.chart {
            put(&mut zip, &format!("ppt/charts/{}", chart.name), chart.xml.as_bytes())?;
        }
        if let (Some(media), SlidePayload::Image(img)) = (&slide.media, &slide.spec.payload) {
            put(&mut zip, &format!("ppt/media/{media}"), &img.bytes)?;
        }
    }

    Ok(zip.finish()?.into_inner())
}

fn content_types(pres: &Presentation) -> String {
    let mut x = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/>"#
    );
    let mut over = |part: &str, ct: &str| {
        x.push_str(&format!(r#"<Override PartName="{part}" ContentType="{ct}"/>"#));
    };
    over("/ppt/presentation.xml", CT_PRESENTATION);
    over("/ppt/presProps.xml", CT_PRES_PROPS);
    over("/ppt/viewProps.xml", CT_VIEW_PROPS);
    over("/ppt/tableStyles.xml", CT_TABLE_STYLES);
    over("/ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER);
    over("/ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT);
    over("/ppt/theme/theme1.xml", CT_THEME);
    over("/ppt/theme/theme2.xml", CT_THEME);
    over("/ppt/notesMasters/notesMaster1.xml", CT_NOTES_MASTER);
    over("/docProps/core.xml", CT_CORE);
    over("/docProps/app.xml", CT_APP);
    for (i, slide) in pres.slides().iter().enumerate() {
        let n = i + 1;
        over(&format!("/ppt/slides/slide{n}.xml"), CT_SLIDE);
        if slide.spec.notes.is_some() {
            over(&format!("/ppt/notesSlides/notesSlide{n}.xml"), CT_NOTES_SLIDE);
        }
        if let Some(chart) = &slide.chart {
            over(&format!("/ppt/charts/{}", chart.name), CT_CHART);
        }
    }
    x.push_str("</Types>");
    x
}

fn core_props(title: &str) -> String {
    format!(
        r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>doc2pptx</dc:creator><cp:lastModifiedBy>doc2pptx</cp:lastModifiedBy><cp:revision>1</cp:revision></cp:coreProperties>"#,
        escape(title)
    )
}

fn app_props(slides: usize) -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>doc2pptx</Application><PresentationFormat>Widescreen</PresentationFormat><Slides>{slides}</Slides><AppVersion>16.0000</AppVersion></Properties>"#
    )
}

fn presentation_xml(slides: usize) -> String {
    let mut x = format!(
        r#"{XML_DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:notesMasterIdLst><p:notesMasterId r:id="rId6"/></p:notesMasterIdLst>"#
    );
    if slides > 0 {
        x.push_str("<p:sldIdLst>");
        for i in 0..slides {
            x.push_str(&format!(
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                FIRST_SLIDE_ID + i,
                FIRST_SLIDE_REL + i
            ));
        }
        x.push_str("</p:sldIdLst>");
    }
    x.push_str(&format!(
        r#"<p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}"/><p:notesSz cx="{NOTES_WIDTH}" cy="{NOTES_HEIGHT}"/><p:defaultTextStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr></p:defaultTextStyle></p:presentation>"#
    ));
    x
}

fn presentation_rels(slides: usize) -> String {
    let mut rels = vec![
        Relationship::new(1, REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
        Relationship::new(2, REL_THEME, "theme/theme1.xml"),
        Relationship::new(3, REL_PRES_PROPS, "presProps.xml"),
        Relationship::new(4, REL_VIEW_PROPS, "viewProps.xml"),
        Relationship::new(5, REL_TABLE_STYLES, "tableStyles.xml"),
        Relationship::new(6, REL_NOTES_MASTER, "notesMasters/notesMaster1.xml"),
    ];
    rels.extend((0..slides).map(|i| {
        Relationship::new(FIRST_SLIDE_REL + i, REL_SLIDE, format!("slides/slide{}.xml", i + 1))
    }));
    relationships_xml(&rels)
}

const PRES_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentationPr xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#;

const VIEW_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:viewPr xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:normalViewPr><p:restoredLeft sz="15620"/><p:restoredTop sz="94660"/></p:normalViewPr><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#;

const TABLE_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><a:tblStyleLst xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" def="{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}"/>"#;

const EMPTY_TREE: &str = r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree>"#;

const CLR_MAP: &str = r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#;

const SLIDE_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#;

fn slide_master(theme: &Theme) -> String {
    let style = |sz: u32, font: &str| {
        format!(
            r#"<a:lvl1pPr><a:defRPr sz="{}"><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="{}"/></a:defRPr></a:lvl1pPr>"#,
            sz * 100,
            theme.text,
            escape(font)
        )
    };
    format!(
        r#"{XML_DECL}<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>{EMPTY_TREE}</p:cSld>{CLR_MAP}<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle>{}</p:titleStyle><p:bodyStyle>{}</p:bodyStyle><p:otherStyle>{}</p:otherStyle></p:txStyles></p:sldMaster>"#,
        theme.background,
        style(theme.title_size, theme.title_font),
        style(theme.bullet_size, theme.body_font),
        style(18, theme.body_font)
    )
}

fn notes_master() -> String {
    format!(
        r#"{XML_DECL}<p:notesMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld>{EMPTY_TREE}</p:cSld>{CLR_MAP}</p:notesMaster>"#
    )
}

fn notes_slide(notes: &str) -> String {
    let paras: String = notes
        .lines()
        .map(|l| {
            if l.is_empty() {
                r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#.to_string()
            } else {
                format!(r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#, escape(l))
            }
        })
        .collect();
    format!(
        r#"{XML_DECL}<p:notes xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paras}</p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>"#
    )
}

/// Theme part carrying the deck palette and fonts.
fn theme_xml(theme: &Theme, name: &str) -> String {
    let palette = theme.series_palette();
    let srgb = |tag: &str, c: &str| format!(r#"<a:{tag}><a:srgbClr val="{c}"/></a:{tag}>"#);
    let mut clr = String::new();
    clr.push_str(&srgb("dk1", theme.text));
    clr.push_str(&srgb("lt1", theme.background));
    clr.push_str(&srgb("dk2", theme.primary));
    clr.push_str(&srgb("lt2", &super::layout::blend(theme.background, theme.text, 0.08)));
    for (i, c) in palette.iter().enumerate() {
        clr.push_str(&srgb(&format!("accent{}", i + 1), c));
    }
    clr.push_str(&srgb("hlink", theme.secondary));
    clr.push_str(&srgb("folHlink", theme.accent));

    let font = |tag: &str, face: &str| {
        format!(
            r#"<a:{tag}><a:latin typeface="{}"/><a:ea typeface=""/><a:cs typeface=""/></a:{tag}>"#,
            escape(face)
        )
    };
    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = |w: u32| {
        format!(r#"<a:ln w="{w}" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/></a:ln>"#)
    };
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    format!(
        r#"{XML_DECL}<a:theme xmlns:a="{NS_A}" name="{} {}"><a:themeElements><a:clrScheme name="{}">{clr}</a:clrScheme><a:fontScheme name="{}">{}{}</a:fontScheme><a:fmtScheme name="{}"><a:fillStyleLst>{solid}{solid}{solid}</a:fillStyleLst><a:lnStyleLst>{}{}{}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst><a:bgFillStyleLst>{solid}{solid}{solid}</a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#,
        escape(theme.name),
        escape(name),
        escape(theme.name),
        escape(theme.name),
        font("majorFont", theme.title_font),
        font("minorFont", theme.body_font),
        escape(theme.name),
        line(6350),
        line(12700),
        line(19050)
    )
}

/// Zip entry names of `bytes`, in archive order.
#[cfg(test)]
pub(crate) fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::find_theme;

    #[test]
    fn presentation_lists_slides_from_rid7() {
        let xml = presentation_xml(2);
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId7"/>"#));
        assert!(xml.contains(r#"<p:sldId id="257" r:id="rId8"/>"#));
        let rels = presentation_rels(2);
        assert!(rels.contains(r#"Id="rId8" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml""#));
    }

    #[test]
    fn theme_part_carries_palette_and_fonts() {
        let t = find_theme("vibrant").unwrap();
        let xml = theme_xml(t, "Deck");
        assert!(xml.contains(&format!(r#"<a:dk2><a:srgbClr val="{}"/></a:dk2>"#, t.primary)));
        assert!(xml.contains(r#"<a:latin typeface="Verdana"/>"#));
        assert_eq!(xml.matches("<a:effectStyle>").count(), 3);
    }

    #[test]
    fn roxmltree_accepts_static_parts() {
        let t = find_theme("dark").unwrap();
        for xml in [
            theme_xml(t, "Deck"),
            slide_master(t),
            notes_master(),
            notes_slide("line one\n\nline <two>"),
            presentation_xml(3),
            core_props("Q3 & beyond"),
            app_props(3),
            SLIDE_LAYOUT.to_string(),
            VIEW_PROPS.to_string(),
        ] {
            roxmltree::Document::parse(&xml).unwrap();
        }
    }
}
