//! DOCX reading over the raw OOXML package.
//!
//! `word/document.xml` is walked in body order: heading paragraphs become
//! `## ` lines, tables become ` | `-joined rows and are also kept as
//! [`TabularBlock`]s. Images come from `word/media/`.

use crate::pipeline::extract::{Extracted, ReadOptions, TabularBlock};
use crate::pipeline::images::ImageAsset;
use roxmltree::{Document, Node};
use std::io::{Cursor, Read};
use tracing::debug;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DOCUMENT_PART: &str = "word/document.xml";
const MEDIA_PREFIX: &str = "word/media/";

pub fn read_docx(bytes: &[u8], opts: ReadOptions) -> Result<Extracted, String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a DOCX package: {e}"))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| format!("missing {DOCUMENT_PART}: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("unreadable {DOCUMENT_PART}: {e}"))?;

    let doc = Document::parse(&xml).map_err(|e| format!("invalid {DOCUMENT_PART}: {e}"))?;
    let body = doc
        .root_element()
        .children()
        .find(|n| n.has_tag_name((W_NS, "body")))
        .ok_or_else(|| format!("{DOCUMENT_PART} has no body"))?;

    let mut text = String::new();
    let mut tables = Vec::new();
    for node in body.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "p" => {
                let line = paragraph_text(node);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if is_heading(node) {
                    text.push_str(&format!("\n## {line}\n"));
                } else {
                    text.push_str(line);
                    text.push('\n');
                }
            }
            "tbl" => {
                let rows = table_rows(node);
                for row in &rows {
                    text.push_str(&row.join(" | "));
                    text.push('\n');
                }
                text.push('\n');
                if let Some((headers, body_rows)) = rows.split_first() {
                    tables.push(TabularBlock {
                        headers: headers.clone(),
                        rows: body_rows.to_vec(),
                        caption: format!("Table {}", tables.len() + 1),
                    });
                }
            }
            _ => {}
        }
    }

    let mut images = Vec::new();
    if opts.extract_images {
        for i in 0..archive.len() {
            let Ok(mut file) = archive.by_index(i) else {
                continue;
            };
            let name = file.name().to_string();
            if !name.starts_with(MEDIA_PREFIX) {
                continue;
            }
            let mut data = Vec::new();
            if file.read_to_end(&mut data).is_err() {
                debug!("Skipping unreadable media {}", name);
                continue;
            }
            match ImageAsset::from_encoded(data, name.clone(), None) {
                Some(img) => images.push(img),
                None => debug!("Skipping non-raster media {}", name),
            }
        }
    }

    Ok(Extracted {
        text,
        tables,
        images,
    })
}

fn paragraph_text(p: Node<'_, '_>) -> String {
    let mut out = String::new();
    for n in p.descendants().filter(Node::is_element) {
        if n.tag_name().namespace() != Some(W_NS) {
            continue;
        }
        match n.tag_name().name() {
            "t" => out.push_str(n.text().unwrap_or_default()),
            "tab" => out.push('\t'),
            "br" | "cr" => out.push('\n'),
            _ => {}
        }
    }
    out
}

fn is_heading(p: Node<'_, '_>) -> bool {
    p.children()
        .find(|n| n.has_tag_name((W_NS, "pPr")))
        .and_then(|ppr| ppr.children().find(|n| n.has_tag_name((W_NS, "pStyle"))))
        .and_then(|style| style.attribute((W_NS, "val")))
        .is_some_and(|v| v.starts_with("Heading") || v == "Title")
}

fn table_rows(tbl: Node<'_, '_>) -> Vec<Vec<String>> {
    tbl.children()
        .filter(|n| n.has_tag_name((W_NS, "tr")))
        .map(|tr| {
            tr.children()
                .filter(|n| n.has_tag_name((W_NS, "tc")))
                .map(|tc| {
                    tc.children()
                        .filter(|n| n.has_tag_name((W_NS, "p")))
                        .map(|p| paragraph_text(p).trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect()
        })
        .filter(|row: &Vec<String>| row.iter().any(|c| !c.is_empty()))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    pub(crate) fn build_docx(body: &str, media: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();
        zip.start_file(DOCUMENT_PART, opts).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}"><w:body>{body}</w:body></w:document>"#
        )
        .unwrap();
        for (name, bytes) in media {
            zip.start_file(format!("{MEDIA_PREFIX}{name}"), opts).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const BODY: &str = r#"
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Roadmap</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Ship the </w:t></w:r><w:r><w:t>beta.</w:t></w:r></w:p>
<w:tbl>
  <w:tr><w:tc><w:p><w:r><w:t>Phase</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Weeks</w:t></w:r></w:p></w:tc></w:tr>
  <w:tr><w:tc><w:p><w:r><w:t>Build</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>6</w:t></w:r></w:p></w:tc></w:tr>
</w:tbl>"#;

    #[test]
    fn headings_paragraphs_and_tables() {
        let bytes = build_docx(BODY, &[]);
        let out = read_docx(&bytes, ReadOptions { extract_images: true, max_table_rows: 10 }).unwrap();
        assert!(out.text.contains("## Roadmap"));
        assert!(out.text.contains("Ship the beta."));
        assert!(out.text.contains("Phase | Weeks"));
        assert_eq!(out.tables.len(), 1);
        assert_eq!(out.tables[0].headers, vec!["Phase", "Weeks"]);
        assert_eq!(out.tables[0].rows, vec![vec!["Build".to_string(), "6".to_string()]]);
    }

    #[test]
    fn media_images_are_collected() {
        let png = crate::pipeline::images::tests::solid_png(160, 120);
        let bytes = build_docx(BODY, &[("image1.png", png), ("notes.emf", b"EMF?".to_vec())]);
        let out = read_docx(&bytes, ReadOptions { extract_images: true, max_table_rows: 10 }).unwrap();
        assert_eq!(out.images.len(), 1);
        assert_eq!(out.images[0].name, "word/media/image1.png");

        let out = read_docx(&bytes, ReadOptions { extract_images: false, max_table_rows: 10 }).unwrap();
        assert!(out.images.is_empty());
    }

    #[test]
    fn non_zip_is_an_error() {
        let err = read_docx(b"plain text", ReadOptions { extract_images: false, max_table_rows: 10 }).unwrap_err();
        assert!(err.contains("DOCX"), "got: {err}");
    }
}
