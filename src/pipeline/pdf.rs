//! PDF reading: per-page text and embedded raster images.
//!
//! `lopdf` gives the page tree, so text is emitted under `--- Page N ---`
//! headers and every image keeps its page number. Some fonts defeat lopdf's
//! text decoder; when every page comes back empty the whole document is run
//! through `pdf-extract` instead, losing page boundaries but not content.
//!
//! Only image XObjects we can hand to PowerPoint unchanged are kept: JPEG
//! (`DCTDecode`) streams pass through, 8-bit RGB/Gray Flate streams are
//! re-encoded as PNG, anything else is skipped.

use crate::pipeline::extract::{Extracted, ReadOptions};
use crate::pipeline::images::ImageAsset;
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

pub fn read_pdf(bytes: &[u8], opts: ReadOptions) -> Result<Extracted, String> {
    let doc = Document::load_mem(bytes).map_err(|e| format!("corrupt PDF: {e}"))?;
    let pages = doc.get_pages();
    debug!("PDF has {} pages", pages.len());

    let mut text = String::new();
    for &page_num in pages.keys() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) if !page_text.trim().is_empty() => {
                text.push_str(&format!("\n--- Page {page_num} ---\n{}\n", page_text.trim()));
            }
            Ok(_) => {}
            Err(e) => debug!("Page {}: text extraction failed: {}", page_num, e),
        }
    }

    if text.trim().is_empty() {
        debug!("No per-page text, falling back to whole-document extraction");
        match pdf_extract::extract_text_from_mem(bytes) {
            Ok(all) => text = all,
            Err(e) => warn!("Whole-document text extraction failed: {}", e),
        }
    }

    let mut images = Vec::new();
    if opts.extract_images {
        for (&page_num, &page_id) in &pages {
            for (id, stream) in page_image_streams(&doc, page_id) {
                let name = format!("page{}-obj{}", page_num, id.0);
                match decode_image_stream(stream, &name, page_num as usize) {
                    Some(asset) => images.push(asset),
                    None => debug!("Skipping undecodable image {}", name),
                }
            }
        }
    }

    Ok(Extracted {
        text,
        tables: Vec::new(),
        images,
    })
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d),
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        _ => None,
    }
}

/// Image XObjects referenced from a page's own resources.
fn page_image_streams(doc: &Document, page_id: ObjectId) -> Vec<(ObjectId, &Stream)> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    let Some(resources) = page.get(b"Resources").ok().and_then(|r| resolve_dict(doc, r)) else {
        return Vec::new();
    };
    let Some(xobjects) = resources.get(b"XObject").ok().and_then(|x| resolve_dict(doc, x)) else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, obj)| {
            let id = obj.as_reference().ok()?;
            let stream = doc.get_object(id).ok()?.as_stream().ok()?;
            let subtype = stream.dict.get(b"Subtype").ok()?.as_name().ok()?;
            (subtype == b"Image").then_some((id, stream))
        })
        .collect()
}

fn filter_names(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![n.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_image_stream(stream: &Stream, name: &str, page: usize) -> Option<ImageAsset> {
    let filters = filter_names(&stream.dict);
    let raw = match filters.as_slice() {
        [f] if f == b"DCTDecode" => {
            return ImageAsset::from_encoded(stream.content.clone(), name, Some(page));
        }
        [f] if f == b"FlateDecode" => stream.decompressed_content().ok()?,
        [] => stream.content.clone(),
        _ => return None,
    };

    let width = stream.dict.get(b"Width").ok()?.as_i64().ok()?;
    let height = stream.dict.get(b"Height").ok()?.as_i64().ok()?;
    let bpc = stream.dict.get(b"BitsPerComponent").ok()?.as_i64().ok()?;
    if bpc != 8 || width <= 0 || height <= 0 {
        return None;
    }
    let color_space = stream.dict.get(b"ColorSpace").ok()?.as_name().ok()?;
    let img = raw_to_image(&raw, width as u32, height as u32, color_space)?;
    ImageAsset::from_image(&img, name, Some(page))
}

fn raw_to_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = width as usize * height as usize;
    match color_space {
        b"DeviceRGB" => {
            let buf = data.get(..pixels * 3)?.to_vec();
            RgbImage::from_raw(width, height, buf).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" => {
            let buf = data.get(..pixels)?.to_vec();
            GrayImage::from_raw(width, height, buf).map(DynamicImage::ImageLuma8)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::dictionary;

    /// One A4 page per entry; `None` leaves the page blank.
    fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let operations = match text {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => Vec::new(),
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn page_text_is_extracted_under_page_markers() {
        let bytes = build_pdf(&[Some("Hello quarterly world"), Some("Second page numbers")]);
        let out = read_pdf(&bytes, ReadOptions { extract_images: true, max_table_rows: 10 }).unwrap();
        assert!(out.text.contains("--- Page 1 ---"), "{:?}", out.text);
        assert!(out.text.contains("Hello quarterly world"), "{:?}", out.text);
        assert!(out.text.contains("--- Page 2 ---"), "{:?}", out.text);
        assert!(out.text.contains("Second page numbers"), "{:?}", out.text);
        assert!(out.text.find("Page 1").unwrap() < out.text.find("Page 2").unwrap());
        assert!(out.images.is_empty());
    }

    #[test]
    fn blank_page_reads_as_empty_text() {
        let bytes = build_pdf(&[None]);
        let out = read_pdf(&bytes, ReadOptions { extract_images: true, max_table_rows: 10 }).unwrap();
        assert!(out.text.trim().is_empty(), "{:?}", out.text);
        assert!(out.images.is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        let err = read_pdf(b"%PDF-1.4 not really", ReadOptions { extract_images: true, max_table_rows: 10 }).unwrap_err();
        assert!(err.contains("corrupt"), "got: {err}");
    }

    #[test]
    fn raw_rgb_to_image() {
        let data = vec![255u8; 4 * 3 * 3];
        let img = raw_to_image(&data, 4, 3, b"DeviceRGB").unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(raw_to_image(&[0u8; 5], 4, 3, b"DeviceGray").is_none());
        assert!(raw_to_image(&[0u8; 64], 4, 3, b"DeviceCMYK").is_none());
    }

    #[test]
    fn filter_names_accepts_name_or_array() {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        assert_eq!(filter_names(&dict), vec![b"DCTDecode".to_vec()]);

        let mut dict = Dictionary::new();
        dict.set(
            "Filter",
            Object::Array(vec![Object::Name(b"FlateDecode".to_vec())]),
        );
        assert_eq!(filter_names(&dict), vec![b"FlateDecode".to_vec()]);
    }
}
