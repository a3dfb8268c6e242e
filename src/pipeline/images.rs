//! Image assets: size filtering, normalisation to PNG/JPEG, data URIs.
//!
//! PPTX media parts and HTML data URIs both accept PNG and JPEG everywhere,
//! so anything else (GIF, raw PDF pixel buffers) is re-encoded as PNG once,
//! here, and the rest of the pipeline only ever sees those two formats.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }
}

/// An embedded image discovered during extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    /// 1-indexed source page, when the format has pages.
    pub page: Option<usize>,
    /// Name inside the source container, e.g. `word/media/image1.png`.
    pub name: String,
}

impl ImageAsset {
    /// Decode `bytes` to learn the dimensions, re-encoding to PNG unless they
    /// are already PNG or JPEG. Returns `None` for undecodable data.
    pub fn from_encoded(bytes: Vec<u8>, name: impl Into<String>, page: Option<usize>) -> Option<Self> {
        let format = image::guess_format(&bytes).ok()?;
        let img = image::load_from_memory(&bytes).ok()?;
        let (width, height) = (img.width(), img.height());
        let (bytes, kind) = match format {
            ImageFormat::Png => (bytes, ImageKind::Png),
            ImageFormat::Jpeg => (bytes, ImageKind::Jpeg),
            _ => (encode_png(&img)?, ImageKind::Png),
        };
        Some(Self {
            bytes,
            kind,
            width,
            height,
            page,
            name: name.into(),
        })
    }

    /// Wrap an already-decoded image as PNG.
    pub fn from_image(img: &DynamicImage, name: impl Into<String>, page: Option<usize>) -> Option<Self> {
        Some(Self {
            bytes: encode_png(img)?,
            kind: ImageKind::Png,
            width: img.width(),
            height: img.height(),
            page,
            name: name.into(),
        })
    }

    /// Both sides must reach `min_px`.
    pub fn meets_minimum(&self, min_px: u32) -> bool {
        self.width >= min_px && self.height >= min_px
    }

    /// `data:` URI for self-contained HTML.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.kind.mime(), STANDARD.encode(&self.bytes))
    }
}

fn encode_png(img: &DynamicImage) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).ok()?;
    debug!("Re-encoded {}x{} image → {} bytes PNG", img.width(), img.height(), buf.len());
    Some(buf)
}

/// Keep images that meet the size floor, stopping at `max_images`.
pub fn filter_images(images: Vec<ImageAsset>, min_px: u32, max_images: usize) -> Vec<ImageAsset> {
    let total = images.len();
    let kept: Vec<ImageAsset> = images
        .into_iter()
        .filter(|img| img.meets_minimum(min_px))
        .take(max_images)
        .collect();
    if kept.len() < total {
        debug!("Kept {}/{} images (min {}px, max {})", kept.len(), total, min_px, max_images);
    }
    kept
}
