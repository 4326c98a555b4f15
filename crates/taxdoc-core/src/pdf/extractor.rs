//! PDF text and image extraction using lopdf and pdf-extract.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PdfType, Result};
use crate::error::PdfError;

/// A loaded PDF document.
pub struct PdfExtractor {
    document: Document,
    raw_data: Vec<u8>,
}

/// Embedded text and its classification.
#[derive(Debug, Clone)]
pub struct PdfContent {
    pub pdf_type: PdfType,
    pub text: String,
    pub page_count: u32,
}

impl PdfExtractor {
    /// Load a PDF from bytes, decrypting it when the password is empty.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads the decrypted copy
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self { document, raw_data })
    }

    /// Read and load the PDF at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::load(&data)
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Text of every page.
    pub fn extract_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Extract the embedded text and classify the document.
    ///
    /// Text extraction failures are treated as an empty text layer.
    pub fn analyze(&self, min_text_length: usize) -> PdfContent {
        let text = match self.extract_text() {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                debug!("No usable text layer: {}", e);
                String::new()
            }
        };
        let images = self.image_object_count();
        let pdf_type = PdfType::classify(text.chars().count(), min_text_length, images);

        debug!(
            "PDF analysis: {} pages, {} chars text, {} images -> {:?}",
            self.page_count(),
            text.len(),
            images,
            pdf_type
        );

        PdfContent {
            pdf_type,
            text,
            page_count: self.page_count(),
        }
    }

    /// First decodable image on page 1, falling back to any image object.
    pub fn first_page_image(&self) -> Result<DynamicImage> {
        let pages = self.document.get_pages();
        let first_page = pages.values().next().copied().ok_or(PdfError::NoPages)?;

        if let Some(image) = self.page_images(first_page).into_iter().next() {
            return Ok(image);
        }

        trace!("No XObject image on the first page, scanning all objects");
        self.document
            .objects
            .values()
            .find_map(|object| decode_image(&self.document, object))
            .ok_or_else(|| PdfError::ImageExtraction("no decodable image in PDF".to_string()))
    }

    fn page_images(&self, page_id: ObjectId) -> Vec<DynamicImage> {
        let doc = &self.document;
        let Some(resources) = page_resources(doc, page_id) else {
            return Vec::new();
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Vec::new();
        };
        let Ok((_, Object::Dictionary(xobjects))) = doc.dereference(xobjects) else {
            return Vec::new();
        };

        xobjects
            .iter()
            .filter_map(|(_, reference)| doc.dereference(reference).ok())
            .filter_map(|(_, object)| decode_image(doc, object))
            .collect()
    }

    fn image_object_count(&self) -> usize {
        self.document
            .objects
            .values()
            .filter(|object| match object {
                Object::Stream(stream) => is_image(&stream.dict),
                _ => false,
            })
            .count()
    }
}

fn is_image(dict: &lopdf::Dictionary) -> bool {
    dict.get(b"Subtype")
        .and_then(|s| s.as_name())
        .map(|name| name == b"Image")
        .unwrap_or(false)
}

/// Page resources, following `Parent` links for inherited dictionaries.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<lopdf::Dictionary> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(resources))) = doc.dereference(resources) {
            return Some(resources.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent)) => page_resources(doc, *parent),
        _ => None,
    }
}

fn decode_image(doc: &Document, object: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = object else {
        return None;
    };
    let dict = &stream.dict;
    if !is_image(dict) {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("Image object {}x{}", width, height);

    let filter = dict.get(b"Filter").ok().and_then(|f| match f {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(filters) => filters.last().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter {
        Some(b"DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Unsupported image filter {:?}", filter.map(String::from_utf8_lossy));
            return None;
        }
        _ => {}
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return None;
    }

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(items) => items.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    raw_pixels(data, width, height, color_space)
}

fn raw_pixels(mut data: Vec<u8>, width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = width as usize * height as usize;
    match color_space {
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            data.truncate(pixels);
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            data.truncate(pixels * 3);
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        _ => {
            trace!(
                "Could not decode {} bytes as {}",
                data.len(),
                String::from_utf8_lossy(color_space)
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{dictionary, Stream};

    use super::*;

    /// One page whose only content is a 2x2 grayscale image.
    fn image_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0, 255, 255, 0],
        ));
        let resources_id = doc.add_object(dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            PdfExtractor::load(b"definitely not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_first_page_image() {
        let pdf = PdfExtractor::load(&image_pdf()).unwrap();
        assert_eq!(pdf.page_count(), 1);

        let image = pdf.first_page_image().unwrap().to_luma8();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0)[0], 0);
        assert_eq!(image.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_scanned_pdf_is_image_type() {
        let pdf = PdfExtractor::load(&image_pdf()).unwrap();
        let content = pdf.analyze(50);
        assert_eq!(content.pdf_type, PdfType::Image);
        assert!(content.text.is_empty());
    }

    #[test]
    fn test_raw_pixels_rejects_short_data() {
        assert!(raw_pixels(vec![1, 2, 3], 2, 2, b"DeviceGray").is_none());
        assert!(raw_pixels(vec![0; 12], 2, 2, b"DeviceRGB").is_some());
        assert!(raw_pixels(vec![0; 16], 2, 2, b"DeviceCMYK").is_none());
    }
}
