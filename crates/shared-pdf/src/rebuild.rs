//! Rebuild a PDF from full-page rasters
//!
//! Used when the source document cannot be edited in place. The output has
//! one page per raster, each sized to the page's native dimensions and
//! painted edge to edge with its image.

use crate::error::PdfError;
use crate::xobject::add_image_xobject;
use chrono::Utc;
use lopdf::{dictionary, Document, Object, StringFormat, Stream};
use shared_types::{PageDimensions, RasterImage};

/// Subject written into the Info dictionary of rebuilt files
pub const RASTERIZED_SUBJECT: &str = "Rasterized reconstruction";

/// One output page
pub struct RasterPage<'a> {
    pub dimensions: PageDimensions,
    pub image: &'a RasterImage,
}

/// Assemble `pages` into a new PDF and serialize it
pub fn assemble_from_rasters(pages: &[RasterPage<'_>], producer: &str) -> Result<Vec<u8>, PdfError> {
    if pages.is_empty() {
        return Err(PdfError::Malformed("no pages to assemble".to_string()));
    }

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for page in pages {
        let PageDimensions {
            width_units: w,
            height_units: h,
            ..
        } = page.dimensions;
        if !page.dimensions.is_valid() {
            return Err(PdfError::Malformed(format!(
                "page size {}x{} is not drawable",
                w, h
            )));
        }

        let image_id = add_image_xobject(&mut doc, page.image)?;
        let content = format!("q\n{:.4} 0 0 {:.4} 0 0 cm\n/Im0 Do\nQ\n", w, h);
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(w as f32), Object::Real(h as f32)],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let now = Utc::now().format("D:%Y%m%d%H%M%S+00'00'").to_string();
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::String(producer.as_bytes().to_vec(), StringFormat::Literal),
        "Subject" => Object::String(RASTERIZED_SUBJECT.as_bytes().to_vec(), StringFormat::Literal),
        "CreationDate" => Object::String(now.into_bytes(), StringFormat::Literal),
    });
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfError::Save(e.to_string()))?;
    tracing::debug!(pages = pages.len(), bytes = buffer.len(), "assembled rasterized PDF");
    Ok(buffer)
}
