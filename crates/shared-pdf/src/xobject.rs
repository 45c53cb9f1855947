//! Image XObjects built from RGBA rasters

use crate::error::PdfError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use shared_types::RasterImage;
use std::io::Write;

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn image_stream(width: u32, height: u32, color_space: &[u8], samples: &[u8]) -> Result<Stream, PdfError> {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

    let mut stream = Stream::new(dict, deflate(samples)?);
    // Already deflated; keep lopdf from compressing again
    stream.allows_compression = false;
    Ok(stream)
}

/// Add `image` to `doc` as a DeviceRGB image XObject
///
/// Transparent pixels are carried by a DeviceGray soft mask, so ink drawn on
/// a transparent pad composites over the page instead of covering it.
pub fn add_image_xobject(doc: &mut Document, image: &RasterImage) -> Result<ObjectId, PdfError> {
    let (rgb, alpha) = image.split_alpha();
    let mut stream = image_stream(image.width(), image.height(), b"DeviceRGB", &rgb)?;

    if !image.is_opaque() {
        let mask = image_stream(image.width(), image.height(), b"DeviceGray", &alpha)?;
        let mask_id = doc.add_object(mask);
        stream.dict.set("SMask", Object::Reference(mask_id));
    }

    Ok(doc.add_object(stream))
}
