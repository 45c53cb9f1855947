//! Conversions between tiny-skia surfaces and straight-alpha rasters

use shared_types::{ImageError, RasterImage};
use tiny_skia::{ColorU8, Pixmap};

/// Copy a pixmap out as straight-alpha RGBA
pub(crate) fn image_from_pixmap(pixmap: &Pixmap) -> Result<RasterImage, ImageError> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RasterImage::from_rgba(pixmap.width(), pixmap.height(), rgba)
}

/// Load a straight-alpha raster into a premultiplied pixmap
pub(crate) fn pixmap_from_image(image: &RasterImage) -> Result<Pixmap, ImageError> {
    let mut pixmap = Pixmap::new(image.width(), image.height()).ok_or(ImageError::Empty)?;
    for (dst, src) in pixmap
        .pixels_mut()
        .iter_mut()
        .zip(image.pixels().chunks_exact(4))
    {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Ok(pixmap)
}
