//! Drawing signatures and field outlines onto page rasters

use crate::error::{CompositingError, SigningError};
use crate::fields::Field;
use crate::pixels::pixmap_from_image;
use shared_types::{RasterImage, Rect};
use tiny_skia::{
    FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect as SkRect, Stroke, StrokeDash,
    Transform,
};

/// Running count of drawn and skipped fields
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub(crate) stamped: usize,
    pub(crate) skipped: Vec<CompositingError>,
}

impl Tally {
    pub(crate) fn record(&mut self, field: &Field, result: Result<(), String>) {
        match result {
            Ok(()) => self.stamped += 1,
            Err(reason) => self.skipped.push(skip(field, reason)),
        }
    }
}

pub(crate) fn skip(field: &Field, reason: String) -> CompositingError {
    let error = CompositingError {
        field_id: field.id,
        page_index: field.page_index,
        reason,
    };
    tracing::warn!(field = %error.field_id, page = error.page_index, reason = %error.reason, "skipping field");
    error
}

/// Field outline colours for the live preview
pub(crate) const UNSIGNED_OUTLINE: [u8; 3] = [0x3b, 0x82, 0xf6];
pub(crate) const SIGNED_OUTLINE: [u8; 3] = [0x10, 0xb9, 0x81];

/// Stretch `image` over `rect` (surface pixels, top-left origin)
///
/// # Errors
///
/// `SigningError::InvalidSurface` when `rect` is empty or not finite, so a
/// signature is never dropped without a trace.
pub(crate) fn draw_image(pixmap: &mut Pixmap, image: &RasterImage, rect: Rect) -> Result<(), SigningError> {
    if !rect.is_valid() {
        return Err(SigningError::InvalidSurface(format!(
            "cannot draw a signature into {:?}",
            rect
        )));
    }
    let source = pixmap_from_image(image)?;
    let sx = rect.width / image.width() as f64;
    let sy = rect.height / image.height() as f64;
    let transform = Transform::from_row(sx as f32, 0.0, 0.0, sy as f32, rect.x as f32, rect.y as f32);
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
    Ok(())
}

/// Outline `rect`, dashed when `dashed` is set
pub(crate) fn outline(pixmap: &mut Pixmap, rect: Rect, color: [u8; 3], width: f32, dashed: bool) {
    let Some(sk_rect) = SkRect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    ) else {
        return;
    };
    let path = PathBuilder::from_rect(sk_rect);

    let [r, g, b] = color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = true;

    let stroke = Stroke {
        width,
        dash: if dashed {
            StrokeDash::new(vec![5.0 * width / 2.0, 5.0 * width / 2.0], 0.0)
        } else {
            None
        },
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}
