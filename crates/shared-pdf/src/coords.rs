//! Coordinate transformation between display, surface and document space
//!
//! * display: CSS pixels as laid out on screen, top-left origin
//! * surface: backing pixels of the rendered page, top-left origin
//! * document: native page units, bottom-left origin for paginated documents
//!
//! Every surface value is in backing pixels. Each map below is the exact
//! affine inverse of its partner.

use shared_types::{Point, Rect, RenderedPage, Size};

/// Display pixels to surface pixels, independently per axis
pub fn display_to_surface(point: Point, display: Size, page: &RenderedPage) -> Point {
    point.scale(
        page.surface_width() / display.width,
        page.surface_height() / display.height,
    )
}

/// Surface pixels to display pixels
pub fn surface_to_display(point: Point, display: Size, page: &RenderedPage) -> Point {
    point.scale(
        display.width / page.surface_width(),
        display.height / page.surface_height(),
    )
}

/// Convert a display-space rectangle to surface space
pub fn display_rect_to_surface(rect: Rect, display: Size, page: &RenderedPage) -> Rect {
    rect.scale(
        page.surface_width() / display.width,
        page.surface_height() / display.height,
    )
}

/// Convert a surface-space rectangle to display space
pub fn surface_rect_to_display(rect: Rect, display: Size, page: &RenderedPage) -> Rect {
    rect.scale(
        display.width / page.surface_width(),
        display.height / page.surface_height(),
    )
}

/// Native units per surface pixel on each axis
fn units_per_pixel(page: &RenderedPage) -> (f64, f64) {
    (
        page.native_width_units / page.surface_width(),
        page.native_height_units / page.surface_height(),
    )
}

/// Surface point (top-left origin) to document point (bottom-left origin)
pub fn surface_to_document(point: Point, page: &RenderedPage) -> Point {
    let (ux, uy) = units_per_pixel(page);
    Point::new(
        page.native_origin_x + point.x * ux,
        page.native_origin_y + page.native_height_units - point.y * uy,
    )
}

/// Document point to surface point
pub fn document_to_surface(point: Point, page: &RenderedPage) -> Point {
    let (ux, uy) = units_per_pixel(page);
    Point::new(
        (point.x - page.native_origin_x) / ux,
        (page.native_origin_y + page.native_height_units - point.y) / uy,
    )
}

/// Surface rectangle to document rectangle anchored at its bottom-left corner
pub fn rect_to_document(rect: Rect, page: &RenderedPage) -> Rect {
    let (ux, uy) = units_per_pixel(page);
    Rect::new(
        page.native_origin_x + rect.x * ux,
        page.native_origin_y + page.native_height_units - (rect.y + rect.height) * uy,
        rect.width * ux,
        rect.height * uy,
    )
}

/// Document rectangle (bottom-left anchored) back to a top-left surface rectangle
pub fn rect_from_document(rect: Rect, page: &RenderedPage) -> Rect {
    let (ux, uy) = units_per_pixel(page);
    Rect::new(
        (rect.x - page.native_origin_x) / ux,
        (page.native_origin_y + page.native_height_units - rect.y - rect.height) / uy,
        rect.width / ux,
        rect.height / uy,
    )
}

/// Surface rectangle to native units without flipping Y
///
/// Raster documents keep a top-left origin in native space, so only the
/// scale changes.
pub fn rect_to_native(rect: Rect, page: &RenderedPage) -> Rect {
    let (ux, uy) = units_per_pixel(page);
    rect.scale(ux, uy)
}

/// Re-project a surface rectangle placed on `from` onto a render `to` of the same page
pub fn rescale_rect(rect: Rect, from: &RenderedPage, to: &RenderedPage) -> Rect {
    rect_from_document(rect_to_document(rect, from), to)
}
