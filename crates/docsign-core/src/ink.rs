//! Freehand signature capture
//!
//! Strokes are rasterized straight into a backing pixmap sized for the
//! device pixel ratio. Input points arrive in the pad's CSS space and every
//! draw call is scaled by the ratio, so one CSS pixel covers `dpr` backing
//! pixels and the result stays sharp on high-density screens.

use crate::config::{parse_hex_color, CaptureConfig};
use crate::error::SigningError;
use crate::pixels::image_from_pixmap;
use crate::signature::SignatureImage;
use shared_types::{Point, Size};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Stroke,
    Transform,
};

/// Pen settings for the pad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InkStyle {
    pub color: [u8; 3],
    /// Stroke width in CSS pixels
    pub width: f64,
    /// Opaque pad background, `None` for a transparent pad
    pub background: Option<[u8; 3]>,
}

impl Default for InkStyle {
    fn default() -> Self {
        Self {
            color: [0x1f, 0x29, 0x37],
            width: 2.0,
            background: None,
        }
    }
}

impl InkStyle {
    fn background_color(&self) -> Color {
        match self.background {
            Some([r, g, b]) => Color::from_rgba8(r, g, b, 255),
            None => Color::TRANSPARENT,
        }
    }

    fn paint(&self) -> Paint<'static> {
        let [r, g, b] = self.color;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, 255);
        paint.anti_alias = true;
        paint
    }
}

/// A drawing surface that accumulates strokes into a raster
pub struct InkCapture {
    pixmap: Pixmap,
    css_size: Size,
    device_pixel_ratio: f64,
    style: InkStyle,
    background: PremultipliedColorU8,
    last_point: Option<Point>,
    confirmed: Option<SignatureImage>,
}

impl std::fmt::Debug for InkCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InkCapture")
            .field("css_size", &self.css_size)
            .field("device_pixel_ratio", &self.device_pixel_ratio)
            .field("backing", &(self.pixmap.width(), self.pixmap.height()))
            .field("drawing", &self.last_point.is_some())
            .field("confirmed", &self.confirmed.is_some())
            .finish()
    }
}

fn allocate(css_size: Size, device_pixel_ratio: f64, background: Color) -> Result<Pixmap, SigningError> {
    if !css_size.is_positive() {
        return Err(SigningError::InvalidSurface(format!(
            "pad size {}x{} must be positive",
            css_size.width, css_size.height
        )));
    }
    if !(device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0) {
        return Err(SigningError::InvalidSurface(format!(
            "device pixel ratio {} must be positive",
            device_pixel_ratio
        )));
    }
    let width = (css_size.width * device_pixel_ratio).ceil() as u32;
    let height = (css_size.height * device_pixel_ratio).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        SigningError::InvalidSurface(format!("cannot allocate {}x{} surface", width, height))
    })?;
    pixmap.fill(background);
    Ok(pixmap)
}

impl InkCapture {
    pub fn new(css_size: Size, device_pixel_ratio: f64, style: InkStyle) -> Result<Self, SigningError> {
        let background_color = style.background_color();
        let pixmap = allocate(css_size, device_pixel_ratio, background_color)?;
        Ok(Self {
            pixmap,
            css_size,
            device_pixel_ratio,
            style,
            background: background_color.premultiply().to_color_u8(),
            last_point: None,
            confirmed: None,
        })
    }

    pub fn from_config(config: &CaptureConfig) -> Result<Self, SigningError> {
        let color = parse_hex_color(&config.stroke_color)
            .map_err(|e| SigningError::InvalidSurface(e.to_string()))?;
        let style = InkStyle {
            color,
            width: config.stroke_width,
            background: None,
        };
        Self::new(
            Size::new(config.css_width, config.css_height),
            config.device_pixel_ratio,
            style,
        )
    }

    /// Reallocate the backing raster for a new layout size or pixel ratio
    ///
    /// Like resizing a canvas, this discards all ink and any confirmation.
    pub fn resize(&mut self, css_size: Size, device_pixel_ratio: f64) -> Result<(), SigningError> {
        self.pixmap = allocate(css_size, device_pixel_ratio, self.style.background_color())?;
        self.css_size = css_size;
        self.device_pixel_ratio = device_pixel_ratio;
        self.last_point = None;
        self.confirmed = None;
        Ok(())
    }

    pub fn css_size(&self) -> Size {
        self.css_size
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Backing raster size in device pixels
    pub fn backing_size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn transform(&self) -> Transform {
        let s = self.device_pixel_ratio as f32;
        Transform::from_scale(s, s)
    }

    /// Start a stroke at `point` (pad-local CSS pixels)
    ///
    /// A round dot is laid down immediately so a tap without movement
    /// still leaves a mark.
    pub fn begin_stroke(&mut self, point: Point) {
        if !point.is_finite() {
            return;
        }
        self.confirmed = None;
        self.last_point = Some(point);

        let radius = (self.style.width / 2.0) as f32;
        if let Some(dot) = PathBuilder::from_circle(point.x as f32, point.y as f32, radius) {
            let transform = self.transform();
            self.pixmap
                .fill_path(&dot, &self.style.paint(), FillRule::Winding, transform, None);
        }
    }

    /// Continue the active stroke to `point`; ignored when no stroke is active
    pub fn extend_stroke(&mut self, point: Point) {
        let Some(prev) = self.last_point else {
            return;
        };
        if !point.is_finite() {
            return;
        }
        // More ink makes any earlier confirmation a partial signature
        self.confirmed = None;

        let mut pb = PathBuilder::new();
        pb.move_to(prev.x as f32, prev.y as f32);
        pb.line_to(point.x as f32, point.y as f32);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width: self.style.width as f32,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            let transform = self.transform();
            self.pixmap
                .stroke_path(&path, &self.style.paint(), &stroke, transform, None);
        }
        self.last_point = Some(point);
    }

    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }

    pub fn is_drawing(&self) -> bool {
        self.last_point.is_some()
    }

    /// True iff any backing pixel differs from the pad background
    pub fn has_ink(&self) -> bool {
        self.pixmap.pixels().iter().any(|px| *px != self.background)
    }

    /// Freeze the current ink into a signature image
    ///
    /// # Errors
    ///
    /// `SigningError::EmptyCapture` when nothing has been drawn
    pub fn confirm(&mut self) -> Result<SignatureImage, SigningError> {
        if !self.has_ink() {
            return Err(SigningError::EmptyCapture);
        }
        let image = image_from_pixmap(&self.pixmap)?;
        let signature = SignatureImage::encode(&image)?;
        tracing::debug!(
            width = signature.width(),
            height = signature.height(),
            bytes = signature.bytes().len(),
            "signature confirmed"
        );
        self.confirmed = Some(signature.clone());
        Ok(signature)
    }

    /// The most recently confirmed signature, if it is still current
    pub fn confirmed(&self) -> Option<&SignatureImage> {
        self.confirmed.as_ref()
    }

    /// Wipe the pad and drop any confirmation
    pub fn clear(&mut self) {
        self.pixmap.fill(self.style.background_color());
        self.last_point = None;
        self.confirmed = None;
    }
}
