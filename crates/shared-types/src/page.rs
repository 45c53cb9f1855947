//! Page geometry in native units and as rendered

/// US Letter in PDF points, used when a page carries no usable MediaBox
pub const LETTER_WIDTH_PT: f64 = 612.0;
pub const LETTER_HEIGHT_PT: f64 = 792.0;

/// Native size of a page
///
/// Units are PDF points for paginated documents and source pixels for
/// raster images. `origin_x`/`origin_y` hold the lower-left corner of the
/// MediaBox, which is non-zero for some producers.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageDimensions {
    pub width_units: f64,
    pub height_units: f64,
    #[serde(default)]
    pub origin_x: f64,
    #[serde(default)]
    pub origin_y: f64,
}

impl PageDimensions {
    pub const fn new(width_units: f64, height_units: f64) -> Self {
        Self {
            width_units,
            height_units,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }

    pub const fn letter() -> Self {
        Self::new(LETTER_WIDTH_PT, LETTER_HEIGHT_PT)
    }

    /// Build from a `[x, y, width, height]` MediaBox
    pub fn from_media_box(media_box: [f64; 4]) -> Self {
        let [x, y, width, height] = media_box;
        Self {
            width_units: width,
            height_units: height,
            origin_x: x,
            origin_y: y,
        }
    }

    pub fn media_box(&self) -> [f64; 4] {
        [
            self.origin_x,
            self.origin_y,
            self.width_units,
            self.height_units,
        ]
    }

    pub fn is_valid(&self) -> bool {
        self.width_units.is_finite()
            && self.height_units.is_finite()
            && self.width_units > 0.0
            && self.height_units > 0.0
    }
}

/// Geometry of one page as it was last rasterized
///
/// Recomputed on every render and never persisted. Fields keep a copy of the
/// `RenderedPage` they were placed against so their surface rectangle can be
/// mapped back to the document later.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderedPage {
    pub page_index: usize,
    pub surface_width_px: u32,
    pub surface_height_px: u32,
    pub native_width_units: f64,
    pub native_height_units: f64,
    #[serde(default)]
    pub native_origin_x: f64,
    #[serde(default)]
    pub native_origin_y: f64,
    /// Surface pixels per native unit, `surface_width_px / native_width_units`
    pub render_scale: f64,
}

impl RenderedPage {
    /// Geometry of `dims` rasterized at `scale` surface pixels per native unit
    ///
    /// The surface is rounded up to whole pixels on each axis.
    pub fn new(page_index: usize, dims: PageDimensions, scale: f64) -> Self {
        let surface_width_px = surface_extent(dims.width_units * scale);
        let surface_height_px = surface_extent(dims.height_units * scale);
        Self::with_surface(page_index, dims, surface_width_px, surface_height_px)
    }

    /// Geometry for an explicitly sized surface
    pub fn with_surface(
        page_index: usize,
        dims: PageDimensions,
        surface_width_px: u32,
        surface_height_px: u32,
    ) -> Self {
        Self {
            page_index,
            surface_width_px,
            surface_height_px,
            native_width_units: dims.width_units,
            native_height_units: dims.height_units,
            native_origin_x: dims.origin_x,
            native_origin_y: dims.origin_y,
            render_scale: surface_width_px as f64 / dims.width_units,
        }
    }

    pub fn dimensions(&self) -> PageDimensions {
        PageDimensions {
            width_units: self.native_width_units,
            height_units: self.native_height_units,
            origin_x: self.native_origin_x,
            origin_y: self.native_origin_y,
        }
    }

    pub fn surface_width(&self) -> f64 {
        self.surface_width_px as f64
    }

    pub fn surface_height(&self) -> f64 {
        self.surface_height_px as f64
    }
}

/// Whole pixels needed to cover `units`, ignoring float noise around integers
fn surface_extent(units: f64) -> u32 {
    if !(units.is_finite() && units >= 1.0) {
        return 1;
    }
    let nearest = units.round();
    let px = if (units - nearest).abs() < 1e-6 {
        nearest
    } else {
        units.ceil()
    };
    px.min(u32::MAX as f64) as u32
}
