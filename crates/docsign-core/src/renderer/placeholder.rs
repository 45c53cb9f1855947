use super::{check_page, plan_render, ExportCapability, PageRaster, RendererAdapter};
use crate::error::SigningError;
use shared_types::PageDimensions;
use tiny_skia::{Color, Paint, PathBuilder, Rect as SkRect, Stroke, Transform};

pub const PLACEHOLDER_WIDTH: f64 = 600.0;
pub const PLACEHOLDER_HEIGHT: f64 = 800.0;

const BORDER: [u8; 3] = [0xe5, 0xe7, 0xeb];
const BAR: [u8; 3] = [0xd1, 0xd5, 0xdb];

/// Header bar followed by body text lines, in page units (x, y, w, h)
const LAYOUT: &[(f32, f32, f32, f32)] = &[
    (60.0, 60.0, 280.0, 24.0),
    (60.0, 120.0, 480.0, 10.0),
    (60.0, 145.0, 460.0, 10.0),
    (60.0, 170.0, 480.0, 10.0),
    (60.0, 195.0, 300.0, 10.0),
    (60.0, 245.0, 480.0, 10.0),
    (60.0, 270.0, 440.0, 10.0),
    (60.0, 295.0, 360.0, 10.0),
];

/// A single blank sheet used when the real document cannot be rendered
///
/// Fields can still be placed on it. Exports are rebuilt from rasters since
/// there is nothing to stamp onto.
#[derive(Debug, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn solid([r, g, b]: [u8; 3]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = true;
    paint
}

impl RendererAdapter for PlaceholderRenderer {
    fn page_count(&self) -> usize {
        1
    }

    fn page_dimensions(&self, page_index: usize) -> Result<PageDimensions, SigningError> {
        check_page(page_index, 1)?;
        Ok(PageDimensions::new(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT))
    }

    async fn render_page(&self, page_index: usize, scale: f64) -> Result<PageRaster, SigningError> {
        let page = plan_render(self, page_index, scale)?;
        let mut raster = PageRaster::blank(page, Color::WHITE)?;
        let transform = Transform::from_scale(
            (page.surface_width() / PLACEHOLDER_WIDTH) as f32,
            (page.surface_height() / PLACEHOLDER_HEIGHT) as f32,
        );

        let bar = solid(BAR);
        for &(x, y, w, h) in LAYOUT {
            if let Some(rect) = SkRect::from_xywh(x, y, w, h) {
                raster.pixmap.fill_rect(rect, &bar, transform, None);
            }
        }

        let frame = SkRect::from_xywh(
            1.0,
            1.0,
            PLACEHOLDER_WIDTH as f32 - 2.0,
            PLACEHOLDER_HEIGHT as f32 - 2.0,
        )
        .map(PathBuilder::from_rect);
        if let Some(frame) = frame {
            let stroke = Stroke {
                width: 2.0,
                ..Stroke::default()
            };
            raster
                .pixmap
                .stroke_path(&frame, &solid(BORDER), &stroke, transform, None);
        }

        Ok(raster)
    }

    fn export_capability(&self) -> ExportCapability {
        ExportCapability::RasterOnly
    }
}
