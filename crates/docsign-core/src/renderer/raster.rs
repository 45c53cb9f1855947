use super::{check_page, plan_render, ExportCapability, PageRaster, RendererAdapter};
use crate::error::{DocumentError, SigningError};
use crate::pixels::pixmap_from_image;
use shared_types::{PageDimensions, RasterImage};
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, Transform};

/// Renderer for single-image documents
///
/// Native units are source pixels with a top-left origin, so a render at
/// scale 1 reproduces the original image exactly.
pub struct RasterRenderer {
    source: Pixmap,
}

impl std::fmt::Debug for RasterRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterRenderer")
            .field("width", &self.source.width())
            .field("height", &self.source.height())
            .finish()
    }
}

impl RasterRenderer {
    pub fn open(bytes: &[u8]) -> Result<Self, DocumentError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| match e {
            image::ImageError::Unsupported(_) => DocumentError::UnsupportedFormat(e.to_string()),
            other => DocumentError::CorruptedDocument(other.to_string()),
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let image = RasterImage::from_rgba(width, height, rgba.into_raw())
            .map_err(|e| DocumentError::CorruptedDocument(e.to_string()))?;
        let source =
            pixmap_from_image(&image).map_err(|e| DocumentError::CorruptedDocument(e.to_string()))?;

        tracing::debug!(width, height, "opened raster image");
        Ok(Self { source })
    }
}

impl RendererAdapter for RasterRenderer {
    fn page_count(&self) -> usize {
        1
    }

    fn page_dimensions(&self, page_index: usize) -> Result<PageDimensions, SigningError> {
        check_page(page_index, 1)?;
        Ok(PageDimensions::new(
            self.source.width() as f64,
            self.source.height() as f64,
        ))
    }

    async fn render_page(&self, page_index: usize, scale: f64) -> Result<PageRaster, SigningError> {
        let page = plan_render(self, page_index, scale)?;
        let mut raster = PageRaster::blank(page, Color::TRANSPARENT)?;

        let sx = page.surface_width() / self.source.width() as f64;
        let sy = page.surface_height() / self.source.height() as f64;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        raster.pixmap.draw_pixmap(
            0,
            0,
            self.source.as_ref(),
            &paint,
            Transform::from_scale(sx as f32, sy as f32),
            None,
        );
        Ok(raster)
    }

    fn export_capability(&self) -> ExportCapability {
        ExportCapability::PreservePng
    }
}
