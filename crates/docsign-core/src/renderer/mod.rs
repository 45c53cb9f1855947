//! Page renderers
//!
//! One adapter per document family, chosen once when the document is
//! opened. Everything above this module talks to [`DocumentRenderer`] and
//! never branches on the concrete document type.

mod pdf;
mod placeholder;
mod raster;

pub use pdf::PdfRenderer;
pub use placeholder::{PlaceholderRenderer, PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH};
pub use raster::RasterRenderer;

use crate::error::{DocumentError, SigningError};
use shared_types::{PageDimensions, RenderedPage};
use std::future::Future;
use tiny_skia::Pixmap;

/// Document family, declared at upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DocumentKind {
    /// Multi-page vector documents (PDF)
    Paginated,
    /// Single raster images (PNG, JPEG)
    StaticRaster,
    /// Stand-in page used when nothing else can render
    Placeholder,
}

impl DocumentKind {
    /// Pick a kind from the declared media type, falling back to the file extension
    pub fn detect(media_type: &str, file_name: &str) -> Option<Self> {
        let media_type = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match media_type.as_str() {
            "application/pdf" => return Some(DocumentKind::Paginated),
            "image/png" | "image/jpeg" | "image/jpg" => return Some(DocumentKind::StaticRaster),
            _ => {}
        }

        let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentKind::Paginated),
            "png" | "jpg" | "jpeg" => Some(DocumentKind::StaticRaster),
            _ => None,
        }
    }
}

/// How an adapter's documents can be written back out
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExportCapability {
    /// Stamp onto the original PDF
    PreservePdf,
    /// Composite onto the original pixels and write a PNG
    PreservePng,
    /// Only a rasterized reconstruction is possible
    RasterOnly,
}

/// Pixels of one rendered page plus the geometry they were produced with
pub struct PageRaster {
    pub page: RenderedPage,
    pub pixmap: Pixmap,
}

impl std::fmt::Debug for PageRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRaster")
            .field("page", &self.page)
            .field("pixmap", &(self.pixmap.width(), self.pixmap.height()))
            .finish()
    }
}

impl PageRaster {
    /// Blank page-sized raster filled with `background`
    pub(crate) fn blank(
        page: RenderedPage,
        background: tiny_skia::Color,
    ) -> Result<Self, SigningError> {
        let mut pixmap = Pixmap::new(page.surface_width_px, page.surface_height_px)
            .ok_or_else(|| {
                SigningError::InvalidSurface(format!(
                    "cannot allocate {}x{} page surface",
                    page.surface_width_px, page.surface_height_px
                ))
            })?;
        pixmap.fill(background);
        Ok(Self { page, pixmap })
    }
}

pub trait RendererAdapter {
    fn page_count(&self) -> usize;

    /// Native size of a zero-based page
    fn page_dimensions(&self, page_index: usize) -> Result<PageDimensions, SigningError>;

    /// Rasterize a page at `scale` surface pixels per native unit
    fn render_page(
        &self,
        page_index: usize,
        scale: f64,
    ) -> impl Future<Output = Result<PageRaster, SigningError>> + Send;

    fn export_capability(&self) -> ExportCapability;
}

/// Geometry for rendering `page_index` at `scale`, after bounds checks
pub(crate) fn plan_render<R: RendererAdapter + ?Sized>(
    renderer: &R,
    page_index: usize,
    scale: f64,
) -> Result<RenderedPage, SigningError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(SigningError::InvalidSurface(format!(
            "render scale {} must be positive",
            scale
        )));
    }
    let dims = renderer.page_dimensions(page_index)?;
    Ok(RenderedPage::new(page_index, dims, scale))
}

pub(crate) fn check_page(page_index: usize, page_count: usize) -> Result<(), SigningError> {
    if page_index < page_count {
        Ok(())
    } else {
        Err(SigningError::PageOutOfRange {
            page: page_index,
            page_count,
        })
    }
}

/// The renderer selected for a session
#[derive(Debug)]
pub enum DocumentRenderer {
    Pdf(PdfRenderer),
    Raster(RasterRenderer),
    Placeholder(PlaceholderRenderer),
}

impl DocumentRenderer {
    pub fn open(kind: DocumentKind, bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(match kind {
            DocumentKind::Paginated => DocumentRenderer::Pdf(PdfRenderer::open(bytes)?),
            DocumentKind::StaticRaster => DocumentRenderer::Raster(RasterRenderer::open(bytes)?),
            DocumentKind::Placeholder => DocumentRenderer::Placeholder(PlaceholderRenderer::new()),
        })
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentRenderer::Pdf(_) => DocumentKind::Paginated,
            DocumentRenderer::Raster(_) => DocumentKind::StaticRaster,
            DocumentRenderer::Placeholder(_) => DocumentKind::Placeholder,
        }
    }
}

impl RendererAdapter for DocumentRenderer {
    fn page_count(&self) -> usize {
        match self {
            DocumentRenderer::Pdf(r) => r.page_count(),
            DocumentRenderer::Raster(r) => r.page_count(),
            DocumentRenderer::Placeholder(r) => r.page_count(),
        }
    }

    fn page_dimensions(&self, page_index: usize) -> Result<PageDimensions, SigningError> {
        match self {
            DocumentRenderer::Pdf(r) => r.page_dimensions(page_index),
            DocumentRenderer::Raster(r) => r.page_dimensions(page_index),
            DocumentRenderer::Placeholder(r) => r.page_dimensions(page_index),
        }
    }

    async fn render_page(&self, page_index: usize, scale: f64) -> Result<PageRaster, SigningError> {
        match self {
            DocumentRenderer::Pdf(r) => r.render_page(page_index, scale).await,
            DocumentRenderer::Raster(r) => r.render_page(page_index, scale).await,
            DocumentRenderer::Placeholder(r) => r.render_page(page_index, scale).await,
        }
    }

    fn export_capability(&self) -> ExportCapability {
        match self {
            DocumentRenderer::Pdf(r) => r.export_capability(),
            DocumentRenderer::Raster(r) => r.export_capability(),
            DocumentRenderer::Placeholder(r) => r.export_capability(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_by_media_type() {
        assert_eq!(
            DocumentKind::detect("application/pdf", "lease"),
            Some(DocumentKind::Paginated)
        );
        assert_eq!(
            DocumentKind::detect("image/jpg", "scan.bin"),
            Some(DocumentKind::StaticRaster)
        );
        assert_eq!(
            DocumentKind::detect("IMAGE/PNG; charset=binary", "x"),
            Some(DocumentKind::StaticRaster)
        );
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        assert_eq!(
            DocumentKind::detect("application/octet-stream", "Lease.PDF"),
            Some(DocumentKind::Paginated)
        );
        assert_eq!(
            DocumentKind::detect("", "photo.jpeg"),
            Some(DocumentKind::StaticRaster)
        );
        assert_eq!(DocumentKind::detect("text/plain", "notes.txt"), None);
        assert_eq!(DocumentKind::detect("", "no-extension"), None);
    }

    #[test]
    fn test_open_rejects_garbage_pdf() {
        let result = DocumentRenderer::open(DocumentKind::Paginated, b"<html></html>");
        assert!(matches!(result, Err(DocumentError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_placeholder_needs_no_bytes() {
        let renderer = DocumentRenderer::open(DocumentKind::Placeholder, &[]).unwrap();
        assert_eq!(renderer.kind(), DocumentKind::Placeholder);
        assert_eq!(renderer.page_count(), 1);
        assert_eq!(renderer.export_capability(), ExportCapability::RasterOnly);
    }

    #[test]
    fn test_check_page() {
        assert!(check_page(0, 1).is_ok());
        assert!(matches!(
            check_page(1, 1),
            Err(SigningError::PageOutOfRange {
                page: 1,
                page_count: 1
            })
        ));
    }
}
