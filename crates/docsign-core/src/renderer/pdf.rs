use super::{check_page, plan_render, ExportCapability, PageRaster, RendererAdapter};
use crate::error::{DocumentError, SigningError};
use shared_pdf::PdfDocument;
use shared_types::PageDimensions;
use tiny_skia::Color;

/// Renderer for PDF documents
///
/// Page geometry comes from the file itself. Pixel output is a white sheet
/// of the right size; drawing the actual page content is left to the host's
/// PDF viewer, which overlays the same surface space.
#[derive(Debug)]
pub struct PdfRenderer {
    pages: Vec<PageDimensions>,
}

impl PdfRenderer {
    pub fn open(bytes: &[u8]) -> Result<Self, DocumentError> {
        let doc = PdfDocument::from_bytes(bytes.to_vec())?;
        let page_count = doc.page_count();
        if page_count == 0 {
            return Err(DocumentError::CorruptedDocument(
                "document has no pages".to_string(),
            ));
        }

        let pages = (1..=page_count as u32)
            .map(|n| doc.page_dimensions(n))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(bad) = pages.iter().position(|d| !d.is_valid()) {
            return Err(DocumentError::CorruptedDocument(format!(
                "page {} has an empty MediaBox",
                bad + 1
            )));
        }

        tracing::debug!(pages = pages.len(), "opened PDF");
        Ok(Self { pages })
    }
}

impl RendererAdapter for PdfRenderer {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_dimensions(&self, page_index: usize) -> Result<PageDimensions, SigningError> {
        check_page(page_index, self.pages.len())?;
        Ok(self.pages[page_index])
    }

    async fn render_page(&self, page_index: usize, scale: f64) -> Result<PageRaster, SigningError> {
        let page = plan_render(self, page_index, scale)?;
        PageRaster::blank(page, Color::WHITE)
    }

    fn export_capability(&self) -> ExportCapability {
        ExportCapability::PreservePdf
    }
}
